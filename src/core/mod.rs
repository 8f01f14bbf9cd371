//! Core business logic abstractions

pub mod cache;
pub mod charts;
pub mod comparison;
pub mod config;
pub mod etf;
pub mod log;
pub mod market;
pub mod performance;
pub mod provider;
pub mod service;

// Re-export main types for cleaner imports
pub use etf::{Aum, DataSource, EtfRecord, Holding, PerformanceMetrics, PriceSeries};
pub use provider::{EtfProvider, PriceHistoryProvider};
pub use service::EtfDataService;
