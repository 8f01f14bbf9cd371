pub mod alpha_vantage;
pub mod fallback;
pub mod polygon;
pub mod util;
pub mod yahoo_finance;

pub use alpha_vantage::AlphaVantageProvider;
pub use fallback::FallbackProvider;
pub use polygon::PolygonProvider;
pub use yahoo_finance::YahooFinanceProvider;
