//! Data provider abstractions

use crate::core::etf::{EtfRecord, PriceSeries};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait EtfProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetches a normalized record. `Ok(None)` means the provider answered
    /// but has nothing for this symbol.
    async fn fetch_etf(&self, symbol: &str) -> Result<Option<EtfRecord>>;
}

#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_history(&self, symbol: &str) -> Result<PriceSeries>;
}
