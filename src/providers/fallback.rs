use anyhow::Result;
use async_trait::async_trait;

use crate::core::etf::{DataSource, EtfRecord};
use crate::core::market::find_known_etf;
use crate::core::provider::EtfProvider;

/// Offline identity data for a handful of well-known ETFs.
pub struct FallbackProvider;

#[async_trait]
impl EtfProvider for FallbackProvider {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn fetch_etf(&self, symbol: &str) -> Result<Option<EtfRecord>> {
        Ok(find_known_etf(symbol).map(|known| {
            let mut record = EtfRecord::new(symbol, known.name, DataSource::Limited);
            record.issuer = known.issuer.to_string();
            record.category = known.category.to_string();
            record.description = format!(
                "Real-time data for {} is not available. Please configure API keys for live data access.",
                known.name
            );
            record
        }))
    }
}
