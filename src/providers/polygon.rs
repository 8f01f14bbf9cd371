use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::etf::{Aum, DataSource, EtfRecord};
use crate::core::provider::EtfProvider;
use crate::providers::util::{build_url, http_client};

/// Ticker reference details from Polygon. No holdings or sector data.
pub struct PolygonProvider {
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl PolygonProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        PolygonProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    results: Option<TickerDetails>,
}

#[derive(Debug, Deserialize)]
struct TickerDetails {
    name: Option<String>,
    primary_exchange: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    description: Option<String>,
    market_cap: Option<f64>,
    last_updated_utc: Option<String>,
}

fn parse_details(details: TickerDetails, symbol: &str) -> EtfRecord {
    let name = details.name.unwrap_or_else(|| "N/A".to_string());
    let mut record = EtfRecord::new(symbol, &name, DataSource::Polygon);
    record.issuer = details
        .primary_exchange
        .unwrap_or_else(|| "N/A".to_string());
    record.category = details.kind.unwrap_or_else(|| "N/A".to_string());
    record.description = details.description.unwrap_or_default();
    record.aum = details.market_cap.map(Aum::Amount);
    record.last_updated = details.last_updated_utc;
    record
}

#[async_trait]
impl EtfProvider for PolygonProvider {
    fn name(&self) -> &'static str {
        "polygon"
    }

    #[instrument(name = "PolygonFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_etf(&self, symbol: &str) -> Result<Option<EtfRecord>> {
        let url = build_url(
            &self.base_url,
            &["v3", "reference", "tickers", symbol],
            &[("apiKey", self.api_key.as_str())],
        )?;
        debug!("Requesting ticker details for {}", symbol);

        let client = http_client(self.timeout)?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let data: TickerResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Polygon response for {symbol}"))?;

        Ok(data.results.map(|details| parse_details(details, symbol)))
    }
}
