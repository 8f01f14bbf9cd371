use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::etf::{Aum, DataSource, EtfRecord, Holding};
use crate::core::provider::EtfProvider;
use crate::providers::util::{build_url, http_client, safe_float};

/// Company overview plus ETF profile from Alpha Vantage's `/query` API.
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        AlphaVantageProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            timeout,
        }
    }

    async fn query(&self, function: &str, symbol: &str) -> Result<serde_json::Value> {
        let url = build_url(
            &self.base_url,
            &["query"],
            &[
                ("function", function),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ],
        )?;
        debug!("Requesting {} data for {}", function, symbol);

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

        let body: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {function} response for {symbol}"))?;

        // Throttled or invalid-key responses come back as 200 with a note instead of data
        for key in ["Note", "Information", "Error Message"] {
            if let Some(message) = body.get(key).and_then(|v| v.as_str()) {
                return Err(anyhow!("Alpha Vantage {}: {}", key.to_lowercase(), message));
            }
        }
        Ok(body)
    }

    async fn fetch_profile(&self, symbol: &str) -> Result<EtfProfile> {
        let body = self.query("ETF_PROFILE", symbol).await?;
        serde_json::from_value(body)
            .with_context(|| format!("Failed to parse ETF profile for {symbol}"))
    }
}

#[derive(Debug, Deserialize)]
struct Overview {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "AssetType")]
    asset_type: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "ExpenseRatio")]
    expense_ratio: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_capitalization: Option<String>,
    #[serde(rename = "LastRefreshed")]
    last_refreshed: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EtfProfile {
    net_assets: Option<String>,
    net_expense_ratio: Option<String>,
    #[serde(default)]
    sectors: Vec<ProfileSector>,
    #[serde(default)]
    holdings: Vec<ProfileHolding>,
}

#[derive(Debug, Deserialize)]
struct ProfileSector {
    sector: String,
    weight: String,
}

#[derive(Debug, Deserialize)]
struct ProfileHolding {
    symbol: String,
    description: Option<String>,
    weight: Option<String>,
}

fn fraction_to_percent(value: Option<&str>) -> Option<f64> {
    safe_float(value).map(|v| v * 100.0)
}

fn text_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty() && v != "None")
        .unwrap_or_else(|| default.to_string())
}

fn parse_overview(overview: Overview, symbol: &str) -> EtfRecord {
    let name = text_or(overview.name, "N/A");
    let mut record = EtfRecord::new(symbol, &name, DataSource::AlphaVantage);
    record.issuer = text_or(overview.asset_type, "N/A");
    record.category = text_or(overview.sector, "N/A");
    record.description = text_or(overview.description, "");
    record.expense_ratio = safe_float(overview.expense_ratio.as_deref());
    record.aum = overview
        .market_capitalization
        .filter(|v| v != "None")
        .map(Aum::Label);
    record.last_updated = overview.last_refreshed;
    record
}

fn apply_profile(record: &mut EtfRecord, profile: EtfProfile) {
    record.holdings = profile
        .holdings
        .into_iter()
        .filter(|h| !h.symbol.trim().is_empty() && h.symbol != "n/a")
        .map(|h| Holding {
            ticker: h.symbol.to_uppercase(),
            company_name: h.description,
            sector: None,
            weight: fraction_to_percent(h.weight.as_deref()),
            market_value: None,
        })
        .collect();

    record.sector_allocation = profile
        .sectors
        .into_iter()
        .filter_map(|s| {
            fraction_to_percent(Some(s.weight.as_str())).map(|w| (title_case(&s.sector), w))
        })
        .collect::<BTreeMap<_, _>>();

    if record.expense_ratio.is_none() {
        record.expense_ratio = fraction_to_percent(profile.net_expense_ratio.as_deref());
    }
    if record.aum.is_none() {
        record.aum = safe_float(profile.net_assets.as_deref()).map(Aum::Amount);
    }
}

/// `"INFORMATION TECHNOLOGY"` -> `"Information Technology"`
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl EtfProvider for AlphaVantageProvider {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    #[instrument(name = "AlphaVantageFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_etf(&self, symbol: &str) -> Result<Option<EtfRecord>> {
        let body = self.query("OVERVIEW", symbol).await?;
        let overview: Overview = serde_json::from_value(body)
            .with_context(|| format!("Failed to parse overview for {symbol}"))?;

        if overview.symbol.as_deref() != Some(symbol) {
            debug!("Overview did not match requested symbol {}", symbol);
            return Ok(None);
        }

        let mut record = parse_overview(overview, symbol);
        match self.fetch_profile(symbol).await {
            Ok(profile) => apply_profile(&mut record, profile),
            Err(e) => warn!("ETF profile unavailable for {}: {}", symbol, e),
        }
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, function: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", function))
            .and(query_param("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    fn provider(server: &MockServer) -> AlphaVantageProvider {
        AlphaVantageProvider::new(&server.uri(), "test-key", Duration::from_secs(5))
    }

    const QQQ_OVERVIEW: &str = r#"{
        "Symbol": "QQQ",
        "AssetType": "ETF",
        "Name": "Invesco QQQ Trust",
        "Description": "Tracks the Nasdaq-100",
        "Sector": "None",
        "ExpenseRatio": "0.20%",
        "MarketCapitalization": "None"
    }"#;

    #[tokio::test]
    async fn test_overview_with_profile() {
        let server = MockServer::start().await;
        mount(&server, "OVERVIEW", 200, QQQ_OVERVIEW).await;
        mount(
            &server,
            "ETF_PROFILE",
            200,
            r#"{
                "net_assets": "250000000000",
                "net_expense_ratio": "0.002",
                "sectors": [
                    {"sector": "INFORMATION TECHNOLOGY", "weight": "0.512"},
                    {"sector": "HEALTHCARE", "weight": "0.061"}
                ],
                "holdings": [
                    {"symbol": "AAPL", "description": "APPLE INC", "weight": "0.0891"},
                    {"symbol": "n/a", "description": "CASH", "weight": "0.001"}
                ]
            }"#,
        )
        .await;

        let record = provider(&server).fetch_etf("QQQ").await.unwrap().unwrap();
        assert_eq!(record.symbol, "QQQ");
        assert_eq!(record.name, "Invesco QQQ Trust");
        assert_eq!(record.issuer, "ETF");
        assert_eq!(record.category, "N/A");
        assert_eq!(record.expense_ratio, Some(0.20));
        assert_eq!(record.aum, Some(Aum::Amount(250_000_000_000.0)));
        assert_eq!(record.data_source, DataSource::AlphaVantage);

        assert_eq!(record.holdings.len(), 1);
        assert_eq!(record.holdings[0].ticker, "AAPL");
        assert!((record.holdings[0].weight.unwrap() - 8.91).abs() < 1e-9);
        let tech = record.sector_allocation["Information Technology"];
        assert!((tech - 51.2).abs() < 1e-9);
        assert!(record.sector_allocation.contains_key("Healthcare"));
    }

    #[tokio::test]
    async fn test_profile_failure_keeps_overview() {
        let server = MockServer::start().await;
        mount(&server, "OVERVIEW", 200, QQQ_OVERVIEW).await;
        mount(&server, "ETF_PROFILE", 500, "").await;

        let record = provider(&server).fetch_etf("QQQ").await.unwrap().unwrap();
        assert_eq!(record.name, "Invesco QQQ Trust");
        assert!(record.holdings.is_empty());
        assert!(record.sector_allocation.is_empty());
    }

    #[tokio::test]
    async fn test_symbol_mismatch_is_no_data() {
        let server = MockServer::start().await;
        mount(&server, "OVERVIEW", 200, "{}").await;

        let result = provider(&server).fetch_etf("VTI").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_note_is_error() {
        let server = MockServer::start().await;
        mount(
            &server,
            "OVERVIEW",
            200,
            r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#,
        )
        .await;

        let result = provider(&server).fetch_etf("VTI").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().starts_with("Alpha Vantage note:"));
    }

    #[tokio::test]
    async fn test_http_error() {
        let server = MockServer::start().await;
        mount(&server, "OVERVIEW", 503, "").await;

        let result = provider(&server).fetch_etf("VTI").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 503 Service Unavailable for symbol: VTI"
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("INFORMATION TECHNOLOGY"), "Information Technology");
        assert_eq!(title_case("real  estate"), "Real Estate");
    }
}
