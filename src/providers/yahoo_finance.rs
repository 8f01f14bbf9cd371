use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::etf::{DataSource, EtfRecord, PricePoint, PriceSeries};
use crate::core::performance::apply_series;
use crate::core::provider::{EtfProvider, PriceHistoryProvider};
use crate::providers::util::{build_url, http_client};

// YahooFinanceProvider implementation for PriceHistoryProvider and EtfProvider
pub struct YahooFinanceProvider {
    base_url: String,
    timeout: Duration,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        YahooFinanceProvider {
            base_url: base_url.to_string(),
            timeout,
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: f64,
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    instrument_type: Option<String>,
    regular_market_volume: Option<u64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
}

/// Pairs timestamps with closes, dropping gaps where either is missing.
fn extract_points(item: &ChartItem) -> Vec<PricePoint> {
    let (Some(timestamps), Some(closes)) = (
        item.timestamp.as_ref(),
        item.indicators
            .as_ref()
            .and_then(|inds| inds.quote.first())
            .and_then(|q| q.close.as_ref()),
    ) else {
        return Vec::new();
    };

    timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
            close
                .filter(|c| *c > 0.0)
                .map(|close| PricePoint { date, close })
        })
        .collect()
}

fn into_series(item: ChartItem, symbol: &str) -> PriceSeries {
    let points = extract_points(&item);
    let meta = item.meta;
    PriceSeries {
        symbol: symbol.to_string(),
        name: meta.long_name.or(meta.short_name),
        instrument_type: meta.instrument_type,
        currency: meta.currency,
        current_price: meta.regular_market_price,
        volume: meta.regular_market_volume,
        fifty_two_week_high: meta.fifty_two_week_high,
        fifty_two_week_low: meta.fifty_two_week_low,
        points,
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooFinanceProvider {
    #[instrument(name = "YahooHistoryFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_history(&self, symbol: &str) -> Result<PriceSeries> {
        let url = build_url(
            &self.base_url,
            &["v8", "finance", "chart", symbol],
            &[("interval", "1d"), ("range", "1y")],
        )?;
        debug!("Requesting price history from {}", url);

        let client = http_client(self.timeout)?;
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        debug!(response = ?response, "Received Yahoo response");

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON response for {symbol}"))?;

        let item = data
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        Ok(into_series(item, symbol))
    }
}

#[async_trait]
impl EtfProvider for YahooFinanceProvider {
    fn name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_etf(&self, symbol: &str) -> Result<Option<EtfRecord>> {
        let series = self.fetch_history(symbol).await?;
        if let Some(kind) = series
            .instrument_type
            .as_deref()
            .filter(|kind| !kind.eq_ignore_ascii_case("ETF"))
        {
            debug!("{} is a {} rather than an ETF", symbol, kind);
            return Ok(None);
        }

        let name = series.name.clone().unwrap_or_else(|| symbol.to_string());
        let mut record = EtfRecord::new(symbol, &name, DataSource::YahooFinance);
        if let Some(kind) = &series.instrument_type {
            record.category = kind.clone();
        }
        apply_series(&mut record, &series);
        Ok(Some(record))
    }
}
