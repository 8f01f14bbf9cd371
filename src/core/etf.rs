//! Normalized ETF record shared by every provider

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    AlphaVantage,
    Polygon,
    Limited,
    YahooFinance,
}

impl Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                DataSource::AlphaVantage => "Alpha Vantage",
                DataSource::Polygon => "Polygon",
                DataSource::Limited => "Limited",
                DataSource::YahooFinance => "Yahoo Finance",
            }
        )
    }
}

/// Assets under management as reported upstream.
///
/// Some providers hand back a number, others a display label like `"$1.2B"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Aum {
    Amount(f64),
    Label(String),
}

impl Aum {
    /// Numeric value in dollars, if the value can be parsed.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Aum::Amount(v) => Some(*v),
            Aum::Label(label) => parse_aum_label(label),
        }
    }
}

impl Display for Aum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aum::Amount(v) => write!(f, "{v:.0}"),
            Aum::Label(label) => write!(f, "{label}"),
        }
    }
}

/// Parses labels such as `"$1,234"`, `"2.5B"`, `"850M"` or `"12K"`.
pub fn parse_aum_label(label: &str) -> Option<f64> {
    let clean = label.replace(['$', ','], "");
    let clean = clean.trim();
    if clean.is_empty() || clean.eq_ignore_ascii_case("N/A") {
        return None;
    }

    let (number, multiplier) = match clean.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('B') => (&clean[..clean.len() - 1], 1_000_000_000.0),
        Some('M') => (&clean[..clean.len() - 1], 1_000_000.0),
        Some('K') => (&clean[..clean.len() - 1], 1_000.0),
        _ => (clean, 1.0),
    };

    number.trim().parse::<f64>().ok().map(|v| v * multiplier)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    /// Portfolio weight in percent.
    pub weight: Option<f64>,
    pub market_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub current_price: Option<f64>,
    pub day_change: Option<f64>,
    pub day_change_percent: Option<f64>,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub one_year_return: Option<f64>,
    pub volatility: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub current_vs_52w_high: Option<f64>,
}

impl PerformanceMetrics {
    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_none())
    }

    /// Metric labels and values in display order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("1 Year Return", self.one_year_return),
            ("Volatility", self.volatility),
            ("52 Week High", self.week52_high),
            ("52 Week Low", self.week52_low),
            ("Current Vs 52W High", self.current_vs_52w_high),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closes for the trailing year plus quote metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub name: Option<String>,
    pub instrument_type: Option<String>,
    pub currency: Option<String>,
    pub current_price: f64,
    pub volume: Option<u64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub points: Vec<PricePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfRecord {
    pub symbol: String,
    pub name: String,
    pub issuer: String,
    pub category: String,
    pub description: String,
    /// Expense ratio in percent, `0.03` meaning 0.03%.
    pub expense_ratio: Option<f64>,
    pub aum: Option<Aum>,
    pub holdings: Vec<Holding>,
    pub sector_allocation: BTreeMap<String, f64>,
    pub data_source: DataSource,
    pub last_updated: Option<String>,
    pub quote: Option<QuoteSnapshot>,
    #[serde(default)]
    pub performance: PerformanceMetrics,
    #[serde(default)]
    pub price_history: Vec<PricePoint>,
}

impl EtfRecord {
    /// A record with only identity fields filled in.
    pub fn new(symbol: &str, name: &str, data_source: DataSource) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            name: name.to_string(),
            issuer: "N/A".to_string(),
            category: "N/A".to_string(),
            description: String::new(),
            expense_ratio: None,
            aum: None,
            holdings: Vec::new(),
            sector_allocation: BTreeMap::new(),
            data_source,
            last_updated: None,
            quote: None,
            performance: PerformanceMetrics::default(),
            price_history: Vec::new(),
        }
    }

    pub fn current_price(&self) -> Option<f64> {
        self.quote.as_ref().and_then(|q| q.current_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aum_label() {
        assert_eq!(parse_aum_label("$1,234"), Some(1234.0));
        assert_eq!(parse_aum_label("2.5B"), Some(2_500_000_000.0));
        assert_eq!(parse_aum_label("850m"), Some(850_000_000.0));
        assert_eq!(parse_aum_label("12K"), Some(12_000.0));
        assert_eq!(parse_aum_label("N/A"), None);
        assert_eq!(parse_aum_label("lots"), None);
        assert_eq!(parse_aum_label(""), None);
    }

    #[test]
    fn test_aum_numeric_and_display() {
        assert_eq!(Aum::Amount(42.0).numeric(), Some(42.0));
        assert_eq!(Aum::Label("$3M".to_string()).numeric(), Some(3_000_000.0));
        assert_eq!(Aum::Label("$3M".to_string()).to_string(), "$3M");
        assert_eq!(Aum::Amount(1500.4).to_string(), "1500");
    }

    #[test]
    fn test_new_record_uppercases_symbol() {
        let record = EtfRecord::new("vti", "Vanguard", DataSource::Limited);
        assert_eq!(record.symbol, "VTI");
        assert_eq!(record.issuer, "N/A");
        assert!(record.performance.is_empty());
        assert!(record.current_price().is_none());
    }
}
