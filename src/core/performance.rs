//! Derives quote and performance metrics from a daily price series.
use crate::core::etf::{EtfRecord, PerformanceMetrics, PriceSeries, QuoteSnapshot};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

fn closes(series: &PriceSeries) -> Vec<f64> {
    series.points.iter().map(|p| p.close).collect()
}

/// Percentage change from the first to the last close.
pub fn period_return(closes: &[f64]) -> Option<f64> {
    let first = *closes.first()?;
    let last = *closes.last()?;
    if closes.len() < 2 || first <= 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Annualized volatility of daily simple returns, in percent.
pub fn annualized_volatility(closes: &[f64]) -> Option<f64> {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if returns.len() < 2 {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

pub fn calculate_performance(series: &PriceSeries) -> PerformanceMetrics {
    let closes = closes(series);

    let week52_high = series
        .fifty_two_week_high
        .or_else(|| closes.iter().copied().reduce(f64::max));
    let week52_low = series
        .fifty_two_week_low
        .or_else(|| closes.iter().copied().reduce(f64::min));

    let current_vs_52w_high = week52_high
        .filter(|high| *high > 0.0)
        .map(|high| (series.current_price - high) / high * 100.0);

    PerformanceMetrics {
        one_year_return: period_return(&closes),
        volatility: annualized_volatility(&closes),
        week52_high,
        week52_low,
        current_vs_52w_high,
    }
}

pub fn calculate_quote(series: &PriceSeries) -> QuoteSnapshot {
    let closes = closes(series);
    let previous = if closes.len() >= 2 {
        Some(closes[closes.len() - 2]).filter(|p| *p > 0.0)
    } else {
        None
    };

    QuoteSnapshot {
        current_price: Some(series.current_price),
        day_change: previous.map(|p| series.current_price - p),
        day_change_percent: previous.map(|p| (series.current_price - p) / p * 100.0),
        volume: series.volume,
    }
}

/// Fills quote, price history and performance on `record` from `series`.
pub fn apply_series(record: &mut EtfRecord, series: &PriceSeries) {
    record.quote = Some(calculate_quote(series));
    record.performance = calculate_performance(series);
    record.price_history = series.points.clone();
}
