//! ETF lookup with sequential provider failover.

use anyhow::{Result, bail};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::core::cache::RecordCache;
use crate::core::config::AppConfig;
use crate::core::etf::{DataSource, EtfRecord};
use crate::core::performance::apply_series;
use crate::core::provider::{EtfProvider, PriceHistoryProvider};
use crate::providers::{
    AlphaVantageProvider, FallbackProvider, PolygonProvider, YahooFinanceProvider,
};

pub struct EtfDataService {
    providers: Vec<Box<dyn EtfProvider>>,
    history: Option<Box<dyn PriceHistoryProvider>>,
    cache: RecordCache,
    popular: Vec<String>,
}

impl EtfDataService {
    pub fn new(
        providers: Vec<Box<dyn EtfProvider>>,
        history: Option<Box<dyn PriceHistoryProvider>>,
        popular: Vec<String>,
    ) -> Self {
        Self {
            providers,
            history,
            cache: RecordCache::new(),
            popular,
        }
    }

    /// Builds the provider chain. Keyed providers are skipped when no key resolves.
    pub fn from_config(config: &AppConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let mut providers: Vec<Box<dyn EtfProvider>> = Vec::new();

        let av = &config.providers.alpha_vantage;
        match av.resolved_api_key() {
            Some(key) => providers.push(Box::new(AlphaVantageProvider::new(
                &av.base_url,
                &key,
                timeout,
            ))),
            None => debug!("No Alpha Vantage API key, provider disabled"),
        }

        let polygon = &config.providers.polygon;
        match polygon.resolved_api_key() {
            Some(key) => providers.push(Box::new(PolygonProvider::new(
                &polygon.base_url,
                &key,
                timeout,
            ))),
            None => debug!("No Polygon API key, provider disabled"),
        }

        providers.push(Box::new(FallbackProvider));

        let yahoo_url = &config.providers.yahoo.base_url;
        providers.push(Box::new(YahooFinanceProvider::new(yahoo_url, timeout)));

        Self::new(
            providers,
            Some(Box::new(YahooFinanceProvider::new(yahoo_url, timeout))),
            config.popular_etfs.clone(),
        )
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn popular_etfs(&self) -> &[String] {
        &self.popular
    }

    /// Symbols already looked up in this process.
    pub async fn recent_symbols(&self) -> Vec<String> {
        self.cache.symbols().await
    }

    /// Looks up an ETF by symbol, trying each provider once in order.
    ///
    /// Returns `Ok(None)` when every provider failed or had no data.
    #[instrument(name = "SearchEtf", skip(self))]
    pub async fn search_etf(&self, query: &str) -> Result<Option<EtfRecord>> {
        let symbol = query.trim().to_uppercase();
        if symbol.is_empty() {
            bail!("Please enter an ETF symbol");
        }

        if let Some(record) = self.cache.get(&symbol).await {
            return Ok(Some(record));
        }

        let Some(mut record) = self.fetch_first(&symbol).await else {
            warn!("All providers failed for {}", symbol);
            return Ok(None);
        };

        if record.price_history.is_empty() && record.data_source != DataSource::YahooFinance {
            self.enrich(&mut record).await;
        }

        self.cache.insert(record.clone()).await;
        Ok(Some(record))
    }

    async fn fetch_first(&self, symbol: &str) -> Option<EtfRecord> {
        for provider in &self.providers {
            match provider.fetch_etf(symbol).await {
                Ok(Some(record)) => {
                    info!("{} served {}", provider.name(), symbol);
                    return Some(record);
                }
                Ok(None) => debug!("{} has no data for {}", provider.name(), symbol),
                Err(e) => warn!("{} failed for {}: {}", provider.name(), symbol, e),
            }
        }
        None
    }

    async fn enrich(&self, record: &mut EtfRecord) {
        let Some(history) = &self.history else {
            return;
        };
        match history.fetch_history(&record.symbol).await {
            Ok(series) => apply_series(record, &series),
            Err(e) => warn!("Price history unavailable for {}: {}", record.symbol, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::etf::{PricePoint, PriceSeries};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Found(DataSource),
        Empty,
        Fails,
    }

    struct MockProvider {
        name: &'static str,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl MockProvider {
        fn boxed(name: &'static str, behavior: Behavior) -> (Box<dyn EtfProvider>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = MockProvider {
                name,
                behavior,
                calls: Arc::clone(&calls),
            };
            (Box::new(provider), calls)
        }
    }

    #[async_trait]
    impl EtfProvider for MockProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch_etf(&self, symbol: &str) -> Result<Option<EtfRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Found(source) => Ok(Some(EtfRecord::new(symbol, self.name, source))),
                Behavior::Empty => Ok(None),
                Behavior::Fails => Err(anyhow!("HTTP error: 500 for symbol: {}", symbol)),
            }
        }
    }

    struct MockHistory {
        fail: bool,
    }

    #[async_trait]
    impl PriceHistoryProvider for MockHistory {
        async fn fetch_history(&self, symbol: &str) -> Result<PriceSeries> {
            if self.fail {
                return Err(anyhow!("No price data found for symbol: {}", symbol));
            }
            let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
            Ok(PriceSeries {
                symbol: symbol.to_string(),
                current_price: 110.0,
                points: vec![
                    PricePoint { date, close: 100.0 },
                    PricePoint {
                        date: date.succ_opt().unwrap(),
                        close: 110.0,
                    },
                ],
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let (p1, c1) = MockProvider::boxed("first", Behavior::Found(DataSource::AlphaVantage));
        let (p2, c2) = MockProvider::boxed("second", Behavior::Found(DataSource::Polygon));
        let service = EtfDataService::new(vec![p1, p2], None, vec![]);

        let record = service.search_etf(" vti ").await.unwrap().unwrap();
        assert_eq!(record.symbol, "VTI");
        assert_eq!(record.data_source, DataSource::AlphaVantage);
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failover_on_error_and_empty() {
        let (p1, c1) = MockProvider::boxed("broken", Behavior::Fails);
        let (p2, c2) = MockProvider::boxed("empty", Behavior::Empty);
        let (p3, c3) = MockProvider::boxed("fallback", Behavior::Found(DataSource::Limited));
        let (p4, c4) = MockProvider::boxed("last", Behavior::Found(DataSource::YahooFinance));
        let service = EtfDataService::new(vec![p1, p2, p3, p4], None, vec![]);

        let record = service.search_etf("SPY").await.unwrap().unwrap();
        assert_eq!(record.data_source, DataSource::Limited);
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
        assert_eq!(c3.load(Ordering::SeqCst), 1);
        assert_eq!(c4.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_providers_fail_returns_none() {
        let (p1, c1) = MockProvider::boxed("broken", Behavior::Fails);
        let (p2, _) = MockProvider::boxed("empty", Behavior::Empty);
        let service = EtfDataService::new(vec![p1, p2], None, vec![]);

        assert!(service.search_etf("NOPE").await.unwrap().is_none());
        // misses are not memoised, and each provider is tried exactly once per lookup
        assert!(service.search_etf("NOPE").await.unwrap().is_none());
        assert_eq!(c1.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_query_is_error() {
        let service = EtfDataService::new(vec![], None, vec![]);
        let result = service.search_etf("   ").await;
        assert_eq!(result.unwrap_err().to_string(), "Please enter an ETF symbol");
    }

    #[tokio::test]
    async fn test_lookups_are_memoised() {
        let (p1, c1) = MockProvider::boxed("first", Behavior::Found(DataSource::Polygon));
        let service = EtfDataService::new(vec![p1], None, vec![]);

        service.search_etf("QQQ").await.unwrap();
        let again = service.search_etf("qqq").await.unwrap().unwrap();
        assert_eq!(again.symbol, "QQQ");
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(service.recent_symbols().await, vec!["QQQ"]);
    }

    #[tokio::test]
    async fn test_enrichment_fills_price_data() {
        let (p1, _) = MockProvider::boxed("fallback", Behavior::Found(DataSource::Limited));
        let service = EtfDataService::new(
            vec![p1],
            Some(Box::new(MockHistory { fail: false })),
            vec![],
        );

        let record = service.search_etf("VOO").await.unwrap().unwrap();
        assert_eq!(record.data_source, DataSource::Limited);
        assert_eq!(record.price_history.len(), 2);
        assert_eq!(record.current_price(), Some(110.0));
        assert!((record.performance.one_year_return.unwrap() - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_enrichment_failure_is_ignored() {
        let (p1, _) = MockProvider::boxed("fallback", Behavior::Found(DataSource::Limited));
        let service = EtfDataService::new(
            vec![p1],
            Some(Box::new(MockHistory { fail: true })),
            vec![],
        );

        let record = service.search_etf("VOO").await.unwrap().unwrap();
        assert!(record.price_history.is_empty());
        assert!(record.quote.is_none());
    }

    #[test]
    fn test_from_config_skips_unkeyed_providers() {
        let mut config = AppConfig::default();
        config.providers.alpha_vantage.api_key = Some("av-key".to_string());
        config.providers.polygon.api_key = Some("  ".to_string());

        let service = EtfDataService::from_config(&config);
        let names = service.provider_names();
        assert_eq!(names.first(), Some(&"alpha_vantage"));
        assert!(names.ends_with(&["fallback", "yahoo_finance"]));
        assert_eq!(service.popular_etfs().len(), 10);
    }
}
