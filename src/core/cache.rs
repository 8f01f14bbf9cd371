use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::etf::EtfRecord;

/// In-process memo of looked-up records, keyed by upper-cased symbol.
///
/// Clones share the same entries. Nothing is evicted or persisted.
#[derive(Clone, Default)]
pub struct RecordCache {
    inner: Arc<Mutex<HashMap<String, EtfRecord>>>,
}

fn key(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, symbol: &str) -> Option<EtfRecord> {
        let symbol = key(symbol);
        let cache = self.inner.lock().await;
        let value = cache.get(&symbol).cloned();
        if value.is_some() {
            debug!("Cache HIT for {}", symbol);
        } else {
            debug!("Cache MISS for {}", symbol);
        }
        value
    }

    /// Stores `record` under its own symbol.
    pub async fn insert(&self, record: EtfRecord) {
        let symbol = key(&record.symbol);
        debug!("Cache PUT for {}", symbol);
        self.inner.lock().await.insert(symbol, record);
    }

    /// Memoised symbols, sorted.
    pub async fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.inner.lock().await.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::etf::DataSource;

    #[tokio::test]
    async fn test_get_is_case_insensitive() {
        let cache = RecordCache::new();
        assert!(cache.is_empty().await);

        cache
            .insert(EtfRecord::new("vti", "Vanguard Total", DataSource::Limited))
            .await;

        let hit = cache.get(" vti ").await.unwrap();
        assert_eq!(hit.symbol, "VTI");
        assert!(cache.get("VOO").await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = RecordCache::new();
        let clone = cache.clone();

        clone
            .insert(EtfRecord::new("SPY", "SPDR", DataSource::Polygon))
            .await;
        clone
            .insert(EtfRecord::new("ARKK", "ARK", DataSource::Limited))
            .await;

        assert_eq!(cache.symbols().await, vec!["ARKK", "SPY"]);
    }
}
