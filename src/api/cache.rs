// ============================================================================
// Fetch cache : session-scoped memoization of provider requests
// ============================================================================
// Keyed by the exact symbol argument. A hit never re-contacts the provider;
// within one dashboard session a slightly stale series is an accepted
// tradeoff for responsiveness. The cache is owned by the worker thread, so
// there is a single writer and no locking to reason about.
// ============================================================================

use std::collections::HashMap;

use anyhow::Result;
use tracing::debug;

use crate::api::yahoo;
use crate::models::PriceSeries;

/// In-memory map from ticker symbol to its fetched history.
#[derive(Debug, Default)]
pub struct FetchCache {
    entries: HashMap<String, PriceSeries>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.entries.get(symbol)
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.entries.insert(series.symbol.clone(), series);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops a symbol so the next request refetches it (used by retry).
    pub fn invalidate(&mut self, symbol: &str) {
        self.entries.remove(symbol);
    }
}

/// Returns the cached series for `symbol`, fetching it on a miss. Empty
/// series (unknown symbols) are cached too: repeating a typo should not
/// hammer the provider.
pub async fn fetch_cached(
    cache: &mut FetchCache,
    client: &reqwest::Client,
    symbol: &str,
) -> Result<PriceSeries> {
    if let Some(series) = cache.get(symbol) {
        debug!(ticker = %symbol, bars = series.len(), "Fetch cache hit");
        return Ok(series.clone());
    }

    debug!(ticker = %symbol, "Fetch cache miss");
    let series = yahoo::fetch_price_series(client, symbol).await?;
    cache.insert(series.clone());
    Ok(series)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bar;
    use chrono::NaiveDate;

    fn series(symbol: &str) -> PriceSeries {
        let bar = Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            1.0,
            2.0,
            0.5,
            1.5,
            100,
        );
        PriceSeries::from_bars(symbol.to_string(), vec![bar])
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = FetchCache::new();
        assert!(cache.get("AAPL").is_none());

        cache.insert(series("AAPL"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("AAPL").unwrap().len(), 1);
    }

    #[test]
    fn test_insert_overwrites_same_symbol() {
        let mut cache = FetchCache::new();
        cache.insert(series("AAPL"));
        cache.insert(series("AAPL"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let mut cache = FetchCache::new();
        cache.insert(series("AAPL"));
        cache.invalidate("AAPL");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_series_is_cacheable() {
        let mut cache = FetchCache::new();
        cache.insert(PriceSeries::new("NOPE".to_string()));
        assert!(cache.get("NOPE").unwrap().is_empty());
    }
}
