//! Query façade called by request handlers.
//!
//! Quote, batch, and search lookups go cache first, then to the quote source
//! on a miss. The fetch and the cache write run inside one coalesced future:
//! concurrent misses for a key share a single upstream call, and a caller
//! that abandons the request leaves either a complete entry or none.
//!
//! Market views are recomputed from the storage snapshot on every call.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::aggregation::{
    self, IndicesView, MarketOverview, MarketStatistics, SectorPerformanceView, TrendingView,
    SECTOR_LIMIT, TOP_LIMIT, TRENDING_LIMIT,
};
use crate::adapters::YahooQuoteAdapter;
use crate::cache::{CacheStats, TtlCache};
use crate::coalesce::SingleFlight;
use crate::config::ServiceConfig;
use crate::data_source::{QuoteSource, SourceError};
use crate::envelope::Cached;
use crate::http_client::HttpClient;
use crate::snapshot::SnapshotSource;
use crate::{SearchHit, StockQuote, Symbol, UtcDateTime, ValidationError};

pub const ALL_STOCKS_KEY: &str = "all_stocks";

pub fn quote_key(symbol: &Symbol) -> String {
    format!("stock_{}", symbol.as_str())
}

pub fn search_key(query: &str) -> String {
    format!("search_{}", query.to_lowercase())
}

pub struct MarketService {
    cache: Arc<TtlCache>,
    quotes: Arc<dyn QuoteSource>,
    snapshot: Arc<dyn SnapshotSource>,
    tracked_symbols: Vec<Symbol>,
    quote_ttl: Duration,
    search_ttl: Duration,
    quote_flight: SingleFlight<StockQuote>,
    list_flight: SingleFlight<Vec<StockQuote>>,
    search_flight: SingleFlight<Vec<SearchHit>>,
}

impl MarketService {
    pub fn new(
        cache: Arc<TtlCache>,
        quotes: Arc<dyn QuoteSource>,
        snapshot: Arc<dyn SnapshotSource>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            cache,
            quotes,
            snapshot,
            tracked_symbols: config.upstream.tracked_symbols.clone(),
            quote_ttl: config.cache.quote_ttl,
            search_ttl: config.cache.search_ttl,
            quote_flight: SingleFlight::new(),
            list_flight: SingleFlight::new(),
            search_flight: SingleFlight::new(),
        }
    }

    /// Wires a fresh cache and the Yahoo adapter over `http_client`.
    pub fn from_config(
        config: &ServiceConfig,
        http_client: Arc<dyn HttpClient>,
        snapshot: Arc<dyn SnapshotSource>,
    ) -> Self {
        let cache = Arc::new(TtlCache::from_config(&config.cache));
        let adapter = YahooQuoteAdapter::new(http_client, config.upstream.clone());
        Self::new(cache, Arc::new(adapter), snapshot, config)
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    /// Quotes for every tracked symbol.
    pub async fn all_quotes(&self) -> Result<Cached<Vec<StockQuote>>, SourceError> {
        if let Some(quotes) = self.cache.get_json::<Vec<StockQuote>>(ALL_STOCKS_KEY) {
            debug!(key = ALL_STOCKS_KEY, "cache hit");
            return Ok(Cached::hit(quotes));
        }

        debug!(key = ALL_STOCKS_KEY, "cache miss");
        let quotes = self
            .list_flight
            .run(ALL_STOCKS_KEY, move || async move {
                let quotes = self.quotes.fetch_many(&self.tracked_symbols).await?;
                self.cache
                    .set_json(ALL_STOCKS_KEY, &quotes, Some(self.quote_ttl));
                Ok(quotes)
            })
            .await?;
        Ok(Cached::miss(quotes))
    }

    /// One quote by symbol. The symbol is trimmed and uppercased first.
    pub async fn quote(&self, raw_symbol: &str) -> Result<Cached<StockQuote>, SourceError> {
        let symbol = Symbol::parse(raw_symbol)?;
        let key = quote_key(&symbol);

        if let Some(quote) = self.cache.get_json::<StockQuote>(&key) {
            debug!(%key, "cache hit");
            return Ok(Cached::hit(quote));
        }

        debug!(%key, "cache miss");
        let (symbol_ref, key_ref) = (&symbol, key.as_str());
        let quote = self
            .quote_flight
            .run(&key, move || async move {
                let quote = self.quotes.fetch_one(symbol_ref).await?;
                self.cache.set_json(key_ref, &quote, Some(self.quote_ttl));
                Ok(quote)
            })
            .await?;
        Ok(Cached::miss(quote))
    }

    /// Upstream symbol search. Keys on the lowercased query.
    pub async fn search(&self, raw_query: &str) -> Result<Cached<Vec<SearchHit>>, SourceError> {
        let query = raw_query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        let key = search_key(query);

        if let Some(hits) = self.cache.get_json::<Vec<SearchHit>>(&key) {
            debug!(%key, "cache hit");
            return Ok(Cached::hit(hits));
        }

        debug!(%key, "cache miss");
        let key_ref = key.as_str();
        let hits = self
            .search_flight
            .run(&key, move || async move {
                let hits = self.quotes.search(query).await?;
                self.cache.set_json(key_ref, &hits, Some(self.search_ttl));
                Ok(hits)
            })
            .await?;
        Ok(Cached::miss(hits))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn load_snapshot(&self) -> Result<Vec<StockQuote>, SourceError> {
        let records = self.snapshot.snapshot().await?;
        debug!(records = records.len(), "snapshot loaded");
        Ok(records)
    }

    pub async fn overview(&self) -> Result<MarketOverview, SourceError> {
        let records = self.load_snapshot().await?;
        Ok(aggregation::overview(&records, UtcDateTime::now()))
    }

    pub async fn sectors(&self, limit: Option<usize>) -> Result<SectorPerformanceView, SourceError> {
        let limit = SECTOR_LIMIT.resolve(limit)?;
        let records = self.load_snapshot().await?;
        Ok(aggregation::sector_performance(
            &records,
            limit,
            UtcDateTime::now(),
        ))
    }

    pub async fn trending(&self, limit: Option<usize>) -> Result<TrendingView, SourceError> {
        let limit = TRENDING_LIMIT.resolve(limit)?;
        let records = self.load_snapshot().await?;
        Ok(aggregation::trending(&records, limit, UtcDateTime::now()))
    }

    pub async fn top_gainers(&self, limit: Option<usize>) -> Result<Vec<StockQuote>, SourceError> {
        let limit = TOP_LIMIT.resolve(limit)?;
        let records = self.load_snapshot().await?;
        Ok(aggregation::top_gainers(&records, limit))
    }

    pub async fn top_losers(&self, limit: Option<usize>) -> Result<Vec<StockQuote>, SourceError> {
        let limit = TOP_LIMIT.resolve(limit)?;
        let records = self.load_snapshot().await?;
        Ok(aggregation::top_losers(&records, limit))
    }

    pub async fn top_volume(&self, limit: Option<usize>) -> Result<Vec<StockQuote>, SourceError> {
        let limit = TOP_LIMIT.resolve(limit)?;
        let records = self.load_snapshot().await?;
        Ok(aggregation::top_volume(&records, limit))
    }

    pub async fn statistics(&self) -> Result<MarketStatistics, SourceError> {
        let records = self.load_snapshot().await?;
        Ok(aggregation::statistics(&records, UtcDateTime::now()))
    }

    pub async fn indices(&self) -> Result<IndicesView, SourceError> {
        let records = self.load_snapshot().await?;
        Ok(aggregation::indices(&records, UtcDateTime::now()))
    }

    /// Stored records matching `query` on symbol, name, or sector.
    pub async fn find_stocks(&self, query: &str) -> Result<Vec<StockQuote>, SourceError> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        let records = self.load_snapshot().await?;
        Ok(aggregation::search_snapshot(&records, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_normalize_case() {
        let symbol = Symbol::parse("emaar").expect("symbol");
        assert_eq!(quote_key(&symbol), "stock_EMAAR");
        assert_eq!(search_key("Emirates NBD"), "search_emirates nbd");
    }
}
