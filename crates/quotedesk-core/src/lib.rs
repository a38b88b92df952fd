//! # Quotedesk Core
//!
//! Market-data caching and aggregation for a fixed set of exchange-listed
//! symbols.
//!
//! ## Overview
//!
//! - **TTL cache** shielding the rate-limited upstream from repeated calls
//! - **Quote adapter** normalizing upstream chart/search payloads into one
//!   canonical record
//! - **Aggregation engine** turning a storage snapshot into overview,
//!   sector, trending, statistics, and index views
//! - **Query façade** tying the three together with per-key coalescing
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance chart/search adapter |
//! | [`aggregation`] | Pure snapshot aggregations |
//! | [`cache`] | Namespaced expiring key/value store |
//! | [`coalesce`] | Single-flight for concurrent cache misses |
//! | [`config`] | Service configuration |
//! | [`data_source`] | Quote source trait and error taxonomy |
//! | [`domain`] | Canonical records, symbols, timestamps |
//! | [`envelope`] | Request-layer response envelopes |
//! | [`error`] | Validation errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`service`] | Query façade |
//! | [`snapshot`] | Storage snapshot sources |
//! | [`throttling`] | Outbound request budget |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Request layer   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ MarketService   │────▶│ TtlCache         │
//! └───┬─────────┬───┘     └──────────────────┘
//!     │         │
//!     ▼         ▼
//! ┌────────┐ ┌──────────────┐     ┌─────────────┐
//! │Snapshot│ │ QuoteSource  │────▶│ HttpClient  │
//! └───┬────┘ └──────────────┘     └─────────────┘
//!     ▼
//! ┌─────────────────┐
//! │ aggregation     │
//! └─────────────────┘
//! ```

pub mod adapters;
pub mod aggregation;
pub mod cache;
pub mod coalesce;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod service;
pub mod snapshot;
pub mod throttling;

pub use adapters::YahooQuoteAdapter;
pub use cache::{CacheStats, TtlCache};
pub use coalesce::SingleFlight;
pub use config::{CacheConfig, ServiceConfig, UpstreamConfig};
pub use data_source::{QuoteSource, SourceError, SourceErrorKind, SourceFuture};
pub use domain::{
    derive_change, validate_currency_code, SearchHit, StockQuote, Symbol, UtcDateTime,
    DEFAULT_CURRENCY,
};
pub use envelope::{ApiErrorResponse, ApiResponse, Cached, ErrorBody, ErrorDetail};
pub use error::{CoreError, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use service::MarketService;
pub use snapshot::{InMemorySnapshot, JsonFileSnapshot, SnapshotSource};
pub use throttling::UpstreamThrottle;
