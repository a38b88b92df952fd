//! Quote source contract and the error taxonomy shared by every layer.
//!
//! The [`QuoteSource`] trait is what the query façade calls on a cache miss.
//! Every failure it reports is a [`SourceError`] whose [`SourceErrorKind`]
//! decides both the stable wire code and the HTTP status the request layer
//! answers with.
//!
//! | Kind | Code | Status |
//! |------|------|--------|
//! | `UpstreamUnavailable` | `SERVICE_UNAVAILABLE` | 503 |
//! | `UpstreamNotFound` | `STOCK_NOT_FOUND` | 404 |
//! | `UpstreamRateLimited` | `RATE_LIMIT_EXCEEDED` | 429 |
//! | `Network` | `NETWORK_ERROR` | 503 |
//! | `Timeout` | `TIMEOUT_ERROR` | 504 |
//! | `Validation` | `VALIDATION_ERROR` | 400 |
//! | `CacheFault` | `CACHE_FAULT` | 500 |
//! | `Internal` | `INTERNAL_ERROR` | 500 |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{SearchHit, StockQuote, Symbol, ValidationError};

/// Boxed future returned by source contracts.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Failure classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorKind {
    UpstreamUnavailable,
    UpstreamNotFound,
    UpstreamRateLimited,
    Network,
    Timeout,
    Validation,
    /// Recovered inside the cache; never returned from a public operation.
    CacheFault,
    Internal,
}

impl SourceErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::UpstreamUnavailable => "SERVICE_UNAVAILABLE",
            Self::UpstreamNotFound => "STOCK_NOT_FOUND",
            Self::UpstreamRateLimited => "RATE_LIMIT_EXCEEDED",
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::CacheFault => "CACHE_FAULT",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    pub const fn status_code(self) -> u16 {
        match self {
            Self::UpstreamUnavailable | Self::Network => 503,
            Self::UpstreamNotFound => 404,
            Self::UpstreamRateLimited => 429,
            Self::Timeout => 504,
            Self::Validation => 400,
            Self::CacheFault | Self::Internal => 500,
        }
    }

    /// Message safe to show outside development mode.
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::UpstreamUnavailable => "Quote service is temporarily unavailable",
            Self::UpstreamNotFound => "Stock not found",
            Self::UpstreamRateLimited => "Too many requests to the quote service",
            Self::Network => "Network error - unable to reach the quote service",
            Self::Timeout => "Request timeout - the quote service is slow to respond",
            Self::Validation => "Validation error",
            Self::CacheFault | Self::Internal => "Internal Server Error",
        }
    }
}

/// Structured error carrying a classification and diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::UpstreamUnavailable, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::UpstreamNotFound, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::UpstreamRateLimited, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Timeout, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Validation, message)
    }

    pub fn cache_fault(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::CacheFault, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message)
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub const fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(value: ValidationError) -> Self {
        Self::validation(value.to_string())
    }
}

/// Upstream quote provider contract.
///
/// Implementations classify every failure; the façade never retries.
pub trait QuoteSource: Send + Sync {
    /// Fetches one normalized quote.
    fn fetch_one<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, StockQuote>;

    /// Fetches normalized quotes for a batch of symbols in one upstream call.
    fn fetch_many<'a>(&'a self, symbols: &'a [Symbol]) -> SourceFuture<'a, Vec<StockQuote>>;

    /// Free-text symbol lookup restricted to the configured exchange.
    fn search<'a>(&'a self, query: &'a str) -> SourceFuture<'a, Vec<SearchHit>>;
}
