//! Service configuration.
//!
//! Values layer as `Default` < `QUOTEDESK_*` environment variables < explicit
//! overrides applied by the caller (the CLI applies its flags last).

use std::num::NonZeroU32;
use std::time::Duration;

use crate::envelope::ErrorDetail;
use crate::{validate_currency_code, Symbol, ValidationError, DEFAULT_CURRENCY};

/// Listings tracked by the "all quotes" endpoint.
pub const TRACKED_SYMBOLS: [&str; 13] = [
    "EMAAR", "DU", "ENBD", "DEWA", "SALIK", "AMLAK", "ARTC", "DAMAC", "DFM", "GULFNAV", "SHUAA",
    "TECOM", "UPP",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Prefix applied to every key.
    pub namespace: String,
    pub default_ttl: Duration,
    /// TTL for single and all-quote lookups.
    pub quote_ttl: Duration,
    pub search_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: String::from("dfm_stock_"),
            default_ttl: Duration::from_secs(300),
            quote_ttl: Duration::from_secs(300),
            search_ttl: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Provider suffix appended to listing codes, e.g. `.AD`.
    pub symbol_suffix: String,
    /// Search hits from other exchanges are dropped.
    pub exchange: String,
    pub default_currency: String,
    pub tracked_symbols: Vec<Symbol>,
    pub single_timeout: Duration,
    pub batch_timeout: Duration,
    pub requests_per_minute: NonZeroU32,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://query1.finance.yahoo.com"),
            symbol_suffix: String::from(".AD"),
            exchange: String::from("DFM"),
            default_currency: String::from(DEFAULT_CURRENCY),
            tracked_symbols: TRACKED_SYMBOLS
                .iter()
                .filter_map(|raw| Symbol::parse(raw).ok())
                .collect(),
            single_timeout: Duration::from_secs(10),
            batch_timeout: Duration::from_secs(15),
            requests_per_minute: NonZeroU32::new(60).unwrap_or(NonZeroU32::MIN),
            user_agent: String::from(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    pub upstream: UpstreamConfig,
    pub error_detail: ErrorDetail,
}

impl ServiceConfig {
    /// Defaults overlaid with `QUOTEDESK_*` process environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("QUOTEDESK_CACHE_NAMESPACE") {
            config.cache.namespace = value;
        }
        if let Some(value) = lookup("QUOTEDESK_CACHE_TTL_SECS") {
            config.cache.default_ttl = parse_secs("cache.default_ttl", &value)?;
        }
        if let Some(value) = lookup("QUOTEDESK_QUOTE_TTL_SECS") {
            config.cache.quote_ttl = parse_secs("cache.quote_ttl", &value)?;
        }
        if let Some(value) = lookup("QUOTEDESK_SEARCH_TTL_SECS") {
            config.cache.search_ttl = parse_secs("cache.search_ttl", &value)?;
        }

        if let Some(value) = lookup("QUOTEDESK_UPSTREAM_URL") {
            config.upstream.base_url = value.trim_end_matches('/').to_owned();
        }
        if let Some(value) = lookup("QUOTEDESK_SYMBOL_SUFFIX") {
            config.upstream.symbol_suffix = value;
        }
        if let Some(value) = lookup("QUOTEDESK_EXCHANGE") {
            config.upstream.exchange = value;
        }
        if let Some(value) = lookup("QUOTEDESK_CURRENCY") {
            config.upstream.default_currency = validate_currency_code(&value)?;
        }
        if let Some(value) = lookup("QUOTEDESK_SYMBOLS") {
            config.upstream.tracked_symbols = parse_symbol_list(&value)?;
        }
        if let Some(value) = lookup("QUOTEDESK_SINGLE_TIMEOUT_MS") {
            config.upstream.single_timeout = parse_millis("upstream.single_timeout", &value)?;
        }
        if let Some(value) = lookup("QUOTEDESK_BATCH_TIMEOUT_MS") {
            config.upstream.batch_timeout = parse_millis("upstream.batch_timeout", &value)?;
        }
        if let Some(value) = lookup("QUOTEDESK_REQUESTS_PER_MINUTE") {
            config.upstream.requests_per_minute = value
                .trim()
                .parse::<NonZeroU32>()
                .map_err(|err| invalid("upstream.requests_per_minute", err))?;
        }
        if let Some(value) = lookup("QUOTEDESK_ENV") {
            config.error_detail = ErrorDetail::from_env_name(&value);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let durations = [
            ("cache.default_ttl", self.cache.default_ttl),
            ("cache.quote_ttl", self.cache.quote_ttl),
            ("cache.search_ttl", self.cache.search_ttl),
            ("upstream.single_timeout", self.upstream.single_timeout),
            ("upstream.batch_timeout", self.upstream.batch_timeout),
        ];
        for (field, value) in durations {
            if value.is_zero() {
                return Err(ValidationError::InvalidConfig {
                    field,
                    reason: String::from("must be greater than zero"),
                });
            }
        }

        if self.upstream.tracked_symbols.is_empty() {
            return Err(ValidationError::InvalidConfig {
                field: "upstream.tracked_symbols",
                reason: String::from("at least one symbol is required"),
            });
        }

        validate_currency_code(&self.upstream.default_currency)?;
        Ok(())
    }
}

/// Comma-separated listing codes; blanks are skipped.
pub fn parse_symbol_list(input: &str) -> Result<Vec<Symbol>, ValidationError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(Symbol::parse)
        .collect()
}

fn parse_secs(field: &'static str, value: &str) -> Result<Duration, ValidationError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|err| invalid(field, err))
}

fn parse_millis(field: &'static str, value: &str) -> Result<Duration, ValidationError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|err| invalid(field, err))
}

fn invalid(field: &'static str, err: impl std::fmt::Display) -> ValidationError {
    ValidationError::InvalidConfig {
        field,
        reason: err.to_string(),
    }
}
