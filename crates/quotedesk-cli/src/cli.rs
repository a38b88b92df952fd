//! CLI argument definitions for quotedesk.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stocks` | Quotes for every tracked listing |
//! | `quote` | Quote for one listing |
//! | `search` | Upstream symbol search |
//! | `market` | Views over a stored snapshot |
//! | `cache` | Cache statistics and clearing |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--dev` | `false` | Include error details in error envelopes |
//! | `--snapshot` | none | JSON file of stored stock records |
//! | `--repeat` | `1` | Run the command N times in one process |
//! | `--upstream-url` | env / default | Quote provider base URL |
//! | `--symbols` | env / default | Comma-separated tracked listings |
//!
//! # Examples
//!
//! ```bash
//! quotedesk quote emaar --repeat 2 --pretty
//! quotedesk market sectors --limit 5 --snapshot stocks.json
//! RUST_LOG=quotedesk_core=debug quotedesk stocks
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use quotedesk_core::config::parse_symbol_list;
use quotedesk_core::{ErrorDetail, ServiceConfig};

use crate::error::CliError;

/// Cached quotes and market views for Dubai Financial Market listings.
#[derive(Debug, Parser)]
#[command(name = "quotedesk", author, version, about)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Include diagnostic details in error envelopes.
    #[arg(long, global = true, default_value_t = false)]
    pub dev: bool,

    /// JSON array of stored stock records used by `market` commands.
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Run the command this many times against one in-process cache.
    #[arg(long, global = true, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub repeat: u32,

    /// Override the quote provider base URL.
    #[arg(long, global = true)]
    pub upstream_url: Option<String>,

    /// Override the tracked listings (comma-separated).
    #[arg(long, global = true)]
    pub symbols: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Environment-derived configuration with command-line overrides applied last.
    pub fn service_config(&self) -> Result<ServiceConfig, CliError> {
        let mut config = ServiceConfig::from_env()?;

        if let Some(url) = &self.upstream_url {
            config.upstream.base_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(symbols) = &self.symbols {
            config.upstream.tracked_symbols = parse_symbol_list(symbols)?;
        }
        if self.dev {
            config.error_detail = ErrorDetail::Development;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Quotes for every tracked listing (cached 300s).
    Stocks,

    /// Quote for one listing (cached 300s).
    ///
    ///   quotedesk quote EMAAR
    Quote(QuoteArgs),

    /// Upstream symbol search, target exchange only (cached 600s).
    ///
    ///   quotedesk search "emirates nbd"
    Search(SearchArgs),

    /// Aggregated views over the stored snapshot.
    Market(MarketArgs),

    /// Cache management.
    Cache(CacheArgs),
}

impl Command {
    pub fn needs_snapshot(&self) -> bool {
        matches!(self, Self::Market(_))
    }
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Listing code, e.g. EMAAR (case-insensitive).
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-text query.
    pub query: String,
}

#[derive(Debug, Args)]
pub struct LimitArgs {
    /// Number of rows to return.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct MarketArgs {
    #[command(subcommand)]
    pub command: MarketCommand,
}

#[derive(Debug, Subcommand)]
pub enum MarketCommand {
    /// Totals, move counts, and the ten largest sectors.
    Overview,
    /// Per-sector performance (limit 1-50, default 20).
    Sectors(LimitArgs),
    /// Highest volume listings (limit 1-20, default 10).
    Trending(LimitArgs),
    /// Price, volume, market-cap, and performance statistics.
    Statistics,
    /// Illustrative market indices.
    Indices,
    /// Largest percentage gains (limit 1-50, default 10).
    Gainers(LimitArgs),
    /// Largest percentage losses (limit 1-50, default 10).
    Losers(LimitArgs),
    /// Largest volumes (limit 1-50, default 10).
    Volume(LimitArgs),
    /// Stored listings matching a query on symbol, name, or sector.
    Find(SearchArgs),
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Total, valid, and expired entry counts.
    Stats,
    /// Remove every entry.
    Clear,
}
