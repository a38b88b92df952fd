//! # Aggregation Engine
//!
//! Pure functions over a snapshot of canonical records. None of them fail:
//! non-finite numbers count as 0, records without a sector group under
//! [`UNKNOWN_SECTOR`], and means over an empty sample are 0.
//!
//! Every ranking is total: ties fall through to the symbol, ascending, so
//! the same snapshot always yields the same order.
//!
//! | Function | View |
//! |----------|------|
//! | [`overview`] | [`MarketOverview`] |
//! | [`sector_performance`] | [`SectorPerformanceView`] |
//! | [`trending`] | [`TrendingView`] |
//! | [`top_gainers`], [`top_losers`], [`top_volume`] | ranked records |
//! | [`statistics`] | [`MarketStatistics`] |
//! | [`indices`] | [`IndicesView`] |
//! | [`search_snapshot`] | matching records |

mod indices;
mod overview;
mod ranking;
mod sectors;
mod statistics;

use serde::{Deserialize, Serialize};

use crate::{StockQuote, ValidationError};

pub use indices::{indices, IndicesView, MarketIndex};
pub use overview::{overview, MarketOverview, SectorSummary};
pub use ranking::{
    search_snapshot, top_gainers, top_losers, top_volume, trending, TrendingStock, TrendingView,
};
pub use sectors::{sector_performance, sector_rollups, SectorPerformance, SectorPerformanceView, SectorRollup};
pub use statistics::{
    statistics, CapDistribution, MarketCapStats, MarketStatistics, PerformanceStats, PriceStats,
    VolumeStats,
};

/// Label for records stored without a sector.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Sectors returned by the overview.
pub const OVERVIEW_TOP_SECTORS: usize = 10;

pub const LARGE_CAP_FLOOR: f64 = 10_000_000_000.0;
pub const MEDIUM_CAP_FLOOR: f64 = 1_000_000_000.0;

/// Default and accepted range for a caller-supplied limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitBounds {
    pub name: &'static str,
    pub default: usize,
    pub max: usize,
}

pub const SECTOR_LIMIT: LimitBounds = LimitBounds {
    name: "sectors limit",
    default: 20,
    max: 50,
};

pub const TRENDING_LIMIT: LimitBounds = LimitBounds {
    name: "trending limit",
    default: 10,
    max: 20,
};

pub const TOP_LIMIT: LimitBounds = LimitBounds {
    name: "top-N limit",
    default: 10,
    max: 50,
};

impl LimitBounds {
    /// `None` takes the default; values outside `1..=max` are rejected.
    pub fn resolve(&self, requested: Option<usize>) -> Result<usize, ValidationError> {
        let Some(value) = requested else {
            return Ok(self.default);
        };
        if value == 0 || value > self.max {
            return Err(ValidationError::LimitOutOfRange {
                name: self.name,
                value,
                min: 1,
                max: self.max,
            });
        }
        Ok(value)
    }
}

/// Gainer/loser/unchanged split by the sign of `change`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCounts {
    pub gainers: usize,
    pub losers: usize,
    pub unchanged: usize,
}

impl MoveCounts {
    pub fn tally<'a>(quotes: impl IntoIterator<Item = &'a StockQuote>) -> Self {
        quotes
            .into_iter()
            .fold(Self::default(), |mut counts, quote| {
                let change = finite_or_zero(quote.change);
                if change > 0.0 {
                    counts.gainers += 1;
                } else if change < 0.0 {
                    counts.losers += 1;
                } else {
                    counts.unchanged += 1;
                }
                counts
            })
    }
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Arithmetic mean, 0 for an empty sample.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), value| {
            (sum + finite_or_zero(value), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        // Avoid serializing -0.0.
        0.0
    } else {
        rounded
    }
}

pub(crate) fn sector_label(quote: &StockQuote) -> &str {
    match quote.sector.as_deref().map(str::trim) {
        Some(sector) if !sector.is_empty() => sector,
        _ => UNKNOWN_SECTOR,
    }
}

pub(crate) fn total_volume<'a>(quotes: impl IntoIterator<Item = &'a StockQuote>) -> u64 {
    quotes
        .into_iter()
        .fold(0_u64, |sum, quote| sum.saturating_add(quote.volume))
}

pub(crate) fn total_market_cap<'a>(quotes: impl IntoIterator<Item = &'a StockQuote>) -> f64 {
    quotes
        .into_iter()
        .map(|quote| finite_or_zero(quote.market_cap))
        .sum()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::{StockQuote, Symbol, UtcDateTime};

    pub fn as_of() -> UtcDateTime {
        UtcDateTime::parse("2025-06-02T10:00:00Z").expect("timestamp")
    }

    /// Record with `change` derived from the two prices.
    pub fn stock(
        symbol: &str,
        sector: &str,
        current: f64,
        previous: f64,
        volume: u64,
        market_cap: f64,
    ) -> StockQuote {
        StockQuote::from_prices(
            Symbol::parse(symbol).expect("symbol"),
            format!("{symbol} PJSC"),
            Some(sector.to_owned()),
            current,
            previous,
            volume,
            market_cap,
            "AED",
            as_of(),
        )
    }
}
