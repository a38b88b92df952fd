use serde::{Deserialize, Serialize};

use super::{finite_or_zero, mean, round_to, MoveCounts, LARGE_CAP_FLOOR, MEDIUM_CAP_FLOOR};
use crate::{StockQuote, UtcDateTime};

/// Over positive prices only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub range: f64,
}

/// Over positive volumes only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeStats {
    pub average: u64,
    pub highest: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapDistribution {
    /// Above 10B.
    pub large: usize,
    /// Above 1B, up to and including 10B.
    pub medium: usize,
    /// Up to and including 1B.
    pub small: usize,
}

/// Over positive market caps only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketCapStats {
    pub average: f64,
    pub total: f64,
    pub distribution: CapDistribution,
}

/// Over every record, no positivity filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub average_change: f64,
    pub max_gain: f64,
    pub max_loss: f64,
    pub gainers: usize,
    pub losers: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatistics {
    pub price: PriceStats,
    pub volume: VolumeStats,
    pub market_cap: MarketCapStats,
    pub performance: PerformanceStats,
    pub last_updated: UtcDateTime,
}

pub fn statistics(snapshot: &[StockQuote], as_of: UtcDateTime) -> MarketStatistics {
    MarketStatistics {
        price: price_stats(snapshot),
        volume: volume_stats(snapshot),
        market_cap: market_cap_stats(snapshot),
        performance: performance_stats(snapshot),
        last_updated: as_of,
    }
}

fn positive(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values
        .map(finite_or_zero)
        .filter(|value| *value > 0.0)
        .collect()
}

/// Max and min of a sample, `(0, 0)` when empty.
fn extremes(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let highest = values.iter().copied().fold(f64::MIN, f64::max);
    let lowest = values.iter().copied().fold(f64::MAX, f64::min);
    (highest, lowest)
}

fn price_stats(snapshot: &[StockQuote]) -> PriceStats {
    let prices = positive(snapshot.iter().map(|quote| quote.current_price));
    let (highest, lowest) = extremes(&prices);

    PriceStats {
        average: round_to(mean(prices.iter().copied()), 2),
        highest,
        lowest,
        range: highest - lowest,
    }
}

fn volume_stats(snapshot: &[StockQuote]) -> VolumeStats {
    let volumes: Vec<u64> = snapshot
        .iter()
        .map(|quote| quote.volume)
        .filter(|volume| *volume > 0)
        .collect();
    let total = volumes
        .iter()
        .fold(0_u64, |sum, volume| sum.saturating_add(*volume));
    let average = mean(volumes.iter().map(|volume| *volume as f64)).round() as u64;

    VolumeStats {
        average,
        highest: volumes.iter().copied().max().unwrap_or(0),
        total,
    }
}

fn market_cap_stats(snapshot: &[StockQuote]) -> MarketCapStats {
    let caps = positive(snapshot.iter().map(|quote| quote.market_cap));
    let distribution = caps
        .iter()
        .fold(CapDistribution::default(), |mut buckets, cap| {
            if *cap > LARGE_CAP_FLOOR {
                buckets.large += 1;
            } else if *cap > MEDIUM_CAP_FLOOR {
                buckets.medium += 1;
            } else {
                buckets.small += 1;
            }
            buckets
        });

    MarketCapStats {
        average: round_to(mean(caps.iter().copied()), 0),
        total: caps.iter().sum(),
        distribution,
    }
}

fn performance_stats(snapshot: &[StockQuote]) -> PerformanceStats {
    let changes: Vec<f64> = snapshot
        .iter()
        .map(|quote| finite_or_zero(quote.change_percent))
        .collect();
    let (max_gain, max_loss) = extremes(&changes);
    let moves = MoveCounts::tally(snapshot);

    PerformanceStats {
        average_change: round_to(mean(changes.iter().copied()), 2),
        max_gain: round_to(max_gain, 2),
        max_loss: round_to(max_loss, 2),
        gainers: moves.gainers,
        losers: moves.losers,
        unchanged: moves.unchanged,
    }
}
