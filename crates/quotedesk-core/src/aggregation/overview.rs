use serde::{Deserialize, Serialize};

use super::{
    mean, round_to, sector_rollups, total_market_cap, total_volume, MoveCounts,
    OVERVIEW_TOP_SECTORS,
};
use crate::{StockQuote, UtcDateTime};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    pub sector: String,
    pub count: usize,
    pub total_market_cap: f64,
    pub total_volume: u64,
    /// Unrounded mean `change_percent`.
    pub avg_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    pub total_stocks: usize,
    pub total_volume: u64,
    pub total_market_cap: f64,
    pub gainers: usize,
    pub losers: usize,
    pub unchanged: usize,
    /// Mean `change_percent` over the snapshot, 2 decimals.
    pub avg_change: f64,
    pub top_sectors: Vec<SectorSummary>,
    pub last_updated: UtcDateTime,
}

pub fn overview(snapshot: &[StockQuote], as_of: UtcDateTime) -> MarketOverview {
    let moves = MoveCounts::tally(snapshot);
    let top_sectors = sector_rollups(snapshot)
        .into_iter()
        .take(OVERVIEW_TOP_SECTORS)
        .map(|rollup| SectorSummary {
            sector: rollup.sector,
            count: rollup.stock_count,
            total_market_cap: rollup.total_market_cap,
            total_volume: rollup.total_volume,
            avg_change: rollup.avg_change,
        })
        .collect();

    MarketOverview {
        total_stocks: snapshot.len(),
        total_volume: total_volume(snapshot),
        total_market_cap: total_market_cap(snapshot),
        gainers: moves.gainers,
        losers: moves.losers,
        unchanged: moves.unchanged,
        avg_change: round_to(mean(snapshot.iter().map(|quote| quote.change_percent)), 2),
        top_sectors,
        last_updated: as_of,
    }
}
