use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{finite_or_zero, round_to, sector_label, MoveCounts};
use crate::{StockQuote, UtcDateTime};

/// Unrounded per-sector accumulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorRollup {
    pub sector: String,
    pub stock_count: usize,
    pub total_market_cap: f64,
    pub total_volume: u64,
    /// Mean `change_percent` within the sector.
    pub avg_change: f64,
    pub moves: MoveCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorPerformance {
    pub sector: String,
    pub stock_count: usize,
    pub total_market_cap: f64,
    pub total_volume: u64,
    pub avg_change: f64,
    pub gainers: usize,
    pub losers: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorPerformanceView {
    pub sectors: Vec<SectorPerformance>,
    /// Sector count before truncation.
    pub total_sectors: usize,
    pub last_updated: UtcDateTime,
}

#[derive(Default)]
struct Accumulator<'a> {
    members: Vec<&'a StockQuote>,
    total_market_cap: f64,
    total_volume: u64,
    change_percent_sum: f64,
}

/// Every sector in the snapshot, largest total market cap first.
///
/// Equal caps order by sector name.
pub fn sector_rollups(snapshot: &[StockQuote]) -> Vec<SectorRollup> {
    let mut groups: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();
    for quote in snapshot {
        let group = groups.entry(sector_label(quote)).or_default();
        group.members.push(quote);
        group.total_market_cap += finite_or_zero(quote.market_cap);
        group.total_volume = group.total_volume.saturating_add(quote.volume);
        group.change_percent_sum += finite_or_zero(quote.change_percent);
    }

    let mut rollups: Vec<SectorRollup> = groups
        .into_iter()
        .map(|(sector, group)| {
            let stock_count = group.members.len();
            SectorRollup {
                sector: sector.to_owned(),
                stock_count,
                total_market_cap: group.total_market_cap,
                total_volume: group.total_volume,
                avg_change: group.change_percent_sum / stock_count as f64,
                moves: MoveCounts::tally(group.members),
            }
        })
        .collect();

    // BTreeMap iteration is already name-ordered, so a stable sort keeps
    // name order among equal caps.
    rollups.sort_by(|a, b| b.total_market_cap.total_cmp(&a.total_market_cap));
    rollups
}

/// Sector rollups truncated to `limit`, with `avg_change` at 2 decimals.
pub fn sector_performance(
    snapshot: &[StockQuote],
    limit: usize,
    as_of: UtcDateTime,
) -> SectorPerformanceView {
    let rollups = sector_rollups(snapshot);
    let total_sectors = rollups.len();

    let sectors = rollups
        .into_iter()
        .take(limit)
        .map(|rollup| SectorPerformance {
            sector: rollup.sector,
            stock_count: rollup.stock_count,
            total_market_cap: rollup.total_market_cap,
            total_volume: rollup.total_volume,
            avg_change: round_to(rollup.avg_change, 2),
            gainers: rollup.moves.gainers,
            losers: rollup.moves.losers,
            unchanged: rollup.stock_count - rollup.moves.gainers - rollup.moves.losers,
        })
        .collect();

    SectorPerformanceView {
        sectors,
        total_sectors,
        last_updated: as_of,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{as_of, stock};
    use super::*;

    #[test]
    fn groups_and_orders_by_market_cap() {
        let snapshot = vec![
            stock("ENBD", "Banking", 20.0, 19.0, 500, 120e9),
            stock("DIB", "Banking", 6.0, 6.0, 300, 40e9),
            stock("EMAAR", "Real Estate", 9.0, 10.0, 900, 80e9),
            stock("DEWA", "Utilities", 2.5, 2.4, 1_000, 125e9),
        ];

        let view = sector_performance(&snapshot, 20, as_of());
        let names: Vec<&str> = view.sectors.iter().map(|s| s.sector.as_str()).collect();

        assert_eq!(names, vec!["Banking", "Utilities", "Real Estate"]);
        assert_eq!(view.total_sectors, 3);

        let banking = &view.sectors[0];
        assert_eq!(banking.stock_count, 2);
        assert_eq!(banking.total_volume, 800);
        assert_eq!((banking.gainers, banking.losers, banking.unchanged), (1, 0, 1));
        assert_eq!(banking.avg_change, round_to((100.0 / 19.0) / 2.0, 2));
    }

    #[test]
    fn truncates_but_reports_total() {
        let snapshot = vec![
            stock("A", "One", 1.0, 1.0, 1, 3.0),
            stock("B", "Two", 1.0, 1.0, 1, 2.0),
            stock("C", "Three", 1.0, 1.0, 1, 1.0),
        ];
        let view = sector_performance(&snapshot, 2, as_of());

        assert_eq!(view.sectors.len(), 2);
        assert_eq!(view.total_sectors, 3);
    }

    #[test]
    fn equal_caps_order_by_name() {
        let snapshot = vec![
            stock("A", "Transport", 1.0, 1.0, 1, 5.0),
            stock("B", "Insurance", 1.0, 1.0, 1, 5.0),
        ];
        let rollups = sector_rollups(&snapshot);
        assert_eq!(rollups[0].sector, "Insurance");
        assert_eq!(rollups[1].sector, "Transport");
    }

    #[test]
    fn missing_sector_groups_as_unknown() {
        let mut record = stock("X", "ignored", 1.0, 1.0, 1, 1.0);
        record.sector = None;
        let rollups = sector_rollups(&[record]);
        assert_eq!(rollups[0].sector, super::super::UNKNOWN_SECTOR);
    }
}
