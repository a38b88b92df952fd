use serde::{Deserialize, Serialize};

use super::{mean, round_to, total_market_cap, total_volume};
use crate::{StockQuote, UtcDateTime};

/// Illustrative index row. Only the general index takes anything from the
/// snapshot (mean move, volume, and market cap); headline values are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    pub name: String,
    pub symbol: String,
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicesView {
    pub indices: Vec<MarketIndex>,
    pub last_updated: UtcDateTime,
}

pub fn indices(snapshot: &[StockQuote], as_of: UtcDateTime) -> IndicesView {
    let general = MarketIndex {
        name: String::from("DFM General Index"),
        symbol: String::from("DFMGI"),
        value: 3500.25,
        change: 45.67,
        change_percent: round_to(mean(snapshot.iter().map(|quote| quote.change_percent)), 2),
        volume: total_volume(snapshot),
        market_cap: total_market_cap(snapshot),
    };

    let shariah = MarketIndex {
        name: String::from("DFM Shariah Index"),
        symbol: String::from("DFMSI"),
        value: 1250.80,
        change: 12.45,
        change_percent: 1.00,
        volume: 15_000_000,
        market_cap: 45_000_000_000.0,
    };

    let financials = MarketIndex {
        name: String::from("DFM Financial Services Index"),
        symbol: String::from("DFMFI"),
        value: 2800.15,
        change: -25.30,
        change_percent: -0.89,
        volume: 25_000_000,
        market_cap: 35_000_000_000.0,
    };

    IndicesView {
        indices: vec![general, shariah, financials],
        last_updated: as_of,
    }
}
