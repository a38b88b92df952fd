use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{finite_or_zero, sector_label};
use crate::{StockQuote, Symbol, UtcDateTime};

/// Projection returned by the trending view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingStock {
    pub symbol: Symbol,
    pub name: String,
    pub current_price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl From<&StockQuote> for TrendingStock {
    fn from(quote: &StockQuote) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            name: quote.name.clone(),
            current_price: quote.current_price,
            change: quote.change,
            change_percent: quote.change_percent,
            volume: quote.volume,
            sector: quote.sector.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingView {
    pub trending: Vec<TrendingStock>,
    pub last_updated: UtcDateTime,
}

fn pct(quote: &StockQuote) -> f64 {
    finite_or_zero(quote.change_percent)
}

fn by_symbol(a: &StockQuote, b: &StockQuote) -> Ordering {
    a.symbol.cmp(&b.symbol)
}

fn ranked<F>(snapshot: &[StockQuote], limit: usize, order: F) -> Vec<&StockQuote>
where
    F: Fn(&StockQuote, &StockQuote) -> Ordering,
{
    let mut ranked: Vec<&StockQuote> = snapshot.iter().collect();
    ranked.sort_by(|a, b| order(a, b).then_with(|| by_symbol(a, b)));
    ranked.truncate(limit);
    ranked
}

/// Highest volume first; equal volumes rank the larger `change_percent` first.
pub fn trending(snapshot: &[StockQuote], limit: usize, as_of: UtcDateTime) -> TrendingView {
    let trending = ranked(snapshot, limit, |a, b| {
        b.volume
            .cmp(&a.volume)
            .then_with(|| pct(b).total_cmp(&pct(a)))
    })
    .into_iter()
    .map(TrendingStock::from)
    .collect();

    TrendingView {
        trending,
        last_updated: as_of,
    }
}

pub fn top_gainers(snapshot: &[StockQuote], limit: usize) -> Vec<StockQuote> {
    ranked(snapshot, limit, |a, b| pct(b).total_cmp(&pct(a)))
        .into_iter()
        .cloned()
        .collect()
}

pub fn top_losers(snapshot: &[StockQuote], limit: usize) -> Vec<StockQuote> {
    ranked(snapshot, limit, |a, b| pct(a).total_cmp(&pct(b)))
        .into_iter()
        .cloned()
        .collect()
}

pub fn top_volume(snapshot: &[StockQuote], limit: usize) -> Vec<StockQuote> {
    ranked(snapshot, limit, |a, b| b.volume.cmp(&a.volume))
        .into_iter()
        .cloned()
        .collect()
}

/// Case-insensitive substring match on symbol, name, or sector, by symbol.
///
/// A blank query matches nothing.
pub fn search_snapshot(snapshot: &[StockQuote], query: &str) -> Vec<StockQuote> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<StockQuote> = snapshot
        .iter()
        .filter(|quote| {
            quote.symbol.as_str().to_lowercase().contains(&needle)
                || quote.name.to_lowercase().contains(&needle)
                || (quote.sector.is_some() && sector_label(quote).to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();
    matches.sort_by(by_symbol);
    matches
}
