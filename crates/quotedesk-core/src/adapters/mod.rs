//! Upstream quote provider adapters.

mod yahoo;

pub use yahoo::{normalize_chart_meta, ChartMeta, InstrumentInfo, YahooQuoteAdapter};
