//! # Domain Models
//!
//! Canonical types shared by the cache, the quote adapter, and the
//! aggregation engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`StockQuote`] | Canonical stock record (prices, volume, market cap) |
//! | [`SearchHit`] | Upstream symbol lookup result |
//! | [`Symbol`] | Validated listing code |
//! | [`UtcDateTime`] | UTC timestamp |

mod models;
mod symbol;
mod timestamp;

pub use models::{derive_change, validate_currency_code, SearchHit, StockQuote, DEFAULT_CURRENCY};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
