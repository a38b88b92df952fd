use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

/// Listing currency used when neither upstream nor storage supplies one.
pub const DEFAULT_CURRENCY: &str = "AED";

/// Canonical stock record shared by the cache, the adapter, and aggregation.
///
/// `change` and `change_percent` are derived from the two prices through
/// [`derive_change`] whenever this core builds a record. Records read from
/// storage carry whatever the external writer stored; a numeric field that is
/// null, non-numeric, or non-finite reads as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: Symbol,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub previous_close: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub change: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub change_percent: f64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub volume: u64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "UtcDateTime::now")]
    pub last_updated: UtcDateTime,
}

impl StockQuote {
    /// Builds a record from raw prices, deriving `change` and `change_percent`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_prices(
        symbol: Symbol,
        name: impl Into<String>,
        sector: Option<String>,
        current_price: f64,
        previous_close: f64,
        volume: u64,
        market_cap: f64,
        currency: impl Into<String>,
        last_updated: UtcDateTime,
    ) -> Self {
        let (change, change_percent) = derive_change(current_price, previous_close);
        Self {
            symbol,
            name: name.into(),
            sector,
            current_price,
            previous_close,
            change,
            change_percent,
            volume,
            market_cap,
            currency: currency.into(),
            last_updated,
        }
    }
}

/// Absolute and percentage move from `previous_close` to `current_price`.
///
/// A zero previous close yields a zero percentage instead of a division by zero.
pub fn derive_change(current_price: f64, previous_close: f64) -> (f64, f64) {
    let change = current_price - previous_close;
    let change_percent = if previous_close == 0.0 {
        0.0
    } else {
        change / previous_close * 100.0
    };
    (change, change_percent)
}

/// Search hit returned by the upstream symbol lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub symbol: Symbol,
    pub name: String,
    pub exchange: String,
}

/// Validate and normalize currency to uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_owned()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Count(u64),
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl LooseNumber {
    fn value(self) -> f64 {
        let number = match self {
            Self::Count(count) => count as f64,
            Self::Number(number) => number,
            Self::Text(text) => text.trim().parse().unwrap_or(0.0),
            Self::Other(_) => 0.0,
        };
        if number.is_finite() {
            number
        } else {
            0.0
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    LooseNumber::deserialize(deserializer).map(LooseNumber::value)
}

/// Rounds fractional counts; negatives read as 0 and the cast saturates at `u64::MAX`.
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseNumber::deserialize(deserializer)? {
        LooseNumber::Count(count) => count,
        other => {
            let number = other.value();
            if number > 0.0 {
                number.round() as u64
            } else {
                0
            }
        }
    })
}
