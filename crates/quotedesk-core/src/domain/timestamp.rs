use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// UTC instant carried on records and views, written as RFC 3339 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Accepts RFC 3339 text with a zero offset only.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        OffsetDateTime::parse(input.trim(), &Rfc3339)
            .ok()
            .filter(|parsed| parsed.offset() == UtcOffset::UTC)
            .map(Self)
            .ok_or_else(|| ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            })
    }
}

impl TryFrom<String> for UtcDateTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UtcDateTime> for String {
    fn from(value: UtcDateTime) -> Self {
        // Rfc3339 only rejects years outside 0..=9999.
        value
            .0
            .format(&Rfc3339)
            .unwrap_or_else(|_| value.0.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json_text() {
        let parsed = UtcDateTime::parse("2025-03-14T09:30:00.25Z").expect("must parse");
        let json = serde_json::to_string(&parsed).expect("must serialize");

        assert_eq!(json, "\"2025-03-14T09:30:00.25Z\"");
        assert_eq!(serde_json::from_str::<UtcDateTime>(&json).ok(), Some(parsed));
    }

    #[test]
    fn rejects_offsets_and_garbage() {
        for input in ["2025-03-14T13:30:00+04:00", "yesterday", ""] {
            assert!(matches!(
                UtcDateTime::parse(input),
                Err(ValidationError::TimestampNotUtc { .. })
            ));
        }
    }
}
