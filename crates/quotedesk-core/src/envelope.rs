use serde::{Deserialize, Serialize};

use crate::data_source::SourceError;
use crate::UtcDateTime;

/// How much diagnostic text error envelopes carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorDetail {
    /// Stable code and public message only.
    #[default]
    Production,
    /// Adds the underlying error text under `details`.
    Development,
}

impl ErrorDetail {
    /// `development` (any case) enables details; anything else is production.
    pub fn from_env_name(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("development") {
            Self::Development
        } else {
            Self::Production
        }
    }
}

/// Value returned by a façade lookup, tagged with whether it came from cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub data: T,
    pub cached: bool,
}

impl<T> Cached<T> {
    pub fn hit(data: T) -> Self {
        Self { data, cached: true }
    }

    pub fn miss(data: T) -> Self {
        Self {
            data,
            cached: false,
        }
    }
}

/// Success envelope: `{success, data, message?, cached?, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    pub timestamp: UtcDateTime,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            cached: None,
            timestamp: UtcDateTime::now(),
        }
    }

    pub fn from_cached(result: Cached<T>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(result.data),
            message: Some(message.into()),
            cached: Some(result.cached),
            timestamp: UtcDateTime::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Success with no payload, e.g. after clearing the cache.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            cached: None,
            timestamp: UtcDateTime::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure envelope: `{success: false, error: {code, message, details?}, timestamp}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
    pub timestamp: UtcDateTime,
    #[serde(skip)]
    status: u16,
}

impl ApiErrorResponse {
    pub fn from_error(error: &SourceError, detail: ErrorDetail) -> Self {
        let kind = error.kind();
        let details = match detail {
            ErrorDetail::Development => Some(error.message().to_owned()),
            ErrorDetail::Production => None,
        };

        Self {
            success: false,
            error: ErrorBody {
                code: kind.code().to_owned(),
                message: kind.public_message().to_owned(),
                details,
            },
            timestamp: UtcDateTime::now(),
            status: kind.status_code(),
        }
    }

    /// HTTP status the request layer answers with.
    pub const fn status(&self) -> u16 {
        self.status
    }
}
