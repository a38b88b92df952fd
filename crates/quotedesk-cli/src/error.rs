use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
///
/// Upstream and snapshot failures are not errors here: they are printed as
/// error envelopes and reported through exit code 3.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] quotedesk_core::ValidationError),

    #[error("market commands need a stored snapshot; pass --snapshot <FILE>")]
    MissingSnapshot,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::MissingSnapshot => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
