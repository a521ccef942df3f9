//! Engine error types

use thiserror::Error;

/// Errors surfaced by the engine to its callers.
///
/// Degenerate metrics and non-finite percentages are not errors: the
/// affected dimension or action is skipped instead.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("malformed {context}: {source}")]
    MalformedInput {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdvisorError {
    pub fn malformed(context: &'static str, source: serde_json::Error) -> Self {
        AdvisorError::MalformedInput { context, source }
    }
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;

/// Parse a JSON payload, mapping failures to [`AdvisorError::MalformedInput`]
pub fn parse_json<T: serde::de::DeserializeOwned>(
    context: &'static str,
    bytes: &[u8],
) -> AdvisorResult<T> {
    serde_json::from_slice(bytes).map_err(|e| AdvisorError::malformed(context, e))
}
