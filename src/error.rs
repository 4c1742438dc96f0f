//! Error types for the share card renderer

use thiserror::Error;

/// Result type alias for render operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a card.
///
/// Every variant is terminal for the request that produced it; nothing is
/// retried internally and no partially drawn image is ever returned.
#[derive(Error, Debug)]
pub enum Error {
    /// Payload tag does not match the renderer, or a required field is missing
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Mascot index outside 1..=4
    #[error("Mascot index {0} is out of range (expected 1..=4)")]
    AssetIndexOutOfRange(i64),

    /// A required layer could not be fetched or decoded, including timeouts
    #[error("Failed to fetch asset {url}: {reason}")]
    AssetFetchFailed { url: String, reason: String },

    /// The drawing surface could not be acquired
    #[error("Drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// Payload `type` is not a known card template
    #[error("Unknown card type: {0}")]
    UnknownCardType(String),

    /// A font face could not be parsed or was used before registration
    #[error("Font load failed: {0}")]
    FontLoadError(String),

    /// The finished canvas could not be encoded
    #[error("Encoding failed: {0}")]
    EncodeError(String),

    /// The render was cancelled at a fetch-join boundary
    #[error("Render cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::AssetFetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure originated in the asset pipeline.
    pub fn is_asset_error(&self) -> bool {
        matches!(
            self,
            Error::AssetFetchFailed { .. } | Error::AssetIndexOutOfRange(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidPayload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_carries_url_and_reason() {
        let err = Error::fetch("/img/chrome.png", "404 Not Found");
        assert!(err.is_asset_error());
        assert_eq!(err.to_string(), "Failed to fetch asset /img/chrome.png: 404 Not Found");
    }

    #[test]
    fn payload_errors_are_not_asset_errors() {
        assert!(!Error::InvalidPayload("x".into()).is_asset_error());
        assert!(Error::AssetIndexOutOfRange(5).is_asset_error());
    }
}
