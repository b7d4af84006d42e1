//! Error type for the client: local option validation, remote API failures, and transport.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FirecrawlError>;

/// Coarse category of a [`FirecrawlError`], for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidOption,
    MaxCreditsExceeded,
    Api,
    Transport,
    Decode,
}

/// Every failure a scrape call can produce. All are terminal for the call; retrying is up to the caller.
#[derive(Debug, Error)]
pub enum FirecrawlError {
    /// Rejected locally before anything was sent.
    #[error("Invalid option: {message}")]
    InvalidOption { message: String },

    /// The account ran out of credits.
    #[error("{message}")]
    MaxCreditsExceeded { status: Option<u16>, message: String },

    /// Any other non-success response from the API.
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    #[error("Network error: could not reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response from {action}: {reason}")]
    Decode { action: String, reason: String },

    #[error("Failed to create HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

impl FirecrawlError {
    pub(crate) fn invalid_option(message: impl Into<String>) -> Self {
        FirecrawlError::InvalidOption {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FirecrawlError::InvalidOption { .. } => ErrorKind::InvalidOption,
            FirecrawlError::MaxCreditsExceeded { .. } => ErrorKind::MaxCreditsExceeded,
            FirecrawlError::Api { .. } => ErrorKind::Api,
            FirecrawlError::Transport { .. } | FirecrawlError::ClientBuild { .. } => {
                ErrorKind::Transport
            }
            FirecrawlError::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// HTTP status of the response that produced this error, when there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FirecrawlError::MaxCreditsExceeded { status, .. }
            | FirecrawlError::Api { status, .. } => *status,
            FirecrawlError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            FirecrawlError::InvalidOption { message }
            | FirecrawlError::MaxCreditsExceeded { message, .. }
            | FirecrawlError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_status_for_remote_errors() {
        let e = FirecrawlError::MaxCreditsExceeded {
            status: Some(402),
            message: "Insufficient credits".into(),
        };
        assert_eq!(e.kind(), ErrorKind::MaxCreditsExceeded);
        assert_eq!(e.status_code(), Some(402));
        assert_eq!(e.to_string(), "Insufficient credits");

        let e = FirecrawlError::Api {
            status: Some(500),
            message: "boom".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Api);
        assert_eq!(e.status_code(), Some(500));
    }

    #[test]
    fn invalid_option_has_no_status() {
        let e = FirecrawlError::invalid_option("unknown format 'pdf'");
        assert_eq!(e.kind(), ErrorKind::InvalidOption);
        assert_eq!(e.status_code(), None);
        assert_eq!(e.message(), "unknown format 'pdf'");
        assert_eq!(e.to_string(), "Invalid option: unknown format 'pdf'");
    }
}
