// Fetch errors
//
// SourceError stays at the retrieval boundary and decides what is worth
// retrying; FetchError is what callers of the client see.

use crate::genbank::ParseError;
use thiserror::Error;

/// Coarse classification of a [`FetchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    InvalidRequest,
    NotFound,
    Timeout,
    Network,
    Status,
    MalformedResponse,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("record {id} not found")]
    NotFound { id: String },

    #[error("timed out fetching {id}")]
    Timeout { id: String },

    #[error("network error fetching {id} after {attempts} attempt(s): {message}")]
    Network {
        id: String,
        attempts: u32,
        message: String,
    },

    #[error("server answered HTTP {status} for {id}")]
    Status { id: String, status: u16 },

    #[error("response for {id} is not a valid GenBank record: {cause}")]
    MalformedResponse {
        id: String,
        #[source]
        cause: ParseError,
    },

    #[error("requested {expected} but the response holds {found}")]
    UnexpectedRecord { expected: String, found: String },

    #[error("fetch of {id} was cancelled")]
    Cancelled { id: String },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidRequest(_) => FetchErrorKind::InvalidRequest,
            FetchError::NotFound { .. } => FetchErrorKind::NotFound,
            FetchError::Timeout { .. } => FetchErrorKind::Timeout,
            FetchError::Network { .. } => FetchErrorKind::Network,
            FetchError::Status { .. } => FetchErrorKind::Status,
            FetchError::MalformedResponse { .. } | FetchError::UnexpectedRecord { .. } => {
                FetchErrorKind::MalformedResponse
            },
            FetchError::Cancelled { .. } => FetchErrorKind::Cancelled,
        }
    }

    pub(crate) fn invalid_request(msg: impl Into<String>) -> Self {
        FetchError::InvalidRequest(msg.into())
    }

    /// Final error once a source failure is not (or no longer) retried
    pub(crate) fn from_source(id: &str, attempts: u32, error: SourceError) -> Self {
        let id = id.to_string();
        match error {
            SourceError::NotFound => FetchError::NotFound { id },
            SourceError::Timeout => FetchError::Timeout { id },
            SourceError::Network(message) => FetchError::Network {
                id,
                attempts,
                message,
            },
            SourceError::Status(status) => FetchError::Status { id, status },
        }
    }
}

/// Failure reported by a [`RecordSource`](super::RecordSource)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("record not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(u16),
}

impl SourceError {
    /// Timeouts, connection failures, 408, 429 and 5xx are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::NotFound => false,
            SourceError::Timeout | SourceError::Network(_) => true,
            SourceError::Status(status) => matches!(status, 408 | 429 | 500..=599),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SourceError::Timeout
        } else {
            SourceError::Network(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(SourceError::Status(503).is_retryable());
        assert!(SourceError::Status(429).is_retryable());
        assert!(SourceError::Status(408).is_retryable());
        assert!(!SourceError::Status(403).is_retryable());
        assert!(!SourceError::NotFound.is_retryable());
        assert!(SourceError::Timeout.is_retryable());
    }

    #[test]
    fn test_kind_mapping() {
        let err = FetchError::from_source("X1", 3, SourceError::Status(502));
        assert_eq!(err.kind(), FetchErrorKind::Status);

        let err = FetchError::UnexpectedRecord {
            expected: "X1".to_string(),
            found: "Y2.1".to_string(),
        };
        assert_eq!(err.kind(), FetchErrorKind::MalformedResponse);

        let err = FetchError::MalformedResponse {
            id: "X1".to_string(),
            cause: ParseError::EmptyInput,
        };
        assert!(err.to_string().contains("X1"));
    }
}
