//! Error types for blindfold-broker

use std::fmt;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Why a storage transfer did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferCause {
    /// The bounded wait elapsed
    Timeout,
    /// No connection could be established
    Unreachable,
    /// The provider answered with a non-200 status
    Status(u16),
    /// 200 status, but the body was not what the provider contract promises
    InvalidResponse,
}

impl fmt::Display for TransferCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferCause::Timeout => write!(f, "timeout"),
            TransferCause::Unreachable => write!(f, "unreachable"),
            TransferCause::Status(code) => write!(f, "status {}", code),
            TransferCause::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

/// Main error type for blindfold-broker
#[derive(Error, Debug)]
pub enum Error {
    // Key broker errors
    #[error("Shade Agent timeout")]
    BrokerTimeout,

    #[error("Shade Agent connection failed: {0}")]
    BrokerUnreachable(String),

    #[error("Shade key fetch failed: {body}")]
    BrokerProtocolError { status: u16, body: String },

    #[error("Shade key not found in response")]
    KeyMissing,

    // Storage errors
    #[error("Pinata upload failed: {detail}")]
    StorageUploadFailure { cause: TransferCause, detail: String },

    #[error("IPFS fetch failed: {detail}")]
    StorageFetchFailure { cause: TransferCause, detail: String },

    // Request errors
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the failure was a bounded wait running out, on any outbound call
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::BrokerTimeout
                | Error::StorageUploadFailure {
                    cause: TransferCause::Timeout,
                    ..
                }
                | Error::StorageFetchFailure {
                    cause: TransferCause::Timeout,
                    ..
                }
        )
    }

    /// Short stable name of the error kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BrokerTimeout => "broker_timeout",
            Error::BrokerUnreachable(_) => "broker_unreachable",
            Error::BrokerProtocolError { .. } => "broker_protocol_error",
            Error::KeyMissing => "key_missing",
            Error::StorageUploadFailure { .. } => "storage_upload_failure",
            Error::StorageFetchFailure { .. } => "storage_fetch_failure",
            Error::MalformedRequest(_) => "malformed_request",
            Error::Config(_) => "config",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MalformedRequest(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::MalformedRequest(format!("invalid base64 payload: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(Error::BrokerTimeout.is_timeout());
        assert!(Error::StorageFetchFailure {
            cause: TransferCause::Timeout,
            detail: "slow".into(),
        }
        .is_timeout());
        assert!(!Error::StorageUploadFailure {
            cause: TransferCause::Status(500),
            detail: "internal error".into(),
        }
        .is_timeout());
        assert!(!Error::KeyMissing.is_timeout());
    }

    #[test]
    fn test_messages_carry_provider_text() {
        let err = Error::StorageUploadFailure {
            cause: TransferCause::Status(500),
            detail: "internal error".into(),
        };
        assert!(err.to_string().contains("internal error"));

        let err = Error::BrokerProtocolError {
            status: 403,
            body: "account not allowed".into(),
        };
        assert_eq!(err.to_string(), "Shade key fetch failed: account not allowed");
    }
}
