//! Client error types.

use pan123_protocol::Report;
use pan123_protocol::constants::{CODE_DECODE, CODE_FAILED, CODE_REJECTED, CODE_TRANSPORT};

/// Errors produced while talking to the API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Connect, timeout, DNS or TLS failure. Never retried.
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success HTTP status on a raw (non-envelope) request.
    #[error("HTTP {0}")]
    Status(u16),

    /// Body was not JSON or did not have the expected shape.
    #[error("response decode error: {0}")]
    Decode(String),

    /// The server answered with a non-success envelope code.
    #[error("{message}")]
    Rejected { code: i32, message: String },

    /// Caught locally before any request was sent.
    #[error("{0}")]
    Precondition(String),
}

impl ApiError {
    /// Outcome code: `-1` transport/status/precondition, `-2` decode,
    /// `-3` server rejection.
    pub fn code(&self) -> i32 {
        match self {
            Self::Transport(_) | Self::Status(_) => CODE_TRANSPORT,
            Self::Decode(_) => CODE_DECODE,
            Self::Rejected { .. } => CODE_REJECTED,
            Self::Precondition(_) => CODE_FAILED,
        }
    }

    /// The server's own code, for rejections.
    pub fn server_code(&self) -> Option<i32> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl Report for ApiError {
    fn code(&self) -> i32 {
        ApiError::code(self)
    }

    fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_distinguish_transport_and_decode() {
        assert_eq!(ApiError::Transport("dns".into()).code(), -1);
        assert_eq!(ApiError::Decode("eof".into()).code(), -2);
        assert_ne!(
            ApiError::Transport("x".into()).code(),
            ApiError::Decode("x".into()).code()
        );
    }

    #[test]
    fn rejection_keeps_server_message_and_code() {
        let err = ApiError::Rejected {
            code: 5060,
            message: "file exists".into(),
        };
        assert_eq!(err.to_string(), "file exists");
        assert_eq!(err.server_code(), Some(5060));
        assert_eq!(err.code(), -3);
    }
}
