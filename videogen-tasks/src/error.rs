use serde::{Deserialize, Serialize};
use strum::Display;

use crate::types::TaskId;

/// Non-2xx HTTP statuses returned by a provider, shared by every adapter
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: check the provider API key")]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Service unavailable (HTTP {0})")]
    ServiceUnavailable(u16),
    #[error("Invalid response (HTTP {0})")]
    InvalidResponse(u16),
}

impl ProtocolError {
    /// Map a non-2xx status code and its body to a protocol error
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        match status {
            400 => ProtocolError::BadRequest(String::from_utf8_lossy(body).into_owned()),
            401 => ProtocolError::Unauthorized,
            404 => ProtocolError::NotFound,
            405 => ProtocolError::MethodNotAllowed,
            429 => ProtocolError::RateLimitExceeded,
            502..=504 => ProtocolError::ServiceUnavailable(status),
            other => ProtocolError::InvalidResponse(other),
        }
    }
}

/// Coarse error taxonomy, used by callers to decide on their own retry policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ErrorKind {
    Validation,
    Transport,
    Protocol,
    Decoding,
    JobFailure,
    Cancelled,
    Usage,
}

#[derive(Debug, thiserror::Error)]
pub enum VideoGenError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Seed {0} is out of range (expected 0..={max})", max = crate::consts::MAX_SEED)]
    SeedOutOfRange(u64),
    #[error("Encoded image is {size} bytes, limit is {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },
    #[error("Network error: {0}")]
    NetworkError(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("Decoding failed: {0}")]
    DecodingFailed(String),
    #[error("Generation failed: {reason}{}", code_suffix(.code))]
    JobFailed {
        reason: String,
        code: Option<String>,
    },
    #[error("Provider reported success for task {0} but returned no output")]
    MissingOutput(TaskId),
    #[error("Task {0} was cancelled")]
    Cancelled(TaskId),
    #[error("Task {0} is not in a terminal state")]
    NotTerminal(TaskId),
    #[error("Task {id} still running after {polls} polls")]
    PollLimitExceeded { id: TaskId, polls: u32 },
}

impl VideoGenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VideoGenError::InvalidInput(_)
            | VideoGenError::SeedOutOfRange(_)
            | VideoGenError::ImageTooLarge { .. } => ErrorKind::Validation,
            VideoGenError::NetworkError(_) => ErrorKind::Transport,
            VideoGenError::Protocol(_) => ErrorKind::Protocol,
            VideoGenError::DecodingFailed(_) => ErrorKind::Decoding,
            VideoGenError::JobFailed { .. } | VideoGenError::MissingOutput(_) => {
                ErrorKind::JobFailure
            }
            VideoGenError::Cancelled(_) => ErrorKind::Cancelled,
            VideoGenError::NotTerminal(_) | VideoGenError::PollLimitExceeded { .. } => {
                ErrorKind::Usage
            }
        }
    }

    pub fn network(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        VideoGenError::NetworkError(Box::new(err))
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(" (code {c})"))
        .unwrap_or_default()
}

impl From<serde_json::Error> for VideoGenError {
    fn from(err: serde_json::Error) -> Self {
        VideoGenError::DecodingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ProtocolError::from_status(400, b"bad seed"),
            ProtocolError::BadRequest("bad seed".to_string())
        );
        assert_eq!(ProtocolError::from_status(401, b""), ProtocolError::Unauthorized);
        assert_eq!(ProtocolError::from_status(404, b""), ProtocolError::NotFound);
        assert_eq!(
            ProtocolError::from_status(405, b""),
            ProtocolError::MethodNotAllowed
        );
        assert_eq!(
            ProtocolError::from_status(429, b""),
            ProtocolError::RateLimitExceeded
        );
        for code in [502, 503, 504] {
            assert_eq!(
                ProtocolError::from_status(code, b""),
                ProtocolError::ServiceUnavailable(code)
            );
        }
        assert_eq!(
            ProtocolError::from_status(500, b""),
            ProtocolError::InvalidResponse(500)
        );
        assert_eq!(
            ProtocolError::from_status(302, b""),
            ProtocolError::InvalidResponse(302)
        );
    }

    #[test]
    fn test_error_messages() {
        let err = VideoGenError::JobFailed {
            reason: "content policy".to_string(),
            code: Some("SAFETY".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Generation failed: content policy (code SAFETY)"
        );
        assert_eq!(err.kind(), ErrorKind::JobFailure);

        let err = VideoGenError::JobFailed {
            reason: "timeout".to_string(),
            code: None,
        };
        assert_eq!(err.to_string(), "Generation failed: timeout");

        let err = VideoGenError::SeedOutOfRange(1_000_000_000);
        assert!(err.to_string().contains("999999999"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
