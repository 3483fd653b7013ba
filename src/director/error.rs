use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorErrorKind {
    RejectedRequest,
    BackendUnavailable,
    ContextViolation,
    ForcedAbort,
    DeadlineExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorError {
    pub kind: DirectorErrorKind,
    pub message: String,
}

impl DirectorError {
    pub fn new(kind: DirectorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for DirectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DirectorError {}

pub fn rejected_request(message: impl Into<String>) -> DirectorError {
    DirectorError::new(DirectorErrorKind::RejectedRequest, message)
}

pub fn backend_unavailable(message: impl Into<String>) -> DirectorError {
    DirectorError::new(DirectorErrorKind::BackendUnavailable, message)
}

pub fn context_violation(message: impl Into<String>) -> DirectorError {
    DirectorError::new(DirectorErrorKind::ContextViolation, message)
}

pub fn forced_abort(message: impl Into<String>) -> DirectorError {
    DirectorError::new(DirectorErrorKind::ForcedAbort, message)
}

pub fn deadline_exceeded(message: impl Into<String>) -> DirectorError {
    DirectorError::new(DirectorErrorKind::DeadlineExceeded, message)
}
