use thiserror::Error;

use crate::task::TaskId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row store unreachable: {0}")]
    Transport(String),

    #[error("row store rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("failed to decode row store response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email address has not been confirmed")]
    EmailNotConfirmed,

    #[error("authentication rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("auth service unreachable: {0}")]
    Transport(String),

    #[error("failed to decode auth response: {0}")]
    Decode(String),
}

impl AuthError {
    /// Message the auth service gave, if any.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            AuthError::Rejected { message, .. } if !message.trim().is_empty() => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

/// A blank required input caught before any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Goal,
    Email,
    Password,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Goal => "goal",
            Field::Email => "email",
            Field::Password => "password",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("{0} is required")]
    Validation(Field),

    #[error("another change to task {0} is still in flight")]
    Busy(TaskId),

    #[error("task not in the current list: {0}")]
    NotFound(TaskId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("suggestion provider failed: {0}")]
    Suggest(String),
}

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("{0} is required")]
    Validation(Field),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
