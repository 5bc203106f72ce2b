use thiserror::Error;

/// Domain error taxonomy surfaced to the RPC layer.
///
/// `Ambiguous` outcomes ("ack not observed within timeout") are a caller
/// concern, not a variant here — a producer that saw no ack must re-query,
/// not assume failure.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
