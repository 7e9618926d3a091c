use lens_query::QueryError;
use thiserror::Error;

/// Errors surfaced by question operations
#[derive(Error, Debug)]
pub enum QuestionError {
    /// Classification or variant access failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The URL token is not valid URL-safe base64
    #[error("Invalid question token: {0}")]
    InvalidToken(String),

    /// The decoded token is not UTF-8
    #[error("Question token is not valid UTF-8")]
    InvalidUtf8,

    /// The decoded token is not a valid card record
    #[error("Invalid question token payload: {0}")]
    TokenPayload(#[from] serde_json::Error),

    /// The operation needs a saved card
    #[error("Question is not saved")]
    NotSaved,

    /// A collaborator (runner, card store) failed; passed through as is
    #[error("External collaborator error: {0}")]
    External(#[from] anyhow::Error),
}

impl QuestionError {
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        QuestionError::InvalidToken(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, QuestionError>;
