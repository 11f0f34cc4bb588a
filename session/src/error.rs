use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The asset or relationship collaborator could not be reached or
    /// returned an unusable response.
    #[error("lineage fetch failed: {0}")]
    Fetch(String),

    #[error("invalid setting {name}: {reason}")]
    Config { name: &'static str, reason: String },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("asset source still reports more pages after {limit} pages")]
    PageLimitExceeded { limit: u32 },

    #[error(transparent)]
    Core(#[from] lineage_core::LineageError),
}

impl SessionError {
    pub fn fetch(message: impl Into<String>) -> Self {
        SessionError::Fetch(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
