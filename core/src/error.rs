use thiserror::Error;

/// Errors surfaced by the lineage engine.
///
/// Engine operations themselves never fail: malformed records are filtered
/// and empty input produces empty output. These variants only cover the
/// parsing edges of the crate.
#[derive(Error, Debug)]
pub enum LineageError {
    #[error("unknown view mode '{0}' (expected 'hierarchical' or 'actual')")]
    UnknownViewMode(String),

    #[error("invalid lineage snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LineageError>;
