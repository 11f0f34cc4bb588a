use lineage_core::ViewMode;
use serde::{Deserialize, Serialize};

use crate::generation::Generation;
use crate::state::LineageSession;

/// Outcome of the last applied fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineageStatus {
    #[default]
    NotLoaded,
    Ready,
    /// Snapshot applied but it carries no dependency edges.
    NoLineage,
    /// Collaborator failed; the graph is empty.
    FetchFailed { message: String },
}

impl LineageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineageStatus::NotLoaded => "not_loaded",
            LineageStatus::Ready => "ready",
            LineageStatus::NoLineage => "no_lineage",
            LineageStatus::FetchFailed { .. } => "fetch_failed",
        }
    }

    /// Whether a user-triggered refresh is the expected next step.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LineageStatus::FetchFailed { .. })
    }
}

/// Snapshot of the session for display or diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub status: LineageStatus,
    pub view_mode: ViewMode,
    pub focal: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub applied_generation: Generation,
    pub current_generation: Generation,
    /// A newer fetch has been issued but not applied yet.
    pub is_stale: bool,
    pub build_time_ms: f64,
}

impl LineageSession {
    pub fn status(&self) -> SessionStatus {
        let state = self.state();
        let current = self.current_generation();
        SessionStatus {
            status: state.status.clone(),
            view_mode: state.view_mode,
            focal: state.focal.clone(),
            node_count: state.view.nodes.len(),
            edge_count: state.view.edges.len(),
            applied_generation: state.generation,
            current_generation: current,
            is_stale: state.generation < current,
            build_time_ms: state.build_time_ms,
        }
    }
}
