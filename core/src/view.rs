use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LineageError;
use crate::model::{Edge, LineageGraph, Node};

/// Which subgraph is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Everything, including storage containers, folders and containment edges.
    #[default]
    Hierarchical,
    /// Real assets and data-flow edges only.
    Actual,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Hierarchical => "hierarchical",
            ViewMode::Actual => "actual",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Hierarchical => ViewMode::Actual,
            ViewMode::Actual => ViewMode::Hierarchical,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hierarchical" | "hierarchy" => Ok(ViewMode::Hierarchical),
            "actual" | "dependency" | "dependencies" => Ok(ViewMode::Actual),
            other => Err(LineageError::UnknownViewMode(other.to_string())),
        }
    }
}

pub fn keeps_node(mode: ViewMode, node: &Node) -> bool {
    match mode {
        ViewMode::Hierarchical => true,
        ViewMode::Actual => !node.is_structural(),
    }
}

pub fn keeps_edge(mode: ViewMode, edge: &Edge) -> bool {
    match mode {
        ViewMode::Hierarchical => true,
        ViewMode::Actual => !edge.is_structural(),
    }
}

/// Select the subgraph for `mode`. Pure and idempotent; relative order of
/// the survivors is preserved.
pub fn filter_view(graph: &LineageGraph, mode: ViewMode) -> LineageGraph {
    LineageGraph {
        nodes: graph
            .nodes
            .iter()
            .filter(|n| keeps_node(mode, n))
            .cloned()
            .collect(),
        edges: graph
            .edges
            .iter()
            .filter(|e| keeps_edge(mode, e))
            .cloned()
            .collect(),
    }
}
