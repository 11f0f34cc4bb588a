//! Output contract for the visualization collaborator.

use serde::{Deserialize, Serialize};

use crate::model::{ColumnLineage, Edge, Node, Position};
use crate::stage::{PipelineStage, StageTag};
use crate::traversal::Highlights;

pub const EDGE_DEFAULT_COLOR: &str = "#94a3b8";
pub const EDGE_STRUCTURAL_COLOR: &str = "#cbd5e1";
pub const EDGE_UPSTREAM_COLOR: &str = "#f97316";
pub const EDGE_DOWNSTREAM_COLOR: &str = "#22c55e";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNodeData {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub catalog: String,
    pub schema: String,
    pub connector_id: String,
    pub source_system: String,
    #[serde(rename = "pipelineStage")]
    pub pipeline_stage: Option<PipelineStage>,
    #[serde(rename = "pipelineLabel")]
    pub pipeline_label: Option<String>,
    #[serde(rename = "pipelineColor")]
    pub pipeline_color: Option<String>,
    #[serde(rename = "isUpstream")]
    pub is_upstream: bool,
    #[serde(rename = "isDownstream")]
    pub is_downstream: bool,
    #[serde(rename = "isSelected")]
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    pub position: Position,
    pub data: RenderNodeData,
}

impl RenderNode {
    pub fn new(node: &Node, stage: Option<StageTag>, highlights: &Highlights) -> Self {
        let (pipeline_stage, pipeline_label, pipeline_color) = match stage {
            Some(tag) => (Some(tag.stage), Some(tag.label), Some(tag.color)),
            None => (None, None, None),
        };
        Self {
            id: node.id.clone(),
            position: node.position,
            data: RenderNodeData {
                name: node.name.clone(),
                node_type: node.node_type.clone(),
                catalog: node.catalog.clone(),
                schema: node.schema.clone(),
                connector_id: node.connector_id.clone(),
                source_system: node.source_system.clone(),
                pipeline_stage,
                pipeline_label,
                pipeline_color,
                is_upstream: highlights.is_upstream(&node.id),
                is_downstream: highlights.is_downstream(&node.id),
                is_selected: highlights.is_selected(&node.id),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdgeData {
    pub column_lineage: Vec<ColumnLineage>,
    pub relationship: String,
    pub extraction_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub style: EdgeStyle,
    pub label: String,
    pub data: RenderEdgeData,
}

impl RenderEdge {
    /// Style precedence: focal-path highlight, then stage colour, then
    /// containment, then default.
    pub fn new(edge: &Edge, stage: Option<StageTag>, highlights: &Highlights) -> Self {
        let style = if highlights.edge_is_downstream(edge) {
            EdgeStyle {
                color: EDGE_DOWNSTREAM_COLOR.to_string(),
                width: 3.0,
            }
        } else if highlights.edge_is_upstream(edge) {
            EdgeStyle {
                color: EDGE_UPSTREAM_COLOR.to_string(),
                width: 3.0,
            }
        } else if let Some(tag) = &stage {
            EdgeStyle {
                color: tag.color.clone(),
                width: 2.0,
            }
        } else if edge.is_structural() {
            EdgeStyle {
                color: EDGE_STRUCTURAL_COLOR.to_string(),
                width: 1.0,
            }
        } else {
            EdgeStyle {
                color: EDGE_DEFAULT_COLOR.to_string(),
                width: 1.5,
            }
        };

        let label = match stage {
            Some(tag) => tag.label,
            None => edge.relationship.clone(),
        };

        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            style,
            label,
            data: RenderEdgeData {
                column_lineage: edge.column_lineage.clone(),
                relationship: edge.relationship.clone(),
                extraction_method: edge.extraction_method.clone(),
            },
        }
    }
}
