//! ETL pipeline-stage classification.
//!
//! Rules are plain data evaluated first-match-wins, so reprioritising a
//! stage means reordering a table (or loading a different one from JSON),
//! not touching control flow. Classification only looks at node/edge
//! fields, never at traversal results.

use serde::{Deserialize, Serialize};

use crate::model::{Edge, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Source,
    Extract,
    Transform,
    Load,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Source => "source",
            PipelineStage::Extract => "extract",
            PipelineStage::Transform => "transform",
            PipelineStage::Load => "load",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Source => "Source",
            PipelineStage::Extract => "Extract",
            PipelineStage::Transform => "Transform",
            PipelineStage::Load => "Load",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            PipelineStage::Source => "#3b82f6",
            PipelineStage::Extract => "#f59e0b",
            PipelineStage::Transform => "#8b5cf6",
            PipelineStage::Load => "#10b981",
        }
    }
}

/// Outcome of a successful classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTag {
    pub stage: PipelineStage,
    pub color: String,
    pub label: String,
}

impl From<PipelineStage> for StageTag {
    fn from(stage: PipelineStage) -> Self {
        Self {
            stage,
            color: stage.color().to_string(),
            label: stage.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeField {
    Id,
    Name,
    Type,
    Catalog,
    Schema,
    ConnectorId,
}

impl NodeField {
    fn read<'a>(&self, node: &'a Node) -> &'a str {
        match self {
            NodeField::Id => &node.id,
            NodeField::Name => &node.name,
            NodeField::Type => &node.node_type,
            NodeField::Catalog => &node.catalog,
            NodeField::Schema => &node.schema,
            NodeField::ConnectorId => &node.connector_id,
        }
    }
}

/// A predicate over node fields. All comparisons ignore ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeMatch {
    /// Some field in `fields` contains some needle.
    Contains {
        fields: Vec<NodeField>,
        needles: Vec<String>,
    },
    /// `field` equals one of `values`.
    Equals { field: NodeField, values: Vec<String> },
}

impl NodeMatch {
    fn contains(fields: &[NodeField], needles: &[&str]) -> Self {
        NodeMatch::Contains {
            fields: fields.to_vec(),
            needles: needles.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn equals(field: NodeField, values: &[&str]) -> Self {
        NodeMatch::Equals {
            field,
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        match self {
            NodeMatch::Contains { fields, needles } => fields.iter().any(|f| {
                let haystack = f.read(node).to_ascii_lowercase();
                needles
                    .iter()
                    .any(|n| !n.is_empty() && haystack.contains(&n.to_ascii_lowercase()))
            }),
            NodeMatch::Equals { field, values } => {
                let value = field.read(node);
                values.iter().any(|v| value.eq_ignore_ascii_case(v))
            }
        }
    }
}

/// Node gets `stage` when any predicate in `any_of` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRule {
    pub stage: PipelineStage,
    pub any_of: Vec<NodeMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeMatch {
    /// The edge's relationship display value or type contains `needle`.
    RelationshipContains { needle: String },
    /// Source id contains `source` and target id contains `target`.
    EndpointPair { source: String, target: String },
}

impl EdgeMatch {
    pub fn matches(&self, edge: &Edge) -> bool {
        match self {
            EdgeMatch::RelationshipContains { needle } => {
                let needle = needle.to_ascii_lowercase();
                !needle.is_empty()
                    && (edge.relationship.to_ascii_lowercase().contains(&needle)
                        || edge.edge_type.to_ascii_lowercase().contains(&needle))
            }
            EdgeMatch::EndpointPair { source, target } => {
                edge.source.contains(source.as_str()) && edge.target.contains(target.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRule {
    pub stage: PipelineStage,
    pub when: EdgeMatch,
}

/// Prioritized rule tables for nodes and edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageClassifier {
    /// A node is only classified if one of these holds.
    pub gate: Vec<NodeMatch>,
    pub node_rules: Vec<NodeRule>,
    pub edge_rules: Vec<EdgeRule>,
}

impl Default for StageClassifier {
    fn default() -> Self {
        use NodeField::*;

        let gate = vec![
            NodeMatch::equals(ConnectorId, &["crm_api", "etl_pipeline", "etl_demo", "rest_api"]),
            NodeMatch::contains(
                &[Catalog, Schema],
                &["etl", "pipeline", "crm", "staging", "warehouse", "analytics"],
            ),
            NodeMatch::equals(Type, &["api"]),
        ];

        let node_rules = vec![
            NodeRule {
                stage: PipelineStage::Source,
                any_of: vec![
                    NodeMatch::contains(&[Catalog, Schema, Id], &["crm", "source"]),
                    NodeMatch::equals(Type, &["api"]),
                ],
            },
            NodeRule {
                stage: PipelineStage::Extract,
                any_of: vec![NodeMatch::contains(
                    &[Catalog, Schema, Name, Id],
                    &["staging", "raw", "transformed"],
                )],
            },
            NodeRule {
                stage: PipelineStage::Transform,
                any_of: vec![NodeMatch::contains(
                    &[Catalog, Name],
                    &["warehouse", "dim", "fact", "transform"],
                )],
            },
            NodeRule {
                stage: PipelineStage::Load,
                any_of: vec![NodeMatch::contains(
                    &[Catalog, Schema, Name, Id],
                    &["analytics", "report", "destination", "warehouse"],
                )],
            },
        ];

        let rel = |needle: &str, stage| EdgeRule {
            stage,
            when: EdgeMatch::RelationshipContains {
                needle: needle.to_string(),
            },
        };
        let pair = |source: &str, target: &str, stage| EdgeRule {
            stage,
            when: EdgeMatch::EndpointPair {
                source: source.to_string(),
                target: target.to_string(),
            },
        };
        let edge_rules = vec![
            rel("extract", PipelineStage::Extract),
            rel("transform", PipelineStage::Transform),
            rel("load", PipelineStage::Load),
            pair(":source:", ":staging:", PipelineStage::Extract),
            pair(":staging:", ":destination:", PipelineStage::Load),
        ];

        Self {
            gate,
            node_rules,
            edge_rules,
        }
    }
}

impl StageClassifier {
    pub fn is_etl_node(&self, node: &Node) -> bool {
        self.gate.iter().any(|m| m.matches(node))
    }

    /// First matching node rule, or `None` (default styling).
    pub fn classify_node(&self, node: &Node) -> Option<StageTag> {
        if !self.is_etl_node(node) {
            return None;
        }
        self.node_rules
            .iter()
            .find(|rule| rule.any_of.iter().any(|m| m.matches(node)))
            .map(|rule| rule.stage.into())
    }

    /// First matching edge rule, or `None`.
    pub fn classify_edge(&self, edge: &Edge) -> Option<StageTag> {
        self.edge_rules
            .iter()
            .find(|rule| rule.when.matches(edge))
            .map(|rule| rule.stage.into())
    }
}
