use serde::{Deserialize, Serialize};

use crate::model::{ColumnLineage, Edge, Node};

/// Upstream/downstream totals supplied alongside a lineage result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageCounts {
    pub upstream: usize,
    pub downstream: usize,
}

/// A node fed directly by the focal asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactedAsset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub catalog: String,
    pub relationship: String,
}

/// A node feeding the focal asset directly, with the edge that connects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub catalog: String,
    pub relationship_type: String,
    pub columns: Vec<ColumnLineage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub direct_impact: usize,
    pub total_impacted_assets: usize,
    pub total_dependencies: usize,
    pub impact_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub asset_id: String,
    pub impacted_assets: Vec<ImpactedAsset>,
    pub dependencies: Vec<Dependency>,
    /// One `[focal, target]` pair per direct downstream edge.
    pub impact_paths: Vec<Vec<String>>,
    pub impact_summary: ImpactSummary,
}

impl ImpactReport {
    pub fn is_isolated(&self) -> bool {
        self.impacted_assets.is_empty() && self.dependencies.is_empty()
    }
}

/// One-hop impact report for `asset_id`.
///
/// Only direct neighbours are reported and the depth is always 1; the
/// summary totals are taken from `counts` as given. Edges whose far
/// endpoint is not in `nodes` are skipped. Read-only.
pub fn analyze_impact(
    asset_id: &str,
    nodes: &[Node],
    edges: &[Edge],
    counts: LineageCounts,
) -> ImpactReport {
    let find = |id: &str| nodes.iter().find(|n| n.id == id);

    let mut impacted_assets = Vec::new();
    let mut impact_paths = Vec::new();
    let mut dependencies = Vec::new();

    for edge in edges {
        if edge.source == asset_id {
            if let Some(target) = find(&edge.target) {
                impacted_assets.push(ImpactedAsset {
                    id: target.id.clone(),
                    name: target.name.clone(),
                    asset_type: target.node_type.clone(),
                    catalog: target.catalog.clone(),
                    relationship: edge.relationship.clone(),
                });
                impact_paths.push(vec![asset_id.to_string(), target.id.clone()]);
            }
        }
        if edge.target == asset_id {
            if let Some(source) = find(&edge.source) {
                dependencies.push(Dependency {
                    id: source.id.clone(),
                    name: source.name.clone(),
                    asset_type: source.node_type.clone(),
                    catalog: source.catalog.clone(),
                    relationship_type: edge.edge_type.clone(),
                    columns: edge.column_lineage.clone(),
                });
            }
        }
    }

    ImpactReport {
        asset_id: asset_id.to_string(),
        impacted_assets,
        dependencies,
        impact_paths,
        impact_summary: ImpactSummary {
            direct_impact: counts.downstream,
            total_impacted_assets: counts.downstream,
            total_dependencies: counts.upstream,
            impact_depth: 1,
        },
    }
}

/// Counts derived from the focal node's direct edges.
pub fn direct_counts(asset_id: &str, edges: &[Edge]) -> LineageCounts {
    LineageCounts {
        upstream: edges.iter().filter(|e| e.target == asset_id).count(),
        downstream: edges.iter().filter(|e| e.source == asset_id).count(),
    }
}
