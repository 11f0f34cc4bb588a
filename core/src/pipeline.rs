use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::graph::Graph;
use crate::impact::{analyze_impact, ImpactReport, LineageCounts};
use crate::layout::{layout_with_levels, LayoutConfig};
use crate::model::LineageGraph;
use crate::render::{RenderEdge, RenderNode};
use crate::stage::StageClassifier;
use crate::traversal::Highlights;
use crate::view::{filter_view, ViewMode};

/// Tunables for one engine run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub classifier: StageClassifier,
}

/// The annotated, positioned graph handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineageView {
    pub view_mode: ViewMode,
    /// Focal node, if it is present in this view.
    pub focal: Option<String>,
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub levels: HashMap<String, u32>,
    pub highlights: Highlights,
    pub impact: Option<ImpactReport>,
}

impl LineageView {
    pub fn empty(view_mode: ViewMode) -> Self {
        Self {
            view_mode,
            focal: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            levels: HashMap::new(),
            highlights: Highlights::default(),
            impact: None,
        }
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Run filter, layout, traversal, classification and impact analysis over
/// `graph` in that order.
///
/// A focal id that is not part of the filtered view (unknown, or a
/// container hidden by the `actual` mode) is ignored. Impact totals are
/// the sizes of the focal node's upstream/downstream closures, not
/// counting the focal node itself.
pub fn compute_view(
    graph: &LineageGraph,
    mode: ViewMode,
    focal: Option<&str>,
    config: &EngineConfig,
) -> LineageView {
    let filtered = filter_view(graph, mode);
    if filtered.is_empty() {
        return LineageView::empty(mode);
    }

    let (positioned, levels) = layout_with_levels(&filtered.nodes, &filtered.edges, &config.layout);

    let index = Graph::from_lineage(&filtered.nodes, &filtered.edges);
    let focal = focal.filter(|id| index.resolve(id).is_some());
    let highlights = Highlights::for_focus(&index, focal);

    let impact = focal.map(|id| {
        let counts = LineageCounts {
            upstream: highlights.upstream.iter().filter(|n| n.as_str() != id).count(),
            downstream: highlights.downstream.iter().filter(|n| n.as_str() != id).count(),
        };
        analyze_impact(id, &filtered.nodes, &filtered.edges, counts)
    });

    let nodes: Vec<RenderNode> = positioned
        .iter()
        .map(|n| RenderNode::new(n, config.classifier.classify_node(n), &highlights))
        .collect();
    let edges: Vec<RenderEdge> = filtered
        .edges
        .iter()
        .map(|e| RenderEdge::new(e, config.classifier.classify_edge(e), &highlights))
        .collect();

    trace!(
        mode = %mode,
        nodes = nodes.len(),
        edges = edges.len(),
        upstream = highlights.upstream.len(),
        downstream = highlights.downstream.len(),
        "lineage view computed"
    );

    LineageView {
        view_mode: mode,
        focal: focal.map(str::to_string),
        nodes,
        edges,
        levels,
        highlights,
        impact,
    }
}
