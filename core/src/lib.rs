//! lineage-core: data-lineage graph engine.
//!
//! Turns flat asset and relationship records into a positioned, annotated
//! lineage graph: normalization, view filtering (hierarchical vs
//! dependency-only), breadth-first leveling layout, upstream/downstream
//! reachability, ETL stage classification and one-hop impact reports.
//! Pure computation with no I/O; every operation is safe to re-run.

mod error;
mod graph;
mod impact;
mod layout;
mod model;
mod pipeline;
mod render;
mod stage;
mod traversal;
mod view;

pub use error::{LineageError, Result};
pub use graph::{Graph, NodeIdx};
pub use impact::{
    analyze_impact, direct_counts, Dependency, ImpactReport, ImpactSummary, ImpactedAsset,
    LineageCounts,
};
pub use layout::{
    assign_levels, group_key, layout, layout_with_levels, node_levels, LayoutConfig, Leveling,
};
pub use model::{
    build_from_snapshot, build_graph, is_admitted_method, is_structural_id, normalize_confidence,
    relationship_label, source_system, AssetRecord, Column, ColumnLineage, Edge, LineageGraph,
    Node, Position, RawSnapshot, RelationshipRecord, ADMITTED_EXTRACTION_METHODS, CONTAINER_PREFIX,
    CONTAINS, DEFAULT_CONFIDENCE, FOLDER_PREFIX,
};
pub use pipeline::{compute_view, EngineConfig, LineageView};
pub use render::{
    EdgeStyle, RenderEdge, RenderEdgeData, RenderNode, RenderNodeData, EDGE_DEFAULT_COLOR,
    EDGE_DOWNSTREAM_COLOR, EDGE_STRUCTURAL_COLOR, EDGE_UPSTREAM_COLOR,
};
pub use stage::{
    EdgeMatch, EdgeRule, NodeField, NodeMatch, NodeRule, PipelineStage, StageClassifier, StageTag,
};
pub use traversal::{
    ancestors, ancestors_of, descendants, descendants_of, reachable, Direction, Highlights,
};
pub use view::{filter_view, keeps_edge, keeps_node, ViewMode};
