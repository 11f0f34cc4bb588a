use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Id prefix of synthetic storage-container nodes.
pub const CONTAINER_PREFIX: &str = "container_";
/// Id prefix of synthetic folder nodes.
pub const FOLDER_PREFIX: &str = "folder_";
/// Edge type of structural (containment) edges.
pub const CONTAINS: &str = "contains";

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Extraction methods whose relationships are admitted into the graph.
/// Compared case-insensitively after trimming.
pub const ADMITTED_EXTRACTION_METHODS: &[&str] = &[
    "sql_parsing",
    "join_analysis",
    "ml_inference",
    "manual",
    "api",
    "dbt",
    "regex_fallback",
    "column_matching",
    "naming_convention",
    "foreign_key",
    "view_definition",
    "stored_procedure",
    "etl_metadata",
    "query_log",
];

// ---------------------------------------------------------------------------
// Raw collaborator records
// ---------------------------------------------------------------------------

/// A column as reported by the asset source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub pii_detected: bool,
}

/// Raw asset record. `container` / `folder_path` are only set for assets
/// living in object storage and drive the synthetic hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", alias = "asset_type")]
    pub asset_type: String,
    pub catalog: String,
    pub schema: String,
    pub connector_id: String,
    pub columns: Vec<Column>,
    pub container: Option<String>,
    pub folder_path: Option<String>,
}

impl AssetRecord {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            ..Self::default()
        }
    }

    pub fn with_type(mut self, asset_type: &str) -> Self {
        self.asset_type = asset_type.to_string();
        self
    }

    pub fn with_catalog(mut self, catalog: &str, schema: &str) -> Self {
        self.catalog = catalog.to_string();
        self.schema = schema.to_string();
        self
    }

    pub fn with_connector(mut self, connector_id: &str) -> Self {
        self.connector_id = connector_id.to_string();
        self
    }

    pub fn with_storage(mut self, container: &str, folder_path: Option<&str>) -> Self {
        self.container = Some(container.to_string());
        self.folder_path = folder_path.map(str::to_string);
        self
    }
}

/// One column-to-column mapping carried by a relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLineage {
    pub source_column: String,
    pub target_column: String,
    pub relationship_type: String,
    pub transformation_type: Option<String>,
    pub transformation_expression: Option<String>,
}

/// Raw relationship record: `source_asset_id` feeds `target_asset_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipRecord {
    pub source_asset_id: String,
    pub target_asset_id: String,
    pub relationship_type: String,
    pub column_lineage: Vec<ColumnLineage>,
    pub confidence_score: Option<f64>,
    pub transformation_type: Option<String>,
    pub extraction_method: Option<String>,
}

impl RelationshipRecord {
    pub fn new(source: &str, target: &str, extraction_method: &str) -> Self {
        Self {
            source_asset_id: source.to_string(),
            target_asset_id: target.to_string(),
            extraction_method: Some(extraction_method.to_string()),
            ..Self::default()
        }
    }
}

/// The last fetched set of raw records. Every graph is rebuilt from one of these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSnapshot {
    pub assets: Vec<AssetRecord>,
    pub relationships: Vec<RelationshipRecord>,
}

impl RawSnapshot {
    pub fn new(assets: Vec<AssetRecord>, relationships: Vec<RelationshipRecord>) -> Self {
        Self {
            assets,
            relationships,
        }
    }

    /// Parse `{"assets": [...], "relationships": [...]}`. Absent fields default.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.relationships.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Canonical graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A discovered asset, or a synthetic container/folder node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub catalog: String,
    pub schema: String,
    pub connector_id: String,
    pub source_system: String,
    pub columns: Vec<Column>,
    /// Overwritten by every layout run.
    pub position: Position,
}

impl Node {
    pub fn from_asset(asset: &AssetRecord) -> Self {
        Self {
            id: asset.id.clone(),
            name: asset.name.clone(),
            node_type: asset.asset_type.clone(),
            catalog: asset.catalog.clone(),
            schema: asset.schema.clone(),
            connector_id: asset.connector_id.clone(),
            source_system: source_system(&asset.connector_id),
            columns: asset.columns.clone(),
            position: Position::default(),
        }
    }

    fn structural(id: String, name: &str, node_type: &str, owner: &AssetRecord) -> Self {
        Self {
            id,
            name: name.to_string(),
            node_type: node_type.to_string(),
            catalog: owner.catalog.clone(),
            schema: String::new(),
            connector_id: owner.connector_id.clone(),
            source_system: source_system(&owner.connector_id),
            columns: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn is_structural(&self) -> bool {
        is_structural_id(&self.id)
    }
}

/// A directed "source feeds target" edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    /// Display value: `"<n> columns"` or `"feeds into"` for data-flow edges.
    pub relationship: String,
    pub column_lineage: Vec<ColumnLineage>,
    pub extraction_method: String,
    pub confidence_score: f64,
    pub transformation_type: Option<String>,
    pub folder_based: bool,
}

impl Edge {
    /// Edge identity is the (source, target) pair; parallel relationships collapse.
    /// An `->` inside either id is escaped so distinct pairs never share an id.
    pub fn edge_id(source: &str, target: &str) -> String {
        format!("{}->{}", escape_arrow(source), escape_arrow(target))
    }

    /// Build a data-flow edge. Does not check admission; see [`build_graph`].
    pub fn from_relationship(rel: &RelationshipRecord) -> Self {
        Self {
            id: Self::edge_id(&rel.source_asset_id, &rel.target_asset_id),
            source: rel.source_asset_id.clone(),
            target: rel.target_asset_id.clone(),
            edge_type: rel.relationship_type.clone(),
            relationship: relationship_label(&rel.column_lineage),
            column_lineage: rel.column_lineage.clone(),
            extraction_method: rel
                .extraction_method
                .as_deref()
                .map(|m| m.trim().to_ascii_lowercase())
                .unwrap_or_default(),
            confidence_score: normalize_confidence(rel.confidence_score),
            transformation_type: rel.transformation_type.clone(),
            folder_based: false,
        }
    }

    /// Containment edge between a container/folder and its child.
    pub fn contains(source: &str, target: &str, folder_based: bool) -> Self {
        Self {
            id: Self::edge_id(source, target),
            source: source.to_string(),
            target: target.to_string(),
            edge_type: CONTAINS.to_string(),
            relationship: CONTAINS.to_string(),
            column_lineage: Vec::new(),
            extraction_method: String::new(),
            confidence_score: 1.0,
            transformation_type: None,
            folder_based,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// True for containment edges and any edge touching a container/folder.
    pub fn is_structural(&self) -> bool {
        self.edge_type == CONTAINS
            || self.folder_based
            || is_structural_id(&self.source)
            || is_structural_id(&self.target)
    }
}

/// One graph snapshot. Node ids are unique; every edge endpoint resolves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl LineageGraph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Count of edges that are real data flow (not containment).
    pub fn dependency_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| !e.is_structural()).count()
    }
}

// ---------------------------------------------------------------------------
// Normalization helpers
// ---------------------------------------------------------------------------

fn escape_arrow(id: &str) -> String {
    if id.contains('\\') || id.contains("->") {
        id.replace('\\', "\\\\").replace("->", "-\\>")
    } else {
        id.to_string()
    }
}

/// Container names may themselves contain `/`, which separates container
/// from folder path in folder ids.
fn escape_container(container: &str) -> String {
    container.replace('%', "%25").replace('/', "%2F")
}

pub fn is_structural_id(id: &str) -> bool {
    id.starts_with(CONTAINER_PREFIX) || id.starts_with(FOLDER_PREFIX)
}

/// Derive a human label for the system behind a connector id.
///
/// `azure_blob_*` maps to "Azure Blob Storage"; otherwise the first
/// `_`-separated token is capitalized. An empty connector is "Unknown".
pub fn source_system(connector_id: &str) -> String {
    let mut tokens = connector_id.trim().split('_');
    let first = tokens.next().unwrap_or_default();
    if first.is_empty() {
        return "Unknown".to_string();
    }
    if first.eq_ignore_ascii_case("azure")
        && tokens.next().is_some_and(|t| t.eq_ignore_ascii_case("blob"))
    {
        return "Azure Blob Storage".to_string();
    }
    capitalize(first)
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Admission gate on a relationship's provenance tag.
pub fn is_admitted_method(method: Option<&str>) -> bool {
    method
        .map(|m| m.trim().to_ascii_lowercase())
        .is_some_and(|m| ADMITTED_EXTRACTION_METHODS.contains(&m.as_str()))
}

pub fn relationship_label(column_lineage: &[ColumnLineage]) -> String {
    if column_lineage.is_empty() {
        "feeds into".to_string()
    } else {
        format!("{} columns", column_lineage.len())
    }
}

/// Missing or non-finite confidence becomes 0.5; anything else is clamped to [0, 1].
pub fn normalize_confidence(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s.is_finite() => s.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}

// ---------------------------------------------------------------------------
// Graph construction
// ---------------------------------------------------------------------------

/// Accumulates nodes/edges while enforcing id uniqueness.
#[derive(Default)]
struct GraphBuilder {
    nodes: Vec<Node>,
    node_ids: HashSet<String>,
    edges: Vec<Edge>,
    edge_pairs: HashSet<(String, String)>,
}

impl GraphBuilder {
    fn push_node(&mut self, node: Node) -> bool {
        if !self.node_ids.insert(node.id.clone()) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    fn push_edge(&mut self, edge: Edge) -> bool {
        if !self.edge_pairs.insert((edge.source.clone(), edge.target.clone())) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    fn has_node(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    /// Synthesize `container_` / `folder_` nodes and containment edges for
    /// an asset stored in object storage.
    fn push_storage_hierarchy(&mut self, asset: &AssetRecord) {
        let Some(container) = asset
            .container
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        else {
            return;
        };

        let container_id = format!("{}{}", CONTAINER_PREFIX, container);
        self.push_node(Node::structural(
            container_id.clone(),
            container,
            "container",
            asset,
        ));

        let folder = asset
            .folder_path
            .as_deref()
            .map(|f| f.trim_matches('/'))
            .filter(|f| !f.is_empty());

        match folder {
            Some(folder) => {
                let folder_id = format!("{}{}/{}", FOLDER_PREFIX, escape_container(container), folder);
                self.push_node(Node::structural(folder_id.clone(), folder, "folder", asset));
                self.push_edge(Edge::contains(&container_id, &folder_id, false));
                self.push_edge(Edge::contains(&folder_id, &asset.id, true));
            }
            None => {
                self.push_edge(Edge::contains(&container_id, &asset.id, false));
            }
        }
    }

    fn finish(self) -> LineageGraph {
        LineageGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

/// Normalize raw records into the canonical hierarchical graph.
///
/// Relationships are admitted only when their extraction method is on the
/// allow-list and both endpoints are known assets. A second relationship
/// between the same pair collapses into the first. Nothing here fails:
/// rejected records are logged at debug level and skipped.
pub fn build_graph(assets: &[AssetRecord], relationships: &[RelationshipRecord]) -> LineageGraph {
    let mut builder = GraphBuilder::default();
    let mut admitted_assets = Vec::with_capacity(assets.len());

    for asset in assets {
        if asset.id.trim().is_empty() {
            debug!(name = %asset.name, "skipping asset without id");
            continue;
        }
        if !builder.push_node(Node::from_asset(asset)) {
            debug!(id = %asset.id, "duplicate asset id, keeping first record");
            continue;
        }
        admitted_assets.push(asset);
    }

    for rel in relationships {
        if !is_admitted_method(rel.extraction_method.as_deref()) {
            debug!(
                source = %rel.source_asset_id,
                target = %rel.target_asset_id,
                method = ?rel.extraction_method,
                "dropping relationship with unrecognized extraction method"
            );
            continue;
        }
        if !builder.has_node(&rel.source_asset_id) || !builder.has_node(&rel.target_asset_id) {
            debug!(
                source = %rel.source_asset_id,
                target = %rel.target_asset_id,
                "dropping dangling relationship"
            );
            continue;
        }
        if !builder.push_edge(Edge::from_relationship(rel)) {
            debug!(
                source = %rel.source_asset_id,
                target = %rel.target_asset_id,
                "relationship collapsed into existing edge for the same pair"
            );
        }
    }

    for asset in admitted_assets {
        builder.push_storage_hierarchy(asset);
    }

    builder.finish()
}

/// [`build_graph`] over a snapshot.
pub fn build_from_snapshot(snapshot: &RawSnapshot) -> LineageGraph {
    build_graph(&snapshot.assets, &snapshot.relationships)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets(ids: &[&str]) -> Vec<AssetRecord> {
        ids.iter().map(|id| AssetRecord::new(*id)).collect()
    }

    #[test]
    fn test_source_system_azure_blob() {
        assert_eq!(source_system("azure_blob_prod"), "Azure Blob Storage");
        assert_eq!(source_system("Azure_Blob"), "Azure Blob Storage");
    }

    #[test]
    fn test_source_system_first_token_capitalized() {
        assert_eq!(source_system("postgres_analytics_1"), "Postgres");
        assert_eq!(source_system("snowflake"), "Snowflake");
        assert_eq!(source_system("azure_sql"), "Azure");
    }

    #[test]
    fn test_source_system_unknown() {
        assert_eq!(source_system(""), "Unknown");
        assert_eq!(source_system("   "), "Unknown");
        assert_eq!(source_system("_orphan"), "Unknown");
    }

    #[test]
    fn test_admission_case_insensitive() {
        assert!(is_admitted_method(Some("SQL_PARSING")));
        assert!(is_admitted_method(Some(" dbt ")));
        assert!(!is_admitted_method(Some("guess")));
        assert!(!is_admitted_method(None));
        assert!(!is_admitted_method(Some("")));
    }

    #[test]
    fn test_relationship_label() {
        assert_eq!(relationship_label(&[]), "feeds into");
        let cols = vec![ColumnLineage::default(), ColumnLineage::default()];
        assert_eq!(relationship_label(&cols), "2 columns");
    }

    #[test]
    fn test_confidence_normalization() {
        assert_eq!(normalize_confidence(None), 0.5);
        assert_eq!(normalize_confidence(Some(f64::NAN)), 0.5);
        assert_eq!(normalize_confidence(Some(1.7)), 1.0);
        assert_eq!(normalize_confidence(Some(-0.2)), 0.0);
        assert_eq!(normalize_confidence(Some(0.8)), 0.8);
    }

    #[test]
    fn test_build_chain() {
        let rels = vec![
            RelationshipRecord::new("t1", "t2", "sql_parsing"),
            RelationshipRecord::new("t2", "t3", "manual"),
        ];
        let g = build_graph(&assets(&["t1", "t2", "t3"]), &rels);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edges[0].id, "t1->t2");
        assert_eq!(g.edges[0].relationship, "feeds into");
        assert_eq!(g.edges[0].confidence_score, 0.5);
    }

    #[test]
    fn test_build_drops_unknown_method() {
        let rels = vec![RelationshipRecord::new("a", "b", "guess")];
        let g = build_graph(&assets(&["a", "b"]), &rels);
        assert_eq!(g.node_count(), 2);
        assert!(g.edges.is_empty());
    }

    #[test]
    fn test_build_drops_missing_method() {
        let mut rel = RelationshipRecord::new("a", "b", "manual");
        rel.extraction_method = None;
        let g = build_graph(&assets(&["a", "b"]), &[rel]);
        assert!(g.edges.is_empty());
    }

    #[test]
    fn test_build_drops_dangling() {
        let rels = vec![
            RelationshipRecord::new("a", "ghost", "manual"),
            RelationshipRecord::new("ghost", "a", "manual"),
        ];
        let g = build_graph(&assets(&["a"]), &rels);
        assert!(g.edges.is_empty());
    }

    #[test]
    fn test_build_collapses_parallel_relationships() {
        let mut first = RelationshipRecord::new("a", "b", "sql_parsing");
        first.column_lineage = vec![ColumnLineage {
            source_column: "id".into(),
            target_column: "a_id".into(),
            ..ColumnLineage::default()
        }];
        let second = RelationshipRecord::new("a", "b", "manual");
        let g = build_graph(&assets(&["a", "b"]), &[first, second]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edges[0].relationship, "1 columns");
        assert_eq!(g.edges[0].extraction_method, "sql_parsing");
    }

    #[test]
    fn test_build_duplicate_asset_keeps_first() {
        let a1 = AssetRecord::new("a").with_type("table");
        let a2 = AssetRecord::new("a").with_type("view");
        let g = build_graph(&[a1, a2], &[]);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.nodes[0].node_type, "table");
    }

    #[test]
    fn test_build_storage_hierarchy() {
        let a = AssetRecord::new("blob1")
            .with_connector("azure_blob_prod")
            .with_storage("raw", Some("/sales/2024/"));
        let b = AssetRecord::new("blob2")
            .with_connector("azure_blob_prod")
            .with_storage("raw", None);
        let g = build_graph(&[a, b], &[]);

        let ids: Vec<&str> = g.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["blob1", "blob2", "container_raw", "folder_raw/sales/2024"]);

        let container = g.node("container_raw").unwrap();
        assert!(container.columns.is_empty());
        assert_eq!(container.source_system, "Azure Blob Storage");

        assert_eq!(g.edge_count(), 3);
        assert!(g.edges.iter().all(|e| e.edge_type == CONTAINS));
        let folder_edge = g
            .edges
            .iter()
            .find(|e| e.target == "blob1")
            .unwrap();
        assert!(folder_edge.folder_based);
        assert_eq!(folder_edge.source, "folder_raw/sales/2024");
        assert_eq!(g.dependency_edge_count(), 0);
    }

    #[test]
    fn test_build_keeps_distinct_pairs_with_arrow_ids() {
        let rels = vec![
            RelationshipRecord::new("a->b", "c", "manual"),
            RelationshipRecord::new("a", "b->c", "manual"),
        ];
        let g = build_graph(&assets(&["a->b", "c", "a", "b->c"]), &rels);
        assert_eq!(g.edge_count(), 2);
        assert_ne!(g.edges[0].id, g.edges[1].id);
        assert_eq!(g.edges[0].id, "a-\\>b->c");
        assert_eq!(g.edges[1].id, "a->b-\\>c");
    }

    #[test]
    fn test_edge_id_escapes_backslash() {
        assert_ne!(Edge::edge_id("a\\", "->b"), Edge::edge_id("a\\-", ">b"));
        assert_eq!(Edge::edge_id("x", "y"), "x->y");
    }

    #[test]
    fn test_folder_ids_distinct_for_slashed_containers() {
        let a = AssetRecord::new("one").with_storage("a/b", Some("c"));
        let b = AssetRecord::new("two").with_storage("a", Some("b/c"));
        let g = build_graph(&[a, b], &[]);

        let mut folders: Vec<&str> = g
            .nodes
            .iter()
            .filter(|n| n.node_type == "folder")
            .map(|n| n.id.as_str())
            .collect();
        folders.sort_unstable();
        assert_eq!(folders, vec!["folder_a%2Fb/c", "folder_a/b/c"]);

        let parent_of = |folder: &str| {
            g.edges
                .iter()
                .find(|e| e.target == folder)
                .map(|e| e.source.clone())
        };
        assert_eq!(parent_of("folder_a%2Fb/c").as_deref(), Some("container_a/b"));
        assert_eq!(parent_of("folder_a/b/c").as_deref(), Some("container_a"));
    }

    #[test]
    fn test_snapshot_from_json_lenient() {
        let json = r#"{
            "assets": [{"id": "t1", "type": "table"}, {"id": "t2"}],
            "relationships": [
                {"source_asset_id": "t1", "target_asset_id": "t2",
                 "extraction_method": "dbt", "confidence_score": 0.9}
            ]
        }"#;
        let snap = RawSnapshot::from_json(json).unwrap();
        assert_eq!(snap.assets.len(), 2);
        assert_eq!(snap.assets[0].asset_type, "table");
        let g = build_from_snapshot(&snap);
        assert_eq!(g.edges[0].confidence_score, 0.9);
    }

    #[test]
    fn test_snapshot_from_json_invalid() {
        assert!(RawSnapshot::from_json("{not json").is_err());
    }
}
