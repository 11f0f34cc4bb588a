//! Property-based invariants for the lineage engine.
//!
//! 1. Every output edge endpoint is an output node.
//! 2. Admitted edges all carry an allow-listed extraction method.
//! 3. The `actual` view has no structural nodes/edges and is idempotent.
//! 4. Layout is deterministic and positions every node exactly once.
//! 5. Nodes without incoming edges sit on level 0, and a child of a
//!    BFS-reached parent sits at most one level below it.
//! 6. Ancestor/descendant search terminates on arbitrary (cyclic) graphs
//!    and agrees with the reverse direction.

use std::collections::HashSet;

use lineage_core::{
    ancestors, assign_levels, build_graph, descendants, filter_view, is_admitted_method, layout,
    node_levels, AssetRecord, Graph, LayoutConfig, LineageGraph, NodeIdx, RelationshipRecord,
    ViewMode,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const METHODS: [&str; 5] = ["sql_parsing", "manual", "DBT", "guess", ""];
const CATALOGS: [&str; 3] = ["sales", "staging", "warehouse"];
const CONNECTORS: [&str; 3] = ["postgres_main", "azure_blob_raw", "snowflake_eu"];

fn asset_strategy(i: usize) -> impl Strategy<Value = AssetRecord> {
    (0..CATALOGS.len(), 0..CONNECTORS.len(), proptest::option::of(0u8..3)).prop_map(
        move |(c, k, container)| {
            let mut a = AssetRecord::new(format!("a{}", i))
                .with_catalog(CATALOGS[c], "public")
                .with_connector(CONNECTORS[k]);
            if let Some(bucket) = container {
                let folder = if bucket == 0 { None } else { Some("landing") };
                a = a.with_storage(&format!("bucket{}", bucket), folder);
            }
            a
        },
    )
}

fn snapshot_strategy() -> impl Strategy<Value = (Vec<AssetRecord>, Vec<RelationshipRecord>)> {
    (1usize..16).prop_flat_map(|n| {
        let assets = (0..n).map(asset_strategy).collect::<Vec<_>>();
        // endpoints may overshoot n to exercise dangling edges
        let rels = proptest::collection::vec((0..n + 2, 0..n + 2, 0..METHODS.len()), 0..40)
            .prop_map(|raw| {
                raw.into_iter()
                    .map(|(s, t, m)| {
                        RelationshipRecord::new(&format!("a{}", s), &format!("a{}", t), METHODS[m])
                    })
                    .collect::<Vec<_>>()
            });
        (assets, rels)
    })
}

fn graph_strategy() -> impl Strategy<Value = LineageGraph> {
    snapshot_strategy().prop_map(|(assets, rels)| build_graph(&assets, &rels))
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Graph construction
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn edges_resolve_to_nodes(graph in graph_strategy()) {
        let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        prop_assert_eq!(ids.len(), graph.nodes.len(), "node ids must be unique");
        for e in &graph.edges {
            prop_assert!(ids.contains(e.source.as_str()), "dangling source {}", e.source);
            prop_assert!(ids.contains(e.target.as_str()), "dangling target {}", e.target);
        }
    }

    #[test]
    fn data_edges_are_admitted(graph in graph_strategy()) {
        for e in graph.edges.iter().filter(|e| !e.is_structural()) {
            prop_assert!(is_admitted_method(Some(e.extraction_method.as_str())));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. View filter
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn actual_view_has_no_structure(graph in graph_strategy()) {
        let actual = filter_view(&graph, ViewMode::Actual);
        prop_assert!(actual.nodes.iter().all(|n| !n.id.starts_with("container_") && !n.id.starts_with("folder_")));
        prop_assert!(actual.edges.iter().all(|e| e.edge_type != "contains"));
        prop_assert_eq!(filter_view(&actual, ViewMode::Actual), actual.clone());
        prop_assert_eq!(filter_view(&graph, ViewMode::Hierarchical), graph);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4–5. Layout
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn layout_deterministic(graph in graph_strategy()) {
        let cfg = LayoutConfig::default();
        let first = layout(&graph.nodes, &graph.edges, &cfg);
        let second = layout(&graph.nodes, &graph.edges, &cfg);
        prop_assert_eq!(first.len(), graph.nodes.len());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn positions_unique(graph in graph_strategy()) {
        let out = layout(&graph.nodes, &graph.edges, &LayoutConfig::default());
        let mut seen = HashSet::new();
        for n in &out {
            prop_assert!(
                seen.insert((n.position.x.to_bits(), n.position.y.to_bits())),
                "overlapping position for {}", n.id
            );
        }
    }

    #[test]
    fn roots_on_level_zero(graph in graph_strategy()) {
        let levels = node_levels(&graph.nodes, &graph.edges);
        let has_parent: HashSet<&str> = graph.edges.iter().map(|e| e.target.as_str()).collect();
        for n in &graph.nodes {
            if !has_parent.contains(n.id.as_str()) {
                prop_assert_eq!(levels[&n.id], 0);
            }
        }
    }

    #[test]
    fn child_level_at_most_parent_plus_one(graph in graph_strategy()) {
        // First-discovery BFS: for every parent the BFS reached, each child
        // sits no deeper than that parent + 1.
        let index = Graph::from_lineage(&graph.nodes, &graph.edges);
        let leveling = assign_levels(&index);
        let reached: HashSet<NodeIdx> = leveling.reached().iter().copied().collect();
        for e in &graph.edges {
            let (Some(src), Some(dst)) = (index.resolve(&e.source), index.resolve(&e.target)) else {
                continue;
            };
            if reached.contains(&src) {
                prop_assert!(
                    leveling.levels[dst as usize] <= leveling.levels[src as usize] + 1,
                    "{} -> {} skips a level", e.source, e.target
                );
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Traversal
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn traversal_terminates_and_is_symmetric(graph in graph_strategy()) {
        for n in &graph.nodes {
            let down = descendants(&n.id, &graph.edges);
            for d in &down {
                prop_assert!(ancestors(d, &graph.edges).contains(&n.id));
            }
            prop_assert!(down.len() <= graph.nodes.len());
        }
    }
}
