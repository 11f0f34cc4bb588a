//! Hierarchical layout: breadth-first leveling from roots, then stacking
//! of (catalog, connector) buckets within each level.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::graph::{Graph, NodeIdx};
use crate::model::{Edge, Node, Position};

/// Layout constants, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal distance between consecutive levels.
    pub level_spacing: f64,
    /// Vertical distance between nodes of one bucket.
    pub node_spacing: f64,
    /// Extra vertical gap between buckets of one level.
    pub group_gap: f64,
    pub top_margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            level_spacing: 300.0,
            node_spacing: 100.0,
            group_gap: 50.0,
            top_margin: 50.0,
        }
    }
}

/// Result of leveling: `levels[h]` is the level of handle `h`, `order` is
/// the sequence in which handles were discovered. The first `reached_count`
/// entries of `order` were found by the BFS; the rest were forced to 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leveling {
    pub levels: Vec<u32>,
    pub order: Vec<NodeIdx>,
    pub reached_count: usize,
}

impl Leveling {
    /// Handles placed by the BFS rather than the level-0 fallback.
    pub fn reached(&self) -> &[NodeIdx] {
        &self.order[..self.reached_count]
    }
}

/// Multi-source BFS leveling.
///
/// Roots are nodes with no parents; if there are none, every node is a root.
/// Each node keeps the level at which it is first discovered, so a child of
/// parents at levels 0 and 3 lands on level 1. Nodes no root can reach
/// (e.g. a cycle hanging off nothing) are appended at level 0.
pub fn assign_levels(graph: &Graph) -> Leveling {
    let n = graph.node_count();
    let mut levels = vec![0u32; n];
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut queue: VecDeque<NodeIdx> = VecDeque::new();

    let mut roots: Vec<NodeIdx> = graph.handles().filter(|&h| graph.is_root(h)).collect();
    if roots.is_empty() {
        roots = graph.handles().collect();
    }

    for root in roots {
        visited[root as usize] = true;
        order.push(root);
        queue.push_back(root);
    }

    while let Some(current) = queue.pop_front() {
        let next_level = levels[current as usize] + 1;
        for &child in graph.neighbors_out(current) {
            if !visited[child as usize] {
                visited[child as usize] = true;
                levels[child as usize] = next_level;
                order.push(child);
                queue.push_back(child);
            }
        }
    }

    let reached_count = order.len();
    for h in graph.handles() {
        if !visited[h as usize] {
            visited[h as usize] = true;
            order.push(h);
        }
    }

    Leveling {
        levels,
        order,
        reached_count,
    }
}

/// Bucket key within a level: catalog plus the connector's first token.
pub fn group_key(node: &Node) -> String {
    let connector = node.connector_id.split('_').next().unwrap_or_default();
    format!("{}_{}", node.catalog, connector)
}

struct Bucket {
    key: String,
    members: Vec<NodeIdx>,
}

fn position_handles(
    by_handle: &[Option<&Node>],
    leveling: &Leveling,
    config: &LayoutConfig,
) -> Vec<Position> {
    let mut per_level: Vec<Vec<Bucket>> = Vec::new();

    for &h in &leveling.order {
        let Some(node) = by_handle[h as usize] else {
            continue;
        };
        let level = leveling.levels[h as usize] as usize;
        if per_level.len() <= level {
            per_level.resize_with(level + 1, Vec::new);
        }
        let key = group_key(node);
        let buckets = &mut per_level[level];
        match buckets.iter_mut().find(|b| b.key == key) {
            Some(bucket) => bucket.members.push(h),
            None => buckets.push(Bucket {
                key,
                members: vec![h],
            }),
        }
    }

    let mut positions = vec![Position::default(); by_handle.len()];
    for (level, buckets) in per_level.iter().enumerate() {
        let x = level as f64 * config.level_spacing;
        let mut offset = 0.0;
        for bucket in buckets {
            for (i, &h) in bucket.members.iter().enumerate() {
                positions[h as usize] = Position {
                    x,
                    y: config.top_margin + offset + i as f64 * config.node_spacing,
                };
            }
            offset += bucket.members.len() as f64 * config.node_spacing + config.group_gap;
        }
    }
    positions
}

/// Position every node and report its level.
///
/// Edges with an endpoint outside `nodes` are ignored. Deterministic for a
/// fixed input order.
pub fn layout_with_levels(
    nodes: &[Node],
    edges: &[Edge],
    config: &LayoutConfig,
) -> (Vec<Node>, HashMap<String, u32>) {
    if nodes.is_empty() {
        return (Vec::new(), HashMap::new());
    }

    let graph = Graph::from_lineage(nodes, edges);
    let leveling = assign_levels(&graph);

    let mut by_handle: Vec<Option<&Node>> = vec![None; graph.node_count()];
    for node in nodes {
        if let Some(h) = graph.resolve(&node.id) {
            by_handle[h as usize].get_or_insert(node);
        }
    }

    let positions = position_handles(&by_handle, &leveling, config);
    trace!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        levels = leveling.levels.iter().max().map_or(0, |m| m + 1),
        "layout computed"
    );

    let levels: HashMap<String, u32> = graph
        .handles()
        .map(|h| (graph.id(h).to_string(), leveling.levels[h as usize]))
        .collect();

    let positioned = nodes
        .iter()
        .map(|node| {
            let position = graph
                .resolve(&node.id)
                .map(|h| positions[h as usize])
                .unwrap_or_default();
            Node {
                position,
                ..node.clone()
            }
        })
        .collect();

    (positioned, levels)
}

/// Position every node; see [`layout_with_levels`].
pub fn layout(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> Vec<Node> {
    layout_with_levels(nodes, edges, config).0
}

/// Level of every node id.
pub fn node_levels(nodes: &[Node], edges: &[Edge]) -> HashMap<String, u32> {
    if nodes.is_empty() {
        return HashMap::new();
    }
    let graph = Graph::from_lineage(nodes, edges);
    let leveling = assign_levels(&graph);
    graph
        .handles()
        .map(|h| (graph.id(h).to_string(), leveling.levels[h as usize]))
        .collect()
}
