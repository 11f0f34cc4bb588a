use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NodeIdx};
use crate::model::Edge;

/// Which way to follow lineage edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Target to source: everything that feeds the node.
    Upstream,
    /// Source to target: everything the node feeds.
    Downstream,
}

fn neighbors(graph: &Graph, node: NodeIdx, direction: Direction) -> &[NodeIdx] {
    match direction {
        Direction::Upstream => graph.neighbors_in(node),
        Direction::Downstream => graph.neighbors_out(node),
    }
}

/// Every handle reachable from `start` in `direction`.
///
/// Explicit stack with a visited guard, so each node and edge is inspected
/// at most once. Self-loops are skipped. `start` is only reported when a
/// cycle through another node leads back to it.
pub fn reachable(graph: &Graph, start: NodeIdx, direction: Direction) -> Vec<NodeIdx> {
    let n = graph.node_count();
    if start as usize >= n {
        return Vec::new();
    }

    let mut visited = vec![false; n];
    let mut reported = vec![false; n];
    let mut result = Vec::new();
    let mut stack = vec![start];
    visited[start as usize] = true;

    while let Some(current) = stack.pop() {
        for &next in neighbors(graph, current, direction) {
            if next == current {
                continue;
            }
            if !reported[next as usize] {
                reported[next as usize] = true;
                result.push(next);
            }
            if !visited[next as usize] {
                visited[next as usize] = true;
                stack.push(next);
            }
        }
    }

    result
}

fn reachable_ids(graph: &Graph, node_id: &str, direction: Direction) -> HashSet<String> {
    match graph.resolve(node_id) {
        Some(start) => reachable(graph, start, direction)
            .into_iter()
            .map(|h| graph.id(h).to_string())
            .collect(),
        None => HashSet::new(),
    }
}

/// Transitive upstream set of `node_id` over `graph`.
pub fn ancestors_of(graph: &Graph, node_id: &str) -> HashSet<String> {
    reachable_ids(graph, node_id, Direction::Upstream)
}

/// Transitive downstream set of `node_id` over `graph`.
pub fn descendants_of(graph: &Graph, node_id: &str) -> HashSet<String> {
    reachable_ids(graph, node_id, Direction::Downstream)
}

/// Transitive upstream set of `node_id` over a bare edge list.
pub fn ancestors(node_id: &str, edges: &[Edge]) -> HashSet<String> {
    ancestors_of(&Graph::from_edges(edges), node_id)
}

/// Transitive downstream set of `node_id` over a bare edge list.
pub fn descendants(node_id: &str, edges: &[Edge]) -> HashSet<String> {
    descendants_of(&Graph::from_edges(edges), node_id)
}

/// Highlight sets relative to a focal node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlights {
    pub selected: Option<String>,
    pub upstream: HashSet<String>,
    pub downstream: HashSet<String>,
}

impl Highlights {
    /// Compute both closures of `focal`. `None` yields empty sets.
    pub fn for_focus(graph: &Graph, focal: Option<&str>) -> Self {
        match focal {
            Some(id) => Self {
                selected: Some(id.to_string()),
                upstream: ancestors_of(graph, id),
                downstream: descendants_of(graph, id),
            },
            None => Self::default(),
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    pub fn is_upstream(&self, id: &str) -> bool {
        self.upstream.contains(id)
    }

    pub fn is_downstream(&self, id: &str) -> bool {
        self.downstream.contains(id)
    }

    /// True if the edge lies inside the focal node's upstream closure.
    pub fn edge_is_upstream(&self, edge: &Edge) -> bool {
        self.is_upstream(&edge.source)
            && (self.is_upstream(&edge.target) || self.is_selected(&edge.target))
    }

    /// True if the edge lies inside the focal node's downstream closure.
    pub fn edge_is_downstream(&self, edge: &Edge) -> bool {
        (self.is_downstream(&edge.source) || self.is_selected(&edge.source))
            && self.is_downstream(&edge.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str) -> Edge {
        Edge {
            id: Edge::edge_id(from, to),
            source: from.to_string(),
            target: to.to_string(),
            ..Edge::default()
        }
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn make_chain(n: usize) -> Vec<Edge> {
        (0..n - 1)
            .map(|i| edge(&format!("n{}", i), &format!("n{}", i + 1)))
            .collect()
    }

    #[test]
    fn test_chain_closures() {
        let edges = vec![edge("t1", "t2"), edge("t2", "t3")];
        assert_eq!(ancestors("t3", &edges), set(&["t1", "t2"]));
        assert_eq!(descendants("t1", &edges), set(&["t2", "t3"]));
        assert!(ancestors("t1", &edges).is_empty());
        assert!(descendants("t3", &edges).is_empty());
    }

    #[test]
    fn test_diamond() {
        let edges = vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")];
        assert_eq!(ancestors("d", &edges), set(&["a", "b", "c"]));
        assert_eq!(descendants("a", &edges), set(&["b", "c", "d"]));
    }

    #[test]
    fn test_cycle_terminates_and_includes_focal() {
        let edges = vec![edge("x", "y"), edge("y", "z"), edge("z", "x")];
        assert_eq!(ancestors("x", &edges), set(&["x", "y", "z"]));
        assert_eq!(descendants("x", &edges), set(&["x", "y", "z"]));
    }

    #[test]
    fn test_self_loop_is_noop() {
        let edges = vec![edge("a", "a"), edge("a", "b")];
        assert_eq!(descendants("a", &edges), set(&["b"]));
        assert!(ancestors("a", &edges).is_empty());
    }

    #[test]
    fn test_unknown_node() {
        let edges = make_chain(3);
        assert!(ancestors("missing", &edges).is_empty());
        assert!(descendants("missing", &[]).is_empty());
    }

    #[test]
    fn test_long_chain_no_recursion_limit() {
        let edges = make_chain(200_000);
        let up = ancestors("n199999", &edges);
        assert_eq!(up.len(), 199_999);
    }

    #[test]
    fn test_reachable_out_of_range_handle() {
        let g = Graph::from_edges(&make_chain(3));
        assert!(reachable(&g, 99, Direction::Downstream).is_empty());
    }

    #[test]
    fn test_highlights() {
        let edges = vec![edge("src", "mid"), edge("mid", "dst"), edge("other", "dst")];
        let g = Graph::from_edges(&edges);
        let h = Highlights::for_focus(&g, Some("mid"));
        assert!(h.is_selected("mid"));
        assert_eq!(h.upstream, set(&["src"]));
        assert_eq!(h.downstream, set(&["dst"]));
        assert!(h.edge_is_upstream(&edges[0]));
        assert!(h.edge_is_downstream(&edges[1]));
        assert!(!h.edge_is_downstream(&edges[2]));
        assert!(!h.edge_is_upstream(&edges[2]));
    }

    #[test]
    fn test_highlights_without_focus() {
        let g = Graph::from_edges(&make_chain(4));
        let h = Highlights::for_focus(&g, None);
        assert_eq!(h, Highlights::default());
    }
}
