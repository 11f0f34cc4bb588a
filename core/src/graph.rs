use std::collections::HashMap;

use crate::model::{Edge, Node};

/// Dense node handle into a [`Graph`] arena.
pub type NodeIdx = u32;

/// Adjacency-list arena over string node ids.
///
/// Nodes are interned in insertion order, so a handle is also the node's
/// position in the input slice. Edges are stored bidirectionally:
/// `outgoing[a]` holds the targets of a, `incoming[b]` holds the sources
/// feeding b. Traversal and layout work on handles only.
pub struct Graph {
    ids: Vec<String>,
    index: HashMap<String, NodeIdx>,
    outgoing: Vec<Vec<NodeIdx>>,
    incoming: Vec<Vec<NodeIdx>>,
    edge_count: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            index: HashMap::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            edge_count: 0,
        }
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(node_count: usize) -> Self {
        Self {
            ids: Vec::with_capacity(node_count),
            index: HashMap::with_capacity(node_count),
            outgoing: Vec::with_capacity(node_count),
            incoming: Vec::with_capacity(node_count),
            edge_count: 0,
        }
    }

    /// Index a node set and the edges between its members.
    /// Edges with an endpoint outside `nodes` are skipped.
    pub fn from_lineage(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut graph = Self::with_capacity(nodes.len());
        for node in nodes {
            graph.add_node(&node.id);
        }
        for edge in edges {
            if let (Some(from), Some(to)) = (graph.resolve(&edge.source), graph.resolve(&edge.target)) {
                graph.add_edge(from, to);
            }
        }
        graph
    }

    /// Index a bare edge list; endpoints are registered in order of appearance.
    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            let from = graph.add_node(&edge.source);
            let to = graph.add_node(&edge.target);
            graph.add_edge(from, to);
        }
        graph
    }

    /// Intern a node id, returning its handle. Idempotent.
    pub fn add_node(&mut self, id: &str) -> NodeIdx {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.ids.len() as NodeIdx;
        self.ids.push(id.to_string());
        self.index.insert(id.to_string(), idx);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        idx
    }

    /// Add a directed edge. Also inserts into the incoming adjacency list.
    pub fn add_edge(&mut self, from: NodeIdx, to: NodeIdx) {
        self.outgoing[from as usize].push(to);
        self.incoming[to as usize].push(from);
        self.edge_count += 1;
    }

    pub fn resolve(&self, id: &str) -> Option<NodeIdx> {
        self.index.get(id).copied()
    }

    pub fn id(&self, idx: NodeIdx) -> &str {
        &self.ids[idx as usize]
    }

    pub fn neighbors_out(&self, idx: NodeIdx) -> &[NodeIdx] {
        self.outgoing
            .get(idx as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn neighbors_in(&self, idx: NodeIdx) -> &[NodeIdx] {
        self.incoming
            .get(idx as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// A root has no parents at all. A self-loop counts as a parent.
    pub fn is_root(&self, idx: NodeIdx) -> bool {
        self.neighbors_in(idx).is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = NodeIdx> {
        0..self.ids.len() as NodeIdx
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
