//! In-memory BEL multigraph backed by petgraph::StableDiGraph.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::model::{BelEdge, BelNode, Function, Relation};

/// Node weight: the BEL term plus its experimental values.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub node: BelNode,
    pub data: BTreeMap<String, f64>,
}

/// Descriptive graph metadata carried through I/O.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Directed multigraph of BEL terms.
///
/// Stable indices are used because most transformations remove nodes and
/// edges while iterating over snapshots of the graph.
#[derive(Debug, Clone, Default)]
pub struct BelGraph {
    graph: StableDiGraph<NodeEntry, BelEdge>,
    /// O(1) node → NodeIndex lookup.
    index: HashMap<BelNode, NodeIndex>,
    pub metadata: GraphMetadata,
}

impl BelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: &str) -> Self {
        let mut graph = Self::new();
        graph.metadata.name = Some(name.to_string());
        graph
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    /// Get or create a node.
    pub fn add_node(&mut self, node: &BelNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(node) {
            idx
        } else {
            let idx = self.graph.add_node(NodeEntry {
                node: node.clone(),
                data: BTreeMap::new(),
            });
            self.index.insert(node.clone(), idx);
            idx
        }
    }

    /// Add an edge, creating either endpoint if needed.
    pub fn add_edge(&mut self, source: &BelNode, target: &BelNode, edge: BelEdge) -> EdgeIndex {
        let u = self.add_node(source);
        let v = self.add_node(target);
        self.graph.add_edge(u, v, edge)
    }

    pub fn add_unqualified_edge(
        &mut self,
        source: &BelNode,
        target: &BelNode,
        relation: Relation,
    ) -> EdgeIndex {
        self.add_edge(source, target, BelEdge::unqualified(relation))
    }

    pub fn add_qualified_edge(
        &mut self,
        source: &BelNode,
        target: &BelNode,
        relation: Relation,
        citation: &str,
        evidence: &str,
        annotations: &[(&str, &str)],
    ) -> EdgeIndex {
        let edge = annotations.iter().fold(
            BelEdge::qualified(relation, citation, evidence),
            |edge, (key, value)| edge.with_annotation(key, value),
        );
        self.add_edge(source, target, edge)
    }

    /// Add an edge unless an identical one already connects the pair.
    pub fn add_edge_dedup(&mut self, source: &BelNode, target: &BelNode, edge: BelEdge) -> bool {
        if self.edges_between(source, target).contains(&&edge) {
            return false;
        }
        self.add_edge(source, target, edge);
        true
    }

    pub fn node_index(&self, node: &BelNode) -> Option<NodeIndex> {
        self.index.get(node).copied()
    }

    pub fn node_at(&self, idx: NodeIndex) -> Option<&BelNode> {
        self.graph.node_weight(idx).map(|entry| &entry.node)
    }

    pub fn has_node(&self, node: &BelNode) -> bool {
        self.index.contains_key(node)
    }

    pub fn has_edge(&self, source: &BelNode, target: &BelNode) -> bool {
        match (self.node_index(source), self.node_index(target)) {
            (Some(u), Some(v)) => self.graph.find_edge(u, v).is_some(),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    // --- Iteration ---

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &BelNode> + '_ {
        self.graph.node_indices().map(move |idx| &self.graph[idx].node)
    }

    /// All edges as `(source, target, data)`.
    pub fn edges(&self) -> impl Iterator<Item = (&BelNode, &BelNode, &BelEdge)> + '_ {
        self.graph.edge_indices().filter_map(move |e| {
            let (u, v) = self.graph.edge_endpoints(e)?;
            Some((&self.graph[u].node, &self.graph[v].node, &self.graph[e]))
        })
    }

    pub fn edge_ids(&self) -> Vec<EdgeIndex> {
        self.graph.edge_indices().collect()
    }

    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(&BelNode, &BelNode)> {
        let (u, v) = self.graph.edge_endpoints(edge)?;
        Some((&self.graph[u].node, &self.graph[v].node))
    }

    pub fn edge_data(&self, edge: EdgeIndex) -> Option<&BelEdge> {
        self.graph.edge_weight(edge)
    }

    fn neighbors(&self, node: &BelNode, dir: Direction) -> Vec<&BelNode> {
        let Some(idx) = self.node_index(node) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.graph
            .neighbors_directed(idx, dir)
            .filter(|n| seen.insert(*n))
            .map(|n| &self.graph[n].node)
            .collect()
    }

    /// Distinct nodes with an edge into `node`.
    pub fn predecessors(&self, node: &BelNode) -> Vec<&BelNode> {
        self.neighbors(node, Direction::Incoming)
    }

    /// Distinct nodes `node` has an edge to.
    pub fn successors(&self, node: &BelNode) -> Vec<&BelNode> {
        self.neighbors(node, Direction::Outgoing)
    }

    /// Incoming edges as `(source, data)`.
    pub fn in_edges(&self, node: &BelNode) -> Vec<(&BelNode, &BelEdge)> {
        let Some(idx) = self.node_index(node) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (&self.graph[e.source()].node, e.weight()))
            .collect()
    }

    /// Outgoing edges as `(target, data)`.
    pub fn out_edges(&self, node: &BelNode) -> Vec<(&BelNode, &BelEdge)> {
        let Some(idx) = self.node_index(node) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (&self.graph[e.target()].node, e.weight()))
            .collect()
    }

    pub fn in_edge_ids(&self, node: &BelNode) -> Vec<EdgeIndex> {
        self.node_index(node)
            .map(|idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .map(|e| e.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn in_degree(&self, node: &BelNode) -> usize {
        self.node_index(node)
            .map(|idx| self.graph.edges_directed(idx, Direction::Incoming).count())
            .unwrap_or(0)
    }

    pub fn out_degree(&self, node: &BelNode) -> usize {
        self.node_index(node)
            .map(|idx| self.graph.edges_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    pub fn degree(&self, node: &BelNode) -> usize {
        self.in_degree(node) + self.out_degree(node)
    }

    /// All parallel edges from `source` to `target`.
    pub fn edges_between(&self, source: &BelNode, target: &BelNode) -> Vec<&BelEdge> {
        let (Some(u), Some(v)) = (self.node_index(source), self.node_index(target)) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(u, Direction::Outgoing)
            .filter(|e| e.target() == v)
            .map(|e| e.weight())
            .collect()
    }

    pub fn relations_between(&self, source: &BelNode, target: &BelNode) -> BTreeSet<Relation> {
        self.edges_between(source, target)
            .into_iter()
            .map(|e| e.relation)
            .collect()
    }

    /// Distinct ordered `(source, target)` pairs that have at least one edge.
    pub fn node_pairs(&self) -> Vec<(BelNode, BelNode)> {
        let mut seen = HashSet::new();
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .filter(|pair| seen.insert(*pair))
            .map(|(u, v)| (self.graph[u].node.clone(), self.graph[v].node.clone()))
            .collect()
    }

    pub fn nodes_by_function(&self, function: Function) -> Vec<BelNode> {
        self.nodes()
            .filter(|n| n.function == function)
            .cloned()
            .collect()
    }

    // --- Removal ---

    pub fn remove_node(&mut self, node: &BelNode) -> bool {
        match self.index.remove(node) {
            Some(idx) => {
                self.graph.remove_node(idx);
                true
            }
            None => false,
        }
    }

    pub fn remove_nodes<'a, I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = &'a BelNode>,
    {
        for node in nodes {
            self.remove_node(node);
        }
    }

    pub fn remove_edge(&mut self, edge: EdgeIndex) -> Option<BelEdge> {
        self.graph.remove_edge(edge)
    }

    /// Remove every parallel edge from `source` to `target`.
    pub fn remove_edges_between(&mut self, source: &BelNode, target: &BelNode) -> usize {
        let (Some(u), Some(v)) = (self.node_index(source), self.node_index(target)) else {
            return 0;
        };
        let ids: Vec<EdgeIndex> = self
            .graph
            .edges_directed(u, Direction::Outgoing)
            .filter(|e| e.target() == v)
            .map(|e| e.id())
            .collect();
        for id in &ids {
            self.graph.remove_edge(*id);
        }
        ids.len()
    }

    /// Keep only the edges for which `keep(source, target, data)` holds.
    pub fn retain_edges<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&BelNode, &BelNode, &BelEdge) -> bool,
    {
        let doomed: Vec<EdgeIndex> = self
            .graph
            .edge_indices()
            .filter(|&e| {
                self.graph
                    .edge_endpoints(e)
                    .is_some_and(|(u, v)| !keep(&self.graph[u].node, &self.graph[v].node, &self.graph[e]))
            })
            .collect();
        for e in &doomed {
            self.graph.remove_edge(*e);
        }
        doomed.len()
    }

    // --- Node data ---

    pub fn node_data(&self, node: &BelNode) -> Option<&BTreeMap<String, f64>> {
        self.node_index(node).map(|idx| &self.graph[idx].data)
    }

    pub fn node_value(&self, node: &BelNode, key: &str) -> Option<f64> {
        self.node_data(node).and_then(|data| data.get(key).copied())
    }

    /// Set a data value, returning false when the node is absent.
    pub fn set_node_value(&mut self, node: &BelNode, key: &str, value: f64) -> bool {
        match self.node_index(node) {
            Some(idx) => {
                self.graph[idx].data.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn clear_node_value(&mut self, node: &BelNode, key: &str) {
        if let Some(idx) = self.node_index(node) {
            self.graph[idx].data.remove(key);
        }
    }

    fn merge_node_data(&mut self, node: &BelNode, data: &BTreeMap<String, f64>) {
        let idx = self.add_node(node);
        let target = &mut self.graph[idx].data;
        for (key, value) in data {
            target.entry(key.clone()).or_insert(*value);
        }
    }

    // --- Derived graphs ---

    /// Induced subgraph over `nodes`, keeping data and metadata.
    pub fn subgraph<'a, I>(&self, nodes: I) -> BelGraph
    where
        I: IntoIterator<Item = &'a BelNode>,
    {
        let keep: HashSet<NodeIndex> = nodes
            .into_iter()
            .filter_map(|n| self.node_index(n))
            .collect();

        let mut result = BelGraph {
            metadata: self.metadata.clone(),
            ..BelGraph::default()
        };
        for idx in self.graph.node_indices().filter(|i| keep.contains(i)) {
            let entry = &self.graph[idx];
            result.merge_node_data(&entry.node, &entry.data);
        }
        for e in self.graph.edge_indices() {
            if let Some((u, v)) = self.graph.edge_endpoints(e) {
                if keep.contains(&u) && keep.contains(&v) {
                    result.add_edge(&self.graph[u].node, &self.graph[v].node, self.graph[e].clone());
                }
            }
        }
        result
    }

    /// Subgraph made of the edges satisfying `keep` and their endpoints.
    pub fn edge_subgraph<F>(&self, mut keep: F) -> BelGraph
    where
        F: FnMut(&BelNode, &BelNode, &BelEdge) -> bool,
    {
        let mut result = BelGraph {
            metadata: self.metadata.clone(),
            ..BelGraph::default()
        };
        for e in self.graph.edge_indices() {
            let Some((u, v)) = self.graph.edge_endpoints(e) else {
                continue;
            };
            let (source, target) = (&self.graph[u], &self.graph[v]);
            if keep(&source.node, &target.node, &self.graph[e]) {
                result.merge_node_data(&source.node, &source.data);
                result.merge_node_data(&target.node, &target.data);
                result.add_edge(&source.node, &target.node, self.graph[e].clone());
            }
        }
        result
    }

    /// Merge `other` into this graph. Identical parallel edges are not duplicated
    /// and existing node values win over incoming ones.
    pub fn union(&mut self, other: &BelGraph) {
        for idx in other.graph.node_indices() {
            let entry = &other.graph[idx];
            self.merge_node_data(&entry.node, &entry.data);
        }
        for (u, v, edge) in other.edges() {
            self.add_edge_dedup(u, v, edge.clone());
        }
    }

    /// Nodes present in both graphs and the edges both graphs share.
    pub fn intersection(&self, other: &BelGraph) -> BelGraph {
        let shared: Vec<&BelNode> = self.nodes().filter(|n| other.has_node(n)).collect();
        let mut result = BelGraph {
            metadata: self.metadata.clone(),
            ..BelGraph::default()
        };
        for node in &shared {
            if let Some(data) = self.node_data(node) {
                result.merge_node_data(node, data);
            }
        }
        for (u, v, edge) in self.edges() {
            if other.edges_between(u, v).contains(&edge) {
                result.add_edge_dedup(u, v, edge.clone());
            }
        }
        result
    }

    /// Move every edge of `victim` onto `survivor`, then delete `victim`.
    /// Edges that would become self edges on the survivor are dropped, and
    /// victim values only fill keys the survivor does not have.
    pub fn collapse_pair(&mut self, survivor: &BelNode, victim: &BelNode) {
        if survivor == victim || !self.has_node(victim) {
            return;
        }
        let victim_data = self.node_data(victim).cloned().unwrap_or_default();
        self.merge_node_data(survivor, &victim_data);

        let outgoing: Vec<(BelNode, BelEdge)> = self
            .out_edges(victim)
            .into_iter()
            .filter(|(target, _)| *target != survivor)
            .map(|(target, edge)| (target.clone(), edge.clone()))
            .collect();
        let incoming: Vec<(BelNode, BelEdge)> = self
            .in_edges(victim)
            .into_iter()
            .filter(|(source, _)| *source != survivor)
            .map(|(source, edge)| (source.clone(), edge.clone()))
            .collect();

        for (target, edge) in outgoing {
            self.add_edge(survivor, &target, edge);
        }
        for (source, edge) in incoming {
            self.add_edge(&source, survivor, edge);
        }
        self.remove_node(victim);
    }
}
