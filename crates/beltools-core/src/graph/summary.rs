//! Count-based summaries of a graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bel_graph::BelGraph;
use crate::analysis::stability::{get_contradictory_pairs, summarize_stability};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    pub name: Option<String>,
    pub nodes: usize,
    pub edges: usize,
    pub functions: BTreeMap<String, usize>,
    pub relations: BTreeMap<String, usize>,
    pub namespaces: BTreeMap<String, usize>,
    pub annotations: BTreeMap<String, usize>,
    pub contradictions: usize,
    pub stability: BTreeMap<String, usize>,
}

pub fn count_functions(graph: &BelGraph) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for node in graph.nodes() {
        *counts.entry(node.function.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn count_relations(graph: &BelGraph) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (_, _, edge) in graph.edges() {
        *counts.entry(edge.relation.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn count_namespaces(graph: &BelGraph) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for node in graph.nodes() {
        *counts.entry(node.namespace.clone()).or_insert(0) += 1;
    }
    counts
}

/// Number of edges carrying each annotation key.
pub fn count_annotations(graph: &BelGraph) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (_, _, edge) in graph.edges() {
        for key in edge.annotations.keys() {
            *counts.entry(key.clone()).or_insert(0) += 1;
        }
    }
    counts
}

pub fn summarize(graph: &BelGraph) -> GraphSummary {
    GraphSummary {
        name: graph.metadata.name.clone(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        functions: count_functions(graph),
        relations: count_relations(graph),
        namespaces: count_namespaces(graph),
        annotations: count_annotations(graph),
        contradictions: get_contradictory_pairs(graph).len(),
        stability: summarize_stability(graph),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{BelEdge, BelNode, Relation};

    #[test]
    fn counts() {
        let mut g = BelGraph::new();
        let a = BelNode::protein("HGNC", "A");
        let b = BelNode::rna("HGNC", "B");
        let c = BelNode::bioprocess("GO", "c");
        g.add_edge(&a, &b, BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "X"));
        g.add_unqualified_edge(&b, &c, Relation::Increases);
        g.add_unqualified_edge(&b, &c, Relation::Decreases);

        let summary = summarize(&g);
        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.edges, 3);
        assert_eq!(summary.functions["Protein"], 1);
        assert_eq!(summary.relations["increases"], 2);
        assert_eq!(summary.namespaces["HGNC"], 2);
        assert_eq!(summary.annotations["Subgraph"], 1);
        assert_eq!(summary.contradictions, 1);
    }
}
