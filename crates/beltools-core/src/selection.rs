//! Subgraph selection: by annotation, causality, neighborhood and search.

use std::collections::{BTreeMap, HashSet};

use crate::filters::{edge_is_causal, search_node_names};
use crate::graph::{BelEdge, BelGraph, BelNode};

/// Edges annotated with `key = value`, plus their endpoints.
pub fn get_subgraph_by_annotation_value(graph: &BelGraph, key: &str, value: &str) -> BelGraph {
    graph.edge_subgraph(|_, _, edge| edge.has_annotation_value(key, value))
}

/// One subgraph per value of the annotation `key`.
pub fn get_subgraphs_by_annotation(graph: &BelGraph, key: &str) -> BTreeMap<String, BelGraph> {
    let mut buckets: BTreeMap<String, BelGraph> = BTreeMap::new();
    for (u, v, edge) in graph.edges() {
        let Some(values) = edge.annotations.get(key) else {
            continue;
        };
        for value in values {
            let sub = buckets.entry(value.clone()).or_insert_with(|| {
                let mut g = BelGraph::with_name(value);
                g.metadata.version = graph.metadata.version.clone();
                g
            });
            copy_edge(graph, sub, u, v, edge);
        }
    }
    buckets
}

/// Only causal edges.
pub fn get_causal_subgraph(graph: &BelGraph) -> BelGraph {
    graph.edge_subgraph(|_, _, edge| edge_is_causal(edge))
}

/// Causal edges pointing into any of `nodes`.
pub fn get_upstream_causal_subgraph(graph: &BelGraph, nodes: &[BelNode]) -> BelGraph {
    let targets: HashSet<&BelNode> = nodes.iter().collect();
    graph.edge_subgraph(|_, v, edge| targets.contains(v) && edge_is_causal(edge))
}

/// Add to `graph` every causal edge of `universe` that points into one of its nodes.
pub fn expand_upstream_causal(universe: &BelGraph, graph: &mut BelGraph) {
    let nodes: Vec<BelNode> = graph.nodes().cloned().collect();
    for node in &nodes {
        for (source, edge) in universe.in_edges(node) {
            if edge_is_causal(edge) {
                copy_edge(universe, graph, source, node, edge);
            }
        }
    }
}

/// All edges touching any of `nodes`.
pub fn get_subgraph_by_neighborhood(graph: &BelGraph, nodes: &[BelNode]) -> BelGraph {
    let wanted: HashSet<&BelNode> = nodes.iter().collect();
    graph.edge_subgraph(|u, v, _| wanted.contains(u) || wanted.contains(v))
}

/// Add the first neighborhood of each of `nodes` from `universe` to `graph`.
pub fn expand_nodes_neighborhoods(universe: &BelGraph, graph: &mut BelGraph, nodes: &[BelNode]) {
    for node in nodes {
        for (target, edge) in universe.out_edges(node) {
            copy_edge(universe, graph, node, target, edge);
        }
        for (source, edge) in universe.in_edges(node) {
            copy_edge(universe, graph, source, node, edge);
        }
    }
}

/// Neighborhood of every node whose name matches one of `queries`.
pub fn get_subgraph_by_node_search(graph: &BelGraph, queries: &[String]) -> BelGraph {
    let hits = search_node_names(graph, queries);
    get_subgraph_by_neighborhood(graph, &hits)
}

fn copy_edge(from: &BelGraph, to: &mut BelGraph, u: &BelNode, v: &BelNode, edge: &BelEdge) {
    for node in [u, v] {
        if !to.has_node(node) {
            to.add_node(node);
            if let Some(data) = from.node_data(node) {
                for (key, value) in data {
                    to.set_node_value(node, key, *value);
                }
            }
        }
    }
    to.add_edge_dedup(u, v, edge.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BelEdge, Relation};

    fn p(name: &str) -> BelNode {
        BelNode::protein("HGNC", name)
    }

    fn annotated() -> BelGraph {
        let mut g = BelGraph::new();
        g.add_edge(&p("A"), &p("B"), BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "S1"));
        g.add_edge(&p("B"), &p("C"), BelEdge::unqualified(Relation::Decreases).with_annotation("Subgraph", "S2"));
        g.add_edge(&p("C"), &p("D"), BelEdge::unqualified(Relation::Association).with_annotation("Subgraph", "S1"));
        g
    }

    #[test]
    fn annotation_value_selection() {
        let sub = get_subgraph_by_annotation_value(&annotated(), "Subgraph", "S1");
        assert_eq!(sub.edge_count(), 2);
        assert_eq!(sub.node_count(), 4);
    }

    #[test]
    fn stratify_by_annotation() {
        let strata = get_subgraphs_by_annotation(&annotated(), "Subgraph");
        assert_eq!(strata.len(), 2);
        assert_eq!(strata["S2"].edge_count(), 1);
        assert_eq!(strata["S2"].name(), Some("S2"));
    }

    #[test]
    fn upstream_causal_then_expand() {
        let g = annotated();
        let mut sub = get_upstream_causal_subgraph(&g, &[p("C")]);
        assert_eq!(sub.edge_count(), 1);
        expand_upstream_causal(&g, &mut sub);
        assert!(sub.has_edge(&p("A"), &p("B")));
        assert_eq!(sub.edge_count(), 2);
    }

    #[test]
    fn causal_subgraph_drops_association() {
        assert_eq!(get_causal_subgraph(&annotated()).edge_count(), 2);
    }

    #[test]
    fn search_selects_neighborhood() {
        let sub = get_subgraph_by_node_search(&annotated(), &["d".to_string()]);
        assert_eq!(sub.edge_count(), 1);
        assert!(sub.has_node(&p("C")));
    }
}
