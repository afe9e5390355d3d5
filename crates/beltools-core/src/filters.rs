//! Node and edge predicates shared by selection, mutation and the analyses.

use crate::graph::{BelEdge, BelGraph, BelNode, Function};

pub fn edge_is_causal(edge: &BelEdge) -> bool {
    edge.relation.is_causal()
}

pub fn edge_has_polarity(edge: &BelEdge) -> bool {
    edge.relation.is_causal_polar()
}

pub fn edge_has_annotation(edge: &BelEdge, key: &str) -> bool {
    edge.annotations.contains_key(key)
}

pub fn node_has_value(graph: &BelGraph, node: &BelNode, key: &str) -> bool {
    graph.node_value(node, key).is_some()
}

/// No incoming causal edges but at least one outgoing causal edge.
pub fn is_causal_source(graph: &BelGraph, node: &BelNode) -> bool {
    !graph.in_edges(node).iter().any(|(_, e)| edge_is_causal(e))
        && graph.out_edges(node).iter().any(|(_, e)| edge_is_causal(e))
}

/// No outgoing causal edges but at least one incoming causal edge.
pub fn is_causal_sink(graph: &BelGraph, node: &BelNode) -> bool {
    graph.in_edges(node).iter().any(|(_, e)| edge_is_causal(e))
        && !graph.out_edges(node).iter().any(|(_, e)| edge_is_causal(e))
}

/// A node with nothing upstream and a single edge out.
pub fn is_upstream_leaf(graph: &BelGraph, node: &BelNode) -> bool {
    graph.in_degree(node) == 0 && graph.out_degree(node) == 1
}

pub fn is_source(graph: &BelGraph, node: &BelNode) -> bool {
    graph.in_degree(node) == 0
}

pub fn is_isolated(graph: &BelGraph, node: &BelNode) -> bool {
    graph.degree(node) == 0
}

/// Nodes with at least one outgoing causal edge.
pub fn get_causal_regulators(graph: &BelGraph) -> Vec<BelNode> {
    graph
        .nodes()
        .filter(|n| graph.out_edges(n).iter().any(|(_, e)| edge_is_causal(e)))
        .cloned()
        .collect()
}

pub fn function_in(node: &BelNode, functions: &[Function]) -> bool {
    functions.contains(&node.function)
}

/// Nodes whose name contains any query string, ignoring case.
pub fn search_node_names(graph: &BelGraph, queries: &[String]) -> Vec<BelNode> {
    let queries: Vec<String> = queries.iter().map(|q| q.to_lowercase()).collect();
    graph
        .nodes()
        .filter(|n| {
            let name = n.name.to_lowercase();
            queries.iter().any(|q| name.contains(q))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Relation;

    #[test]
    fn sources_and_sinks() {
        let mut g = BelGraph::new();
        let (a, b, c) = (
            BelNode::protein("HGNC", "A"),
            BelNode::protein("HGNC", "B"),
            BelNode::protein("HGNC", "C"),
        );
        g.add_unqualified_edge(&a, &b, Relation::Increases);
        g.add_unqualified_edge(&b, &c, Relation::Association);
        assert!(is_causal_source(&g, &a));
        assert!(is_causal_sink(&g, &b));
        assert!(!is_causal_sink(&g, &c));
        assert!(is_upstream_leaf(&g, &a));
        assert_eq!(get_causal_regulators(&g), vec![a]);
    }

    #[test]
    fn name_search_is_case_insensitive() {
        let mut g = BelGraph::new();
        g.add_node(&BelNode::protein("HGNC", "MAPT"));
        g.add_node(&BelNode::protein("HGNC", "APP"));
        let hits = search_node_names(&g, &["mapt".to_string()]);
        assert_eq!(hits, vec![BelNode::protein("HGNC", "MAPT")]);
    }
}
