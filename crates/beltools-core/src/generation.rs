//! Candidate mechanism generation for heat diffusion.

use std::collections::BTreeMap;

use crate::graph::{BelGraph, BelNode, Function};
use crate::mutation::{collapse_consistent_edges, prune_mechanism_by_data, remove_inconsistent_edges};
use crate::selection::{expand_upstream_causal, get_upstream_causal_subgraph};

/// Causal upstream mechanism of `node`, expanded one more level upstream and
/// cleaned of inconsistent and redundant edges. When `key` is given,
/// unweighted upstream leaves and sources are pruned.
pub fn generate_mechanism(graph: &BelGraph, node: &BelNode, key: Option<&str>) -> BelGraph {
    let mut mechanism = get_upstream_causal_subgraph(graph, std::slice::from_ref(node));
    expand_upstream_causal(graph, &mut mechanism);
    remove_inconsistent_edges(&mut mechanism);
    collapse_consistent_edges(&mut mechanism);

    if let Some(key) = key {
        prune_mechanism_by_data(&mut mechanism, key);
    }

    mechanism.metadata.name = Some(node.to_string());
    mechanism
}

/// One mechanism per biological process in `graph`.
pub fn generate_bioprocess_mechanisms(
    graph: &BelGraph,
    key: Option<&str>,
) -> BTreeMap<BelNode, BelGraph> {
    graph
        .nodes_by_function(Function::BiologicalProcess)
        .into_iter()
        .map(|bp| {
            let mechanism = generate_mechanism(graph, &bp, key);
            (bp, mechanism)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Relation;

    fn p(name: &str) -> BelNode {
        BelNode::protein("HGNC", name)
    }

    #[test]
    fn mechanism_of_d() {
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("A"), &p("B"), Relation::Increases);
        g.add_unqualified_edge(&p("B"), &p("D"), Relation::Decreases);
        g.add_unqualified_edge(&p("A"), &p("C"), Relation::Increases);
        g.add_unqualified_edge(&p("C"), &p("D"), Relation::Increases);
        g.set_node_value(&p("A"), "weight", 2.0);
        g.set_node_value(&p("B"), "weight", -1.0);
        g.set_node_value(&p("C"), "weight", 1.0);

        let mechanism = generate_mechanism(&g, &p("D"), Some("weight"));
        assert_eq!(mechanism.node_count(), 4);
        assert_eq!(mechanism.edge_count(), 4);
        assert_eq!(mechanism.node_value(&p("A"), "weight"), Some(2.0));
    }

    #[test]
    fn unweighted_leaf_is_pruned() {
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("X"), &p("B"), Relation::Increases);
        g.add_unqualified_edge(&p("B"), &p("D"), Relation::Increases);
        g.add_unqualified_edge(&p("C"), &p("D"), Relation::Increases);
        g.set_node_value(&p("C"), "weight", 1.0);
        let mechanism = generate_mechanism(&g, &p("D"), Some("weight"));
        assert!(!mechanism.has_node(&p("X")));
        // B became a source after X was removed and has no value either
        assert!(!mechanism.has_node(&p("B")));
        assert!(mechanism.has_node(&p("C")));
    }

    #[test]
    fn bioprocess_mechanisms() {
        let mut g = BelGraph::new();
        let bp = BelNode::bioprocess("GO", "apoptotic process");
        g.add_unqualified_edge(&p("A"), &bp, Relation::Increases);
        g.add_unqualified_edge(&p("B"), &p("C"), Relation::Increases);
        let mechanisms = generate_bioprocess_mechanisms(&g, None);
        assert_eq!(mechanisms.len(), 1);
        assert_eq!(mechanisms[&bp].node_count(), 2);
    }
}
