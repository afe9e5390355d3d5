//! In-place graph transformations: inference, collapsing, pruning and data overlay.

use std::collections::HashMap;

use log::debug;

use crate::filters::{is_isolated, is_source, is_upstream_leaf};
use crate::graph::{BelGraph, BelNode, Function, Relation};

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

/// Add `parent hasVariant variant` for every variant node.
pub fn enrich_variants(graph: &mut BelGraph) {
    let variants: Vec<BelNode> = graph.nodes().filter(|n| n.has_variants()).cloned().collect();
    for variant in variants {
        let parent = variant.parent();
        if !graph.relations_between(&parent, &variant).contains(&Relation::HasVariant) {
            graph.add_unqualified_edge(&parent, &variant, Relation::HasVariant);
        }
    }
}

/// Add `r(X) translatedTo p(X)` for every plain protein.
pub fn enrich_proteins_with_rnas(graph: &mut BelGraph) {
    let proteins: Vec<BelNode> = graph
        .nodes()
        .filter(|n| n.function == Function::Protein && !n.has_variants())
        .cloned()
        .collect();
    for protein in proteins {
        let rna = protein.with_function(Function::Rna);
        if !graph.relations_between(&rna, &protein).contains(&Relation::TranslatedTo) {
            graph.add_unqualified_edge(&rna, &protein, Relation::TranslatedTo);
        }
    }
}

/// Add `g(X) transcribedTo r(X)` for every plain RNA or miRNA.
pub fn enrich_rnas_with_genes(graph: &mut BelGraph) {
    let rnas: Vec<BelNode> = graph
        .nodes()
        .filter(|n| matches!(n.function, Function::Rna | Function::MicroRna) && !n.has_variants())
        .cloned()
        .collect();
    for rna in rnas {
        let gene = rna.with_function(Function::Gene);
        if !graph.relations_between(&gene, &rna).contains(&Relation::TranscribedTo) {
            graph.add_unqualified_edge(&gene, &rna, Relation::TranscribedTo);
        }
    }
}

/// Add the gene → RNA → protein chain behind every central dogma node.
pub fn infer_central_dogma(graph: &mut BelGraph) {
    enrich_variants(graph);
    enrich_proteins_with_rnas(graph);
    enrich_rnas_with_genes(graph);
}

/// For each two-way edge `u → v`, add `v → u` with the same data when missing.
pub fn infer_missing_two_way_edges(graph: &mut BelGraph) {
    let missing: Vec<_> = graph
        .edges()
        .filter(|(_, _, edge)| edge.relation.is_two_way())
        .filter(|(u, v, edge)| !graph.edges_between(v, u).iter().any(|e| e.relation == edge.relation))
        .map(|(u, v, edge)| (v.clone(), u.clone(), edge.clone()))
        .collect();
    for (u, v, edge) in missing {
        graph.add_edge_dedup(&u, &v, edge);
    }
}

// ---------------------------------------------------------------------------
// Collapsing
// ---------------------------------------------------------------------------

/// Collapse every edge `survivor -relation-> victim` onto its source.
fn collapse_by_relation(graph: &mut BelGraph, relation: Relation) {
    let pairs: Vec<(BelNode, BelNode)> = graph
        .edges()
        .filter(|(u, v, e)| e.relation == relation && u != v)
        .map(|(u, v, _)| (u.clone(), v.clone()))
        .collect();
    for (survivor, victim) in pairs {
        if graph.has_node(&survivor) {
            graph.collapse_pair(&survivor, &victim);
        }
    }
}

/// Merge every variant node into its parent entity.
///
/// A `hasVariant` edge names the parent, so a variant follows it onto
/// whatever node the parent was already collapsed into. Variants without
/// one fall back to their parsed parent.
pub fn collapse_all_variants(graph: &mut BelGraph) {
    collapse_by_relation(graph, Relation::HasVariant);
    let orphans: Vec<BelNode> = graph.nodes().filter(|n| n.has_variants()).cloned().collect();
    for variant in orphans {
        graph.collapse_pair(&variant.parent(), &variant);
    }
}

/// Merge proteins into RNAs and RNAs into genes, leaving one gene node per entity.
pub fn collapse_to_genes(graph: &mut BelGraph) {
    infer_central_dogma(graph);
    collapse_by_relation(graph, Relation::TranslatedTo);
    collapse_by_relation(graph, Relation::TranscribedTo);
}

/// Replace the parallel edges of every pair that agrees on a single relation
/// with one unqualified edge.
pub fn collapse_consistent_edges(graph: &mut BelGraph) {
    for (u, v) in graph.node_pairs() {
        let relations = graph.relations_between(&u, &v);
        if relations.len() != 1 || graph.edges_between(&u, &v).len() < 2 {
            continue;
        }
        if let Some(relation) = relations.into_iter().next() {
            graph.remove_edges_between(&u, &v);
            graph.add_unqualified_edge(&u, &v, relation);
        }
    }
}

/// Remove all edges between pairs that carry more than one distinct relation.
pub fn remove_inconsistent_edges(graph: &mut BelGraph) {
    for (u, v) in graph.node_pairs() {
        if graph.relations_between(&u, &v).len() > 1 {
            let removed = graph.remove_edges_between(&u, &v);
            debug!("removed {removed} inconsistent edges {u} -> {v}");
        }
    }
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

pub fn remove_isolated_nodes(graph: &mut BelGraph) {
    let isolated: Vec<BelNode> = graph.nodes().filter(|n| is_isolated(graph, n)).cloned().collect();
    graph.remove_nodes(isolated.iter());
}

pub fn remove_nodes_by_function(graph: &mut BelGraph, functions: &[Function]) {
    let doomed: Vec<BelNode> = graph
        .nodes()
        .filter(|n| functions.contains(&n.function))
        .cloned()
        .collect();
    graph.remove_nodes(doomed.iter());
}

/// Remove upstream leaves (no in-edges, one out-edge) that have no value for `key`.
pub fn remove_unweighted_leaves(graph: &mut BelGraph, key: &str) {
    let leaves: Vec<BelNode> = graph
        .nodes()
        .filter(|n| is_upstream_leaf(graph, n) && graph.node_value(n, key).is_none())
        .cloned()
        .collect();
    graph.remove_nodes(leaves.iter());
}

/// Remove sources that have no value for `key`.
pub fn remove_unweighted_sources(graph: &mut BelGraph, key: &str) {
    let sources: Vec<BelNode> = graph
        .nodes()
        .filter(|n| is_source(graph, n) && graph.node_value(n, key).is_none())
        .cloned()
        .collect();
    graph.remove_nodes(sources.iter());
}

pub fn prune_mechanism_by_data(graph: &mut BelGraph, key: &str) {
    remove_unweighted_leaves(graph, key);
    remove_unweighted_sources(graph, key);
}

// ---------------------------------------------------------------------------
// Data overlay
// ---------------------------------------------------------------------------

/// Write `data[name]` onto nodes of the given function (and namespace, when
/// given) under `key`. Nodes absent from `data` get `impute` if set.
pub fn overlay_type_data(
    graph: &mut BelGraph,
    data: &HashMap<String, f64>,
    key: &str,
    function: Function,
    namespace: Option<&str>,
    overwrite: bool,
    impute: Option<f64>,
) -> usize {
    let targets: Vec<BelNode> = graph
        .nodes()
        .filter(|n| n.function == function && !n.has_variants())
        .filter(|n| namespace.is_none_or(|ns| n.namespace.eq_ignore_ascii_case(ns)))
        .cloned()
        .collect();

    let mut written = 0;
    for node in targets {
        if !overwrite && graph.node_value(&node, key).is_some() {
            continue;
        }
        if let Some(value) = data.get(&node.name).copied().or(impute) {
            graph.set_node_value(&node, key, value);
            written += 1;
        }
    }
    written
}

/// Overlay `data` onto every central dogma node by name.
pub fn overlay_data(graph: &mut BelGraph, data: &HashMap<String, f64>, key: &str) -> usize {
    [Function::Gene, Function::Rna, Function::MicroRna, Function::Protein]
        .into_iter()
        .map(|function| overlay_type_data(graph, data, key, function, None, true, None))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> BelNode {
        BelNode::protein("HGNC", name)
    }

    #[test]
    fn central_dogma_chain() {
        let mut g = BelGraph::new();
        g.add_node(&p("A").with_variant("p.Ala1Thr"));
        infer_central_dogma(&mut g);
        assert!(g.has_edge(&p("A"), &p("A").with_variant("p.Ala1Thr")));
        assert!(g.has_edge(&BelNode::rna("HGNC", "A"), &p("A")));
        assert!(g.has_edge(&BelNode::gene("HGNC", "A"), &BelNode::rna("HGNC", "A")));
        // idempotent
        let edges = g.edge_count();
        infer_central_dogma(&mut g);
        assert_eq!(g.edge_count(), edges);
    }

    #[test]
    fn collapse_to_genes_keeps_edges_and_data() {
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("A"), &p("B"), Relation::Increases);
        g.set_node_value(&p("A"), "weight", 1.0);
        collapse_to_genes(&mut g);
        let (ga, gb) = (BelNode::gene("HGNC", "A"), BelNode::gene("HGNC", "B"));
        assert_eq!(g.node_count(), 2);
        assert!(g.has_edge(&ga, &gb));
        assert_eq!(g.node_value(&ga, "weight"), Some(1.0));
    }

    #[test]
    fn collapse_variants_onto_parent() {
        let mut g = BelGraph::new();
        let variant = p("A").with_variant("p.Ala1Thr");
        g.add_unqualified_edge(&variant, &p("B"), Relation::Increases);
        collapse_all_variants(&mut g);
        assert!(!g.has_node(&variant));
        assert!(g.has_edge(&p("A"), &p("B")));
    }

    #[test]
    fn variants_follow_parent_onto_gene() {
        let mut g = BelGraph::new();
        let variant = p("A").with_variant("p.Ala1Thr");
        g.add_unqualified_edge(&p("B"), &variant, Relation::Increases);
        g.add_unqualified_edge(&p("A"), &p("C"), Relation::Increases);
        g.set_node_value(&p("A"), "weight", 2.0);

        collapse_to_genes(&mut g);
        collapse_all_variants(&mut g);

        let gene = |name| BelNode::gene("HGNC", name);
        assert!(!g.has_node(&p("A")));
        assert!(!g.has_node(&variant));
        assert!(g.nodes().all(|n| n.function == Function::Gene));
        assert_eq!(g.node_count(), 3);
        assert!(g.has_edge(&gene("B"), &gene("A")));
        assert!(g.has_edge(&gene("A"), &gene("C")));
        assert_eq!(g.node_value(&gene("A"), "weight"), Some(2.0));
    }

    #[test]
    fn consistent_and_inconsistent_edges() {
        let mut g = BelGraph::new();
        g.add_qualified_edge(&p("A"), &p("B"), Relation::Increases, "1", "x", &[]);
        g.add_qualified_edge(&p("A"), &p("B"), Relation::Increases, "2", "y", &[]);
        g.add_unqualified_edge(&p("B"), &p("C"), Relation::Increases);
        g.add_unqualified_edge(&p("B"), &p("C"), Relation::Decreases);

        remove_inconsistent_edges(&mut g);
        assert!(!g.has_edge(&p("B"), &p("C")));

        collapse_consistent_edges(&mut g);
        let between = g.edges_between(&p("A"), &p("B"));
        assert_eq!(between.len(), 1);
        assert!(between[0].citation.is_none());
    }

    #[test]
    fn two_way_inference() {
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("A"), &p("B"), Relation::Association);
        g.add_unqualified_edge(&p("A"), &p("C"), Relation::Increases);
        infer_missing_two_way_edges(&mut g);
        assert!(g.has_edge(&p("B"), &p("A")));
        assert!(!g.has_edge(&p("C"), &p("A")));
    }

    #[test]
    fn prune_by_data() {
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("A"), &p("C"), Relation::Increases);
        g.add_unqualified_edge(&p("B"), &p("C"), Relation::Increases);
        g.set_node_value(&p("B"), "weight", 1.0);
        prune_mechanism_by_data(&mut g, "weight");
        assert!(!g.has_node(&p("A")));
        assert!(g.has_node(&p("B")));
    }

    #[test]
    fn overlay_respects_overwrite() {
        let mut g = BelGraph::new();
        g.add_node(&p("A"));
        g.add_node(&p("B"));
        g.set_node_value(&p("B"), "weight", 9.0);
        let data: HashMap<String, f64> = [("A".to_string(), 1.0), ("B".to_string(), 2.0)].into();
        let written = overlay_type_data(&mut g, &data, "weight", Function::Protein, Some("hgnc"), false, None);
        assert_eq!(written, 1);
        assert_eq!(g.node_value(&p("B"), "weight"), Some(9.0));
        assert_eq!(overlay_data(&mut g, &data, "weight"), 2);
        assert_eq!(g.node_value(&p("B"), "weight"), Some(2.0));
    }
}
