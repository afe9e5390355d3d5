//! NeuroMMSig mechanism enrichment.
//!
//! A query gene list is scored against every subgraph of an annotation
//! (e.g. `Subgraph`) by a weighted mix of three measures: how much of the
//! subgraph's gene content the query covers, how many of its most central
//! genes are queried, and how densely the queried genes connect.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use log::{debug, warn};
use rayon::prelude::*;

use crate::error::{BelError, Result};
use crate::graph::{BelGraph, BelNode, Function};
use crate::mutation::{collapse_all_variants, collapse_to_genes, infer_central_dogma};
use crate::selection::get_subgraphs_by_annotation;

/// Graphs with fewer nodes get a hub score of zero.
pub const MIN_HUB_GRAPH_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct NeurommsigSettings {
    pub annotation: String,
    pub ora_weight: f64,
    pub hub_weight: f64,
    pub topology_weight: f64,
    /// Share of the graph's genes counted as hubs.
    pub top_percent: f64,
    pub preprocess: bool,
}

impl Default for NeurommsigSettings {
    fn default() -> Self {
        Self {
            annotation: "Subgraph".to_string(),
            ora_weight: 1.0,
            hub_weight: 1.0,
            topology_weight: 1.0,
            top_percent: 0.05,
            preprocess: true,
        }
    }
}

impl NeurommsigSettings {
    /// Weights must be finite and non-negative. A zero weight counts as 1.
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("ora_weight", self.ora_weight),
            ("hub_weight", self.hub_weight),
            ("topology_weight", self.topology_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(BelError::InvalidArgument(format!("{name} must be a non-negative number, got {weight}")));
            }
        }
        Ok(())
    }
}

fn weight_or_one(weight: f64) -> f64 {
    if weight == 0.0 {
        1.0
    } else {
        weight
    }
}

/// Infer the central dogma, then collapse proteins, RNAs and variants onto genes.
pub fn neurommsig_graph_preprocessor(graph: &BelGraph) -> BelGraph {
    let mut result = graph.clone();
    infer_central_dogma(&mut result);
    collapse_to_genes(&mut result);
    collapse_all_variants(&mut result);
    result
}

/// HGNC gene nodes for plain symbols.
pub fn genes_from_symbols<S: AsRef<str>>(symbols: &[S]) -> Vec<BelNode> {
    symbols.iter().map(|s| BelNode::gene("HGNC", s.as_ref())).collect()
}

/// Share of the graph's genes that are in the query.
pub fn gene_ora(graph: &BelGraph, genes: &[BelNode]) -> f64 {
    let graph_genes = graph.nodes_by_function(Function::Gene);
    if graph_genes.is_empty() {
        return 0.0;
    }
    let query: HashSet<&BelNode> = genes.iter().collect();
    let hits = graph_genes.iter().filter(|g| query.contains(g)).count();
    hits as f64 / graph_genes.len() as f64
}

/// Directed betweenness centrality (Brandes), normalized by `(n - 1)(n - 2)`.
pub fn betweenness_centrality(graph: &BelGraph) -> HashMap<BelNode, f64> {
    let nodes: Vec<&BelNode> = graph.nodes().collect();
    let n = nodes.len();
    let position: HashMap<&BelNode, usize> = nodes.iter().enumerate().map(|(i, node)| (*node, i)).collect();
    let adj: Vec<Vec<usize>> = nodes
        .iter()
        .map(|node| graph.successors(node).iter().map(|s| position[*s]).collect())
        .collect();

    let mut centrality = vec![0.0; n];
    for s in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist: Vec<Option<usize>> = vec![None; n];
        sigma[s] = 1.0;
        dist[s] = Some(0);

        let mut queue = VecDeque::from([s]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let Some(dv) = dist[v] else { continue };
            for &w in &adj[v] {
                if dist[w].is_none() {
                    dist[w] = Some(dv + 1);
                    queue.push_back(w);
                }
                if dist[w] == Some(dv + 1) {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0_f64; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    let scale = if n > 2 { 1.0 / ((n - 1) * (n - 2)) as f64 } else { 1.0 };
    nodes
        .into_iter()
        .zip(centrality)
        .map(|(node, c)| (node.clone(), c * scale))
        .collect()
}

/// Share of the most central genes that are in the query.
pub fn hubs(graph: &BelGraph, genes: &[BelNode], top_percent: f64) -> f64 {
    if graph.node_count() < MIN_HUB_GRAPH_SIZE {
        debug!("graph has fewer than {MIN_HUB_GRAPH_SIZE} nodes");
        return 0.0;
    }

    let centrality = betweenness_centrality(graph);
    let mut graph_genes: Vec<(BelNode, f64)> = graph
        .nodes_by_function(Function::Gene)
        .into_iter()
        .map(|g| {
            let c = centrality.get(&g).copied().unwrap_or(0.0);
            (g, c)
        })
        .collect();
    graph_genes.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let top = ((graph_genes.len() as f64 * top_percent) as usize).max(1);
    let query: HashSet<&BelNode> = genes.iter().collect();
    let mapped = graph_genes
        .iter()
        .take(top)
        .filter(|(g, _)| query.contains(g))
        .count();
    mapped as f64 / top as f64
}

/// Ordered pairs of distinct query nodes joined by an edge, over `n(n - 1)`.
pub fn topology(graph: &BelGraph, nodes: &[BelNode]) -> f64 {
    let n = nodes.len();
    if n <= 1 {
        return 0.0;
    }
    let mut connected = 0usize;
    for u in nodes {
        for v in nodes {
            if u != v && graph.has_edge(v, u) {
                connected += 1;
            }
        }
    }
    connected as f64 / (n * (n - 1)) as f64
}

/// Weighted composite of [`gene_ora`], [`hubs`] and [`topology`].
pub fn get_neurommsig_score(graph: &BelGraph, genes: &[BelNode], settings: &NeurommsigSettings) -> f64 {
    let ora_weight = weight_or_one(settings.ora_weight);
    let hub_weight = weight_or_one(settings.hub_weight);
    let topology_weight = weight_or_one(settings.topology_weight);
    let weighted = ora_weight * gene_ora(graph, genes)
        + hub_weight * hubs(graph, genes, settings.top_percent)
        + topology_weight * topology(graph, genes);
    weighted / (ora_weight + hub_weight + topology_weight)
}

/// Score every value of `settings.annotation`. `None` when no query gene is in the graph.
pub fn get_neurommsig_scores(
    graph: &BelGraph,
    genes: &[BelNode],
    settings: &NeurommsigSettings,
) -> Option<BTreeMap<String, f64>> {
    let preprocessed;
    let graph = if settings.preprocess {
        preprocessed = neurommsig_graph_preprocessor(graph);
        &preprocessed
    } else {
        graph
    };

    if !genes.iter().any(|g| graph.has_node(g)) {
        warn!("no genes mapping to graph");
        return None;
    }

    let subgraphs = get_subgraphs_by_annotation(graph, &settings.annotation);
    Some(
        subgraphs
            .par_iter()
            .map(|(value, subgraph)| (value.clone(), get_neurommsig_score(subgraph, genes, settings)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BelEdge, Relation};

    fn g(name: &str) -> BelNode {
        BelNode::gene("HGNC", name)
    }

    #[test]
    fn ora_and_topology() {
        let mut graph = BelGraph::new();
        graph.add_unqualified_edge(&g("A"), &g("B"), Relation::Increases);
        graph.add_unqualified_edge(&g("B"), &g("C"), Relation::Increases);
        graph.add_unqualified_edge(&g("C"), &g("D"), Relation::Increases);

        let query = genes_from_symbols(&["A", "B", "Z"]);
        assert_eq!(gene_ora(&graph, &query), 0.5);
        // only B <- A among the six ordered pairs
        assert!((topology(&graph, &query) - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(topology(&graph, &query[..1]), 0.0);
        assert_eq!(gene_ora(&BelGraph::new(), &query), 0.0);
    }

    #[test]
    fn betweenness_on_a_path() {
        let mut graph = BelGraph::new();
        graph.add_unqualified_edge(&g("A"), &g("B"), Relation::Increases);
        graph.add_unqualified_edge(&g("B"), &g("C"), Relation::Increases);
        let bc = betweenness_centrality(&graph);
        // B lies on the only A -> C path; 1 / ((3 - 1) * (3 - 2))
        assert_eq!(bc[&g("B")], 0.5);
        assert_eq!(bc[&g("A")], 0.0);
    }

    fn star(size: usize) -> BelGraph {
        let mut graph = BelGraph::new();
        for i in 0..size {
            let leaf = g(&format!("L{i}"));
            graph.add_edge(&leaf, &g("HUB"), BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "S"));
            graph.add_edge(&g("HUB"), &leaf, BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "S"));
        }
        graph
    }

    #[test]
    fn hub_is_found_in_large_graphs() {
        let graph = star(20);
        assert_eq!(hubs(&graph, &[g("HUB")], 0.05), 1.0);
        assert_eq!(hubs(&graph, &[g("L0")], 0.05), 0.0);
        assert_eq!(hubs(&star(5), &[g("HUB")], 0.05), 0.0);
    }

    #[test]
    fn scores_by_annotation() {
        let graph = star(20);
        let settings = NeurommsigSettings::default();
        let scores = get_neurommsig_scores(&graph, &[g("HUB")], &settings).unwrap();
        let expected = (1.0 / 21.0 + 1.0 + 0.0) / 3.0;
        assert!((scores["S"] - expected).abs() < 1e-12);
        assert!(get_neurommsig_scores(&graph, &[g("MISSING")], &settings).is_none());
    }

    #[test]
    fn zero_weights_count_as_one() {
        let graph = star(20);
        let zeroed = NeurommsigSettings {
            ora_weight: 0.0,
            hub_weight: 0.0,
            topology_weight: 0.0,
            ..NeurommsigSettings::default()
        };
        assert!(zeroed.validate().is_ok());

        let score = get_neurommsig_score(&graph, &[g("HUB")], &zeroed);
        assert!(score.is_finite());
        assert_eq!(score, get_neurommsig_score(&graph, &[g("HUB")], &NeurommsigSettings::default()));

        let scores = get_neurommsig_scores(&graph, &[g("HUB")], &zeroed).unwrap();
        let json = serde_json::to_string(&scores).unwrap();
        let back: BTreeMap<String, f64> = serde_json::from_str(&json).unwrap();
        assert!((back["S"] - scores["S"]).abs() < 1e-12);
    }

    #[test]
    fn negative_or_nan_weights_are_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let settings = NeurommsigSettings {
                hub_weight: bad,
                ..NeurommsigSettings::default()
            };
            assert!(matches!(settings.validate(), Err(BelError::InvalidArgument(_))));
        }
    }
}
