//! Agreement between edge polarity and differential expression.

use std::collections::BTreeMap;

use log::warn;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use super::rcr::discretize;
use crate::error::{BelError, Result};
use crate::graph::{BelEdge, BelGraph, BelNode, Relation};
use crate::mutation::{collapse_all_variants, collapse_to_genes};
use crate::selection::get_subgraphs_by_annotation;

pub const DEFAULT_PERMUTATIONS: usize = 500;
pub const DEFAULT_PERCENTAGE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Concordance {
    Correct,
    Incorrect,
    Ambiguous,
    Unassigned,
}

#[derive(Debug, Clone)]
pub struct ConcordanceSettings {
    pub key: String,
    pub cutoff: f64,
    pub permutations: usize,
    /// Share of all node pairs swapped per permutation.
    pub percentage: f64,
    /// Count ambiguous edges in the denominator.
    pub use_ambiguous: bool,
    pub seed: u64,
}

impl Default for ConcordanceSettings {
    fn default() -> Self {
        Self {
            key: "weight".to_string(),
            cutoff: 0.0,
            permutations: DEFAULT_PERMUTATIONS,
            percentage: DEFAULT_PERCENTAGE,
            use_ambiguous: false,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConcordanceCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub ambiguous: usize,
    pub unassigned: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConcordanceProbability {
    pub score: f64,
    pub distribution: Vec<f64>,
    /// Share of permuted scores strictly above `score`.
    pub p_value: f64,
}

/// Classify one edge against the regulation of its endpoints.
pub fn edge_concords(
    graph: &BelGraph,
    u: &BelNode,
    v: &BelNode,
    edge: &BelEdge,
    key: &str,
    cutoff: f64,
) -> Concordance {
    let (Some(source), Some(target)) = (graph.node_value(u, key), graph.node_value(v, key)) else {
        return Concordance::Unassigned;
    };

    let relation = edge.relation;
    let no_change = relation == Relation::CausesNoChange;
    if !(relation.is_up() || relation.is_down() || no_change) {
        return Concordance::Unassigned;
    }

    let source = discretize(source, cutoff);
    let target = discretize(target, cutoff);

    if source == 0 {
        return if target == 0 && no_change {
            Concordance::Correct
        } else {
            Concordance::Ambiguous
        };
    }

    match target {
        0 if no_change => Concordance::Correct,
        0 => Concordance::Incorrect,
        _ if no_change => Concordance::Incorrect,
        _ => {
            let expected = if relation.is_up() { source } else { -source };
            if expected == target {
                Concordance::Correct
            } else {
                Concordance::Incorrect
            }
        }
    }
}

pub fn count_concordance(graph: &BelGraph, key: &str, cutoff: f64) -> ConcordanceCounts {
    let mut counts = ConcordanceCounts::default();
    for (u, v, edge) in graph.edges() {
        match edge_concords(graph, u, v, edge, key, cutoff) {
            Concordance::Correct => counts.correct += 1,
            Concordance::Incorrect => counts.incorrect += 1,
            Concordance::Ambiguous => counts.ambiguous += 1,
            Concordance::Unassigned => counts.unassigned += 1,
        }
    }
    counts
}

/// `correct / (correct + incorrect [+ ambiguous])`, or `-1.0` when nothing was assigned.
pub fn calculate_concordance(graph: &BelGraph, key: &str, cutoff: f64, use_ambiguous: bool) -> f64 {
    let counts = count_concordance(graph, key, cutoff);
    let denominator = counts.correct + counts.incorrect + if use_ambiguous { counts.ambiguous } else { 0 };
    if denominator == 0 {
        return -1.0;
    }
    counts.correct as f64 / denominator as f64
}

/// Copy of `graph` with the `key` values of random node pairs swapped
/// `percentage * n(n - 1) / 2` times. Missing values move like any other.
pub fn shuffle_node_data<R: Rng>(graph: &BelGraph, key: &str, percentage: f64, rng: &mut R) -> Result<BelGraph> {
    if !(percentage > 0.0 && percentage <= 1.0) {
        return Err(BelError::InvalidArgument(format!(
            "swap percentage must be in (0, 1], got {percentage}"
        )));
    }

    let mut result = graph.clone();
    let nodes: Vec<BelNode> = graph.nodes().cloned().collect();
    let n = nodes.len();
    if n < 2 {
        return Ok(result);
    }

    let swaps = (percentage * (n * (n - 1)) as f64 / 2.0) as usize;
    for _ in 0..swaps {
        let picked = sample(rng, n, 2);
        let (s, t) = (&nodes[picked.index(0)], &nodes[picked.index(1)]);
        let (a, b) = (result.node_value(s, key), result.node_value(t, key));
        match b {
            Some(value) => {
                result.set_node_value(s, key, value);
            }
            None => result.clear_node_value(s, key),
        }
        match a {
            Some(value) => {
                result.set_node_value(t, key, value);
            }
            None => result.clear_node_value(t, key),
        }
    }
    Ok(result)
}

/// Share of `distribution` strictly greater than `value`.
pub fn one_sided(value: f64, distribution: &[f64]) -> Option<f64> {
    if distribution.is_empty() {
        return None;
    }
    Some(distribution.iter().filter(|x| value < **x).count() as f64 / distribution.len() as f64)
}

/// Concordance of the gene-collapsed graph, compared against node-data
/// permutations. Permutation `i` uses an RNG seeded with `seed + i`.
pub fn calculate_concordance_probability(
    graph: &BelGraph,
    settings: &ConcordanceSettings,
) -> Result<ConcordanceProbability> {
    let mut collapsed = graph.clone();
    collapse_to_genes(&mut collapsed);
    collapse_all_variants(&mut collapsed);

    let score = calculate_concordance(&collapsed, &settings.key, settings.cutoff, settings.use_ambiguous);

    let distribution = (0..settings.permutations)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(settings.seed.wrapping_add(i as u64));
            let permuted = shuffle_node_data(&collapsed, &settings.key, settings.percentage, &mut rng)?;
            Ok(calculate_concordance(&permuted, &settings.key, settings.cutoff, settings.use_ambiguous))
        })
        .collect::<Result<Vec<f64>>>()?;

    let p_value = one_sided(score, &distribution)
        .ok_or_else(|| BelError::InvalidArgument("at least one permutation is required".to_string()))?;

    Ok(ConcordanceProbability {
        score,
        distribution,
        p_value,
    })
}

pub fn calculate_concordance_by_annotation(
    graph: &BelGraph,
    annotation: &str,
    key: &str,
    cutoff: f64,
) -> BTreeMap<String, f64> {
    get_subgraphs_by_annotation(graph, annotation)
        .into_iter()
        .map(|(value, subgraph)| {
            let score = calculate_concordance(&subgraph, key, cutoff, false);
            (value, score)
        })
        .collect()
}

/// [`calculate_concordance_probability`] for each value of `annotation`.
/// Subgraphs that fail are logged and left out.
pub fn calculate_concordance_probability_by_annotation(
    graph: &BelGraph,
    annotation: &str,
    settings: &ConcordanceSettings,
) -> BTreeMap<String, ConcordanceProbability> {
    get_subgraphs_by_annotation(graph, annotation)
        .into_iter()
        .filter_map(|(value, subgraph)| match calculate_concordance_probability(&subgraph, settings) {
            Ok(result) => Some((value, result)),
            Err(err) => {
                warn!("concordance failed for {annotation}={value}: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(name: &str) -> BelNode {
        BelNode::gene("HGNC", name)
    }

    fn example() -> BelGraph {
        let mut graph = BelGraph::new();
        graph.add_edge(&g("A"), &g("B"), BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "S1"));
        graph.add_edge(&g("A"), &g("C"), BelEdge::unqualified(Relation::Decreases).with_annotation("Subgraph", "S1"));
        graph.add_edge(&g("B"), &g("D"), BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "S2"));
        graph.add_edge(&g("C"), &g("E"), BelEdge::unqualified(Relation::Association).with_annotation("Subgraph", "S2"));
        graph.set_node_value(&g("A"), "weight", 1.5);
        graph.set_node_value(&g("B"), "weight", 2.0);
        graph.set_node_value(&g("C"), "weight", 1.0);
        graph.set_node_value(&g("D"), "weight", -0.5);
        graph
    }

    #[test]
    fn edge_classification() {
        let graph = example();
        let up = BelEdge::unqualified(Relation::Increases);
        let down = BelEdge::unqualified(Relation::NegativeCorrelation);
        let none = BelEdge::unqualified(Relation::CausesNoChange);
        assert_eq!(edge_concords(&graph, &g("A"), &g("B"), &up, "weight", 0.0), Concordance::Correct);
        assert_eq!(edge_concords(&graph, &g("A"), &g("B"), &down, "weight", 0.0), Concordance::Incorrect);
        assert_eq!(edge_concords(&graph, &g("A"), &g("B"), &none, "weight", 0.0), Concordance::Incorrect);
        assert_eq!(edge_concords(&graph, &g("A"), &g("E"), &up, "weight", 0.0), Concordance::Unassigned);
        // below the cutoff the source counts as unchanged
        assert_eq!(edge_concords(&graph, &g("C"), &g("D"), &up, "weight", 1.0), Concordance::Ambiguous);
        assert_eq!(edge_concords(&graph, &g("A"), &g("C"), &up, "weight", 1.0), Concordance::Incorrect);
    }

    #[test]
    fn network_concordance() {
        let graph = example();
        let counts = count_concordance(&graph, "weight", 0.0);
        assert_eq!(
            counts,
            ConcordanceCounts { correct: 1, incorrect: 2, ambiguous: 0, unassigned: 1 }
        );
        assert!((calculate_concordance(&graph, "weight", 0.0, false) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(calculate_concordance(&BelGraph::new(), "weight", 0.0, false), -1.0);

        let by_annotation = calculate_concordance_by_annotation(&graph, "Subgraph", "weight", 0.0);
        assert_eq!(by_annotation["S1"], 0.5);
        assert_eq!(by_annotation["S2"], 0.0);
    }

    #[test]
    fn shuffling_keeps_the_values() {
        let graph = example();
        let mut rng = StdRng::seed_from_u64(11);
        let shuffled = shuffle_node_data(&graph, "weight", 1.0, &mut rng).unwrap();
        let mut before: Vec<f64> = graph.nodes().filter_map(|n| graph.node_value(n, "weight")).collect();
        let mut after: Vec<f64> = shuffled.nodes().filter_map(|n| shuffled.node_value(n, "weight")).collect();
        before.sort_by(f64::total_cmp);
        after.sort_by(f64::total_cmp);
        assert_eq!(before, after);
        assert!(shuffle_node_data(&graph, "weight", 0.0, &mut rng).is_err());
    }

    #[test]
    fn probability_is_reproducible() {
        let graph = example();
        let settings = ConcordanceSettings { permutations: 20, seed: 5, ..ConcordanceSettings::default() };
        let first = calculate_concordance_probability(&graph, &settings).unwrap();
        let second = calculate_concordance_probability(&graph, &settings).unwrap();
        assert_eq!(first.distribution.len(), 20);
        assert_eq!(first.distribution, second.distribution);
        assert!((0.0..=1.0).contains(&first.p_value));

        let none = ConcordanceSettings { permutations: 0, ..ConcordanceSettings::default() };
        assert!(calculate_concordance_probability(&graph, &none).is_err());
    }
}
