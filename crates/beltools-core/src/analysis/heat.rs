//! Heat diffusion over candidate mechanisms.
//!
//! Experimental values on the sources of a mechanism are propagated
//! downstream along causal edges until the target is reached. Cycles are
//! broken by dropping random in-edges, so each mechanism is scored many
//! times and the distribution of target scores is summarized.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::stats::{mean, median, normality_test, std_dev};
use crate::error::{BelError, Result};
use crate::generation::{generate_bioprocess_mechanisms, generate_mechanism};
use crate::graph::{BelGraph, BelNode, Function};
use crate::selection::get_subgraphs_by_annotation;

pub const DEFAULT_TAG: &str = "score";
pub const DEFAULT_RUNS: usize = 100;

/// Knobs shared by every heat diffusion entry point.
#[derive(Debug, Clone)]
pub struct HeatSettings {
    /// Node data key holding the experimental values.
    pub key: String,
    /// Node data key the scores are written to.
    pub tag: String,
    pub default_score: f64,
    pub runs: usize,
    pub seed: u64,
    /// Mechanisms with this many nodes or fewer are not scored.
    pub minimum_nodes: usize,
}

impl Default for HeatSettings {
    fn default() -> Self {
        Self {
            key: "weight".to_string(),
            tag: DEFAULT_TAG.to_string(),
            default_score: 0.0,
            runs: DEFAULT_RUNS,
            seed: 0,
            minimum_nodes: 1,
        }
    }
}

/// Summary of the target scores over all runs on one mechanism.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeatResult {
    pub avg: Option<f64>,
    pub stddev: Option<f64>,
    pub normality: Option<f64>,
    pub median: Option<f64>,
    pub neighbors: usize,
    pub subgraph_size: usize,
}

/// One heat diffusion run on a private copy of a mechanism.
#[derive(Debug, Clone)]
pub struct Runner {
    graph: BelGraph,
    target: BelNode,
    tag: String,
    default_score: f64,
}

impl Runner {
    pub fn new(graph: &BelGraph, target: &BelNode, settings: &HeatSettings) -> Self {
        let mut graph = graph.clone();
        let nodes: Vec<BelNode> = graph.nodes().cloned().collect();
        for node in &nodes {
            graph.clear_node_value(node, &settings.tag);
        }
        for node in &nodes {
            if graph.in_degree(node) == 0 {
                let start = graph.node_value(node, &settings.key).unwrap_or(0.0);
                graph.set_node_value(node, &settings.tag, start);
            }
        }

        Self {
            graph,
            target: target.clone(),
            tag: settings.tag.clone(),
            default_score: settings.default_score,
        }
    }

    fn is_scored(&self, node: &BelNode) -> bool {
        self.graph.node_value(node, &self.tag).is_some()
    }

    /// Unscored nodes whose predecessors are all scored.
    pub fn leaves(&self) -> Vec<BelNode> {
        self.graph
            .nodes()
            .filter(|n| !self.is_scored(n))
            .filter(|n| self.graph.predecessors(n).iter().all(|p| self.is_scored(p)))
            .cloned()
            .collect()
    }

    pub fn unscored_nodes(&self) -> Vec<BelNode> {
        self.graph
            .nodes()
            .filter(|n| !self.is_scored(n))
            .cloned()
            .collect()
    }

    pub fn in_out_ratio(&self, node: &BelNode) -> f64 {
        let out = self.graph.out_degree(node);
        if out == 0 {
            f64::INFINITY
        } else {
            self.graph.in_degree(node) as f64 / out as f64
        }
    }

    /// Drop a random in-edge of the unscored, non-target node with the lowest in/out ratio.
    fn remove_random_edge<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let mut best: Option<(BelNode, f64)> = None;
        for node in self.unscored_nodes() {
            if node == self.target {
                continue;
            }
            let ratio = self.in_out_ratio(&node);
            if best.as_ref().is_none_or(|(_, r)| ratio < *r) {
                best = Some((node, ratio));
            }
        }

        let (node, ratio) = best.ok_or_else(|| BelError::NoProgress(self.target.to_string()))?;
        let candidates = self.graph.in_edge_ids(&node);
        if candidates.is_empty() {
            return Err(BelError::NoProgress(self.target.to_string()));
        }
        let chosen = candidates[rng.gen_range(0..candidates.len())];
        trace!("removing in-edge of {node} (in/out ratio {ratio:.3})");
        self.graph.remove_edge(chosen);
        Ok(())
    }

    fn calculate_score(&self, node: &BelNode) -> f64 {
        let mut score = self
            .graph
            .node_value(node, &self.tag)
            .unwrap_or(self.default_score);
        for (pred, edge) in self.graph.in_edges(node) {
            let pred_score = self.graph.node_value(pred, &self.tag).unwrap_or(0.0);
            if edge.relation.is_causal_increase() {
                score += pred_score;
            } else if edge.relation.is_causal_decrease() {
                score -= pred_score;
            }
        }
        score
    }

    fn score_leaves(&mut self, leaves: &[BelNode]) {
        let scores: Vec<(BelNode, f64)> = leaves
            .iter()
            .map(|leaf| (leaf.clone(), self.calculate_score(leaf)))
            .collect();
        for (leaf, score) in scores {
            self.graph.set_node_value(&leaf, &self.tag, score);
        }
    }

    /// Score leaves, removing random edges whenever none are left, until the target is scored.
    pub fn run<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        if !self.graph.has_node(&self.target) {
            return Err(BelError::NodeNotFound(self.target.to_string()));
        }
        while !self.done_chomping() {
            let mut leaves = self.leaves();
            while leaves.is_empty() {
                self.remove_random_edge(rng)?;
                leaves = self.leaves();
            }
            self.score_leaves(&leaves);
        }
        Ok(())
    }

    pub fn done_chomping(&self) -> bool {
        self.is_scored(&self.target)
    }

    pub fn get_final_score(&self) -> Result<f64> {
        self.graph
            .node_value(&self.target, &self.tag)
            .ok_or_else(|| BelError::NoProgress(self.target.to_string()))
    }

    /// The part of the mechanism that has not been scored yet.
    pub fn remaining_graph(&self) -> BelGraph {
        let unscored = self.unscored_nodes();
        self.graph.subgraph(unscored.iter())
    }
}

/// Run `settings.runs` independent runners; each gets its own RNG stream.
/// Runs that cannot finish are logged and skipped.
pub fn multirun(graph: &BelGraph, node: &BelNode, settings: &HeatSettings) -> Vec<Runner> {
    (0..settings.runs)
        .filter_map(|i| {
            let mut rng = StdRng::seed_from_u64(settings.seed.wrapping_add(i as u64));
            let mut runner = Runner::new(graph, node, settings);
            match runner.run(&mut rng) {
                Ok(()) => Some(runner),
                Err(err) => {
                    debug!("run {i} failed for {node}: {err}");
                    None
                }
            }
        })
        .collect()
}

/// Generate the mechanism of `node` and run heat diffusion on it.
pub fn workflow(graph: &BelGraph, node: &BelNode, settings: &HeatSettings) -> Vec<Runner> {
    let mechanism = generate_mechanism(graph, node, Some(&settings.key));
    if mechanism.node_count() <= settings.minimum_nodes {
        return Vec::new();
    }
    multirun(&mechanism, node, settings)
}

pub type Aggregator = dyn Fn(&[f64]) -> f64 + Sync;

fn final_scores(runners: &[Runner]) -> Vec<f64> {
    runners.iter().filter_map(|r| r.get_final_score().ok()).collect()
}

/// Aggregate the final scores of [`workflow`], with the mean unless another aggregator is given.
pub fn workflow_aggregate(
    graph: &BelGraph,
    node: &BelNode,
    settings: &HeatSettings,
    aggregator: Option<&Aggregator>,
) -> Option<f64> {
    let scores = final_scores(&workflow(graph, node, settings));
    if scores.is_empty() {
        warn!("unable to run the heat diffusion workflow for {node}");
        return None;
    }
    match aggregator {
        Some(aggregate) => Some(aggregate(&scores)),
        None => mean(&scores),
    }
}

/// Runners for every biological process.
pub fn workflow_all(graph: &BelGraph, settings: &HeatSettings) -> BTreeMap<BelNode, Vec<Runner>> {
    graph
        .nodes_by_function(Function::BiologicalProcess)
        .into_iter()
        .map(|bp| {
            let runners = workflow(graph, &bp, settings);
            (bp, runners)
        })
        .collect()
}

/// Aggregated score for every biological process that could be scored.
pub fn workflow_all_aggregate(
    graph: &BelGraph,
    settings: &HeatSettings,
    aggregator: Option<&Aggregator>,
) -> BTreeMap<BelNode, f64> {
    graph
        .nodes_by_function(Function::BiologicalProcess)
        .into_par_iter()
        .filter_map(|bp| {
            let mechanism = generate_mechanism(graph, &bp, Some(&settings.key));
            workflow_aggregate(&mechanism, &bp, settings, aggregator).map(|score| (bp, score))
        })
        .collect()
}

fn summarize_mechanism(node: &BelNode, mechanism: &BelGraph, settings: &HeatSettings) -> HeatResult {
    let scores = final_scores(&workflow(mechanism, node, settings));
    HeatResult {
        avg: mean(&scores),
        stddev: std_dev(&scores),
        normality: normality_test(&scores),
        median: median(&scores),
        neighbors: mechanism.in_degree(node),
        subgraph_size: mechanism.node_count(),
    }
}

/// Score precomputed candidate mechanisms in parallel.
pub fn calculate_average_scores_on_subgraphs(
    subgraphs: &BTreeMap<BelNode, BelGraph>,
    settings: &HeatSettings,
) -> BTreeMap<BelNode, HeatResult> {
    info!(
        "calculating results for {} candidate mechanisms using {} permutations",
        subgraphs.len(),
        settings.runs
    );
    subgraphs
        .par_iter()
        .map(|(node, mechanism)| (node.clone(), summarize_mechanism(node, mechanism, settings)))
        .collect()
}

pub fn calculate_average_scores_on_graph(
    graph: &BelGraph,
    settings: &HeatSettings,
) -> BTreeMap<BelNode, HeatResult> {
    let mechanisms = generate_bioprocess_mechanisms(graph, Some(&settings.key));
    calculate_average_scores_on_subgraphs(&mechanisms, settings)
}

/// Mean of the biological process averages inside each value of `annotation`.
pub fn calculate_average_score_by_annotation(
    graph: &BelGraph,
    annotation: &str,
    settings: &HeatSettings,
) -> BTreeMap<String, f64> {
    let scores = calculate_average_scores_on_graph(graph, settings);
    let averages: HashMap<&BelNode, f64> = scores
        .iter()
        .filter_map(|(bp, result)| result.avg.map(|avg| (bp, avg)))
        .collect();

    get_subgraphs_by_annotation(graph, annotation)
        .into_iter()
        .filter_map(|(value, subgraph)| {
            let values: Vec<f64> = subgraph
                .nodes_by_function(Function::BiologicalProcess)
                .iter()
                .filter_map(|bp| averages.get(bp).copied())
                .collect();
            mean(&values).map(|avg| (value, avg))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BelEdge, Relation};

    fn p(name: &str) -> BelNode {
        BelNode::protein("HGNC", name)
    }

    fn diamond() -> (BelGraph, BelNode) {
        let d = BelNode::bioprocess("GO", "D");
        let mut g = BelGraph::new();
        g.add_edge(&p("A"), &p("B"), BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "S"));
        g.add_edge(&p("B"), &d, BelEdge::unqualified(Relation::Decreases).with_annotation("Subgraph", "S"));
        g.add_edge(&p("A"), &p("C"), BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "S"));
        g.add_edge(&p("C"), &d, BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "S"));
        g.set_node_value(&p("A"), "weight", 2.0);
        g.set_node_value(&p("B"), "weight", -1.0);
        g.set_node_value(&p("C"), "weight", 1.0);
        (g, d)
    }

    #[test]
    fn runner_on_acyclic_mechanism() {
        let (g, d) = diamond();
        let mut runner = Runner::new(&g, &d, &HeatSettings::default());
        runner.run(&mut StdRng::seed_from_u64(1)).unwrap();
        // B and C each take A's 2.0, D = -B + C
        assert_eq!(runner.get_final_score().unwrap(), 0.0);
        assert_eq!(runner.remaining_graph().node_count(), 0);
    }

    #[test]
    fn runner_breaks_cycles() {
        let target = p("D");
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("A"), &p("B"), Relation::Increases);
        g.add_unqualified_edge(&p("B"), &p("C"), Relation::Increases);
        g.add_unqualified_edge(&p("C"), &p("B"), Relation::Increases);
        g.add_unqualified_edge(&p("C"), &target, Relation::Increases);
        g.set_node_value(&p("A"), "weight", 1.0);

        let mut runner = Runner::new(&g, &target, &HeatSettings::default());
        runner.run(&mut StdRng::seed_from_u64(7)).unwrap();
        // C has the lowest in/out ratio, so B -> C is dropped and C scores 0
        assert_eq!(runner.get_final_score().unwrap(), 0.0);
    }

    #[test]
    fn target_self_loop_cannot_progress() {
        let target = p("T");
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("A"), &target, Relation::Increases);
        g.add_unqualified_edge(&target, &target, Relation::Increases);
        let runners = multirun(&g, &target, &HeatSettings { runs: 3, ..HeatSettings::default() });
        assert!(runners.is_empty());
    }

    #[test]
    fn small_mechanism_has_no_runs() {
        let mut g = BelGraph::new();
        g.add_node(&p("A"));
        assert!(workflow(&g, &p("A"), &HeatSettings::default()).is_empty());
    }

    #[test]
    fn scores_on_graph() {
        let (g, d) = diamond();
        let settings = HeatSettings { runs: 10, ..HeatSettings::default() };
        let results = calculate_average_scores_on_graph(&g, &settings);
        let result = &results[&d];
        assert_eq!(result.avg, Some(0.0));
        assert_eq!(result.stddev, Some(0.0));
        assert_eq!(result.normality, None);
        assert_eq!(result.neighbors, 2);
        assert_eq!(result.subgraph_size, 4);

        let by_annotation = calculate_average_score_by_annotation(&g, "Subgraph", &settings);
        assert_eq!(by_annotation["S"], 0.0);
    }

    #[test]
    fn custom_aggregator() {
        let (g, d) = diamond();
        let settings = HeatSettings { runs: 5, ..HeatSettings::default() };
        let count: &Aggregator = &|scores: &[f64]| scores.len() as f64;
        assert_eq!(workflow_aggregate(&g, &d, &settings, Some(count)), Some(5.0));
        assert_eq!(workflow_all_aggregate(&g, &settings, None)[&d], 0.0);
    }
}
