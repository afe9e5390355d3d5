//! Sampling of spanning trees.
//!
//! Uniform spanning trees are drawn with the Broder/Aldous random walk over
//! the undirected view of the graph. Each tree fixes a single path from the
//! root to every other node, so the sign it predicts for an observed node is
//! the product of the edge signs along that path.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::stats::{mean, std_dev};
use crate::error::{BelError, Result};
use crate::graph::{BelGraph, BelNode, Relation};

/// Edge of a sampled tree, in the direction of the BEL edge it was drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEdge {
    pub source: BelNode,
    pub target: BelNode,
    pub relation: Relation,
}

/// Incident edges of every node, ignoring direction. Self loops are dropped.
fn undirected_incidence(graph: &BelGraph) -> HashMap<&BelNode, Vec<(&BelNode, &BelNode, Relation)>> {
    let mut incidence: HashMap<&BelNode, Vec<(&BelNode, &BelNode, Relation)>> = HashMap::new();
    for node in graph.nodes() {
        incidence.entry(node).or_default();
    }
    for (u, v, edge) in graph.edges() {
        if u == v {
            continue;
        }
        incidence.entry(u).or_default().push((u, v, edge.relation));
        incidence.entry(v).or_default().push((u, v, edge.relation));
    }
    incidence
}

fn component_size(incidence: &HashMap<&BelNode, Vec<(&BelNode, &BelNode, Relation)>>, start: &BelNode) -> usize {
    let mut seen: HashSet<&BelNode> = HashSet::new();
    let mut queue = VecDeque::new();
    if let Some((node, _)) = incidence.get_key_value(start) {
        seen.insert(*node);
        queue.push_back(*node);
    }
    while let Some(u) = queue.pop_front() {
        for (a, b, _) in &incidence[u] {
            let other = if *a == u { *b } else { *a };
            if seen.insert(other) {
                queue.push_back(other);
            }
        }
    }
    seen.len()
}

/// Spanning tree of the component containing `start`.
///
/// The walk moves along a uniformly chosen incident edge at every step and
/// keeps the edge that first enters each node.
pub fn random_walk_spanning_tree_from<R: Rng>(graph: &BelGraph, start: &BelNode, rng: &mut R) -> Result<Vec<TreeEdge>> {
    let incidence = undirected_incidence(graph);
    let Some((&start, _)) = incidence.get_key_value(start) else {
        return Err(BelError::NodeNotFound(start.to_string()));
    };

    let size = component_size(&incidence, start);
    let mut visited: HashSet<&BelNode> = HashSet::from([start]);
    let mut tree = Vec::with_capacity(size.saturating_sub(1));
    let mut current = start;

    while visited.len() < size {
        let Some(&(u, v, relation)) = incidence[current].choose(rng) else {
            break;
        };
        let next = if u == current { v } else { u };
        if visited.insert(next) {
            tree.push(TreeEdge {
                source: u.clone(),
                target: v.clone(),
                relation,
            });
        }
        current = next;
    }
    Ok(tree)
}

/// Spanning tree of the component of a randomly chosen node. Empty for an empty graph.
pub fn random_walk_spanning_tree<R: Rng>(graph: &BelGraph, rng: &mut R) -> Vec<TreeEdge> {
    let nodes: Vec<&BelNode> = graph.nodes().collect();
    match nodes.choose(rng) {
        Some(start) => random_walk_spanning_tree_from(graph, start, rng).unwrap_or_default(),
        None => Vec::new(),
    }
}

fn edge_sign(relation: Relation) -> Option<i8> {
    if relation.is_up() {
        Some(1)
    } else if relation.is_down() {
        Some(-1)
    } else {
        None
    }
}

/// Sign of every node reachable from `root` in `tree`. `None` marks nodes
/// behind a non-polar edge.
pub fn tree_signs(tree: &[TreeEdge], root: &BelNode) -> HashMap<BelNode, Option<i8>> {
    let mut adjacency: HashMap<&BelNode, Vec<(&BelNode, Option<i8>)>> = HashMap::new();
    for edge in tree {
        let sign = edge_sign(edge.relation);
        adjacency.entry(&edge.source).or_default().push((&edge.target, sign));
        adjacency.entry(&edge.target).or_default().push((&edge.source, sign));
    }

    let mut signs: HashMap<BelNode, Option<i8>> = HashMap::from([(root.clone(), Some(1))]);
    let mut queue = VecDeque::from([root]);
    while let Some(u) = queue.pop_front() {
        let here = signs[u];
        for (v, sign) in adjacency.get(u).into_iter().flatten() {
            if signs.contains_key(*v) {
                continue;
            }
            let combined = here.zip(*sign).map(|(a, b)| a * b);
            signs.insert((*v).clone(), combined);
            queue.push_back(*v);
        }
    }
    signs
}

/// Concordance of one tree with the observations, `(concordant - discordant) / predicted`.
pub fn score_tree(tree: &[TreeEdge], root: &BelNode, observations: &BTreeMap<BelNode, i8>) -> Option<f64> {
    let signs = tree_signs(tree, root);
    let (mut concordant, mut discordant) = (0usize, 0usize);
    for (node, observed) in observations {
        if node == root || *observed == 0 {
            continue;
        }
        match signs.get(node) {
            Some(Some(predicted)) if predicted == observed => concordant += 1,
            Some(Some(_)) => discordant += 1,
            _ => {}
        }
    }
    let predicted = concordant + discordant;
    (predicted > 0).then(|| (concordant as f64 - discordant as f64) / predicted as f64)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SstResult {
    pub root: String,
    pub samples: usize,
    /// Trees that predicted at least one observation.
    pub scored: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub positive_fraction: Option<f64>,
}

/// Score `samples` random spanning trees rooted at `root`. Tree `i` is drawn
/// from an RNG seeded with `seed + i`.
pub fn sample_spanning_trees(
    graph: &BelGraph,
    root: &BelNode,
    observations: &BTreeMap<BelNode, i8>,
    samples: usize,
    seed: u64,
) -> Result<SstResult> {
    if !graph.has_node(root) {
        return Err(BelError::NodeNotFound(root.to_string()));
    }

    let mut scores = Vec::with_capacity(samples);
    for i in 0..samples {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
        let tree = random_walk_spanning_tree_from(graph, root, &mut rng)?;
        match score_tree(&tree, root, observations) {
            Some(score) => scores.push(score),
            None => debug!("tree {i} from {root} predicts no observation"),
        }
    }

    let positive_fraction =
        (!scores.is_empty()).then(|| scores.iter().filter(|s| **s > 0.0).count() as f64 / scores.len() as f64);

    Ok(SstResult {
        root: root.to_string(),
        samples,
        scored: scores.len(),
        mean: mean(&scores),
        std: std_dev(&scores),
        positive_fraction,
    })
}
