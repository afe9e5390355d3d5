//! CausalR: causal network analysis and regulator hypothesis ranking.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use log::warn;
use serde::{Deserialize, Serialize};

use super::rcr::discretize;
use super::stability::pair_has_contradiction;
use crate::filters::get_causal_regulators;
use crate::graph::{BelEdge, BelGraph, BelNode};

/// Predicted effect of a root node on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Inhibition,
    NoEffect,
    Activation,
    Ambiguous,
}

impl Effect {
    /// `-1`, `0`, `1`, or `None` when ambiguous.
    pub fn value(&self) -> Option<i8> {
        match self {
            Effect::Inhibition => Some(-1),
            Effect::NoEffect => Some(0),
            Effect::Activation => Some(1),
            Effect::Ambiguous => None,
        }
    }
}

/// Highest ranked of several parallel edges; the first one wins ties.
pub fn rank_edges<'a>(edges: &[&'a BelEdge]) -> Option<&'a BelEdge> {
    let mut best: Option<&BelEdge> = None;
    for &edge in edges {
        if best.is_none_or(|b| edge.relation.rank() > b.relation.rank()) {
            best = Some(edge);
        }
    }
    best
}

/// Effect of following a path, hop by hop; an unresolvable hop decides the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum PathState {
    Sign(i8),
    Stopped(Effect),
}

impl PathState {
    fn into_effect(self) -> Effect {
        match self {
            PathState::Sign(1) => Effect::Activation,
            PathState::Sign(_) => Effect::Inhibition,
            PathState::Stopped(effect) => effect,
        }
    }
}

fn hop_state(graph: &BelGraph, u: &BelNode, v: &BelNode) -> PathState {
    if pair_has_contradiction(graph, u, v) {
        return PathState::Stopped(Effect::Ambiguous);
    }
    match rank_edges(&graph.edges_between(u, v)).map(|e| e.relation.causal_effect()) {
        Some(sign) if sign != 0 => PathState::Sign(sign),
        _ => PathState::Stopped(Effect::NoEffect),
    }
}

fn extend(state: PathState, hop: PathState) -> PathState {
    match (state, hop) {
        (PathState::Stopped(_), _) => state,
        (PathState::Sign(_), PathState::Stopped(_)) => hop,
        (PathState::Sign(a), PathState::Sign(b)) => PathState::Sign(a * b),
    }
}

/// Effect of the first node of `path` on its last node.
pub fn get_path_effect(graph: &BelGraph, path: &[BelNode]) -> Effect {
    path.windows(2)
        .fold(PathState::Sign(1), |state, pair| {
            extend(state, hop_state(graph, &pair[0], &pair[1]))
        })
        .into_effect()
}

/// Effects over every shortest path from `root`, per reachable node.
///
/// Shortest paths form a DAG layered by BFS distance, so path effects are
/// propagated layer by layer instead of enumerating paths.
fn shortest_path_effects(graph: &BelGraph, root: &BelNode) -> HashMap<BelNode, BTreeSet<Effect>> {
    let mut dist: HashMap<&BelNode, usize> = HashMap::new();
    let mut order: Vec<&BelNode> = Vec::new();
    let mut queue = VecDeque::new();

    if graph.has_node(root) {
        dist.insert(root, 0);
        queue.push_back(root);
    }
    while let Some(u) = queue.pop_front() {
        order.push(u);
        let d = dist[u];
        for v in graph.successors(u) {
            if !dist.contains_key(v) {
                dist.insert(v, d + 1);
                queue.push_back(v);
            }
        }
    }

    let mut states: HashMap<&BelNode, BTreeSet<PathState>> = HashMap::new();
    states.insert(root, [PathState::Sign(1)].into_iter().collect());
    for u in order {
        let Some(current) = states.get(u).cloned() else {
            continue;
        };
        let d = dist[u];
        for v in graph.successors(u) {
            if dist.get(v) != Some(&(d + 1)) {
                continue;
            }
            let hop = hop_state(graph, u, v);
            let next = states.entry(v).or_default();
            for state in &current {
                next.insert(extend(*state, hop));
            }
        }
    }

    states
        .into_iter()
        .filter(|(node, _)| *node != root)
        .map(|(node, set)| (node.clone(), set.into_iter().map(PathState::into_effect).collect()))
        .collect()
}

/// Effect of `root` on each target, over all shortest paths. Targets that
/// cannot be reached are logged and left out.
pub fn run_cna(graph: &BelGraph, root: &BelNode, targets: &[BelNode]) -> Vec<(BelNode, BelNode, Effect)> {
    let effects = shortest_path_effects(graph, root);
    let mut results = Vec::new();

    for target in targets {
        let Some(found) = effects.get(target) else {
            warn!("no shortest path between {root} and {target}");
            continue;
        };
        let activation = found.contains(&Effect::Activation);
        let inhibition = found.contains(&Effect::Inhibition);
        let effect = if found.len() == 1 {
            found.iter().next().copied()
        } else if activation && inhibition {
            Some(Effect::Ambiguous)
        } else if activation {
            Some(Effect::Activation)
        } else if inhibition {
            Some(Effect::Inhibition)
        } else {
            None
        };
        match effect {
            Some(effect) => results.push((root.clone(), target.clone(), effect)),
            None => warn!("unresolved path effects {found:?} from {root} to {target}"),
        }
    }
    results
}

/// Discretized regulation of every node carrying a `key` value.
pub fn get_observations(graph: &BelGraph, key: &str, cutoff: f64) -> BTreeMap<BelNode, i8> {
    graph
        .nodes()
        .filter_map(|node| {
            graph
                .node_value(node, key)
                .map(|value| (node.clone(), discretize(value, cutoff)))
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub correct: usize,
    pub incorrect: usize,
    pub ambiguous: usize,
    pub score: i64,
}

impl Hypothesis {
    fn finish(mut self) -> Self {
        self.score = self.correct as i64 - self.incorrect as i64;
        self
    }
}

/// Evaluate the up- and down-regulation hypotheses of `regulator` against
/// observed regulations (`1`, `-1` or `0` per node).
pub fn rank_causalr_hypothesis(
    graph: &BelGraph,
    observations: &BTreeMap<BelNode, i8>,
    regulator: &BelNode,
) -> (Hypothesis, Hypothesis) {
    let mut up = Hypothesis::default();
    let mut down = Hypothesis::default();

    let targets: Vec<BelNode> = observations
        .keys()
        .filter(|n| *n != regulator)
        .cloned()
        .collect();

    for (_, target, predicted) in run_cna(graph, regulator, &targets) {
        match predicted {
            Effect::Activation | Effect::Inhibition if predicted.value() == Some(observations[&target]) => {
                up.correct += 1;
                down.incorrect += 1;
            }
            Effect::Ambiguous => {
                up.ambiguous += 1;
                down.ambiguous += 1;
            }
            Effect::NoEffect => {}
            _ => {
                down.correct += 1;
                up.incorrect += 1;
            }
        }
    }

    (up.finish(), down.finish())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRegulator {
    pub regulator: String,
    pub up: Hypothesis,
    pub down: Hypothesis,
}

impl RankedRegulator {
    pub fn best_score(&self) -> i64 {
        self.up.score.max(self.down.score)
    }
}

/// Rank every node with an outgoing causal edge as a regulator, best first.
pub fn rank_all_hypotheses(graph: &BelGraph, observations: &BTreeMap<BelNode, i8>) -> Vec<RankedRegulator> {
    let mut ranked: Vec<RankedRegulator> = get_causal_regulators(graph)
        .iter()
        .map(|regulator| {
            let (up, down) = rank_causalr_hypothesis(graph, observations, regulator);
            RankedRegulator {
                regulator: regulator.to_string(),
                up,
                down,
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.best_score()
            .cmp(&a.best_score())
            .then_with(|| a.regulator.cmp(&b.regulator))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Relation;

    fn p(name: &str) -> BelNode {
        BelNode::protein("HGNC", name)
    }

    #[test]
    fn rank_edges_prefers_direct() {
        let a = BelEdge::unqualified(Relation::Association);
        let b = BelEdge::unqualified(Relation::DirectlyDecreases);
        let c = BelEdge::unqualified(Relation::Increases);
        assert_eq!(rank_edges(&[&a, &b, &c]).unwrap().relation, Relation::DirectlyDecreases);
        assert!(rank_edges(&[]).is_none());
    }

    #[test]
    fn path_effect_stops_at_first_unresolved_hop() {
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("A"), &p("B"), Relation::Association);
        g.add_unqualified_edge(&p("B"), &p("C"), Relation::Increases);
        g.add_unqualified_edge(&p("B"), &p("C"), Relation::Decreases);
        assert_eq!(get_path_effect(&g, &[p("A"), p("B"), p("C")]), Effect::NoEffect);
        assert_eq!(get_path_effect(&g, &[p("B"), p("C")]), Effect::Ambiguous);
    }

    #[test]
    fn competing_shortest_paths_are_ambiguous() {
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("R"), &p("X"), Relation::Increases);
        g.add_unqualified_edge(&p("R"), &p("Y"), Relation::Increases);
        g.add_unqualified_edge(&p("X"), &p("T"), Relation::Increases);
        g.add_unqualified_edge(&p("Y"), &p("T"), Relation::Decreases);
        let results = run_cna(&g, &p("R"), &[p("T")]);
        assert_eq!(results[0].2, Effect::Ambiguous);
    }

    #[test]
    fn unreachable_target_is_skipped() {
        let mut g = BelGraph::new();
        g.add_unqualified_edge(&p("A"), &p("B"), Relation::Increases);
        assert!(run_cna(&g, &p("B"), &[p("A")]).is_empty());
    }
}
