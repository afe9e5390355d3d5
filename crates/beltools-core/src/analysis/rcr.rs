//! Reverse causal reasoning.
//!
//! Every node with enough downstream targets is a candidate upstream
//! controller. Its star of outgoing edges is checked against the observed
//! direction of change of each target.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::stats::{binomial_upper_tail, hypergeometric_upper_tail};
use crate::error::Result;
use crate::graph::{BelGraph, BelNode};

pub const MIN_DOWNSTREAM: usize = 4;

#[derive(Debug, Clone)]
pub struct RcrSettings {
    pub key: String,
    pub cutoff: f64,
    pub min_downstream: usize,
}

impl Default for RcrSettings {
    fn default() -> Self {
        Self {
            key: "weight".to_string(),
            cutoff: 0.0,
            min_downstream: MIN_DOWNSTREAM,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RcrRow {
    pub controller: String,
    pub downstream: usize,
    pub correct: usize,
    pub contra: usize,
    pub ambiguous: usize,
    pub missing: usize,
    pub concordance: f64,
    pub richness: f64,
}

/// `1` above `cutoff`, `-1` below `-cutoff`, `0` otherwise.
pub fn discretize(value: f64, cutoff: f64) -> i8 {
    if value > cutoff {
        1
    } else if value < -cutoff {
        -1
    } else {
        0
    }
}

#[derive(Default)]
struct Star {
    downstream: BTreeSet<BelNode>,
    increases: BTreeSet<BelNode>,
    decreases: BTreeSet<BelNode>,
}

fn hypotheses(graph: &BelGraph) -> BTreeMap<BelNode, Star> {
    let mut stars: BTreeMap<BelNode, Star> = BTreeMap::new();
    for (u, v, edge) in graph.edges() {
        let star = stars.entry(u.clone()).or_default();
        star.downstream.insert(v.clone());
        if edge.relation.is_causal_increase() {
            star.increases.insert(v.clone());
        } else if edge.relation.is_causal_decrease() {
            star.decreases.insert(v.clone());
        }
    }
    stars
}

/// Score every controller with at least `min_downstream` targets.
///
/// Rows are sorted by concordance p-value, then controller.
pub fn run_rcr(graph: &BelGraph, settings: &RcrSettings) -> Result<Vec<RcrRow>> {
    let stars: BTreeMap<BelNode, Star> = hypotheses(graph)
        .into_iter()
        .filter(|(_, star)| star.downstream.len() >= settings.min_downstream)
        .collect();

    let observed = |node: &BelNode| {
        graph
            .node_value(node, &settings.key)
            .map(|v| discretize(v, settings.cutoff))
    };

    let population: BTreeSet<&BelNode> = stars.values().flat_map(|s| s.downstream.iter()).collect();
    let informative = population
        .iter()
        .filter(|&&n| observed(n).is_some_and(|v| v != 0))
        .count() as u64;

    let mut rows = Vec::with_capacity(stars.len());
    for (controller, star) in &stars {
        let (mut correct, mut contra, mut ambiguous, mut missing) = (0, 0, 0, 0);
        for node in &star.downstream {
            let up = star.increases.contains(node);
            let down = star.decreases.contains(node);
            if up && down {
                ambiguous += 1;
                continue;
            }
            let expected = match (up, down) {
                (true, _) => 1,
                (_, true) => -1,
                _ => {
                    missing += 1;
                    continue;
                }
            };
            match observed(node) {
                None => missing += 1,
                Some(0) => {}
                Some(value) if value == expected => correct += 1,
                Some(_) => contra += 1,
            }
        }

        let concordance = binomial_upper_tail(correct as u64, (correct + contra) as u64, 0.5)?;
        let richness = hypergeometric_upper_tail(
            (correct + contra) as u64,
            population.len() as u64,
            informative,
            star.downstream.len() as u64,
        )?;

        rows.push(RcrRow {
            controller: controller.to_string(),
            downstream: star.downstream.len(),
            correct,
            contra,
            ambiguous,
            missing,
            concordance,
            richness,
        });
    }

    rows.sort_by(|a, b| {
        a.concordance
            .total_cmp(&b.concordance)
            .then_with(|| a.controller.cmp(&b.controller))
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Relation;

    fn p(name: &str) -> BelNode {
        BelNode::protein("HGNC", name)
    }

    #[test]
    fn discretize_with_cutoff() {
        assert_eq!(discretize(0.5, 0.2), 1);
        assert_eq!(discretize(-0.5, 0.2), -1);
        assert_eq!(discretize(0.1, 0.2), 0);
        assert_eq!(discretize(0.2, 0.2), 0);
    }

    #[test]
    fn counts_and_pvalues() {
        let mut g = BelGraph::new();
        let c = p("CTRL");
        for name in ["A", "B", "C"] {
            g.add_unqualified_edge(&c, &p(name), Relation::Increases);
        }
        g.add_unqualified_edge(&c, &p("D"), Relation::Decreases);
        g.add_unqualified_edge(&c, &p("E"), Relation::Increases);
        g.add_unqualified_edge(&c, &p("E"), Relation::Decreases);
        g.add_unqualified_edge(&c, &p("F"), Relation::Association);
        // a controller with too few targets is ignored
        g.add_unqualified_edge(&p("SMALL"), &p("A"), Relation::Increases);

        g.set_node_value(&p("A"), "weight", 2.0);
        g.set_node_value(&p("B"), "weight", 1.0);
        g.set_node_value(&p("C"), "weight", -1.0);
        g.set_node_value(&p("D"), "weight", -3.0);

        let rows = run_rcr(&g, &RcrSettings::default()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.controller, "p(HGNC:CTRL)");
        assert_eq!(row.downstream, 6);
        assert_eq!((row.correct, row.contra, row.ambiguous, row.missing), (3, 1, 1, 1));
        // P(X >= 3) for Bin(4, 0.5) = 5/16
        assert!((row.concordance - 5.0 / 16.0).abs() < 1e-9);
        // every informative node is drawn: the upper tail is 1
        assert!((row.richness - 1.0).abs() < 1e-9);
    }
}
