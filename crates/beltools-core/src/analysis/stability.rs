//! Stability motifs: contradictory, regulatory and feedback pairs, and
//! unstable or cyclic triples.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{BelGraph, BelNode, Relation};
use crate::selection::get_causal_subgraph;

/// Simple directed graph as sorted adjacency sets.
pub type Adjacency = BTreeMap<BelNode, BTreeSet<BelNode>>;

pub type Pair = (BelNode, BelNode);
pub type Triple = (BelNode, BelNode, BelNode);

/// More than one of: causal increase, causal decrease, causesNoChange.
pub fn relation_set_has_contradictions(relations: &BTreeSet<Relation>) -> bool {
    let has_increase = relations.iter().any(|r| r.is_causal_increase());
    let has_decrease = relations.iter().any(|r| r.is_causal_decrease());
    let has_no_change = relations.contains(&Relation::CausesNoChange);
    [has_increase, has_decrease, has_no_change].iter().filter(|b| **b).count() > 1
}

pub fn pair_has_contradiction(graph: &BelGraph, u: &BelNode, v: &BelNode) -> bool {
    relation_set_has_contradictions(&graph.relations_between(u, v))
}

/// Ordered pairs whose parallel edges contradict each other.
pub fn get_contradictory_pairs(graph: &BelGraph) -> Vec<(BelNode, BelNode, BTreeSet<Relation>)> {
    graph
        .node_pairs()
        .into_iter()
        .filter_map(|(u, v)| {
            let relations = graph.relations_between(&u, &v);
            relation_set_has_contradictions(&relations).then_some((u, v, relations))
        })
        .collect()
}

fn sorted_pair(a: &BelNode, b: &BelNode) -> Pair {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

fn sorted_triple(a: &BelNode, b: &BelNode, c: &BelNode) -> Triple {
    let mut nodes = [a, b, c];
    nodes.sort();
    (nodes[0].clone(), nodes[1].clone(), nodes[2].clone())
}

fn mutual_pairs<F, G>(graph: &BelGraph, forward: F, backward: G, canonical: bool) -> BTreeSet<Pair>
where
    F: Fn(Relation) -> bool,
    G: Fn(Relation) -> bool,
{
    let causal = get_causal_subgraph(graph);
    causal
        .edges()
        .filter(|(_, _, edge)| forward(edge.relation))
        .filter(|(u, v, _)| causal.edges_between(v, u).iter().any(|e| backward(e.relation)))
        .map(|(u, v, _)| if canonical { sorted_pair(u, v) } else { (u.clone(), v.clone()) })
        .collect()
}

/// `A -> B` and `B -| A`.
pub fn get_regulatory_pairs(graph: &BelGraph) -> BTreeSet<Pair> {
    mutual_pairs(graph, |r| r.is_causal_increase(), |r| r.is_causal_decrease(), false)
}

/// `A -> B` and `B -> A`.
pub fn get_chaotic_pairs(graph: &BelGraph) -> BTreeSet<Pair> {
    mutual_pairs(graph, |r| r.is_causal_increase(), |r| r.is_causal_increase(), true)
}

/// `A -| B` and `B -| A`.
pub fn get_dampened_pairs(graph: &BelGraph) -> BTreeSet<Pair> {
    mutual_pairs(graph, |r| r.is_causal_decrease(), |r| r.is_causal_decrease(), true)
}

// ---------------------------------------------------------------------------
// Correlations
// ---------------------------------------------------------------------------

/// Undirected graph of correlative relations, each edge keeping every relation seen.
pub type CorrelationGraph = BTreeMap<BelNode, BTreeMap<BelNode, BTreeSet<Relation>>>;

pub fn get_correlation_graph(graph: &BelGraph) -> CorrelationGraph {
    let mut result = CorrelationGraph::new();
    for (u, v, edge) in graph.edges() {
        if !edge.relation.is_correlative() || u == v {
            continue;
        }
        for (a, b) in [(u, v), (v, u)] {
            result
                .entry(a.clone())
                .or_default()
                .entry(b.clone())
                .or_default()
                .insert(edge.relation);
        }
    }
    result
}

fn correlated(cg: &CorrelationGraph, a: &BelNode, b: &BelNode, relation: Relation) -> bool {
    cg.get(a)
        .and_then(|neighbors| neighbors.get(b))
        .is_some_and(|relations| relations.contains(&relation))
}

pub fn get_correlation_triangles(cg: &CorrelationGraph) -> BTreeSet<Triple> {
    let mut triangles = BTreeSet::new();
    for (n, neighbors) in cg {
        let neighbors: Vec<&BelNode> = neighbors.keys().collect();
        for (i, u) in neighbors.iter().enumerate() {
            for v in &neighbors[i + 1..] {
                if cg.get(*u).is_some_and(|adj| adj.contains_key(*v)) {
                    triangles.insert(sorted_triple(n, u, v));
                }
            }
        }
    }
    triangles
}

/// Triples where `A pos B`, `A pos C` and `B neg C`.
pub fn get_separate_unstable_correlation_triples(graph: &BelGraph) -> Vec<Triple> {
    use Relation::{NegativeCorrelation as Neg, PositiveCorrelation as Pos};

    let cg = get_correlation_graph(graph);
    let mut results = Vec::new();
    for (a, b, c) in get_correlation_triangles(&cg) {
        let (ab, bc, ac) = (
            (correlated(&cg, &a, &b, Pos), correlated(&cg, &a, &b, Neg)),
            (correlated(&cg, &b, &c, Pos), correlated(&cg, &b, &c, Neg)),
            (correlated(&cg, &a, &c, Pos), correlated(&cg, &a, &c, Neg)),
        );
        if ab.0 && bc.0 && ac.1 {
            results.push((b.clone(), a.clone(), c.clone()));
        }
        if ab.0 && bc.1 && ac.0 {
            results.push((a.clone(), b.clone(), c.clone()));
        }
        if ab.1 && bc.0 && ac.0 {
            results.push((c.clone(), a.clone(), b.clone()));
        }
    }
    results
}

/// Triples where every pair is negatively correlated.
pub fn get_mutually_unstable_correlation_triples(graph: &BelGraph) -> Vec<Triple> {
    let cg = get_correlation_graph(graph);
    get_correlation_triangles(&cg)
        .into_iter()
        .filter(|(a, b, c)| {
            [(a, b), (b, c), (a, c)]
                .iter()
                .all(|(x, y)| correlated(&cg, x, y, Relation::NegativeCorrelation))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Triangles
// ---------------------------------------------------------------------------

fn add_arc(adj: &mut Adjacency, u: &BelNode, v: &BelNode) {
    adj.entry(u.clone()).or_default().insert(v.clone());
    adj.entry(v.clone()).or_default();
}

/// 3-cycles of a simple directed graph, each reported once in sorted order.
pub fn get_triangles(adj: &Adjacency) -> BTreeSet<Triple> {
    let mut results = BTreeSet::new();
    for (a, successors) in adj {
        for b in successors {
            let Some(next) = adj.get(b) else { continue };
            for c in next {
                if c != a && c != b && b != a && adj.get(c).is_some_and(|s| s.contains(a)) {
                    results.insert(sorted_triple(a, b, c));
                }
            }
        }
    }
    results
}

/// Increases kept, decreases reversed into increases, positive correlations
/// made two-way, everything else dropped.
pub fn jens_transformation_alpha(graph: &BelGraph) -> Adjacency {
    let mut result = Adjacency::new();
    for (u, v, edge) in graph.edges() {
        match edge.relation {
            Relation::PositiveCorrelation => {
                add_arc(&mut result, u, v);
                add_arc(&mut result, v, u);
            }
            r if r.is_causal_increase() => add_arc(&mut result, u, v),
            r if r.is_causal_decrease() => add_arc(&mut result, v, u),
            _ => {}
        }
    }
    result
}

/// Decreases kept, increases reversed into decreases, negative correlations
/// made two-way, everything else dropped.
pub fn jens_transformation_beta(graph: &BelGraph) -> Adjacency {
    let mut result = Adjacency::new();
    for (u, v, edge) in graph.edges() {
        match edge.relation {
            Relation::NegativeCorrelation => {
                add_arc(&mut result, u, v);
                add_arc(&mut result, v, u);
            }
            r if r.is_causal_increase() => add_arc(&mut result, v, u),
            r if r.is_causal_decrease() => add_arc(&mut result, u, v),
            _ => {}
        }
    }
    result
}

/// Triples where `A -> B`, `A -| C` and `C positiveCorrelation B`.
pub fn get_jens_unstable(graph: &BelGraph) -> BTreeSet<Triple> {
    get_triangles(&jens_transformation_alpha(graph))
}

fn mismatch_triplets<F>(graph: &BelGraph, relation_filter: F) -> Vec<Triple>
where
    F: Fn(Relation) -> bool,
{
    let mut results = Vec::new();
    for node in graph.nodes() {
        let children: BTreeSet<&BelNode> = graph
            .out_edges(node)
            .into_iter()
            .filter(|(_, e)| relation_filter(e.relation))
            .map(|(v, _)| v)
            .collect();
        let children: Vec<&BelNode> = children.into_iter().collect();
        for (i, a) in children.iter().enumerate() {
            for b in &children[i + 1..] {
                let negative = |x: &BelNode, y: &BelNode| {
                    graph
                        .edges_between(x, y)
                        .iter()
                        .any(|e| e.relation == Relation::NegativeCorrelation)
                };
                if negative(a, b) || negative(b, a) {
                    results.push((node.clone(), (*a).clone(), (*b).clone()));
                }
            }
        }
    }
    results
}

/// `A -> B`, `A -> C` and `B negativeCorrelation C`.
pub fn get_increase_mismatch_triplets(graph: &BelGraph) -> Vec<Triple> {
    mismatch_triplets(graph, |r| r.is_causal_increase())
}

/// `A -| B`, `A -| C` and `B negativeCorrelation C`.
pub fn get_decrease_mismatch_triplets(graph: &BelGraph) -> Vec<Triple> {
    mismatch_triplets(graph, |r| r.is_causal_decrease())
}

fn relation_triangles<F>(graph: &BelGraph, relation_filter: F) -> BTreeSet<Triple>
where
    F: Fn(Relation) -> bool,
{
    let mut adj = Adjacency::new();
    for (u, v, edge) in graph.edges() {
        if relation_filter(edge.relation) {
            add_arc(&mut adj, u, v);
        }
    }
    get_triangles(&adj)
}

/// `A -> B -> C -> A`.
pub fn get_chaotic_triplets(graph: &BelGraph) -> BTreeSet<Triple> {
    relation_triangles(graph, |r| r.is_causal_increase())
}

/// `A -| B -| C -| A`.
pub fn get_dampened_triplets(graph: &BelGraph) -> BTreeSet<Triple> {
    relation_triangles(graph, |r| r.is_causal_decrease())
}

/// Count of every stability motif in the graph.
pub fn summarize_stability(graph: &BelGraph) -> BTreeMap<String, usize> {
    [
        ("Regulatory Pairs", get_regulatory_pairs(graph).len()),
        ("Chaotic Pairs", get_chaotic_pairs(graph).len()),
        ("Dampened Pairs", get_dampened_pairs(graph).len()),
        ("Contradictory Pairs", get_contradictory_pairs(graph).len()),
        (
            "Separately Unstable Triples",
            get_separate_unstable_correlation_triples(graph).len(),
        ),
        (
            "Mutually Unstable Triples",
            get_mutually_unstable_correlation_triples(graph).len(),
        ),
        ("Jens Unstable Triples", get_jens_unstable(graph).len()),
        ("Increase Mismatch Triples", get_increase_mismatch_triplets(graph).len()),
        ("Decrease Mismatch Triples", get_decrease_mismatch_triplets(graph).len()),
        ("Chaotic Triples", get_chaotic_triplets(graph).len()),
        ("Dampened Triples", get_dampened_triplets(graph).len()),
    ]
    .into_iter()
    .map(|(label, count)| (label.to_string(), count))
    .collect()
}
