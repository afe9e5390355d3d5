//! Concordance over the tau fixture, whole graph and per subgraph.

mod common;

use std::collections::BTreeMap;

use beltools_core::analysis::concordance::{
    calculate_concordance_by_annotation, calculate_concordance_probability,
    calculate_concordance_probability_by_annotation, ConcordanceSettings,
};
use common::*;
use pretty_assertions::assert_eq;

fn settings(permutations: usize) -> ConcordanceSettings {
    ConcordanceSettings {
        key: "weight".to_string(),
        cutoff: 0.0,
        permutations,
        seed: 7,
        ..ConcordanceSettings::default()
    }
}

#[test]
fn phosphorylation_edges_agree_after_gene_collapse() {
    // GSK3B and CDK5 reach MAPT only through the phospho-tau variant
    let result = calculate_concordance_probability(&tau_with_data(), &settings(20)).unwrap();
    assert_eq!(result.score, 1.0);
    assert_eq!(result.p_value, 0.0);
    assert_eq!(result.distribution.len(), 20);
    assert!(result.distribution.iter().all(|s| *s <= 1.0));
}

#[test]
fn uncollapsed_subgraphs_have_nothing_assigned() {
    let scores = calculate_concordance_by_annotation(&tau_with_data(), "Subgraph", "weight", 0.0);
    let expected: BTreeMap<String, f64> = [("Amyloid", -1.0), ("Apoptosis", -1.0), ("Tau", -1.0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(scores, expected);
}

#[test]
fn probability_per_subgraph() {
    let results = calculate_concordance_probability_by_annotation(&tau_with_data(), "Subgraph", &settings(10));
    let names: Vec<&str> = results.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Amyloid", "Apoptosis", "Tau"]);

    let tau = &results["Tau"];
    assert_eq!(tau.score, 1.0);
    assert_eq!(tau.p_value, 0.0);
    assert_eq!(tau.distribution.len(), 10);

    // amyloid-beta carries no value, so none of its edges can be judged
    assert_eq!(results["Amyloid"].score, -1.0);
    assert_eq!(results["Apoptosis"].score, -1.0);
}
