//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use beltools_core::config::AnalysisConfig;
use beltools_core::graph::io::{load_input, read_expression_data};
use beltools_core::graph::{BelGraph, BelNode, Relation};
use beltools_core::mutation::overlay_data;

// ---------------------------------------------------------------------------
// Fixture path resolution
// ---------------------------------------------------------------------------

/// Resolve `tests/fixtures/{name}` relative to the workspace root.
pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = Path::new(manifest_dir).join("../../tests/fixtures").join(name);
    path.canonicalize().unwrap_or(path)
}

pub fn fixture_str(name: &str) -> String {
    fixture_path(name).to_string_lossy().to_string()
}

/// Config pointing at the tau fixture with its expression data.
pub fn tau_config() -> AnalysisConfig {
    AnalysisConfig {
        input_path: fixture_str("tau.json"),
        data_path: Some(fixture_str("expression.json")),
        ..Default::default()
    }
}

/// The tau fixture with `expression.json` overlaid under `weight`.
pub fn tau_with_data() -> BelGraph {
    let mut graph = load_input(&fixture_path("tau.json")).unwrap();
    let data = read_expression_data(&fixture_path("expression.json")).unwrap();
    overlay_data(&mut graph, &data, "weight");
    graph
}

// ---------------------------------------------------------------------------
// Example networks
// ---------------------------------------------------------------------------

pub fn p(name: &str) -> BelNode {
    BelNode::protein("HGNC", name)
}

pub fn g(name: &str) -> BelNode {
    BelNode::gene("HGNC", name)
}

pub fn r(name: &str) -> BelNode {
    BelNode::rna("HGNC", name)
}

/// ```text
/// A -> B -| C
/// D -| F -> C
/// E -> F
/// C -- G
/// ```
pub fn network3() -> BelGraph {
    let mut graph = BelGraph::with_name("Example Network 3");
    graph.add_unqualified_edge(&p("a"), &p("b"), Relation::Increases);
    graph.add_unqualified_edge(&p("b"), &g("c"), Relation::Decreases);
    graph.add_unqualified_edge(&r("d"), &g("f"), Relation::Decreases);
    graph.add_unqualified_edge(&p("e"), &g("f"), Relation::Increases);
    graph.add_unqualified_edge(&g("f"), &g("c"), Relation::Increases);
    graph.add_unqualified_edge(&g("c"), &p("g"), Relation::Association);
    graph
}

/// ```text
/// A -> B
/// B -| C, D, E, F
/// B -> G, I
/// B -> H and B -| H
/// B -- J
/// ```
pub fn network4() -> BelGraph {
    let mut graph = BelGraph::with_name("Example Network 4");
    graph.add_unqualified_edge(&p("a"), &p("b"), Relation::Increases);
    graph.add_unqualified_edge(&p("b"), &g("c"), Relation::Decreases);
    graph.add_unqualified_edge(&p("b"), &r("d"), Relation::Decreases);
    graph.add_unqualified_edge(&p("b"), &p("e"), Relation::Decreases);
    graph.add_unqualified_edge(&p("b"), &g("f"), Relation::Decreases);
    graph.add_unqualified_edge(&p("b"), &p("g"), Relation::Increases);
    graph.add_unqualified_edge(&p("b"), &p("h"), Relation::Decreases);
    graph.add_unqualified_edge(&p("b"), &p("h"), Relation::Increases);
    graph.add_unqualified_edge(&p("b"), &p("i"), Relation::Increases);
    graph.add_unqualified_edge(&p("b"), &p("j"), Relation::Association);
    graph
}
