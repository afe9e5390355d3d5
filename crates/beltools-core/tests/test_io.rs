//! Graph loading, export and expression data.

mod common;

use beltools_core::graph::io::{load_input, read_expression_data, read_graph, write_graph};
use beltools_core::graph::Relation;
use beltools_core::BelError;
use common::*;
use pretty_assertions::assert_eq;

#[test]
fn fixture_graph_loads_with_annotations() {
    let graph = load_input(&fixture_path("tau.json")).unwrap();
    assert_eq!(graph.name(), Some("Tau Example"));
    assert_eq!(graph.node_count(), 10);

    let edges = graph.edges_between(&p("GSK3B"), &beltools_core::graph::BelNode::bioprocess("GO", "neuron apoptotic process"));
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].relation, Relation::Increases);
    assert!(edges[0].has_annotation_value("Subgraph", "Tau"));
    assert!(edges[0].has_annotation_value("Subgraph", "Apoptosis"));
}

#[test]
fn written_graph_reads_back() {
    let graph = load_input(&fixture_path("tau.json")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tau.json");
    write_graph(&graph, &path).unwrap();

    let again = read_graph(&path).unwrap();
    assert_eq!(again.node_count(), graph.node_count());
    assert_eq!(again.edge_count(), graph.edge_count());
    assert_eq!(again.metadata, graph.metadata);
}

#[test]
fn expression_fixture_takes_median_of_replicates() {
    let data = read_expression_data(&fixture_path("expression.json")).unwrap();
    assert_eq!(data.len(), 7);
    assert_eq!(data["CDK5"], 1.0);
    assert_eq!(data["APP"], -0.5);
}

#[test]
fn missing_file_is_io_error() {
    let err = load_input(&fixture_path("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, BelError::Io(_)));
    assert_eq!(err.exit_code(), 4);
}
