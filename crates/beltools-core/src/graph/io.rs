//! Node-link JSON import/export, corpus loading and expression data.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::bel_graph::{BelGraph, GraphMetadata};
use super::model::{BelEdge, BelNode};
use crate::analysis::stats::median;
use crate::error::{BelError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    #[serde(flatten)]
    node: BelNode,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    data: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkRecord {
    source: usize,
    target: usize,
    #[serde(flatten)]
    edge: BelEdge,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeLinkDocument {
    #[serde(default)]
    graph: GraphMetadata,
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    links: Vec<LinkRecord>,
}

/// Parse a node-link JSON document.
pub fn from_json_str(s: &str) -> Result<BelGraph> {
    let doc: NodeLinkDocument = serde_json::from_str(s)?;

    let mut graph = BelGraph::new();
    graph.metadata = doc.graph;

    for record in &doc.nodes {
        graph.add_node(&record.node);
        for (key, value) in &record.data {
            graph.set_node_value(&record.node, key, *value);
        }
    }

    for link in doc.links {
        let source = doc.nodes.get(link.source).ok_or_else(|| {
            BelError::InvalidArgument(format!("link source {} out of range", link.source))
        })?;
        let target = doc.nodes.get(link.target).ok_or_else(|| {
            BelError::InvalidArgument(format!("link target {} out of range", link.target))
        })?;
        graph.add_edge(&source.node, &target.node, link.edge);
    }

    Ok(graph)
}

/// Serialize a graph to node-link JSON.
pub fn to_json_string(graph: &BelGraph) -> Result<String> {
    let positions: HashMap<&BelNode, usize> =
        graph.nodes().enumerate().map(|(i, n)| (n, i)).collect();

    let nodes = graph
        .nodes()
        .map(|node| NodeRecord {
            node: node.clone(),
            data: graph.node_data(node).cloned().unwrap_or_default(),
        })
        .collect();

    let links = graph
        .edges()
        .map(|(u, v, edge)| LinkRecord {
            source: positions[u],
            target: positions[v],
            edge: edge.clone(),
        })
        .collect();

    let doc = NodeLinkDocument {
        graph: graph.metadata.clone(),
        nodes,
        links,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn read_graph(path: &Path) -> Result<BelGraph> {
    let content = fs::read_to_string(path)?;
    from_json_str(&content)
}

pub fn write_graph(graph: &BelGraph, path: &Path) -> Result<()> {
    fs::write(path, to_json_string(graph)?)?;
    Ok(())
}

/// Load every `*.json` graph below `dir` and merge them into one graph.
///
/// Files that fail to parse are skipped with a warning. Files are visited in
/// path order so that merges are reproducible.
pub fn load_directory(dir: &Path) -> Result<BelGraph> {
    if !dir.is_dir() {
        return Err(BelError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", dir.display()),
        )));
    }

    let mut merged = BelGraph::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }

        match read_graph(path) {
            Ok(graph) => {
                debug!(
                    "loaded {} ({} nodes, {} edges)",
                    path.display(),
                    graph.node_count(),
                    graph.edge_count()
                );
                merged.union(&graph);
            }
            Err(err) => warn!("skipping {}: {err}", path.display()),
        }
    }

    merged.metadata.name = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    Ok(merged)
}

/// Load a graph file, or merge a whole corpus directory.
pub fn load_input(path: &Path) -> Result<BelGraph> {
    if path.is_dir() {
        load_directory(path)
    } else {
        read_graph(path)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExpressionValue {
    Single(f64),
    Many(Vec<f64>),
}

/// Read a `{name: value}` or `{name: [values]}` JSON object. Repeated
/// measurements are aggregated with the median; empty lists are dropped.
pub fn read_expression_data(path: &Path) -> Result<HashMap<String, f64>> {
    let content = fs::read_to_string(path)?;
    parse_expression_data(&content)
}

pub fn parse_expression_data(s: &str) -> Result<HashMap<String, f64>> {
    let raw: HashMap<String, ExpressionValue> = serde_json::from_str(s)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| match value {
            ExpressionValue::Single(v) => Some((name, v)),
            ExpressionValue::Many(vs) => median(&vs).map(|m| (name, m)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::Relation;

    const SAMPLE: &str = r#"{
        "graph": {"name": "sample", "version": "1.0"},
        "nodes": [
            {"function": "Protein", "namespace": "HGNC", "name": "A", "data": {"weight": 1.5}},
            {"function": "BiologicalProcess", "namespace": "GO", "name": "apoptotic process"}
        ],
        "links": [
            {"source": 0, "target": 1, "relation": "increases",
             "citation": {"type": "PubMed", "reference": "12345"},
             "evidence": "A drives apoptosis",
             "annotations": {"Subgraph": "Apoptosis"}}
        ]
    }"#;

    #[test]
    fn parse_sample_document() {
        let g = from_json_str(SAMPLE).unwrap();
        assert_eq!(g.name(), Some("sample"));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        let a = BelNode::protein("HGNC", "A");
        assert_eq!(g.node_value(&a, "weight"), Some(1.5));
        let (_, _, edge) = g.edges().next().unwrap();
        assert_eq!(edge.relation, Relation::Increases);
        assert!(edge.has_annotation_value("Subgraph", "Apoptosis"));
    }

    #[test]
    fn export_then_import_preserves_graph() {
        let g = from_json_str(SAMPLE).unwrap();
        let again = from_json_str(&to_json_string(&g).unwrap()).unwrap();
        assert_eq!(again.node_count(), 2);
        assert_eq!(again.edge_count(), 1);
        assert_eq!(again.metadata, g.metadata);
    }

    #[test]
    fn dangling_link_is_rejected() {
        let doc = r#"{"nodes": [], "links": [{"source": 0, "target": 1, "relation": "increases"}]}"#;
        assert!(matches!(
            from_json_str(doc),
            Err(BelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn expression_lists_use_median() {
        let data = parse_expression_data(r#"{"A": 2.0, "B": [1.0, 5.0, 3.0], "C": []}"#).unwrap();
        assert_eq!(data["A"], 2.0);
        assert_eq!(data["B"], 3.0);
        assert!(!data.contains_key("C"));
    }

    #[test]
    fn load_directory_merges_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), SAMPLE).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let g = load_directory(dir.path()).unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
    }
}
