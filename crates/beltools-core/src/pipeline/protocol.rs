//! JSON transformation protocols.
//!
//! A protocol is a list of steps. A step either names a registered
//! transformation with its arguments, or is a meta step that runs several
//! sub-protocols on the same graph and merges their results:
//!
//! ```json
//! [
//!   {"function": "infer_central_dogma"},
//!   {"meta": "union", "pipeline": [
//!     [{"function": "get_subgraph_by_annotation_value", "args": {"annotation": "Subgraph", "value": "Tau"}}],
//!     [{"function": "get_causal_subgraph"}]
//!   ]}
//! ]
//! ```

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BelError, Result};
use crate::graph::{parse_node, BelGraph, BelNode, Function};
use crate::{mutation, selection};

pub type Args = Map<String, Value>;

/// Named graph transformations a protocol may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformation {
    InferCentralDogma,
    CollapseToGenes,
    CollapseAllVariants,
    CollapseConsistentEdges,
    RemoveInconsistentEdges,
    InferMissingTwoWayEdges,
    RemoveIsolatedNodes,
    RemoveNodesByFunction,
    GetSubgraphByAnnotationValue,
    GetCausalSubgraph,
    GetUpstreamCausalSubgraph,
    ExpandNodesNeighborhoods,
    GetSubgraphByNodeSearch,
    PruneMechanismByData,
}

impl Transformation {
    pub const ALL: [Transformation; 14] = [
        Self::InferCentralDogma,
        Self::CollapseToGenes,
        Self::CollapseAllVariants,
        Self::CollapseConsistentEdges,
        Self::RemoveInconsistentEdges,
        Self::InferMissingTwoWayEdges,
        Self::RemoveIsolatedNodes,
        Self::RemoveNodesByFunction,
        Self::GetSubgraphByAnnotationValue,
        Self::GetCausalSubgraph,
        Self::GetUpstreamCausalSubgraph,
        Self::ExpandNodesNeighborhoods,
        Self::GetSubgraphByNodeSearch,
        Self::PruneMechanismByData,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::InferCentralDogma => "infer_central_dogma",
            Self::CollapseToGenes => "collapse_to_genes",
            Self::CollapseAllVariants => "collapse_all_variants",
            Self::CollapseConsistentEdges => "collapse_consistent_edges",
            Self::RemoveInconsistentEdges => "remove_inconsistent_edges",
            Self::InferMissingTwoWayEdges => "infer_missing_two_way_edges",
            Self::RemoveIsolatedNodes => "remove_isolated_nodes",
            Self::RemoveNodesByFunction => "remove_nodes_by_function",
            Self::GetSubgraphByAnnotationValue => "get_subgraph_by_annotation_value",
            Self::GetCausalSubgraph => "get_causal_subgraph",
            Self::GetUpstreamCausalSubgraph => "get_upstream_causal_subgraph",
            Self::ExpandNodesNeighborhoods => "expand_nodes_neighborhoods",
            Self::GetSubgraphByNodeSearch => "get_subgraph_by_node_search",
            Self::PruneMechanismByData => "prune_mechanism_by_data",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Apply to `graph`. `universe` is the graph the protocol started from,
    /// used by transformations that pull in more of it.
    pub fn apply(&self, mut graph: BelGraph, universe: &BelGraph, args: &Args) -> Result<BelGraph> {
        match self {
            Self::InferCentralDogma => mutation::infer_central_dogma(&mut graph),
            Self::CollapseToGenes => mutation::collapse_to_genes(&mut graph),
            Self::CollapseAllVariants => mutation::collapse_all_variants(&mut graph),
            Self::CollapseConsistentEdges => mutation::collapse_consistent_edges(&mut graph),
            Self::RemoveInconsistentEdges => mutation::remove_inconsistent_edges(&mut graph),
            Self::InferMissingTwoWayEdges => mutation::infer_missing_two_way_edges(&mut graph),
            Self::RemoveIsolatedNodes => mutation::remove_isolated_nodes(&mut graph),
            Self::RemoveNodesByFunction => {
                let functions = string_list(args, "functions")?
                    .iter()
                    .map(|f| {
                        Function::from_str_value(f)
                            .ok_or_else(|| BelError::InvalidArgument(format!("unknown function '{f}'")))
                    })
                    .collect::<Result<Vec<_>>>()?;
                mutation::remove_nodes_by_function(&mut graph, &functions);
            }
            Self::GetSubgraphByAnnotationValue => {
                let annotation = string_arg(args, "annotation")?;
                let value = string_arg(args, "value")?;
                return Ok(selection::get_subgraph_by_annotation_value(&graph, &annotation, &value));
            }
            Self::GetCausalSubgraph => return Ok(selection::get_causal_subgraph(&graph)),
            Self::GetUpstreamCausalSubgraph => {
                let nodes = node_list(args)?;
                return Ok(selection::get_upstream_causal_subgraph(&graph, &nodes));
            }
            Self::ExpandNodesNeighborhoods => {
                let nodes = node_list(args)?;
                selection::expand_nodes_neighborhoods(universe, &mut graph, &nodes);
            }
            Self::GetSubgraphByNodeSearch => {
                let queries = string_list(args, "query")?;
                return Ok(selection::get_subgraph_by_node_search(&graph, &queries));
            }
            Self::PruneMechanismByData => {
                let key = match args.get("key") {
                    Some(_) => string_arg(args, "key")?,
                    None => "weight".to_string(),
                };
                mutation::prune_mechanism_by_data(&mut graph, &key);
            }
        }
        Ok(graph)
    }
}

fn string_arg(args: &Args, name: &str) -> Result<String> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BelError::InvalidArgument(format!("missing string argument '{name}'")))
}

/// A string or a list of strings.
fn string_list(args: &Args, name: &str) -> Result<Vec<String>> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| BelError::InvalidArgument(format!("'{name}' must hold strings")))
            })
            .collect(),
        _ => Err(BelError::InvalidArgument(format!("missing argument '{name}'"))),
    }
}

fn node_list(args: &Args) -> Result<Vec<BelNode>> {
    string_list(args, "nodes")?.iter().map(|s| parse_node(s)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaOperation {
    Union,
    Intersection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Function {
        function: String,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        args: Args,
    },
    Meta {
        meta: MetaOperation,
        pipeline: Vec<Vec<Step>>,
    },
}

impl Step {
    fn validate(&self) -> Result<()> {
        match self {
            Step::Function { function, .. } => match Transformation::from_name(function) {
                Some(_) => Ok(()),
                None => Err(BelError::UnknownFunction(function.clone())),
            },
            Step::Meta { pipeline, .. } => pipeline.iter().flatten().try_for_each(Step::validate),
        }
    }
}

/// An ordered, serializable list of transformations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    protocol: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let pipeline: Pipeline = serde_json::from_str(s)?;
        pipeline.protocol.iter().try_for_each(Step::validate)?;
        Ok(pipeline)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a step by name; unknown names are rejected here, not at run time.
    pub fn append(&mut self, name: &str, args: Args) -> Result<&mut Self> {
        if Transformation::from_name(name).is_none() {
            return Err(BelError::UnknownFunction(name.to_string()));
        }
        self.protocol.push(Step::Function {
            function: name.to_string(),
            args,
        });
        Ok(self)
    }

    pub fn extend(&mut self, other: Pipeline) {
        self.protocol.extend(other.protocol);
    }

    fn meta(operation: MetaOperation, pipelines: Vec<Pipeline>) -> Self {
        Self {
            protocol: vec![Step::Meta {
                meta: operation,
                pipeline: pipelines.into_iter().map(|p| p.protocol).collect(),
            }],
        }
    }

    /// Run each pipeline on the same graph and merge the results.
    pub fn union(pipelines: Vec<Pipeline>) -> Self {
        Self::meta(MetaOperation::Union, pipelines)
    }

    /// Run each pipeline on the same graph and keep what they share.
    pub fn intersection(pipelines: Vec<Pipeline>) -> Self {
        Self::meta(MetaOperation::Intersection, pipelines)
    }

    pub fn len(&self) -> usize {
        self.protocol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocol.is_empty()
    }

    /// Apply the protocol to a copy of `graph`.
    pub fn run(&self, graph: &BelGraph) -> Result<BelGraph> {
        run_steps(&self.protocol, graph.clone(), graph)
    }
}

fn run_steps(steps: &[Step], mut graph: BelGraph, universe: &BelGraph) -> Result<BelGraph> {
    for step in steps {
        graph = match step {
            Step::Function { function, args } => {
                let transformation =
                    Transformation::from_name(function).ok_or_else(|| BelError::UnknownFunction(function.clone()))?;
                let result = transformation.apply(graph, universe, args)?;
                debug!(
                    "{function}: {} nodes, {} edges",
                    result.node_count(),
                    result.edge_count()
                );
                result
            }
            Step::Meta { meta, pipeline } => {
                let mut merged: Option<BelGraph> = None;
                for sub in pipeline {
                    let result = run_steps(sub, graph.clone(), universe)?;
                    merged = Some(match (merged, meta) {
                        (None, _) => result,
                        (Some(mut acc), MetaOperation::Union) => {
                            acc.union(&result);
                            acc
                        }
                        (Some(acc), MetaOperation::Intersection) => acc.intersection(&result),
                    });
                }
                merged.unwrap_or(graph)
            }
        };
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BelEdge, Relation};
    use serde_json::json;

    fn p(name: &str) -> BelNode {
        BelNode::protein("HGNC", name)
    }

    fn args(value: Value) -> Args {
        match value {
            Value::Object(map) => map,
            _ => Args::new(),
        }
    }

    fn example() -> BelGraph {
        let mut g = BelGraph::new();
        g.add_edge(&p("A"), &p("B"), BelEdge::unqualified(Relation::Increases).with_annotation("Subgraph", "S1"));
        g.add_edge(&p("B"), &p("C"), BelEdge::unqualified(Relation::Association).with_annotation("Subgraph", "S2"));
        g.add_node(&p("LONE"));
        g
    }

    #[test]
    fn append_rejects_unknown_functions() {
        let mut pipeline = Pipeline::new();
        assert!(pipeline.append("remove_isolated_nodes", Args::new()).is_ok());
        let err = pipeline.append("run_spia", Args::new()).unwrap_err();
        assert!(matches!(err, BelError::UnknownFunction(name) if name == "run_spia"));
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn every_transformation_is_registered_by_name() {
        for t in Transformation::ALL {
            assert_eq!(Transformation::from_name(t.name()), Some(t));
        }
    }

    #[test]
    fn runs_steps_in_order_on_a_copy() {
        let graph = example();
        let mut pipeline = Pipeline::new();
        pipeline
            .append("remove_isolated_nodes", Args::new())
            .unwrap()
            .append("get_causal_subgraph", Args::new())
            .unwrap();
        let result = pipeline.run(&graph).unwrap();
        assert_eq!(result.node_count(), 2);
        assert_eq!(result.edge_count(), 1);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn meta_union_and_intersection() {
        let graph = example();
        let s1 = Pipeline::from_json_str(
            r#"[{"function": "get_subgraph_by_annotation_value", "args": {"annotation": "Subgraph", "value": "S1"}}]"#,
        )
        .unwrap();
        let s2 = Pipeline::from_json_str(
            r#"[{"function": "get_subgraph_by_annotation_value", "args": {"annotation": "Subgraph", "value": "S2"}}]"#,
        )
        .unwrap();

        let union = Pipeline::union(vec![s1.clone(), s2.clone()]).run(&graph).unwrap();
        assert_eq!(union.edge_count(), 2);
        assert_eq!(union.node_count(), 3);

        let shared = Pipeline::intersection(vec![s1, s2]).run(&graph).unwrap();
        assert_eq!(shared.edge_count(), 0);
    }

    #[test]
    fn json_round_trip_keeps_meta_steps() {
        let pipeline = Pipeline::union(vec![Pipeline::new()]);
        let text = pipeline.to_json_string().unwrap();
        assert!(text.contains(r#""meta": "union""#));
        assert_eq!(Pipeline::from_json_str(&text).unwrap(), pipeline);
    }

    #[test]
    fn loading_validates_nested_names() {
        let err = Pipeline::from_json_str(r#"[{"meta": "union", "pipeline": [[{"function": "nope"}]]}]"#).unwrap_err();
        assert!(matches!(err, BelError::UnknownFunction(_)));
    }

    #[test]
    fn arguments_are_checked() {
        let graph = example();
        let t = Transformation::RemoveNodesByFunction;
        assert!(t.apply(graph.clone(), &graph, &Args::new()).is_err());
        assert!(t.apply(graph.clone(), &graph, &args(json!({"functions": ["Spaceship"]}))).is_err());
        let pruned = t.apply(graph.clone(), &graph, &args(json!({"functions": "Protein"}))).unwrap();
        assert!(pruned.is_empty());

        let upstream = Transformation::GetUpstreamCausalSubgraph
            .apply(graph.clone(), &graph, &args(json!({"nodes": ["p(HGNC:B)"]})))
            .unwrap();
        assert!(upstream.has_edge(&p("A"), &p("B")));
        assert!(Transformation::GetUpstreamCausalSubgraph
            .apply(graph.clone(), &graph, &args(json!({"nodes": ["not a node"]})))
            .is_err());
    }
}
