//! Sequential phase orchestrator with timing.
//!
//! A run loads the graph, overlays experimental data, applies the
//! transformation protocol and then runs every enabled analysis as its own
//! timed phase.

pub mod protocol;

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use log::{info, warn};

pub use protocol::{MetaOperation, Pipeline, Step, Transformation};

use crate::analysis::causalr::{get_observations, rank_all_hypotheses, rank_causalr_hypothesis, RankedRegulator};
use crate::analysis::concordance::{calculate_concordance_by_annotation, calculate_concordance_probability};
use crate::analysis::heat::{calculate_average_score_by_annotation, calculate_average_scores_on_graph};
use crate::analysis::neurommsig::{genes_from_symbols, get_neurommsig_scores};
use crate::analysis::rcr::run_rcr;
use crate::analysis::sst::sample_spanning_trees;
use crate::analysis::stability::summarize_stability;
use crate::config::{Analysis, AnalysisConfig, AnalysisResult, ConcordanceOutput};
use crate::error::{BelError, Result};
use crate::graph::io::{load_input, read_expression_data};
use crate::graph::summary::summarize;
use crate::graph::{parse_node, BelGraph, BelNode};
use crate::mutation::overlay_data;
use crate::output::build_result;

/// Phase labels for progress reporting.
const PHASE_LABELS: &[(&str, &str)] = &[
    ("load", "Loading graph"),
    ("overlay", "Overlaying experimental data"),
    ("protocol", "Running transformation protocol"),
    ("summary", "Summarizing graph"),
    ("stability", "Finding stability motifs"),
    ("heat", "Running heat diffusion"),
    ("rcr", "Running reverse causal reasoning"),
    ("causalr", "Ranking CausalR hypotheses"),
    ("concordance", "Calculating concordance"),
    ("neurommsig", "Scoring NeuroMMSig subgraphs"),
    ("sst", "Sampling spanning trees"),
];

/// Progress callback type: (phase_name, label).
pub type ProgressCallback = Box<dyn FnMut(&str, &str)>;

/// Wrap a callback that can fail. Failures are logged and the run goes on.
pub fn fallible_progress<F, E>(mut callback: F) -> ProgressCallback
where
    F: FnMut(&str, &str) -> std::result::Result<(), E> + 'static,
    E: std::fmt::Display,
{
    Box::new(move |phase: &str, label: &str| {
        if let Err(err) = callback(phase, label) {
            warn!("progress callback failed during {phase}: {err}");
        }
    })
}

/// State threaded through the phases.
#[derive(Debug, Default)]
pub struct RunState {
    pub graph: BelGraph,
    pub sections: AnalysisResult,
    /// Node values written by the overlay phase.
    pub overlaid: usize,
}

type PhaseFn = Box<dyn FnOnce(&AnalysisConfig, &mut RunState) -> Result<()>>;

fn phase_label(name: &str) -> &str {
    PHASE_LABELS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, l)| *l)
        .unwrap_or(name)
}

/// Execute the configured phases and return the result.
pub fn run_pipeline(config: &AnalysisConfig, mut progress_callback: Option<ProgressCallback>) -> Result<AnalysisResult> {
    let mut state = RunState::default();
    let mut timings: HashMap<String, f64> = HashMap::new();
    let total_start = Instant::now();

    let mut phase_fns: Vec<(&str, PhaseFn)> = vec![("load", Box::new(load_phase))];
    if config.data_path.is_some() {
        phase_fns.push(("overlay", Box::new(overlay_phase)));
    }
    if config.protocol_path.is_some() {
        phase_fns.push(("protocol", Box::new(protocol_phase)));
    }
    for analysis in Analysis::ALL.into_iter().filter(|a| config.is_enabled(*a)) {
        phase_fns.push((
            analysis.as_str(),
            Box::new(move |config: &AnalysisConfig, state: &mut RunState| {
                run_analysis(analysis, config, state)
            }),
        ));
    }

    for (name, phase_fn) in phase_fns {
        if let Some(ref mut cb) = progress_callback {
            cb(name, phase_label(name));
        }

        let start = Instant::now();
        phase_fn(config, &mut state)?;
        let elapsed = start.elapsed().as_secs_f64();
        info!("phase {name} finished in {elapsed:.3}s");
        timings.insert(name.to_string(), elapsed);
    }

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;

    Ok(build_result(config, &state.graph, state.overlaid, state.sections, &timings, total_ms))
}

fn load_phase(config: &AnalysisConfig, state: &mut RunState) -> Result<()> {
    state.graph = load_input(Path::new(&config.input_path))?;
    info!(
        "loaded {} nodes and {} edges from {}",
        state.graph.node_count(),
        state.graph.edge_count(),
        config.input_path
    );
    Ok(())
}

fn overlay_phase(config: &AnalysisConfig, state: &mut RunState) -> Result<()> {
    let Some(path) = &config.data_path else {
        return Ok(());
    };
    let data = read_expression_data(Path::new(path))?;
    state.overlaid = overlay_data(&mut state.graph, &data, &config.key);
    if state.overlaid == 0 {
        warn!("none of the {} data entries matched a node", data.len());
    }
    Ok(())
}

fn protocol_phase(config: &AnalysisConfig, state: &mut RunState) -> Result<()> {
    let Some(path) = &config.protocol_path else {
        return Ok(());
    };
    let pipeline = Pipeline::from_json_file(Path::new(path))?;
    state.graph = pipeline.run(&state.graph)?;
    Ok(())
}

fn required_node(graph: &BelGraph, value: Option<&str>, what: &str) -> Result<BelNode> {
    let value = value.ok_or_else(|| BelError::InvalidArgument(format!("{what} is required")))?;
    let node = parse_node(value)?;
    if !graph.has_node(&node) {
        return Err(BelError::NodeNotFound(node.to_string()));
    }
    Ok(node)
}

fn run_analysis(analysis: Analysis, config: &AnalysisConfig, state: &mut RunState) -> Result<()> {
    let graph = &state.graph;
    let sections = &mut state.sections;

    match analysis {
        Analysis::Summary => sections.summary = Some(summarize(graph)),
        Analysis::Stability => sections.stability = Some(summarize_stability(graph)),
        Analysis::Heat => {
            let settings = config.heat_settings();
            let results = calculate_average_scores_on_graph(graph, &settings);
            sections.heat = Some(results.into_iter().map(|(node, r)| (node.to_string(), r)).collect());
            if let Some(annotation) = &config.annotation {
                sections.heat_by_annotation = Some(calculate_average_score_by_annotation(graph, annotation, &settings));
            }
        }
        Analysis::Rcr => sections.rcr = Some(run_rcr(graph, &config.rcr_settings())?),
        Analysis::Causalr => {
            let observations = get_observations(graph, &config.key, config.cutoff);
            let ranked = match &config.regulator {
                Some(_) => {
                    let regulator = required_node(graph, config.regulator.as_deref(), "a regulator")?;
                    let (up, down) = rank_causalr_hypothesis(graph, &observations, &regulator);
                    vec![RankedRegulator {
                        regulator: regulator.to_string(),
                        up,
                        down,
                    }]
                }
                None => rank_all_hypotheses(graph, &observations),
            };
            sections.causalr = Some(ranked);
        }
        Analysis::Concordance => {
            let settings = config.concordance_settings();
            let probability = calculate_concordance_probability(graph, &settings)?;
            let by_annotation = config
                .annotation
                .as_ref()
                .map(|annotation| calculate_concordance_by_annotation(graph, annotation, &config.key, config.cutoff));
            sections.concordance = Some(ConcordanceOutput {
                score: probability.score,
                p_value: probability.p_value,
                permutations: probability.distribution.len(),
                by_annotation,
            });
        }
        Analysis::Neurommsig => {
            if config.neurommsig_genes.is_empty() {
                return Err(BelError::InvalidArgument("NeuroMMSig needs at least one query gene".to_string()));
            }
            let settings = config.neurommsig_settings();
            settings.validate()?;
            let genes = genes_from_symbols(&config.neurommsig_genes);
            sections.neurommsig = get_neurommsig_scores(graph, &genes, &settings);
        }
        Analysis::Sst => {
            let root = required_node(graph, config.sst_root.as_deref(), "a spanning tree root")?;
            let observations = get_observations(graph, &config.key, config.cutoff);
            sections.sst = Some(sample_spanning_trees(graph, &root, &observations, config.sst_samples, config.seed)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fall_back_to_the_phase_name() {
        assert_eq!(phase_label("heat"), "Running heat diffusion");
        assert_eq!(phase_label("custom"), "custom");
    }

    #[test]
    fn missing_input_fails_with_io_error() {
        let config = AnalysisConfig {
            input_path: "/nonexistent/graph.json".to_string(),
            ..AnalysisConfig::default()
        };
        let err = run_pipeline(&config, None).unwrap_err();
        assert!(matches!(err, BelError::Io(_)));
    }

    #[test]
    fn analyses_need_their_inputs() {
        let mut state = RunState::default();
        state.graph.add_node(&crate::graph::BelNode::protein("HGNC", "A"));
        let config = AnalysisConfig::default();
        assert!(run_analysis(Analysis::Neurommsig, &config, &mut state).is_err());
        assert!(run_analysis(Analysis::Sst, &config, &mut state).is_err());

        let config = AnalysisConfig {
            sst_root: Some("p(HGNC:MISSING)".to_string()),
            ..AnalysisConfig::default()
        };
        let err = run_analysis(Analysis::Sst, &config, &mut state).unwrap_err();
        assert!(matches!(err, BelError::NodeNotFound(_)));
    }
}
