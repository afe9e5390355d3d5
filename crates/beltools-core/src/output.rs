//! JSON result assembly.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;

use crate::config::{AnalysisConfig, AnalysisResult};
use crate::error::Result;
use crate::graph::summary::count_functions;
use crate::graph::BelGraph;

/// Fill in metadata and stats around the analysis sections of a run.
pub fn build_result(
    config: &AnalysisConfig,
    graph: &BelGraph,
    overlaid: usize,
    sections: AnalysisResult,
    timings: &HashMap<String, f64>,
    total_ms: f64,
) -> AnalysisResult {
    let input_path = Path::new(&config.input_path)
        .canonicalize()
        .unwrap_or_else(|_| Path::new(&config.input_path).to_path_buf());
    let graph_name = graph
        .name()
        .map(str::to_string)
        .or_else(|| input_path.file_stem().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_default();

    let mut metadata = HashMap::new();
    metadata.insert("graph_name".to_string(), serde_json::Value::String(graph_name));
    metadata.insert(
        "input_path".to_string(),
        serde_json::Value::String(input_path.to_string_lossy().to_string()),
    );
    metadata.insert(
        "analysed_at".to_string(),
        serde_json::Value::String(Utc::now().to_rfc3339()),
    );
    metadata.insert(
        "beltools_version".to_string(),
        serde_json::Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );
    metadata.insert(
        "analyses".to_string(),
        serde_json::to_value(&config.analyses).unwrap_or_default(),
    );
    metadata.insert("data_key".to_string(), serde_json::json!(config.key));
    metadata.insert("seed".to_string(), serde_json::json!(config.seed));
    metadata.insert(
        "analysis_duration_ms".to_string(),
        serde_json::json!(((total_ms * 10.0).round() / 10.0)),
    );
    metadata.insert(
        "phase_timings".to_string(),
        serde_json::to_value(timings).unwrap_or_default(),
    );

    let mut stats = HashMap::new();
    stats.insert("nodes".to_string(), serde_json::json!(graph.node_count()));
    stats.insert("edges".to_string(), serde_json::json!(graph.edge_count()));
    stats.insert("overlaid_values".to_string(), serde_json::json!(overlaid));
    stats.insert(
        "functions".to_string(),
        serde_json::to_value(count_functions(graph)).unwrap_or_default(),
    );

    AnalysisResult {
        version: "1.0".to_string(),
        metadata,
        stats,
        ..sections
    }
}

/// Write the analysis result to a JSON file.
pub fn write_output(result: &AnalysisResult, output_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(output_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(output_path, json)?;
    Ok(())
}
