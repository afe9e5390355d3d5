//! Run configuration and the JSON result schema.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::causalr::RankedRegulator;
use crate::analysis::concordance::ConcordanceSettings;
use crate::analysis::heat::{HeatResult, HeatSettings};
use crate::analysis::neurommsig::NeurommsigSettings;
use crate::analysis::rcr::{RcrRow, RcrSettings};
use crate::analysis::sst::SstResult;
use crate::error::Result;
use crate::graph::summary::GraphSummary;

/// An analysis that can be switched on for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Analysis {
    Summary,
    Stability,
    Heat,
    Rcr,
    Causalr,
    Concordance,
    Neurommsig,
    Sst,
}

impl Analysis {
    pub const ALL: [Analysis; 8] = [
        Self::Summary,
        Self::Stability,
        Self::Heat,
        Self::Rcr,
        Self::Causalr,
        Self::Concordance,
        Self::Neurommsig,
        Self::Sst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Stability => "stability",
            Self::Heat => "heat",
            Self::Rcr => "rcr",
            Self::Causalr => "causalr",
            Self::Concordance => "concordance",
            Self::Neurommsig => "neurommsig",
            Self::Sst => "sst",
        }
    }

    pub fn from_str_value(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl std::fmt::Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Graph JSON file or a directory of them.
    #[serde(default)]
    pub input_path: String,
    /// Expression data JSON overlaid onto the graph.
    pub data_path: Option<String>,
    /// Transformation protocol JSON applied before the analyses.
    pub protocol_path: Option<String>,
    pub output_path: Option<String>,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default)]
    pub cutoff: f64,
    #[serde(default = "default_analyses")]
    pub analyses: Vec<Analysis>,
    /// Annotation used to stratify heat and concordance results.
    pub annotation: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_heat_runs")]
    pub heat_runs: usize,
    #[serde(default = "default_min_downstream")]
    pub rcr_min_downstream: usize,
    /// Restrict CausalR to one regulator instead of ranking them all.
    pub regulator: Option<String>,
    #[serde(default)]
    pub neurommsig_genes: Vec<String>,
    #[serde(default = "default_neurommsig_annotation")]
    pub neurommsig_annotation: String,
    #[serde(default = "default_weight")]
    pub ora_weight: f64,
    #[serde(default = "default_weight")]
    pub hub_weight: f64,
    #[serde(default = "default_weight")]
    pub topology_weight: f64,
    #[serde(default = "default_top_percent")]
    pub top_percent: f64,
    #[serde(default = "default_permutations")]
    pub concordance_permutations: usize,
    #[serde(default = "default_percentage")]
    pub concordance_percentage: f64,
    pub sst_root: Option<String>,
    #[serde(default = "default_sst_samples")]
    pub sst_samples: usize,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub quiet: bool,
}

fn default_key() -> String {
    "weight".to_string()
}
fn default_analyses() -> Vec<Analysis> {
    vec![Analysis::Summary, Analysis::Heat, Analysis::Rcr]
}
fn default_heat_runs() -> usize {
    100
}
fn default_min_downstream() -> usize {
    4
}
fn default_neurommsig_annotation() -> String {
    "Subgraph".to_string()
}
fn default_weight() -> f64 {
    1.0
}
fn default_top_percent() -> f64 {
    0.05
}
fn default_permutations() -> usize {
    500
}
fn default_percentage() -> f64 {
    0.3
}
fn default_sst_samples() -> usize {
    100
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            data_path: None,
            protocol_path: None,
            output_path: None,
            key: default_key(),
            cutoff: 0.0,
            analyses: default_analyses(),
            annotation: None,
            seed: 0,
            heat_runs: default_heat_runs(),
            rcr_min_downstream: default_min_downstream(),
            regulator: None,
            neurommsig_genes: Vec::new(),
            neurommsig_annotation: default_neurommsig_annotation(),
            ora_weight: default_weight(),
            hub_weight: default_weight(),
            topology_weight: default_weight(),
            top_percent: default_top_percent(),
            concordance_permutations: default_permutations(),
            concordance_percentage: default_percentage(),
            sst_root: None,
            sst_samples: default_sst_samples(),
            verbose: false,
            quiet: false,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn is_enabled(&self, analysis: Analysis) -> bool {
        self.analyses.contains(&analysis)
    }

    pub fn heat_settings(&self) -> HeatSettings {
        HeatSettings {
            key: self.key.clone(),
            runs: self.heat_runs,
            seed: self.seed,
            ..HeatSettings::default()
        }
    }

    pub fn rcr_settings(&self) -> RcrSettings {
        RcrSettings {
            key: self.key.clone(),
            cutoff: self.cutoff,
            min_downstream: self.rcr_min_downstream,
        }
    }

    pub fn neurommsig_settings(&self) -> NeurommsigSettings {
        NeurommsigSettings {
            annotation: self.neurommsig_annotation.clone(),
            ora_weight: self.ora_weight,
            hub_weight: self.hub_weight,
            topology_weight: self.topology_weight,
            top_percent: self.top_percent,
            ..NeurommsigSettings::default()
        }
    }

    pub fn concordance_settings(&self) -> ConcordanceSettings {
        ConcordanceSettings {
            key: self.key.clone(),
            cutoff: self.cutoff,
            permutations: self.concordance_permutations,
            percentage: self.concordance_percentage,
            seed: self.seed,
            ..ConcordanceSettings::default()
        }
    }
}

/// Concordance section of the output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConcordanceOutput {
    pub score: f64,
    pub p_value: f64,
    pub permutations: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_annotation: Option<BTreeMap<String, f64>>,
}

/// Result of an analysis run, one optional section per analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub stats: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<GraphSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<BTreeMap<String, usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat: Option<BTreeMap<String, HeatResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_by_annotation: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rcr: Option<Vec<RcrRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causalr: Option<Vec<RankedRegulator>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concordance: Option<ConcordanceOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neurommsig: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sst: Option<SstResult>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            version: default_version(),
            metadata: HashMap::new(),
            stats: HashMap::new(),
            summary: None,
            stability: None,
            heat: None,
            heat_by_annotation: None,
            rcr: None,
            causalr: None,
            concordance: None,
            neurommsig: None,
            sst: None,
        }
    }
}
