//! PyO3 bindings for the beltools analysis engine.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use beltools_core::config::{Analysis, AnalysisConfig};
use beltools_core::pipeline::{self, ProgressCallback};

/// Python-visible analysis configuration.
#[pyclass]
#[derive(Clone)]
struct PyAnalysisConfig {
    #[pyo3(get, set)]
    data_path: Option<String>,
    #[pyo3(get, set)]
    protocol_path: Option<String>,
    #[pyo3(get, set)]
    key: String,
    #[pyo3(get, set)]
    cutoff: f64,
    #[pyo3(get, set)]
    analyses: Vec<String>,
    #[pyo3(get, set)]
    annotation: Option<String>,
    #[pyo3(get, set)]
    seed: u64,
    #[pyo3(get, set)]
    heat_runs: usize,
    #[pyo3(get, set)]
    regulator: Option<String>,
    #[pyo3(get, set)]
    neurommsig_genes: Vec<String>,
    #[pyo3(get, set)]
    concordance_permutations: usize,
    #[pyo3(get, set)]
    sst_root: Option<String>,
}

#[pymethods]
#[allow(clippy::too_many_arguments)]
impl PyAnalysisConfig {
    #[new]
    #[pyo3(signature = (
        data_path = None,
        protocol_path = None,
        key = "weight".to_string(),
        cutoff = 0.0,
        analyses = vec!["summary".to_string(), "heat".to_string(), "rcr".to_string()],
        annotation = None,
        seed = 0,
        heat_runs = 100,
        regulator = None,
        neurommsig_genes = Vec::new(),
        concordance_permutations = 500,
        sst_root = None,
    ))]
    fn new(
        data_path: Option<String>,
        protocol_path: Option<String>,
        key: String,
        cutoff: f64,
        analyses: Vec<String>,
        annotation: Option<String>,
        seed: u64,
        heat_runs: usize,
        regulator: Option<String>,
        neurommsig_genes: Vec<String>,
        concordance_permutations: usize,
        sst_root: Option<String>,
    ) -> Self {
        Self {
            data_path,
            protocol_path,
            key,
            cutoff,
            analyses,
            annotation,
            seed,
            heat_runs,
            regulator,
            neurommsig_genes,
            concordance_permutations,
            sst_root,
        }
    }
}

impl PyAnalysisConfig {
    fn into_config(self, input_path: &str) -> PyResult<AnalysisConfig> {
        let analyses = self
            .analyses
            .iter()
            .map(|name| {
                Analysis::from_str_value(name)
                    .ok_or_else(|| PyValueError::new_err(format!("unknown analysis '{name}'")))
            })
            .collect::<PyResult<Vec<_>>>()?;

        Ok(AnalysisConfig {
            input_path: input_path.to_string(),
            data_path: self.data_path,
            protocol_path: self.protocol_path,
            key: self.key,
            cutoff: self.cutoff,
            analyses,
            annotation: self.annotation,
            seed: self.seed,
            heat_runs: self.heat_runs,
            regulator: self.regulator,
            neurommsig_genes: self.neurommsig_genes,
            concordance_permutations: self.concordance_permutations,
            sst_root: self.sst_root,
            quiet: true,
            ..AnalysisConfig::default()
        })
    }
}

/// Forward pipeline progress to a Python callable. Exceptions it raises are
/// logged instead of aborting the run.
fn python_progress(callback: PyObject) -> ProgressCallback {
    pipeline::fallible_progress(move |phase: &str, label: &str| {
        Python::with_gil(|py| callback.call1(py, (phase, label)).map(drop))
    })
}

fn runtime_error(err: impl std::fmt::Display) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

/// Analyse a BEL graph and return the result as a Python dict.
#[pyfunction]
#[pyo3(signature = (path, config = None, progress = None))]
fn analyze(
    py: Python<'_>,
    path: &str,
    config: Option<PyAnalysisConfig>,
    progress: Option<PyObject>,
) -> PyResult<Py<PyDict>> {
    let analysis_config = match config {
        Some(config) => config.into_config(path)?,
        None => AnalysisConfig {
            input_path: path.to_string(),
            ..Default::default()
        },
    };

    let result = pipeline::run_pipeline(&analysis_config, progress.map(python_progress)).map_err(runtime_error)?;
    let encoded = serde_json::to_string(&result).map_err(runtime_error)?;
    py.import("json")?.call_method1("loads", (encoded,))?.extract()
}

/// Return the beltools engine version.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// beltools Rust analysis engine.
#[pymodule]
fn _beltools_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_class::<PyAnalysisConfig>()?;
    Ok(())
}
