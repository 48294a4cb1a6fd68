//! Python binding layer for topology classification.
//!
//! Provides Python functions that classify Newick strings or tree files and
//! return the per-tree labels, the tally and the diagnostics.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::classify::{BatchReport, Classifier};
use crate::io::read_tree_files;
use crate::rules::LineageRules;

/// (per-tree labels, tally by label, diagnostics as (tree, reason))
type PyReport = (Vec<(String, String)>, HashMap<String, usize>, Vec<(String, String)>);

fn classifier_from(rules_toml: Option<String>) -> PyResult<Classifier> {
    let rules = match rules_toml {
        Some(text) => LineageRules::from_toml_str(&text)
            .map_err(|e| PyValueError::new_err(format!("Invalid lineage rules: {}", e)))?,
        None => LineageRules::default(),
    };
    Ok(Classifier::new(rules))
}

fn to_py_report(report: BatchReport) -> PyReport {
    let labels = report
        .outcomes
        .into_iter()
        .map(|o| (o.id, o.topology.to_string()))
        .collect();
    let tally = report
        .tally
        .iter()
        .map(|(topology, count)| (topology.to_string(), count))
        .collect();
    let diagnostics = report
        .diagnostics
        .into_iter()
        .map(|d| (d.tree, d.reason.to_string()))
        .collect();
    (labels, tally, diagnostics)
}

/// Classify Newick strings.
///
/// Args:
///     newicks: List of Newick strings, one tree per locus
///     names: Optional tree names (default: "tree0", "tree1", ...)
///     rules_toml: Optional TOML lineage rule table (default: Es_/Bs_/Cr_/At_)
///
/// Returns:
///     A tuple of (labels, tally, diagnostics) where:
///     - labels is a list of (tree name, topology) in input order
///     - tally maps "PairAB", "PairAC", "PairBC", "Unknown" to counts
///     - diagnostics is a list of (tree name, reason) for unclassified trees
///
/// Raises:
///     ValueError: If no trees are given, names and newicks differ in length,
///     or the rule table is invalid
#[pyfunction]
#[pyo3(signature = (newicks, names=None, rules_toml=None))]
fn classify_newicks(
    newicks: Vec<String>,
    names: Option<Vec<String>>,
    rules_toml: Option<String>,
) -> PyResult<PyReport> {
    let classifier = classifier_from(rules_toml)?;
    let names = match names {
        Some(names) if names.len() != newicks.len() => {
            return Err(PyValueError::new_err(format!(
                "Got {} names for {} trees",
                names.len(),
                newicks.len()
            )));
        }
        Some(names) => names,
        None => (0..newicks.len()).map(|i| format!("tree{}", i)).collect(),
    };
    let trees: Vec<(String, String)> = names.into_iter().zip(newicks).collect();

    let report = classifier
        .classify_batch(&trees)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(to_py_report(report))
}

/// Classify the trees in a list of Newick tree files (optionally gzipped).
///
/// Args:
///     paths: List of tree file paths
///     rules_toml: Optional TOML lineage rule table (default: Es_/Bs_/Cr_/At_)
///
/// Returns:
///     Same tuple as `classify_newicks`; trees are named after their file.
///
/// Raises:
///     ValueError: If no trees could be read or the rule table is invalid
#[pyfunction]
#[pyo3(signature = (paths, rules_toml=None))]
fn classify_files(paths: Vec<String>, rules_toml: Option<String>) -> PyResult<PyReport> {
    let classifier = classifier_from(rules_toml)?;
    let trees = read_tree_files(&paths);
    let report = classifier
        .classify_batch(&trees)
        .map_err(|e| PyValueError::new_err(format!("{} in {:?}", e, paths)))?;
    Ok(to_py_report(report))
}

/// Python module definition
#[pymodule]
fn locus_topology(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(classify_newicks, m)?)?;
    m.add_function(wrap_pyfunction!(classify_files, m)?)?;
    Ok(())
}
