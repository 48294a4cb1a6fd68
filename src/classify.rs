//! Topology classification of single trees and batches of trees.
//!
//! # Per-tree pipeline
//! 1. Map the tips onto lineages with the [`LineageRules`].
//! 2. Root the tree on the outgroup tip.
//! 3. Test the pairs {A,B}, {A,C}, {B,C} for monophyly, in that order.
//!
//! In a well-formed rooted four-taxon tree exactly one pair is a clade. No
//! clade gives [`Topology::Unknown`]; more than one is reported as
//! [`ClassifyError::AmbiguousTopology`].
//!
//! # Batches
//! Every tree is independent, so batches are classified in parallel with
//! rayon. Failures never abort a batch: the tree is counted as `Unknown` and
//! a [`Diagnostic`] is recorded, so the tally total always equals the number
//! of input trees.

use crate::error::{BatchError, ClassifyError, LineageError};
use crate::monophyly::CladeIndex;
use crate::newick::parse_newick;
use crate::rooting::root_with_outgroup;
use crate::rules::{Lineage, LineageRules};
use crate::topology::{Tally, Topology};
use crate::tree::{NodeId, Tree};
use rayon::prelude::*;

/// Label given to one tree of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeOutcome {
    pub id: String,
    pub topology: Topology,
}

/// Why a tree of a batch ended up as [`Topology::Unknown`].
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub tree: String,
    pub reason: ClassifyError,
}

/// Result of classifying a batch of trees.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// One entry per input tree, in input order.
    pub outcomes: Vec<TreeOutcome>,
    pub tally: Tally,
    /// One entry per tree that failed to classify, in input order.
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchReport {
    /// The per-tree labels in input order.
    pub fn labels(&self) -> Vec<Topology> {
        self.outcomes.iter().map(|o| o.topology).collect()
    }
}

/// Classifies rooted four-taxon topologies according to a rule table.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: LineageRules,
}

impl Classifier {
    pub fn new(rules: LineageRules) -> Self {
        Classifier { rules }
    }

    pub fn rules(&self) -> &LineageRules {
        &self.rules
    }

    /// Classifies one parsed tree.
    ///
    /// # Errors
    /// - [`ClassifyError::OutgroupNotFound`] / [`ClassifyError::LineageAssignment`]
    ///   if the tips do not map one-to-one onto the four lineages
    /// - [`ClassifyError::Rooting`] if the tree cannot be rooted
    /// - [`ClassifyError::AmbiguousTopology`] if several pairs are clades
    pub fn classify_tree(&self, tree: &Tree) -> Result<Topology, ClassifyError> {
        let tips = self.rules.assign(tree)?;
        let rooted = root_with_outgroup(tree, tips.outgroup)?;

        let find = |id: NodeId, lineage: Lineage| -> Result<NodeId, ClassifyError> {
            tree.label(id)
                .and_then(|label| rooted.find_tip(|l| l == label))
                .ok_or(ClassifyError::LineageAssignment(LineageError::Missing(lineage)))
        };
        let a = find(tips.a, Lineage::A)?;
        let b = find(tips.b, Lineage::B)?;
        let c = find(tips.c, Lineage::C)?;

        let index = CladeIndex::new(&rooted);
        let candidates = [
            (Topology::PairAB, [a, b]),
            (Topology::PairAC, [a, c]),
            (Topology::PairBC, [b, c]),
        ];
        let matches: Vec<Topology> = candidates
            .iter()
            .filter(|(_, pair)| index.is_monophyletic(pair))
            .map(|&(topology, _)| topology)
            .collect();

        match matches.len() {
            0 => Ok(Topology::Unknown),
            1 => Ok(matches[0]),
            _ => Err(ClassifyError::AmbiguousTopology(matches)),
        }
    }

    /// Parses and classifies one Newick string.
    pub fn classify_newick(&self, text: &str) -> Result<Topology, ClassifyError> {
        let tree = parse_newick(text)?;
        self.classify_tree(&tree)
    }

    /// Classifies one tree of a batch, degrading any failure to
    /// [`Topology::Unknown`] plus the error that caused it.
    pub fn classify_one(&self, id: &str, text: &str) -> (TreeOutcome, Option<ClassifyError>) {
        let (topology, error) = match self.classify_newick(text) {
            Ok(topology) => {
                tracing::debug!(tree = %id, %topology, "classified");
                (topology, None)
            }
            Err(e) => {
                tracing::warn!(tree = %id, reason = %e, "tree counted as Unknown");
                (Topology::Unknown, Some(e))
            }
        };
        (TreeOutcome { id: id.to_string(), topology }, error)
    }

    /// Classifies a batch of `(tree id, Newick text)` pairs in parallel.
    ///
    /// # Errors
    /// [`BatchError::NoTrees`] if `trees` is empty.
    pub fn classify_batch<I, T>(&self, trees: &[(I, T)]) -> Result<BatchReport, BatchError>
    where
        I: AsRef<str> + Sync,
        T: AsRef<str> + Sync,
    {
        if trees.is_empty() {
            return Err(BatchError::NoTrees);
        }
        tracing::info!(trees = trees.len(), "classifying topologies");

        let results: Vec<(TreeOutcome, Option<ClassifyError>)> = trees
            .par_iter()
            .map(|(id, text)| self.classify_one(id.as_ref(), text.as_ref()))
            .collect();

        // each worker folds a local tally, partial tallies are summed once
        let tally = results
            .par_iter()
            .fold(Tally::new, |mut tally, (outcome, _)| {
                tally.increment(outcome.topology);
                tally
            })
            .reduce(Tally::new, Tally::merge);

        let mut outcomes = Vec::with_capacity(results.len());
        let mut diagnostics = Vec::new();
        for (outcome, error) in results {
            if let Some(reason) = error {
                diagnostics.push(Diagnostic { tree: outcome.id.clone(), reason });
            }
            outcomes.push(outcome);
        }

        tracing::info!(
            resolved = tally.resolved(),
            unknown = tally.get(Topology::Unknown),
            failed = diagnostics.len(),
            "classification finished"
        );
        Ok(BatchReport { outcomes, tally, diagnostics })
    }
}
