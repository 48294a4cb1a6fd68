//! Error types for rule configuration, per-tree classification and batches.

use crate::newick::ParseError;
use crate::rooting::RootingError;
use crate::rules::Lineage;
use crate::topology::Topology;
use std::path::PathBuf;

/// Problems with the lineage rule table. Raised before any tree is read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no rule identifies the {0} lineage")]
    MissingLineage(Lineage),

    #[error("empty pattern in a rule for the {0} lineage")]
    EmptyPattern(Lineage),

    #[error("invalid rules file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to read rules file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tips of a tree could not be mapped one-to-one onto the four lineages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineageError {
    #[error("no tip belongs to the {0} lineage")]
    Missing(Lineage),

    #[error("{count} tips belong to the {lineage} lineage")]
    Duplicate { lineage: Lineage, count: usize },

    #[error("tip {0:?} matches no lineage rule")]
    UnmatchedTip(String),

    #[error("tip {label:?} matches rules for both {first} and {second}")]
    ConflictingRules { label: String, first: Lineage, second: Lineage },
}

/// Why a single tree could not be given a resolved topology.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("no tip matches the outgroup rule")]
    OutgroupNotFound,

    #[error("lineage assignment failed: {0}")]
    LineageAssignment(#[from] LineageError),

    #[error("rooting failed: {0}")]
    Rooting(#[from] RootingError),

    #[error("several ingroup pairs are monophyletic: {}", itertools::join(.0, ", "))]
    AmbiguousTopology(Vec<Topology>),
}

/// Failures that stop a whole batch before any tree is classified.
/// Rule table problems surface earlier, as [`ConfigError`].
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("no trees supplied")]
    NoTrees,
}
