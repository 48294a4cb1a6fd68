//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `tree`: arena tree model (nodes, parent/child edges, tip labels).
//! - `newick`: Newick parser and writer.
//! - `rooting`: outgroup rooting.
//! - `bitset`: compact bitset representation for tip sets.
//! - `monophyly`: clade index and monophyly tests.
//! - `rules`: declarative tip label → lineage rules.
//! - `topology`: topology labels and their tally.
//! - `classify`: per-tree classification and parallel batches.
//! - `io`: reading tree files and writing TSV reports.
//! - `error`: error types.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod bitset;
pub mod classify;
pub mod error;
pub mod io;
pub mod monophyly;
pub mod newick;
pub mod rooting;
pub mod rules;
pub mod topology;
pub mod tree;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use bitset::Bitset;
pub use classify::{BatchReport, Classifier, Diagnostic, TreeOutcome};
pub use error::{BatchError, ClassifyError, ConfigError, LineageError};
pub use io::{read_tree_file, read_tree_files, write_labels_tsv, write_tally_tsv};
pub use monophyly::{is_monophyletic, CladeIndex};
pub use newick::{parse_newick, ParseError};
pub use rooting::{root_with_outgroup, RootingError};
pub use rules::{Lineage, LineageRules, MatchKind, MatchRule};
pub use topology::{Tally, Topology};
pub use tree::{NodeId, Tree};
