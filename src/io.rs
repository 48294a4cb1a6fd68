use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::classify::TreeOutcome;
use crate::newick::split_trees;
use crate::rules::LineageRules;
use crate::topology::Tally;

/// File extensions stripped from a tree file name to form the locus name.
const TREE_EXTENSIONS: &[&str] = &[".treefile", ".trees", ".tree", ".tre", ".nwk", ".newick"];

/// Locus name of a tree file: the file name without `.gz` and without a
/// known tree extension.
fn locus_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    let file_name = file_name.strip_suffix(".gz").unwrap_or(file_name);
    TREE_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .unwrap_or(file_name)
        .to_string()
}

/// Reads a whole file as text, transparently decompressing `.gz` files.
fn read_text(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut content = String::new();
    if path.to_string_lossy().ends_with(".gz") {
        GzDecoder::new(file).read_to_string(&mut content)?;
    } else {
        io::BufReader::new(file).read_to_string(&mut content)?;
    }
    Ok(content)
}

/// Reads the Newick trees of one file as `(tree id, Newick text)` pairs.
///
/// A file holding a single tree (the usual one-locus tree file) yields one
/// pair named after the locus; a file with several `;`-terminated trees
/// yields `<locus>_tree<N>` for each, numbered from 1. Stray text after the
/// last tree stays with that tree. The text of each tree is not parsed here.
pub fn read_tree_file<P: AsRef<Path>>(path: P) -> io::Result<Vec<(String, String)>> {
    let path = path.as_ref();
    let content = read_text(path)?;
    let base_name = locus_name(path);

    let trees = split_trees(&content);
    if trees.len() == 1 {
        return Ok(vec![(base_name, trees[0].to_string())]);
    }
    Ok(trees
        .into_iter()
        .enumerate()
        .map(|(idx, text)| (format!("{base_name}_tree{}", idx + 1), text.to_string()))
        .collect())
}

/// Reads all tree files in the given order.
///
/// Unreadable files are skipped with a warning; files without any tree text
/// contribute nothing.
pub fn read_tree_files<P: AsRef<Path>>(paths: &[P]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| match read_tree_file(path) {
            Ok(trees) => Some(trees),
            Err(e) => {
                tracing::warn!(path = %path.as_ref().display(), error = %e, "failed to read tree file");
                None
            }
        })
        .flatten()
        .collect()
}

/// Opens `path` for writing. `-` is stdout; a `.gz` suffix enables gzip.
fn create_output(path: &Path) -> io::Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file = File::create(path)?;
    if path.to_string_lossy().ends_with(".gz") {
        let enc = GzEncoder::new(file, Compression::default());
        Ok(Box::new(BufWriter::new(enc)))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Write the tally as TSV with columns `topology`, `code`, `description`
/// and `count`, one row per label.
/// If `path` ends with `.gz`, the output is gzip-compressed; `-` writes to stdout.
pub fn write_tally_tsv<P: AsRef<Path>>(
    path: P,
    tally: &Tally,
    rules: &LineageRules,
) -> io::Result<()> {
    let mut out = create_output(path.as_ref())?;
    writeln!(&mut out, "topology\tcode\tdescription\tcount")?;
    for (topology, count) in tally.iter() {
        writeln!(
            &mut out,
            "{}\t{}\t{}\t{}",
            topology,
            topology.code(),
            topology.describe(rules),
            count
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write one `tree<TAB>topology` row per classified tree, in input order.
pub fn write_labels_tsv<P: AsRef<Path>>(path: P, outcomes: &[TreeOutcome]) -> io::Result<()> {
    let mut out = create_output(path.as_ref())?;
    writeln!(&mut out, "tree\ttopology")?;
    for outcome in outcomes {
        writeln!(&mut out, "{}\t{}", outcome.id, outcome.topology)?;
    }
    out.flush()?;
    Ok(())
}
