use clap::Parser;
use locus_topology::classify::Classifier;
use locus_topology::io::{read_tree_files, write_labels_tsv, write_tally_tsv};
use locus_topology::rules::LineageRules;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Classify which pair of three ingroup lineages is sister in each per-locus
/// tree (rooted on an outgroup) and tally the topologies.
#[derive(Parser, Debug)]
#[command(name = "locus-topology", version, about = "Rooted four-taxon topology counts for per-locus trees")]
struct Args {
    /// Newick tree files (one or more trees each, optionally .gz)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// TOML file with lineage matching rules (default: Es_/Bs_/Cr_/At_)
    #[arg(short = 'r', long = "rules")]
    rules: Option<PathBuf>,

    /// Output path for the tally TSV ("-" for stdout, .gz for gzip)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output path for the per-tree labels TSV
    #[arg(short = 'l', long = "labels")]
    labels: Option<PathBuf>,

    /// Quiet mode: only warnings and errors are logged
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,

    /// Verbose mode: log the label of every tree
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,
}

fn init_logging(args: &Args) {
    let default_level = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    let rules = match &args.rules {
        Some(path) => match LineageRules::from_path(path) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Invalid lineage rules: {e}");
                std::process::exit(2);
            }
        },
        None => LineageRules::default(),
    };

    let t0 = Instant::now();
    let trees = read_tree_files(&args.inputs);
    tracing::info!(
        files = args.inputs.len(),
        trees = trees.len(),
        "Reading tree files {:.3}s",
        t0.elapsed().as_secs_f64()
    );

    let classifier = Classifier::new(rules);
    let t1 = Instant::now();
    let report = match classifier.classify_batch(&trees) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(3);
        }
    };
    tracing::info!("Classifying topologies {:.3}s", t1.elapsed().as_secs_f64());

    print!("{}", report.tally.summary(classifier.rules()));
    if !report.diagnostics.is_empty() {
        tracing::warn!(
            "{} of {} trees could not be classified and were counted as Unknown",
            report.diagnostics.len(),
            report.outcomes.len()
        );
    }

    if let Some(output) = &args.output {
        if let Err(e) = write_tally_tsv(output, &report.tally, classifier.rules()) {
            tracing::error!("Failed to write tally {:?}: {e}", output);
            std::process::exit(4);
        }
        tracing::info!(path = %output.display(), "Wrote tally");
    }
    if let Some(labels) = &args.labels {
        if let Err(e) = write_labels_tsv(labels, &report.outcomes) {
            tracing::error!("Failed to write labels {:?}: {e}", labels);
            std::process::exit(4);
        }
        tracing::info!(path = %labels.display(), "Wrote per-tree labels");
    }
}
