//! ragbench - retrieval evaluation for semantic search
//!
//! Builds a news-headline test subset, indexes it, and scores retrieval with
//! Recall@K, distance thresholds and robustness query pairs.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ragbench::corpus::{self, cases};
use ragbench::harness::RetrievalHarness;
use ragbench::{report, Config, Corpus, RecordedRetriever, Retriever};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// ragbench - measure whether semantic search returns the right headlines
#[derive(Parser)]
#[command(
    name = "ragbench",
    author,
    version,
    about = "Retrieval evaluation harness: Recall@K, distance thresholds and robustness pairs",
    long_about = r#"
ragbench scores a semantic search setup against hand-curated queries.

Modes:
  - Recall@K: is the known-correct headline in the top K?
  - Threshold: which results fall under a distance cut-off?
  - Robustness: how do synonym, polysemy and foil query pairs compare?

Examples:
  ragbench subset                             Build data/test_data_subset.json
  ragbench recall                             Recall@3 with the built-in golden set
  ragbench recall --sweep 1,3,5,10            Recall at several K values
  ragbench threshold --threshold 0.75         Accept results closer than 0.75
  ragbench robustness --json                  Pair comparison as JSON
  ragbench recall --recorded runs.json        Score stored results without a model
  ragbench search                             Interactive headline search
"#
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print reports as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Maximum retrieval calls in flight
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Per-call retrieval timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the evaluation subset from the raw dataset
    Subset(SubsetArgs),

    /// Recall@K against a golden set
    Recall(RecallArgs),

    /// Distance-threshold analysis
    Threshold(ThresholdArgs),

    /// Synonymy / polysemy / foil pair comparison
    #[command(alias = "pairs")]
    Robustness(PairArgs),

    /// Interactive headline search
    #[command(alias = "console")]
    Search(SearchArgs),

    /// Display version and build information
    Info,
}

#[derive(Args)]
struct SubsetArgs {
    /// Raw News Category dataset (JSON Lines)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the subset
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leading records considered
    #[arg(long, default_value_t = corpus::DEFAULT_MAX_RECORDS)]
    max_records: usize,

    /// Most frequent categories kept
    #[arg(long, default_value_t = corpus::DEFAULT_CATEGORY_COUNT)]
    categories: usize,
}

#[derive(Args)]
struct SourceArgs {
    /// Replay stored results (JSON map of query -> [[id, distance], ...])
    #[arg(long)]
    recorded: Option<PathBuf>,

    /// Subset to index and to look headlines up in
    #[arg(long)]
    subset: Option<PathBuf>,

    /// Index metric: l2 or cosine
    #[arg(long)]
    metric: Option<String>,
}

#[derive(Args)]
struct RecallArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Golden set file ({query, expected_id} records); built-in set if omitted
    #[arg(long)]
    cases: Option<PathBuf>,

    /// Results per query
    #[arg(short, long)]
    k: Option<usize>,

    /// Comma-separated K values to sweep instead of a single K
    #[arg(long, value_delimiter = ',')]
    sweep: Vec<usize>,
}

#[derive(Args)]
struct ThresholdArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Probe queries ({query, threshold?} records); built-in probes if omitted
    #[arg(long)]
    cases: Option<PathBuf>,

    /// Results fetched per query before filtering
    #[arg(short, long)]
    k: Option<usize>,

    /// Accept results with distance below this value
    #[arg(short, long)]
    threshold: Option<f32>,
}

#[derive(Args)]
struct PairArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Pair file ({query_a, query_b, relationship_kind, target_id?} records)
    #[arg(long)]
    cases: Option<PathBuf>,

    /// Results per query
    #[arg(short, long)]
    k: Option<usize>,
}

#[derive(Args)]
struct SearchArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Results shown per query
    #[arg(short, long, default_value = "3")]
    k: usize,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(n) = cli.concurrency {
        config.harness.concurrency = n;
    }
    if let Some(ms) = cli.timeout_ms {
        config.harness.timeout_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

fn load_corpus(path: &Path) -> Result<Corpus> {
    let documents = corpus::load_subset(path).with_context(|| {
        format!(
            "Cannot load subset '{}'; run 'ragbench subset' first",
            path.display()
        )
    })?;
    Corpus::new(documents)
}

/// Pick the retriever for a run, with the corpus used for headline lookups
fn open_source(source: &SourceArgs, config: &Config) -> Result<(Box<dyn Retriever>, Option<Corpus>)> {
    let subset_path = source.subset.clone().unwrap_or_else(|| config.subset_path.clone());

    if let Some(recorded) = &source.recorded {
        let retriever = RecordedRetriever::from_file(recorded)?;
        info!("Replaying {} recorded queries", retriever.len());
        let corpus = if subset_path.exists() {
            Some(load_corpus(&subset_path)?)
        } else {
            None
        };
        return Ok((Box::new(retriever), corpus));
    }

    let corpus = load_corpus(&subset_path)?;
    let retriever = build_vector_retriever(&corpus, source, config)?;
    Ok((retriever, Some(corpus)))
}

#[cfg(all(feature = "embedding", feature = "vector"))]
fn build_vector_retriever(corpus: &Corpus, source: &SourceArgs, config: &Config) -> Result<Box<dyn Retriever>> {
    use ragbench::ai::EmbeddingWrapper;
    use ragbench::vector::IndexMetric;

    let metric: IndexMetric = source.metric.as_deref().unwrap_or(&config.metric).parse()?;
    eprintln!("Embedding {} headlines...", corpus.len());
    let embedding = EmbeddingWrapper::new()?;
    let retriever = ragbench::VectorRetriever::build(corpus, embedding, metric)?;
    Ok(Box::new(retriever))
}

#[cfg(not(all(feature = "embedding", feature = "vector")))]
fn build_vector_retriever(_corpus: &Corpus, _source: &SourceArgs, _config: &Config) -> Result<Box<dyn Retriever>> {
    bail!("Vector retrieval needs the 'embedding' and 'vector' features; use --recorded or rebuild with default features")
}

/// Token cancelled on Ctrl-C; in-flight retrievals are left to finish
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted: waiting for in-flight retrievals...");
            trigger.cancel();
        }
    });
    token
}

fn emit<T: serde::Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", report::to_json(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only when RUST_LOG is set); stdout carries reports
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    }

    let cli = Cli::parse();

    if let Commands::Info = &cli.command {
        println!("ragbench - retrieval evaluation harness");
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Features:");
        #[cfg(feature = "embedding")]
        println!("  - Embedding generation (fastembed)");
        #[cfg(not(feature = "embedding"))]
        println!("  - Embedding generation: disabled");
        #[cfg(feature = "vector")]
        println!("  - Vector index (usearch)");
        #[cfg(not(feature = "vector"))]
        println!("  - Vector index: disabled");
        return Ok(());
    }

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Subset(args) => {
            let input = args.input.clone().unwrap_or_else(|| config.dataset_path.clone());
            let output = args.output.clone().unwrap_or_else(|| config.subset_path.clone());

            let records = corpus::load_news_jsonl(&input)?;
            if records.is_empty() {
                bail!("Dataset '{}' is empty", input.display());
            }
            let documents = corpus::build_subset(&records, args.max_records, args.categories);
            corpus::write_subset(&output, &documents)?;
            println!(
                "Saved {} test set records to '{}'",
                documents.len(),
                output.display()
            );
        }

        Commands::Recall(args) => {
            let golden = match &args.cases {
                Some(path) => cases::load_golden_set(path)?,
                None => cases::builtin_golden_set(),
            };
            let (retriever, _corpus) = open_source(&args.source, &config)?;
            let harness = RetrievalHarness::new(retriever.as_ref(), config.harness.clone())
                .with_cancellation(interrupt_token());

            if args.sweep.is_empty() {
                let k = args.k.unwrap_or(config.recall_k);
                let result = harness.evaluate_recall(&golden, k).await?;
                emit(cli.json, &result, || report::render_recall(&result))?;
            } else {
                let results = harness.recall_sweep(&golden, &args.sweep).await?;
                emit(cli.json, &results, || {
                    results.iter().map(report::render_recall).collect::<Vec<_>>().join("\n")
                })?;
            }
        }

        Commands::Threshold(args) => {
            let probes = match &args.cases {
                Some(path) => cases::load_threshold_cases(path)?,
                None => cases::builtin_threshold_cases(),
            };
            let (retriever, corpus) = open_source(&args.source, &config)?;
            let harness = RetrievalHarness::new(retriever.as_ref(), config.harness.clone())
                .with_cancellation(interrupt_token());

            let k = args.k.unwrap_or(config.threshold_k);
            let threshold = args.threshold.or(config.threshold);
            let result = harness.filter_by_threshold(&probes, k, threshold).await?;
            emit(cli.json, &result, || report::render_threshold(&result, corpus.as_ref()))?;
        }

        Commands::Robustness(args) => {
            let pairs = match &args.cases {
                Some(path) => cases::load_pair_cases(path)?,
                None => cases::builtin_pair_cases(),
            };
            let (retriever, corpus) = open_source(&args.source, &config)?;
            let harness = RetrievalHarness::new(retriever.as_ref(), config.harness.clone())
                .with_cancellation(interrupt_token());

            let k = args.k.unwrap_or(config.pairs_k);
            let result = harness.compare_pairs(&pairs, k).await?;
            emit(cli.json, &result, || report::render_pairs(&result, corpus.as_ref()))?;
        }

        Commands::Search(args) => {
            let (retriever, corpus) = open_source(&args.source, &config)?;
            let corpus = corpus.unwrap_or_default();
            ragbench::cli::console::run(retriever.as_ref(), &corpus, args.k).await?;
        }

        Commands::Info => unreachable!("handled before configuration is loaded"),
    }

    Ok(())
}
