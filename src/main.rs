use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use issuecurator::models::{Catalog, RawRecord};
use issuecurator::{
    Classifier, Config, CurationConfig, CurationPipeline, CurationStore, JsonlStore, OpenAiOracle,
    SqliteStore, StoreBackend,
};

#[derive(Parser, Debug)]
#[command(name = "issuecurator")]
#[command(version = "0.1.0")]
#[command(about = "Curate social-media comments into a catalog of recurring business problems")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Store backend (jsonl, sqlite)
    #[arg(long, global = true)]
    store: Option<String>,

    /// Directory holding the queue/problems/deleted/audit logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory the catalog files are written to
    #[arg(long, global = true)]
    catalog_dir: Option<PathBuf>,

    /// Database path for the sqlite backend
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Classify with the heuristic only, even when an API key is configured
    #[arg(long, global = true)]
    no_oracle: bool,

    /// Hide the progress bar
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Queue raw records from a JSON-lines file
    Ingest {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Classify one batch from the queue and rebuild the catalog
    Run {
        /// Keep running with a delay between cycles
        #[arg(long)]
        continuous: bool,

        #[arg(long)]
        batch_size: Option<usize>,

        /// Minimum cluster size for a published issue
        #[arg(long)]
        min_complaints: Option<usize>,

        /// Seconds between continuous cycles
        #[arg(long)]
        cycle_delay: Option<u64>,
    },

    /// Rebuild the catalog from the problems log without classifying anything
    Rebuild {
        #[arg(long)]
        min_complaints: Option<usize>,
    },

    /// Show log sizes and the current catalog
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("issuecurator=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    apply_overrides(&mut config, &cli)?;

    let mut curation = CurationConfig::from(&config);
    curation.show_progress = !cli.quiet;

    let classifier = build_classifier(&config, cli.no_oracle)?;
    let cycle_delay = Duration::from_secs(config.cycle_delay_secs);

    match config.store_backend {
        StoreBackend::Jsonl => {
            let store = JsonlStore::new(&config.data_dir, &config.catalog_dir)?;
            execute(store, classifier, curation, &cli.command, cycle_delay).await
        }
        StoreBackend::Sqlite => {
            let store = SqliteStore::new(&config.database_path)?;
            execute(store, classifier, curation, &cli.command, cycle_delay).await
        }
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(ref store) = cli.store {
        config.store_backend = store.parse()?;
    }
    if let Some(ref dir) = cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(ref dir) = cli.catalog_dir {
        config.catalog_dir = dir.clone();
    }
    if let Some(ref path) = cli.database {
        config.database_path = path.clone();
    }

    match cli.command {
        Command::Run {
            batch_size,
            min_complaints,
            cycle_delay,
            ..
        } => {
            if let Some(size) = batch_size {
                config.batch_size = size;
            }
            if let Some(min) = min_complaints {
                set_publish_threshold(config, min);
            }
            if let Some(delay) = cycle_delay {
                config.cycle_delay_secs = delay;
            }
        }
        Command::Rebuild {
            min_complaints: Some(min),
        } => set_publish_threshold(config, min),
        _ => {}
    }

    Ok(())
}

/// Lowering the publish threshold drags the candidate threshold down with it.
fn set_publish_threshold(config: &mut Config, min: usize) {
    config.publish_threshold = min;
    config.candidate_threshold = config.candidate_threshold.min(min);
}

fn build_classifier(config: &Config, disabled: bool) -> anyhow::Result<Classifier> {
    match (&config.openai_api_key, config.oracle_enabled && !disabled) {
        (Some(key), true) => {
            let oracle = OpenAiOracle::new(
                key.clone(),
                Some(config.oracle_model.clone()),
                Duration::from_secs(config.oracle_timeout_secs),
            )?;
            tracing::info!("Classifying with {} and heuristic fallback", oracle.model());
            Ok(Classifier::with_oracle(Arc::new(oracle)))
        }
        _ => {
            tracing::info!("Classifying with the heuristic only");
            Ok(Classifier::heuristic_only())
        }
    }
}

async fn execute<S: CurationStore>(
    store: S,
    classifier: Classifier,
    curation: CurationConfig,
    command: &Command,
    cycle_delay: Duration,
) -> anyhow::Result<()> {
    let pipeline = CurationPipeline::new(classifier, store, curation)?;

    match command {
        Command::Ingest { input } => {
            let records = read_records(input)?;
            let summary = pipeline.ingest(records)?;
            println!(
                "queued {} | duplicates={} | discarded={}",
                summary.accepted, summary.duplicates, summary.discarded
            );
        }
        Command::Run { continuous: true, .. } => {
            tracing::info!("Running continuously every {:?}", cycle_delay);
            pipeline.run_continuous(cycle_delay).await;
        }
        Command::Run { .. } => {
            let summary = pipeline.run_once().await?;
            println!(
                "processed {} | problems={} | solutions_filtered={} | deleted={} | remaining={} | published={} | candidates={}",
                summary.processed,
                summary.problems,
                summary.solutions,
                summary.deleted,
                summary.remaining,
                summary.published,
                summary.candidates
            );
        }
        Command::Rebuild { .. } => {
            let catalog = pipeline.rebuild_catalog()?;
            println!(
                "catalog rebuilt | published={} | candidates={}",
                catalog.published.len(),
                catalog.candidates.len()
            );
        }
        Command::Status { format } => {
            let store = pipeline.store();
            let counts = LogCounts {
                queue: store.load_queue()?.len(),
                problems: store.load_problems()?.len(),
                deleted: store.load_deleted()?.len(),
                audit: store.load_audit()?.len(),
            };
            let catalog = store.load_catalog()?;
            let output = match format.as_str() {
                "json" => format_json(&counts, &catalog)?,
                _ => format_text(&counts, &catalog),
            };
            println!("{}", output);
        }
    }

    Ok(())
}

/// Parse JSON lines; malformed lines are dropped.
fn read_records(path: &Path) -> anyhow::Result<Vec<RawRecord>> {
    let (records, malformed) = parse_records(BufReader::new(File::open(path)?))?;
    if malformed > 0 {
        tracing::debug!("Dropped {} malformed lines from {}", malformed, path.display());
    }
    Ok(records)
}

fn parse_records<R: BufRead>(mut reader: R) -> anyhow::Result<(Vec<RawRecord>, usize)> {
    let mut records = Vec::new();
    let mut malformed = 0usize;
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.trim_ascii().is_empty() {
            continue;
        }
        match serde_json::from_slice::<RawRecord>(&line) {
            Ok(record) => records.push(record),
            Err(_) => malformed += 1,
        }
    }

    Ok((records, malformed))
}

struct LogCounts {
    queue: usize,
    problems: usize,
    deleted: usize,
    audit: usize,
}

fn format_json(counts: &LogCounts, catalog: &Catalog) -> anyhow::Result<String> {
    let value = serde_json::json!({
        "queue": counts.queue,
        "problems": counts.problems,
        "deleted": counts.deleted,
        "audit": counts.audit,
        "published": catalog.published,
        "candidates": catalog.candidates,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn format_text(counts: &LogCounts, catalog: &Catalog) -> String {
    let mut output = String::new();

    output.push_str("\n=== Curation Status ===\n\n");
    output.push_str(&format!("Queued:   {}\n", counts.queue));
    output.push_str(&format!("Problems: {}\n", counts.problems));
    output.push_str(&format!("Deleted:  {}\n", counts.deleted));
    output.push_str(&format!("Audited:  {}\n", counts.audit));

    output.push_str(&format!("\nPublished issues ({}):\n", catalog.published.len()));
    for issue in catalog.published.iter().take(15) {
        output.push_str(&format!(
            "  - {} [{}] {} complaints, interest {}, demand {}{}\n",
            issue.title,
            issue.sector,
            issue.complaint_count,
            issue.interest_score,
            issue.demand_tier,
            if issue.fresh { ", fresh" } else { "" }
        ));
    }

    if !catalog.candidates.is_empty() {
        output.push_str(&format!("\nCandidates ({}):\n", catalog.candidates.len()));
        for issue in catalog.candidates.iter().take(10) {
            output.push_str(&format!(
                "  - {} [{}] {} complaints\n",
                issue.title, issue.sector, issue.complaint_count
            ));
        }
    }

    output
}
