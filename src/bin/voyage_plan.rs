//! `voyage-plan`: distribute query batches and run orchestrated searches.
//!
//! All output is JSON on stdout. Tracing goes to stderr so stdout stays
//! machine-readable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use voyage::voyage_search::{HealthMonitor, SearchRequest};
use voyage::{
    Distribution, QueryBatch, QueryOutcome, Strategy, ValidationReport, VoyageConfig,
    dispatch_assignment,
};

/// Plan query distribution and aggregate search results.
#[derive(Parser)]
#[command(name = "voyage-plan", version, about)]
struct Cli {
    /// Path to TOML configuration file (defaults to the user config if present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assign a JSON query batch to worker classes and validate the plan.
    Distribute {
        /// JSON file with `{"queries": [...], "context": {...}}`.
        queries: PathBuf,
        /// Force a strategy instead of selecting one by batch shape.
        #[arg(long)]
        strategy: Option<Strategy>,
    },

    /// Distribute a batch, then search every assignment's queries.
    Run {
        /// JSON file with `{"queries": [...], "context": {...}}`.
        queries: PathBuf,
    },

    /// Run one orchestrated search.
    Search {
        /// Query text.
        #[arg(required = true)]
        text: Vec<String>,
        /// Maximum results in the response.
        #[arg(long, default_value_t = 10)]
        max_results: usize,
        /// Provider name, or `neural`/`semantic`.
        #[arg(long)]
        hint: Option<String>,
    },

    /// Probe every configured provider once.
    Health,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Plan {
    distribution: Distribution,
    validation: ValidationReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentRun {
    worker_class: String,
    outcomes: Vec<QueryOutcome>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("voyage=info,voyage_search=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    config.validate().context("invalid configuration")?;

    match cli.command {
        Command::Distribute { queries, strategy } => {
            let batch = read_batch(&queries)?;
            let distributor = config.build_distributor()?;
            let distribution = match strategy {
                Some(strategy) => distributor.distribute_with(strategy, batch.queries, &batch.context),
                None => distributor.distribute(batch.queries, &batch.context),
            };
            let validation = distributor.validate(&distribution);
            print_json(&Plan {
                distribution,
                validation,
            })
        }
        Command::Run { queries } => {
            let batch = read_batch(&queries)?;
            let distributor = config.build_distributor()?;
            let orchestrator = config.build_orchestrator()?;
            let distribution = distributor.distribute(batch.queries, &batch.context);

            let mut runs = Vec::with_capacity(distribution.assignments.len());
            for assignment in &distribution.assignments {
                let outcomes = dispatch_assignment(&orchestrator, assignment, &config.dispatch).await;
                runs.push(AssignmentRun {
                    worker_class: assignment.worker_class.clone(),
                    outcomes,
                });
            }
            print_json(&runs)
        }
        Command::Search {
            text,
            max_results,
            hint,
        } => {
            let orchestrator = config.build_orchestrator()?;
            let mut request = SearchRequest::new(text.join(" ")).with_max_results(max_results);
            if let Some(hint) = hint {
                request = request.with_provider_hint(hint);
            }
            let response = orchestrator.search(&request).await;
            print_json(&response)
        }
        Command::Health => {
            let registry = Arc::new(config.build_provider_registry()?);
            let monitor = HealthMonitor::new(registry, config.search.health_probe_timeout());
            let statuses = monitor.check_all().await;
            print_json(&statuses)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<VoyageConfig> {
    if let Some(path) = path {
        return VoyageConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()));
    }
    let default_path = VoyageConfig::default_config_path();
    if default_path.exists() {
        tracing::debug!(path = %default_path.display(), "using user config");
        VoyageConfig::from_file(&default_path)
            .with_context(|| format!("failed to load {}", default_path.display()))
    } else {
        Ok(VoyageConfig::default())
    }
}

fn read_batch(path: &Path) -> anyhow::Result<QueryBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid query batch in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
