use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use csvdag::{
    config::DagConfig,
    dag::{runner::RunState, scheduler::Scheduler, Dag},
    history::RunHistory,
    process,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "csvdag", version, about = "Scheduled CSV to JSON conversion")]
struct Cli {
    /// YAML config file; documented defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the workflow on its schedule until interrupted.
    Scheduler {
        /// Stop after this many scheduled runs.
        #[arg(long)]
        max_runs: Option<usize>,
    },
    /// Run the workflow once, now.
    Trigger {
        /// Logical date for the run (RFC 3339); defaults to now.
        #[arg(long)]
        logical_date: Option<DateTime<Utc>>,
    },
    /// Convert a CSV file once, without notifier, retries or history.
    Convert {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Column printed once per row.
        #[arg(long)]
        column: Option<String>,
    },
    /// Print the effective configuration.
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();

    // ─── 2) load config ──────────────────────────────────────────────
    let cfg = DagConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Scheduler { max_runs } => {
            let scheduler = build_scheduler(&cfg)?;
            scheduler.run(max_runs).await?;
        }
        Command::Trigger { logical_date } => {
            let scheduler = build_scheduler(&cfg)?;
            let report = scheduler.trigger(logical_date).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.state == RunState::Failed {
                bail!("run {} failed", report.run_id);
            }
        }
        Command::Convert {
            input,
            output,
            column,
        } => {
            let mut transform = cfg.transform.clone();
            if let Some(p) = input {
                transform.input_path = p;
            }
            if let Some(p) = output {
                transform.output_path = p;
            }
            if let Some(c) = column {
                transform.diagnostic_column = c;
            }
            let summary = tokio::task::spawn_blocking(move || process::convert(&transform))
                .await
                .context("convert task panicked")??;
            info!(
                rows = summary.rows,
                output = %summary.output_path.display(),
                "converted"
            );
        }
        Command::Show => {
            print!("{}", serde_yaml::to_string(&cfg)?);
        }
    }

    Ok(())
}

fn build_scheduler(cfg: &DagConfig) -> Result<Scheduler> {
    let dag = Dag::from_config(cfg)?;
    let history = RunHistory::new(&cfg.history_dir)?;
    Ok(Scheduler::new(dag, history))
}
