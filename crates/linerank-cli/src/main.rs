mod display;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linerank_core::{AgreementReport, Config, TaskId};
use linerank_store::{HistoryStore, JsonHistoryStore, Session};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "linerank")]
#[command(about = "Order document lines by pairwise human judgments")]
#[command(version)]
struct Cli {
    /// Labelling job configuration
    #[arg(long, global = true, env = "LINERANK_CONFIG", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the next pair of lines to compare
    Next {
        /// Output the task as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record labels for a task
    Submit {
        /// Encoded task id, e.g. doc1___3___4
        task_id: String,
        /// One or more labels; `a;b` is split into two
        #[arg(required = true)]
        labels: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove a judgment so the pair is asked again (defaults to the last one)
    Restore { task_id: Option<String> },
    /// List recorded judgments
    Labeled,
    /// Write the current history to another file
    Export { out: PathBuf },
    /// Agreement between two history files; the first is the reference
    Compare {
        first: PathBuf,
        second: PathBuf,
        /// Record field holding the label list
        #[arg(long, default_value = "labeled")]
        result_key: String,
    },
}

fn main() -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Next { json } => cmd_next(&cli.config, json),
        Commands::Submit {
            task_id,
            labels,
            yes,
        } => cmd_submit(&cli.config, &task_id, &labels, yes),
        Commands::Restore { task_id } => cmd_restore(&cli.config, task_id.as_deref()),
        Commands::Labeled => cmd_labeled(&cli.config),
        Commands::Export { out } => cmd_export(&cli.config, &out),
        Commands::Compare {
            first,
            second,
            result_key,
        } => cmd_compare(&first, &second, &result_key),
    }
}

// ── Commands ──

fn cmd_next(config_path: &Path, json: bool) -> Result<()> {
    let session = open_session(config_path)?;
    let Some(task) = session.next_task().context("scheduling next task")? else {
        if json {
            println!("null");
        } else {
            println!("Nothing left to label.");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        display::print_task_card(&task, session.scheme(), &session.config().title);
    }
    Ok(())
}

fn cmd_submit(config_path: &Path, task_id: &str, labels: &[String], yes: bool) -> Result<()> {
    let session = open_session(config_path)?;
    let task = parse_task_id(task_id)?;
    let labels = split_labels(labels);

    if session.config().confirm_required && !yes && !confirm(&task, &labels)? {
        println!("Not submitted.");
        return Ok(());
    }

    let record = session
        .submit(&task, labels)
        .with_context(|| format!("submitting {task}"))?;
    println!("Recorded {task}: {}", record.labels().join(";"));
    Ok(())
}

fn cmd_restore(config_path: &Path, task_id: Option<&str>) -> Result<()> {
    let session = open_session(config_path)?;
    let task = match task_id {
        Some(raw) => parse_task_id(raw)?,
        None => match session.last_task_id()? {
            Some(task) => task,
            None => {
                println!("Nothing to restore.");
                return Ok(());
            }
        },
    };

    match session.restore(&task)? {
        Some(record) => println!("Restored {task} (was {})", record.labels().join(";")),
        None => println!("{task} is not labeled."),
    }
    Ok(())
}

fn cmd_labeled(config_path: &Path) -> Result<()> {
    let session = open_session(config_path)?;
    display::print_labeled(&session.history()?, session.documents());
    Ok(())
}

fn cmd_export(config_path: &Path, out: &Path) -> Result<()> {
    let session = open_session(config_path)?;
    let history = session.history()?;
    JsonHistoryStore::new(out, &session.config().result_key)
        .save(&history)
        .with_context(|| format!("exporting to {}", out.display()))?;
    println!("Exported {} records to {}", history.len(), out.display());
    Ok(())
}

fn cmd_compare(first: &Path, second: &Path, result_key: &str) -> Result<()> {
    let reference = JsonHistoryStore::new(first, result_key)
        .load()
        .with_context(|| format!("reading {}", first.display()))?;
    let other = JsonHistoryStore::new(second, result_key)
        .load()
        .with_context(|| format!("reading {}", second.display()))?;
    display::print_report(&AgreementReport::compare(&reference, &other));
    Ok(())
}

// ── Helpers ──

/// `RUST_LOG`-style directives, falling back to `warn` when none are given.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

fn load_config(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    Config::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn open_session(config_path: &Path) -> Result<Session<JsonHistoryStore>> {
    let config = load_config(config_path)?;
    tracing::debug!(
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        "opening session"
    );
    Session::open(config).context("opening labelling session")
}

fn parse_task_id(raw: &str) -> Result<TaskId> {
    TaskId::decode(raw).with_context(|| format!("invalid task id {raw:?}"))
}

/// Labels as typed, with `;`-joined values split apart and blanks dropped.
fn split_labels(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|s| s.split(';'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn confirm(task: &TaskId, labels: &[String]) -> Result<bool> {
    print!("Submit {} for {task}? [y/N] ", labels.join(";"));
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
