//! sockscan CLI: correlate anonymous poster IDs across threads.

use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use sockscan::engine::{CorrelationReport, Engine, EngineConfig};
use sockscan::expand::ThreadDirectory;
use sockscan::ident::{PostHistory, PosterId, ThreadKey};

#[derive(Parser)]
#[command(name = "sockscan", version, about = "Anonymous-ID correlation and clustering")]
struct Cli {
    /// Base URL for thread dat files.
    #[arg(long, global = true)]
    dat_base: Option<String>,

    /// Base URL of the ID-search service.
    #[arg(long, global = true)]
    search_base: Option<String>,

    /// Delay between successive lookups, in milliseconds.
    #[arg(long, global = true, default_value = "200")]
    pace_ms: u64,

    /// Per-request timeout, in seconds.
    #[arg(long, global = true, default_value = "10")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the unique poster IDs of one thread.
    Ids {
        /// Thread key.
        key: String,
    },

    /// Show the threads a poster ID is known to have posted in.
    History {
        /// Poster ID token.
        id: String,
    },

    /// Run a full correlation from a seed thread and cluster the result.
    Correlate {
        /// Seed thread key.
        key: String,

        /// Emit the full report as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig {
        pace: Duration::from_millis(cli.pace_ms),
        timeout: Duration::from_secs(cli.timeout_secs),
        ..Default::default()
    };
    if let Some(dat_base) = cli.dat_base.clone() {
        config.dat_base = dat_base;
    }
    if let Some(search_base) = cli.search_base.clone() {
        config.search_base = search_base;
    }

    let engine = Engine::new(config)?;

    match cli.command {
        Commands::Ids { key } => {
            let ids = engine
                .directory()
                .ids_in_thread(&ThreadKey::new(key.as_str()))
                .into_diagnostic()?;
            println!("{} unique IDs in thread {key}", ids.len());
            for id in &ids {
                println!("  {id}");
            }
        }

        Commands::History { id } => {
            let history = engine
                .directory()
                .threads_posted_in(&PosterId::new(id.as_str()))
                .into_diagnostic()?;
            match history {
                PostHistory::Known(keys) => {
                    println!("ID:{id} seen in {} thread(s)", keys.len());
                    for key in &keys {
                        println!("  {key}");
                    }
                }
                PostHistory::Unregistered(message) => {
                    println!("ID:{id} has no recorded history: {message}");
                }
            }
        }

        Commands::Correlate { key, json } => {
            let report = engine.correlate(&ThreadKey::new(key.as_str()))?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report_json(&report)).into_diagnostic()?
                );
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn print_report(report: &CorrelationReport) {
    let expansion = &report.expansion;
    println!("seed thread:   {}", expansion.seed);
    println!("origin IDs:    {}", expansion.origin.len());
    println!("suspected IDs: {}", expansion.suspected.len());
    if let Some(message) = &expansion.skipped {
        println!("expansion skipped: {message}");
    }
    if !expansion.failures.is_empty() {
        println!("lookup failures ({}):", expansion.failures.len());
        for failure in &expansion.failures {
            println!("  {:?}: {}", failure.subject, failure.cause);
        }
    }

    println!("\nhierarchical clusters:");
    print_grouping(&report.hac);
    println!("\ndensity clusters (noise dropped):");
    print_grouping(&report.dbscan);
}

fn print_grouping(grouping: &sockscan::cluster::Grouping) {
    if grouping.is_empty() {
        println!("  (none)");
        return;
    }
    for (idx, group) in grouping.groups.iter().enumerate() {
        let members: Vec<&str> = group.iter().map(PosterId::as_str).collect();
        println!("  cluster {idx}: {}", members.join(", "));
    }
}

fn report_json(report: &CorrelationReport) -> serde_json::Value {
    let expansion = &report.expansion;
    let keysets: Vec<serde_json::Value> = expansion
        .keysets
        .iter()
        .map(|(id, keys)| {
            let mut keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
            keys.sort_unstable();
            serde_json::json!({ "id": id.as_str(), "threads": keys })
        })
        .collect();

    serde_json::json!({
        "seed": expansion.seed,
        "origin": expansion.origin,
        "suspected": expansion.suspected,
        "keysets": keysets,
        "skipped": expansion.skipped,
        "failures": expansion.failures,
        "matrix": report.matrix.rows(),
        "hac": report.hac,
        "dbscan": report.dbscan,
    })
}
