use std::path::PathBuf;

use clap::{Parser, Subcommand};
use resilient_loader::admin::{classify_message, clear_state, inspect_entries, resolve_store_path, ClearOutcome};
use resilient_loader::config::{load_config, LoaderConfig};
use resilient_loader::env::{Clock, FileStore, SystemClock};
use resilient_loader::observability::logging::init_logging;
use resilient_loader::resilience::{FailureClass, RecoveryPolicy};

#[derive(Parser)]
#[command(name = "recovery-cli")]
#[command(about = "Inspect and reset persisted chunk-reload recovery state", long_about = None)]
struct Cli {
    /// Loader configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recovery state file; overrides `storage.path` from the config.
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List persisted reload timestamps and whether each unit is cooling down
    Inspect,
    /// Check whether an error message counts as a stale chunk
    Classify {
        message: String,
    },
    /// Remove persisted recovery state
    Clear {
        /// Only clear this unit
        #[arg(short, long)]
        unit: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LoaderConfig::default(),
    };
    init_logging(&config.observability);
    let policy = RecoveryPolicy::from(&config.recovery);

    match &cli.command {
        Commands::Classify { message } => {
            let report = classify_message(&policy, message);
            match &report.matched {
                Some(pattern) => println!("{}\tmatched {:?}", report.class.as_str(), pattern),
                None => {
                    println!("{}\tchecked {} pattern(s):", report.class.as_str(), report.patterns.len());
                    for pattern in &report.patterns {
                        println!("  {:?}", pattern);
                    }
                }
            }
            if report.class == FailureClass::Other {
                std::process::exit(1);
            }
        }
        Commands::Inspect => {
            let path = store_path(&cli, &config)?;
            let store = FileStore::open(&path)?;
            let statuses = inspect_entries(&store.entries(), &policy, SystemClock.now_millis());
            if statuses.is_empty() {
                println!("No recovery state in {}", path.display());
            }
            for entry in statuses {
                let status = if entry.cooling_down { "cooling down" } else { "ready" };
                match entry.age_ms {
                    Some(age) => println!("{}\t{}\t{}ms ago\t{}", entry.key, entry.value, age, status),
                    None => println!("{}\t{}\tunparsable\t{}", entry.key, entry.value, status),
                }
            }
        }
        Commands::Clear { unit } => {
            let path = store_path(&cli, &config)?;
            match clear_state(&path, unit.as_deref(), &policy)? {
                ClearOutcome::All => println!("Cleared {}", path.display()),
                ClearOutcome::Unit { key } => println!("Cleared {key}"),
                ClearOutcome::NoState { key } => println!("No state for {key}"),
            }
        }
    }

    Ok(())
}

fn store_path(cli: &Cli, config: &LoaderConfig) -> Result<PathBuf, Box<dyn std::error::Error>> {
    resolve_store_path(cli.store.as_deref(), config)
        .ok_or_else(|| "no store file: pass --store or set storage.path".into())
}
