//! Tactile CLI - replay input traces and inspect shortcut bindings.

#![allow(clippy::needless_pass_by_value, clippy::print_stdout)]

mod replay;
mod trace;

use clap::{Parser, Subcommand, ValueEnum};
use replay::{replay, ReplayError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tactile_core::{gesture, ShortcutKind, ShortcutRegistry, TactileConfig};
use trace::Trace;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tactile")]
#[command(about = "Replay raw input traces through the tactile dispatch core")]
#[command(version)]
struct Cli {
    /// Log dispatch decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a YAML trace and print every delivery
    Replay {
        /// Path to the trace file
        trace: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List registered shortcut descriptions
    Shortcuts {
        /// Only list one kind
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Print the configuration as TOML
    Config {
        /// Configuration file to load instead of the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Motion,
    Key,
    Click,
    Tap,
}

impl From<KindArg> for ShortcutKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Motion => Self::Motion,
            KindArg::Key => Self::Key,
            KindArg::Click => Self::Click,
            KindArg::Tap => Self::Tap,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<TactileConfig, ReplayError> {
    match path {
        Some(path) => Ok(TactileConfig::load_from_file(path)?),
        None => Ok(TactileConfig::default()),
    }
}

fn run_replay(
    trace: &Path,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<(), ReplayError> {
    let config = load_config(config)?;
    let trace = Trace::from_yaml(&std::fs::read_to_string(trace)?)?;
    for delivery in replay(&trace, &config)? {
        match format {
            OutputFormat::Text => println!("{}", delivery.to_text()),
            OutputFormat::Json => println!("{}", serde_json::to_string(&delivery)?),
        }
    }
    Ok(())
}

fn shortcut_listing(kind: Option<KindArg>) -> Vec<String> {
    gesture::register_gesture_ids();
    let registry = ShortcutRegistry::global();
    let kinds: Vec<ShortcutKind> = match kind {
        Some(kind) => vec![kind.into()],
        None => ShortcutKind::ALL.to_vec(),
    };
    kinds
        .into_iter()
        .flat_map(|kind| {
            registry
                .descriptions(kind)
                .into_iter()
                .map(move |(id, description)| format!("{:<7}{id:>6}  {description}", kind.name()))
        })
        .collect()
}

fn run(cli: Cli) -> Result<(), ReplayError> {
    match cli.command {
        Commands::Replay {
            trace,
            config,
            format,
        } => run_replay(&trace, config.as_deref(), format),
        Commands::Shortcuts { kind } => {
            for line in shortcut_listing(kind) {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Config { config } => {
            print!("{}", load_config(config.as_deref())?.to_toml());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
