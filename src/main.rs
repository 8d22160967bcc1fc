use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chatwitness::cli::{analyze, cache, exemplars, formats};
use chatwitness::config::Config;
use chatwitness::transcript::FormatRegistry;

#[derive(Parser)]
#[command(name = "chatwitness")]
#[command(about = "Persistent cyberbullying evidence extraction from chat transcripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (must exist when given)
    #[arg(short, long)]
    config: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a transcript and write the evidence exports
    Analyze {
        /// Exported chat transcript
        transcript: PathBuf,

        /// Transcript format id or family (see `formats`); detected when omitted
        #[arg(short, long)]
        format: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "chatwitness-out")]
        out: PathBuf,

        /// Conversation id (defaults to the file name)
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Show the active exemplar set and its fingerprint
    Exemplars,

    /// List the supported transcript formats
    Formats,

    /// Exemplar embedding cache management
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List cached exemplar sets
    Stats,
    /// Remove all cached exemplar embeddings
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "chatwitness=debug"
    } else {
        "chatwitness=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load config
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            transcript,
            format,
            out,
            conversation,
        } => {
            let registry = FormatRegistry::new();
            analyze::run(&config, &registry, &transcript, format, &out, conversation)?;
        }
        Commands::Exemplars => {
            exemplars::run(&config)?;
        }
        Commands::Formats => {
            formats::run(&FormatRegistry::new())?;
        }
        Commands::Cache { command } => match command {
            CacheCommands::Stats => cache::stats(&config)?,
            CacheCommands::Clear => cache::clear(&config)?,
        },
    }

    Ok(())
}
