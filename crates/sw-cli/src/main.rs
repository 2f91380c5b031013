//! CLI frontend for the Session Weaver storytelling engine.

mod commands;
mod ollama;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "weaver=info,sw_session=info,sw_core=warn";

#[derive(Parser)]
#[command(
    name = "weaver",
    about = "Session Weaver: collaborative timeline storytelling with human and AI players",
    version,
    propagate_version = true
)]
struct Cli {
    /// Save file to read and write
    #[arg(short, long, global = true, default_value = "session.json")]
    file: PathBuf,

    /// RNG seed for AI move selection
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// AI strategy: balanced, builder, detailer, focuser
    #[arg(long, global = true)]
    strategy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new save file
    New {
        /// Comma-separated human player names; the first is the host
        #[arg(short, long, default_value = "Host")]
        players: String,

        /// Number of AI players to add after the humans
        #[arg(long, default_value = "0")]
        ai: usize,

        /// Big-picture premise for the story
        #[arg(long)]
        premise: Option<String>,

        /// Overwrite an existing save file
        #[arg(long)]
        force: bool,
    },

    /// Show players, the active turn and board counts
    Status,

    /// Print the narrative tree
    Tree,

    /// Print the history log
    Log,

    /// Show the move an AI strategy would make now
    Suggest,

    /// Export the session: json (full save), history, md
    Export {
        /// Output format: json, history, md
        format: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the board with a history export
    Import {
        /// History JSON document
        path: PathBuf,
    },

    /// Play interactively
    Play,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ctx = commands::Context {
        file: cli.file,
        seed: cli.seed,
        strategy: cli.strategy,
    };

    let result = match cli.command {
        Commands::New {
            players,
            ai,
            premise,
            force,
        } => commands::new::run(&ctx, &players, ai, premise.as_deref(), force),
        Commands::Status => commands::status::run(&ctx),
        Commands::Tree => commands::tree::run(&ctx),
        Commands::Log => commands::log::run(&ctx),
        Commands::Suggest => commands::suggest::run(&ctx),
        Commands::Export { format, output } => {
            commands::export::run(&ctx, &format, output.as_deref())
        }
        Commands::Import { path } => commands::import::run(&ctx, &path),
        Commands::Play => commands::play::run(&ctx),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
