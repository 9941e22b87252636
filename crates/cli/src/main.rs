//! bomref command line.
//!
//! ## Commands
//!
//! - `compile` - compile a scenario into a BOM document directory
//! - `reconstruct` - rebuild the graph from a document directory once
//! - `watch` - keep a snapshot file current while documents change

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "bomref",
    version,
    about = "BOM documents from ML pipeline metadata, and the graph read back from them"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a scenario file into one BOM document per model/dataset
    Compile {
        /// JSON scenario describing entities, pipelines and relationships
        #[arg(long)]
        scenario: PathBuf,
        /// Only compile entities attributed to this pipeline
        #[arg(long)]
        context: Option<String>,
        /// Output directory for the document set
        #[arg(long)]
        out: PathBuf,
    },
    /// Reconstruct the graph from a document directory and print it
    Reconstruct {
        /// Directory holding the BOM documents
        #[arg(long)]
        docs: PathBuf,
        /// Write the snapshot here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Watch a document directory and rewrite the snapshot on every change
    Watch {
        /// Directory holding the BOM documents
        #[arg(long)]
        docs: PathBuf,
        /// Snapshot file, rewritten atomically per generation
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compile {
            scenario,
            context,
            out,
        } => commands::compile(&scenario, context.as_deref(), &out).await,
        Command::Reconstruct { docs, out } => commands::reconstruct(&docs, out.as_deref()).await,
        Command::Watch { docs, out } => commands::watch(&docs, &out).await,
    }
}
