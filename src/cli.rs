use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "datalake-stats")]
#[command(about = "Collect data lake statistics into the data warehouse", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./Config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Aggregate and log the results without touching the warehouse
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Collect every dataset (default)
    Collect,
    /// Collect proteomics request stats
    Proteomics,
    /// Collect NGS sample stats
    NgsSamples,
    /// Collect NGS run stats from one container and prefix
    NgsRuns {
        /// Container holding the sequencer output
        #[arg(long)]
        container: String,
        /// Folder prefix of the run folders, e.g. NextSeqOutput/
        #[arg(long)]
        prefix: String,
    },
    /// Print configuration values
    PrintConfig,
}
