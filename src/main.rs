mod cli;
mod logging;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use datalake_stats::config;
use datalake_stats::job::{self, Dataset};
use datalake_stats::storage::S3Provider;
use datalake_stats::warehouse::{MemorySink, PgWarehouse};
use dotenv::dotenv;
use std::process;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let args = Cli::parse();

    let exit_code = match run(args) {
        Ok(()) => 0,
        Err(err) => {
            error!("Error: {:#}", err);
            1
        }
    };

    // flush the file appender before exiting
    drop(guard);
    process::exit(exit_code);
}

fn run(args: Cli) -> anyhow::Result<()> {
    let config = config::load_configuration(args.config.as_deref())
        .context("Error loading configuration")?;

    let datasets = match args.command.unwrap_or(Commands::Collect) {
        Commands::PrintConfig => {
            println!("Configuration: {:#?}", config.redacted());
            return Ok(());
        }
        Commands::Collect => Dataset::all(&config),
        Commands::Proteomics => vec![Dataset::Proteomics],
        Commands::NgsSamples => vec![Dataset::NgsSamples],
        Commands::NgsRuns { container, prefix } => vec![Dataset::NgsRuns { container, prefix }],
    };

    let provider =
        S3Provider::new(config.store_settings()).context("Error creating storage client")?;

    if args.dry_run {
        info!("Dry run: results are logged, nothing is written to the warehouse");
        let mut sink = MemorySink::new();
        let results = job::collect_all(&datasets, &config, &provider, &mut sink)?;
        for result in &results {
            info!("{}", serde_json::to_string(result)?);
        }
    } else {
        let database_url = config
            .database_url()
            .context("Error building warehouse connection string")?;
        let mut warehouse = PgWarehouse::new(database_url);
        job::collect_all(&datasets, &config, &provider, &mut warehouse)?;
    }

    Ok(())
}
