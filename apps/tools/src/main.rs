use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::regions::RegionSet;
use signup_core::{build_store, load_settings};
use storage::ensure_store;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the configured database and container if they are missing.
    EnsureStore,
    /// Print every accepted region name.
    Regions,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    match cli.command {
        Command::EnsureStore => {
            let settings =
                load_settings(cli.config.as_deref()).context("failed to load settings")?;
            let target = settings.store_target();
            let store = build_store(&settings)?;
            let container = ensure_store(store.as_ref(), &target).await?;
            println!(
                "database_id={} container_id={} partition_key={} created={}",
                target.database_id,
                container.definition.id,
                container.definition.partition_key.path().unwrap_or_default(),
                container.created,
            );
        }
        Command::Regions => {
            let regions = RegionSet::default();
            for region in regions.iter() {
                println!("{region}");
            }
            println!("{} regions", regions.len());
        }
    }

    Ok(())
}
