//! EventCut CLI
//!
//! Extracts frames or clips around annotated events of a football video corpus.
//!
//! # Usage
//!
//! ```bash
//! eventcut extract --corpus Dataset --event Corner --mode clip
//! eventcut extract --event Goal --mode frame --match "Dataset/england_epl/2015-2016/2015-08-08 - Chelsea 2 - 2 Swansea"
//! eventcut plan --event Corner --match "<match dir>"
//! eventcut inspect --match "<match dir>"
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use eventcut_cli::cli::{commands, Cli, Commands};
use eventcut_cli::utils::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format).map_err(|e| anyhow::anyhow!(e))?;
    debug!("Starting EventCut {}", env!("CARGO_PKG_VERSION"));

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => {
            info!("Executing extract command");
            commands::extract(config_path, args).await?;
        }
        Commands::Plan(args) => {
            info!("Executing plan command");
            commands::plan(config_path, args).await?;
        }
        Commands::Inspect(args) => {
            info!("Executing inspect command");
            commands::inspect(config_path, args).await?;
        }
    }

    Ok(())
}
