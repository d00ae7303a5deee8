///
/// This module implements the CLI interface for source-mirror: command parsing,
/// config loading and user-visible output.
///
/// All core logic (listing, downloading, the tree walk) lives in the
/// [`source-mirror-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: `source-mirror mirror --config mirror.yaml` (see `--help`).
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// ## Exit Behaviour
/// A run that aborts because the root listing failed or was empty prints a failure
/// message and still returns `Ok`. Configuration and setup problems return `Err`.
///
/// [`source-mirror-core`]: ../../source-mirror-core/
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use source_mirror_core::error::MirrorError;
use source_mirror_core::mirror::mirror_deployment;
use std::path::PathBuf;

/// CLI for source-mirror: download a deployment's source tree.
#[derive(Parser)]
#[clap(
    name = "source-mirror",
    version,
    about = "Download the source code of a hosted deployment into a local directory"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mirror the deployment's source tree into the configured output directory
    Mirror {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Mirror { config } => {
            let config = load_config(config)?;
            println!(
                "Starting source code download to: {}",
                config.output_dir.display()
            );
            match mirror_deployment(&config).await {
                Ok(report) => {
                    tracing::info!(command = "mirror", ?report, "Mirror complete");
                    println!(
                        "\nDownload complete! {} files saved, {} skipped, {} directories created.",
                        report.files_written, report.files_skipped, report.directories_created
                    );
                    Ok(())
                }
                Err(e @ (MirrorError::RootListing(_) | MirrorError::EmptyRoot)) => {
                    tracing::error!(command = "mirror", error = %e, "Mirror aborted");
                    println!("\nFailed to retrieve initial file tree ({e}). Aborting download.");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "mirror", error = %e, "Mirror failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
