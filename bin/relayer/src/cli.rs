//! Contains the relayer CLI.

use crate::{commands::Commands, flags::GlobalArgs};
use anyhow::Result;
use clap::Parser;
use strait_cli::cli_styles;
use strait_service::Metrics;
use tokio_util::sync::CancellationToken;

/// The strait relayer CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, styles = cli_styles(), long_about = None)]
pub(crate) struct Cli {
    /// Global arguments for the CLI.
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    /// The subcommand to run.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

impl Cli {
    /// Runs the CLI.
    pub(crate) fn run(self) -> Result<()> {
        self.init_stack()?;
        Self::tokio_runtime()?.block_on(async move {
            let cancellation = Self::cancel_on_ctrl_c();
            self.command.run(&self.global, cancellation).await
        })
    }

    /// Initializes the tracing subscriber and, if enabled, the Prometheus metrics server.
    fn init_stack(&self) -> Result<()> {
        self.global.log_args.init_tracing_subscriber()?;
        if let Some(addr) = self.global.metrics.init_metrics()? {
            Metrics::init();
            tracing::debug!(target: "relayer", %addr, "Metrics enabled");
        }
        Ok(())
    }

    /// Returns a token cancelled on the first Ctrl-C.
    fn cancel_on_ctrl_c() -> CancellationToken {
        let cancellation = CancellationToken::new();
        let token = cancellation.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(target: "relayer", %err, "Failed to listen for Ctrl-C");
                return;
            }
            tracing::info!(target: "relayer", "Received Ctrl-C, shutting down");
            token.cancel();
        });
        cancellation
    }

    /// Creates a new default tokio multi-thread [Runtime](tokio::runtime::Runtime) with all
    /// features enabled.
    fn tokio_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
        tokio::runtime::Builder::new_multi_thread().enable_all().build()
    }
}
