//! Error types for CLI utilities.

use metrics_exporter_prometheus::BuildError;
use std::io;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Error type for prometheus server initialization.
#[derive(Debug, Error)]
pub enum PrometheusError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] io::Error),
    /// Failed to install the exporter as the global metrics recorder.
    #[error("failed to install the prometheus exporter: {0}")]
    Install(#[from] BuildError),
}

/// Errors that can occur while setting up a strait process.
#[derive(Error, Debug)]
pub enum CliError {
    /// A global tracing subscriber was already installed.
    #[error("Failed to initialize tracing: {0}")]
    Tracing(#[from] TryInitError),

    /// Error initializing metrics.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInitialization(#[from] PrometheusError),
}

/// Type alias for CLI results.
pub type CliResult<T> = Result<T, CliError>;
