//! Prometheus metrics flags.

use crate::{CliResult, init_prometheus_server};
use clap::Args;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Flags controlling the Prometheus metrics server.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Serve Prometheus metrics.
    #[arg(
        id = "metrics.enabled",
        long = "metrics.enabled",
        global = true,
        env = "STRAIT_METRICS_ENABLED"
    )]
    pub enabled: bool,
    /// The address the metrics server binds to.
    #[arg(
        id = "metrics.addr",
        long = "metrics.addr",
        global = true,
        default_value = "0.0.0.0",
        env = "STRAIT_METRICS_ADDR"
    )]
    pub addr: IpAddr,
    /// The port the metrics server binds to.
    #[arg(
        id = "metrics.port",
        long = "metrics.port",
        global = true,
        default_value_t = 9090,
        env = "STRAIT_METRICS_PORT"
    )]
    pub port: u16,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self { enabled: false, addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 9090 }
    }
}

impl MetricsArgs {
    /// Starts the metrics server if enabled. Returns the address it serves on.
    pub fn init_metrics(&self) -> CliResult<Option<SocketAddr>> {
        if !self.enabled {
            return Ok(None);
        }
        Ok(Some(init_prometheus_server(self.addr, self.port)?))
    }
}
