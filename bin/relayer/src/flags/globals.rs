//! Global arguments for the CLI.

use alloy_primitives::{Address, B256};
use alloy_provider::DynProvider;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::Parser;
use std::{sync::Arc, time::Duration};
use strait_cli::{LogArgs, MetricsArgs};
use strait_poller::{EventPoller, ProviderEventLog};
use strait_service::{AlloyBridge, AlloySource, RelayConfig};
use url::Url;

/// The poller type used against a live destination chain.
pub(crate) type LivePoller = EventPoller<ProviderEventLog<DynProvider>>;

/// Global arguments for the CLI.
#[derive(Parser, Clone, Debug)]
pub(crate) struct GlobalArgs {
    /// Logging arguments.
    #[command(flatten)]
    pub(crate) log_args: LogArgs,
    /// Prometheus CLI arguments.
    #[command(flatten)]
    pub(crate) metrics: MetricsArgs,
    /// URL of the source chain RPC API. Headers and proofs are read from here.
    #[arg(long, env = "STRAIT_SOURCE_RPC")]
    pub(crate) source_rpc: Url,
    /// URL of the destination chain RPC API, hosting the bridge contract.
    #[arg(long, env = "STRAIT_DESTINATION_RPC")]
    pub(crate) destination_rpc: Option<Url>,
    /// The bridge contract address on the destination chain.
    #[arg(long, env = "STRAIT_BRIDGE_ADDRESS")]
    pub(crate) bridge: Option<Address>,
    /// Seconds between two polls of the source head or the bridge event log.
    #[arg(long, default_value_t = 3, env = "STRAIT_POLL_INTERVAL")]
    pub(crate) poll_interval: u64,
    /// Seconds to pause after a relayed header is confirmed.
    #[arg(long, default_value_t = 5, env = "STRAIT_COOL_DOWN")]
    pub(crate) cool_down: u64,
    /// Seconds to wait for a sent transaction to be included before treating it as not mined.
    #[arg(long, default_value_t = 300, env = "STRAIT_INCLUSION_TIMEOUT")]
    pub(crate) inclusion_timeout: u64,
    /// Hex-encoded key signing destination chain transactions. Without it, transactions are sent
    /// from the first account the destination node exposes.
    #[arg(long, env = "STRAIT_PRIVATE_KEY", hide_env_values = true)]
    pub(crate) private_key: Option<B256>,
}

impl GlobalArgs {
    /// Builds the [`RelayConfig`]. Fails if the destination chain flags are missing.
    pub(crate) fn relay_config(&self) -> Result<RelayConfig> {
        let destination = self
            .destination_rpc
            .clone()
            .context("--destination-rpc is required for this command")?;
        let bridge = self.bridge.context("--bridge is required for this command")?;
        Ok(RelayConfig::new(self.source_rpc.clone(), destination, bridge)
            .with_poll_interval(Duration::from_secs(self.poll_interval))
            .with_cool_down(Duration::from_secs(self.cool_down))
            .with_inclusion_timeout(Duration::from_secs(self.inclusion_timeout)))
    }

    /// Returns the transaction signer, if a private key was given.
    pub(crate) fn signer(&self) -> Result<Option<PrivateKeySigner>> {
        self.private_key
            .map(|key| PrivateKeySigner::from_bytes(&key).context("Invalid private key"))
            .transpose()
    }

    /// Returns a handle to the source chain.
    pub(crate) fn source(&self) -> AlloySource {
        AlloySource::new_http(self.source_rpc.clone())
    }

    /// Connects to the bridge contract and builds a poller over its event log.
    pub(crate) async fn bridge(&self, config: &RelayConfig) -> Result<(Arc<AlloyBridge>, LivePoller)> {
        let bridge = AlloyBridge::connect(
            config.destination_endpoint.clone(),
            config.bridge_address,
            self.signer()?,
        )
        .await
        .context("Failed to connect to the bridge contract")?
        .with_inclusion_timeout(config.inclusion_timeout);
        tracing::info!(
            target: "relayer",
            bridge = %config.bridge_address,
            sender = %bridge.sender(),
            inclusion_timeout = ?bridge.inclusion_timeout(),
            "Connected to the destination chain"
        );
        let poller = EventPoller::new(Arc::new(bridge.event_log()), config.poll_interval);
        Ok((Arc::new(bridge), poller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> GlobalArgs {
        GlobalArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_relay_config_defaults() {
        let args = parse(&[
            "test",
            "--source-rpc",
            "http://localhost:8545",
            "--destination-rpc",
            "http://localhost:9545",
            "--bridge",
            "0x5fbdb2315678afecb367f032d93f642f64180aa3",
        ]);
        let config = args.relay_config().unwrap();
        assert_eq!(config.poll_interval, RelayConfig::DEFAULT_POLL_INTERVAL);
        assert_eq!(config.cool_down, RelayConfig::DEFAULT_COOL_DOWN);
        assert_eq!(config.inclusion_timeout, RelayConfig::DEFAULT_INCLUSION_TIMEOUT);
        assert_eq!(config.destination_endpoint.as_str(), "http://localhost:9545/");
    }

    #[tokio::test]
    async fn test_bridge_bounds_inclusion_wait() {
        let args = parse(&[
            "test",
            "--source-rpc",
            "http://localhost:8545",
            "--destination-rpc",
            "http://localhost:9545",
            "--bridge",
            "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "--inclusion-timeout",
            "30",
            "--private-key",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        ]);
        let config = args.relay_config().unwrap();
        assert_eq!(config.inclusion_timeout, Duration::from_secs(30));

        let (bridge, _) = args.bridge(&config).await.unwrap();
        assert_eq!(bridge.inclusion_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_relay_config_needs_destination() {
        let args = parse(&["test", "--source-rpc", "http://localhost:8545"]);
        assert!(args.relay_config().is_err());
    }

    #[test]
    fn test_signer_from_private_key() {
        let args = parse(&[
            "test",
            "--source-rpc",
            "http://localhost:8545",
            "--private-key",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        ]);
        let signer = args.signer().unwrap().unwrap();
        assert_eq!(
            signer.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn test_no_private_key_means_no_signer() {
        let args = parse(&["test", "--source-rpc", "http://localhost:8545"]);
        assert!(args.signer().unwrap().is_none());
    }
}
