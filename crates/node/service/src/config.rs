//! Configuration shared by the relay roles.

use alloy_primitives::Address;
use std::time::Duration;
use url::Url;

/// Configuration for the relay roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// The source chain RPC endpoint. Headers and proofs are read from here.
    pub source_endpoint: Url,
    /// The destination chain RPC endpoint, hosting the bridge contract.
    pub destination_endpoint: Url,
    /// The bridge contract address on the destination chain.
    pub bridge_address: Address,

    /// The interval between two polls of the source head or the bridge event log.
    pub poll_interval: Duration,
    /// The pause after a relayed header is confirmed.
    pub cool_down: Duration,
    /// How long to wait for a sent transaction to be included before giving up on it.
    pub inclusion_timeout: Duration,
}

impl RelayConfig {
    /// The default poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
    /// The default cool-down after a relayed header.
    pub const DEFAULT_COOL_DOWN: Duration = Duration::from_secs(5);
    /// The default inclusion timeout.
    pub const DEFAULT_INCLUSION_TIMEOUT: Duration = Duration::from_secs(300);

    /// Creates a new [`RelayConfig`] with the default poll interval and cool-down.
    pub const fn new(source_endpoint: Url, destination_endpoint: Url, bridge_address: Address) -> Self {
        Self {
            source_endpoint,
            destination_endpoint,
            bridge_address,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            cool_down: Self::DEFAULT_COOL_DOWN,
            inclusion_timeout: Self::DEFAULT_INCLUSION_TIMEOUT,
        }
    }

    /// Sets the poll interval.
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the cool-down.
    pub const fn with_cool_down(mut self, cool_down: Duration) -> Self {
        self.cool_down = cool_down;
        self
    }

    /// Sets the inclusion timeout.
    pub const fn with_inclusion_timeout(mut self, inclusion_timeout: Duration) -> Self {
        self.inclusion_timeout = inclusion_timeout;
        self
    }
}
