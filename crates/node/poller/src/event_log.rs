//! The event log abstraction polled by [`crate::EventPoller`].

use crate::PollerError;
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, Log};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use std::fmt::Debug;

/// The id of a log filter installed on a node.
pub type FilterId = U256;

/// A node-side log filter: every log of one event emitted by one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogFilter {
    /// The event name, used for reporting.
    pub name: &'static str,
    /// The emitting contract.
    pub address: Address,
    /// The event signature hash, matched against the first topic.
    pub event_signature: B256,
}

impl LogFilter {
    /// Creates a [`LogFilter`] for the Solidity event `E` emitted by `address`.
    ///
    /// The filter is named after `E`'s signature, without its parameter list.
    pub fn event<E: SolEvent>(address: Address) -> Self {
        let name = E::SIGNATURE.split_once('(').map_or(E::SIGNATURE, |(name, _)| name);
        Self { name, address, event_signature: E::SIGNATURE_HASH }
    }

    /// Returns the JSON-RPC filter, starting at the latest block.
    pub fn to_rpc_filter(&self) -> Filter {
        Filter::new()
            .address(self.address)
            .event_signature(self.event_signature)
            .from_block(BlockNumberOrTag::Latest)
    }

    /// Returns `true` if `log` was emitted by the filtered contract and event.
    pub fn matches(&self, log: &Log) -> bool {
        log.inner.address == self.address &&
            log.inner.data.topics().first() == Some(&self.event_signature)
    }
}

/// An append-only, filterable event log with `eth_newFilter` semantics.
///
/// Installed filters buffer matching entries appended after installation until they are drained
/// with [`EventLog::filter_changes`].
#[async_trait]
pub trait EventLog: Debug + Send + Sync {
    /// Installs a filter starting at the latest block.
    async fn install_filter(&self, filter: &LogFilter) -> Result<FilterId, PollerError>;

    /// Drains the entries appended since the last call.
    async fn filter_changes(&self, id: FilterId) -> Result<Vec<Log>, PollerError>;

    /// Removes an installed filter. Returns `false` if the filter was not installed.
    async fn uninstall_filter(&self, id: FilterId) -> Result<bool, PollerError>;
}

/// An [`EventLog`] backed by the filter API of an alloy [`Provider`].
#[derive(Clone)]
pub struct ProviderEventLog<P> {
    provider: P,
}

impl<P> ProviderEventLog<P> {
    /// Creates a new [`ProviderEventLog`].
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P> Debug for ProviderEventLog<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEventLog").finish_non_exhaustive()
    }
}

#[async_trait]
impl<P> EventLog for ProviderEventLog<P>
where
    P: Provider + 'static,
{
    async fn install_filter(&self, filter: &LogFilter) -> Result<FilterId, PollerError> {
        Ok(self.provider.new_filter(&filter.to_rpc_filter()).await?)
    }

    async fn filter_changes(&self, id: FilterId) -> Result<Vec<Log>, PollerError> {
        Ok(self.provider.get_filter_changes::<Log>(id).await?)
    }

    async fn uninstall_filter(&self, id: FilterId) -> Result<bool, PollerError> {
        Ok(self.provider.uninstall_filter(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::LogData;

    alloy_sol_types::sol! {
        event Ping(uint256 value);
        event Pong(uint256 value);
        event Tick();
    }

    fn log(address: Address, topic: B256) -> Log {
        Log {
            inner: alloy_primitives::Log {
                address,
                data: LogData::new_unchecked(vec![topic], Default::default()),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_log_filter_matches_address_and_signature() {
        let address = Address::repeat_byte(1);
        let filter = LogFilter::event::<Ping>(address);
        assert_eq!(filter.name, "Ping");

        assert!(filter.matches(&log(address, Ping::SIGNATURE_HASH)));
        assert!(!filter.matches(&log(address, Pong::SIGNATURE_HASH)));
        assert!(!filter.matches(&log(Address::repeat_byte(2), Ping::SIGNATURE_HASH)));
    }

    #[test]
    fn test_log_filter_name_drops_parameters() {
        assert_eq!(LogFilter::event::<Pong>(Address::ZERO).name, "Pong");
        assert_eq!(LogFilter::event::<Tick>(Address::ZERO).name, "Tick");
    }
}
