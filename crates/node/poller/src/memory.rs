//! An in-memory [`EventLog`] for tests.

use crate::{EventLog, FilterId, LogFilter, PollerError};
use alloy_primitives::{Address, U256};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;
use alloy_transport::TransportErrorKind;
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

#[derive(Debug, Default)]
struct State {
    logs: Vec<Log>,
    filters: HashMap<FilterId, (LogFilter, usize)>,
    next_filter: u64,
    head: u64,
    fail_next: usize,
}

/// An append-only [`EventLog`] held in memory. Every appended entry lands in its own block.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    state: Mutex<State>,
}

impl MemoryEventLog {
    /// Creates an empty [`MemoryEventLog`].
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `log` in a new block and returns the stored entry.
    pub fn append(&self, mut log: Log) -> Log {
        let mut state = self.state();
        state.head += 1;
        log.block_number = Some(state.head);
        log.log_index = Some(state.logs.len() as u64);
        state.logs.push(log.clone());
        log
    }

    /// Appends `event` as emitted by `address`.
    pub fn emit<E: SolEvent>(&self, address: Address, event: &E) -> Log {
        self.append(Log {
            inner: alloy_primitives::Log { address, data: event.encode_log_data() },
            ..Default::default()
        })
    }

    /// Returns the number of entries in the log.
    pub fn len(&self) -> usize {
        self.state().logs.len()
    }

    /// Returns `true` if nothing was appended yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of every entry.
    pub fn logs(&self) -> Vec<Log> {
        self.state().logs.clone()
    }

    /// Returns the number of installed filters.
    pub fn installed_filters(&self) -> usize {
        self.state().filters.len()
    }

    /// Makes the next `count` calls to [`EventLog::filter_changes`] fail with a transport error.
    pub fn fail_next_polls(&self, count: usize) {
        self.state().fail_next = count;
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn install_filter(&self, filter: &LogFilter) -> Result<FilterId, PollerError> {
        let mut state = self.state();
        state.next_filter += 1;
        let id = U256::from(state.next_filter);
        let cursor = state.logs.len();
        state.filters.insert(id, (*filter, cursor));
        Ok(id)
    }

    async fn filter_changes(&self, id: FilterId) -> Result<Vec<Log>, PollerError> {
        let mut state = self.state();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(TransportErrorKind::custom_str("connection reset").into());
        }

        let State { logs, filters, .. } = &mut *state;
        let (filter, cursor) = filters.get_mut(&id).ok_or(PollerError::UnknownFilter(id))?;
        let changes = logs[*cursor..].iter().filter(|log| filter.matches(log)).cloned().collect();
        *cursor = logs.len();
        Ok(changes)
    }

    async fn uninstall_filter(&self, id: FilterId) -> Result<bool, PollerError> {
        Ok(self.state().filters.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    alloy_sol_types::sol! {
        event Ping(uint256 value);
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_blocks() {
        let log = MemoryEventLog::new();
        let first = log.emit(Address::ZERO, &Ping { value: U256::ZERO });
        let second = log.emit(Address::ZERO, &Ping { value: U256::ZERO });
        assert_eq!(first.block_number, Some(1));
        assert_eq!(second.block_number, Some(2));
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_changes_drains_once() {
        let log = MemoryEventLog::new();
        let id = log.install_filter(&LogFilter::event::<Ping>(Address::ZERO)).await.unwrap();
        log.emit(Address::ZERO, &Ping { value: U256::ZERO });

        assert_eq!(log.filter_changes(id).await.unwrap().len(), 1);
        assert!(log.filter_changes(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures_are_transient() {
        let log = MemoryEventLog::new();
        let id = log.install_filter(&LogFilter::event::<Ping>(Address::ZERO)).await.unwrap();
        log.fail_next_polls(1);

        assert!(log.filter_changes(id).await.unwrap_err().is_transient());
        assert!(log.filter_changes(id).await.is_ok());
    }
}
