//! Error types for the event poller.

use crate::FilterId;
use alloy_transport::{RpcError, TransportErrorKind};
use thiserror::Error;

/// An error returned while subscribing to or polling an event log.
#[derive(Error, Debug)]
pub enum PollerError {
    /// The RPC call to the node failed.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// The filter is not installed on the node.
    #[error("Filter {0} is not installed")]
    UnknownFilter(FilterId),
    /// [`crate::EventPoller::wait_for_any`] was called without subscriptions.
    #[error("No subscriptions to wait for")]
    NoSubscriptions,
    /// The wait was cancelled.
    #[error("Wait cancelled")]
    Cancelled,
    /// The deadline passed before a matching event appeared.
    #[error("Deadline elapsed before a matching event appeared")]
    DeadlineElapsed,
}

impl PollerError {
    /// Returns `true` if retrying the poll may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rpc(RpcError::Transport(_)))
    }
}
