use crate::ContractError;
use alloy_primitives::U256;
use strait_poller::PollerError;
use thiserror::Error;

/// The error type for the [`crate::RequestClient`].
#[derive(Error, Debug)]
pub enum RequestClientError {
    /// Logging the request or reading the request counter failed.
    #[error("Bridge contract error: {0}")]
    Contract(#[from] ContractError),
    /// Waiting for the outcome failed.
    #[error("Event poller error: {0}")]
    Poller(#[from] PollerError),
    /// The request counter read zero after the request was included.
    #[error("Request counter is zero after the request was included")]
    CounterUnderflow,
    /// The request transaction was not included before the deadline.
    #[error("Request transaction not included before the deadline")]
    NotIncluded,
    /// The wait was cancelled.
    #[error("Request cancelled")]
    Cancelled,
    /// The request was not resolved before the deadline.
    #[error("Request {request_id} not resolved before the deadline")]
    TimedOut {
        /// The id of the pending request.
        request_id: U256,
    },
}
