use crate::{ContractError, SourceError};
use strait_codec::CodecError;
use strait_poller::PollerError;
use thiserror::Error;

/// The error type for the [`crate::ChainWatcher`].
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Reading the source chain failed.
    #[error("Source chain error: {0}")]
    Source(#[from] SourceError),
    /// The header could not be encoded.
    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),
    /// Storing the header failed.
    #[error("Bridge contract error: {0}")]
    Contract(#[from] ContractError),
    /// Waiting for the confirmation failed.
    #[error("Event poller error: {0}")]
    Poller(#[from] PollerError),
}

impl WatcherError {
    /// Returns `true` if the watcher cannot make progress past this error.
    ///
    /// Encoding failures and `saveBlock` transactions that reverted or whose inclusion could not
    /// be observed are fatal. Source chain, transport and event poller failures are retried on
    /// the next poll.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Codec(_) => true,
            Self::Contract(err) => !matches!(err, ContractError::Rpc(_)),
            Self::Source(_) | Self::Poller(_) => false,
        }
    }

    /// Returns `true` if the watcher was cancelled.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Poller(PollerError::Cancelled))
    }
}
