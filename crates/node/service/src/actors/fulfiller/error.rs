use crate::{ContractError, SourceError};
use strait_poller::PollerError;
use thiserror::Error;

/// The error type for the [`crate::ProofFulfiller`].
#[derive(Error, Debug)]
pub enum FulfillerError {
    /// Reading the proof from the source chain failed.
    #[error("Source chain error: {0}")]
    Source(#[from] SourceError),
    /// Submitting the proof failed.
    #[error("Bridge contract error: {0}")]
    Contract(#[from] ContractError),
    /// Watching for requests failed.
    #[error("Event poller error: {0}")]
    Poller(#[from] PollerError),
}

impl FulfillerError {
    /// A short label naming where the failure happened.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Source(SourceError::MalformedProof(_)) => "malformed_proof",
            Self::Source(_) => "source",
            Self::Contract(_) => "contract",
            Self::Poller(_) => "poller",
        }
    }
}
