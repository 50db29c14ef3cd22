//! [RelayActor] trait.

use async_trait::async_trait;

/// The [RelayActor] is a long-running role of the relayer.
///
/// Actors share no in-memory state. Whatever they need from each other travels through the
/// bridge contract's event log. An actor runs until it is cancelled, returning `Ok(())`, or until
/// it hits an error it cannot recover from.
#[async_trait]
pub trait RelayActor: Send + 'static {
    /// The error type for the actor.
    type Error: std::fmt::Debug + std::fmt::Display + Send;

    /// Starts the actor.
    async fn start(self) -> Result<(), Self::Error>;
}
