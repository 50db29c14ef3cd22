//! Runs several [`RelayActor`]s in one process.

use crate::RelayActor;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// An error returned by [`RelayService::run`].
#[derive(Error, Debug)]
pub enum ServiceError {
    /// An actor returned an error.
    #[error("{actor} failed: {message}")]
    Actor {
        /// The actor name.
        actor: &'static str,
        /// The rendered error.
        message: String,
    },
    /// An actor task panicked or was aborted.
    #[error(transparent)]
    Join(#[from] JoinError),
}

/// A set of [`RelayActor`]s sharing one [`CancellationToken`].
///
/// The actor error types are erased, so that actors with different error types can be run
/// together. When any actor fails, every other actor is cancelled.
#[derive(Debug)]
pub struct RelayService {
    cancellation: CancellationToken,
    tasks: JoinSet<Result<(), ServiceError>>,
}

impl RelayService {
    /// Creates an empty [`RelayService`] cancelled through `cancellation`.
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation, tasks: JoinSet::new() }
    }

    /// Spawns `actor` under `name`.
    pub fn spawn<A: RelayActor>(&mut self, name: &'static str, actor: A) -> &mut Self {
        self.tasks.spawn(async move {
            actor.start().await.map_err(|err| ServiceError::Actor {
                actor: name,
                message: err.to_string(),
            })
        });
        self
    }

    /// Waits for every actor to exit. Returns the first failure, after cancelling the others.
    pub async fn run(mut self) -> Result<(), ServiceError> {
        let mut first_error = None;
        while let Some(joined) = self.tasks.join_next().await {
            let result = joined.map_err(ServiceError::from).and_then(|result| result);
            if let Err(err) = result {
                error!(target: "relay_service", %err, "Actor exited with an error");
                self.cancellation.cancel();
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl RelayActor for Failing {
        type Error = String;

        async fn start(self) -> Result<(), Self::Error> {
            Err("boom".to_string())
        }
    }

    #[derive(Debug)]
    struct Idle(CancellationToken);

    #[async_trait]
    impl RelayActor for Idle {
        type Error = String;

        async fn start(self) -> Result<(), Self::Error> {
            self.0.cancelled().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_cancels_other_actors() {
        let cancellation = CancellationToken::new();
        let mut service = RelayService::new(cancellation.clone());
        service.spawn("idle", Idle(cancellation.clone())).spawn("failing", Failing);

        let err = service.run().await.unwrap_err();
        assert!(matches!(err, ServiceError::Actor { actor: "failing", .. }));
        assert!(cancellation.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_actors_exit_cleanly() {
        let cancellation = CancellationToken::new();
        let mut service = RelayService::new(cancellation.clone());
        service.spawn("idle", Idle(cancellation.clone()));
        cancellation.cancel();
        service.run().await.unwrap();
    }
}
