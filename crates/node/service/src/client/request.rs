//! Submits storage proof requests and waits for their resolution.

use crate::{BridgeContract, Inclusion, Metrics, RequestClientError, retry_transient};
use alloy_primitives::{Address, Bytes, U256};
use std::{sync::Arc, time::Duration};
use strait_contract::{Bridge, LoggedRequest, RequestStatus, ServedRequest};
use strait_poller::{
    ArgumentFilter, EventLog, EventPoller, LogFilter, PollerError, ReadyBatch, Subscription,
};
use tokio::{
    select,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;

/// The resolution of a storage proof request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The contract verified a proof for the request.
    Served {
        /// The request id.
        request_id: U256,
        /// The verification result reported by the contract.
        result: Bytes,
    },
    /// The contract reported that the proof referenced a block it does not store.
    NotFound {
        /// The request id.
        request_id: U256,
    },
}

impl Outcome {
    /// Returns the id of the resolved request.
    pub const fn request_id(&self) -> U256 {
        match self {
            Self::Served { request_id, .. } | Self::NotFound { request_id } => *request_id,
        }
    }

    /// Returns the terminal [`RequestStatus`] of the request.
    pub const fn status(&self) -> RequestStatus {
        match self {
            Self::Served { .. } => RequestStatus::Served,
            Self::NotFound { .. } => RequestStatus::NotFound,
        }
    }
}

/// Logs storage proof requests on the bridge contract and blocks until they are resolved.
#[derive(Debug)]
pub struct RequestClient<B, L> {
    /// The bridge contract.
    bridge: Arc<B>,
    /// The poller over the bridge contract's event log.
    poller: EventPoller<L>,
    /// Cancels pending waits.
    cancellation: CancellationToken,
}

impl<B, L> RequestClient<B, L>
where
    B: BridgeContract,
    L: EventLog,
{
    /// Creates a new [`RequestClient`].
    pub const fn new(bridge: Arc<B>, poller: EventPoller<L>, cancellation: CancellationToken) -> Self {
        Self { bridge, poller, cancellation }
    }

    /// Requests a proof of the storage slot `key` of `account` at source block `block_id` and
    /// waits until the contract resolves it, or until `timeout` elapses.
    ///
    /// Both the inclusion of the request transaction and the wait for its resolution stop when
    /// the client is cancelled or the deadline passes.
    ///
    /// The outcome subscriptions are created before the request is sent, so a resolution landing
    /// right after inclusion is not missed. `BlockNotFound` carries no request id: any such event
    /// seen while waiting resolves the request as [`Outcome::NotFound`].
    pub async fn submit(
        &self,
        account: Address,
        key: U256,
        block_id: u64,
        timeout: Option<Duration>,
    ) -> Result<Outcome, RequestClientError> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let address = self.bridge.address();

        let served = self.poller.subscribe(LogFilter::event::<Bridge::RequestServed>(address)).await?;
        let not_found =
            match self.poller.subscribe(LogFilter::event::<Bridge::BlockNotFound>(address)).await {
                Ok(sub) => sub,
                Err(err) => {
                    self.release(served).await;
                    return Err(err.into());
                }
            };

        let mut subscriptions = [served, not_found];
        let outcome = self.request_and_wait(&mut subscriptions, account, key, block_id, deadline).await;

        let [served, not_found] = subscriptions;
        self.release(served).await;
        self.release(not_found).await;

        if let Ok(outcome) = &outcome {
            Metrics::record_request_resolved(match outcome {
                Outcome::Served { .. } => "served",
                Outcome::NotFound { .. } => "not_found",
            });
        }
        outcome
    }

    async fn request_and_wait(
        &self,
        subscriptions: &mut [Subscription; 2],
        account: Address,
        key: U256,
        block_id: u64,
        deadline: Option<Instant>,
    ) -> Result<Outcome, RequestClientError> {
        let inclusion = select! {
            biased;

            _ = self.cancellation.cancelled() => return Err(RequestClientError::Cancelled),
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                return Err(RequestClientError::NotIncluded);
            }
            inclusion = self.bridge.request(account, key, block_id) => inclusion?,
        };
        let request_id = self.request_id(&inclusion).await?;
        info!(
            target: "request_client",
            request_id = %request_id,
            %account,
            %key,
            block_id,
            tx_hash = %inclusion.tx_hash,
            "Request logged, waiting for resolution"
        );

        subscriptions[0].set_matcher(ArgumentFilter::new(move |log| {
            ServedRequest::from_log(log).is_ok_and(|served| served.request_id == request_id)
        }));

        let ready = match self.poller.wait_for_any(&subscriptions[..], &self.cancellation, deadline).await
        {
            Ok(ready) => ready,
            Err(PollerError::DeadlineElapsed) => {
                return Err(RequestClientError::TimedOut { request_id });
            }
            Err(PollerError::Cancelled) => return Err(RequestClientError::Cancelled),
            Err(err) => return Err(err.into()),
        };

        Ok(Self::resolve(request_id, ready))
    }

    /// Reads the id the contract assigned to the request included by `inclusion`.
    ///
    /// The id is taken from the `RequestLogged` entry of the receipt. Without one, it is derived
    /// from the request counter, which is only correct if no other request was logged since.
    async fn request_id(&self, inclusion: &Inclusion) -> Result<U256, RequestClientError> {
        let address = self.bridge.address();
        let logged = inclusion
            .logs
            .iter()
            .filter(|log| log.inner.address == address)
            .find_map(|log| LoggedRequest::from_log(log).ok());
        if let Some(logged) = logged {
            return Ok(logged.id);
        }

        let total = retry_transient("getTotal", || self.bridge.total_requests()).await?;
        warn!(
            target: "request_client",
            %total,
            tx_hash = %inclusion.tx_hash,
            "Receipt carries no RequestLogged entry, deriving the id from the request counter"
        );
        total.checked_sub(U256::from(1)).ok_or(RequestClientError::CounterUnderflow)
    }

    /// Picks the outcome from the ready batches. Batches are ordered like the subscriptions, so a
    /// success seen in the same poll as a `BlockNotFound` wins.
    fn resolve(request_id: U256, ready: Vec<ReadyBatch>) -> Outcome {
        for batch in ready {
            let Some(event) = batch.events.into_iter().next() else { continue };
            if batch.index == 0 {
                if let Ok(served) = ServedRequest::from_log(&event.log) {
                    return Outcome::Served { request_id, result: served.result };
                }
            } else {
                return Outcome::NotFound { request_id };
            }
        }
        // Batch 0 only holds entries accepted by the id matcher.
        Outcome::NotFound { request_id }
    }

    async fn release(&self, subscription: Subscription) {
        if let Err(err) = self.poller.unsubscribe(subscription).await {
            debug!(target: "request_client", %err, "Failed to remove outcome filter");
        }
    }
}
