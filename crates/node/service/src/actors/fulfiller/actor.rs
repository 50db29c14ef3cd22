//! [`RelayActor`] implementation that answers logged storage proof requests.

use crate::{
    BridgeContract, FulfillerError, Metrics, RelayActor, SourceChain, SourceError, retry_transient,
};
use alloy_primitives::B256;
use async_trait::async_trait;
use std::{slice, sync::Arc};
use strait_contract::{Bridge, LoggedRequest};
use strait_poller::{EventLog, EventPoller, LogFilter, PollerError};
use tokio::select;
use tokio_util::sync::CancellationToken;

/// What became of one logged request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fulfillment {
    /// A proof was submitted with `verify`.
    Submitted {
        /// The `verify` transaction hash.
        tx_hash: B256,
    },
    /// The source chain could not produce a proof. The request stays pending.
    Unavailable,
    /// The contract reverted the `verify`, as the request was already resolved.
    AlreadyResolved,
}

/// Watches the bridge contract for logged requests and answers each with a storage proof.
///
/// Requests are handled one at a time, in log order. The contract judges every submitted proof;
/// the fulfiller never inspects the result. Any number of fulfillers may run against the same
/// contract: a `verify` refused because another fulfiller won the race is not an error.
#[derive(Debug)]
pub struct ProofFulfiller<S, B, L> {
    /// The source chain.
    source: Arc<S>,
    /// The bridge contract.
    bridge: Arc<B>,
    /// The poller over the bridge contract's event log.
    poller: EventPoller<L>,
    /// The cancellation token, shared between all tasks.
    cancellation: CancellationToken,
}

impl<S, B, L> ProofFulfiller<S, B, L>
where
    S: SourceChain,
    B: BridgeContract,
    L: EventLog,
{
    /// Creates a new [`ProofFulfiller`].
    pub const fn new(
        source: Arc<S>,
        bridge: Arc<B>,
        poller: EventPoller<L>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { source, bridge, poller, cancellation }
    }

    /// Fetches the proof for `request` and submits it.
    pub async fn fulfill(&self, request: &LoggedRequest) -> Result<Fulfillment, FulfillerError> {
        let slot = B256::from(request.key);
        let proof = retry_transient("eth_getProof", || {
            self.source.storage_proof(request.account, slot, request.block_id)
        })
        .await;

        let bundle = match proof {
            Ok(proof) => proof.into_bundle(request.key),
            Err(SourceError::ProofUnavailable { reason, .. }) => {
                warn!(
                    target: "proof_fulfiller",
                    request_id = %request.id,
                    account = %request.account,
                    block_id = request.block_id,
                    %reason,
                    "No proof available, leaving request pending"
                );
                Metrics::record_proof_unavailable();
                return Ok(Fulfillment::Unavailable);
            }
            Err(err) => return Err(err.into()),
        };

        let verified = retry_transient("verify", || {
            self.bridge.verify(request.id, bundle.clone(), request.block_id)
        })
        .await;

        match verified {
            Ok(inclusion) => {
                Metrics::record_proof_submitted();
                info!(
                    target: "proof_fulfiller",
                    request_id = %request.id,
                    tx_hash = %inclusion.tx_hash,
                    gas_used = inclusion.gas_used,
                    "Proof submitted"
                );
                Ok(Fulfillment::Submitted { tx_hash: inclusion.tx_hash })
            }
            Err(err) if err.is_revert() => {
                info!(
                    target: "proof_fulfiller",
                    request_id = %request.id,
                    %err,
                    "Proof refused, request already resolved"
                );
                Ok(Fulfillment::AlreadyResolved)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn handle(&self, log: &alloy_rpc_types_eth::Log) {
        let request = match LoggedRequest::from_log(log) {
            Ok(request) => request,
            Err(err) => {
                warn!(target: "proof_fulfiller", %err, "Skipping undecodable request log");
                return;
            }
        };

        debug!(
            target: "proof_fulfiller",
            request_id = %request.id,
            account = %request.account,
            key = %request.key,
            block_id = request.block_id,
            "Request logged"
        );

        if let Err(err) = self.fulfill(&request).await {
            Metrics::record_request_dropped(err.kind());
            warn!(
                target: "proof_fulfiller",
                request_id = %request.id,
                kind = err.kind(),
                %err,
                "Failed to fulfil request, dropping it"
            );
        }
    }
}

#[async_trait]
impl<S, B, L> RelayActor for ProofFulfiller<S, B, L>
where
    S: SourceChain + 'static,
    B: BridgeContract + 'static,
    L: EventLog + 'static,
{
    type Error = FulfillerError;

    async fn start(self) -> Result<(), Self::Error> {
        let filter = LogFilter::event::<Bridge::RequestLogged>(self.bridge.address());
        let requests = self.poller.subscribe(filter).await?;

        info!(
            target: "proof_fulfiller",
            bridge = %self.bridge.address(),
            poll_interval = ?self.poller.poll_interval(),
            "Starting proof fulfiller"
        );

        let result = 'watch: loop {
            let ready = match self
                .poller
                .wait_for_any(slice::from_ref(&requests), &self.cancellation, None)
                .await
            {
                Ok(ready) => ready,
                Err(PollerError::Cancelled) => break Ok(()),
                Err(err) => {
                    error!(target: "proof_fulfiller", %err, "Proof fulfiller stopped");
                    break Err(err.into());
                }
            };

            for event in ready.iter().flat_map(|batch| &batch.events) {
                let cancelled = select! {
                    biased;

                    _ = self.cancellation.cancelled() => true,
                    _ = self.handle(&event.log) => false,
                };
                if cancelled {
                    break 'watch Ok(());
                }
            }
        };

        if let Err(err) = self.poller.unsubscribe(requests).await {
            debug!(target: "proof_fulfiller", %err, "Failed to remove request filter");
        }
        info!(target: "proof_fulfiller", "Proof fulfiller exited");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ContractError, MockBridgeContract, MockSourceChain,
        test_utils::{FakeBridge, FakeSource, Verdict},
    };
    use alloy_primitives::{Address, Bytes, U256};
    use alloy_transport::TransportErrorKind;
    use strait_contract::RequestStatus;
    use std::time::Duration;
    use strait_poller::MemoryEventLog;

    const ACCOUNT: Address = Address::repeat_byte(0xaa);

    fn request(id: u64, block_id: u64) -> LoggedRequest {
        LoggedRequest { id: U256::from(id), account: ACCOUNT, key: U256::from(7), block_id }
    }

    fn poller(log: Arc<MemoryEventLog>) -> EventPoller<MemoryEventLog> {
        EventPoller::new(log, Duration::from_secs(3))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fulfill_submits_padded_proof() {
        let source = Arc::new(FakeSource::new());
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));
        bridge.set_verdict(Verdict::Serve(Bytes::from_static(&[1])));
        let (id, _) = bridge.log_request(ACCOUNT, U256::from(7), 100);

        let fulfiller = ProofFulfiller::new(
            source,
            Arc::clone(&bridge),
            poller(bridge.event_log()),
            CancellationToken::new(),
        );
        let outcome = fulfiller.fulfill(&request(id.to(), 100)).await.unwrap();
        assert!(matches!(outcome, Fulfillment::Submitted { .. }));

        let calls = bridge.verify_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].bundle.storage_key, B256::from(U256::from(7)));
        assert_eq!(calls[0].bundle.address, ACCOUNT);
        assert_eq!(bridge.request_status(id), Some(RequestStatus::Served));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fulfill_leaves_pruned_request_pending() {
        let source = Arc::new(FakeSource::new());
        source.prune(100);
        let mut bridge = MockBridgeContract::new();
        bridge.expect_verify().never();

        let fulfiller = ProofFulfiller::new(
            source,
            Arc::new(bridge),
            poller(Arc::new(MemoryEventLog::new())),
            CancellationToken::new(),
        );
        let outcome = fulfiller.fulfill(&request(0, 100)).await.unwrap();
        assert_eq!(outcome, Fulfillment::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_fulfilment_is_tolerated() {
        let source = Arc::new(FakeSource::new());
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));
        let (id, _) = bridge.log_request(ACCOUNT, U256::from(7), 100);

        let fulfiller = ProofFulfiller::new(
            source,
            Arc::clone(&bridge),
            poller(bridge.event_log()),
            CancellationToken::new(),
        );
        let request = request(id.to(), 100);
        assert!(matches!(fulfiller.fulfill(&request).await.unwrap(), Fulfillment::Submitted { .. }));
        assert_eq!(fulfiller.fulfill(&request).await.unwrap(), Fulfillment::AlreadyResolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_verify_is_an_error() {
        let source = Arc::new(FakeSource::new());
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));

        let fulfiller = ProofFulfiller::new(
            source,
            Arc::clone(&bridge),
            poller(bridge.event_log()),
            CancellationToken::new(),
        );
        let err = fulfiller.fulfill(&request(9, 100)).await.unwrap_err();
        assert!(matches!(err, FulfillerError::Contract(ContractError::Rejected { .. })));
        assert_eq!(err.kind(), "contract");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unfunded_sender_is_not_a_lost_race() {
        let mut source = MockSourceChain::new();
        source.expect_storage_proof().returning(|_, _, _| Ok(Default::default()));
        let mut bridge = MockBridgeContract::new();
        bridge.expect_verify().times(1).returning(|_, _, _| {
            Err(ContractError::Rejected {
                call: "verify",
                reason: "insufficient funds for gas * price + value".to_string(),
            })
        });

        let fulfiller = ProofFulfiller::new(
            Arc::new(source),
            Arc::new(bridge),
            poller(Arc::new(MemoryEventLog::new())),
            CancellationToken::new(),
        );
        let err = fulfiller.fulfill(&request(0, 100)).await.unwrap_err();
        assert!(matches!(err, FulfillerError::Contract(ContractError::Rejected { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execution_revert_at_send_is_a_lost_race() {
        let mut source = MockSourceChain::new();
        source.expect_storage_proof().returning(|_, _, _| Ok(Default::default()));
        let mut bridge = MockBridgeContract::new();
        bridge.expect_verify().times(1).returning(|_, _, _| {
            Err(ContractError::Rejected {
                call: "verify",
                reason: "execution reverted: request already resolved".to_string(),
            })
        });

        let fulfiller = ProofFulfiller::new(
            Arc::new(source),
            Arc::new(bridge),
            poller(Arc::new(MemoryEventLog::new())),
            CancellationToken::new(),
        );
        assert_eq!(fulfiller.fulfill(&request(0, 100)).await.unwrap(), Fulfillment::AlreadyResolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_pending_verify() {
        let source = Arc::new(FakeSource::new());
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));
        bridge.stall_transactions();
        let cancellation = CancellationToken::new();

        let fulfiller = ProofFulfiller::new(
            source,
            Arc::clone(&bridge),
            poller(bridge.event_log()),
            cancellation.clone(),
        );
        let handle = tokio::spawn(fulfiller.start());
        tokio::time::sleep(Duration::from_secs(1)).await;

        bridge.log_request(ACCOUNT, U256::from(1), 10);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!handle.is_finished());

        cancellation.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap().unwrap();
        assert_eq!(bridge.event_log().installed_filters(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_surface_after_retries() {
        let mut source = MockSourceChain::new();
        source.expect_storage_proof().returning(|_, _, _| Ok(Default::default()));
        let mut bridge = MockBridgeContract::new();
        bridge
            .expect_verify()
            .times(6)
            .returning(|_, _, _| Err(ContractError::Rpc(TransportErrorKind::custom_str("reset"))));

        let fulfiller = ProofFulfiller::new(
            Arc::new(source),
            Arc::new(bridge),
            poller(Arc::new(MemoryEventLog::new())),
            CancellationToken::new(),
        );
        let err = fulfiller.fulfill(&request(0, 100)).await.unwrap_err();
        assert!(matches!(err, FulfillerError::Contract(ContractError::Rpc(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_answers_requests_in_order() {
        let source = Arc::new(FakeSource::new());
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));
        let cancellation = CancellationToken::new();

        let fulfiller = ProofFulfiller::new(
            source,
            Arc::clone(&bridge),
            poller(bridge.event_log()),
            cancellation.clone(),
        );
        let handle = tokio::spawn(fulfiller.start());
        tokio::time::sleep(Duration::from_secs(1)).await;

        bridge.log_request(ACCOUNT, U256::from(1), 10);
        bridge.log_request(ACCOUNT, U256::from(2), 11);
        tokio::time::sleep(Duration::from_secs(10)).await;

        let ids: Vec<_> = bridge.verify_calls().iter().map(|call| call.request_id).collect();
        assert_eq!(ids, vec![U256::from(0), U256::from(1)]);

        cancellation.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(bridge.event_log().installed_filters(), 0);
    }
}
