//! [`RelayActor`] implementation that mirrors source chain heads onto the bridge contract.

use crate::{
    BridgeContract, Metrics, RelayActor, SourceChain, SourceError, WatcherError, retry_transient,
};
use async_trait::async_trait;
use std::{slice, sync::Arc, time::Duration};
use strait_codec::CanonicalHeader;
use strait_contract::{Bridge, confirmed_block_hash};
use strait_poller::{EventLog, EventPoller, LogFilter, PollerError, Subscription};
use tokio::{select, time::sleep};
use tokio_util::sync::CancellationToken;

/// A header stored with `saveBlock` and not confirmed yet.
#[derive(Debug, Clone)]
struct PendingHeader {
    height: u64,
    header: CanonicalHeader,
}

/// Keeps the bridge contract's header chain in step with the source chain head.
///
/// Each cycle reads the source head. When it differs from the last relayed height, the head
/// header is encoded, stored with `saveBlock` and the watcher blocks until the contract confirms
/// it with `NewBlockAdded`. Heights passed while a header is in flight are skipped, so the
/// contract samples the source chain rather than storing every header.
///
/// At most one `saveBlock` is unconfirmed at any time. If waiting for a confirmation fails, later
/// cycles resume the wait for the same header instead of storing another one.
#[derive(Debug)]
pub struct ChainWatcher<S, B, L> {
    /// The source chain.
    source: Arc<S>,
    /// The bridge contract.
    bridge: Arc<B>,
    /// The poller over the bridge contract's event log.
    poller: EventPoller<L>,
    /// The pause after a confirmed header.
    cool_down: Duration,
    /// The height of the last confirmed header.
    last_relayed: Option<u64>,
    /// The submitted header awaiting its confirmation.
    pending: Option<PendingHeader>,
    /// The cancellation token, shared between all tasks.
    cancellation: CancellationToken,
}

impl<S, B, L> ChainWatcher<S, B, L>
where
    S: SourceChain,
    B: BridgeContract,
    L: EventLog,
{
    /// The default pause after a confirmed header.
    pub const DEFAULT_COOL_DOWN: Duration = Duration::from_secs(5);

    /// Creates a new [`ChainWatcher`]. The source head is polled at the poller's interval.
    pub const fn new(
        source: Arc<S>,
        bridge: Arc<B>,
        poller: EventPoller<L>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            source,
            bridge,
            poller,
            cool_down: Self::DEFAULT_COOL_DOWN,
            last_relayed: None,
            pending: None,
            cancellation,
        }
    }

    /// Sets the pause after a confirmed header.
    pub const fn with_cool_down(mut self, cool_down: Duration) -> Self {
        self.cool_down = cool_down;
        self
    }

    /// Treats `height` as already relayed.
    pub const fn resume_from(mut self, height: u64) -> Self {
        self.last_relayed = Some(height);
        self
    }

    /// Returns the height of the last confirmed header.
    pub const fn last_relayed(&self) -> Option<u64> {
        self.last_relayed
    }

    /// Returns the height of the submitted header awaiting confirmation, if any.
    pub fn pending_height(&self) -> Option<u64> {
        self.pending.as_ref().map(|pending| pending.height)
    }

    /// Subscribes to the contract's header confirmations.
    pub async fn subscribe(&self) -> Result<Subscription, WatcherError> {
        let filter = LogFilter::event::<Bridge::NewBlockAdded>(self.bridge.address());
        Ok(self.poller.subscribe(filter).await?)
    }

    /// Runs one cycle. Returns the relayed height, or `None` if there was nothing to relay.
    ///
    /// `confirmations` must be a subscription created by [`ChainWatcher::subscribe`] before the
    /// call. It is replaced if the node dropped its filter.
    pub async fn tick(
        &mut self,
        confirmations: &mut Subscription,
    ) -> Result<Option<u64>, WatcherError> {
        let pending = match self.pending.clone() {
            Some(pending) => {
                debug!(
                    target: "chain_watcher",
                    block_number = pending.height,
                    "Resuming wait for an unconfirmed header"
                );
                pending
            }
            None => match self.submit_head().await? {
                Some(pending) => pending,
                None => return Ok(None),
            },
        };

        self.await_confirmation(confirmations, &pending.header).await?;

        self.pending = None;
        self.last_relayed = Some(pending.height);
        Metrics::record_header_relayed(pending.height);
        info!(
            target: "chain_watcher",
            block_number = pending.height,
            block_hash = %pending.header.block_hash,
            "Header relayed"
        );
        Ok(Some(pending.height))
    }

    /// Stores the source head header if it was not relayed yet, and records it as pending.
    async fn submit_head(&mut self) -> Result<Option<PendingHeader>, WatcherError> {
        let head = retry_transient("eth_blockNumber", || self.source.block_number()).await?;
        if self.last_relayed == Some(head) {
            trace!(target: "chain_watcher", head, "Source head unchanged");
            return Ok(None);
        }

        let raw = match retry_transient("eth_getBlockByNumber", || self.source.raw_header(head)).await
        {
            Ok(raw) => raw,
            Err(SourceError::NotFound(number)) => {
                debug!(target: "chain_watcher", block_number = number, "Head not served yet");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let header = CanonicalHeader::encode(&raw)?;
        if !header.hash_matches() {
            warn!(
                target: "chain_watcher",
                block_number = head,
                block_hash = %header.block_hash,
                content_hash = %header.content_hash(),
                "Canonical encoding does not hash to the block hash"
            );
        }

        let inclusion = self.bridge.save_block(&header).await?;
        debug!(
            target: "chain_watcher",
            block_number = head,
            tx_hash = %inclusion.tx_hash,
            "Header submitted, awaiting confirmation"
        );

        let pending = PendingHeader { height: head, header };
        self.pending = Some(pending.clone());
        Ok(Some(pending))
    }

    async fn await_confirmation(
        &self,
        confirmations: &mut Subscription,
        header: &CanonicalHeader,
    ) -> Result<(), WatcherError> {
        loop {
            let waited = self
                .poller
                .wait_for_any(slice::from_ref(&*confirmations), &self.cancellation, None)
                .await;
            let ready = match waited {
                Ok(ready) => ready,
                Err(PollerError::UnknownFilter(id)) => {
                    warn!(
                        target: "chain_watcher",
                        %id,
                        block_hash = %header.block_hash,
                        "Confirmation filter dropped by the node, subscribing again"
                    );
                    *confirmations = self.subscribe().await?;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            // Undecodable entries still match the filter, they count as a confirmation.
            let confirmed = ready.iter().flat_map(|batch| &batch.events).any(|event| {
                confirmed_block_hash(&event.log).ok().is_none_or(|hash| hash == header.block_hash)
            });
            if confirmed {
                return Ok(());
            }
        }
    }

    /// Sleeps for `duration`. Returns `false` if cancelled first.
    async fn pause(&self, duration: Duration) -> bool {
        select! {
            _ = self.cancellation.cancelled() => false,
            _ = sleep(duration) => true,
        }
    }
}

#[async_trait]
impl<S, B, L> RelayActor for ChainWatcher<S, B, L>
where
    S: SourceChain + 'static,
    B: BridgeContract + 'static,
    L: EventLog + 'static,
{
    type Error = WatcherError;

    async fn start(mut self) -> Result<(), Self::Error> {
        let mut confirmations = self.subscribe().await?;
        let poll_interval = self.poller.poll_interval();

        info!(
            target: "chain_watcher",
            bridge = %self.bridge.address(),
            poll_interval = ?poll_interval,
            cool_down = ?self.cool_down,
            "Starting chain watcher"
        );

        let result = loop {
            let cancellation = self.cancellation.clone();
            let outcome = select! {
                biased;

                _ = cancellation.cancelled() => break Ok(()),
                outcome = self.tick(&mut confirmations) => outcome,
            };

            let pause = match outcome {
                Ok(Some(_)) => self.cool_down,
                Ok(None) => poll_interval,
                Err(err) if err.is_cancelled() => break Ok(()),
                Err(err) if err.is_fatal() => {
                    error!(target: "chain_watcher", %err, "Chain watcher stopped");
                    break Err(err);
                }
                Err(err) => {
                    warn!(
                        target: "chain_watcher",
                        %err,
                        pending = ?self.pending_height(),
                        "Relay cycle failed, will retry"
                    );
                    poll_interval
                }
            };

            if !self.pause(pause).await {
                break Ok(());
            }
        };

        if let Err(err) = self.poller.unsubscribe(confirmations).await {
            debug!(target: "chain_watcher", %err, "Failed to remove confirmation filter");
        }
        info!(target: "chain_watcher", last_relayed = ?self.last_relayed, "Chain watcher exited");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ContractError, MockBridgeContract, MockSourceChain,
        test_utils::{FakeBridge, FakeSource, legacy_header},
    };
    use alloy_primitives::{Address, U256};
    use strait_codec::RawBlockHeader;
    use strait_poller::MemoryEventLog;

    fn watcher(
        source: &Arc<FakeSource>,
        bridge: &Arc<FakeBridge>,
    ) -> ChainWatcher<FakeSource, FakeBridge, MemoryEventLog> {
        let poller = EventPoller::new(bridge.event_log(), Duration::from_secs(3));
        ChainWatcher::new(Arc::clone(source), Arc::clone(bridge), poller, CancellationToken::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_relays_new_head() {
        let source = Arc::new(FakeSource::new());
        source.insert_header(legacy_header(7, 1, 21_000));
        source.set_head(7);
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));

        let mut watcher = watcher(&source, &bridge);
        let mut sub = watcher.subscribe().await.unwrap();
        assert_eq!(watcher.tick(&mut sub).await.unwrap(), Some(7));
        assert_eq!(watcher.last_relayed(), Some(7));
        assert_eq!(bridge.saved_headers().len(), 1);

        assert_eq!(watcher.tick(&mut sub).await.unwrap(), None);
        assert_eq!(bridge.saved_headers().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_skips_unserved_head() {
        let source = Arc::new(FakeSource::new());
        source.set_head(9);
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));

        let mut watcher = watcher(&source, &bridge);
        let mut sub = watcher.subscribe().await.unwrap();
        assert_eq!(watcher.tick(&mut sub).await.unwrap(), None);
        assert!(bridge.saved_headers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_rejects_unknown_layout() {
        let source = Arc::new(FakeSource::new());
        let mut raw = legacy_header(3, 0, 0);
        raw.attribute_count = 12;
        source.insert_header(raw);
        source.set_head(3);
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));

        let mut watcher = watcher(&source, &bridge);
        let mut sub = watcher.subscribe().await.unwrap();
        let err = watcher.tick(&mut sub).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(bridge.saved_headers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_save_block_stops_watcher() {
        let header: RawBlockHeader = legacy_header(5, 0, 0);
        let mut source = MockSourceChain::new();
        source.expect_block_number().returning(|| Ok(5));
        source.expect_raw_header().returning(move |_| Ok(header.clone()));

        let mut bridge = MockBridgeContract::new();
        bridge.expect_address().return_const(Address::repeat_byte(0xbb));
        bridge.expect_save_block().times(1).returning(|_| {
            Err(ContractError::Reverted { call: "saveBlock", tx_hash: Default::default() })
        });
        bridge.expect_verify().never();

        let log = Arc::new(MemoryEventLog::new());
        let watcher = ChainWatcher::new(
            Arc::new(source),
            Arc::new(bridge),
            EventPoller::new(log, Duration::from_secs(3)),
            CancellationToken::new(),
        );

        let err = watcher.start().await.unwrap_err();
        assert!(matches!(err, WatcherError::Contract(ContractError::Reverted { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unobserved_save_block_stops_watcher() {
        let header: RawBlockHeader = legacy_header(5, 0, 0);
        let mut source = MockSourceChain::new();
        source.expect_block_number().returning(|| Ok(5));
        source.expect_raw_header().returning(move |_| Ok(header.clone()));

        let mut bridge = MockBridgeContract::new();
        bridge.expect_address().return_const(Address::repeat_byte(0xbb));
        bridge.expect_save_block().times(1).returning(|_| {
            Err(ContractError::NotMined {
                call: "saveBlock",
                tx_hash: Default::default(),
                reason: "timed out".to_string(),
            })
        });

        let watcher = ChainWatcher::new(
            Arc::new(source),
            Arc::new(bridge),
            EventPoller::new(Arc::new(MemoryEventLog::new()), Duration::from_secs(3)),
            CancellationToken::new(),
        );

        let err = watcher.start().await.unwrap_err();
        assert!(matches!(err, WatcherError::Contract(ContractError::NotMined { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_wait_keeps_header_pending() {
        let source = Arc::new(FakeSource::new());
        source.insert_header(legacy_header(101, 0, 0));
        source.set_head(101);
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));
        bridge.hold_confirmations();

        let poller =
            EventPoller::new(bridge.event_log(), Duration::from_secs(3)).with_max_consecutive_failures(0);
        let mut watcher = ChainWatcher::new(
            Arc::clone(&source),
            Arc::clone(&bridge),
            poller,
            CancellationToken::new(),
        );
        let mut sub = watcher.subscribe().await.unwrap();

        bridge.event_log().fail_next_polls(1);
        let err = watcher.tick(&mut sub).await.unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(watcher.pending_height(), Some(101));
        assert_eq!(watcher.last_relayed(), None);

        bridge.confirm_pending();
        assert_eq!(watcher.tick(&mut sub).await.unwrap(), Some(101));
        assert_eq!(watcher.pending_height(), None);
        assert_eq!(bridge.saved_headers().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_confirmation_filter_is_replaced() {
        let source = Arc::new(FakeSource::new());
        source.insert_header(legacy_header(101, 0, 0));
        source.set_head(100);
        let bridge = Arc::new(FakeBridge::new(Address::repeat_byte(0xbb)));
        bridge.hold_confirmations();
        let log = bridge.event_log();

        let cancellation = CancellationToken::new();
        let watcher = ChainWatcher::new(
            Arc::clone(&source),
            Arc::clone(&bridge),
            EventPoller::new(Arc::clone(&log), Duration::from_secs(3)),
            cancellation.clone(),
        )
        .resume_from(100);
        let handle = tokio::spawn(watcher.start());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(log.uninstall_filter(U256::from(1)).await.unwrap());
        source.set_head(101);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(bridge.saved_headers().len(), 1, "one saveBlock while unconfirmed");
        assert_eq!(log.installed_filters(), 1);

        bridge.confirm_pending();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(bridge.saved_headers().len(), 1);

        cancellation.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(log.installed_filters(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_exits_on_cancellation() {
        let mut source = MockSourceChain::new();
        source.expect_block_number().returning(|| Ok(1));
        let mut bridge = MockBridgeContract::new();
        bridge.expect_address().return_const(Address::repeat_byte(0xbb));
        bridge.expect_save_block().never();

        let cancellation = CancellationToken::new();
        let log = Arc::new(MemoryEventLog::new());
        let watcher = ChainWatcher::new(
            Arc::new(source),
            Arc::new(bridge),
            EventPoller::new(Arc::clone(&log), Duration::from_secs(3)),
            cancellation.clone(),
        )
        .resume_from(1);

        let handle = tokio::spawn(watcher.start());
        tokio::time::sleep(Duration::from_secs(10)).await;
        cancellation.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(log.installed_filters(), 0);
    }
}
