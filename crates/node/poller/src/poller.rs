//! The [`EventPoller`].

use crate::{Event, EventLog, LogFilter, PollerError, ReadyBatch, Subscription};
use std::{sync::Arc, time::Duration};
use tokio::{
    select,
    time::{Instant, MissedTickBehavior, interval, sleep_until},
};
use tokio_util::sync::CancellationToken;

/// Polls subscriptions over an [`EventLog`] at a fixed interval.
#[derive(Debug)]
pub struct EventPoller<L> {
    log: Arc<L>,
    poll_interval: Duration,
    max_consecutive_failures: usize,
}

impl<L> Clone for EventPoller<L> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            poll_interval: self.poll_interval,
            max_consecutive_failures: self.max_consecutive_failures,
        }
    }
}

impl<L: EventLog> EventPoller<L> {
    /// The default interval between two polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

    /// The default number of consecutive transient poll failures tolerated by
    /// [`EventPoller::wait_for_any`].
    pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: usize = 5;

    /// Creates a new [`EventPoller`] over `log`.
    pub const fn new(log: Arc<L>, poll_interval: Duration) -> Self {
        Self { log, poll_interval, max_consecutive_failures: Self::DEFAULT_MAX_CONSECUTIVE_FAILURES }
    }

    /// Sets the number of consecutive transient poll failures tolerated while waiting.
    pub const fn with_max_consecutive_failures(mut self, max: usize) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    /// Returns the poll interval.
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the underlying [`EventLog`].
    pub const fn event_log(&self) -> &Arc<L> {
        &self.log
    }

    /// Installs a filter for `filter`. The subscription sees every matching entry appended after
    /// this call returns.
    pub async fn subscribe(&self, filter: LogFilter) -> Result<Subscription, PollerError> {
        let id = self.log.install_filter(&filter).await?;
        debug!(target: "event_poller", event = filter.name, %id, "Installed log filter");
        Ok(Subscription::new(filter, id))
    }

    /// Removes the node-side filter of `subscription`.
    pub async fn unsubscribe(&self, subscription: Subscription) -> Result<(), PollerError> {
        let id = subscription.id();
        if !self.log.uninstall_filter(id).await? {
            debug!(target: "event_poller", event = subscription.name(), %id, "Filter already gone");
        }
        Ok(())
    }

    /// Drains every subscription once, in order, and returns the non-empty batches.
    ///
    /// A transient error on one subscription is logged and skipped if another subscription is
    /// ready. A filter the node no longer knows is always returned as an error, as events for it
    /// may have been lost.
    pub async fn poll(&self, subscriptions: &[Subscription]) -> Result<Vec<ReadyBatch>, PollerError> {
        let mut ready = Vec::new();
        let mut first_error = None;

        for (index, subscription) in subscriptions.iter().enumerate() {
            let logs = match self.log.filter_changes(subscription.id()).await {
                Ok(logs) => logs,
                Err(err) => {
                    warn!(
                        target: "event_poller",
                        event = subscription.name(),
                        %err,
                        "Failed to poll subscription"
                    );
                    if !err.is_transient() {
                        return Err(err);
                    }
                    first_error.get_or_insert(err);
                    continue;
                }
            };

            let events: Vec<_> = logs
                .into_iter()
                .filter(|log| subscription.accepts(log))
                .map(|log| Event::new(subscription.name(), log))
                .collect();
            if !events.is_empty() {
                ready.push(ReadyBatch { index, name: subscription.name(), events });
            }
        }

        match first_error {
            Some(err) if ready.is_empty() => Err(err),
            _ => Ok(ready),
        }
    }

    /// Polls `subscriptions` every poll interval until at least one yields events.
    ///
    /// The first poll happens immediately. Returns [`PollerError::Cancelled`] once `cancellation`
    /// fires and [`PollerError::DeadlineElapsed`] once `deadline` passes. Transient poll failures
    /// are retried on the next tick until more than the configured number occur in a row.
    pub async fn wait_for_any(
        &self,
        subscriptions: &[Subscription],
        cancellation: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<Vec<ReadyBatch>, PollerError> {
        if subscriptions.is_empty() {
            return Err(PollerError::NoSubscriptions);
        }

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures = 0usize;

        loop {
            select! {
                biased;

                _ = cancellation.cancelled() => return Err(PollerError::Cancelled),
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    return Err(PollerError::DeadlineElapsed);
                }
                _ = ticker.tick() => {
                    match self.poll(subscriptions).await {
                        Ok(ready) if !ready.is_empty() => return Ok(ready),
                        Ok(_) => failures = 0,
                        Err(err) if err.is_transient() && failures < self.max_consecutive_failures => {
                            failures += 1;
                            warn!(
                                target: "event_poller",
                                %err,
                                failures,
                                "Transient poll failure, retrying on next tick"
                            );
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }
    }
}
