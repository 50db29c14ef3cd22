//! Subscriptions and the events they deliver.

use crate::{FilterId, LogFilter};
use alloy_rpc_types_eth::Log;
use std::{fmt::Debug, sync::Arc};

/// A client-side predicate applied to the entries drained from a [`Subscription`].
#[derive(Clone)]
pub struct ArgumentFilter(Arc<dyn Fn(&Log) -> bool + Send + Sync>);

impl ArgumentFilter {
    /// Creates a new [`ArgumentFilter`].
    pub fn new(predicate: impl Fn(&Log) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Returns `true` if `log` passes the predicate.
    pub fn matches(&self, log: &Log) -> bool {
        (self.0)(log)
    }
}

impl Debug for ArgumentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ArgumentFilter(..)")
    }
}

/// A log filter installed on the node, scoped to entries appended after its creation.
#[derive(Debug, Clone)]
pub struct Subscription {
    filter: LogFilter,
    id: FilterId,
    matcher: Option<ArgumentFilter>,
}

impl Subscription {
    pub(crate) const fn new(filter: LogFilter, id: FilterId) -> Self {
        Self { filter, id, matcher: None }
    }

    /// Returns the id of the node-side filter.
    pub const fn id(&self) -> FilterId {
        self.id
    }

    /// Returns the name of the subscribed event.
    pub const fn name(&self) -> &'static str {
        self.filter.name
    }

    /// Returns the installed [`LogFilter`].
    pub const fn filter(&self) -> &LogFilter {
        &self.filter
    }

    /// Narrows the subscription with an [`ArgumentFilter`].
    pub fn with_matcher(mut self, matcher: ArgumentFilter) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Replaces the [`ArgumentFilter`] of an existing subscription. Entries drained before the
    /// call are unaffected.
    pub fn set_matcher(&mut self, matcher: ArgumentFilter) {
        self.matcher = Some(matcher);
    }

    /// Returns `true` if `log` belongs to this subscription and passes its matcher.
    pub fn accepts(&self, log: &Log) -> bool {
        self.filter.matches(log) && self.matcher.as_ref().is_none_or(|m| m.matches(log))
    }
}

/// A log entry delivered by a [`Subscription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The name of the event.
    pub name: &'static str,
    /// The block the entry was appended in, if known.
    pub block_number: Option<u64>,
    /// The raw log.
    pub log: Log,
}

impl Event {
    pub(crate) fn new(name: &'static str, log: Log) -> Self {
        Self { name, block_number: log.block_number, log }
    }
}

/// The events drained from one subscription during a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyBatch {
    /// The position of the subscription in the polled slice.
    pub index: usize,
    /// The name of the subscribed event.
    pub name: &'static str,
    /// The drained events, in log order.
    pub events: Vec<Event>,
}
