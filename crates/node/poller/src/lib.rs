//! # strait-poller
//!
//! Turns an append-only, filterable event log into a blocking "wait for the next matching event"
//! operation.
//!
//! A [`Subscription`] is an installed node-side log filter scoped to start at the latest block
//! when it is created, optionally narrowed by a client-side [`ArgumentFilter`]. The
//! [`EventPoller`] polls a set of subscriptions at a fixed interval and returns as soon as any of
//! them yields events. The node buffers new entries between polls, so nothing emitted after a
//! subscription is created is lost, and entries of one subscription are delivered in log order.
//!
//! Waiting is cancellable through a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! and can be bounded with a deadline.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

mod error;
pub use error::PollerError;

mod event_log;
pub use event_log::{EventLog, FilterId, LogFilter, ProviderEventLog};

mod subscription;
pub use subscription::{ArgumentFilter, Event, ReadyBatch, Subscription};

mod poller;
pub use poller::EventPoller;

#[cfg(any(test, feature = "test-utils"))]
mod memory;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryEventLog;
