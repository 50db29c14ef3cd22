//! # strait-service
//!
//! The off-chain roles of the strait bridge.
//!
//! - The [`ChainWatcher`] mirrors source chain heads onto the bridge contract, one header at a
//!   time.
//! - The [`ProofFulfiller`] answers logged storage proof requests with Merkle proofs fetched from
//!   the source chain.
//! - The [`RequestClient`] logs a request and blocks until the bridge contract resolves it.
//!
//! The roles share no in-memory state. They talk to the chains through the [`SourceChain`] and
//! [`BridgeContract`] handles, and to each other only through the bridge contract's event log.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

mod config;
pub use config::RelayConfig;

mod retry;
pub use retry::{Transient, retry_transient};

mod source;
pub use source::{AlloySource, SourceChain, SourceError, StorageProof};

mod bridge;
pub use bridge::{AlloyBridge, BridgeContract, ContractError, Inclusion};

mod actors;
pub use actors::{
    ChainWatcher, Fulfillment, FulfillerError, ProofFulfiller, RelayActor, WatcherError,
};

mod client;
pub use client::{Outcome, RequestClient, RequestClientError};

mod service;
pub use service::{RelayService, ServiceError};

mod metrics;
pub use metrics::Metrics;

#[cfg(test)]
pub use source::MockSourceChain;
#[cfg(test)]
pub use bridge::MockBridgeContract;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
