//! # strait-contract
//!
//! ABI bindings and value types for the bridge contract deployed on the destination chain.
//!
//! The contract itself is opaque to the relayer: only its call and event surface is bound here.
//!
//! - [`Bridge::saveBlockCall`] stores a [`CanonicalHeader`](strait_codec::CanonicalHeader) and
//!   emits [`Bridge::NewBlockAdded`].
//! - [`Bridge::requestCall`] logs a storage proof request and emits [`Bridge::RequestLogged`].
//! - [`Bridge::verifyCall`] submits a [`ProofBundle`] and emits either [`Bridge::RequestServed`]
//!   or [`Bridge::BlockNotFound`].
//! - [`Bridge::getTotalCall`] reads the monotonic request counter.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod bindings;
pub use bindings::Bridge;

mod calls;
pub use calls::{
    decode_total, get_total_input, request_input, save_block_input, verify_input,
};

mod events;
pub use events::{LoggedRequest, ServedRequest, confirmed_block_hash};

mod proof;
pub use proof::{ProofBundle, RequestStatus};
