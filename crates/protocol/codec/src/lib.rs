//! # strait-codec
//!
//! Canonical encoding of source chain block headers.
//!
//! The bridge contract on the destination chain stores block headers as a pair of the source
//! chain's block hash and an RLP list of the header fields. This crate turns a block record
//! fetched over JSON-RPC ([`RawBlockHeader`]) into that pair ([`CanonicalHeader`]).
//!
//! The encoding is a pure function of the header fields:
//!
//! - The [`HeaderSchema`] is selected from the attribute count of the fetched block record. A
//!   record with exactly 20 attributes predates the base fee and encodes 15 fields, anything larger
//!   encodes 16 fields with the base fee appended.
//! - Integer fields are serialized as minimal big-endian bytes.
//! - Any field serializing to `0x00` or `0x0000` is replaced by the empty byte string, so that zero
//!   is encoded as "no bytes".
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::CodecError;

mod schema;
pub use schema::HeaderSchema;

mod raw;
pub use raw::RawBlockHeader;

mod canonical;
pub use canonical::{CanonicalHeader, header_fields, normalize_field};
