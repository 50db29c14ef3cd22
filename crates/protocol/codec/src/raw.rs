//! The block record fetched from the source chain.

use crate::{CodecError, HeaderSchema};
use alloy_consensus::Header;
use alloy_primitives::B256;
use serde_json::{Map, Value};

/// A source chain block header as returned by `eth_getBlockByNumber`.
///
/// Besides the consensus header fields, the record keeps the block hash reported by the source
/// chain and the number of attributes the JSON block object carried, which drives
/// [`HeaderSchema`] selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlockHeader {
    /// The block hash reported by the source chain.
    pub hash: B256,
    /// The number of attributes in the fetched block record.
    pub attribute_count: usize,
    /// The consensus header fields.
    pub header: Header,
}

impl RawBlockHeader {
    /// Creates a new [`RawBlockHeader`].
    pub const fn new(hash: B256, attribute_count: usize, header: Header) -> Self {
        Self { hash, attribute_count, header }
    }

    /// Builds a [`RawBlockHeader`] from a JSON-RPC block object.
    ///
    /// The object is expected to be the untouched result of `eth_getBlockByNumber`, including the
    /// `transactions`, `uncles`, `size` and `totalDifficulty` attributes, since the attribute count
    /// is part of the record.
    pub fn from_rpc_object(object: Map<String, Value>) -> Result<Self, CodecError> {
        let attribute_count = object.len();
        let rpc_header: alloy_rpc_types_eth::Header = serde_json::from_value(Value::Object(object))?;
        Ok(Self { hash: rpc_header.hash, attribute_count, header: rpc_header.inner })
    }

    /// Returns the block number.
    pub const fn number(&self) -> u64 {
        self.header.number
    }

    /// Returns the [`HeaderSchema`] matching the attribute count of the record.
    pub fn schema(&self) -> Result<HeaderSchema, CodecError> {
        HeaderSchema::from_attribute_count(self.attribute_count)
    }
}
