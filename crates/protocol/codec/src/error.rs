//! Error types for the header codec.

use thiserror::Error;

/// An error produced while building or decoding a [`crate::CanonicalHeader`].
#[derive(Error, Debug)]
pub enum CodecError {
    /// The fetched block record does not match any known header layout.
    #[error("Unrecognized header layout: block record has {attributes} attributes")]
    EncodingMismatch {
        /// The number of attributes in the fetched block record.
        attributes: usize,
    },
    /// The block record advertises a base fee layout but carries no base fee.
    #[error("Block {number} uses the base fee layout but has no base fee")]
    MissingBaseFee {
        /// The block number.
        number: u64,
    },
    /// The block record could not be deserialized.
    #[error("Malformed block record: {0}")]
    Json(#[from] serde_json::Error),
    /// The canonical encoding could not be decoded.
    #[error("Invalid canonical encoding: {0}")]
    Rlp(#[from] alloy_rlp::Error),
}

impl CodecError {
    /// Returns `true` if the error is caused by an unknown header layout.
    ///
    /// Layout errors are configuration errors: retrying the same block never succeeds.
    pub const fn is_encoding_mismatch(&self) -> bool {
        matches!(self, Self::EncodingMismatch { .. } | Self::MissingBaseFee { .. })
    }
}
