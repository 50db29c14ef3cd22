//! Storage proof requests and the evidence resolving them.

use crate::Bridge;
use alloy_primitives::{Address, B256, Bytes, U256};

/// The lifecycle of a storage proof request. The terminal states are set by the bridge contract
/// and a request leaves [`RequestStatus::Pending`] at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestStatus {
    /// Logged, not yet resolved.
    #[default]
    Pending,
    /// A proof was verified against a stored header.
    Served,
    /// The proof referenced a block the contract does not store.
    NotFound,
}

impl RequestStatus {
    /// Returns `true` once the contract has resolved the request.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// The evidence submitted to resolve one storage proof request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProofBundle {
    /// The account whose storage is proven.
    pub address: Address,
    /// The Merkle path from the state root to the account.
    pub account_proof: Vec<Bytes>,
    /// The account's storage root.
    pub storage_hash: B256,
    /// The storage slot, left-padded to 32 bytes.
    pub storage_key: B256,
    /// The value stored in the slot.
    pub storage_value: U256,
    /// The Merkle path from the storage root to the slot.
    pub storage_proof: Vec<Bytes>,
}

impl ProofBundle {
    /// Left-pads a storage slot to 32 bytes.
    pub fn pad_storage_key(key: U256) -> B256 {
        B256::from(key)
    }
}

impl From<ProofBundle> for Bridge::StateProof {
    fn from(bundle: ProofBundle) -> Self {
        Self {
            account: bundle.address,
            accountProof: bundle.account_proof,
            storageHash: bundle.storage_hash,
            storageKey: bundle.storage_key,
            storageValue: bundle.storage_value,
            storageProof: bundle.storage_proof,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_pad_storage_key() {
        assert_eq!(
            ProofBundle::pad_storage_key(U256::from(7)),
            b256!("0x0000000000000000000000000000000000000000000000000000000000000007")
        );
    }

    #[test]
    fn test_request_status_is_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Served.is_terminal());
        assert!(RequestStatus::NotFound.is_terminal());
    }
}
