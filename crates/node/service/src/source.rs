//! Read access to the source chain.

use crate::Transient;
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_transport::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;
use strait_codec::{CodecError, RawBlockHeader};
use strait_contract::ProofBundle;
use thiserror::Error;
use url::Url;

/// An error returned by a [`SourceChain`].
#[derive(Error, Debug)]
pub enum SourceError {
    /// The block does not exist on the source chain.
    #[error("Block {0} not found")]
    NotFound(u64),
    /// The node cannot produce a proof, typically because the state at the block was pruned.
    #[error("No proof available for {account} at block {block}: {reason}")]
    ProofUnavailable {
        /// The account the proof was requested for.
        account: Address,
        /// The block the proof was requested at.
        block: u64,
        /// The reason reported by the node.
        reason: String,
    },
    /// The node answered `eth_getProof` without a storage proof for the requested slot.
    #[error("Proof for {0} carries no storage proof")]
    MalformedProof(Address),
    /// The fetched block record could not be read.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The RPC call failed.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
}

impl Transient for SourceError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Rpc(RpcError::Transport(_)))
    }
}

/// An account and storage proof returned by `eth_getProof` for a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageProof {
    /// The proven account.
    pub address: Address,
    /// The Merkle path from the state root to the account.
    pub account_proof: Vec<Bytes>,
    /// The account's storage root.
    pub storage_hash: B256,
    /// The value stored in the slot.
    pub storage_value: U256,
    /// The Merkle path from the storage root to the slot.
    pub storage_proof: Vec<Bytes>,
}

impl StorageProof {
    /// Assembles the [`ProofBundle`] proving `key`.
    pub fn into_bundle(self, key: U256) -> ProofBundle {
        ProofBundle {
            address: self.address,
            account_proof: self.account_proof,
            storage_hash: self.storage_hash,
            storage_key: ProofBundle::pad_storage_key(key),
            storage_value: self.storage_value,
            storage_proof: self.storage_proof,
        }
    }
}

/// Read access to the source chain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceChain: Debug + Send + Sync {
    /// Returns the height of the source chain head.
    async fn block_number(&self) -> Result<u64, SourceError>;

    /// Fetches the block record at `number`.
    async fn raw_header(&self, number: u64) -> Result<RawBlockHeader, SourceError>;

    /// Fetches the proof of the storage slot `key` of `account` at block `number`.
    async fn storage_proof(
        &self,
        account: Address,
        key: B256,
        number: u64,
    ) -> Result<StorageProof, SourceError>;
}

/// A [`SourceChain`] backed by an alloy [`RootProvider`].
#[derive(Debug, Clone)]
pub struct AlloySource {
    provider: RootProvider,
}

impl AlloySource {
    /// Creates a new [`AlloySource`].
    pub const fn new(provider: RootProvider) -> Self {
        Self { provider }
    }

    /// Creates a new [`AlloySource`] over HTTP.
    pub fn new_http(url: Url) -> Self {
        Self::new(RootProvider::new_http(url))
    }
}

#[async_trait]
impl SourceChain for AlloySource {
    async fn block_number(&self) -> Result<u64, SourceError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn raw_header(&self, number: u64) -> Result<RawBlockHeader, SourceError> {
        // The untouched block object is needed, its attribute count selects the schema.
        let object: Option<Map<String, Value>> = self
            .provider
            .raw_request("eth_getBlockByNumber".into(), (BlockNumberOrTag::Number(number), false))
            .await?;
        let object = object.ok_or(SourceError::NotFound(number))?;

        let raw = RawBlockHeader::from_rpc_object(object)?;
        trace!(
            target: "source_chain",
            block_number = number,
            attributes = raw.attribute_count,
            "Fetched block record"
        );
        Ok(raw)
    }

    async fn storage_proof(
        &self,
        account: Address,
        key: B256,
        number: u64,
    ) -> Result<StorageProof, SourceError> {
        let response = match self.provider.get_proof(account, vec![key]).number(number).await {
            Ok(response) => response,
            Err(RpcError::ErrorResp(payload)) => {
                return Err(SourceError::ProofUnavailable {
                    account,
                    block: number,
                    reason: payload.message.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let slot = response
            .storage_proof
            .into_iter()
            .next()
            .ok_or(SourceError::MalformedProof(account))?;

        Ok(StorageProof {
            address: response.address,
            account_proof: response.account_proof,
            storage_hash: response.storage_hash,
            storage_value: slot.value,
            storage_proof: slot.proof,
        })
    }
}
