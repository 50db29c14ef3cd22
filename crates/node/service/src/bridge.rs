//! Access to the bridge contract on the destination chain.

use crate::Transient;
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::{DynProvider, PendingTransactionError, Provider, ProviderBuilder};
use alloy_rpc_types_eth::{Log, TransactionRequest};
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};
use strait_codec::CanonicalHeader;
use strait_contract::{
    ProofBundle, decode_total, get_total_input, request_input, save_block_input, verify_input,
};
use strait_poller::ProviderEventLog;
use thiserror::Error;
use url::Url;

/// An error returned by a [`BridgeContract`].
#[derive(Error, Debug)]
pub enum ContractError {
    /// The node refused the call, usually because it reverts.
    #[error("{call} rejected: {reason}")]
    Rejected {
        /// The contract function.
        call: &'static str,
        /// The reason reported by the node.
        reason: String,
    },
    /// The transaction was included but reverted.
    #[error("{call} transaction {tx_hash} reverted")]
    Reverted {
        /// The contract function.
        call: &'static str,
        /// The transaction hash.
        tx_hash: B256,
    },
    /// The transaction was sent but its inclusion could not be observed.
    #[error("{call} transaction {tx_hash} not mined: {reason}")]
    NotMined {
        /// The contract function.
        call: &'static str,
        /// The transaction hash.
        tx_hash: B256,
        /// Why the receipt could not be fetched.
        reason: String,
    },
    /// The destination node has no unlocked account to send from.
    #[error("The destination node exposes no account to send transactions from")]
    NoSenderAccount,
    /// The return data of a call could not be decoded.
    #[error(transparent)]
    Decode(#[from] alloy_sol_types::Error),
    /// The RPC call failed.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
}

impl ContractError {
    /// Returns `true` if a submitted transaction reverted or was never mined.
    pub const fn is_transaction_failure(&self) -> bool {
        matches!(self, Self::Reverted { .. } | Self::NotMined { .. })
    }

    /// Returns `true` if the contract refused the call, either on inclusion or because the node
    /// reported an execution revert up front. Other rejections, such as funding or nonce
    /// errors, are not reverts.
    pub fn is_revert(&self) -> bool {
        match self {
            Self::Reverted { .. } => true,
            Self::Rejected { reason, .. } => reason.to_ascii_lowercase().contains("revert"),
            _ => false,
        }
    }

    /// Once a transaction is sent, any failure to observe its receipt means its fate is unknown.
    fn not_mined(call: &'static str, tx_hash: B256, err: PendingTransactionError) -> Self {
        Self::NotMined { call, tx_hash, reason: err.to_string() }
    }

    fn from_send(call: &'static str, err: RpcError<TransportErrorKind>) -> Self {
        match err {
            RpcError::ErrorResp(payload) => {
                Self::Rejected { call, reason: payload.message.to_string() }
            }
            err => Self::Rpc(err),
        }
    }
}

impl Transient for ContractError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Rpc(RpcError::Transport(_)))
    }
}

/// The inclusion receipt of a bridge contract transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inclusion {
    /// The transaction hash.
    pub tx_hash: B256,
    /// The block the transaction was included in.
    pub block_number: Option<u64>,
    /// The gas used by the transaction.
    pub gas_used: u64,
    /// The logs emitted by the transaction.
    pub logs: Vec<Log>,
}

/// The call surface of the bridge contract.
///
/// Transactions resolve once included. A transaction that reverts is an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BridgeContract: Debug + Send + Sync {
    /// Returns the contract address.
    fn address(&self) -> Address;

    /// Stores a canonical header. The contract emits `NewBlockAdded`.
    async fn save_block(&self, header: &CanonicalHeader) -> Result<Inclusion, ContractError>;

    /// Logs a storage proof request. The contract emits `RequestLogged`.
    async fn request(
        &self,
        account: Address,
        key: U256,
        block_id: u64,
    ) -> Result<Inclusion, ContractError>;

    /// Reads the number of requests logged so far.
    async fn total_requests(&self) -> Result<U256, ContractError>;

    /// Submits a proof for a request. The contract emits `RequestServed` or `BlockNotFound`.
    async fn verify(
        &self,
        request_id: U256,
        bundle: ProofBundle,
        block_id: u64,
    ) -> Result<Inclusion, ContractError>;
}

/// A [`BridgeContract`] reached through an alloy provider.
#[derive(Debug, Clone)]
pub struct AlloyBridge {
    provider: DynProvider,
    address: Address,
    sender: Address,
    inclusion_timeout: Option<Duration>,
}

impl AlloyBridge {
    /// Connects to the bridge contract at `address` over HTTP.
    ///
    /// Transactions are signed with `signer` when given. Otherwise they are sent from the first
    /// account the destination node exposes.
    pub async fn connect(
        url: Url,
        address: Address,
        signer: Option<PrivateKeySigner>,
    ) -> Result<Self, ContractError> {
        let (provider, sender) = match signer {
            Some(signer) => {
                let sender = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(url)
                    .erased();
                (provider, sender)
            }
            None => {
                let provider = ProviderBuilder::new().connect_http(url).erased();
                let sender = provider
                    .get_accounts()
                    .await?
                    .first()
                    .copied()
                    .ok_or(ContractError::NoSenderAccount)?;
                (provider, sender)
            }
        };

        debug!(target: "bridge_contract", %address, %sender, "Connected to bridge contract");
        Ok(Self { provider, address, sender, inclusion_timeout: None })
    }

    /// Bounds the wait for each transaction's inclusion. A transaction not included in time fails
    /// with [`ContractError::NotMined`].
    pub const fn with_inclusion_timeout(mut self, timeout: Duration) -> Self {
        self.inclusion_timeout = Some(timeout);
        self
    }

    /// Returns the bound on each transaction's inclusion wait, if any.
    pub const fn inclusion_timeout(&self) -> Option<Duration> {
        self.inclusion_timeout
    }

    /// Returns the account transactions are sent from.
    pub const fn sender(&self) -> Address {
        self.sender
    }

    /// Returns the destination chain's event log, as seen through this provider.
    pub fn event_log(&self) -> ProviderEventLog<DynProvider> {
        ProviderEventLog::new(self.provider.clone())
    }

    async fn transact(&self, call: &'static str, input: Bytes) -> Result<Inclusion, ContractError> {
        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(self.address)
            .with_input(input);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|err| ContractError::from_send(call, err))?;
        let tx_hash = *pending.tx_hash();
        debug!(target: "bridge_contract", call, %tx_hash, "Transaction sent");

        let receipt = pending
            .with_timeout(self.inclusion_timeout)
            .get_receipt()
            .await
            .map_err(|err| ContractError::not_mined(call, tx_hash, err))?;

        if !receipt.status() {
            return Err(ContractError::Reverted { call, tx_hash });
        }

        info!(
            target: "bridge_contract",
            call,
            %tx_hash,
            block_number = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction included"
        );
        Ok(Inclusion {
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            logs: receipt.inner.logs().to_vec(),
        })
    }
}

#[async_trait]
impl BridgeContract for AlloyBridge {
    fn address(&self) -> Address {
        self.address
    }

    async fn save_block(&self, header: &CanonicalHeader) -> Result<Inclusion, ContractError> {
        self.transact("saveBlock", save_block_input(header)).await
    }

    async fn request(
        &self,
        account: Address,
        key: U256,
        block_id: u64,
    ) -> Result<Inclusion, ContractError> {
        self.transact("request", request_input(account, key, block_id)).await
    }

    async fn total_requests(&self) -> Result<U256, ContractError> {
        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(self.address)
            .with_input(get_total_input());
        let output = self.provider.call(tx).await?;
        Ok(decode_total(&output)?)
    }

    async fn verify(
        &self,
        request_id: U256,
        bundle: ProofBundle,
        block_id: u64,
    ) -> Result<Inclusion, ContractError> {
        self.transact("verify", verify_input(request_id, bundle, block_id)).await
    }
}
