//! In-memory stand-ins for the source chain and the bridge contract.

use crate::{BridgeContract, ContractError, Inclusion, SourceChain, SourceError, StorageProof};
use alloy_consensus::Header;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_rpc_types_eth::Log;
use std::{
    collections::{HashMap, HashSet},
    future::pending,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use strait_codec::{CanonicalHeader, RawBlockHeader};
use strait_contract::{Bridge, LoggedRequest, ProofBundle, RequestStatus};

pub use strait_poller::MemoryEventLog;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builds a pre-London block record at `number` with the given difficulty and gas used. The
/// record carries 20 attributes and its hash is the hash of the header.
pub fn legacy_header(number: u64, difficulty: u64, gas_used: u64) -> RawBlockHeader {
    let header = Header {
        number,
        difficulty: U256::from(difficulty),
        gas_limit: 30_000_000,
        gas_used,
        timestamp: 1_700_000_000 + number * 12,
        ..Default::default()
    };
    RawBlockHeader::new(header.hash_slow(), 20, header)
}

/// Builds a London block record at `number` carrying a base fee.
pub fn london_header(number: u64, base_fee: u64) -> RawBlockHeader {
    let header = Header {
        number,
        gas_limit: 30_000_000,
        timestamp: 1_700_000_000 + number * 12,
        base_fee_per_gas: Some(base_fee),
        ..Default::default()
    };
    RawBlockHeader::new(header.hash_slow(), 21, header)
}

#[derive(Debug, Default)]
struct SourceState {
    head: u64,
    headers: HashMap<u64, RawBlockHeader>,
    pruned: HashSet<u64>,
    proof_requests: usize,
}

/// A [`SourceChain`] held in memory.
///
/// Every proof is an empty proof for the requested account, except at pruned blocks where the
/// proof is unavailable.
#[derive(Debug, Default)]
pub struct FakeSource {
    state: Mutex<SourceState>,
}

impl FakeSource {
    /// Creates an empty [`FakeSource`] at height zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the head to `number`.
    pub fn set_head(&self, number: u64) {
        lock(&self.state).head = number;
    }

    /// Serves `header` at its number.
    pub fn insert_header(&self, header: RawBlockHeader) {
        lock(&self.state).headers.insert(header.number(), header);
    }

    /// Makes the state at `block` unavailable.
    pub fn prune(&self, block: u64) {
        lock(&self.state).pruned.insert(block);
    }

    /// Returns the number of proofs requested so far.
    pub fn proof_requests(&self) -> usize {
        lock(&self.state).proof_requests
    }
}

#[async_trait::async_trait]
impl SourceChain for FakeSource {
    async fn block_number(&self) -> Result<u64, SourceError> {
        Ok(lock(&self.state).head)
    }

    async fn raw_header(&self, number: u64) -> Result<RawBlockHeader, SourceError> {
        lock(&self.state).headers.get(&number).cloned().ok_or(SourceError::NotFound(number))
    }

    async fn storage_proof(
        &self,
        account: Address,
        _key: B256,
        number: u64,
    ) -> Result<StorageProof, SourceError> {
        let mut state = lock(&self.state);
        state.proof_requests += 1;
        if state.pruned.contains(&number) {
            return Err(SourceError::ProofUnavailable {
                account,
                block: number,
                reason: "missing trie node".to_string(),
            });
        }
        Ok(StorageProof { address: account, ..Default::default() })
    }
}

/// How a [`FakeBridge`] judges submitted proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Serve the request with the given result.
    Serve(Bytes),
    /// Report the block as unknown.
    NotFound,
}

impl Default for Verdict {
    fn default() -> Self {
        Self::Serve(Bytes::new())
    }
}

/// A `verify` call received by a [`FakeBridge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyCall {
    /// The request id.
    pub request_id: U256,
    /// The submitted proof.
    pub bundle: ProofBundle,
    /// The source block.
    pub block_id: u64,
}

#[derive(Debug)]
struct BridgeState {
    headers: Vec<CanonicalHeader>,
    confirmed: usize,
    requests: Vec<(LoggedRequest, RequestStatus)>,
    verify_calls: Vec<VerifyCall>,
    verdict: Verdict,
    auto_confirm: bool,
    receipt_logs: bool,
    stalled: bool,
    transactions: u64,
}

/// A [`BridgeContract`] held in memory, emitting its events into a [`MemoryEventLog`].
///
/// Requests get increasing ids. A `verify` for a resolved request reverts, any other `verify`
/// resolves the request according to the configured [`Verdict`]. Stored headers are confirmed
/// right away unless confirmation is made manual.
#[derive(Debug)]
pub struct FakeBridge {
    address: Address,
    log: Arc<MemoryEventLog>,
    state: Mutex<BridgeState>,
}

impl FakeBridge {
    /// Creates a [`FakeBridge`] deployed at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            log: Arc::new(MemoryEventLog::new()),
            state: Mutex::new(BridgeState {
                headers: Vec::new(),
                confirmed: 0,
                requests: Vec::new(),
                verify_calls: Vec::new(),
                verdict: Verdict::default(),
                auto_confirm: true,
                receipt_logs: true,
                stalled: false,
                transactions: 0,
            }),
        }
    }

    /// Returns the contract's event log.
    pub fn event_log(&self) -> Arc<MemoryEventLog> {
        Arc::clone(&self.log)
    }

    /// Sets how submitted proofs are judged.
    pub fn set_verdict(&self, verdict: Verdict) {
        lock(&self.state).verdict = verdict;
    }

    /// Stops confirming stored headers until [`FakeBridge::confirm_pending`] is called.
    pub fn hold_confirmations(&self) {
        lock(&self.state).auto_confirm = false;
    }

    /// Emits `NewBlockAdded` for every stored header not confirmed yet.
    pub fn confirm_pending(&self) {
        let mut state = lock(&self.state);
        for header in &state.headers[state.confirmed..] {
            self.log.emit(self.address, &Bridge::NewBlockAdded { blockHash: header.block_hash });
        }
        state.confirmed = state.headers.len();
    }

    /// Makes every later `request` and `verify` transaction wait for inclusion forever.
    pub fn stall_transactions(&self) {
        lock(&self.state).stalled = true;
    }

    fn stalled(&self) -> bool {
        lock(&self.state).stalled
    }

    /// Strips the logs from request receipts.
    pub fn omit_receipt_logs(&self) {
        lock(&self.state).receipt_logs = false;
    }

    /// Logs a request as if another client had sent it. Returns its id and the emitted entry.
    pub fn log_request(&self, account: Address, key: U256, block_id: u64) -> (U256, Log) {
        let mut state = lock(&self.state);
        let id = U256::from(state.requests.len());
        state.requests.push((LoggedRequest { id, account, key, block_id }, RequestStatus::Pending));
        let log = self.log.emit(
            self.address,
            &Bridge::RequestLogged { requestId: id, account, key, blockId: U256::from(block_id) },
        );
        (id, log)
    }

    /// Resolves every pending request according to the verdict, as a fulfiller would.
    pub fn resolve_pending(&self) {
        let mut state = lock(&self.state);
        let verdict = state.verdict.clone();
        for (request, status) in &mut state.requests {
            if !status.is_terminal() {
                *status = self.judge(request.id, &verdict);
            }
        }
    }

    /// Returns the stored headers.
    pub fn saved_headers(&self) -> Vec<CanonicalHeader> {
        lock(&self.state).headers.clone()
    }

    /// Returns the `verify` calls received so far.
    pub fn verify_calls(&self) -> Vec<VerifyCall> {
        lock(&self.state).verify_calls.clone()
    }

    /// Returns the status of request `id`.
    pub fn request_status(&self, id: U256) -> Option<RequestStatus> {
        let index = usize::try_from(id).ok()?;
        lock(&self.state).requests.get(index).map(|(_, status)| *status)
    }

    fn judge(&self, request_id: U256, verdict: &Verdict) -> RequestStatus {
        match verdict {
            Verdict::Serve(result) => {
                self.log.emit(
                    self.address,
                    &Bridge::RequestServed { requestId: request_id, result: result.clone() },
                );
                RequestStatus::Served
            }
            Verdict::NotFound => {
                self.log.emit(self.address, &Bridge::BlockNotFound {});
                RequestStatus::NotFound
            }
        }
    }

    fn include(state: &mut BridgeState, logs: Vec<Log>) -> Inclusion {
        state.transactions += 1;
        Inclusion {
            tx_hash: B256::from(U256::from(state.transactions)),
            block_number: logs.last().and_then(|log| log.block_number),
            gas_used: 21_000,
            logs,
        }
    }
}

#[async_trait::async_trait]
impl BridgeContract for FakeBridge {
    fn address(&self) -> Address {
        self.address
    }

    async fn save_block(&self, header: &CanonicalHeader) -> Result<Inclusion, ContractError> {
        let mut state = lock(&self.state);
        state.headers.push(header.clone());
        let mut logs = Vec::new();
        if state.auto_confirm {
            state.confirmed = state.headers.len();
            logs.push(
                self.log.emit(self.address, &Bridge::NewBlockAdded { blockHash: header.block_hash }),
            );
        }
        Ok(Self::include(&mut state, logs))
    }

    async fn request(
        &self,
        account: Address,
        key: U256,
        block_id: u64,
    ) -> Result<Inclusion, ContractError> {
        if self.stalled() {
            return pending().await;
        }
        let (_, log) = self.log_request(account, key, block_id);
        let mut state = lock(&self.state);
        let logs = if state.receipt_logs { vec![log] } else { Vec::new() };
        Ok(Self::include(&mut state, logs))
    }

    async fn total_requests(&self) -> Result<U256, ContractError> {
        Ok(U256::from(lock(&self.state).requests.len()))
    }

    async fn verify(
        &self,
        request_id: U256,
        bundle: ProofBundle,
        block_id: u64,
    ) -> Result<Inclusion, ContractError> {
        if self.stalled() {
            return pending().await;
        }
        let mut state = lock(&self.state);
        state.verify_calls.push(VerifyCall { request_id, bundle, block_id });

        let index = usize::try_from(request_id)
            .ok()
            .filter(|index| *index < state.requests.len())
            .ok_or_else(|| ContractError::Rejected {
                call: "verify",
                reason: "unknown request".to_string(),
            })?;
        if state.requests[index].1.is_terminal() {
            state.transactions += 1;
            return Err(ContractError::Reverted {
                call: "verify",
                tx_hash: B256::from(U256::from(state.transactions)),
            });
        }

        let verdict = state.verdict.clone();
        state.requests[index].1 = self.judge(request_id, &verdict);
        Ok(Self::include(&mut state, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_header_fixture_hashes_canonically() {
        let raw = legacy_header(100, 0, 12_345);
        let header = CanonicalHeader::encode(&raw).unwrap();
        assert!(header.hash_matches());
    }

    #[test]
    fn test_london_header_fixture_hashes_canonically() {
        let raw = london_header(100, 7);
        let header = CanonicalHeader::encode(&raw).unwrap();
        assert_eq!(header.fields().unwrap().len(), 16);
        assert!(header.hash_matches());
    }

    #[tokio::test]
    async fn test_fake_bridge_assigns_increasing_ids() {
        let bridge = FakeBridge::new(Address::repeat_byte(1));
        bridge.request(Address::ZERO, U256::ZERO, 1).await.unwrap();
        bridge.request(Address::ZERO, U256::ZERO, 1).await.unwrap();
        assert_eq!(bridge.total_requests().await.unwrap(), U256::from(2));
        assert_eq!(bridge.event_log().len(), 2);
    }
}
