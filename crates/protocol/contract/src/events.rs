//! Typed views over bridge contract logs.

use crate::Bridge;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_rpc_types_eth::Log;

/// A storage proof request decoded from a [`Bridge::RequestLogged`] log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggedRequest {
    /// The id assigned by the contract.
    pub id: U256,
    /// The account whose storage is requested.
    pub account: Address,
    /// The storage slot.
    pub key: U256,
    /// The source chain block the proof must be taken at.
    pub block_id: u64,
}

impl LoggedRequest {
    /// Decodes a [`Bridge::RequestLogged`] log.
    pub fn from_log(log: &Log) -> Result<Self, alloy_sol_types::Error> {
        let event = log.log_decode::<Bridge::RequestLogged>()?.inner.data;
        let block_id = u64::try_from(event.blockId)
            .map_err(|_| alloy_sol_types::Error::custom("request block id exceeds u64"))?;
        Ok(Self { id: event.requestId, account: event.account, key: event.key, block_id })
    }
}

/// A resolved request decoded from a [`Bridge::RequestServed`] log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedRequest {
    /// The request id.
    pub request_id: U256,
    /// The verification result reported by the contract.
    pub result: Bytes,
}

impl ServedRequest {
    /// Decodes a [`Bridge::RequestServed`] log.
    pub fn from_log(log: &Log) -> Result<Self, alloy_sol_types::Error> {
        let event = log.log_decode::<Bridge::RequestServed>()?.inner.data;
        Ok(Self { request_id: event.requestId, result: event.result })
    }
}

/// Decodes the header hash carried by a [`Bridge::NewBlockAdded`] log.
pub fn confirmed_block_hash(log: &Log) -> Result<B256, alloy_sol_types::Error> {
    Ok(log.log_decode::<Bridge::NewBlockAdded>()?.inner.data.blockHash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolEvent;

    fn log_of<E: SolEvent>(event: &E) -> Log {
        Log {
            inner: alloy_primitives::Log {
                address: Address::repeat_byte(0xbb),
                data: event.encode_log_data(),
            },
            block_number: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_logged_request_from_log() {
        let log = log_of(&Bridge::RequestLogged {
            requestId: U256::from(5),
            account: Address::repeat_byte(0xaa),
            key: U256::from(7),
            blockId: U256::from(100),
        });
        let request = LoggedRequest::from_log(&log).unwrap();
        assert_eq!(request.id, U256::from(5));
        assert_eq!(request.account, Address::repeat_byte(0xaa));
        assert_eq!(request.key, U256::from(7));
        assert_eq!(request.block_id, 100);
    }

    #[test]
    fn test_logged_request_rejects_oversized_block_id() {
        let log = log_of(&Bridge::RequestLogged {
            requestId: U256::from(5),
            account: Address::ZERO,
            key: U256::ZERO,
            blockId: U256::MAX,
        });
        assert!(LoggedRequest::from_log(&log).is_err());
    }

    #[test]
    fn test_served_request_from_log() {
        let log = log_of(&Bridge::RequestServed {
            requestId: U256::from(5),
            result: Bytes::from_static(&[1]),
        });
        let served = ServedRequest::from_log(&log).unwrap();
        assert_eq!(served.request_id, U256::from(5));
        assert_eq!(served.result, Bytes::from_static(&[1]));
    }

    #[test]
    fn test_decoding_the_wrong_event_fails() {
        let log = log_of(&Bridge::BlockNotFound {});
        assert!(ServedRequest::from_log(&log).is_err());
        assert!(confirmed_block_hash(&log).is_err());
    }

    #[test]
    fn test_confirmed_block_hash() {
        let log = log_of(&Bridge::NewBlockAdded { blockHash: B256::repeat_byte(3) });
        assert_eq!(confirmed_block_hash(&log).unwrap(), B256::repeat_byte(3));
    }
}
