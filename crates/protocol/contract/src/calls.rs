//! Calldata builders for the bridge contract.

use crate::{Bridge, ProofBundle};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use strait_codec::CanonicalHeader;

/// Builds the calldata of `saveBlock(header)`.
pub fn save_block_input(header: &CanonicalHeader) -> Bytes {
    Bridge::saveBlockCall {
        header: Bridge::BlockHeader {
            blockHash: header.block_hash,
            rlpHeader: header.encoded.clone(),
        },
    }
    .abi_encode()
    .into()
}

/// Builds the calldata of `request(account, key, blockId)`.
pub fn request_input(account: Address, key: U256, block_id: u64) -> Bytes {
    Bridge::requestCall { account, key, blockId: U256::from(block_id) }.abi_encode().into()
}

/// Builds the calldata of `verify(requestId, stateProof, blockId)`.
pub fn verify_input(request_id: U256, bundle: ProofBundle, block_id: u64) -> Bytes {
    Bridge::verifyCall { requestId: request_id, stateProof: bundle.into(), blockId: U256::from(block_id) }
        .abi_encode()
        .into()
}

/// Builds the calldata of `getTotal()`.
pub fn get_total_input() -> Bytes {
    Bridge::getTotalCall {}.abi_encode().into()
}

/// Decodes the return data of `getTotal()`.
pub fn decode_total(data: &[u8]) -> Result<U256, alloy_sol_types::Error> {
    Bridge::getTotalCall::abi_decode_returns(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, bytes};

    #[test]
    fn test_save_block_input_round_trip() {
        let header = CanonicalHeader { block_hash: B256::repeat_byte(1), encoded: bytes!("0xc180") };
        let input = save_block_input(&header);
        assert_eq!(&input[..4], Bridge::saveBlockCall::SELECTOR.as_slice());

        let call = Bridge::saveBlockCall::abi_decode(&input).unwrap();
        assert_eq!(call.header.blockHash, header.block_hash);
        assert_eq!(call.header.rlpHeader, header.encoded);
    }

    #[test]
    fn test_verify_input_round_trip() {
        let bundle = ProofBundle {
            storage_key: ProofBundle::pad_storage_key(U256::from(7)),
            ..Default::default()
        };
        let call = Bridge::verifyCall::abi_decode(&verify_input(U256::from(5), bundle.clone(), 100))
            .unwrap();
        assert_eq!(call.requestId, U256::from(5));
        assert_eq!(call.blockId, U256::from(100));
        assert_eq!(call.stateProof, Bridge::StateProof::from(bundle));
    }

    #[test]
    fn test_decode_total() {
        let data = U256::from(6).to_be_bytes::<32>();
        assert_eq!(decode_total(&data).unwrap(), U256::from(6));
    }
}
