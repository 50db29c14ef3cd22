//! Solidity bindings.
#![allow(missing_docs)]

use alloy_sol_types::sol;

sol! {
    /// The bridge contract interface.
    interface Bridge {
        /// A source chain header in canonical form.
        #[derive(Debug, PartialEq, Eq)]
        struct BlockHeader {
            bytes32 blockHash;
            bytes rlpHeader;
        }

        /// The evidence resolving one storage proof request.
        #[derive(Debug, PartialEq, Eq)]
        struct StateProof {
            address account;
            bytes[] accountProof;
            bytes32 storageHash;
            bytes32 storageKey;
            uint256 storageValue;
            bytes[] storageProof;
        }

        /// Emitted once per stored header.
        #[derive(Debug, PartialEq, Eq)]
        event NewBlockAdded(bytes32 blockHash);

        /// Emitted when a storage proof request is logged.
        #[derive(Debug, PartialEq, Eq)]
        event RequestLogged(uint256 requestId, address account, uint256 key, uint256 blockId);

        /// Emitted when a submitted proof verifies.
        #[derive(Debug, PartialEq, Eq)]
        event RequestServed(uint256 requestId, bytes result);

        /// Emitted when a proof references a block the contract does not store.
        #[derive(Debug, PartialEq, Eq)]
        event BlockNotFound();

        function saveBlock(BlockHeader header) external;

        function request(address account, uint256 key, uint256 blockId) external;

        function getTotal() external view returns (uint256);

        function verify(uint256 requestId, StateProof stateProof, uint256 blockId) external;
    }
}
