//! OP Stack contract bindings.
//!
//! Includes contracts for both bridge directions:
//! - L2ToL1MessagePasser (L2 predeploy, withdrawal initiation)
//! - OptimismPortal2 (L1 contract, deposits, proving and finalization)
//! - DisputeGameFactory (L1 contract, output proposals)

use alloy_primitives::{address, b256, Address, B256, U256};
use alloy_sol_types::sol;

/// L2ToL1MessagePasser predeploy, identical on every OP Stack chain.
pub const MESSAGE_PASSER_ADDRESS: Address = address!("4200000000000000000000000000000000000016");

/// Output root version committed by dispute games.
pub const OUTPUT_VERSION_V0: B256 =
    b256!("0000000000000000000000000000000000000000000000000000000000000000");

/// Version tag of `TransactionDeposited` events carrying user deposits.
pub const DEPOSIT_VERSION_V0: U256 = U256::ZERO;

sol! {
    /// L2ToL1MessagePasser - L2 predeploy contract for initiating withdrawals
    /// Address: 0x4200000000000000000000000000000000000016 (on all OP Stack chains)
    #[sol(rpc)]
    interface IL2ToL1MessagePasser {
        /// Emitted when a withdrawal is initiated on L2
        event MessagePassed(
            uint256 indexed nonce,
            address indexed sender,
            address indexed target,
            uint256 value,
            uint256 gasLimit,
            bytes data,
            bytes32 withdrawalHash
        );

        /// Initiate a withdrawal from L2 to L1
        function initiateWithdrawal(
            address _target,
            uint256 _gasLimit,
            bytes calldata _data
        ) external payable;

        /// Check if a withdrawal message has been sent
        function sentMessages(bytes32) external view returns (bool);
    }

    /// OptimismPortal2 - L1 entry point for deposits and withdrawal settlement
    #[sol(rpc)]
    interface IOptimismPortal2 {
        /// Proven withdrawal data stored on L1
        #[derive(Debug)]
        struct ProvenWithdrawal {
            address disputeGameProxy;
            uint64 timestamp;
        }

        /// Emitted for every deposit; `opaqueData` is the packed L2 transaction body
        event TransactionDeposited(
            address indexed from,
            address indexed to,
            uint256 indexed version,
            bytes opaqueData
        );

        /// Emitted when a withdrawal is proven on L1
        event WithdrawalProven(
            bytes32 indexed withdrawalHash,
            address indexed from,
            address indexed to
        );

        /// Emitted when a withdrawal is finalized on L1
        event WithdrawalFinalized(
            bytes32 indexed withdrawalHash,
            bool success
        );

        /// Bridge value and an optional call from L1 to L2
        function depositTransaction(
            address _to,
            uint256 _value,
            uint64 _gasLimit,
            bool _isCreation,
            bytes memory _data
        ) external payable;

        /// Query proven withdrawals by hash and proof submitter
        function provenWithdrawals(bytes32 withdrawalHash, address proofSubmitter)
            external view returns (ProvenWithdrawal memory);

        /// Number of accounts that submitted a proof for a withdrawal
        function numProofSubmitters(bytes32 withdrawalHash)
            external view returns (uint256);

        /// Proof submitter at the given position
        function proofSubmitters(bytes32 withdrawalHash, uint256 index)
            external view returns (address);

        /// Query if a withdrawal has been finalized
        function finalizedWithdrawals(bytes32 withdrawalHash)
            external view returns (bool);

        /// Get the proof maturity delay (usually 7 days = 604800 seconds)
        function proofMaturityDelaySeconds()
            external view returns (uint256);

        /// Get the respected game type for filtering dispute games
        function respectedGameType()
            external view returns (uint32);

        /// Prove a withdrawal transaction (requires merkle proof)
        function proveWithdrawalTransaction(
            WithdrawalTransaction calldata _tx,
            uint256 _disputeGameIndex,
            OutputRootProof calldata _outputRootProof,
            bytes[] calldata _withdrawalProof
        ) external;

        /// Finalize a withdrawal transaction using external proof
        function finalizeWithdrawalTransactionExternalProof(
            WithdrawalTransaction calldata _tx,
            address _proofSubmitter
        ) external;
    }

    /// DisputeGameFactory - Used to find dispute games for proof generation
    #[sol(rpc)]
    interface IDisputeGameFactory {
        /// Dispute game search result
        struct GameSearchResult {
            uint256 index;
            bytes32 metadata;
            uint64 timestamp;
            bytes32 rootClaim;
            bytes extraData;
        }

        /// Get the total number of dispute games created
        function gameCount() external view returns (uint256 gameCount_);

        /// Find latest games of a given type
        function findLatestGames(
            uint32 _gameType,
            uint256 _start,
            uint256 _n
        ) external view returns (GameSearchResult[] memory);
    }

    /// IFaultDisputeGame - Standard interface for fault dispute games
    #[sol(rpc)]
    interface IFaultDisputeGame {
        /// Get the L2 block number this game is disputing
        function l2BlockNumber() external view returns (uint256);
    }

    /// Output root proof structure (used in proving withdrawals)
    #[derive(Debug)]
    struct OutputRootProof {
        bytes32 version;
        bytes32 stateRoot;
        bytes32 messagePasserStorageRoot;
        bytes32 latestBlockhash;
    }

    /// Withdrawal transaction structure (shared across contracts)
    #[derive(Debug, PartialEq, Eq)]
    struct WithdrawalTransaction {
        uint256 nonce;
        address sender;
        address target;
        uint256 value;
        uint256 gasLimit;
        bytes data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolEvent;

    #[test]
    fn test_transaction_deposited_signature() {
        assert_eq!(
            IOptimismPortal2::TransactionDeposited::SIGNATURE,
            "TransactionDeposited(address,address,uint256,bytes)"
        );
    }

    #[test]
    fn test_message_passed_signature() {
        assert_eq!(
            IL2ToL1MessagePasser::MessagePassed::SIGNATURE,
            "MessagePassed(uint256,address,address,uint256,uint256,bytes,bytes32)"
        );
    }
}
