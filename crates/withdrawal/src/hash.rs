use crate::types::WithdrawalHash;
use alloy_primitives::keccak256;
use alloy_sol_types::SolValue;
use binding::opstack::WithdrawalTransaction;

/// Hash a withdrawal the way `Hashing.hashWithdrawal` does on L1.
///
/// The fields are encoded as a flat sequence, not as a wrapped tuple.
pub fn compute_withdrawal_hash(tx: &WithdrawalTransaction) -> WithdrawalHash {
    let encoded = (
        &tx.nonce,
        &tx.sender,
        &tx.target,
        &tx.value,
        &tx.gasLimit,
        &tx.data,
    )
        .abi_encode_sequence();

    keccak256(encoded)
}
