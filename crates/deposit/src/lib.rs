//! L1→L2 deposit derivation for OP Stack chains.
//!
//! Given the receipt of an `OptimismPortal2.depositTransaction` call, this crate
//! derives the hash of the L2 transaction the rollup node will include for it,
//! without querying L2.

pub mod transaction;

pub use transaction::{
    decode_opaque_data, l2_transaction_hashes, user_deposit_source_hash, DepositTransaction,
    OpaqueDeposit,
};
