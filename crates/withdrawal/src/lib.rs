//! L2→L1 withdrawal primitives for OP Stack chains.
//!
//! - [`types::Withdrawal`]: the message descriptor captured from `MessagePassed`
//! - [`hash`]: withdrawal hashing as done by the L1 portal
//! - [`proof`]: dispute game lookup and storage proof generation
//! - [`state`]: proven/finalized status and provability/finalizability timing

pub mod hash;
pub mod proof;
pub mod state;
pub mod types;

pub use proof::ProofInput;
pub use types::{Withdrawal, WithdrawalHash, WithdrawalStatus};
