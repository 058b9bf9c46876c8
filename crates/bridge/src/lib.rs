//! Deposit and withdrawal flows for an OP Stack bridge.
//!
//! - [`DepositFlow`]: L1 → L2, `Idle → Preparing → AwaitingL1 → AwaitingL2 → Complete`
//! - [`WithdrawalFlow`]: L2 → L1, initiate, prove, then finalize after the challenge period
//! - [`BridgeCoordinator`]: owns one flow of each kind and publishes snapshots
//!
//! Chain access goes through [`ChainClient`]; [`OpStackClient`] is the JSON-RPC
//! implementation.

pub mod chain;
pub mod coordinator;
pub mod deposit;
pub mod error;
pub mod opstack;
pub mod types;
pub mod withdraw;

pub use chain::ChainClient;
pub use client::WalletSigner;
pub use coordinator::BridgeCoordinator;
pub use deposit::{DepositFlow, DepositSnapshot, DepositState};
pub use error::{BridgeError, ErrorKind, ErrorReport};
pub use opstack::OpStackClient;
pub use types::{Chain, PendingTx, Receipt, ReceiptLog, TransferRequest};
pub use withdraw::{WithdrawalFlow, WithdrawalSnapshot, WithdrawalState};
pub use withdrawal::{ProofInput, Withdrawal, WithdrawalHash, WithdrawalStatus};

#[cfg(test)]
pub(crate) mod test_utils;
