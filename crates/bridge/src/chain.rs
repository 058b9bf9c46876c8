//! Capability interface between the bridge flows and the chains.
//!
//! Flows only sequence calls; building, gas estimation, proof construction and
//! receipt polling all live behind [`ChainClient`].

use crate::{
    error::BridgeError,
    types::{Chain, PendingTx, Receipt, TransferRequest},
};
use alloy_primitives::{Address, TxHash, B256};
use client::WalletSigner;
use std::{future::Future, time::Duration};
use withdrawal::{ProofInput, Withdrawal, WithdrawalHash, WithdrawalStatus};

pub trait ChainClient: Send + Sync {
    /// Build the L1 portal deposit for `request`.
    fn build_deposit(
        &self,
        request: &TransferRequest,
    ) -> impl Future<Output = Result<PendingTx, BridgeError>> + Send;

    /// Build the L2 withdrawal initiation for `request`.
    fn build_withdrawal_initiation(
        &self,
        request: &TransferRequest,
    ) -> impl Future<Output = Result<PendingTx, BridgeError>> + Send;

    /// Have `signer` sign `tx` and broadcast it on `tx.chain`.
    ///
    /// Fails with [`BridgeError::SubmissionRejected`] when the wallet declines,
    /// signs for another account, or is connected to another chain.
    fn submit(
        &self,
        tx: &PendingTx,
        signer: &WalletSigner,
    ) -> impl Future<Output = Result<TxHash, BridgeError>> + Send;

    /// Suspend until `hash` is included on `chain`. Reverted receipts are returned, not errors.
    fn wait_for_receipt(
        &self,
        chain: Chain,
        hash: TxHash,
    ) -> impl Future<Output = Result<Receipt, BridgeError>> + Send;

    /// Hash of the L2 transaction a successful L1 deposit receipt produces. No chain call.
    fn derive_l2_tx_id(&self, l1_receipt: &Receipt) -> Result<B256, BridgeError>;

    /// Remaining time before the initiated withdrawal can be proven. Zero when ready.
    ///
    /// Only the delay itself never grows. A reading is an estimate of it and may
    /// rise between calls, for example when a new dispute game lands that does
    /// not yet cover the withdrawal.
    fn time_until_provable(
        &self,
        l2_receipt: &Receipt,
    ) -> impl Future<Output = Result<Duration, BridgeError>> + Send;

    /// Suspend until provable, then return the proof input and the captured descriptor.
    fn wait_until_provable(
        &self,
        l2_receipt: &Receipt,
    ) -> impl Future<Output = Result<(ProofInput, Withdrawal), BridgeError>> + Send;

    fn build_proof(
        &self,
        account: Address,
        proof: &ProofInput,
        withdrawal: &Withdrawal,
    ) -> impl Future<Output = Result<PendingTx, BridgeError>> + Send;

    /// Remaining challenge period for a proven withdrawal. Zero when finalizable.
    fn time_until_finalizable(
        &self,
        withdrawal_hash: WithdrawalHash,
    ) -> impl Future<Output = Result<Duration, BridgeError>> + Send;

    /// Suspend until the challenge period for `withdrawal_hash` has elapsed.
    fn wait_until_finalizable(
        &self,
        withdrawal_hash: WithdrawalHash,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    fn build_finalization(
        &self,
        account: Address,
        withdrawal: &Withdrawal,
    ) -> impl Future<Output = Result<PendingTx, BridgeError>> + Send;

    /// Status of `withdrawal_hash` as the L1 portal records it.
    fn withdrawal_status(
        &self,
        withdrawal_hash: WithdrawalHash,
    ) -> impl Future<Output = Result<WithdrawalStatus, BridgeError>> + Send;
}
