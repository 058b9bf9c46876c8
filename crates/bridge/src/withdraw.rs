//! L2 → L1 withdrawal flow.
//!
//! ```text
//! Idle → Preparing → AwaitingInitiation → ReadyToCheckProvability
//!      → Proving → Proved → Finalizing → Finalized
//! ```
//!
//! `ReadyToCheckProvability` may be polled any number of times with
//! [`WithdrawalFlow::check_provability`], which never transitions. `prove`
//! waits out the provability delay itself, and `finalize` always waits out the
//! challenge period before building the finalization.
//!
//! As with deposits, state is recorded only once every await of an operation
//! has completed, so cancelled operations can be retried.

use crate::{
    chain::ChainClient,
    error::{BridgeError, ErrorReport},
    types::{Chain, PendingTx, Receipt, TransferRequest},
};
use alloy_primitives::{Address, TxHash};
use client::WalletSigner;
use serde::Serialize;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, info};
use withdrawal::{Withdrawal, WithdrawalStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalState {
    #[default]
    Idle,
    Preparing,
    AwaitingInitiation,
    ReadyToCheckProvability,
    Proving,
    Proved,
    Finalizing,
    Finalized,
}

impl WithdrawalState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::AwaitingInitiation => "awaiting_initiation",
            Self::ReadyToCheckProvability => "ready_to_check_provability",
            Self::Proving => "proving",
            Self::Proved => "proved",
            Self::Finalizing => "finalizing",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for WithdrawalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation view of a withdrawal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalSnapshot {
    pub state: WithdrawalState,
    pub request: Option<TransferRequest>,
    pub initiation_tx_hash: Option<TxHash>,
    pub initiation_receipt: Option<Arc<Receipt>>,
    /// Last provability reading
    pub seconds_until_provable: Option<u64>,
    pub withdrawal: Option<Withdrawal>,
    pub proof_tx_hash: Option<TxHash>,
    pub proof_receipt: Option<Arc<Receipt>>,
    /// Last finalizability reading
    pub seconds_until_finalizable: Option<u64>,
    /// Last status reading from the L1 portal
    pub status: Option<WithdrawalStatus>,
    pub finalization_tx_hash: Option<TxHash>,
    pub finalization_receipt: Option<Arc<Receipt>>,
    pub in_flight: Option<&'static str>,
    pub last_error: Option<ErrorReport>,
}

pub struct WithdrawalFlow<C> {
    client: Arc<C>,
    state: WithdrawalState,
    request: Option<TransferRequest>,
    initiation_tx_hash: Option<TxHash>,
    initiation_receipt: Option<Arc<Receipt>>,
    withdrawal: Option<Withdrawal>,
    proof_tx_hash: Option<TxHash>,
    proof_receipt: Option<Arc<Receipt>>,
    finalization_tx_hash: Option<TxHash>,
    finalization_receipt: Option<Arc<Receipt>>,
}

impl<C> WithdrawalFlow<C>
where
    C: ChainClient,
{
    pub const fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: WithdrawalState::Idle,
            request: None,
            initiation_tx_hash: None,
            initiation_receipt: None,
            withdrawal: None,
            proof_tx_hash: None,
            proof_receipt: None,
            finalization_tx_hash: None,
            finalization_receipt: None,
        }
    }

    pub const fn state(&self) -> WithdrawalState {
        self.state
    }

    /// The descriptor captured while proving.
    pub const fn withdrawal(&self) -> Option<&Withdrawal> {
        self.withdrawal.as_ref()
    }

    pub fn snapshot(&self) -> WithdrawalSnapshot {
        WithdrawalSnapshot {
            state: self.state,
            request: self.request,
            initiation_tx_hash: self.initiation_tx_hash,
            initiation_receipt: self.initiation_receipt.clone(),
            withdrawal: self.withdrawal.clone(),
            proof_tx_hash: self.proof_tx_hash,
            proof_receipt: self.proof_receipt.clone(),
            finalization_tx_hash: self.finalization_tx_hash,
            finalization_receipt: self.finalization_receipt.clone(),
            ..Default::default()
        }
    }

    fn expect_state(
        &self,
        operation: &'static str,
        expected: WithdrawalState,
    ) -> Result<(), BridgeError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(BridgeError::invalid_transition(
                operation,
                format!("withdrawal is {}, expected {}", self.state, expected),
            ))
        }
    }

    fn expect_tx_hash(
        operation: &'static str,
        recorded: Option<TxHash>,
        given: TxHash,
    ) -> Result<(), BridgeError> {
        if recorded == Some(given) {
            Ok(())
        } else {
            Err(BridgeError::invalid_transition(
                operation,
                format!("{given} is not the transaction this withdrawal submitted"),
            ))
        }
    }

    fn expect_initiation_receipt(
        &self,
        operation: &'static str,
        receipt: &Receipt,
    ) -> Result<(), BridgeError> {
        if receipt.chain == Chain::L2 && self.initiation_tx_hash == Some(receipt.tx_hash) {
            Ok(())
        } else {
            Err(BridgeError::invalid_transition(
                operation,
                format!("{} is not this withdrawal's initiation receipt", receipt.tx_hash),
            ))
        }
    }

    fn account(&self, operation: &'static str) -> Result<Address, BridgeError> {
        self.request
            .map(|request| request.account)
            .ok_or_else(|| BridgeError::invalid_transition(operation, "no request recorded"))
    }

    /// Validate `request` and build the L2 initiation. `Idle → Preparing`.
    pub async fn prepare(&mut self, request: TransferRequest) -> Result<PendingTx, BridgeError> {
        self.expect_state("prepare", WithdrawalState::Idle)?;
        request.validate()?;

        let tx = self.client.build_withdrawal_initiation(&request).await?;

        info!(
            account = %request.account,
            recipient = %request.recipient,
            amount = %request.amount,
            "Withdrawal prepared"
        );
        self.request = Some(request);
        self.state = WithdrawalState::Preparing;
        Ok(tx)
    }

    /// Sign and broadcast the initiation on L2. `Preparing → AwaitingInitiation`.
    pub async fn initiate(
        &mut self,
        tx: &PendingTx,
        signer: &WalletSigner,
    ) -> Result<TxHash, BridgeError> {
        self.expect_state("initiate", WithdrawalState::Preparing)?;
        if tx.chain != Chain::L2 {
            return Err(BridgeError::invalid_transition(
                "initiate",
                format!("withdrawals are initiated on l2, got a {} transaction", tx.chain),
            ));
        }

        let hash = self.client.submit(tx, signer).await?;

        info!(tx_hash = %hash, "Withdrawal initiated on L2");
        self.initiation_tx_hash = Some(hash);
        self.state = WithdrawalState::AwaitingInitiation;
        Ok(hash)
    }

    /// Wait for the initiation on L2. `AwaitingInitiation → ReadyToCheckProvability`.
    pub async fn await_initiation(&mut self, hash: TxHash) -> Result<Arc<Receipt>, BridgeError> {
        self.expect_state("await_initiation", WithdrawalState::AwaitingInitiation)?;
        Self::expect_tx_hash("await_initiation", self.initiation_tx_hash, hash)?;

        let receipt = self.client.wait_for_receipt(Chain::L2, hash).await?;
        if !receipt.status {
            return Err(BridgeError::L2TxReverted(hash));
        }

        info!(
            tx_hash = %hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            "Withdrawal initiation included on L2"
        );
        let receipt = Arc::new(receipt);
        self.initiation_receipt = Some(receipt.clone());
        self.state = WithdrawalState::ReadyToCheckProvability;
        Ok(receipt)
    }

    /// Remaining time before the withdrawal can be proven. Read-only; never transitions.
    pub async fn check_provability(&self, receipt: &Receipt) -> Result<Duration, BridgeError> {
        self.expect_state("check_provability", WithdrawalState::ReadyToCheckProvability)?;
        self.expect_initiation_receipt("check_provability", receipt)?;

        let remaining = self.client.time_until_provable(receipt).await?;
        debug!(remaining_secs = remaining.as_secs(), "Checked provability");
        Ok(remaining)
    }

    /// Wait until provable, then prove on L1. `ReadyToCheckProvability → Proving`.
    ///
    /// Captures the withdrawal descriptor used for finalization.
    pub async fn prove(
        &mut self,
        receipt: &Receipt,
        signer: &WalletSigner,
    ) -> Result<(TxHash, Withdrawal), BridgeError> {
        self.expect_state("prove", WithdrawalState::ReadyToCheckProvability)?;
        self.expect_initiation_receipt("prove", receipt)?;
        let account = self.account("prove")?;

        let (proof, withdrawal) = self.client.wait_until_provable(receipt).await?;
        let tx = self.client.build_proof(account, &proof, &withdrawal).await?;
        let hash = self.client.submit(&tx, signer).await?;

        info!(
            tx_hash = %hash,
            withdrawal_hash = %withdrawal.withdrawal_hash,
            dispute_game_index = %proof.dispute_game_index,
            proof_nodes = proof.withdrawal_proof.len(),
            "Withdrawal proof submitted on L1"
        );
        self.withdrawal = Some(withdrawal.clone());
        self.proof_tx_hash = Some(hash);
        self.state = WithdrawalState::Proving;
        Ok((hash, withdrawal))
    }

    /// Wait for the proof on L1. `Proving → Proved`.
    pub async fn await_proof(&mut self, hash: TxHash) -> Result<Arc<Receipt>, BridgeError> {
        self.expect_state("await_proof", WithdrawalState::Proving)?;
        Self::expect_tx_hash("await_proof", self.proof_tx_hash, hash)?;

        let receipt = self.client.wait_for_receipt(Chain::L1, hash).await?;
        if !receipt.status {
            return Err(BridgeError::L1TxReverted(hash));
        }

        info!(
            tx_hash = %hash,
            block_number = receipt.block_number,
            "Withdrawal proven on L1"
        );
        let receipt = Arc::new(receipt);
        self.proof_receipt = Some(receipt.clone());
        self.state = WithdrawalState::Proved;
        Ok(receipt)
    }

    /// Remaining challenge period. Read-only; never transitions.
    pub async fn check_finalizability(&self) -> Result<Duration, BridgeError> {
        self.expect_state("check_finalizability", WithdrawalState::Proved)?;
        let withdrawal = self.captured("check_finalizability")?;

        let remaining = self
            .client
            .time_until_finalizable(withdrawal.withdrawal_hash)
            .await?;
        debug!(remaining_secs = remaining.as_secs(), "Checked finalizability");
        Ok(remaining)
    }

    /// Status of the captured withdrawal on L1. Read-only; never transitions.
    pub async fn check_status(&self) -> Result<WithdrawalStatus, BridgeError> {
        let withdrawal = self.captured("check_status")?;

        let status = self
            .client
            .withdrawal_status(withdrawal.withdrawal_hash)
            .await?;
        debug!(?status, withdrawal_hash = %withdrawal.withdrawal_hash, "Checked withdrawal status");
        Ok(status)
    }

    fn captured(&self, operation: &'static str) -> Result<&Withdrawal, BridgeError> {
        self.withdrawal
            .as_ref()
            .ok_or_else(|| BridgeError::invalid_transition(operation, "no withdrawal captured"))
    }

    /// Wait out the challenge period, then finalize on L1. `Proved → Finalizing`.
    ///
    /// `withdrawal` must be the descriptor captured by [`Self::prove`].
    pub async fn finalize(
        &mut self,
        withdrawal: &Withdrawal,
        signer: &WalletSigner,
    ) -> Result<TxHash, BridgeError> {
        self.expect_state("finalize", WithdrawalState::Proved)?;
        let account = self.account("finalize")?;
        let captured = self.captured("finalize")?;
        if captured != withdrawal {
            return Err(BridgeError::invalid_transition(
                "finalize",
                format!(
                    "withdrawal {} does not match the proven withdrawal {}",
                    withdrawal.withdrawal_hash, captured.withdrawal_hash
                ),
            ));
        }

        self.client
            .wait_until_finalizable(captured.withdrawal_hash)
            .await?;
        let tx = self.client.build_finalization(account, captured).await?;
        let hash = self.client.submit(&tx, signer).await?;

        info!(
            tx_hash = %hash,
            withdrawal_hash = %captured.withdrawal_hash,
            "Withdrawal finalization submitted on L1"
        );
        self.finalization_tx_hash = Some(hash);
        self.state = WithdrawalState::Finalizing;
        Ok(hash)
    }

    /// Wait for the finalization on L1. `Finalizing → Finalized`.
    pub async fn await_finalization(&mut self, hash: TxHash) -> Result<Arc<Receipt>, BridgeError> {
        self.expect_state("await_finalization", WithdrawalState::Finalizing)?;
        Self::expect_tx_hash("await_finalization", self.finalization_tx_hash, hash)?;

        let receipt = self.client.wait_for_receipt(Chain::L1, hash).await?;
        if !receipt.status {
            return Err(BridgeError::L1TxReverted(hash));
        }

        info!(
            tx_hash = %hash,
            block_number = receipt.block_number,
            "Withdrawal finalized on L1"
        );
        let receipt = Arc::new(receipt);
        self.finalization_receipt = Some(receipt.clone());
        self.state = WithdrawalState::Finalized;
        Ok(receipt)
    }
}
