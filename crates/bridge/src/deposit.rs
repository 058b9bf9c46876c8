//! L1 → L2 deposit flow.
//!
//! `Idle → Preparing → AwaitingL1 → AwaitingL2 → Complete`. Linear, no cycles.
//!
//! Every operation checks its source state first and records the transition
//! only after all of its awaits have completed. Dropping an operation's future
//! therefore leaves the flow exactly where it was, and the operation can be
//! called again.

use crate::{
    chain::ChainClient,
    error::BridgeError,
    types::{Chain, PendingTx, Receipt, TransferRequest},
};
use alloy_primitives::{TxHash, B256};
use client::WalletSigner;
use serde::Serialize;
use std::{fmt, sync::Arc};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositState {
    #[default]
    Idle,
    Preparing,
    AwaitingL1,
    AwaitingL2,
    Complete,
}

impl DepositState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::AwaitingL1 => "awaiting_l1",
            Self::AwaitingL2 => "awaiting_l2",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for DepositState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation view of a deposit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositSnapshot {
    pub state: DepositState,
    pub request: Option<TransferRequest>,
    pub l1_tx_hash: Option<TxHash>,
    pub l1_receipt: Option<Arc<Receipt>>,
    pub l2_tx_id: Option<B256>,
    pub l2_receipt: Option<Arc<Receipt>>,
    /// Operation currently running, if any
    pub in_flight: Option<&'static str>,
    pub last_error: Option<crate::error::ErrorReport>,
}

pub struct DepositFlow<C> {
    client: Arc<C>,
    state: DepositState,
    request: Option<TransferRequest>,
    l1_tx_hash: Option<TxHash>,
    l1_receipt: Option<Arc<Receipt>>,
    l2_tx_id: Option<B256>,
    l2_receipt: Option<Arc<Receipt>>,
}

impl<C> DepositFlow<C>
where
    C: ChainClient,
{
    pub const fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: DepositState::Idle,
            request: None,
            l1_tx_hash: None,
            l1_receipt: None,
            l2_tx_id: None,
            l2_receipt: None,
        }
    }

    pub const fn state(&self) -> DepositState {
        self.state
    }

    /// L2 transaction id derived from the L1 receipt.
    pub const fn l2_tx_id(&self) -> Option<B256> {
        self.l2_tx_id
    }

    pub fn l1_receipt(&self) -> Option<Arc<Receipt>> {
        self.l1_receipt.clone()
    }

    pub fn snapshot(&self) -> DepositSnapshot {
        DepositSnapshot {
            state: self.state,
            request: self.request,
            l1_tx_hash: self.l1_tx_hash,
            l1_receipt: self.l1_receipt.clone(),
            l2_tx_id: self.l2_tx_id,
            l2_receipt: self.l2_receipt.clone(),
            in_flight: None,
            last_error: None,
        }
    }

    fn expect_state(&self, operation: &'static str, expected: DepositState) -> Result<(), BridgeError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(BridgeError::invalid_transition(
                operation,
                format!("deposit is {}, expected {}", self.state, expected),
            ))
        }
    }

    /// Validate `request` and build the L1 deposit. `Idle → Preparing`.
    pub async fn prepare(&mut self, request: TransferRequest) -> Result<PendingTx, BridgeError> {
        self.expect_state("prepare", DepositState::Idle)?;
        request.validate()?;

        let tx = self.client.build_deposit(&request).await?;

        info!(
            account = %request.account,
            recipient = %request.recipient,
            amount = %request.amount,
            "Deposit prepared"
        );
        self.request = Some(request);
        self.state = DepositState::Preparing;
        Ok(tx)
    }

    /// Sign and broadcast the deposit on L1. `Preparing → AwaitingL1`.
    pub async fn submit(
        &mut self,
        tx: &PendingTx,
        signer: &WalletSigner,
    ) -> Result<TxHash, BridgeError> {
        self.expect_state("submit", DepositState::Preparing)?;
        if tx.chain != Chain::L1 {
            return Err(BridgeError::invalid_transition(
                "submit",
                format!("deposits are submitted on l1, got a {} transaction", tx.chain),
            ));
        }

        let hash = self.client.submit(tx, signer).await?;

        info!(tx_hash = %hash, "Deposit submitted on L1");
        self.l1_tx_hash = Some(hash);
        self.state = DepositState::AwaitingL1;
        Ok(hash)
    }

    /// Wait for L1 inclusion and derive the L2 transaction id. `AwaitingL1 → AwaitingL2`.
    pub async fn await_l1(&mut self, hash: TxHash) -> Result<Arc<Receipt>, BridgeError> {
        self.expect_state("await_l1", DepositState::AwaitingL1)?;
        if self.l1_tx_hash != Some(hash) {
            return Err(BridgeError::invalid_transition(
                "await_l1",
                format!("{hash} is not the submitted deposit"),
            ));
        }

        let receipt = self.client.wait_for_receipt(Chain::L1, hash).await?;
        if !receipt.status {
            return Err(BridgeError::L1TxReverted(hash));
        }
        let l2_tx_id = self.client.derive_l2_tx_id(&receipt)?;

        info!(
            tx_hash = %hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            l2_tx_id = %l2_tx_id,
            "Deposit included on L1"
        );
        let receipt = Arc::new(receipt);
        self.l1_receipt = Some(receipt.clone());
        self.l2_tx_id = Some(l2_tx_id);
        self.state = DepositState::AwaitingL2;
        Ok(receipt)
    }

    /// Wait for the derived transaction on L2. `AwaitingL2 → Complete`.
    pub async fn await_l2(&mut self, l2_tx_id: B256) -> Result<Arc<Receipt>, BridgeError> {
        self.expect_state("await_l2", DepositState::AwaitingL2)?;
        if self.l2_tx_id != Some(l2_tx_id) {
            return Err(BridgeError::invalid_transition(
                "await_l2",
                format!("{l2_tx_id} is not the derived L2 transaction"),
            ));
        }

        let receipt = self.client.wait_for_receipt(Chain::L2, l2_tx_id).await?;
        if !receipt.status {
            return Err(BridgeError::L2TxReverted(l2_tx_id));
        }

        info!(
            l2_tx_id = %l2_tx_id,
            block_number = receipt.block_number,
            "Deposit included on L2"
        );
        let receipt = Arc::new(receipt);
        self.l2_receipt = Some(receipt.clone());
        self.state = DepositState::Complete;
        Ok(receipt)
    }
}
