//! In-memory [`ChainClient`] and wallets for flow tests.
//!
//! Transaction hashes are handed out in submission order as
//! `B256::repeat_byte(1)`, `B256::repeat_byte(2)`, and so on. Time is tokio time,
//! so tests run with a paused clock.

use crate::{
    chain::ChainClient,
    error::BridgeError,
    types::{Chain, PendingTx, Receipt, TransferRequest},
};
use alloy_primitives::{address, keccak256, Address, Bytes, TxHash, B256, U256};
use alloy_rpc_types::TransactionRequest;
use client::{SignerFn, WalletSigner};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::{sleep, sleep_until, Instant};
use withdrawal::{ProofInput, Withdrawal, WithdrawalHash, WithdrawalStatus};

pub(crate) const L1_CHAIN_ID: u64 = 1;
pub(crate) const L2_CHAIN_ID: u64 = 10;
pub(crate) const ACCOUNT: Address = address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1");
/// L1 timestamp the fake reports for a proof.
pub(crate) const PROVEN_AT: u64 = 1_700_000_000;
pub(crate) const RECIPIENT: Address = address!("000040D6c85A13a1AA74565FDe87e499dC023C6f");

pub(crate) fn transfer() -> TransferRequest {
    TransferRequest::new(ACCOUNT, RECIPIENT, U256::from(1_000_000_000_000_000u64))
}

/// Wallet for `ACCOUNT` connected to `chain_id` that always signs.
pub(crate) fn fake_signer(chain_id: u64) -> WalletSigner {
    let sign: SignerFn = Arc::new(|_tx| Box::pin(async { Ok(Bytes::from_static(&[0x02])) }));
    WalletSigner::new(ACCOUNT, chain_id, sign)
}

/// Wallet for `ACCOUNT` whose user rejects every request.
pub(crate) fn declining_signer(chain_id: u64) -> WalletSigner {
    let sign: SignerFn =
        Arc::new(|_tx| Box::pin(async { Err(eyre::eyre!("User rejected the request.")) }));
    WalletSigner::new(ACCOUNT, chain_id, sign)
}

#[derive(Default)]
struct FakeState {
    submitted: u8,
    known: HashMap<TxHash, Chain>,
    reverted: HashSet<TxHash>,
    calls: Vec<&'static str>,
    hold_receipts: bool,
    proof_premature: bool,
    finalization_premature: bool,
    /// Hash of the submitted proof or finalization, by kind
    proof_tx: Option<TxHash>,
    finalization_tx: Option<TxHash>,
    /// Which kind of transaction the next submission is
    next_submission: Option<&'static str>,
}

pub(crate) struct FakeChainClient {
    state: Mutex<FakeState>,
    provable_at: Instant,
    finalizable_at: Instant,
    withdrawal: Withdrawal,
}

impl FakeChainClient {
    /// Everything is immediately provable and finalizable.
    pub(crate) fn new() -> Self {
        Self::with_delays(Duration::ZERO, Duration::ZERO)
    }

    /// Provable `to_prove` from now; finalizable `to_finalize` after that.
    pub(crate) fn with_delays(to_prove: Duration, to_finalize: Duration) -> Self {
        let provable_at = Instant::now() + to_prove;
        Self {
            state: Mutex::new(FakeState::default()),
            provable_at,
            finalizable_at: provable_at + to_finalize,
            withdrawal: Withdrawal {
                nonce: U256::from(1),
                sender: ACCOUNT,
                target: RECIPIENT,
                value: transfer().amount,
                gas_limit: U256::from(100_000),
                data: Bytes::new(),
                withdrawal_hash: B256::repeat_byte(0xee),
            },
        }
    }

    /// Hash of the `n`th successful submission.
    pub(crate) fn tx_hash(n: u8) -> TxHash {
        B256::repeat_byte(n)
    }

    pub(crate) const fn provable_at(&self) -> Instant {
        self.provable_at
    }

    pub(crate) const fn finalizable_at(&self) -> Instant {
        self.finalizable_at
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    /// Make the receipt for `hash` a failed one.
    pub(crate) fn revert(&self, hash: TxHash) {
        self.lock().reverted.insert(hash);
    }

    /// While held, `wait_for_receipt` never returns.
    pub(crate) fn hold_receipts(&self, hold: bool) {
        self.lock().hold_receipts = hold;
    }

    pub(crate) fn set_proof_premature(&self, premature: bool) {
        self.lock().proof_premature = premature;
    }

    pub(crate) fn set_finalization_premature(&self, premature: bool) {
        self.lock().finalization_premature = premature;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: &'static str) {
        self.lock().calls.push(call);
    }

    fn transaction(chain: Chain, from: Address, value: U256) -> PendingTx {
        PendingTx {
            chain,
            request: TransactionRequest::default().from(from).value(value),
        }
    }
}

impl ChainClient for FakeChainClient {
    async fn build_deposit(&self, request: &TransferRequest) -> Result<PendingTx, BridgeError> {
        self.record("build_deposit");
        Ok(Self::transaction(Chain::L1, request.account, request.amount))
    }

    async fn build_withdrawal_initiation(
        &self,
        request: &TransferRequest,
    ) -> Result<PendingTx, BridgeError> {
        self.record("build_withdrawal_initiation");
        Ok(Self::transaction(Chain::L2, request.account, request.amount))
    }

    async fn submit(&self, tx: &PendingTx, signer: &WalletSigner) -> Result<TxHash, BridgeError> {
        self.record("submit");
        let expected = match tx.chain {
            Chain::L1 => L1_CHAIN_ID,
            Chain::L2 => L2_CHAIN_ID,
        };
        if signer.chain_id() != expected {
            return Err(BridgeError::SubmissionRejected(format!(
                "wallet is on chain {}, transaction is for {}",
                signer.chain_id(),
                tx.chain
            )));
        }

        signer
            .sign(tx.request.clone())
            .await
            .map_err(|e| BridgeError::SubmissionRejected(e.to_string()))?;

        let mut state = self.lock();
        state.submitted += 1;
        let hash = Self::tx_hash(state.submitted);
        state.known.insert(hash, tx.chain);
        match state.next_submission.take() {
            Some("proof") => state.proof_tx = Some(hash),
            Some("finalization") => state.finalization_tx = Some(hash),
            _ => {}
        }
        Ok(hash)
    }

    async fn wait_for_receipt(&self, chain: Chain, hash: TxHash) -> Result<Receipt, BridgeError> {
        self.record("wait_for_receipt");
        loop {
            let held = self.lock().hold_receipts;
            if !held {
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
        sleep(Duration::from_secs(1)).await;

        let state = self.lock();
        if state.known.get(&hash) != Some(&chain) {
            return Err(eyre::eyre!("unknown {chain} transaction {hash}").into());
        }
        Ok(Receipt {
            chain,
            tx_hash: hash,
            block_hash: B256::repeat_byte(0xbb),
            block_number: 100,
            status: !state.reverted.contains(&hash),
            gas_used: 21_000,
            logs: Vec::new(),
        })
    }

    fn derive_l2_tx_id(&self, l1_receipt: &Receipt) -> Result<B256, BridgeError> {
        self.record("derive_l2_tx_id");
        let l2_tx_id = keccak256(l1_receipt.tx_hash);
        self.lock().known.insert(l2_tx_id, Chain::L2);
        Ok(l2_tx_id)
    }

    async fn time_until_provable(&self, _l2_receipt: &Receipt) -> Result<Duration, BridgeError> {
        self.record("time_until_provable");
        Ok(self.provable_at.saturating_duration_since(Instant::now()))
    }

    async fn wait_until_provable(
        &self,
        _l2_receipt: &Receipt,
    ) -> Result<(ProofInput, Withdrawal), BridgeError> {
        self.record("wait_until_provable");
        sleep_until(self.provable_at).await;

        let proof = ProofInput {
            dispute_game_index: U256::from(7),
            withdrawal_proof: vec![Bytes::from_static(&[0x01])],
            ..Default::default()
        };
        Ok((proof, self.withdrawal.clone()))
    }

    async fn build_proof(
        &self,
        account: Address,
        _proof: &ProofInput,
        withdrawal: &Withdrawal,
    ) -> Result<PendingTx, BridgeError> {
        self.record("build_proof");
        if self.lock().proof_premature {
            return Err(BridgeError::NotYetProvable(format!(
                "no game covers {}",
                withdrawal.withdrawal_hash
            )));
        }
        self.lock().next_submission = Some("proof");
        Ok(Self::transaction(Chain::L1, account, U256::ZERO))
    }

    async fn time_until_finalizable(
        &self,
        _withdrawal_hash: WithdrawalHash,
    ) -> Result<Duration, BridgeError> {
        self.record("time_until_finalizable");
        Ok(self.finalizable_at.saturating_duration_since(Instant::now()))
    }

    async fn wait_until_finalizable(
        &self,
        _withdrawal_hash: WithdrawalHash,
    ) -> Result<(), BridgeError> {
        self.record("wait_until_finalizable");
        sleep_until(self.finalizable_at).await;
        Ok(())
    }

    async fn build_finalization(
        &self,
        account: Address,
        withdrawal: &Withdrawal,
    ) -> Result<PendingTx, BridgeError> {
        self.record("build_finalization");
        if self.lock().finalization_premature || Instant::now() < self.finalizable_at {
            return Err(BridgeError::FinalizationTooEarly(format!(
                "proof for {} has not matured",
                withdrawal.withdrawal_hash
            )));
        }
        self.lock().next_submission = Some("finalization");
        Ok(Self::transaction(Chain::L1, account, U256::ZERO))
    }

    /// Proven once a proof is submitted and not reverted, finalized likewise.
    async fn withdrawal_status(
        &self,
        _withdrawal_hash: WithdrawalHash,
    ) -> Result<WithdrawalStatus, BridgeError> {
        self.record("withdrawal_status");
        let state = self.lock();
        let landed = |tx: Option<TxHash>| tx.is_some_and(|hash| !state.reverted.contains(&hash));
        if landed(state.finalization_tx) {
            Ok(WithdrawalStatus::Finalized)
        } else if landed(state.proof_tx) {
            Ok(WithdrawalStatus::Proven {
                timestamp: PROVEN_AT,
            })
        } else {
            Ok(WithdrawalStatus::Initiated)
        }
    }
}
