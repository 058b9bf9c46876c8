//! [`ChainClient`] for an OP Stack rollup and its L1, over JSON-RPC.

use crate::{
    chain::ChainClient,
    error::BridgeError,
    types::{Chain, PendingTx, Receipt, ReceiptLog, TransferRequest},
};
use alloy_primitives::{Address, Bytes, Log, TxHash, B256, U256, U64};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use binding::opstack::{IL2ToL1MessagePasser, IOptimismPortal2};
use client::{fill_transaction, retry::with_retry, WalletSigner};
use config::NetworkConfig;
use eyre::eyre;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use withdrawal::{
    proof::generate_proof,
    state::{WithdrawalStateProvider, OVERDUE_GAME_ESTIMATE},
    ProofInput, Withdrawal, WithdrawalHash, WithdrawalStatus,
};

/// Revert reasons the portal gives for a proof submitted too early.
const PREMATURE_PROOF_MARKERS: &[&str] = &[
    "not yet",
    "cannot prove against invalid dispute games",
    "InvalidDisputeGame",
    "ProposalNotValidated",
];

/// Revert reasons the portal gives for a finalization inside the challenge period.
const PREMATURE_FINALIZATION_MARKERS: &[&str] = &[
    "not matured",
    "not been finalized",
    "ProofNotOldEnough",
    "ProposalNotValidated",
];

/// Gas limit used when the node cannot estimate the recipient call.
const FALLBACK_TRANSFER_GAS: u64 = 100_000;

/// Shortest sleep between provability/finalizability reads.
const MIN_POLL_DELAY: Duration = Duration::from_secs(1);

fn matches_any(message: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| message.contains(marker))
}

/// Call from `request.account` to `request.recipient` as it executes on the
/// destination chain. No value is attached: the account may hold nothing there.
fn transfer_call(request: &TransferRequest) -> TransactionRequest {
    TransactionRequest::default()
        .from(request.account)
        .to(request.recipient)
}

/// Gas for the recipient call, or [`FALLBACK_TRANSFER_GAS`] if the node rejects the estimate.
async fn estimate_transfer_gas<P: Provider>(provider: &P, request: &TransferRequest) -> u64 {
    match provider.estimate_gas(transfer_call(request)).await {
        Ok(gas) => gas,
        Err(e) => {
            warn!(
                recipient = %request.recipient,
                error = %e,
                fallback = FALLBACK_TRANSFER_GAS,
                "Gas estimate for recipient call failed"
            );
            FALLBACK_TRANSFER_GAS
        }
    }
}

/// Sleep before the next read when `remaining` is left.
fn poll_delay(remaining: Duration, poll_interval: Duration) -> Duration {
    remaining.min(poll_interval.max(MIN_POLL_DELAY))
}

/// Like [`poll_delay`], but an overdue game backs off to the full interval.
fn provability_poll_delay(remaining: Duration, poll_interval: Duration) -> Duration {
    if remaining <= OVERDUE_GAME_ESTIMATE {
        poll_interval.max(MIN_POLL_DELAY)
    } else {
        poll_delay(remaining, poll_interval)
    }
}

pub struct OpStackClient<P1, P2> {
    l1_provider: P1,
    l2_provider: P2,
    network: NetworkConfig,
    /// Upper bound on how long to sleep between provability/finalizability reads
    proof_poll_interval: Duration,
}

impl<P1, P2> OpStackClient<P1, P2>
where
    P1: Provider,
    P2: Provider,
{
    pub const fn new(
        l1_provider: P1,
        l2_provider: P2,
        network: NetworkConfig,
        proof_poll_interval: Duration,
    ) -> Self {
        Self {
            l1_provider,
            l2_provider,
            network,
            proof_poll_interval,
        }
    }

    fn withdrawal_state(&self) -> WithdrawalStateProvider<&P1> {
        WithdrawalStateProvider::new(
            &self.l1_provider,
            self.network.l2.l1_portal,
            self.network.l2.dispute_game_factory,
        )
    }

    const fn chain_id(&self, chain: Chain) -> u64 {
        match chain {
            Chain::L1 => self.network.l1.chain_id,
            Chain::L2 => self.network.l2.chain_id,
        }
    }

    /// Estimate `tx` on L1 and pin its gas limit, classifying premature reverts.
    async fn estimate_settlement(
        &self,
        mut tx: TransactionRequest,
        premature_markers: &[&str],
        premature: fn(String) -> BridgeError,
    ) -> Result<TransactionRequest, BridgeError> {
        match self.l1_provider.estimate_gas(tx.clone()).await {
            Ok(gas) => {
                tx.gas = Some(gas + gas / 5);
                Ok(tx)
            }
            Err(e) => {
                let message = e.to_string();
                if matches_any(&message, premature_markers) {
                    Err(premature(message))
                } else {
                    Err(eyre::Report::new(e).wrap_err("L1 gas estimation failed").into())
                }
            }
        }
    }

    async fn submit_on<P: Provider>(
        provider: &P,
        chain_id: u64,
        tx: &PendingTx,
        signer: &WalletSigner,
    ) -> Result<TxHash, BridgeError> {
        if signer.chain_id() != chain_id {
            return Err(BridgeError::SubmissionRejected(format!(
                "wallet is connected to chain {}, {} transaction needs chain {chain_id}",
                signer.chain_id(),
                tx.chain
            )));
        }
        if let Some(from) = tx.request.from {
            if from != signer.address() {
                return Err(BridgeError::SubmissionRejected(format!(
                    "transaction is from {from}, wallet signs for {}",
                    signer.address()
                )));
            }
        }

        let filled =
            fill_transaction(tx.request.clone(), provider, signer.address(), chain_id).await?;
        let signed = signer
            .sign(filled)
            .await
            .map_err(|e| BridgeError::SubmissionRejected(format!("{e:#}")))?;

        let pending = provider
            .send_raw_transaction(&signed)
            .await
            .map_err(|e| BridgeError::SubmissionRejected(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    async fn poll_receipt<P: Provider>(
        provider: &P,
        chain: Chain,
        hash: TxHash,
        interval: Duration,
    ) -> Result<Receipt, BridgeError> {
        loop {
            // Fetched raw so that deposit (0x7E) receipts decode on L2
            let receipt = with_retry("eth_getTransactionReceipt", || async move {
                Ok(provider
                    .raw_request::<_, Option<RpcReceipt>>(
                        "eth_getTransactionReceipt".into(),
                        (hash,),
                    )
                    .await?)
            })
            .await?;

            if let Some(receipt) = receipt {
                return Ok(receipt.into_receipt(chain));
            }

            debug!(%chain, tx_hash = %hash, "Receipt not available yet");
            sleep(interval).await;
        }
    }
}

impl<P1, P2> ChainClient for OpStackClient<P1, P2>
where
    P1: Provider,
    P2: Provider,
{
    async fn build_deposit(&self, request: &TransferRequest) -> Result<PendingTx, BridgeError> {
        let gas_limit = estimate_transfer_gas(&self.l2_provider, request).await;

        let portal = IOptimismPortal2::new(self.network.l2.l1_portal, &self.l1_provider);
        let tx = portal
            .depositTransaction(request.recipient, request.amount, gas_limit, false, Bytes::new())
            .value(request.amount)
            .into_transaction_request()
            .from(request.account);

        debug!(l2_gas_limit = gas_limit, portal = %self.network.l2.l1_portal, "Built deposit");
        Ok(PendingTx::l1(tx))
    }

    async fn build_withdrawal_initiation(
        &self,
        request: &TransferRequest,
    ) -> Result<PendingTx, BridgeError> {
        // Gas the message needs when it executes on L1
        let gas_limit = estimate_transfer_gas(&self.l1_provider, request).await;

        let passer = IL2ToL1MessagePasser::new(self.network.l2.message_passer, &self.l2_provider);
        let tx = passer
            .initiateWithdrawal(request.recipient, U256::from(gas_limit), Bytes::new())
            .value(request.amount)
            .into_transaction_request()
            .from(request.account);

        debug!(l1_gas_limit = gas_limit, "Built withdrawal initiation");
        Ok(PendingTx::l2(tx))
    }

    async fn submit(&self, tx: &PendingTx, signer: &WalletSigner) -> Result<TxHash, BridgeError> {
        let chain_id = self.chain_id(tx.chain);
        let hash = match tx.chain {
            Chain::L1 => Self::submit_on(&self.l1_provider, chain_id, tx, signer).await?,
            Chain::L2 => Self::submit_on(&self.l2_provider, chain_id, tx, signer).await?,
        };

        info!(chain = %tx.chain, tx_hash = %hash, from = %signer.address(), "Transaction broadcast");
        Ok(hash)
    }

    async fn wait_for_receipt(&self, chain: Chain, hash: TxHash) -> Result<Receipt, BridgeError> {
        match chain {
            Chain::L1 => {
                Self::poll_receipt(&self.l1_provider, chain, hash, self.network.l1_block_time())
                    .await
            }
            Chain::L2 => {
                Self::poll_receipt(&self.l2_provider, chain, hash, self.network.l2_block_time())
                    .await
            }
        }
    }

    fn derive_l2_tx_id(&self, l1_receipt: &Receipt) -> Result<B256, BridgeError> {
        deposit_l2_tx_id(self.network.l2.l1_portal, l1_receipt)
    }

    async fn time_until_provable(&self, l2_receipt: &Receipt) -> Result<Duration, BridgeError> {
        Ok(self
            .withdrawal_state()
            .time_until_provable(l2_receipt.block_number)
            .await?)
    }

    async fn wait_until_provable(
        &self,
        l2_receipt: &Receipt,
    ) -> Result<(ProofInput, Withdrawal), BridgeError> {
        let withdrawal = Withdrawal::from_logs(l2_receipt.logs(), self.network.l2.message_passer)?;
        let state = self.withdrawal_state();

        loop {
            let remaining = state.time_until_provable(l2_receipt.block_number).await?;
            if remaining.is_zero() {
                break;
            }
            info!(
                withdrawal_hash = %withdrawal.withdrawal_hash,
                remaining_secs = remaining.as_secs(),
                "Waiting for a dispute game to cover the withdrawal"
            );
            sleep(provability_poll_delay(remaining, self.proof_poll_interval)).await;
        }

        let (l1, l2) = (&self.l1_provider, &self.l2_provider);
        let (portal, factory) = (
            self.network.l2.l1_portal,
            self.network.l2.dispute_game_factory,
        );
        let (hash, block) = (withdrawal.withdrawal_hash, l2_receipt.block_number);
        let proof = with_retry("generate_proof", || async move {
            generate_proof(l1, l2, portal, factory, hash, block).await
        })
        .await?;

        Ok((proof, withdrawal))
    }

    async fn build_proof(
        &self,
        account: Address,
        proof: &ProofInput,
        withdrawal: &Withdrawal,
    ) -> Result<PendingTx, BridgeError> {
        let portal = IOptimismPortal2::new(self.network.l2.l1_portal, &self.l1_provider);
        let tx = portal
            .proveWithdrawalTransaction(
                withdrawal.transaction(),
                proof.dispute_game_index,
                proof.output_root_proof(),
                proof.withdrawal_proof.clone(),
            )
            .into_transaction_request()
            .from(account);

        let tx = self
            .estimate_settlement(tx, PREMATURE_PROOF_MARKERS, BridgeError::NotYetProvable)
            .await?;
        Ok(PendingTx::l1(tx))
    }

    async fn time_until_finalizable(
        &self,
        withdrawal_hash: WithdrawalHash,
    ) -> Result<Duration, BridgeError> {
        Ok(self
            .withdrawal_state()
            .time_until_finalizable(withdrawal_hash)
            .await?)
    }

    async fn wait_until_finalizable(
        &self,
        withdrawal_hash: WithdrawalHash,
    ) -> Result<(), BridgeError> {
        let state = self.withdrawal_state();
        loop {
            let remaining = state.time_until_finalizable(withdrawal_hash).await?;
            if remaining.is_zero() {
                return Ok(());
            }
            info!(
                %withdrawal_hash,
                remaining_secs = remaining.as_secs(),
                "Waiting for the challenge period"
            );
            sleep(poll_delay(remaining, self.proof_poll_interval)).await;
        }
    }

    async fn build_finalization(
        &self,
        account: Address,
        withdrawal: &Withdrawal,
    ) -> Result<PendingTx, BridgeError> {
        let hash = withdrawal.withdrawal_hash;
        let state = self.withdrawal_state();

        let remaining = state.time_until_finalizable(hash).await?;
        if !remaining.is_zero() {
            return Err(BridgeError::FinalizationTooEarly(format!(
                "{} seconds of the challenge period remain for {hash}",
                remaining.as_secs()
            )));
        }
        let Some(submitter) = state.latest_proof_submitter(hash).await? else {
            return Err(BridgeError::FinalizationTooEarly(format!(
                "withdrawal {hash} has no proof on L1"
            )));
        };
        if submitter != account {
            warn!(%submitter, %account, "Finalizing against another account's proof");
        }

        let portal = IOptimismPortal2::new(self.network.l2.l1_portal, &self.l1_provider);
        let tx = portal
            .finalizeWithdrawalTransactionExternalProof(withdrawal.transaction(), submitter)
            .into_transaction_request()
            .from(account);

        let tx = self
            .estimate_settlement(
                tx,
                PREMATURE_FINALIZATION_MARKERS,
                BridgeError::FinalizationTooEarly,
            )
            .await?;
        Ok(PendingTx::l1(tx))
    }

    async fn withdrawal_status(
        &self,
        withdrawal_hash: WithdrawalHash,
    ) -> Result<WithdrawalStatus, BridgeError> {
        Ok(self
            .withdrawal_state()
            .query_withdrawal_status(withdrawal_hash)
            .await?)
    }
}

/// Hash of the L2 transaction produced by the first deposit event `portal`
/// emitted in `receipt`.
pub fn deposit_l2_tx_id(portal: Address, receipt: &Receipt) -> Result<B256, BridgeError> {
    let logs = receipt
        .logs
        .iter()
        .filter(|log| log.inner.address == portal)
        .map(|log| (log.log_index, &log.inner));

    let hashes = deposit::l2_transaction_hashes(receipt.block_hash, logs)?;
    hashes.first().copied().ok_or_else(|| {
        eyre!("no TransactionDeposited event from {portal} in {}", receipt.tx_hash).into()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    log_index: U64,
}

/// The receipt fields the flows use, common to Ethereum and OP Stack receipts.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: TxHash,
    block_hash: B256,
    block_number: U64,
    status: Option<U64>,
    gas_used: U64,
    logs: Vec<RpcLog>,
}

impl RpcReceipt {
    fn into_receipt(self, chain: Chain) -> Receipt {
        Receipt {
            chain,
            tx_hash: self.transaction_hash,
            block_hash: self.block_hash,
            block_number: self.block_number.to(),
            status: self.status != Some(U64::ZERO),
            gas_used: self.gas_used.to(),
            logs: self
                .logs
                .into_iter()
                .map(|log| ReceiptLog {
                    log_index: log.log_index.to(),
                    inner: Log::new_unchecked(log.address, log.topics, log.data),
                })
                .collect(),
        }
    }
}
