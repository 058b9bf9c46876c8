//! Drives the bridge flows end to end from the command line.

pub mod config;
pub mod metrics;

use crate::metrics::Metrics;
use bridge::{
    BridgeCoordinator, BridgeError, ChainClient, DepositSnapshot, TransferRequest, WalletSigner,
    WithdrawalSnapshot,
};
use std::{future::Future, time::Instant};
use tracing::{error, info};

/// The user's wallet as connected to each chain. Both sign for the same account.
#[derive(Debug, Clone)]
pub struct Wallets {
    pub l1: WalletSigner,
    pub l2: WalletSigner,
}

async fn step<T>(
    metrics: &Metrics,
    flow: &'static str,
    name: &'static str,
    operation: impl Future<Output = Result<T, BridgeError>>,
) -> Result<T, BridgeError> {
    let started = Instant::now();
    let result = operation.await;

    match &result {
        Ok(_) => metrics.record_step_success(flow, name, started.elapsed()),
        Err(e) => {
            error!(flow, step = name, error = %e, "Step failed");
            metrics.record_step_failure(flow, name, e.kind().as_str());
        }
    }
    result
}

/// Run a deposit from `Idle` to `Complete`.
pub async fn run_deposit<C>(
    coordinator: &BridgeCoordinator<C>,
    request: TransferRequest,
    wallet: &WalletSigner,
    metrics: &Metrics,
) -> Result<DepositSnapshot, BridgeError>
where
    C: ChainClient,
{
    let tx = step(metrics, "deposit", "prepare", coordinator.prepare_deposit(request)).await?;
    let hash = step(metrics, "deposit", "submit", coordinator.submit_deposit(&tx, wallet)).await?;
    step(metrics, "deposit", "await_l1", coordinator.await_deposit_l1(hash)).await?;

    let Some(l2_tx_id) = coordinator.deposit_snapshot().l2_tx_id else {
        return Err(BridgeError::InvalidTransition {
            operation: "await_l2",
            reason: "no L2 transaction id was derived".into(),
        });
    };
    info!(%l2_tx_id, "Waiting for the deposit on L2");
    step(metrics, "deposit", "await_l2", coordinator.await_deposit_l2(l2_tx_id)).await?;

    metrics.record_deposit_completed(request.amount.saturating_to());
    Ok(coordinator.deposit_snapshot())
}

/// Run a withdrawal from `Idle` to `Finalized`.
///
/// Proving and finalizing wait out the dispute game and challenge period delays,
/// so on a public network this takes days.
pub async fn run_withdrawal<C>(
    coordinator: &BridgeCoordinator<C>,
    request: TransferRequest,
    wallets: &Wallets,
    metrics: &Metrics,
) -> Result<WithdrawalSnapshot, BridgeError>
where
    C: ChainClient,
{
    const FLOW: &str = "withdrawal";

    let tx = step(metrics, FLOW, "prepare", coordinator.prepare_withdrawal(request)).await?;
    let hash = step(
        metrics,
        FLOW,
        "initiate",
        coordinator.initiate_withdrawal(&tx, &wallets.l2),
    )
    .await?;
    metrics.record_withdrawal_initiated(request.amount.saturating_to());

    let receipt = step(
        metrics,
        FLOW,
        "await_initiation",
        coordinator.await_withdrawal_initiation(hash),
    )
    .await?;

    let remaining = step(
        metrics,
        FLOW,
        "check_provability",
        coordinator.check_provability(&receipt),
    )
    .await?;
    info!(
        seconds_until_provable = remaining.as_secs(),
        "Withdrawal initiated, proving once a dispute game covers it"
    );

    let (proof_hash, withdrawal) = step(
        metrics,
        FLOW,
        "prove",
        coordinator.prove_withdrawal(&receipt, &wallets.l1),
    )
    .await?;
    step(
        metrics,
        FLOW,
        "await_proof",
        coordinator.await_withdrawal_proof(proof_hash),
    )
    .await?;
    metrics.record_withdrawal_proven();

    let remaining = step(
        metrics,
        FLOW,
        "check_finalizability",
        coordinator.check_finalizability(),
    )
    .await?;
    info!(
        seconds_until_finalizable = remaining.as_secs(),
        withdrawal_hash = %withdrawal.withdrawal_hash,
        "Withdrawal proven, finalizing after the challenge period"
    );

    let finalize_hash = step(
        metrics,
        FLOW,
        "finalize",
        coordinator.finalize_withdrawal(&withdrawal, &wallets.l1),
    )
    .await?;
    step(
        metrics,
        FLOW,
        "await_finalization",
        coordinator.await_withdrawal_finalization(finalize_hash),
    )
    .await?;
    metrics.record_withdrawal_finalized();

    let status = step(
        metrics,
        FLOW,
        "check_status",
        coordinator.check_withdrawal_status(),
    )
    .await?;
    info!(?status, "Withdrawal status on L1");

    Ok(coordinator.withdrawal_snapshot())
}
