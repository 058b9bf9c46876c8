//! Single entry point for the presentation layer.
//!
//! Owns one deposit flow and one withdrawal flow. Each flow sits behind a
//! tokio mutex that is only ever `try_lock`ed: a second operation on a busy
//! flow fails with [`BridgeError::InvalidTransition`] instead of queueing.
//! After every operation a fresh snapshot is published on a watch channel.

use crate::{
    chain::ChainClient,
    deposit::{DepositFlow, DepositSnapshot, DepositState},
    error::BridgeError,
    types::{PendingTx, Receipt, TransferRequest},
    withdraw::{WithdrawalFlow, WithdrawalSnapshot, WithdrawalState},
};
use alloy_primitives::{TxHash, B256};
use client::WalletSigner;
use std::{sync::Arc, time::Duration};
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::warn;
use withdrawal::{Withdrawal, WithdrawalStatus};

trait InFlight {
    fn set_in_flight(&mut self, operation: Option<&'static str>);
}

impl InFlight for DepositSnapshot {
    fn set_in_flight(&mut self, operation: Option<&'static str>) {
        self.in_flight = operation;
    }
}

impl InFlight for WithdrawalSnapshot {
    fn set_in_flight(&mut self, operation: Option<&'static str>) {
        self.in_flight = operation;
    }
}

/// Marks an operation as running for as long as it lives, including when the
/// operation's future is dropped midway.
struct InFlightGuard<'a, S: InFlight> {
    snapshot: &'a watch::Sender<S>,
}

impl<'a, S: InFlight> InFlightGuard<'a, S> {
    fn start(snapshot: &'a watch::Sender<S>, operation: &'static str) -> Self {
        snapshot.send_modify(|s| s.set_in_flight(Some(operation)));
        Self { snapshot }
    }
}

impl<S: InFlight> Drop for InFlightGuard<'_, S> {
    fn drop(&mut self) {
        self.snapshot.send_modify(|s| s.set_in_flight(None));
    }
}

pub struct BridgeCoordinator<C> {
    deposit: Mutex<DepositFlow<C>>,
    withdrawal: Mutex<WithdrawalFlow<C>>,
    deposit_snapshot: watch::Sender<DepositSnapshot>,
    withdrawal_snapshot: watch::Sender<WithdrawalSnapshot>,
}

impl<C> BridgeCoordinator<C>
where
    C: ChainClient,
{
    pub fn new(client: C) -> Self {
        let client = Arc::new(client);
        let (deposit_snapshot, _) = watch::channel(DepositSnapshot::default());
        let (withdrawal_snapshot, _) = watch::channel(WithdrawalSnapshot::default());

        Self {
            deposit: Mutex::new(DepositFlow::new(client.clone())),
            withdrawal: Mutex::new(WithdrawalFlow::new(client)),
            deposit_snapshot,
            withdrawal_snapshot,
        }
    }

    pub fn current_deposit_state(&self) -> DepositState {
        self.deposit_snapshot.borrow().state
    }

    pub fn current_withdrawal_state(&self) -> WithdrawalState {
        self.withdrawal_snapshot.borrow().state
    }

    pub fn deposit_snapshot(&self) -> DepositSnapshot {
        self.deposit_snapshot.borrow().clone()
    }

    pub fn withdrawal_snapshot(&self) -> WithdrawalSnapshot {
        self.withdrawal_snapshot.borrow().clone()
    }

    /// Receive a new deposit snapshot after every operation.
    pub fn subscribe_deposit(&self) -> watch::Receiver<DepositSnapshot> {
        self.deposit_snapshot.subscribe()
    }

    /// Receive a new withdrawal snapshot after every operation.
    pub fn subscribe_withdrawal(&self) -> watch::Receiver<WithdrawalSnapshot> {
        self.withdrawal_snapshot.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Deposit
    // ─────────────────────────────────────────────────────────────────────────────

    fn lock_deposit(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, DepositFlow<C>>, BridgeError> {
        self.deposit.try_lock().map_err(|_| {
            let err = BridgeError::invalid_transition(operation, "another deposit operation is in flight");
            warn!(operation, "Deposit busy");
            self.deposit_snapshot
                .send_modify(|s| s.last_error = Some(err.report()));
            err
        })
    }

    fn publish_deposit<T>(&self, flow: &DepositFlow<C>, result: &Result<T, BridgeError>) {
        let last_error = result.as_ref().err().map(BridgeError::report);
        self.deposit_snapshot.send_modify(|s| {
            *s = DepositSnapshot {
                in_flight: s.in_flight,
                last_error,
                ..flow.snapshot()
            };
        });
    }

    pub async fn prepare_deposit(&self, request: TransferRequest) -> Result<PendingTx, BridgeError> {
        let mut flow = self.lock_deposit("prepare")?;
        let _in_flight = InFlightGuard::start(&self.deposit_snapshot, "prepare");
        let result = flow.prepare(request).await;
        self.publish_deposit(&flow, &result);
        result
    }

    pub async fn submit_deposit(
        &self,
        tx: &PendingTx,
        signer: &WalletSigner,
    ) -> Result<TxHash, BridgeError> {
        let mut flow = self.lock_deposit("submit")?;
        let _in_flight = InFlightGuard::start(&self.deposit_snapshot, "submit");
        let result = flow.submit(tx, signer).await;
        self.publish_deposit(&flow, &result);
        result
    }

    pub async fn await_deposit_l1(&self, hash: TxHash) -> Result<Arc<Receipt>, BridgeError> {
        let mut flow = self.lock_deposit("await_l1")?;
        let _in_flight = InFlightGuard::start(&self.deposit_snapshot, "await_l1");
        let result = flow.await_l1(hash).await;
        self.publish_deposit(&flow, &result);
        result
    }

    pub async fn await_deposit_l2(&self, l2_tx_id: B256) -> Result<Arc<Receipt>, BridgeError> {
        let mut flow = self.lock_deposit("await_l2")?;
        let _in_flight = InFlightGuard::start(&self.deposit_snapshot, "await_l2");
        let result = flow.await_l2(l2_tx_id).await;
        self.publish_deposit(&flow, &result);
        result
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Withdrawal
    // ─────────────────────────────────────────────────────────────────────────────

    fn lock_withdrawal(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, WithdrawalFlow<C>>, BridgeError> {
        self.withdrawal.try_lock().map_err(|_| {
            let err =
                BridgeError::invalid_transition(operation, "another withdrawal operation is in flight");
            warn!(operation, "Withdrawal busy");
            self.withdrawal_snapshot
                .send_modify(|s| s.last_error = Some(err.report()));
            err
        })
    }

    fn publish_withdrawal<T>(&self, flow: &WithdrawalFlow<C>, result: &Result<T, BridgeError>) {
        let last_error = result.as_ref().err().map(BridgeError::report);
        self.withdrawal_snapshot.send_modify(|s| {
            *s = WithdrawalSnapshot {
                seconds_until_provable: s.seconds_until_provable,
                seconds_until_finalizable: s.seconds_until_finalizable,
                status: s.status,
                in_flight: s.in_flight,
                last_error,
                ..flow.snapshot()
            };
        });
    }

    pub async fn prepare_withdrawal(
        &self,
        request: TransferRequest,
    ) -> Result<PendingTx, BridgeError> {
        let mut flow = self.lock_withdrawal("prepare")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "prepare");
        let result = flow.prepare(request).await;
        self.publish_withdrawal(&flow, &result);
        result
    }

    pub async fn initiate_withdrawal(
        &self,
        tx: &PendingTx,
        signer: &WalletSigner,
    ) -> Result<TxHash, BridgeError> {
        let mut flow = self.lock_withdrawal("initiate")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "initiate");
        let result = flow.initiate(tx, signer).await;
        self.publish_withdrawal(&flow, &result);
        result
    }

    pub async fn await_withdrawal_initiation(
        &self,
        hash: TxHash,
    ) -> Result<Arc<Receipt>, BridgeError> {
        let mut flow = self.lock_withdrawal("await_initiation")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "await_initiation");
        let result = flow.await_initiation(hash).await;
        self.publish_withdrawal(&flow, &result);
        result
    }

    /// Read the provability delay and keep it in the snapshot. Never transitions.
    pub async fn check_provability(&self, receipt: &Receipt) -> Result<Duration, BridgeError> {
        let flow = self.lock_withdrawal("check_provability")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "check_provability");
        let result = flow.check_provability(receipt).await;
        self.publish_withdrawal(&flow, &result);
        if let Ok(remaining) = &result {
            self.withdrawal_snapshot
                .send_modify(|s| s.seconds_until_provable = Some(remaining.as_secs()));
        }
        result
    }

    pub async fn prove_withdrawal(
        &self,
        receipt: &Receipt,
        signer: &WalletSigner,
    ) -> Result<(TxHash, Withdrawal), BridgeError> {
        let mut flow = self.lock_withdrawal("prove")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "prove");
        let result = flow.prove(receipt, signer).await;
        self.publish_withdrawal(&flow, &result);
        if result.is_ok() {
            self.withdrawal_snapshot
                .send_modify(|s| s.seconds_until_provable = Some(0));
        }
        result
    }

    pub async fn await_withdrawal_proof(&self, hash: TxHash) -> Result<Arc<Receipt>, BridgeError> {
        let mut flow = self.lock_withdrawal("await_proof")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "await_proof");
        let result = flow.await_proof(hash).await;
        self.publish_withdrawal(&flow, &result);
        result
    }

    /// Read the remaining challenge period and keep it in the snapshot. Never transitions.
    pub async fn check_finalizability(&self) -> Result<Duration, BridgeError> {
        let flow = self.lock_withdrawal("check_finalizability")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "check_finalizability");
        let result = flow.check_finalizability().await;
        self.publish_withdrawal(&flow, &result);
        if let Ok(remaining) = &result {
            self.withdrawal_snapshot
                .send_modify(|s| s.seconds_until_finalizable = Some(remaining.as_secs()));
        }
        result
    }

    pub async fn finalize_withdrawal(
        &self,
        withdrawal: &Withdrawal,
        signer: &WalletSigner,
    ) -> Result<TxHash, BridgeError> {
        let mut flow = self.lock_withdrawal("finalize")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "finalize");
        let result = flow.finalize(withdrawal, signer).await;
        self.publish_withdrawal(&flow, &result);
        if result.is_ok() {
            self.withdrawal_snapshot
                .send_modify(|s| s.seconds_until_finalizable = Some(0));
        }
        result
    }

    pub async fn await_withdrawal_finalization(
        &self,
        hash: TxHash,
    ) -> Result<Arc<Receipt>, BridgeError> {
        let mut flow = self.lock_withdrawal("await_finalization")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "await_finalization");
        let result = flow.await_finalization(hash).await;
        self.publish_withdrawal(&flow, &result);
        result
    }

    /// Read the withdrawal's status on L1 and keep it in the snapshot. Never transitions.
    pub async fn check_withdrawal_status(&self) -> Result<WithdrawalStatus, BridgeError> {
        let flow = self.lock_withdrawal("check_status")?;
        let _in_flight = InFlightGuard::start(&self.withdrawal_snapshot, "check_status");
        let result = flow.check_status().await;
        self.publish_withdrawal(&flow, &result);
        if let Ok(status) = &result {
            let status = *status;
            self.withdrawal_snapshot
                .send_modify(|s| s.status = Some(status));
        }
        result
    }
}
