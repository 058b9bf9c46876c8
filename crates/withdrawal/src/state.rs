//! On-chain status and timing of a withdrawal, read from L1.

use crate::{
    proof::{game_l2_block, latest_games},
    types::{WithdrawalHash, WithdrawalStatus},
};
use alloy_contract::private::Provider;
use alloy_primitives::{Address, U256};
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::opstack::{IOptimismPortal2, IOptimismPortal2::ProvenWithdrawal};
use client::retry::with_retry;
use eyre::eyre;
use std::time::Duration;
use tracing::debug;

/// Games sampled to estimate the proposal interval.
const GAME_SAMPLE: u64 = 10;

/// Proposal interval assumed when fewer than two games exist.
const DEFAULT_GAME_INTERVAL_SECS: u64 = 3600;

/// Reported for an uncovered withdrawal once the next game is overdue.
pub const OVERDUE_GAME_ESTIMATE: Duration = Duration::from_secs(1);

pub struct WithdrawalStateProvider<P> {
    l1_provider: P,
    portal_address: Address,
    factory_address: Address,
}

impl<P> WithdrawalStateProvider<P>
where
    P: Provider,
{
    pub const fn new(l1_provider: P, portal_address: Address, factory_address: Address) -> Self {
        Self {
            l1_provider,
            portal_address,
            factory_address,
        }
    }

    /// Finalized, else proven by the latest submitter, else initiated.
    pub async fn query_withdrawal_status(
        &self,
        hash: WithdrawalHash,
    ) -> eyre::Result<WithdrawalStatus> {
        if self.is_finalized(hash).await? {
            return Ok(WithdrawalStatus::Finalized);
        }

        if let Some(submitter) = self.latest_proof_submitter(hash).await? {
            if let Some(proven) = self.is_proven(hash, submitter).await? {
                return Ok(WithdrawalStatus::Proven {
                    timestamp: proven.timestamp,
                });
            }
        }

        Ok(WithdrawalStatus::Initiated)
    }

    pub async fn is_finalized(&self, hash: WithdrawalHash) -> eyre::Result<bool> {
        let portal = &IOptimismPortal2::new(self.portal_address, &self.l1_provider);
        with_retry("finalizedWithdrawals", || async move {
            Ok(portal.finalizedWithdrawals(hash).call().await?)
        })
        .await
    }

    pub async fn is_proven(
        &self,
        hash: WithdrawalHash,
        proof_submitter: Address,
    ) -> eyre::Result<Option<ProvenWithdrawal>> {
        let portal = &IOptimismPortal2::new(self.portal_address, &self.l1_provider);
        let proven = with_retry("provenWithdrawals", || async move {
            Ok(portal.provenWithdrawals(hash, proof_submitter).call().await?)
        })
        .await?;

        if proven.timestamp == 0 {
            Ok(None)
        } else {
            Ok(Some(ProvenWithdrawal {
                disputeGameProxy: proven.disputeGameProxy,
                timestamp: proven.timestamp,
            }))
        }
    }

    /// Most recent account that proved this withdrawal, if any.
    pub async fn latest_proof_submitter(
        &self,
        hash: WithdrawalHash,
    ) -> eyre::Result<Option<Address>> {
        let portal = &IOptimismPortal2::new(self.portal_address, &self.l1_provider);
        let count = with_retry("numProofSubmitters", || async move {
            Ok(portal.numProofSubmitters(hash).call().await?)
        })
        .await?;

        if count == U256::ZERO {
            return Ok(None);
        }

        let index = count - U256::from(1);
        let submitter = with_retry("proofSubmitters", || async move {
            Ok(portal.proofSubmitters(hash, index).call().await?)
        })
        .await?;

        Ok(Some(submitter))
    }

    pub async fn proof_maturity_delay(&self) -> eyre::Result<Duration> {
        let portal = &IOptimismPortal2::new(self.portal_address, &self.l1_provider);
        let delay = with_retry("proofMaturityDelaySeconds", || async move {
            Ok(portal.proofMaturityDelaySeconds().call().await?)
        })
        .await?;

        Ok(Duration::from_secs(delay.saturating_to::<u64>()))
    }

    /// Timestamp of the latest L1 block. All challenge-period math uses L1 time.
    pub async fn l1_timestamp(&self) -> eyre::Result<u64> {
        let provider = &self.l1_provider;
        let block = with_retry("latest L1 block", || async move {
            provider
                .get_block_by_number(BlockNumberOrTag::Latest)
                .await?
                .ok_or_else(|| eyre!("latest L1 block not available"))
        })
        .await?;

        Ok(block.header.timestamp)
    }

    /// Time until a withdrawal initiated at `l2_block` can be proven.
    ///
    /// Zero once the newest game covers the block. Otherwise an estimate of when
    /// the next game lands, never below [`OVERDUE_GAME_ESTIMATE`]. The estimate
    /// can go back up when a game lands that does not cover the block.
    pub async fn time_until_provable(&self, l2_block: u64) -> eyre::Result<Duration> {
        let provider = &self.l1_provider;
        let (portal, factory) = (self.portal_address, self.factory_address);
        let games = with_retry("findLatestGames", || async move {
            latest_games(provider, portal, factory, GAME_SAMPLE).await
        })
        .await?;

        if let Some(newest) = games.first() {
            let newest_block = with_retry("l2BlockNumber", || async move {
                game_l2_block(provider, newest).await
            })
            .await?;

            if newest_block >= l2_block {
                debug!(newest_block, l2_block, "Withdrawal block covered by newest game");
                return Ok(Duration::ZERO);
            }
        }

        let timestamps: Vec<u64> = games.iter().map(|g| g.timestamp).collect();
        let now = self.l1_timestamp().await?;
        let remaining = estimate_time_to_next_game(&timestamps, now);

        debug!(
            l2_block,
            games = timestamps.len(),
            remaining_secs = remaining.as_secs(),
            "Withdrawal not yet covered by a game"
        );
        Ok(remaining)
    }

    /// Time until the proven withdrawal clears the proof maturity delay.
    ///
    /// An unproven withdrawal reports the full delay.
    pub async fn time_until_finalizable(&self, hash: WithdrawalHash) -> eyre::Result<Duration> {
        let delay = self.proof_maturity_delay().await?;

        let Some(submitter) = self.latest_proof_submitter(hash).await? else {
            return Ok(delay);
        };
        let Some(proven) = self.is_proven(hash, submitter).await? else {
            return Ok(delay);
        };

        let now = self.l1_timestamp().await?;
        Ok(remaining_maturity(proven.timestamp, delay, now))
    }
}

/// Estimate the wait for the next game from recent game timestamps (newest first).
///
/// The mean interval is padded by 10% and the time since the newest game is
/// subtracted. An overdue game reports [`OVERDUE_GAME_ESTIMATE`].
pub fn estimate_time_to_next_game(timestamps: &[u64], now: u64) -> Duration {
    let interval = if timestamps.len() < 2 {
        DEFAULT_GAME_INTERVAL_SECS
    } else {
        let gaps: Vec<u64> = timestamps
            .windows(2)
            .map(|pair| pair[0].saturating_sub(pair[1]))
            .collect();
        let mean = gaps.iter().sum::<u64>() / gaps.len() as u64;
        (mean * 11).div_ceil(10)
    };

    let elapsed = timestamps
        .first()
        .map_or(0, |newest| now.saturating_sub(*newest));

    Duration::from_secs(interval.saturating_sub(elapsed)).max(OVERDUE_GAME_ESTIMATE)
}

/// Remaining maturity delay for a proof recorded at `proven_at`.
pub fn remaining_maturity(proven_at: u64, delay: Duration, now: u64) -> Duration {
    let matures_at = proven_at.saturating_add(delay.as_secs());
    Duration::from_secs(matures_at.saturating_sub(now))
}
