//! Integration tests for withdrawals against Unichain Sepolia → Ethereum Sepolia.
//!
//! Run with:
//! ```bash
//! cargo test --package transfer --test withdraw -- --ignored
//! ```
#[path = "setup.rs"]
mod setup;

use alloy_primitives::{B256, U256};
use bridge::{Chain, ChainClient, OpStackClient, TransferRequest, WithdrawalState};
use setup::{init_tracing, load_test_config, setup_coordinator, setup_provider, setup_wallets};
use std::time::Duration;

/// 0.000001 ETH
const AMOUNT: u64 = 1_000_000_000_000;

async fn setup_client(
) -> OpStackClient<impl alloy_provider::Provider + Clone, impl alloy_provider::Provider + Clone> {
    let config = load_test_config();
    OpStackClient::new(
        setup_provider(&config.l1_rpc_url).await,
        setup_provider(&config.l2_rpc_url).await,
        config.network_config(),
        config.proof_poll_interval(),
    )
}

#[tokio::test]
#[ignore = "reads Ethereum Sepolia and Unichain Sepolia"]
async fn test_build_withdrawal_initiation() {
    let config = load_test_config();
    let eoa = config.eoa_address.expect("eoa_address missing from test config");
    let client = setup_client().await;

    let request = TransferRequest::new(eoa, eoa, U256::from(AMOUNT));
    let tx = client
        .build_withdrawal_initiation(&request)
        .await
        .expect("Failed to build withdrawal initiation");

    println!("Initiation transaction: {:?}", tx.request);
    assert_eq!(tx.chain, Chain::L2);
    assert_eq!(tx.request.value, Some(U256::from(AMOUNT)));
    assert_eq!(
        tx.request.to,
        Some(config.network_config().l2.message_passer.into())
    );
}

#[tokio::test]
#[ignore = "reads Ethereum Sepolia"]
async fn test_unproven_withdrawal_reports_full_delay() {
    let client = setup_client().await;

    let remaining = client
        .time_until_finalizable(B256::repeat_byte(0x42))
        .await
        .expect("Failed to read finalizability");

    println!("Proof maturity delay: {}s", remaining.as_secs());
    assert!(remaining > Duration::ZERO);
}

#[tokio::test]
#[ignore = "requires real funds and submits actual transaction - run with: cargo test -p transfer --test withdraw -- --ignored"]
async fn test_initiate_and_check_provability() {
    init_tracing();
    let config = load_test_config();
    let wallets = setup_wallets(
        &setup_provider(&config.l1_rpc_url).await,
        &setup_provider(&config.l2_rpc_url).await,
    )
    .await;
    let coordinator = setup_coordinator(&config).await;

    let account = wallets.l2.address();
    let request = TransferRequest::new(account, account, U256::from(AMOUNT));
    let tx = coordinator
        .prepare_withdrawal(request)
        .await
        .expect("Failed to prepare withdrawal");
    let hash = coordinator
        .initiate_withdrawal(&tx, &wallets.l2)
        .await
        .expect("Failed to initiate withdrawal");
    let receipt = coordinator
        .await_withdrawal_initiation(hash)
        .await
        .expect("Initiation not included");

    println!("Initiation: {hash} in L2 block {}", receipt.block_number);

    for _ in 0..2 {
        let remaining = coordinator
            .check_provability(&receipt)
            .await
            .expect("Failed to check provability");
        println!("Seconds until provable: {}", remaining.as_secs());
    }

    assert_eq!(
        coordinator.current_withdrawal_state(),
        WithdrawalState::ReadyToCheckProvability
    );
    assert!(coordinator
        .withdrawal_snapshot()
        .seconds_until_provable
        .is_some());
}
