//! Integration tests for deposits against Ethereum Sepolia → Unichain Sepolia.
//!
//! Run with:
//! ```bash
//! cargo test --package transfer --test deposit -- --ignored
//! ```
#[path = "setup.rs"]
mod setup;

use alloy_primitives::U256;
use bridge::{Chain, ChainClient, DepositState, OpStackClient, TransferRequest};
use setup::{init_tracing, load_test_config, setup_coordinator, setup_provider, setup_wallets};
use transfer::{metrics::Metrics, run_deposit};

/// 0.000001 ETH
const AMOUNT: u64 = 1_000_000_000_000;

#[tokio::test]
#[ignore = "reads Ethereum Sepolia and Unichain Sepolia"]
async fn test_build_deposit() {
    let config = load_test_config();
    let network = config.network_config();
    let eoa = config.eoa_address.expect("eoa_address missing from test config");

    let client = OpStackClient::new(
        setup_provider(&config.l1_rpc_url).await,
        setup_provider(&config.l2_rpc_url).await,
        network.clone(),
        config.proof_poll_interval(),
    );

    let request = TransferRequest::new(eoa, eoa, U256::from(AMOUNT));
    let tx = client
        .build_deposit(&request)
        .await
        .expect("Failed to build deposit");

    println!("Deposit transaction: {:?}", tx.request);
    assert_eq!(tx.chain, Chain::L1);
    assert_eq!(tx.request.from, Some(eoa));
    assert_eq!(tx.request.value, Some(U256::from(AMOUNT)));
    assert_eq!(tx.request.to, Some(network.l2.l1_portal.into()));
}

#[tokio::test]
#[ignore = "requires real funds and submits actual transaction - run with: cargo test -p transfer --test deposit -- --ignored"]
async fn test_deposit_end_to_end() {
    init_tracing();
    let config = load_test_config();
    let wallets = setup_wallets(
        &setup_provider(&config.l1_rpc_url).await,
        &setup_provider(&config.l2_rpc_url).await,
    )
    .await;
    let coordinator = setup_coordinator(&config).await;

    let account = wallets.l1.address();
    let request = TransferRequest::new(account, account, U256::from(AMOUNT));
    let snapshot = run_deposit(&coordinator, request, &wallets.l1, &Metrics::new())
        .await
        .expect("Deposit failed");

    println!("L1 transaction: {:?}", snapshot.l1_tx_hash);
    println!("L2 transaction: {:?}", snapshot.l2_tx_id);
    assert_eq!(snapshot.state, DepositState::Complete);
    assert_eq!(
        snapshot.l2_receipt.map(|receipt| receipt.tx_hash),
        snapshot.l2_tx_id
    );
}
