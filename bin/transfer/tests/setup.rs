//! Common test setup utilities shared across integration tests.
#![allow(dead_code)] // used in ignored tests

use alloy_provider::Provider;
use bridge::{BridgeCoordinator, OpStackClient, WalletSigner};
use serde::Deserialize;
use transfer::{config::Config, Wallets};

/// Install a fmt subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Local configuration with private key (git-ignored file)
#[derive(Debug, Deserialize)]
struct LocalConfig {
    private_key: String,
}

/// Load test configuration. Panics if not found or invalid.
pub fn load_test_config() -> Config {
    Config::from_file("tests/test-config.toml").expect("Failed to load tests/test-config.toml.")
}

/// Load private key for signing transactions.
///
/// Tries multiple sources in order:
/// 1. PRIVATE_KEY environment variable
/// 2. tests/test-config.local.toml file (git-ignored)
///
/// Returns None if no private key is found.
pub fn load_private_key() -> Option<String> {
    if let Ok(pk) = std::env::var("PRIVATE_KEY") {
        eprintln!("✓ Loaded private key from PRIVATE_KEY environment variable");
        return Some(pk);
    }

    let local_config_path = "tests/test-config.local.toml";
    if let Ok(contents) = std::fs::read_to_string(local_config_path) {
        if let Ok(config) = toml::from_str::<LocalConfig>(&contents) {
            eprintln!("✓ Loaded private key from {}", local_config_path);
            return Some(config.private_key);
        }
    }

    eprintln!("⚠ No private key found. Checked:");
    eprintln!("  1. PRIVATE_KEY environment variable");
    eprintln!("  2. tests/test-config.local.toml file");
    None
}

pub async fn setup_provider(url: &str) -> impl Provider + Clone {
    client::create_provider(url)
        .await
        .expect("Failed to create provider")
}

/// Local wallets on both chains.
///
/// # Panics
/// Panics if no private key is found or if the private key is invalid.
pub async fn setup_wallets<P1, P2>(l1: &P1, l2: &P2) -> Wallets
where
    P1: Provider + Clone + 'static,
    P2: Provider + Clone + 'static,
{
    let private_key = load_private_key().expect(
        "Private key required for transaction signing.\n\
         Set PRIVATE_KEY environment variable or create tests/test-config.local.toml\n\
         See tests/test-config.local.toml.example for template.",
    );

    let l1_chain_id = l1.get_chain_id().await.expect("Failed to read L1 chain id");
    let l2_chain_id = l2.get_chain_id().await.expect("Failed to read L2 chain id");
    let wallets = Wallets {
        l1: WalletSigner::local(&private_key, l1_chain_id, l1.clone())
            .expect("Invalid private key format. Expected hex string with optional 0x prefix."),
        l2: WalletSigner::local(&private_key, l2_chain_id, l2.clone())
            .expect("Invalid private key format. Expected hex string with optional 0x prefix."),
    };

    eprintln!("✓ Created signer with address: {}", wallets.l1.address());
    wallets
}

/// Coordinator over the configured testnet.
pub async fn setup_coordinator(
    config: &Config,
) -> BridgeCoordinator<OpStackClient<impl Provider + Clone, impl Provider + Clone>> {
    let l1 = setup_provider(&config.l1_rpc_url).await;
    let l2 = setup_provider(&config.l2_rpc_url).await;
    BridgeCoordinator::new(OpStackClient::new(
        l1,
        l2,
        config.network_config(),
        config.proof_poll_interval(),
    ))
}
