use alloy_primitives::utils::format_ether;
use alloy_provider::Provider;
use bridge::{
    BridgeCoordinator, DepositSnapshot, OpStackClient, TransferRequest, WalletSigner,
    WithdrawalSnapshot,
};
use clap::{Args, Parser, Subcommand};
use client::RemoteSigner;
use eyre::bail;
use serde::Serialize;
use tracing::{info, warn};
use transfer::{
    config::Config,
    metrics::{install_prometheus_exporter, Metrics},
    run_deposit, run_withdrawal, Wallets,
};

#[derive(Parser)]
#[command(name = "transfer")]
#[command(about = "Move ETH between L1 and an OP Stack rollup")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Remote wallet connected to L1 (used instead of a private key)
    #[arg(long, requires = "l2_signer_url")]
    l1_signer_url: Option<String>,

    /// Remote wallet connected to L2 (used instead of a private key)
    #[arg(long, requires = "l1_signer_url")]
    l2_signer_url: Option<String>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deposit ETH from L1 to L2
    Deposit(TransferArgs),

    /// Withdraw ETH from L2 to L1 (initiate, prove, finalize)
    Withdraw(TransferArgs),
}

#[derive(Args)]
struct TransferArgs {
    /// Recipient on the destination chain, defaults to the configured EOA or the sender
    #[arg(long)]
    to: Option<String>,

    /// Amount in ETH, e.g. 0.01
    #[arg(long)]
    amount: String,
}

async fn connect_wallets<P1, P2>(cli: &Cli, l1: &P1, l2: &P2) -> eyre::Result<Wallets>
where
    P1: Provider + Clone + 'static,
    P2: Provider + Clone + 'static,
{
    let wallets = match (&cli.l1_signer_url, &cli.l2_signer_url, &cli.private_key) {
        (Some(l1_url), Some(l2_url), _) => Wallets {
            l1: WalletSigner::remote(RemoteSigner::connect(l1_url.as_str()).await?, l1.clone()),
            l2: WalletSigner::remote(RemoteSigner::connect(l2_url.as_str()).await?, l2.clone()),
        },
        (None, None, Some(private_key)) => Wallets {
            l1: WalletSigner::local(private_key, l1.get_chain_id().await?, l1.clone())?,
            l2: WalletSigner::local(private_key, l2.get_chain_id().await?, l2.clone())?,
        },
        _ => bail!("pass --private-key (or PRIVATE_KEY), or both --l1-signer-url and --l2-signer-url"),
    };

    if wallets.l1.address() != wallets.l2.address() {
        bail!(
            "L1 wallet signs for {} but L2 wallet signs for {}",
            wallets.l1.address(),
            wallets.l2.address()
        );
    }
    Ok(wallets)
}

fn print_json<T: Serialize>(snapshot: &T) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

fn print_deposit(snapshot: &DepositSnapshot) {
    println!("deposit: {}", snapshot.state);
    if let Some(hash) = snapshot.l1_tx_hash {
        println!("  L1 transaction: {hash}");
    }
    if let Some(id) = snapshot.l2_tx_id {
        println!("  L2 transaction: {id}");
    }
    if let Some(error) = &snapshot.last_error {
        println!("  last error ({}): {}", error.kind, error.message);
    }
}

fn print_withdrawal(snapshot: &WithdrawalSnapshot) {
    println!("withdrawal: {}", snapshot.state);
    if let Some(hash) = snapshot.initiation_tx_hash {
        println!("  L2 initiation: {hash}");
    }
    if let Some(seconds) = snapshot.seconds_until_provable {
        println!("  seconds until provable: {seconds}");
    }
    if let Some(withdrawal) = &snapshot.withdrawal {
        println!("  withdrawal hash: {}", withdrawal.withdrawal_hash);
    }
    if let Some(hash) = snapshot.proof_tx_hash {
        println!("  L1 proof: {hash}");
    }
    if let Some(seconds) = snapshot.seconds_until_finalizable {
        println!("  seconds until finalizable: {seconds}");
    }
    if let Some(hash) = snapshot.finalization_tx_hash {
        println!("  L1 finalization: {hash}");
    }
    if let Some(status) = snapshot.status {
        println!("  status on L1: {status:?}");
    }
    if let Some(error) = &snapshot.last_error {
        println!("  last error ({}): {}", error.kind, error.message);
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;
    let network = config.network_config();

    info!("Loaded config:");
    info!("  Network: {:?}", config.network);
    info!("  L1 Portal: {}", network.l2.l1_portal);
    info!("  Dispute game factory: {}", network.l2.dispute_game_factory);

    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Serving metrics");
    }
    let metrics = Metrics::new();

    let l1_provider = client::create_provider(&config.l1_rpc_url).await?;
    let l2_provider = client::create_provider(&config.l2_rpc_url).await?;

    let (l1_chain_id, l2_chain_id) = (
        l1_provider.get_chain_id().await?,
        l2_provider.get_chain_id().await?,
    );
    if l1_chain_id != network.l1.chain_id || l2_chain_id != network.l2.chain_id {
        warn!(
            l1_chain_id,
            l2_chain_id,
            expected_l1 = network.l1.chain_id,
            expected_l2 = network.l2.chain_id,
            "RPC endpoints do not match the configured network"
        );
    }

    let wallets = connect_wallets(&cli, &l1_provider, &l2_provider).await?;
    let account = wallets.l1.address();

    let client = OpStackClient::new(
        l1_provider,
        l2_provider,
        network,
        config.proof_poll_interval(),
    );
    let coordinator = BridgeCoordinator::new(client);

    let args = match &cli.command {
        Command::Deposit(args) | Command::Withdraw(args) => args,
    };
    let recipient = args
        .to
        .clone()
        .or_else(|| config.eoa_address.map(|address| address.to_string()))
        .unwrap_or_else(|| account.to_string());
    let request = TransferRequest::parse(account, &recipient, &args.amount)?;

    info!(
        %account,
        recipient = %request.recipient,
        amount = %format_ether(request.amount),
        "Starting transfer"
    );

    let outcome = match &cli.command {
        Command::Deposit(_) => {
            let result = tokio::select! {
                result = run_deposit(&coordinator, request, &wallets.l1, &metrics) => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            };
            let snapshot = coordinator.deposit_snapshot();
            if cli.json {
                print_json(&snapshot)?;
            } else {
                print_deposit(&snapshot);
            }
            result.map(|r| r.map(|_| ()))
        }
        Command::Withdraw(_) => {
            let result = tokio::select! {
                result = run_withdrawal(&coordinator, request, &wallets, &metrics) => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            };
            let snapshot = coordinator.withdrawal_snapshot();
            if cli.json {
                print_json(&snapshot)?;
            } else {
                print_withdrawal(&snapshot);
            }
            result.map(|r| r.map(|_| ()))
        }
    };

    match outcome {
        Some(result) => Ok(result?),
        None => {
            warn!("Interrupted, the in-flight step was cancelled");
            Ok(())
        }
    }
}
