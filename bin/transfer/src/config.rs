use alloy_primitives::Address;
use config::{NetworkConfig, NetworkConfigBuilder, NetworkType};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

const fn default_network() -> NetworkType {
    NetworkType::Testnet
}

const fn default_proof_poll_interval_secs() -> u64 {
    60
}

/// Top-level transfer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// L1 RPC endpoint url
    pub l1_rpc_url: String,

    /// L2 RPC endpoint url
    pub l2_rpc_url: String,

    /// Network pair to bridge between
    #[serde(default = "default_network")]
    pub network: NetworkType,

    /// Recipient used when `--to` is not given
    #[serde(default)]
    pub eoa_address: Option<Address>,

    /// Longest sleep between provability and finalizability reads
    #[serde(default = "default_proof_poll_interval_secs")]
    pub proof_poll_interval_secs: u64,

    /// Override the preset OptimismPortal2 address
    #[serde(default)]
    pub l1_portal: Option<Address>,

    /// Override the preset DisputeGameFactory address
    #[serde(default)]
    pub dispute_game_factory: Option<Address>,

    /// Serve Prometheus metrics on this port
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.proof_poll_interval_secs == 0 {
            eyre::bail!("proof_poll_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Network preset for `network` with any configured overrides applied.
    pub fn network_config(&self) -> NetworkConfig {
        let mut builder = NetworkConfigBuilder::from_network_type(self.network);
        if let Some(portal) = self.l1_portal {
            builder = builder.l1_portal(portal);
        }
        if let Some(factory) = self.dispute_game_factory {
            builder = builder.dispute_game_factory(factory);
        }
        builder.build()
    }

    pub const fn proof_poll_interval(&self) -> Duration {
        Duration::from_secs(self.proof_poll_interval_secs)
    }
}
