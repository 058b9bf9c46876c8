//! Network configuration for the L1 ↔ L2 bridge.
//!
//! Provides chain ids, block times and bridge contract addresses for each
//! supported network pair.

use alloy_primitives::{address, Address};
use binding::opstack::MESSAGE_PASSER_ADDRESS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network type (mainnet or testnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
}

/// Settlement layer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Config {
    /// Chain ID
    pub chain_id: u64,
    /// Block time in seconds (12 for Ethereum)
    pub block_time_secs: u64,
}

impl L1Config {
    /// Ethereum mainnet configuration.
    pub const fn mainnet() -> Self {
        Self {
            chain_id: 1,
            block_time_secs: 12,
        }
    }

    /// Ethereum Sepolia testnet configuration.
    pub const fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
            block_time_secs: 12,
        }
    }
}

/// Rollup configuration, including the L1 contracts it settles through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Chain ID
    pub chain_id: u64,
    /// Block time in seconds (1 for Unichain)
    pub block_time_secs: u64,
    /// OptimismPortal2 on L1
    pub l1_portal: Address,
    /// DisputeGameFactory on L1
    pub dispute_game_factory: Address,
    /// L2ToL1MessagePasser on L2
    pub message_passer: Address,
}

impl RollupConfig {
    /// Unichain mainnet configuration.
    pub const fn unichain_mainnet() -> Self {
        Self {
            chain_id: 130,
            block_time_secs: 1,
            // https://etherscan.io/address/0x0bd48f6B86a26D3a217d0Fa6FfE2B491B956A7a2
            l1_portal: address!("0x0bd48f6B86a26D3a217d0Fa6FfE2B491B956A7a2"),
            dispute_game_factory: address!("0x2F12d621a16e2d3285929C9996f478508951dFe4"),
            message_passer: MESSAGE_PASSER_ADDRESS,
        }
    }

    /// Unichain Sepolia testnet configuration.
    pub const fn unichain_sepolia() -> Self {
        Self {
            chain_id: 1301,
            block_time_secs: 1,
            // https://sepolia.etherscan.io/address/0x0d83dab629f0e0F9d36c0Cbc89B69a489f0751bD
            l1_portal: address!("0x0d83dab629f0e0F9d36c0Cbc89B69a489f0751bD"),
            dispute_game_factory: address!("0xeff73e5aa3B9AEC32c659Aa3E00444d20a84394b"),
            message_passer: MESSAGE_PASSER_ADDRESS,
        }
    }
}

/// Complete configuration for one L1/L2 pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network type (mainnet or testnet)
    pub network_type: NetworkType,
    /// Settlement layer
    pub l1: L1Config,
    /// Rollup
    pub l2: RollupConfig,
}

impl NetworkConfig {
    /// Create mainnet configuration.
    pub const fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            l1: L1Config::mainnet(),
            l2: RollupConfig::unichain_mainnet(),
        }
    }

    /// Create testnet (Sepolia) configuration.
    pub const fn sepolia() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            l1: L1Config::sepolia(),
            l2: RollupConfig::unichain_sepolia(),
        }
    }

    /// Create configuration from network type.
    pub const fn from_network_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::sepolia(),
        }
    }

    pub const fn l1_block_time(&self) -> Duration {
        Duration::from_secs(self.l1.block_time_secs)
    }

    pub const fn l2_block_time(&self) -> Duration {
        Duration::from_secs(self.l2.block_time_secs)
    }
}

/// Builder for custom network configurations.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    config: NetworkConfig,
}

impl NetworkConfigBuilder {
    /// Start with mainnet defaults.
    pub const fn mainnet() -> Self {
        Self {
            config: NetworkConfig::mainnet(),
        }
    }

    /// Start with testnet defaults.
    pub const fn testnet() -> Self {
        Self {
            config: NetworkConfig::sepolia(),
        }
    }

    /// Start with the defaults for `network_type`.
    pub const fn from_network_type(network_type: NetworkType) -> Self {
        Self {
            config: NetworkConfig::from_network_type(network_type),
        }
    }

    /// Override the L1 OptimismPortal2 address.
    pub const fn l1_portal(mut self, address: Address) -> Self {
        self.config.l2.l1_portal = address;
        self
    }

    /// Override the L1 DisputeGameFactory address.
    pub const fn dispute_game_factory(mut self, address: Address) -> Self {
        self.config.l2.dispute_game_factory = address;
        self
    }

    /// Override both chain ids, e.g. for a local devnet.
    pub const fn chain_ids(mut self, l1: u64, l2: u64) -> Self {
        self.config.l1.chain_id = l1;
        self.config.l2.chain_id = l2;
        self
    }

    /// Build the network configuration.
    pub const fn build(self) -> NetworkConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_config() {
        let config = NetworkConfig::mainnet();
        assert_eq!(config.l1.chain_id, 1);
        assert_eq!(config.l2.chain_id, 130);
        assert_eq!(config.network_type, NetworkType::Mainnet);
        assert_eq!(config.l2.message_passer, MESSAGE_PASSER_ADDRESS);
    }

    #[test]
    fn test_sepolia_config() {
        let config = NetworkConfig::sepolia();
        assert_eq!(config.l1.chain_id, 11155111);
        assert_eq!(config.l2.chain_id, 1301);
        assert_eq!(config.l1_block_time(), Duration::from_secs(12));
        assert_eq!(config.l2_block_time(), Duration::from_secs(1));
    }

    #[test]
    fn test_custom_config_builder() {
        let portal = address!("1111111111111111111111111111111111111111");

        let config = NetworkConfigBuilder::mainnet()
            .l1_portal(portal)
            .chain_ids(31337, 901)
            .build();

        assert_eq!(config.l2.l1_portal, portal);
        assert_eq!(config.l1.chain_id, 31337);
        assert_eq!(config.l2.chain_id, 901);
        assert_eq!(
            config.l2.dispute_game_factory,
            RollupConfig::unichain_mainnet().dispute_game_factory
        );
    }

    #[test]
    fn test_network_type_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            network: NetworkType,
        }

        let parsed: Wrapper = toml::from_str(r#"network = "testnet""#).unwrap();
        assert_eq!(parsed.network, NetworkType::Testnet);
    }
}
