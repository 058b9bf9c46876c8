//! Configuration types for the bridge.
//!
//! This crate provides:
//! - Network configurations (mainnet, testnet)
//! - Bridge contract addresses for each rollup
//! - Chain ids and block times used for receipt polling

pub mod network;

pub use network::{L1Config, NetworkConfig, NetworkConfigBuilder, NetworkType, RollupConfig};
