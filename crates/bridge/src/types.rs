//! Plain data exchanged between the flows, the chain client and the caller.

use crate::error::BridgeError;
use alloy_primitives::{utils::parse_ether, Address, Log, TxHash, B256, U256};
use alloy_rpc_types::TransactionRequest;
use serde::Serialize;
use std::fmt;

/// Which side of the bridge a transaction lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    L1,
    L2,
}

impl Chain {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "l1",
            Self::L2 => "l2",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user asked for. Immutable once a flow accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
    /// Wallet account that signs and pays
    pub account: Address,
    /// Receiver on the destination chain
    pub recipient: Address,
    /// Amount in wei
    pub amount: U256,
}

impl TransferRequest {
    pub const fn new(account: Address, recipient: Address, amount: U256) -> Self {
        Self {
            account,
            recipient,
            amount,
        }
    }

    /// Parse a hex recipient and a decimal ether amount such as `"0.05"`.
    pub fn parse(account: Address, recipient: &str, amount: &str) -> Result<Self, BridgeError> {
        let recipient: Address = recipient
            .trim()
            .parse()
            .map_err(|e| BridgeError::InvalidRequest(format!("recipient {recipient:?}: {e}")))?;
        let amount = amount.trim();
        if amount.starts_with('-') {
            return Err(BridgeError::InvalidRequest(format!("amount {amount:?} is negative")));
        }
        let amount = parse_ether(amount)
            .map_err(|e| BridgeError::InvalidRequest(format!("amount {amount:?}: {e}")))?;

        let request = Self::new(account, recipient, amount);
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.amount.is_zero() {
            return Err(BridgeError::InvalidRequest("amount must be positive".into()));
        }
        if self.recipient.is_zero() {
            return Err(BridgeError::InvalidRequest("recipient is the zero address".into()));
        }
        if self.account.is_zero() {
            return Err(BridgeError::InvalidRequest("account is the zero address".into()));
        }
        Ok(())
    }
}

/// An unsigned transaction and the chain it must be submitted on.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTx {
    pub chain: Chain,
    pub request: TransactionRequest,
}

impl PendingTx {
    pub const fn l1(request: TransactionRequest) -> Self {
        Self {
            chain: Chain::L1,
            request,
        }
    }

    pub const fn l2(request: TransactionRequest) -> Self {
        Self {
            chain: Chain::L2,
            request,
        }
    }
}

/// A log together with its position in the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLog {
    pub log_index: u64,
    #[serde(flatten)]
    pub inner: Log,
}

/// An included transaction as seen by the flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub chain: Chain,
    pub tx_hash: TxHash,
    pub block_hash: B256,
    pub block_number: u64,
    /// `false` when the transaction reverted
    pub status: bool,
    pub gas_used: u64,
    pub logs: Vec<ReceiptLog>,
}

impl Receipt {
    pub fn logs(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter().map(|log| &log.inner)
    }
}
