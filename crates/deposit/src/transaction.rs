//! L2 deposit transactions derived from L1 `TransactionDeposited` events.
//!
//! The rollup node turns every portal deposit event into a type `0x7E`
//! transaction on L2. Its hash is fully determined by the L1 block hash, the
//! log index and the event payload, so the L2 id is known as soon as the L1
//! receipt is.

use alloy_primitives::{keccak256, Address, Bytes, Log, B256, U256};
use alloy_rlp::{BufMut, Encodable, Header, EMPTY_STRING_CODE};
use alloy_sol_types::SolEvent;
use binding::opstack::{IOptimismPortal2::TransactionDeposited, DEPOSIT_VERSION_V0};
use eyre::{bail, ensure, Result};
use tracing::debug;

/// EIP-2718 type byte of deposit transactions.
pub const DEPOSIT_TX_TYPE: u8 = 0x7E;

/// mint(32) ‖ value(32) ‖ gasLimit(8) ‖ isCreation(1)
const OPAQUE_HEADER_LEN: usize = 73;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositTransaction {
    pub source_hash: B256,
    pub from: Address,
    /// `None` for contract creations
    pub to: Option<Address>,
    pub mint: U256,
    pub value: U256,
    pub gas_limit: u64,
    pub data: Bytes,
}

/// Unpacked `opaqueData` of a version 0 deposit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueDeposit {
    pub mint: U256,
    pub value: U256,
    pub gas_limit: u64,
    pub is_creation: bool,
    pub data: Bytes,
}

/// Split `abi.encodePacked(mint, value, gasLimit, isCreation, data)`.
pub fn decode_opaque_data(opaque: &[u8]) -> Result<OpaqueDeposit> {
    ensure!(
        opaque.len() >= OPAQUE_HEADER_LEN,
        "opaque deposit data too short: {} bytes",
        opaque.len()
    );

    let mut gas = [0u8; 8];
    gas.copy_from_slice(&opaque[64..72]);

    Ok(OpaqueDeposit {
        mint: U256::from_be_slice(&opaque[0..32]),
        value: U256::from_be_slice(&opaque[32..64]),
        gas_limit: u64::from_be_bytes(gas),
        is_creation: opaque[72] != 0,
        data: Bytes::copy_from_slice(&opaque[OPAQUE_HEADER_LEN..]),
    })
}

/// Source hash of a user deposit: `keccak256(0 ‖ keccak256(l1BlockHash ‖ logIndex))`.
pub fn user_deposit_source_hash(l1_block_hash: B256, log_index: u64) -> B256 {
    let mut deposit_id = [0u8; 64];
    deposit_id[..32].copy_from_slice(l1_block_hash.as_slice());
    deposit_id[56..].copy_from_slice(&log_index.to_be_bytes());

    // Domain 0 is user deposits
    let mut domain_input = [0u8; 64];
    domain_input[32..].copy_from_slice(keccak256(deposit_id).as_slice());
    keccak256(domain_input)
}

impl DepositTransaction {
    /// Derive the L2 transaction from a portal log.
    ///
    /// Returns `Ok(None)` for logs that are not `TransactionDeposited`.
    pub fn from_deposit_log(l1_block_hash: B256, log_index: u64, log: &Log) -> Result<Option<Self>> {
        if log.topics().first() != Some(&TransactionDeposited::SIGNATURE_HASH) {
            return Ok(None);
        }

        let event = TransactionDeposited::decode_log_data(&log.data)?;
        if event.version != DEPOSIT_VERSION_V0 {
            bail!("unsupported deposit version {}", event.version);
        }

        let opaque = decode_opaque_data(&event.opaqueData)?;

        Ok(Some(Self {
            source_hash: user_deposit_source_hash(l1_block_hash, log_index),
            from: event.from,
            to: (!opaque.is_creation).then_some(event.to),
            mint: opaque.mint,
            value: opaque.value,
            gas_limit: opaque.gas_limit,
            data: opaque.data,
        }))
    }

    fn fields_len(&self) -> usize {
        let to_len = self.to.map_or(1, |to| to.length());
        self.source_hash.length()
            + self.from.length()
            + to_len
            + self.mint.length()
            + self.value.length()
            + self.gas_limit.length()
            + false.length()
            + self.data.length()
    }

    /// `0x7E ‖ rlp([sourceHash, from, to, mint, value, gas, isSystemTx, data])`
    pub fn encoded(&self) -> Vec<u8> {
        let payload_length = self.fields_len();
        let header = Header {
            list: true,
            payload_length,
        };

        let mut out = Vec::with_capacity(1 + header.length() + payload_length);
        out.put_u8(DEPOSIT_TX_TYPE);
        header.encode(&mut out);
        self.source_hash.encode(&mut out);
        self.from.encode(&mut out);
        match &self.to {
            Some(to) => to.encode(&mut out),
            None => out.put_u8(EMPTY_STRING_CODE),
        }
        self.mint.encode(&mut out);
        self.value.encode(&mut out);
        self.gas_limit.encode(&mut out);
        // User deposits are never system transactions
        false.encode(&mut out);
        self.data.encode(&mut out);
        out
    }

    pub fn tx_hash(&self) -> B256 {
        keccak256(self.encoded())
    }
}

/// L2 transaction hashes for every deposit event in an L1 receipt, in log order.
///
/// `logs` yields `(block-level log index, log)` pairs.
pub fn l2_transaction_hashes<'a>(
    l1_block_hash: B256,
    logs: impl IntoIterator<Item = (u64, &'a Log)>,
) -> Result<Vec<B256>> {
    let mut hashes = Vec::new();
    for (log_index, log) in logs {
        if let Some(deposit) = DepositTransaction::from_deposit_log(l1_block_hash, log_index, log)? {
            let hash = deposit.tx_hash();
            debug!(log_index, l2_tx_hash = %hash, "Derived L2 deposit transaction");
            hashes.push(hash);
        }
    }
    Ok(hashes)
}
