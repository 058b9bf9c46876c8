use crate::hash::compute_withdrawal_hash;
use alloy_primitives::{Address, Bytes, Log, B256, U256};
use alloy_sol_types::SolEvent;
use binding::opstack::{IL2ToL1MessagePasser::MessagePassed, WithdrawalTransaction};
use eyre::{bail, eyre, Result};
use serde::Serialize;

pub type WithdrawalHash = B256;

/// Withdrawal status as recorded by the L1 portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Initiated,
    Proven { timestamp: u64 },
    Finalized,
}

/// Cross-domain message descriptor emitted by an L2 withdrawal initiation.
///
/// The hash is verified against the other fields once, when the descriptor is
/// captured from a `MessagePassed` event, and is never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub nonce: U256,
    pub sender: Address,
    pub target: Address,
    pub value: U256,
    pub gas_limit: U256,
    pub data: Bytes,
    pub withdrawal_hash: WithdrawalHash,
}

impl Withdrawal {
    /// Capture a descriptor from a decoded `MessagePassed` event.
    pub fn from_event(event: &MessagePassed) -> Result<Self> {
        let transaction = WithdrawalTransaction {
            nonce: event.nonce,
            sender: event.sender,
            target: event.target,
            value: event.value,
            gasLimit: event.gasLimit,
            data: event.data.clone(),
        };

        let computed = compute_withdrawal_hash(&transaction);
        if computed != event.withdrawalHash {
            bail!(
                "withdrawal hash mismatch: event carries {}, fields hash to {}",
                event.withdrawalHash,
                computed
            );
        }

        Ok(Self {
            nonce: transaction.nonce,
            sender: transaction.sender,
            target: transaction.target,
            value: transaction.value,
            gas_limit: transaction.gasLimit,
            data: transaction.data,
            withdrawal_hash: computed,
        })
    }

    /// Find the first `MessagePassed` event emitted by `message_passer` and capture it.
    pub fn from_logs<'a>(
        logs: impl IntoIterator<Item = &'a Log>,
        message_passer: Address,
    ) -> Result<Self> {
        let event = logs
            .into_iter()
            .filter(|log| log.address == message_passer)
            .find_map(|log| MessagePassed::decode_log_data(&log.data).ok())
            .ok_or_else(|| eyre!("no MessagePassed event from {message_passer} in receipt"))?;

        Self::from_event(&event)
    }

    /// The struct passed to the portal's prove and finalize calls.
    pub fn transaction(&self) -> WithdrawalTransaction {
        WithdrawalTransaction {
            nonce: self.nonce,
            sender: self.sender,
            target: self.target,
            value: self.value,
            gasLimit: self.gas_limit,
            data: self.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, hex};
    use binding::opstack::MESSAGE_PASSER_ADDRESS;

    fn unichain_event() -> MessagePassed {
        MessagePassed {
            nonce: U256::from_be_bytes(hex!(
                "0001000000000000000000000000000000000000000000000000000000000818"
            )),
            sender: address!("000040D6c85A13a1AA74565FDe87e499dC023C6f"),
            target: address!("B03eEF386A61b5b462051636001485FFfdD3d843"),
            value: U256::ZERO,
            gasLimit: U256::from(200_000),
            data: Bytes::from(hex!(
                "095ea7b3000000000000000000000000000040d6c85a13a1aa74565fde87e499dc023c6fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
            )),
            withdrawalHash: b256!(
                "49c43b60ec99e99046b54aec4c90419ff194300e567de63423c3b974ae46bd28"
            ),
        }
    }

    #[test]
    fn test_from_event_keeps_verified_hash() {
        let event = unichain_event();
        let withdrawal = Withdrawal::from_event(&event).unwrap();

        assert_eq!(withdrawal.withdrawal_hash, event.withdrawalHash);
        assert_eq!(withdrawal.gas_limit, U256::from(200_000));
        assert_eq!(withdrawal.transaction().gasLimit, event.gasLimit);
    }

    #[test]
    fn test_from_event_rejects_tampered_fields() {
        let mut event = unichain_event();
        event.value = U256::from(1);

        let err = Withdrawal::from_event(&event).unwrap_err();
        assert!(err.to_string().contains("mismatch"));
    }

    #[test]
    fn test_from_logs_filters_by_emitter() {
        let data = unichain_event().encode_log_data();
        let foreign = Log {
            address: address!("1111111111111111111111111111111111111111"),
            data: data.clone(),
        };
        let genuine = Log {
            address: MESSAGE_PASSER_ADDRESS,
            data,
        };

        assert!(Withdrawal::from_logs([&foreign], MESSAGE_PASSER_ADDRESS).is_err());

        let withdrawal = Withdrawal::from_logs([&foreign, &genuine], MESSAGE_PASSER_ADDRESS).unwrap();
        assert_eq!(withdrawal.sender, address!("000040D6c85A13a1AA74565FDe87e499dC023C6f"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let withdrawal = Withdrawal::from_event(&unichain_event()).unwrap();
        let json = serde_json::to_value(&withdrawal).unwrap();

        assert!(json.get("withdrawalHash").is_some());
        assert!(json.get("gasLimit").is_some());
    }
}
