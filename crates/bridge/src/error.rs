use alloy_primitives::TxHash;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Every way a bridge operation can fail.
///
/// The flows never retry on their own; each variant reaches the caller.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Rejected before anything was built or sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Wallet declined, is on the wrong chain, or signs for another account
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("L1 transaction {0} reverted")]
    L1TxReverted(TxHash),

    #[error("L2 transaction {0} reverted")]
    L2TxReverted(TxHash),

    /// The portal refused the proof as premature
    #[error("withdrawal not yet provable: {0}")]
    NotYetProvable(String),

    /// The portal refused finalization before the challenge period ended
    #[error("finalization too early: {0}")]
    FinalizationTooEarly(String),

    /// Wrong state, mismatched artifact, or another operation already in flight
    #[error("invalid transition in {operation}: {reason}")]
    InvalidTransition {
        operation: &'static str,
        reason: String,
    },

    /// Transport or chain-client failure
    #[error("chain client error: {0:#}")]
    Client(eyre::Report),
}

// eyre::Report is not std::error::Error, so #[from] does not apply
impl From<eyre::Report> for BridgeError {
    fn from(report: eyre::Report) -> Self {
        Self::Client(report)
    }
}

impl BridgeError {
    pub(crate) fn invalid_transition(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            operation,
            reason: reason.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::SubmissionRejected(_) => ErrorKind::SubmissionRejected,
            Self::L1TxReverted(_) => ErrorKind::L1TxReverted,
            Self::L2TxReverted(_) => ErrorKind::L2TxReverted,
            Self::NotYetProvable(_) => ErrorKind::NotYetProvable,
            Self::FinalizationTooEarly(_) => ErrorKind::FinalizationTooEarly,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Client(_) => ErrorKind::Client,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    SubmissionRejected,
    L1TxReverted,
    L2TxReverted,
    NotYetProvable,
    FinalizationTooEarly,
    InvalidTransition,
    Client,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::SubmissionRejected => "submission_rejected",
            Self::L1TxReverted => "l1_tx_reverted",
            Self::L2TxReverted => "l2_tx_reverted",
            Self::NotYetProvable => "not_yet_provable",
            Self::FinalizationTooEarly => "finalization_too_early",
            Self::InvalidTransition => "invalid_transition",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The last error of a flow, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_from_eyre() {
        let err: BridgeError = eyre::eyre!("connection refused").into();
        let report = err.report();

        assert_eq!(report.kind, ErrorKind::Client);
        assert!(report.message.contains("connection refused"));
    }

    #[test]
    fn test_kind_matches_serialized_name() {
        let err = BridgeError::invalid_transition("prove", "state is idle");
        let json = serde_json::to_value(err.report()).unwrap();

        assert_eq!(json["kind"], ErrorKind::InvalidTransition.as_str());
        assert_eq!(json["message"], "invalid transition in prove: state is idle");
    }
}
