//! Canonical transfer records produced by the normalizer.

use serde::Serialize;
use std::fmt;

/// Base URL for transaction pages on the Solscan explorer.
pub const EXPLORER_TX_URL: &str = "https://solscan.io/tx/";

/// Builds an explorer link for a transaction signature.
#[must_use]
pub fn explorer_url(signature: &str) -> String {
    format!("{EXPLORER_TX_URL}{signature}")
}

/// Instruction kinds that qualify as transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferKind {
    Transfer,
    TransferChecked,
}

impl TransferKind {
    /// Maps a `parsed.type` label to a kind; anything else is not a transfer.
    #[must_use]
    pub fn from_instruction(label: &str) -> Option<Self> {
        match label {
            "transfer" => Some(TransferKind::Transfer),
            "transferChecked" => Some(TransferKind::TransferChecked),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Transfer => "transfer",
            TransferKind::TransferChecked => "transferChecked",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer amount in its best available form.
///
/// Which tier applies depends on what the instruction carried: a lamport
/// count (native transfers), a decimal-adjusted token amount, or a raw
/// integer when the token's decimals are unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransferAmount {
    /// Whole-SOL value converted from lamports.
    Sol(f64),
    /// Provider-computed decimal string for token transfers.
    Decimal(String),
    /// Raw integer amount, decimals unknown.
    Raw(String),
    /// The instruction carried no recognizable amount field.
    Unknown,
}

impl fmt::Display for TransferAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferAmount::Sol(value) => write!(f, "{value}"),
            TransferAmount::Decimal(value) | TransferAmount::Raw(value) => f.write_str(value),
            TransferAmount::Unknown => f.write_str("N/A"),
        }
    }
}

/// One normalized transfer extracted from a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRecord {
    pub kind: TransferKind,
    pub source: String,
    pub destination: String,
    pub amount: TransferAmount,
    /// Delegate that signed the transfer, when the program reports one.
    pub authority: Option<String>,
    /// Local-naive `%Y-%m-%d %H:%M:%S`, empty when the confirmation time is
    /// unknown.
    pub timestamp: String,
    pub signature: String,
    pub slot: u64,
    pub explorer_url: String,
}
