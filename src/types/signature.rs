//! Signature descriptors returned by history discovery.

use serde::{Deserialize, Serialize};

/// One entry of a `getSignaturesForAddress` page.
///
/// Pages are ordered newest-first; paginating with a `before` cursor moves
/// strictly backward in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    /// Opaque unique transaction identifier.
    pub signature: String,
    /// Slot the transaction was confirmed in.
    pub slot: u64,
    /// Unix confirmation time, absent for very old or unconfirmed entries.
    #[serde(default)]
    pub block_time: Option<i64>,
}
