//! Raw transaction bodies as returned by `getTransaction`.
//!
//! The metadata side (balances, error flag) is typed because its shape is
//! stable; the message side varies by program and encoding, so it stays a
//! [`serde_json::Value`] navigated through accessors.

use serde::Deserialize;
use serde_json::Value;

/// Lamports per whole SOL.
pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Mint address used as the sentinel for the native SOL balance.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// SPL token program id, used as the default owner filter.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// A `jsonParsed` transaction body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default)]
    pub slot: Option<u64>,
    /// Unix confirmation time.
    #[serde(default)]
    pub block_time: Option<i64>,
    /// The message side: account keys and instructions. Program-dependent,
    /// navigated structurally.
    #[serde(default)]
    pub transaction: Option<Value>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
}

impl RawTransaction {
    /// The `message` object, if the transaction side is well-formed.
    #[must_use]
    pub fn message(&self) -> Option<&Value> {
        self.transaction
            .as_ref()
            .filter(|tx| tx.is_object())
            .and_then(|tx| tx.get("message"))
            .filter(|message| message.is_object())
    }

    /// The instruction list of the message, empty when absent.
    #[must_use]
    pub fn instructions(&self) -> &[Value] {
        self.message()
            .and_then(|message| message.get("instructions"))
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// Account keys as plain addresses. The provider emits either bare
    /// strings or `{ "pubkey": … }` objects depending on encoding.
    #[must_use]
    pub fn account_keys(&self) -> Vec<&str> {
        self.message()
            .and_then(|message| message.get("accountKeys"))
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(account_key_str).collect())
            .unwrap_or_default()
    }

    /// Index of `address` in the account-key list.
    #[must_use]
    pub fn account_index(&self, address: &str) -> Option<usize> {
        self.account_keys().iter().position(|key| *key == address)
    }
}

fn account_key_str(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(key) => Some(key.as_str()),
        Value::Object(obj) => obj.get("pubkey").and_then(Value::as_str),
        _ => None,
    }
}

/// Transaction metadata: balances before and after execution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Non-null when the transaction failed on chain.
    pub err: Option<Value>,
    pub fee: Option<u64>,
    /// Lamport balances indexed by account-key position.
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub pre_token_balances: Vec<TokenBalance>,
    pub post_token_balances: Vec<TokenBalance>,
}

/// One token-account balance inside transaction metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(default)]
    pub account_index: Option<u64>,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub ui_token_amount: UiTokenAmount,
}

/// Provider-reported token amount in raw and decimal-adjusted forms.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiTokenAmount {
    /// Raw integer amount as a string.
    pub amount: String,
    pub decimals: u8,
    pub ui_amount: Option<f64>,
    pub ui_amount_string: Option<String>,
}

impl UiTokenAmount {
    /// Decimal-adjusted value, preferring the provider's string form, then
    /// its number form, then scaling the raw amount ourselves.
    #[must_use]
    pub fn ui_value(&self) -> Option<f64> {
        if let Some(parsed) = self
            .ui_amount_string
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok())
        {
            return Some(parsed);
        }
        if let Some(value) = self.ui_amount {
            return Some(value);
        }
        let raw: f64 = self.amount.parse().ok()?;
        Some(raw / 10f64.powi(i32::from(self.decimals)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transaction_with_keys(keys: Value) -> RawTransaction {
        serde_json::from_value(json!({
            "slot": 100,
            "blockTime": 1_700_000_000,
            "transaction": { "message": { "accountKeys": keys, "instructions": [] } },
            "meta": { "err": null, "preBalances": [], "postBalances": [] }
        }))
        .unwrap()
    }

    #[test]
    fn account_keys_accepts_strings_and_objects() {
        let tx = transaction_with_keys(json!([
            "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            { "pubkey": "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T", "signer": true },
            42
        ]));

        assert_eq!(
            tx.account_keys(),
            vec![
                "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
                "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T",
            ]
        );
        assert_eq!(
            tx.account_index("4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T"),
            Some(1)
        );
        assert_eq!(tx.account_index("missing"), None);
    }

    #[test]
    fn malformed_message_yields_no_instructions() {
        let tx: RawTransaction = serde_json::from_value(json!({
            "slot": 5,
            "transaction": { "message": "not an object" }
        }))
        .unwrap();

        assert!(tx.message().is_none());
        assert!(tx.instructions().is_empty());
    }

    #[test]
    fn ui_value_prefers_string_then_number_then_raw() {
        let from_string = UiTokenAmount {
            amount: "999".to_string(),
            decimals: 2,
            ui_amount: Some(1.0),
            ui_amount_string: Some("123.45".to_string()),
        };
        assert_eq!(from_string.ui_value(), Some(123.45));

        let from_number = UiTokenAmount {
            amount: "999".to_string(),
            decimals: 2,
            ui_amount: Some(7.5),
            ui_amount_string: None,
        };
        assert_eq!(from_number.ui_value(), Some(7.5));

        let from_raw = UiTokenAmount {
            amount: "150".to_string(),
            decimals: 2,
            ui_amount: None,
            ui_amount_string: None,
        };
        assert_eq!(from_raw.ui_value(), Some(1.5));
    }

    #[test]
    fn meta_defaults_cover_missing_fields() {
        let tx: RawTransaction =
            serde_json::from_value(json!({ "slot": 1, "meta": { "err": null } })).unwrap();
        let meta = tx.meta.unwrap();
        assert!(meta.pre_balances.is_empty());
        assert!(meta.pre_token_balances.is_empty());
    }
}
