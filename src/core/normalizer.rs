//! Normalization of raw transaction bodies into canonical transfer records.
//!
//! Pure and deterministic: no I/O, no clock, fixtures in, records out.

use chrono::{Local, TimeZone};
use serde_json::Value;

use crate::types::{
    LAMPORTS_PER_SOL, RawTransaction, SignatureRecord, TransferAmount, TransferKind,
    TransferRecord, explorer_url,
};

/// Extracts zero or more transfer records from one transaction.
///
/// Only instructions whose parsed type is exactly `transfer` or
/// `transferChecked` qualify, and only when both source and destination are
/// present. Everything malformed is skipped silently; a bad instruction is
/// not an error, it is just not a transfer.
#[must_use]
pub fn normalize(raw: &RawTransaction, descriptor: &SignatureRecord) -> Vec<TransferRecord> {
    let mut records = Vec::new();

    let timestamp = raw.block_time.map(format_block_time).unwrap_or_default();
    let slot = raw.slot.unwrap_or(descriptor.slot);

    for instruction in raw.instructions() {
        let Some(parsed) = instruction.get("parsed") else {
            continue;
        };
        let Some(kind) = parsed
            .get("type")
            .and_then(Value::as_str)
            .and_then(TransferKind::from_instruction)
        else {
            continue;
        };
        let Some(info) = parsed.get("info").and_then(Value::as_object) else {
            continue;
        };

        let source = info.get("source").and_then(Value::as_str);
        let destination = info.get("destination").and_then(Value::as_str);
        let (Some(source), Some(destination)) = (source, destination) else {
            continue;
        };
        let authority = info
            .get("authority")
            .and_then(Value::as_str)
            .map(str::to_owned);

        records.push(TransferRecord {
            kind,
            source: source.to_string(),
            destination: destination.to_string(),
            amount: transfer_amount(info),
            authority,
            timestamp: timestamp.clone(),
            signature: descriptor.signature.clone(),
            slot,
            explorer_url: explorer_url(&descriptor.signature),
        });
    }

    records
}

/// Amount extraction with the 3-tier fallback: lamports scaled to SOL,
/// then a provider-computed decimal, then the raw integer.
fn transfer_amount(info: &serde_json::Map<String, Value>) -> TransferAmount {
    if let Some(lamports) = info.get("lamports").and_then(Value::as_u64) {
        #[allow(clippy::cast_precision_loss)]
        return TransferAmount::Sol(lamports as f64 / LAMPORTS_PER_SOL);
    }

    if let Some(token_amount) = info.get("tokenAmount") {
        if let Some(ui) = token_amount.get("uiAmountString").and_then(Value::as_str) {
            return TransferAmount::Decimal(ui.to_string());
        }
        if let Some(ui) = token_amount.get("uiAmount").and_then(Value::as_f64) {
            return TransferAmount::Decimal(ui.to_string());
        }
    }

    match info.get("amount") {
        Some(Value::String(raw)) => TransferAmount::Raw(raw.clone()),
        Some(Value::Number(raw)) => TransferAmount::Raw(raw.to_string()),
        _ => TransferAmount::Unknown,
    }
}

fn format_block_time(block_time: i64) -> String {
    Local
        .timestamp_opt(block_time, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SIG: &str =
        "5j7s6NiJS3JAkvgkoc18WVAsiSaci2pxB2A6ueCJP4tprA2TFg9wSyTLeYouxPBJEMzJinENTkpA52YStRW5Dia7";

    fn descriptor() -> SignatureRecord {
        SignatureRecord {
            signature: SIG.to_string(),
            slot: 123_456,
            block_time: Some(1_700_000_000),
        }
    }

    fn body(instructions: Value) -> RawTransaction {
        serde_json::from_value(json!({
            "slot": 123_456,
            "blockTime": 1_700_000_000,
            "transaction": { "message": { "accountKeys": [], "instructions": instructions } },
            "meta": { "err": null }
        }))
        .unwrap()
    }

    #[test]
    fn system_transfer_converts_lamports_to_sol() {
        let raw = body(json!([{
            "program": "system",
            "programId": "11111111111111111111111111111111",
            "parsed": {
                "type": "transfer",
                "info": {
                    "source": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
                    "destination": "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T",
                    "lamports": 1_500_000_000u64
                }
            }
        }]));

        let records = normalize(&raw, &descriptor());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransferKind::Transfer);
        assert_eq!(records[0].amount, TransferAmount::Sol(1.5));
        assert_eq!(
            records[0].source,
            "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
        );
        assert_eq!(records[0].slot, 123_456);
        assert_eq!(records[0].explorer_url, format!("https://solscan.io/tx/{SIG}"));
    }

    #[test]
    fn transfer_checked_uses_ui_amount_string() {
        let raw = body(json!([{
            "program": "spl-token",
            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            "parsed": {
                "type": "transferChecked",
                "info": {
                    "source": "src-token-account",
                    "destination": "dst-token-account",
                    "authority": "owner-wallet",
                    "tokenAmount": {
                        "amount": "12345000",
                        "decimals": 5,
                        "uiAmount": 123.45,
                        "uiAmountString": "123.45"
                    }
                }
            }
        }]));

        let records = normalize(&raw, &descriptor());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransferKind::TransferChecked);
        assert_eq!(
            records[0].amount,
            TransferAmount::Decimal("123.45".to_string())
        );
        assert_eq!(records[0].authority.as_deref(), Some("owner-wallet"));
    }

    #[test]
    fn raw_amount_is_the_last_resort() {
        let raw = body(json!([{
            "parsed": {
                "type": "transfer",
                "info": {
                    "source": "a",
                    "destination": "b",
                    "amount": "987654"
                }
            }
        }]));

        let records = normalize(&raw, &descriptor());
        assert_eq!(records[0].amount, TransferAmount::Raw("987654".to_string()));
    }

    #[test]
    fn missing_amount_fields_yield_unknown() {
        let raw = body(json!([{
            "parsed": { "type": "transfer", "info": { "source": "a", "destination": "b" } }
        }]));

        let records = normalize(&raw, &descriptor());
        assert_eq!(records[0].amount, TransferAmount::Unknown);
        assert_eq!(records[0].amount.to_string(), "N/A");
    }

    #[test]
    fn non_transfer_instructions_are_skipped() {
        let raw = body(json!([
            { "parsed": { "type": "mintTo", "info": { "source": "a", "destination": "b" } } },
            { "parsed": { "type": "closeAccount", "info": {} } },
            { "programId": "ComputeBudget111111111111111111111111111111", "data": "3gJqkocMWaMm" }
        ]));

        assert!(normalize(&raw, &descriptor()).is_empty());
    }

    #[test]
    fn transfers_without_both_endpoints_are_skipped() {
        let raw = body(json!([
            { "parsed": { "type": "transfer", "info": { "source": "only-source", "lamports": 1u64 } } },
            { "parsed": { "type": "transfer", "info": { "destination": "only-dest", "lamports": 1u64 } } }
        ]));

        assert!(normalize(&raw, &descriptor()).is_empty());
    }

    #[test]
    fn malformed_message_produces_no_records() {
        let raw: RawTransaction = serde_json::from_value(json!({
            "slot": 1,
            "transaction": { "message": [1, 2, 3] }
        }))
        .unwrap();

        assert!(normalize(&raw, &descriptor()).is_empty());
    }

    #[test]
    fn absent_result_body_produces_no_records() {
        let raw: RawTransaction = serde_json::from_value(json!({ "slot": 1 })).unwrap();
        assert!(normalize(&raw, &descriptor()).is_empty());
    }

    #[test]
    fn one_transaction_can_yield_many_records() {
        let raw = body(json!([
            { "parsed": { "type": "transfer", "info": { "source": "a", "destination": "b", "lamports": 1_000_000_000u64 } } },
            { "parsed": { "type": "transferChecked", "info": { "source": "c", "destination": "d", "tokenAmount": { "uiAmountString": "2" } } } }
        ]));

        let records = normalize(&raw, &descriptor());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, TransferAmount::Sol(1.0));
        assert_eq!(records[1].amount, TransferAmount::Decimal("2".to_string()));
    }

    #[test]
    fn timestamp_is_formatted_locally_or_blank() {
        let raw = body(json!([{
            "parsed": { "type": "transfer", "info": { "source": "a", "destination": "b", "lamports": 5u64 } }
        }]));
        let expected = Local
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(normalize(&raw, &descriptor())[0].timestamp, expected);

        let no_time: RawTransaction = serde_json::from_value(json!({
            "slot": 2,
            "transaction": { "message": { "instructions": [
                { "parsed": { "type": "transfer", "info": { "source": "a", "destination": "b", "lamports": 5u64 } } }
            ] } }
        }))
        .unwrap();
        assert_eq!(normalize(&no_time, &descriptor())[0].timestamp, "");
    }
}
