//! Account-level queries: token details and wallet balance summaries.

use serde_json::Value;

use crate::common::error::Result;
use crate::rpc::client::RpcClient;
use crate::types::LAMPORTS_PER_SOL;

/// Supply and authority information for a token mint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenDetails {
    /// Decimal-adjusted supply when available, else the raw amount string.
    pub supply: Option<String>,
    pub decimals: Option<u8>,
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
}

/// One SPL token position of a wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenHolding {
    pub mint: String,
    /// Decimal-adjusted balance.
    pub amount: f64,
}

/// Native and token balances of a wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletBalances {
    /// Whole-SOL native balance.
    pub sol: f64,
    /// Nonzero token positions.
    pub tokens: Vec<TokenHolding>,
}

/// Fetches supply, decimals and authorities for a token mint.
pub async fn token_details(client: &RpcClient, mint: &str) -> Result<TokenDetails> {
    let supply = client.get_token_supply(mint).await?;
    let info = client.get_account_info(mint).await?;
    Ok(parse_token_details(&supply, &info))
}

/// Fetches the native balance and all nonzero token positions of a wallet.
pub async fn wallet_balances(client: &RpcClient, address: &str) -> Result<WalletBalances> {
    let account = client.get_account_info(address).await?;
    let token_accounts = client.get_token_accounts_by_owner(address, None).await?;
    Ok(parse_wallet_balances(&account, &token_accounts))
}

fn parse_token_details(supply: &Value, info: &Value) -> TokenDetails {
    let mut details = TokenDetails::default();

    if let Some(value) = supply.get("value") {
        details.supply = value
            .get("uiAmountString")
            .and_then(Value::as_str)
            .or_else(|| value.get("amount").and_then(Value::as_str))
            .map(String::from);
        details.decimals = value
            .get("decimals")
            .and_then(Value::as_u64)
            .and_then(|d| u8::try_from(d).ok());
    }

    if let Some(parsed) = info.pointer("/value/data/parsed") {
        if parsed.get("type").and_then(Value::as_str) == Some("mint") {
            let mint_info = parsed.get("info");
            details.mint_authority = mint_info
                .and_then(|i| i.get("mintAuthority"))
                .and_then(Value::as_str)
                .map(String::from);
            details.freeze_authority = mint_info
                .and_then(|i| i.get("freezeAuthority"))
                .and_then(Value::as_str)
                .map(String::from);
        }
    }

    details
}

fn parse_wallet_balances(account: &Value, token_accounts: &Value) -> WalletBalances {
    #[allow(clippy::cast_precision_loss)]
    let sol = account
        .pointer("/value/lamports")
        .and_then(Value::as_u64)
        .unwrap_or(0) as f64
        / LAMPORTS_PER_SOL;

    let mut tokens = Vec::new();
    if let Some(entries) = token_accounts.pointer("/value").and_then(Value::as_array) {
        for entry in entries {
            let Some(info) = entry.pointer("/account/data/parsed/info") else {
                continue;
            };
            let Some(mint) = info.get("mint").and_then(Value::as_str) else {
                continue;
            };
            let amount = info
                .pointer("/tokenAmount/uiAmountString")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(0.0);
            if amount > 0.0 {
                tokens.push(TokenHolding {
                    mint: mint.to_string(),
                    amount,
                });
            }
        }
    }

    WalletBalances { sol, tokens }
}
