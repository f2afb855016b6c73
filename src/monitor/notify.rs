//! Balance diffing and notification assembly for monitored wallets.

use std::collections::{BTreeSet, HashMap};

use crate::monitor::prices::{PriceLookup, TokenPrice};
use crate::types::balance::shorten_mint;
use crate::types::{
    ActivityNotification, BalanceDelta, LAMPORTS_PER_SOL, NotificationLine, RawTransaction,
    SOL_MINT, explorer_url,
};

/// Computes the monitored address's balance changes in one transaction.
///
/// Failed (`meta.err`) and malformed transactions yield nothing. Native
/// lamports are matched by the address's position in the account-key list;
/// token amounts are matched per mint, owner-filtered. Only nonzero
/// changes are returned.
#[must_use]
pub fn balance_deltas(raw: &RawTransaction, address: &str) -> Vec<BalanceDelta> {
    let Some(meta) = &raw.meta else {
        return Vec::new();
    };
    if raw.transaction.is_none() || meta.err.is_some() {
        return Vec::new();
    }

    let mut deltas = Vec::new();

    if let Some(index) = raw.account_index(address) {
        if let (Some(&pre), Some(&post)) =
            (meta.pre_balances.get(index), meta.post_balances.get(index))
        {
            #[allow(clippy::cast_precision_loss)]
            let (pre_sol, post_sol) = (
                pre as f64 / LAMPORTS_PER_SOL,
                post as f64 / LAMPORTS_PER_SOL,
            );
            if post_sol != pre_sol {
                deltas.push(BalanceDelta {
                    mint: SOL_MINT.to_string(),
                    pre_amount: pre_sol,
                    post_amount: post_sol,
                });
            }
        }
    }

    let owned = |balances: &[crate::types::TokenBalance]| -> HashMap<String, f64> {
        balances
            .iter()
            .filter(|balance| balance.owner.as_deref() == Some(address))
            .map(|balance| {
                (
                    balance.mint.clone(),
                    balance.ui_token_amount.ui_value().unwrap_or(0.0),
                )
            })
            .collect()
    };
    let pre_amounts = owned(&meta.pre_token_balances);
    let post_amounts = owned(&meta.post_token_balances);

    // BTreeSet keeps the per-mint lines in a stable order.
    let mints: BTreeSet<&String> = pre_amounts.keys().chain(post_amounts.keys()).collect();
    for mint in mints {
        let pre = pre_amounts.get(mint).copied().unwrap_or(0.0);
        let post = post_amounts.get(mint).copied().unwrap_or(0.0);
        if post != pre {
            deltas.push(BalanceDelta {
                mint: mint.clone(),
                pre_amount: pre,
                post_amount: post,
            });
        }
    }

    deltas
}

/// Builds a notification for one confirmed transaction, or `None` when the
/// monitored address saw no balance change worth reporting.
pub async fn build_notification(
    raw: &RawTransaction,
    address: &str,
    signature: &str,
    prices: &dyn PriceLookup,
) -> Option<ActivityNotification> {
    let deltas = balance_deltas(raw, address);
    if deltas.is_empty() {
        return None;
    }

    let mints: Vec<String> = deltas
        .iter()
        .filter(|delta| !delta.is_native())
        .map(|delta| delta.mint.clone())
        .collect();
    let price_map: HashMap<String, TokenPrice> = if mints.is_empty() {
        HashMap::new()
    } else {
        prices.prices(&mints).await
    };

    let lines = deltas
        .iter()
        .map(|delta| {
            let label = if delta.is_native() {
                "SOL".to_string()
            } else {
                price_map
                    .get(&delta.mint)
                    .and_then(|price| price.symbol.clone())
                    .unwrap_or_else(|| shorten_mint(&delta.mint))
            };
            NotificationLine {
                label,
                direction: delta.direction(),
                amount: delta.delta().abs(),
                mint: delta.mint.clone(),
            }
        })
        .collect();

    Some(ActivityNotification {
        address: address.to_string(),
        signature: signature.to_string(),
        lines,
        explorer_url: explorer_url(signature),
    })
}
