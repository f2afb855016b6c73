//! Balance deltas and the notifications built from them.

use crate::types::transaction::SOL_MINT;

/// Direction of a balance change from the monitored wallet's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaDirection {
    Incoming,
    Outgoing,
}

/// Pre/post balance pair for one asset of the monitored address.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceDelta {
    /// Token mint, or [`SOL_MINT`] for the native balance.
    pub mint: String,
    pub pre_amount: f64,
    pub post_amount: f64,
}

impl BalanceDelta {
    /// Signed change, positive for received funds.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.post_amount - self.pre_amount
    }

    #[must_use]
    pub fn direction(&self) -> DeltaDirection {
        if self.delta() > 0.0 {
            DeltaDirection::Incoming
        } else {
            DeltaDirection::Outgoing
        }
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.mint == SOL_MINT
    }
}

/// One rendered line of a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationLine {
    /// Display label: `SOL`, a token symbol, or a shortened mint.
    pub label: String,
    pub direction: DeltaDirection,
    /// Absolute change magnitude.
    pub amount: f64,
    pub mint: String,
}

/// Balance-change notification for a monitored wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityNotification {
    pub address: String,
    pub signature: String,
    pub lines: Vec<NotificationLine>,
    pub explorer_url: String,
}

impl ActivityNotification {
    /// Renders the notification as delivery-ready text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "🔔 New transaction for wallet `{}`\n\n",
            shorten_address(&self.address)
        );
        for line in &self.lines {
            let marker = match line.direction {
                DeltaDirection::Incoming => "🟢 Received",
                DeltaDirection::Outgoing => "🔴 Sent",
            };
            out.push_str(&format!("{marker} {:.6} {}\n", line.amount, line.label));
        }
        out.push_str(&format!("\n🔗 {}", self.explorer_url));
        out
    }
}

/// `abcd...wxyz` form used in notification headers.
#[must_use]
pub fn shorten_address(address: &str) -> String {
    match (address.get(..4), address.get(address.len().saturating_sub(4)..)) {
        (Some(head), Some(tail)) if address.len() > 8 => format!("{head}...{tail}"),
        _ => address.to_string(),
    }
}

/// `abcdef...` form used as a symbol fallback for unknown mints.
#[must_use]
pub fn shorten_mint(mint: &str) -> String {
    match mint.get(..6) {
        Some(head) if mint.len() > 6 => format!("{head}..."),
        _ => mint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_sign_and_direction() {
        let delta = BalanceDelta {
            mint: SOL_MINT.to_string(),
            pre_amount: 10.0,
            post_amount: 9.0,
        };
        assert_eq!(delta.delta(), -1.0);
        assert_eq!(delta.direction(), DeltaDirection::Outgoing);
        assert!(delta.is_native());
    }

    #[test]
    fn render_includes_direction_amount_and_link() {
        let notification = ActivityNotification {
            address: "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".to_string(),
            signature: "sig".to_string(),
            lines: vec![NotificationLine {
                label: "SOL".to_string(),
                direction: DeltaDirection::Outgoing,
                amount: 1.0,
                mint: SOL_MINT.to_string(),
            }],
            explorer_url: "https://solscan.io/tx/sig".to_string(),
        };

        let text = notification.render();
        assert!(text.contains("🔴 Sent 1.000000 SOL"));
        assert!(text.contains("9xQe...VFin"));
        assert!(text.contains("https://solscan.io/tx/sig"));
    }

    #[test]
    fn shortening_helpers_leave_short_values_alone() {
        assert_eq!(shorten_address("abc"), "abc");
        assert_eq!(shorten_mint("abc"), "abc");
        assert_eq!(
            shorten_mint("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            "EPjFWd..."
        );
    }
}
