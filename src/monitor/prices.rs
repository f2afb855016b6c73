//! Price-lookup boundary used to label token notifications.
//!
//! The actual price client lives outside this crate; the monitor only needs
//! symbols (and tolerates having none).

use async_trait::async_trait;
use std::collections::HashMap;

/// Price and symbol for one token mint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenPrice {
    pub value: Option<f64>,
    pub symbol: Option<String>,
}

/// Injected lookup from mint addresses to price metadata.
///
/// Implementations may return a partial (or empty) map; callers fall back
/// to showing the shortened mint address.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    async fn prices(&self, mints: &[String]) -> HashMap<String, TokenPrice>;
}

/// Lookup that knows nothing; every label falls back to the mint address.
pub struct NoPriceLookup;

#[async_trait]
impl PriceLookup for NoPriceLookup {
    async fn prices(&self, _mints: &[String]) -> HashMap<String, TokenPrice> {
        HashMap::new()
    }
}
