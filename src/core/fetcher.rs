//! Bounded-concurrency transaction fetching with per-item retry.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};

use crate::common::error::Result;
use crate::common::logging::{self, LogLevel};
use crate::config::WalletMonitorConfig;
use crate::rpc::client::RpcClient;
use crate::types::{RawTransaction, SignatureRecord};

/// Fetches full transaction bodies for signature batches.
///
/// The fetch bound is deliberately separate from the transport's global
/// limit: one logical scan can issue hundreds of lookups at once, and this
/// inner bound keeps that burst below provider rate limits.
pub struct TransactionFetcher {
    client: Arc<RpcClient>,
    concurrency: usize,
    attempts: u32,
    backoff_secs: u64,
}

impl TransactionFetcher {
    #[must_use]
    pub fn new(client: Arc<RpcClient>, config: &WalletMonitorConfig) -> Self {
        Self {
            client,
            concurrency: config.fetch_concurrency,
            attempts: config.fetch_attempts,
            backoff_secs: config.fetch_backoff_secs,
        }
    }

    /// Fetches every descriptor's transaction, preserving input order in
    /// the returned pairing.
    ///
    /// An item that keeps failing resolves to `None` and never aborts the
    /// batch; an authentication failure aborts immediately since no item
    /// can succeed after it.
    pub async fn fetch_all(
        &self,
        records: &[SignatureRecord],
    ) -> Result<Vec<(SignatureRecord, Option<RawTransaction>)>> {
        let outcomes: Vec<Result<Option<RawTransaction>>> = stream::iter(records)
            .map(|record| self.fetch_with_retry(&record.signature))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut paired = Vec::with_capacity(records.len());
        for (record, outcome) in records.iter().zip(outcomes) {
            paired.push((record.clone(), outcome?));
        }
        Ok(paired)
    }

    async fn fetch_with_retry(&self, signature: &str) -> Result<Option<RawTransaction>> {
        let mut delay = Duration::from_secs(self.backoff_secs);

        for attempt in 1..=self.attempts {
            match self.client.get_transaction(signature).await {
                Ok(value) => {
                    if value.is_null() {
                        log::debug!("transaction {signature} unknown to the provider");
                        return Ok(None);
                    }
                    // A body that does not deserialize is as useless as a
                    // missing one; the item resolves to None either way.
                    return Ok(serde_json::from_value(value).ok());
                }
                Err(e) if e.is_auth_failure() => return Err(e),
                Err(e) => {
                    logging::log(
                        LogLevel::Warning,
                        &format!(
                            "Attempt {attempt}/{} failed for tx {signature}: {e}",
                            self.attempts
                        ),
                    );
                    if attempt < self.attempts {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        logging::log(
            LogLevel::Error,
            &format!(
                "Failed to fetch transaction {signature} after {} attempts",
                self.attempts
            ),
        );
        Ok(None)
    }
}
