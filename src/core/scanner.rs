//! The discover → fetch → normalize pipeline behind one facade.

use std::sync::Arc;

use crate::common::error::Result;
use crate::common::logging::{self, LogLevel};
use crate::config::WalletMonitorConfig;
use crate::core::discovery::{self, ScanMode};
use crate::core::fetcher::TransactionFetcher;
use crate::core::normalizer;
use crate::rpc::client::RpcClient;
use crate::types::TransferRecord;

/// Historical and incremental wallet scanning.
pub struct WalletScanner {
    client: Arc<RpcClient>,
    fetcher: TransactionFetcher,
}

impl WalletScanner {
    /// Builds a scanner with its own transport.
    pub fn new(config: &WalletMonitorConfig) -> Result<Self> {
        let client = RpcClient::new(config)?;
        Ok(Self::from_client(client, config))
    }

    /// Builds a scanner on an existing transport, sharing its limiter and
    /// cache.
    #[must_use]
    pub fn from_client(client: Arc<RpcClient>, config: &WalletMonitorConfig) -> Self {
        let fetcher = TransactionFetcher::new(Arc::clone(&client), config);
        Self { client, fetcher }
    }

    /// The underlying transport.
    #[must_use]
    pub fn client(&self) -> &Arc<RpcClient> {
        &self.client
    }

    /// Discovers, fetches and normalizes transfers for `address`.
    pub async fn scan(&self, address: &str, mode: &ScanMode) -> Result<Vec<TransferRecord>> {
        logging::log(
            LogLevel::Info,
            &format!("Fetching signatures for address {address}..."),
        );
        let descriptors = discovery::discover(&self.client, address, mode).await?;

        logging::log(
            LogLevel::Info,
            &format!(
                "Found {} signatures. Fetching transactions...",
                descriptors.len()
            ),
        );
        let fetched = self.fetcher.fetch_all(&descriptors).await?;

        let mut records = Vec::new();
        for (descriptor, body) in &fetched {
            if let Some(body) = body {
                records.extend(normalizer::normalize(body, descriptor));
            }
        }
        logging::log(
            LogLevel::Success,
            &format!("Extracted {} transfer records", records.len()),
        );
        Ok(records)
    }

    /// Scans forward from `marker`, returning new transfer records and the
    /// marker to persist for the next call.
    pub async fn scan_since(
        &self,
        address: &str,
        marker: Option<&str>,
    ) -> Result<(Vec<TransferRecord>, Option<String>)> {
        let scan = discovery::discover_since(&self.client, address, marker).await?;
        if scan.records.is_empty() {
            return Ok((Vec::new(), scan.marker));
        }

        let fetched = self.fetcher.fetch_all(&scan.records).await?;
        let mut records = Vec::new();
        for (descriptor, body) in &fetched {
            if let Some(body) = body {
                records.extend(normalizer::normalize(body, descriptor));
            }
        }
        Ok((records, scan.marker))
    }
}
