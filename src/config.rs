//! Configuration for the transport, scan pipeline and live monitor.

use url::Url;

use crate::common::error::{Result, WalletMonitorError};

/// Public mainnet endpoint used when no RPC URL is configured.
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Validated configuration shared by every component.
#[derive(Debug, Clone)]
pub struct WalletMonitorConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Streaming endpoint. When `None`, derived from `rpc_url` by swapping
    /// the scheme (`https` → `wss`, `http` → `ws`).
    pub ws_url: Option<String>,
    /// Global in-flight call bound of the transport.
    pub max_concurrent_requests: usize,
    /// Retry attempts per transport call.
    pub max_retries: u32,
    /// Base of the transport's `base * 2^attempt` backoff, in seconds.
    pub retry_backoff_secs: u64,
    /// Total per-request timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Concurrent transaction fetches within one batch.
    pub fetch_concurrency: usize,
    /// Attempts per transaction in a batch fetch.
    pub fetch_attempts: u32,
    /// Initial per-item backoff of the batch fetcher, in seconds.
    pub fetch_backoff_secs: u64,
    /// Grace period between a stream event and the follow-up fetch.
    pub finality_delay_secs: u64,
    /// Fixed delay before the monitor reconnects after a stream failure.
    pub reconnect_delay_secs: u64,
}

impl WalletMonitorConfig {
    /// The streaming endpoint: the configured override, or the RPC URL with
    /// its scheme swapped to the streaming equivalent.
    pub fn websocket_url(&self) -> Result<String> {
        if let Some(ws_url) = &self.ws_url {
            return Ok(ws_url.clone());
        }

        let mut url = Url::parse(&self.rpc_url)
            .map_err(|e| WalletMonitorError::Config(format!("invalid RPC URL: {e}")))?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            "ws" | "wss" => return Ok(url.into()),
            other => {
                return Err(WalletMonitorError::Config(format!(
                    "unsupported RPC scheme: {other}"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| WalletMonitorError::Config("could not derive stream URL".to_string()))?;
        Ok(url.into())
    }
}

impl Default for WalletMonitorConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            ws_url: None,
            max_concurrent_requests: 50,
            max_retries: 3,
            retry_backoff_secs: 1,
            request_timeout_secs: 30,
            fetch_concurrency: 15,
            fetch_attempts: 5,
            fetch_backoff_secs: 1,
            finality_delay_secs: 2,
            reconnect_delay_secs: 10,
        }
    }
}

/// Builder for [`WalletMonitorConfig`].
#[derive(Debug, Default)]
pub struct WalletMonitorConfigBuilder {
    config: WalletMonitorConfig,
}

impl WalletMonitorConfigBuilder {
    /// Creates a builder with the default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the JSON-RPC endpoint.
    #[must_use]
    pub fn with_rpc(mut self, rpc_url: impl Into<String>) -> Self {
        self.config.rpc_url = rpc_url.into();
        self
    }

    /// Overrides the streaming endpoint instead of deriving it.
    #[must_use]
    pub fn with_websocket(mut self, ws_url: impl Into<String>) -> Self {
        self.config.ws_url = Some(ws_url.into());
        self
    }

    #[must_use]
    pub fn with_max_concurrent_requests(mut self, bound: usize) -> Self {
        self.config.max_concurrent_requests = bound;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, attempts: u32) -> Self {
        self.config.max_retries = attempts;
        self
    }

    #[must_use]
    pub fn with_retry_backoff_secs(mut self, secs: u64) -> Self {
        self.config.retry_backoff_secs = secs;
        self
    }

    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn with_fetch_concurrency(mut self, bound: usize) -> Self {
        self.config.fetch_concurrency = bound;
        self
    }

    #[must_use]
    pub fn with_fetch_attempts(mut self, attempts: u32) -> Self {
        self.config.fetch_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_fetch_backoff_secs(mut self, secs: u64) -> Self {
        self.config.fetch_backoff_secs = secs;
        self
    }

    #[must_use]
    pub fn with_finality_delay_secs(mut self, secs: u64) -> Self {
        self.config.finality_delay_secs = secs;
        self
    }

    #[must_use]
    pub fn with_reconnect_delay_secs(mut self, secs: u64) -> Self {
        self.config.reconnect_delay_secs = secs;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<WalletMonitorConfig> {
        let config = self.config;

        if config.rpc_url.is_empty() {
            return Err(WalletMonitorError::Config(
                "RPC URL must not be empty".to_string(),
            ));
        }
        let url = Url::parse(&config.rpc_url)
            .map_err(|e| WalletMonitorError::Config(format!("invalid RPC URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WalletMonitorError::Config(format!(
                "RPC URL must be http(s), got {}",
                url.scheme()
            )));
        }
        if config.max_concurrent_requests == 0 {
            return Err(WalletMonitorError::Config(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if config.max_retries == 0 {
            return Err(WalletMonitorError::Config(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if config.fetch_concurrency == 0 {
            return Err(WalletMonitorError::Config(
                "fetch_concurrency must be at least 1".to_string(),
            ));
        }
        if config.fetch_attempts == 0 {
            return Err(WalletMonitorError::Config(
                "fetch_attempts must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}
