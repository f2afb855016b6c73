//! JSON-RPC transport with throttling, retry and response caching.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use tokio::sync::{Mutex, Semaphore};
use url::Url;

use crate::common::error::{Result, WalletMonitorError};
use crate::common::logging::{self, LogLevel};
use crate::config::WalletMonitorConfig;
use crate::rpc::auth::AuthRegistry;
use crate::types::{SignatureRecord, TOKEN_PROGRAM_ID};

/// Methods whose results never change once confirmed. Everything else is
/// time-varying and must not be cached.
const CACHEABLE_METHODS: &[&str] = &["getTransaction"];

/// A throttled, retrying JSON-RPC client bound to one endpoint.
///
/// All mutable state (request counter, cache, in-flight limiter) is scoped
/// to the instance; clones of the [`Arc`]-wrapped client share it.
pub struct RpcClient {
    endpoint: Url,
    http: reqwest::Client,
    headers: HeaderMap,
    limiter: Semaphore,
    request_id: AtomicU64,
    transaction_cache: Mutex<HashMap<String, Value>>,
    max_retries: u32,
    backoff_secs: u64,
}

impl RpcClient {
    /// Creates a client with the default provider strategies.
    pub fn new(config: &WalletMonitorConfig) -> Result<Arc<Self>> {
        Self::with_auth(config, AuthRegistry::default())
    }

    /// Creates a client with a caller-supplied strategy registry.
    pub fn with_auth(config: &WalletMonitorConfig, auth: AuthRegistry) -> Result<Arc<Self>> {
        let endpoint = Url::parse(&config.rpc_url)
            .map_err(|e| WalletMonitorError::Config(format!("invalid RPC URL: {e}")))?;

        if let Some(provider) = auth.provider_name(&endpoint) {
            logging::log(
                LogLevel::Info,
                &format!("Using the {provider} header profile for {}", endpoint.host_str().unwrap_or("endpoint")),
            );
        }
        let headers = auth.headers_for(&endpoint);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| WalletMonitorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Arc::new(Self {
            endpoint,
            http,
            headers,
            limiter: Semaphore::new(config.max_concurrent_requests),
            request_id: AtomicU64::new(0),
            transaction_cache: Mutex::new(HashMap::new()),
            max_retries: config.max_retries,
            backoff_secs: config.retry_backoff_secs,
        }))
    }

    /// Number of JSON-RPC envelopes sent so far. Cache hits do not count.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.request_id.load(Ordering::SeqCst)
    }

    /// Executes one JSON-RPC call and returns its `result` member.
    ///
    /// Retries retryable failures (429, other HTTP errors, network errors)
    /// up to the configured attempt budget with `base * 2^attempt` backoff.
    /// HTTP 403 returns [`WalletMonitorError::AuthFailure`] immediately; a
    /// JSON-RPC `error` member returns [`WalletMonitorError::Rpc`] without
    /// retry.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let cache_key = CACHEABLE_METHODS
            .contains(&method)
            .then(|| format!("{method}:{params}"));
        if let Some(key) = &cache_key {
            if let Some(cached) = self.transaction_cache.lock().await.get(key) {
                log::debug!("cache hit for {method}");
                return Ok(cached.clone());
            }
        }

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| WalletMonitorError::Internal("request limiter closed".to_string()))?;

        let mut payload = json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": method,
            "params": params
        });
        let mut last_error = WalletMonitorError::Internal(format!("{method} was never attempted"));

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let backoff = self.backoff_secs.saturating_mul(1 << (attempt - 1));
                tokio::time::sleep(Duration::from_secs(backoff)).await;
            }

            let id = self.request_id.fetch_add(1, Ordering::SeqCst) + 1;
            payload["id"] = json!(id);
            log::debug!(
                "rpc {method} id={id} attempt {}/{}",
                attempt + 1,
                self.max_retries
            );

            let response = match self
                .http
                .post(self.endpoint.clone())
                .headers(self.headers.clone())
                .json(&payload)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    last_error =
                        WalletMonitorError::Network(format!("{method} request failed: {e}"));
                    logging::log(
                        LogLevel::Warning,
                        &format!(
                            "Attempt {}/{} for {method} failed: {e}",
                            attempt + 1,
                            self.max_retries
                        ),
                    );
                    continue;
                }
            };

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    last_error = WalletMonitorError::RateLimited(format!(
                        "HTTP 429 from provider on {method}"
                    ));
                    logging::log(
                        LogLevel::Warning,
                        &format!(
                            "Rate limited on {method}, attempt {}/{}",
                            attempt + 1,
                            self.max_retries
                        ),
                    );
                    continue;
                }
                StatusCode::FORBIDDEN => {
                    return Err(WalletMonitorError::AuthFailure(
                        "HTTP 403 from provider, check the RPC URL and API key".to_string(),
                    ));
                }
                status if !status.is_success() => {
                    last_error =
                        WalletMonitorError::Network(format!("{method} returned HTTP {status}"));
                    logging::log(
                        LogLevel::Warning,
                        &format!(
                            "{method} returned HTTP {status}, attempt {}/{}",
                            attempt + 1,
                            self.max_retries
                        ),
                    );
                    continue;
                }
                _ => {}
            }

            let envelope: Value = match response.json().await {
                Ok(envelope) => envelope,
                Err(e) => {
                    last_error =
                        WalletMonitorError::Network(format!("{method} returned invalid JSON: {e}"));
                    continue;
                }
            };

            if let Some(error) = envelope.get("error") {
                let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown RPC error")
                    .to_string();
                return Err(WalletMonitorError::Rpc { code, message });
            }

            let result = envelope.get("result").cloned().unwrap_or(Value::Null);
            if let Some(key) = cache_key {
                // Only a confirmed body is immutable; null means the
                // provider has not seen the transaction yet.
                if !result.is_null() {
                    self.transaction_cache.lock().await.insert(key, result.clone());
                }
            }
            return Ok(result);
        }

        Err(WalletMonitorError::MaxRetriesExceeded {
            method: method.to_string(),
            attempts: self.max_retries,
            source: Box::new(last_error),
        })
    }

    /// One page of an address's signature history, newest first.
    /// Entries that fail to deserialize are dropped individually.
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: u32,
        before: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<SignatureRecord>> {
        let mut options = serde_json::Map::new();
        options.insert("limit".to_string(), json!(limit));
        if let Some(before) = before {
            options.insert("before".to_string(), json!(before));
        }
        if let Some(until) = until {
            options.insert("until".to_string(), json!(until));
        }

        let result = self
            .call("getSignaturesForAddress", json!([address, options]))
            .await?;
        let entries = result.as_array().cloned().unwrap_or_default();
        Ok(entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect())
    }

    /// Full transaction body for a signature; `Null` when unknown.
    pub async fn get_transaction(&self, signature: &str) -> Result<Value> {
        self.call(
            "getTransaction",
            json!([signature, { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }]),
        )
        .await
    }

    /// Token accounts of an owner, optionally narrowed to one mint.
    pub async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        mint: Option<&str>,
    ) -> Result<Value> {
        let filter = match mint {
            Some(mint) => json!({ "mint": mint }),
            None => json!({ "programId": TOKEN_PROGRAM_ID }),
        };
        self.call(
            "getTokenAccountsByOwner",
            json!([owner, filter, { "encoding": "jsonParsed" }]),
        )
        .await
    }

    /// Current supply of a token mint.
    pub async fn get_token_supply(&self, mint: &str) -> Result<Value> {
        self.call("getTokenSupply", json!([mint])).await
    }

    /// Account data for a pubkey, `jsonParsed` encoded.
    pub async fn get_account_info(&self, pubkey: &str) -> Result<Value> {
        self.call("getAccountInfo", json!([pubkey, { "encoding": "jsonParsed" }]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalletMonitorConfigBuilder;

    #[test]
    fn new_client_starts_with_zero_requests() {
        let config = WalletMonitorConfigBuilder::new()
            .with_rpc("http://127.0.0.1:8899")
            .build()
            .unwrap();

        let client = RpcClient::new(&config).unwrap();
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn rejects_unparsable_endpoint() {
        let config = WalletMonitorConfig {
            rpc_url: "not a url".to_string(),
            ..WalletMonitorConfig::default()
        };

        assert!(matches!(
            RpcClient::new(&config),
            Err(WalletMonitorError::Config(_))
        ));
    }
}
