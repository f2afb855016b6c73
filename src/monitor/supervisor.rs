//! Lifecycle management for per-wallet monitor tasks.
//!
//! Each subscription key owns at most one running watcher. Unsubscribing
//! cancels the task and waits for it to finish.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::error::{Result, WalletMonitorError};
use crate::common::logging::{self, LogLevel};
use crate::config::WalletMonitorConfig;
use crate::monitor::prices::PriceLookup;
use crate::monitor::watcher::WalletWatcher;
use crate::rpc::RpcClient;
use crate::types::ActivityNotification;

/// Identifies one monitoring session: a subscriber watching one address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    /// Identifier of the subscribing party (user, chat, session)
    pub subscriber: i64,
    /// Watched wallet address
    pub address: String,
}

impl SubscriptionKey {
    #[must_use]
    pub fn new(subscriber: i64, address: impl Into<String>) -> Self {
        Self {
            subscriber,
            address: address.into(),
        }
    }
}

/// Running monitor task and its stop signal
struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the active wallet monitors, one per subscription key.
pub struct MonitorSupervisor {
    sessions: HashMap<SubscriptionKey, MonitorHandle>,
}

impl MonitorSupervisor {
    /// Creates an empty supervisor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Starts a monitor for `key`, delivering notifications to `notify`.
    ///
    /// # Errors
    ///
    /// Returns [`WalletMonitorError::AlreadyMonitored`] when a session for
    /// the same key is still active, and configuration errors when no
    /// client or WebSocket endpoint can be built from `config`.
    pub fn subscribe(
        &mut self,
        key: SubscriptionKey,
        config: &WalletMonitorConfig,
        prices: Arc<dyn PriceLookup>,
        notify: mpsc::UnboundedSender<ActivityNotification>,
    ) -> Result<()> {
        if let Some(handle) = self.sessions.get(&key) {
            if !handle.task.is_finished() {
                return Err(WalletMonitorError::AlreadyMonitored(key.address.clone()));
            }
            // The previous watcher already exited on its own (for example
            // after an authentication failure); its slot is free again.
            self.sessions.remove(&key);
        }

        let client = RpcClient::new(config)?;
        let watcher = WalletWatcher::new(key.address.clone(), config, client, prices, notify)?;
        let cancel = CancellationToken::new();
        let task = tokio::spawn(watcher.run(cancel.clone()));

        logging::log(
            LogLevel::Info,
            &format!(
                "Started monitor for {} (subscriber {})",
                key.address, key.subscriber
            ),
        );
        self.sessions.insert(key, MonitorHandle { cancel, task });
        Ok(())
    }

    /// Stops the monitor for `key` and waits for its task to exit.
    ///
    /// Returns `false` when no session was registered under the key.
    pub async fn unsubscribe(&mut self, key: &SubscriptionKey) -> bool {
        let Some(handle) = self.sessions.remove(key) else {
            return false;
        };

        handle.cancel.cancel();
        if let Err(e) = handle.task.await {
            logging::log(
                LogLevel::Warning,
                &format!("Monitor task for {} ended abnormally: {e}", key.address),
            );
        }

        logging::log(
            LogLevel::Info,
            &format!(
                "Stopped monitor for {} (subscriber {})",
                key.address, key.subscriber
            ),
        );
        true
    }

    /// Whether a session is registered under `key`.
    #[must_use]
    pub fn is_active(&self, key: &SubscriptionKey) -> bool {
        self.sessions.contains_key(key)
    }

    /// Keys of all registered sessions.
    #[must_use]
    pub fn active_keys(&self) -> Vec<SubscriptionKey> {
        self.sessions.keys().cloned().collect()
    }

    /// Stops every session and waits for each task to exit.
    pub async fn shutdown(&mut self) {
        for key in self.active_keys() {
            self.unsubscribe(&key).await;
        }
    }
}

impl Default for MonitorSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
