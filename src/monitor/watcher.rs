//! Live wallet watcher over the Solana WebSocket log stream.
//!
//! Subscribes to log notifications mentioning one address, waits briefly for
//! finality, fetches each transaction over HTTP and pushes balance-change
//! notifications to the supervisor's channel. Reconnects on disconnect.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use crate::common::error::{Result, WalletMonitorError};
use crate::common::logging::{self, LogLevel};
use crate::config::WalletMonitorConfig;
use crate::monitor::notify::build_notification;
use crate::monitor::prices::PriceLookup;
use crate::rpc::RpcClient;
use crate::types::{ActivityNotification, RawTransaction};

/// Most recent signatures remembered for duplicate suppression.
const SEEN_SIGNATURE_CAP: usize = 512;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Watches one wallet address and emits a notification per balance change.
pub struct WalletWatcher {
    /// Wallet address under watch
    address: String,
    /// WebSocket endpoint (ws:// or wss://)
    ws_url: String,
    /// HTTP client used to fetch confirmed transactions
    client: Arc<RpcClient>,
    /// Token symbol/price source for notification labels
    prices: Arc<dyn PriceLookup>,
    /// Outbound notifications
    notify: mpsc::UnboundedSender<ActivityNotification>,
    /// Wait after a log notification before fetching the transaction
    finality_delay: Duration,
    /// Wait between reconnection attempts
    reconnect_delay: Duration,
    /// Duplicate-notification guard
    seen: SeenSignatures,
}

/// Watcher session state
enum WatchState {
    Connecting,
    Subscribed {
        socket: WsStream,
    },
    Receiving {
        socket: WsStream,
        subscription_id: u64,
    },
    Disconnected,
    Terminated,
}

/// Resolution of one notified signature
enum SignatureOutcome {
    Continue,
    Reconnect,
    Terminate,
}

/// Log notification from Solana
#[derive(Debug, Deserialize)]
struct LogsNotification {
    method: String,
    params: NotificationParams,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: NotificationResult,
}

#[derive(Debug, Deserialize)]
struct NotificationResult {
    value: NotificationValue,
}

#[derive(Debug, Deserialize)]
struct NotificationValue {
    signature: String,
}

/// Subscription acknowledgement from Solana
#[derive(Debug, Deserialize)]
struct SubscriptionResponse {
    result: u64,
}

impl WalletWatcher {
    /// Creates a watcher for one address.
    ///
    /// # Arguments
    ///
    /// * `address` - Wallet address to watch
    /// * `config` - Shared monitor configuration (endpoints and delays)
    /// * `client` - HTTP client for transaction lookups
    /// * `prices` - Symbol source for token notification lines
    /// * `notify` - Channel receiving assembled notifications
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no WebSocket endpoint can be
    /// derived from the configured RPC URL.
    pub fn new(
        address: impl Into<String>,
        config: &WalletMonitorConfig,
        client: Arc<RpcClient>,
        prices: Arc<dyn PriceLookup>,
        notify: mpsc::UnboundedSender<ActivityNotification>,
    ) -> Result<Self> {
        Ok(Self {
            address: address.into(),
            ws_url: config.websocket_url()?,
            client,
            prices,
            notify,
            finality_delay: Duration::from_secs(config.finality_delay_secs),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            seen: SeenSignatures::new(SEEN_SIGNATURE_CAP),
        })
    }

    /// Runs the watch loop until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut state = WatchState::Connecting;

        loop {
            state = match state {
                WatchState::Connecting => {
                    select! {
                        () = cancel.cancelled() => WatchState::Terminated,
                        connected = self.connect() => match connected {
                            Ok(socket) => WatchState::Subscribed { socket },
                            Err(e) => {
                                logging::log(
                                    LogLevel::Warning,
                                    &format!("WebSocket connection failed: {e}"),
                                );
                                WatchState::Disconnected
                            }
                        },
                    }
                }
                WatchState::Subscribed { socket } => self.await_subscription(socket, &cancel).await,
                WatchState::Receiving {
                    socket,
                    subscription_id,
                } => self.receive(socket, subscription_id, &cancel).await,
                WatchState::Disconnected => {
                    logging::log(
                        LogLevel::Warning,
                        &format!(
                            "Monitor for {} disconnected, reconnecting in {}s",
                            self.address,
                            self.reconnect_delay.as_secs()
                        ),
                    );
                    select! {
                        () = cancel.cancelled() => WatchState::Terminated,
                        () = sleep(self.reconnect_delay) => WatchState::Connecting,
                    }
                }
                WatchState::Terminated => break,
            };

            if matches!(state, WatchState::Terminated) {
                break;
            }
        }

        logging::log(
            LogLevel::Info,
            &format!("Monitor stopped for {}", self.address),
        );
    }

    /// Opens the socket and sends the log subscription for this address.
    async fn connect(&self) -> Result<WsStream> {
        logging::log(
            LogLevel::Info,
            &format!("Connecting to WebSocket: {}", self.ws_url),
        );

        let (mut socket, _) = connect_async(&self.ws_url)
            .await
            .map_err(|e| WalletMonitorError::WebSocket(format!("connection failed: {e}")))?;

        let subscribe_request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "logsSubscribe",
            "params": [
                { "mentions": [self.address] },
                { "commitment": "confirmed" }
            ]
        });

        socket
            .send(Message::Text(subscribe_request.to_string()))
            .await
            .map_err(|e| {
                WalletMonitorError::WebSocket(format!("failed to send subscription: {e}"))
            })?;

        Ok(socket)
    }

    /// Waits for the subscription acknowledgement, skipping unrelated frames.
    async fn await_subscription(
        &self,
        mut socket: WsStream,
        cancel: &CancellationToken,
    ) -> WatchState {
        loop {
            select! {
                () = cancel.cancelled() => {
                    let _ = socket.close(None).await;
                    return WatchState::Terminated;
                }
                frame = socket.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(response) = serde_json::from_str::<SubscriptionResponse>(&text) {
                            logging::log(
                                LogLevel::Success,
                                &format!(
                                    "Watching {} (subscription {})",
                                    self.address, response.result
                                ),
                            );
                            return WatchState::Receiving {
                                socket,
                                subscription_id: response.result,
                            };
                        }
                        // The provider may answer the subscribe request with
                        // a JSON-RPC error instead of an acknowledgement.
                        // Waiting any longer cannot succeed.
                        if let Some(error) = subscription_error(&text) {
                            logging::log(
                                LogLevel::Warning,
                                &format!(
                                    "Subscription rejected for {}: {error}",
                                    self.address
                                ),
                            );
                            let _ = socket.close(None).await;
                            return WatchState::Disconnected;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        logging::log(
                            LogLevel::Warning,
                            &format!("WebSocket error before acknowledgement: {e}"),
                        );
                        return WatchState::Disconnected;
                    }
                    None => return WatchState::Disconnected,
                },
            }
        }
    }

    /// Consumes one frame from the live stream and resolves the next state.
    async fn receive(
        &mut self,
        mut socket: WsStream,
        subscription_id: u64,
        cancel: &CancellationToken,
    ) -> WatchState {
        let frame = select! {
            () = cancel.cancelled() => {
                let _ = socket.close(None).await;
                return WatchState::Terminated;
            }
            frame = socket.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                if let Some(signature) = parse_signature_notification(&text) {
                    match self.handle_signature(&signature, cancel).await {
                        SignatureOutcome::Continue => {}
                        SignatureOutcome::Reconnect => return WatchState::Disconnected,
                        SignatureOutcome::Terminate => {
                            let _ = socket.close(None).await;
                            return WatchState::Terminated;
                        }
                    }
                }
                WatchState::Receiving {
                    socket,
                    subscription_id,
                }
            }
            Some(Ok(Message::Close(_))) | None => WatchState::Disconnected,
            Some(Ok(_)) => WatchState::Receiving {
                socket,
                subscription_id,
            },
            Some(Err(e)) => {
                logging::log(LogLevel::Warning, &format!("WebSocket error: {e}"));
                WatchState::Disconnected
            }
        }
    }

    /// Fetches one notified transaction and forwards its notification.
    async fn handle_signature(
        &mut self,
        signature: &str,
        cancel: &CancellationToken,
    ) -> SignatureOutcome {
        if !self.seen.insert(signature) {
            return SignatureOutcome::Continue;
        }

        logging::log(
            LogLevel::Info,
            &format!("New activity for {}: {signature}", self.address),
        );

        // Give the transaction a moment to reach confirmed storage.
        select! {
            () = cancel.cancelled() => return SignatureOutcome::Terminate,
            () = sleep(self.finality_delay) => {}
        }

        let value = match self.client.get_transaction(signature).await {
            Ok(value) => value,
            Err(e) if e.is_auth_failure() => {
                logging::log(
                    LogLevel::Error,
                    &format!("Authentication failed, stopping monitor for {}: {e}", self.address),
                );
                return SignatureOutcome::Terminate;
            }
            Err(e) => {
                logging::log(
                    LogLevel::Warning,
                    &format!("Failed to fetch {signature}: {e}"),
                );
                return SignatureOutcome::Reconnect;
            }
        };

        // Not in confirmed storage yet; the poller will not see it either.
        if value.is_null() {
            return SignatureOutcome::Continue;
        }

        let Ok(raw) = serde_json::from_value::<RawTransaction>(value) else {
            return SignatureOutcome::Continue;
        };

        if let Some(notification) =
            build_notification(&raw, &self.address, signature, self.prices.as_ref()).await
        {
            if self.notify.send(notification).is_err() {
                logging::log(
                    LogLevel::Warning,
                    &format!("Notification channel closed for {}", self.address),
                );
            }
        }

        SignatureOutcome::Continue
    }
}

/// Extracts the `error` member from a JSON-RPC response frame, if any.
fn subscription_error(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|frame| frame.get("error").cloned())
}

/// Extracts the signature from a `logsNotification` frame, if it is one.
fn parse_signature_notification(text: &str) -> Option<String> {
    let notification = serde_json::from_str::<LogsNotification>(text).ok()?;
    if notification.method == "logsNotification" {
        Some(notification.params.result.value.signature)
    } else {
        None
    }
}

/// Bounded set of recently seen signatures, oldest evicted first.
struct SeenSignatures {
    order: VecDeque<String>,
    set: HashSet<String>,
    capacity: usize,
}

impl SeenSignatures {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            set: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a signature, returning `false` when it was already present.
    fn insert(&mut self, signature: &str) -> bool {
        if self.set.contains(signature) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.set.remove(&evicted);
            }
        }
        self.order.push_back(signature.to_string());
        self.set.insert(signature.to_string());
        true
    }
}
