//! Live monitoring: WebSocket watchers, balance diffing and notifications.

pub mod notify;
pub mod prices;
pub mod supervisor;
pub mod watcher;

pub use notify::{balance_deltas, build_notification};
pub use prices::{NoPriceLookup, PriceLookup, TokenPrice};
pub use supervisor::{MonitorSupervisor, SubscriptionKey};
pub use watcher::WalletWatcher;
