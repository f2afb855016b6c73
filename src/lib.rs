//! Wallet activity scanning and live monitoring for Solana.
//!
//! The crate has two halves that share one JSON-RPC transport:
//!
//! - [`WalletScanner`] pulls an address's signature history (latest page,
//!   date range, slot range or "everything since a marker"), fetches the
//!   full transactions concurrently and normalizes SOL and SPL transfers
//!   into [`TransferRecord`]s.
//! - [`MonitorSupervisor`] runs one WebSocket watcher per subscription and
//!   emits an [`ActivityNotification`] for every confirmed balance change
//!   of the watched address.

#![warn(clippy::all, clippy::pedantic)]

pub mod common;
pub mod config;
pub mod core;
pub mod monitor;
pub mod rpc;
pub mod types;

pub use crate::common::error::{Result, WalletMonitorError};
pub use crate::config::{DEFAULT_RPC_URL, WalletMonitorConfig, WalletMonitorConfigBuilder};
pub use crate::core::{
    IncrementalScan, ScanMode, TokenDetails, TokenHolding, TransactionFetcher, WalletBalances,
    WalletScanner,
};
pub use crate::monitor::{
    MonitorSupervisor, NoPriceLookup, PriceLookup, SubscriptionKey, TokenPrice, WalletWatcher,
};
pub use crate::rpc::{AuthRegistry, AuthStrategy, RpcClient};
pub use crate::types::{
    ActivityNotification, BalanceDelta, DeltaDirection, RawTransaction, SignatureRecord,
    TransferAmount, TransferKind, TransferRecord,
};
