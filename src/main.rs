//! solana-wallet-monitor example application.
//!
//! Scans the recent history of one wallet, then watches it live and prints
//! a notification for every balance change.

#![warn(clippy::all, clippy::pedantic)]

use std::env;
use std::sync::Arc;

use solana_wallet_monitor::{
    DEFAULT_RPC_URL, MonitorSupervisor, NoPriceLookup, ScanMode, SubscriptionKey,
    WalletMonitorConfigBuilder, WalletScanner,
};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Retrieve configuration from environment variables
    let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
    let address = env::var("WALLET_ADDRESS")?;

    println!("Initializing wallet monitor...");
    println!("RPC URL: {rpc_url}");
    println!("Wallet: {address}");

    // Build configuration using the builder pattern
    let mut builder = WalletMonitorConfigBuilder::new().with_rpc(rpc_url);
    if let Ok(ws_url) = env::var("WS_URL") {
        builder = builder.with_websocket(ws_url);
    }
    let config = builder.build()?;

    // Show the most recent transfers before going live
    let scanner = WalletScanner::new(&config)?;
    let records = scanner
        .scan(&address, &ScanMode::Latest { limit: 10 })
        .await?;

    println!("\nLast {} transfer(s):", records.len());
    for record in &records {
        println!(
            "  [{}] {} {} -> {}: {} ({})",
            record.timestamp,
            record.kind,
            record.source,
            record.destination,
            record.amount,
            record.signature
        );
    }

    // Watch the wallet live
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut supervisor = MonitorSupervisor::new();
    supervisor.subscribe(
        SubscriptionKey::new(0, address.clone()),
        &config,
        Arc::new(NoPriceLookup),
        tx,
    )?;

    println!("\nWatching {address} for new activity");
    println!("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            notification = rx.recv() => match notification {
                Some(notification) => println!("\n{}", notification.render()),
                None => break,
            }
        }
    }

    supervisor.shutdown().await;
    Ok(())
}
