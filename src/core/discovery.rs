//! Paginated signature discovery under a selection policy.
//!
//! Pages arrive newest-first; the `before` cursor of each request is the
//! last signature of the previous page, so pagination walks strictly
//! backward through history. A failing page halts the walk and returns what
//! was accumulated, since partial results beat total failure. Authentication
//! failures are the exception and escalate, because retrying cannot help.

use chrono::{DateTime, Utc};

use crate::common::error::Result;
use crate::common::logging::{self, LogLevel};
use crate::rpc::client::RpcClient;
use crate::types::SignatureRecord;

/// Signatures requested per page.
pub const SIGNATURE_PAGE_SIZE: u32 = 1000;

/// Scan ceiling for date-range discovery, in scanned (not kept) entries.
pub const DATE_RANGE_SCAN_CAP: usize = 20_000;

/// Scan ceiling for slot-range discovery.
pub const SLOT_RANGE_SCAN_CAP: usize = 5_000;

/// Page budget for incremental scans.
pub const SINCE_PAGE_BUDGET: usize = 10;

/// Which part of an address's history to discover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// The most recent `limit` signatures; a single page request.
    Latest { limit: u32 },
    /// Signatures confirmed within `[start, end]`, inclusive.
    DateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Signatures whose slot lies within `[start_slot, end_slot]`.
    SlotRange { start_slot: u64, end_slot: u64 },
}

/// Result of an incremental scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalScan {
    /// Descriptors newer than the previous marker, newest first.
    pub records: Vec<SignatureRecord>,
    /// Marker to persist for the next scan. When nothing new was found this
    /// is the previous marker, unchanged; the marker never regresses.
    pub marker: Option<String>,
}

/// Discovers signature descriptors for `address` under `mode`.
pub async fn discover(
    client: &RpcClient,
    address: &str,
    mode: &ScanMode,
) -> Result<Vec<SignatureRecord>> {
    match mode {
        ScanMode::Latest { limit } => scan_latest(client, address, *limit).await,
        ScanMode::DateRange { start, end } => {
            scan_date_range(client, address, start.timestamp(), end.timestamp()).await
        }
        ScanMode::SlotRange {
            start_slot,
            end_slot,
        } => scan_slot_range(client, address, *start_slot, *end_slot).await,
    }
}

/// Collects descriptors newer than `marker`, up to [`SINCE_PAGE_BUDGET`]
/// pages back. The marker match is exclusive; the newest signature of the
/// first page becomes the next marker. A marker beyond the page budget
/// yields a best-effort partial result, never an error.
pub async fn discover_since(
    client: &RpcClient,
    address: &str,
    marker: Option<&str>,
) -> Result<IncrementalScan> {
    let mut collected = Vec::new();
    let mut newest: Option<String> = None;
    let mut before: Option<String> = None;
    let mut found_marker = false;

    for _ in 0..SINCE_PAGE_BUDGET {
        // The marker doubles as the provider-side `until` bound; the scan
        // still stops itself when a page carries the marker anyway.
        let page = match client
            .get_signatures_for_address(address, SIGNATURE_PAGE_SIZE, before.as_deref(), marker)
            .await
        {
            Ok(page) => page,
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) => {
                logging::log(
                    LogLevel::Warning,
                    &format!("Incremental page failed for {address}: {e}"),
                );
                break;
            }
        };
        if page.is_empty() {
            break;
        }

        if newest.is_none() {
            newest = page.first().map(|record| record.signature.clone());
        }
        for record in &page {
            if marker == Some(record.signature.as_str()) {
                found_marker = true;
                break;
            }
            collected.push(record.clone());
        }

        if found_marker || page.len() < SIGNATURE_PAGE_SIZE as usize {
            break;
        }
        before = page.last().map(|record| record.signature.clone());
    }

    if collected.is_empty() {
        return Ok(IncrementalScan {
            records: Vec::new(),
            marker: marker.map(str::to_owned),
        });
    }
    Ok(IncrementalScan {
        records: collected,
        marker: newest,
    })
}

async fn scan_latest(
    client: &RpcClient,
    address: &str,
    limit: u32,
) -> Result<Vec<SignatureRecord>> {
    match client
        .get_signatures_for_address(address, limit, None, None)
        .await
    {
        Ok(page) => Ok(page),
        Err(e) if e.is_auth_failure() => Err(e),
        Err(e) => {
            logging::log(
                LogLevel::Warning,
                &format!("Could not fetch signatures for {address}: {e}"),
            );
            Ok(Vec::new())
        }
    }
}

async fn scan_date_range(
    client: &RpcClient,
    address: &str,
    start_ts: i64,
    end_ts: i64,
) -> Result<Vec<SignatureRecord>> {
    let mut kept = Vec::new();
    let mut before: Option<String> = None;
    let mut scanned = 0usize;

    while scanned < DATE_RANGE_SCAN_CAP {
        let page = match client
            .get_signatures_for_address(address, SIGNATURE_PAGE_SIZE, before.as_deref(), None)
            .await
        {
            Ok(page) => page,
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) => {
                logging::log(
                    LogLevel::Warning,
                    &format!("Signature page failed for {address}: {e}"),
                );
                break;
            }
        };
        if page.is_empty() {
            break;
        }

        for record in &page {
            // Entries without a confirmation time cannot be placed in the
            // range and are never kept.
            if record
                .block_time
                .is_some_and(|bt| bt >= start_ts && bt <= end_ts)
            {
                kept.push(record.clone());
            }
        }

        let Some(oldest) = page.last() else { break };
        if oldest.block_time.is_some_and(|bt| bt < start_ts) {
            break;
        }
        if page.len() < SIGNATURE_PAGE_SIZE as usize {
            break;
        }
        before = Some(oldest.signature.clone());
        scanned += page.len();
    }

    Ok(kept)
}

async fn scan_slot_range(
    client: &RpcClient,
    address: &str,
    start_slot: u64,
    end_slot: u64,
) -> Result<Vec<SignatureRecord>> {
    let mut kept = Vec::new();
    let mut before: Option<String> = None;
    let mut scanned = 0usize;

    while scanned < SLOT_RANGE_SCAN_CAP {
        let page = match client
            .get_signatures_for_address(address, SIGNATURE_PAGE_SIZE, before.as_deref(), None)
            .await
        {
            Ok(page) => page,
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) => {
                logging::log(
                    LogLevel::Warning,
                    &format!("Signature page failed for {address}: {e}"),
                );
                break;
            }
        };
        if page.is_empty() {
            break;
        }

        // Slots decrease as pagination walks backward, so the first slot
        // below the range ends the scan.
        let mut past_range = false;
        for record in &page {
            if record.slot > end_slot {
                continue;
            }
            if record.slot < start_slot {
                past_range = true;
                break;
            }
            kept.push(record.clone());
        }

        if past_range || page.len() < SIGNATURE_PAGE_SIZE as usize {
            break;
        }
        before = page.last().map(|record| record.signature.clone());
        scanned += page.len();
    }

    Ok(kept)
}
