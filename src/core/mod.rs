//! The scan pipeline: discovery, fetching, normalization and account
//! queries.

pub mod accounts;
pub mod discovery;
pub mod fetcher;
pub mod normalizer;
pub mod scanner;

pub use accounts::{TokenDetails, TokenHolding, WalletBalances};
pub use discovery::{IncrementalScan, ScanMode};
pub use fetcher::TransactionFetcher;
pub use scanner::WalletScanner;
