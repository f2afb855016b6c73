//! Core data types: signature descriptors, raw transaction bodies,
//! canonical transfer records and balance deltas.

pub mod balance;
pub mod signature;
pub mod transaction;
pub mod transfer;

pub use balance::{ActivityNotification, BalanceDelta, DeltaDirection, NotificationLine};
pub use signature::SignatureRecord;
pub use transaction::{
    LAMPORTS_PER_SOL, RawTransaction, SOL_MINT, TOKEN_PROGRAM_ID, TokenBalance, TransactionMeta,
    UiTokenAmount,
};
pub use transfer::{TransferAmount, TransferKind, TransferRecord, explorer_url};
