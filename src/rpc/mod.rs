//! JSON-RPC transport: provider authentication and the throttled client.

pub mod auth;
pub mod client;

pub use auth::{AlchemyAuth, AuthRegistry, AuthStrategy, QuickNodeAuth};
pub use client::RpcClient;
