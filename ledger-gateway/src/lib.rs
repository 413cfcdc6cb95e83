//! Landmarket Ledger Gateway
//!
//! Thin abstraction over the external blockchain capability: submit a
//! transaction, wait for confirmation, read contract state. The chain is
//! treated as unreliable and optional throughout.
//!
//! # Ground rules
//!
//! - The record store is authoritative; the ledger only mirrors facts
//!   already committed there.
//! - Every gateway call is fallible and is never a correctness
//!   precondition for the primary operation.
//! - Mirror failures are absorbed here, once, in [`LedgerGateway`] —
//!   callers see a [`MirrorOutcome`], never an error.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod rpc;
pub mod types;

// Re-exports
pub use client::LedgerClient;
pub use config::Config;
pub use error::{Error, Result};
pub use gateway::{LedgerGateway, MirrorOutcome};
pub use rpc::RpcClient;
pub use types::{RegistrationFields, TxReceipt};
