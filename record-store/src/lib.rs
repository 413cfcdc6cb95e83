//! Landmarket Record Store
//!
//! Authoritative persistence for the marketplace: users, land parcels,
//! embedded purchase requests, and per-user notifications.
//!
//! # Architecture
//!
//! - **Single source of truth**: the record store owns all entities; the
//!   blockchain ledger only mirrors a subset, asynchronously.
//! - **Atomic sub-entity updates**: purchase-request transitions are
//!   applied as compare-and-swap operations on the embedded request,
//!   guarded by its expected prior status.
//! - **No caller-visible locking**: concurrency control lives entirely
//!   inside [`Storage`]; callers sequence nothing themselves.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use storage::{OwnershipTransfer, Storage};
pub use types::{
    Land, LedgerId, Notification, NotificationKind, PurchaseRequest, RequestStatus, Role, User,
    WalletRef,
};
