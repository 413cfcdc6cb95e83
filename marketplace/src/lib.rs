//! Landmarket Marketplace Core
//!
//! Listing registry, purchase workflow engine, and notification emitter
//! for a land-parcel marketplace backed by an authoritative record store
//! and an optional blockchain mirror.
//!
//! # Purchase lifecycle
//!
//! ```text
//!         request()            approve()           complete()
//! [none] ---------> pending ------------> approved ----------> completed
//!                      |
//!                      | reject()
//!                      v
//!                   rejected
//! ```
//!
//! Every transition is a conditional update against the record store;
//! ledger calls are best-effort mirrors that never gate a transition.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod registry;
pub mod types;
pub mod workflow;

// Re-exports
pub use api::Marketplace;
pub use config::Config;
pub use error::{Error, FieldError, Result, ValidationErrors};
pub use notify::Notifier;
pub use registry::ListingRegistry;
pub use types::{NewUser, RegisterLand};
pub use workflow::PurchaseWorkflow;
