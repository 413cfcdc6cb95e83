//! Inbound payloads for the marketplace API

use record_store::Role;
use rust_decimal::Decimal;

/// Input for registering a new land listing
#[derive(Debug, Clone)]
pub struct RegisterLand {
    /// Listing title
    pub title: String,

    /// Listing description
    pub description: String,

    /// Location
    pub location: String,

    /// Parcel size (must be positive)
    pub size: Decimal,

    /// Asking price in value units (must be positive)
    pub price: Decimal,

    /// Opaque references to uploaded images (1..=5 required)
    pub image_refs: Vec<String>,

    /// Opaque reference to the uploaded ownership document
    pub document_ref: String,

    /// Raw document content, fingerprinted for the ledger mirror
    pub document: Vec<u8>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name
    pub name: String,

    /// Email address (unique)
    pub email: String,

    /// Wallet reference (unique, required)
    pub wallet: String,

    /// Role
    pub role: Role,
}
