//! Core entity types for the marketplace
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for prices)
//! - Forward-only purchase-request lifecycle

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque wallet reference binding a user to a ledger-side account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletRef(String);

impl WalletRef {
    /// Create new wallet reference
    pub fn new(wallet: impl Into<String>) -> Self {
        Self(wallet.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when no wallet is bound
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WalletRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger-assigned identifier for a land parcel
///
/// Zero is the sentinel meaning "never registered on the ledger".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerId(pub u64);

impl LedgerId {
    /// Sentinel: not registered on the ledger
    pub const NONE: LedgerId = LedgerId(0);

    /// True when the parcel has a real ledger-side identity
    pub fn is_registered(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Buyer
    Buyer,
    /// Seller
    Seller,
}

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (unique)
    pub email: String,

    /// Wallet reference (unique, required)
    pub wallet: WalletRef,

    /// Role
    pub role: Role,

    /// Per-user notification feed (append-only, insertion-ordered)
    pub notifications: Vec<Notification>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with an empty notification feed
    pub fn new(name: impl Into<String>, email: impl Into<String>, wallet: WalletRef, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            wallet,
            role,
            notifications: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Purchase request status
///
/// Lifecycle is strictly forward-moving; no transition re-enters
/// `Pending` after leaving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RequestStatus {
    /// Awaiting seller decision
    Pending = 1,
    /// Approved by seller, payment due
    Approved = 2,
    /// Rejected by seller (terminal)
    Rejected = 3,
    /// Payment settled, ownership transferred (terminal)
    Completed = 4,
}

impl RequestStatus {
    /// Check if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Completed)
    }

    /// Check whether `next` is a legal forward transition
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Approved, RequestStatus::Completed)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// Purchase request (embedded in a land record)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Request ID
    pub id: Uuid,

    /// Buyer who raised the request
    pub buyer: Uuid,

    /// Current status
    pub status: RequestStatus,

    /// Created timestamp
    pub timestamp: DateTime<Utc>,
}

impl PurchaseRequest {
    /// Create a new pending request for a buyer
    pub fn new(buyer: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            buyer,
            status: RequestStatus::Pending,
            timestamp: Utc::now(),
        }
    }
}

/// Land parcel record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Land {
    /// Land ID
    pub id: Uuid,

    /// Listing title
    pub title: String,

    /// Listing description
    pub description: String,

    /// Location
    pub location: String,

    /// Parcel size (positive)
    pub size: Decimal,

    /// Asking price in value units (positive)
    pub price: Decimal,

    /// Current owner
    pub owner: Uuid,

    /// Ledger-side identity (sentinel when never registered)
    pub ledger_id: LedgerId,

    /// Verification flag, reconciled against the ledger on reads
    pub is_verified: bool,

    /// Listed for sale
    pub is_for_sale: bool,

    /// Opaque image references (1..=5)
    pub image_refs: Vec<String>,

    /// Opaque document reference
    pub document_ref: String,

    /// Fixed-length fingerprint of the document content (hex SHA-256)
    pub document_fingerprint: String,

    /// Purchase requests, in arrival order
    pub purchase_requests: Vec<PurchaseRequest>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Land {
    /// Find a request by ID
    pub fn request(&self, request_id: Uuid) -> Option<&PurchaseRequest> {
        self.purchase_requests.iter().find(|r| r.id == request_id)
    }

    /// Find the buyer's pending request, if any
    pub fn pending_request_for(&self, buyer: Uuid) -> Option<&PurchaseRequest> {
        self.purchase_requests
            .iter()
            .find(|r| r.buyer == buyer && r.status == RequestStatus::Pending)
    }
}

/// User-visible notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A purchase request was raised
    PurchaseRequested,
    /// A purchase request was approved
    PurchaseApproved,
    /// Payment settled
    PaymentSuccessful,
    /// Ownership transferred
    OwnershipTransferred,
}

/// Notification appended to a user's feed
///
/// Append-only; only `is_read` is mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Notification ID
    pub id: Uuid,

    /// Kind
    pub kind: NotificationKind,

    /// Human-readable message
    pub message: String,

    /// Land the notification refers to
    pub land_id: Uuid,

    /// Read marker
    pub is_read: bool,

    /// Created timestamp
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Create a new unread notification
    pub fn new(kind: NotificationKind, message: impl Into<String>, land_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            message: message.into(),
            land_id,
            is_read: false,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ledger_id_sentinel() {
        assert!(!LedgerId::NONE.is_registered());
        assert!(LedgerId(7).is_registered());
    }

    #[test]
    fn test_status_transitions() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Approved));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
        assert!(RequestStatus::Approved.can_transition_to(RequestStatus::Completed));

        assert!(!RequestStatus::Approved.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Rejected.can_transition_to(RequestStatus::Approved));
        assert!(!RequestStatus::Completed.can_transition_to(RequestStatus::Approved));
    }

    #[test]
    fn test_status_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Completed.is_terminal());
    }

    #[test]
    fn test_pending_request_lookup() {
        let buyer = Uuid::new_v4();
        let mut land = test_land(Uuid::new_v4());
        assert!(land.pending_request_for(buyer).is_none());

        let mut rejected = PurchaseRequest::new(buyer);
        rejected.status = RequestStatus::Rejected;
        land.purchase_requests.push(rejected);
        assert!(land.pending_request_for(buyer).is_none());

        land.purchase_requests.push(PurchaseRequest::new(buyer));
        assert!(land.pending_request_for(buyer).is_some());
    }

    fn test_land(owner: Uuid) -> Land {
        Land {
            id: Uuid::new_v4(),
            title: "Plot 7".to_string(),
            description: "North field".to_string(),
            location: "Greenwich".to_string(),
            size: Decimal::from(500),
            price: Decimal::new(125000, 2),
            owner,
            ledger_id: LedgerId::NONE,
            is_verified: true,
            is_for_sale: true,
            image_refs: vec!["img-1".to_string()],
            document_ref: "doc-1".to_string(),
            document_fingerprint: "00".repeat(32),
            purchase_requests: vec![],
            created_at: Utc::now(),
        }
    }

    fn arb_status() -> impl Strategy<Value = RequestStatus> {
        prop_oneof![
            Just(RequestStatus::Pending),
            Just(RequestStatus::Approved),
            Just(RequestStatus::Rejected),
            Just(RequestStatus::Completed),
        ]
    }

    proptest! {
        // Any sequence of permitted transitions moves strictly forward:
        // terminal states never leave, and Pending is never re-entered.
        #[test]
        fn prop_transitions_forward_only(steps in proptest::collection::vec(arb_status(), 1..8)) {
            let mut status = RequestStatus::Pending;
            for next in steps {
                if status.can_transition_to(next) {
                    prop_assert!(!status.is_terminal());
                    prop_assert!(next != RequestStatus::Pending);
                    status = next;
                }
            }
        }
    }
}
