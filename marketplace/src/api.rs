//! Inbound API surface
//!
//! One facade mapped 1:1 to the marketplace operations, consumed by
//! whatever serving layer sits above (out of scope here). Construction
//! wires the store, the gateway, and the three engines together once.

use crate::{
    error::{FieldError, ValidationErrors},
    notify::Notifier,
    registry::ListingRegistry,
    types::{NewUser, RegisterLand},
    workflow::PurchaseWorkflow,
    Config, Error, Result,
};
use ledger_gateway::LedgerGateway;
use record_store::{
    Land, Notification, OwnershipTransfer, PurchaseRequest, Storage, User, WalletRef,
};
use std::sync::Arc;
use uuid::Uuid;

/// Marketplace facade
#[derive(Debug, Clone)]
pub struct Marketplace {
    store: Arc<Storage>,
    registry: ListingRegistry,
    workflow: PurchaseWorkflow,
    notifier: Notifier,
}

impl Marketplace {
    /// Wire the engines over an open store and a resolved gateway
    pub fn new(store: Arc<Storage>, gateway: LedgerGateway) -> Self {
        let notifier = Notifier::new(store.clone());
        let registry = ListingRegistry::new(store.clone(), gateway.clone());
        let workflow = PurchaseWorkflow::new(store.clone(), gateway, notifier.clone());

        Self {
            store,
            registry,
            workflow,
            notifier,
        }
    }

    /// Open from configuration
    pub fn open(config: &Config) -> Result<Self> {
        let store = Arc::new(Storage::open(&config.store)?);
        let gateway = LedgerGateway::from_config(&config.ledger)
            .map_err(|e| Error::Store(record_store::Error::Config(e.to_string())))?;
        Ok(Self::new(store, gateway))
    }

    // Users

    /// Create a user (email and wallet must be unique)
    pub fn create_user(&self, input: NewUser) -> Result<User> {
        let mut errors = Vec::new();
        if input.name.trim().is_empty() {
            errors.push(FieldError::new("name", "is required"));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            errors.push(FieldError::new("email", "must be a valid email address"));
        }
        if input.wallet.trim().is_empty() {
            errors.push(FieldError::new("wallet", "is required"));
        }
        if !errors.is_empty() {
            return Err(Error::Validation(ValidationErrors(errors)));
        }

        let user = User::new(
            input.name,
            input.email,
            WalletRef::new(input.wallet),
            input.role,
        );
        Ok(self.store.create_user(user)?)
    }

    /// Get a user by ID
    pub fn get_user(&self, user_id: Uuid) -> Result<User> {
        Ok(self.store.get_user(user_id)?)
    }

    // Listings

    /// Register a new land listing for an owner
    pub async fn register_land(&self, input: RegisterLand, owner: Uuid) -> Result<Land> {
        self.registry.register(input, owner).await
    }

    /// Verified, for-sale lands (reconciled against the ledger)
    pub async fn available_lands(&self) -> Result<Vec<Land>> {
        self.registry.available().await
    }

    /// Lands owned by a user (reconciled against the ledger)
    pub async fn lands_by_owner(&self, owner: Uuid) -> Result<Vec<Land>> {
        self.registry.by_owner(owner).await
    }

    /// One land by ID (reconciled against the ledger)
    pub async fn land_by_id(&self, land_id: Uuid) -> Result<Land> {
        self.registry.by_id(land_id).await
    }

    /// Purchase requests for a land; owner-only view
    pub fn purchase_requests(
        &self,
        land_id: Uuid,
        acting_user: Uuid,
    ) -> Result<Vec<PurchaseRequest>> {
        self.registry.purchase_requests(land_id, acting_user)
    }

    // Purchase workflow

    /// Raise a purchase request
    pub async fn request_purchase(&self, land_id: Uuid, buyer_id: Uuid) -> Result<PurchaseRequest> {
        self.workflow.request(land_id, buyer_id).await
    }

    /// Approve a pending request (seller only)
    pub async fn approve_purchase(
        &self,
        land_id: Uuid,
        request_id: Uuid,
        acting_user: Uuid,
    ) -> Result<PurchaseRequest> {
        self.workflow.approve(land_id, request_id, acting_user).await
    }

    /// Complete an approved request: transfer ownership, mirror payment
    pub async fn complete_purchase(
        &self,
        land_id: Uuid,
        request_id: Uuid,
        payment_proof: &str,
    ) -> Result<OwnershipTransfer> {
        self.workflow
            .complete(land_id, request_id, payment_proof)
            .await
    }

    /// Reject a pending request (seller only)
    pub async fn reject_purchase(
        &self,
        land_id: Uuid,
        request_id: Uuid,
        acting_user: Uuid,
    ) -> Result<()> {
        self.workflow.reject(land_id, request_id, acting_user).await
    }

    // Notifications

    /// Notification feed for a user, newest first
    pub fn notifications(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        self.notifier.for_user(user_id)
    }

    /// Mark a notification as read (idempotent)
    pub fn mark_notification_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
        self.notifier.mark_read(user_id, notification_id)
    }

    /// Count of unread notifications for a user
    pub fn unread_notifications(&self, user_id: Uuid) -> Result<usize> {
        self.notifier.unread_count(user_id)
    }
}
