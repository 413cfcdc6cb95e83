//! Listing registry
//!
//! Creates and reads land records. Registration attempts a best-effort
//! ledger mirror; reads run a reconciliation pass that lets the ledger
//! win on the verification flag only.

use crate::{
    error::{FieldError, ValidationErrors},
    types::RegisterLand,
    Error, Result,
};
use ledger_gateway::{LedgerGateway, MirrorOutcome, RegistrationFields};
use record_store::{Land, LedgerId, PurchaseRequest, Storage};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Maximum images per listing
const MAX_IMAGES: usize = 5;

/// Listing registry
#[derive(Debug, Clone)]
pub struct ListingRegistry {
    store: Arc<Storage>,
    gateway: LedgerGateway,
}

impl ListingRegistry {
    /// Create registry over a store and gateway
    pub fn new(store: Arc<Storage>, gateway: LedgerGateway) -> Self {
        Self { store, gateway }
    }

    /// Register a new land listing
    ///
    /// The ledger registration is best-effort: any gateway failure is
    /// absorbed and the record is persisted with the sentinel ledger ID.
    /// The record store write is never blocked by chain availability.
    pub async fn register(&self, input: RegisterLand, owner: Uuid) -> Result<Land> {
        Self::validate(&input)?;

        let owner_user = self.store.get_user(owner)?;
        if owner_user.wallet.is_empty() {
            return Err(Error::MissingWallet);
        }

        let document_fingerprint = fingerprint(&input.document);

        let fields = RegistrationFields {
            location: input.location.clone(),
            size: input.size,
            price: input.price,
            document_fingerprint: document_fingerprint.clone(),
        };

        let ledger_id = match self.gateway.register(&fields).await {
            MirrorOutcome::Mirrored(id) => id,
            MirrorOutcome::Absorbed => LedgerId::NONE,
        };

        let land = Land {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            location: input.location,
            size: input.size,
            price: input.price,
            owner,
            ledger_id,
            is_verified: true,
            is_for_sale: true,
            image_refs: input.image_refs,
            document_ref: input.document_ref,
            document_fingerprint,
            purchase_requests: Vec::new(),
            created_at: chrono::Utc::now(),
        };

        self.store.create_land(&land)?;

        info!(
            land_id = %land.id,
            owner = %owner,
            ledger_id = %land.ledger_id,
            "Land registered"
        );

        Ok(land)
    }

    /// Lands for sale and verified, reconciled, newest first
    pub async fn available(&self) -> Result<Vec<Land>> {
        let mut lands = self.store.lands_for_sale()?;
        self.reconcile(&mut lands).await?;

        let mut lands: Vec<Land> = lands
            .into_iter()
            .filter(|l| l.is_for_sale && l.is_verified)
            .collect();
        lands.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lands)
    }

    /// Lands owned by a user, reconciled, newest first
    pub async fn by_owner(&self, owner: Uuid) -> Result<Vec<Land>> {
        let mut lands = self.store.lands_by_owner(owner)?;
        self.reconcile(&mut lands).await?;
        lands.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lands)
    }

    /// One land by ID, reconciled
    pub async fn by_id(&self, land_id: Uuid) -> Result<Land> {
        let mut lands = [self.store.get_land(land_id)?];
        self.reconcile(&mut lands).await?;
        let [land] = lands;
        Ok(land)
    }

    /// Purchase requests for a land; owner-only view
    pub fn purchase_requests(&self, land_id: Uuid, acting_user: Uuid) -> Result<Vec<PurchaseRequest>> {
        let land = self.store.get_land(land_id)?;
        if land.owner != acting_user {
            return Err(Error::Forbidden(
                "only the land owner can view purchase requests",
            ));
        }
        Ok(land.purchase_requests)
    }

    /// Reconciliation pass: the ledger wins on verification, nothing else
    ///
    /// Gateway failures are absorbed per item; the stored value is kept
    /// and the pass continues with the remaining lands. Writing only on
    /// disagreement keeps the pass idempotent.
    async fn reconcile(&self, lands: &mut [Land]) -> Result<()> {
        for land in lands.iter_mut() {
            if !land.ledger_id.is_registered() {
                continue;
            }

            match self.gateway.read_verification(land.ledger_id).await {
                MirrorOutcome::Mirrored(verified) if verified != land.is_verified => {
                    self.store.set_verified(land.id, verified)?;
                    land.is_verified = verified;
                }
                MirrorOutcome::Mirrored(_) | MirrorOutcome::Absorbed => {}
            }
        }
        Ok(())
    }

    /// Exhaustive input validation; reports every violated field at once
    fn validate(input: &RegisterLand) -> Result<()> {
        let mut errors = Vec::new();

        if input.title.trim().is_empty() {
            errors.push(FieldError::new("title", "is required"));
        }
        if input.description.trim().is_empty() {
            errors.push(FieldError::new("description", "is required"));
        }
        if input.location.trim().is_empty() {
            errors.push(FieldError::new("location", "is required"));
        }
        if input.size <= Decimal::ZERO {
            errors.push(FieldError::new("size", "must be a positive number"));
        }
        if input.price <= Decimal::ZERO {
            errors.push(FieldError::new("price", "must be a positive number"));
        }
        if input.image_refs.is_empty() {
            errors.push(FieldError::new("images", "at least one image is required"));
        } else if input.image_refs.len() > MAX_IMAGES {
            errors.push(FieldError::new("images", "at most five images are allowed"));
        }
        if input.document_ref.trim().is_empty() || input.document.is_empty() {
            errors.push(FieldError::new("document", "is required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(ValidationErrors(errors)))
        }
    }
}

/// Fixed-length fingerprint of document content (hex SHA-256)
fn fingerprint(document: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document);
    hex::encode(hasher.finalize())
}
