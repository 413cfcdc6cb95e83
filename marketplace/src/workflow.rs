//! Purchase workflow engine
//!
//! Owns the purchase-request state machine and coordinates record store
//! writes with best-effort ledger mirroring. Ordering is fixed: validate
//! against the store, commit the store mutation, then mirror and notify.
//! A ledger call never holds a store lock and never rolls a commit back.

use crate::{notify::Notifier, Error, Result};
use ledger_gateway::LedgerGateway;
use record_store::{
    NotificationKind, OwnershipTransfer, PurchaseRequest, RequestStatus, Storage, User,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Purchase workflow engine
#[derive(Debug, Clone)]
pub struct PurchaseWorkflow {
    store: Arc<Storage>,
    gateway: LedgerGateway,
    notifier: Notifier,
}

impl PurchaseWorkflow {
    /// Create workflow over a store, gateway, and notifier
    pub fn new(store: Arc<Storage>, gateway: LedgerGateway, notifier: Notifier) -> Self {
        Self {
            store,
            gateway,
            notifier,
        }
    }

    /// Raise a purchase request for a land
    ///
    /// The for-sale and no-duplicate-pending preconditions are enforced
    /// atomically by the store append; a concurrent duplicate loses with
    /// `DuplicateRequest`.
    pub async fn request(&self, land_id: Uuid, buyer_id: Uuid) -> Result<PurchaseRequest> {
        let land = self.store.get_land(land_id)?;
        if !land.is_for_sale {
            return Err(Error::NotForSale);
        }

        let buyer = self.require_wallet(buyer_id)?;

        let request = self.store.append_purchase_request(land_id, buyer_id)?;

        info!(
            land_id = %land_id,
            request_id = %request.id,
            buyer = %buyer_id,
            "Purchase requested"
        );

        self.notifier.emit_best_effort(
            land.owner,
            NotificationKind::PurchaseRequested,
            format!("New purchase request for {}", land.title),
            land_id,
        );
        self.notifier.emit_best_effort(
            buyer.id,
            NotificationKind::PurchaseRequested,
            format!("Your purchase request for {} has been sent", land.title),
            land_id,
        );

        Ok(request)
    }

    /// Approve a pending request; seller only
    pub async fn approve(
        &self,
        land_id: Uuid,
        request_id: Uuid,
        acting_user: Uuid,
    ) -> Result<PurchaseRequest> {
        let land = self.store.get_land(land_id)?;
        if land.owner != acting_user {
            return Err(Error::Forbidden(
                "only the land owner can approve purchase requests",
            ));
        }

        let request = land
            .request(request_id)
            .ok_or(Error::NotFound("Purchase request", request_id))?;
        let buyer = self.require_wallet(request.buyer)?;

        // Targeted conditional update: an approve racing a reject on the
        // same pending request has exactly one winner.
        let updated = self.store.update_request_status(
            land_id,
            request_id,
            RequestStatus::Pending,
            RequestStatus::Approved,
        )?;

        info!(land_id = %land_id, request_id = %request_id, "Purchase approved");

        if land.ledger_id.is_registered() {
            self.gateway.approve(land.ledger_id, &buyer.wallet).await;
        }

        self.notifier.emit_best_effort(
            buyer.id,
            NotificationKind::PurchaseApproved,
            format!(
                "Your purchase request for {} has been approved. Please complete the payment of {} value units.",
                land.title, land.price
            ),
            land_id,
        );
        self.notifier.emit_best_effort(
            land.owner,
            NotificationKind::PurchaseApproved,
            format!(
                "You approved the purchase request for {}. Waiting for payment.",
                land.title
            ),
            land_id,
        );

        let request = updated
            .request(request_id)
            .cloned()
            .ok_or(Error::NotFound("Purchase request", request_id))?;
        Ok(request)
    }

    /// Complete an approved request: transfer ownership, then mirror
    ///
    /// The store write in `transfer_ownership` is the durable record of
    /// the transfer. Payment verification and the on-chain transfer are
    /// mirrors; a buyer who paid on-chain ends up owning the parcel even
    /// when both mirror calls fail.
    pub async fn complete(
        &self,
        land_id: Uuid,
        request_id: Uuid,
        payment_proof: &str,
    ) -> Result<OwnershipTransfer> {
        let land = self.store.get_land(land_id)?;
        let request = land
            .request(request_id)
            .ok_or(Error::NotFound("Purchase request", request_id))?;
        let buyer = self.require_wallet(request.buyer)?;

        let transfer = self.store.transfer_ownership(land_id, request_id)?;

        info!(
            land_id = %land_id,
            request_id = %request_id,
            previous_owner = %transfer.previous_owner,
            buyer = %transfer.buyer,
            "Purchase completed; ownership transferred in record store"
        );

        if land.ledger_id.is_registered() {
            self.gateway.verify_payment(payment_proof).await;
            self.gateway.transfer(land.ledger_id, &buyer.wallet).await;
        }

        self.notifier.emit_best_effort(
            transfer.buyer,
            NotificationKind::OwnershipTransferred,
            format!(
                "Payment successful! You are now the owner of {}.",
                land.title
            ),
            land_id,
        );
        self.notifier.emit_best_effort(
            transfer.previous_owner,
            NotificationKind::PaymentSuccessful,
            format!("Payment received for {} from {}.", land.title, buyer.name),
            land_id,
        );
        self.notifier.emit_best_effort(
            transfer.previous_owner,
            NotificationKind::OwnershipTransferred,
            format!(
                "Ownership of {} has been transferred to {}.",
                land.title, buyer.name
            ),
            land_id,
        );

        Ok(transfer)
    }

    /// Reject a pending request; seller only
    ///
    /// Store first, mirror second: the rejection is durable before the
    /// ledger hears about it, and a failed release attempt changes
    /// nothing.
    pub async fn reject(&self, land_id: Uuid, request_id: Uuid, acting_user: Uuid) -> Result<()> {
        let land = self.store.get_land(land_id)?;
        if land.owner != acting_user {
            return Err(Error::Forbidden(
                "only the land owner can reject purchase requests",
            ));
        }

        let request = land
            .request(request_id)
            .ok_or(Error::NotFound("Purchase request", request_id))?;
        let buyer = self.require_wallet(request.buyer)?;

        self.store.update_request_status(
            land_id,
            request_id,
            RequestStatus::Pending,
            RequestStatus::Rejected,
        )?;

        info!(land_id = %land_id, request_id = %request_id, "Purchase rejected");

        if land.ledger_id.is_registered() {
            self.gateway.reject(land.ledger_id, &buyer.wallet).await;
        }

        Ok(())
    }

    fn require_wallet(&self, user_id: Uuid) -> Result<User> {
        let user = self.store.get_user(user_id)?;
        if user.wallet.is_empty() {
            return Err(Error::MissingWallet);
        }
        Ok(user)
    }
}
