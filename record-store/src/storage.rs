//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `users` - User records, notifications embedded (key: user_id)
//! - `lands` - Land records, purchase requests embedded (key: land_id)
//! - `indices` - Secondary indices (email, wallet, owner)
//!
//! # Concurrency
//!
//! The two sub-entity primitives (`append_purchase_request`,
//! `update_request_status`) and the compound `transfer_ownership` are
//! serialized per land via an internal lock map. Critical sections touch
//! only this process's RocksDB handle; callers never hold a store lock
//! across a ledger call.

use crate::{
    error::{Error, Result},
    types::{Land, Notification, PurchaseRequest, RequestStatus, User},
    Config,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_USERS: &str = "users";
const CF_LANDS: &str = "lands";
const CF_INDICES: &str = "indices";

/// Index key prefixes
const IDX_EMAIL: &[u8] = b"email/";
const IDX_WALLET: &[u8] = b"wallet/";
const IDX_OWNER: &[u8] = b"owner/";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,

    /// Per-land serialization for sub-entity updates
    land_locks: DashMap<Uuid, Arc<Mutex<()>>>,

    /// Per-user serialization for notification appends
    user_locks: DashMap<Uuid, Arc<Mutex<()>>>,

    /// Serializes uniqueness checks during user creation
    user_create_lock: Mutex<()>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

/// Result of an atomic ownership transfer
#[derive(Debug, Clone)]
pub struct OwnershipTransfer {
    /// Land after the transfer (owner reassigned, not for sale)
    pub land: Land,

    /// Owner before the transfer
    pub previous_owner: Uuid,

    /// New owner (the request's buyer)
    pub buyer: Uuid,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_USERS, Self::cf_options_records()),
            ColumnFamilyDescriptor::new(CF_LANDS, Self::cf_options_records()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened record store at {:?}", path);

        Ok(Self {
            db: Arc::new(db),
            land_locks: DashMap::new(),
            user_locks: DashMap::new(),
            user_create_lock: Mutex::new(()),
        })
    }

    fn cf_options_records() -> Options {
        let mut opts = Options::default();
        // Records are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    fn land_lock(&self, land_id: Uuid) -> Arc<Mutex<()>> {
        self.land_locks
            .entry(land_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // User operations

    /// Create user, enforcing email and wallet uniqueness
    pub fn create_user(&self, user: User) -> Result<User> {
        let cf_users = self.cf_handle(CF_USERS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let _guard = self.user_create_lock.lock();

        let email_key = Self::index_key(IDX_EMAIL, user.email.as_bytes());
        if self.db.get_cf(cf_indices, &email_key)?.is_some() {
            return Err(Error::DuplicateEmail(user.email));
        }

        let wallet_key = Self::index_key(IDX_WALLET, user.wallet.as_str().as_bytes());
        if self.db.get_cf(cf_indices, &wallet_key)?.is_some() {
            return Err(Error::DuplicateWallet(user.wallet.to_string()));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_users, user.id.as_bytes(), bincode::serialize(&user)?);
        batch.put_cf(cf_indices, &email_key, user.id.as_bytes());
        batch.put_cf(cf_indices, &wallet_key, user.id.as_bytes());
        self.db.write(batch)?;

        tracing::debug!(user_id = %user.id, "User created");

        Ok(user)
    }

    /// Get user by ID
    pub fn get_user(&self, user_id: Uuid) -> Result<User> {
        let cf = self.cf_handle(CF_USERS)?;

        let value = self
            .db
            .get_cf(cf, user_id.as_bytes())?
            .ok_or(Error::UserNotFound(user_id))?;

        let user: User = bincode::deserialize(&value)?;
        Ok(user)
    }

    // Land operations

    /// Create land record with owner index
    pub fn create_land(&self, land: &Land) -> Result<()> {
        let cf_lands = self.cf_handle(CF_LANDS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_lands, land.id.as_bytes(), bincode::serialize(land)?);
        batch.put_cf(
            cf_indices,
            Self::index_key_owner_land(land.owner, land.id),
            [],
        );
        self.db.write(batch)?;

        tracing::debug!(land_id = %land.id, owner = %land.owner, "Land created");

        Ok(())
    }

    /// Get land by ID
    pub fn get_land(&self, land_id: Uuid) -> Result<Land> {
        let cf = self.cf_handle(CF_LANDS)?;

        let value = self
            .db
            .get_cf(cf, land_id.as_bytes())?
            .ok_or(Error::LandNotFound(land_id))?;

        let land: Land = bincode::deserialize(&value)?;
        Ok(land)
    }

    /// All land records
    pub fn list_lands(&self) -> Result<Vec<Land>> {
        let cf = self.cf_handle(CF_LANDS)?;

        let mut lands = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            lands.push(bincode::deserialize(&value)?);
        }

        Ok(lands)
    }

    /// All lands currently flagged for sale
    pub fn lands_for_sale(&self) -> Result<Vec<Land>> {
        let mut lands = self.list_lands()?;
        lands.retain(|land| land.is_for_sale);
        Ok(lands)
    }

    /// Lands owned by a user (via owner index)
    pub fn lands_by_owner(&self, owner: Uuid) -> Result<Vec<Land>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let prefix = Self::index_key(IDX_OWNER, owner.as_bytes());

        let mut lands = Vec::new();
        for item in self.db.prefix_iterator_cf(cf_indices, &prefix) {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }

            // Land ID is the last 16 bytes of the index key
            if key.len() >= prefix.len() + 16 {
                let land_id = Uuid::from_slice(&key[key.len() - 16..])
                    .map_err(|e| Error::Storage(format!("Malformed owner index key: {}", e)))?;
                lands.push(self.get_land(land_id)?);
            }
        }

        Ok(lands)
    }

    /// Overwrite the verification flag (reconciliation write)
    pub fn set_verified(&self, land_id: Uuid, verified: bool) -> Result<()> {
        let lock = self.land_lock(land_id);
        let _guard = lock.lock();

        let mut land = self.get_land(land_id)?;
        if land.is_verified == verified {
            return Ok(());
        }
        land.is_verified = verified;
        self.put_land_unlocked(&land)?;

        tracing::debug!(land_id = %land_id, verified, "Verification flag reconciled");

        Ok(())
    }

    // Atomic sub-entity primitives

    /// Append a new pending purchase request for a buyer
    ///
    /// The for-sale and no-duplicate-pending checks run inside the same
    /// critical section as the append, so two concurrent requests from
    /// one buyer cannot both land as `Pending`.
    pub fn append_purchase_request(&self, land_id: Uuid, buyer: Uuid) -> Result<PurchaseRequest> {
        let lock = self.land_lock(land_id);
        let _guard = lock.lock();

        let mut land = self.get_land(land_id)?;

        if !land.is_for_sale {
            return Err(Error::LandNotForSale(land_id));
        }
        if land.pending_request_for(buyer).is_some() {
            return Err(Error::DuplicatePending {
                land: land_id,
                buyer,
            });
        }

        let request = PurchaseRequest::new(buyer);
        land.purchase_requests.push(request.clone());
        self.put_land_unlocked(&land)?;

        tracing::debug!(
            land_id = %land_id,
            request_id = %request.id,
            buyer = %buyer,
            "Purchase request appended"
        );

        Ok(request)
    }

    /// Compare-and-swap on an embedded request's status
    ///
    /// Succeeds only if the stored status still equals `expected`; the
    /// loser of a race observes `StatusConflict` with the actual value.
    /// Returns the updated land.
    pub fn update_request_status(
        &self,
        land_id: Uuid,
        request_id: Uuid,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<Land> {
        let lock = self.land_lock(land_id);
        let _guard = lock.lock();

        let mut land = self.get_land(land_id)?;

        let request = land
            .purchase_requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or(Error::RequestNotFound(request_id))?;

        if request.status != expected {
            return Err(Error::StatusConflict {
                expected,
                actual: request.status,
            });
        }

        request.status = next;
        self.put_land_unlocked(&land)?;

        tracing::debug!(
            land_id = %land_id,
            request_id = %request_id,
            from = %expected,
            to = %next,
            "Request status updated"
        );

        Ok(land)
    }

    /// Atomic ownership transfer for an approved request
    ///
    /// In one write batch: guard (status == Approved), reassign owner,
    /// clear the for-sale flag, mark the request completed, and fix up
    /// the owner index. The previous owner is captured inside the
    /// critical section.
    pub fn transfer_ownership(&self, land_id: Uuid, request_id: Uuid) -> Result<OwnershipTransfer> {
        let cf_lands = self.cf_handle(CF_LANDS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let lock = self.land_lock(land_id);
        let _guard = lock.lock();

        let mut land = self.get_land(land_id)?;

        let request = land
            .purchase_requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or(Error::RequestNotFound(request_id))?;

        if request.status != RequestStatus::Approved {
            return Err(Error::StatusConflict {
                expected: RequestStatus::Approved,
                actual: request.status,
            });
        }

        let buyer = request.buyer;
        let previous_owner = land.owner;

        request.status = RequestStatus::Completed;
        land.owner = buyer;
        land.is_for_sale = false;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_lands, land.id.as_bytes(), bincode::serialize(&land)?);
        batch.delete_cf(
            cf_indices,
            Self::index_key_owner_land(previous_owner, land.id),
        );
        batch.put_cf(cf_indices, Self::index_key_owner_land(buyer, land.id), []);
        self.db.write(batch)?;

        tracing::info!(
            land_id = %land_id,
            request_id = %request_id,
            previous_owner = %previous_owner,
            buyer = %buyer,
            "Ownership transferred"
        );

        Ok(OwnershipTransfer {
            land,
            previous_owner,
            buyer,
        })
    }

    // Notification operations

    /// Append a notification to a user's feed (insertion-ordered)
    pub fn append_notification(&self, user_id: Uuid, notification: Notification) -> Result<()> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock();

        let mut user = self.get_user(user_id)?;
        user.notifications.push(notification);
        self.put_user_unlocked(&user)?;

        Ok(())
    }

    /// Mark a notification as read (idempotent)
    pub fn mark_notification_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock();

        let mut user = self.get_user(user_id)?;
        let notification = user
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or(Error::NotificationNotFound(notification_id))?;

        if notification.is_read {
            return Ok(());
        }
        notification.is_read = true;
        self.put_user_unlocked(&user)?;

        Ok(())
    }

    // Unlocked writers; callers hold the relevant entity lock

    fn put_land_unlocked(&self, land: &Land) -> Result<()> {
        let cf = self.cf_handle(CF_LANDS)?;
        self.db
            .put_cf(cf, land.id.as_bytes(), bincode::serialize(land)?)?;
        Ok(())
    }

    fn put_user_unlocked(&self, user: &User) -> Result<()> {
        let cf = self.cf_handle(CF_USERS)?;
        self.db
            .put_cf(cf, user.id.as_bytes(), bincode::serialize(user)?)?;
        Ok(())
    }

    // Index key helpers

    fn index_key(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
        let mut key = prefix.to_vec();
        key.extend_from_slice(suffix);
        key
    }

    fn index_key_owner_land(owner: Uuid, land_id: Uuid) -> Vec<u8> {
        let mut key = IDX_OWNER.to_vec();
        key.extend_from_slice(owner.as_bytes());
        key.extend_from_slice(land_id.as_bytes());
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LedgerId, NotificationKind, Role, WalletRef};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn test_store() -> (Arc<Storage>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Arc::new(Storage::open(&config).unwrap()), temp_dir)
    }

    fn test_user(email: &str, wallet: &str) -> User {
        User::new("Tester", email, WalletRef::new(wallet), Role::Seller)
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

    #[test]
    fn test_create_and_get_user() {
        let (store, _temp) = test_store();

        let user = store.create_user(test_user("a@b.c", "0xabc")).unwrap();
        let retrieved = store.get_user(user.id).unwrap();
        assert_eq!(retrieved.email, "a@b.c");
        assert_eq!(retrieved.wallet.as_str(), "0xabc");
    }

    #[test]
    fn test_user_uniqueness() {
        let (store, _temp) = test_store();

        store.create_user(test_user("a@b.c", "0xabc")).unwrap();

        let err = store.create_user(test_user("a@b.c", "0xdef")).unwrap_err();
        assert!(matches!(err, Error::DuplicateEmail(_)));

        let err = store.create_user(test_user("x@y.z", "0xabc")).unwrap_err();
        assert!(matches!(err, Error::DuplicateWallet(_)));
    }

    #[test]
    fn test_land_crud_and_owner_index() {
        let (store, _temp) = test_store();

        let owner = Uuid::new_v4();
        let land = test_land(owner);
        store.create_land(&land).unwrap();

        let retrieved = store.get_land(land.id).unwrap();
        assert_eq!(retrieved.title, "Plot 7");

        let owned = store.lands_by_owner(owner).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, land.id);

        assert!(store.lands_by_owner(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn test_append_request_and_duplicate_pending() {
        let (store, _temp) = test_store();

        let land = test_land(Uuid::new_v4());
        store.create_land(&land).unwrap();
        let buyer = Uuid::new_v4();

        let request = store.append_purchase_request(land.id, buyer).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        let err = store.append_purchase_request(land.id, buyer).unwrap_err();
        assert!(matches!(err, Error::DuplicatePending { .. }));

        // A different buyer may still request
        store
            .append_purchase_request(land.id, Uuid::new_v4())
            .unwrap();
    }

    #[test]
    fn test_append_request_not_for_sale() {
        let (store, _temp) = test_store();

        let mut land = test_land(Uuid::new_v4());
        land.is_for_sale = false;
        store.create_land(&land).unwrap();

        let err = store
            .append_purchase_request(land.id, Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, Error::LandNotForSale(_)));
    }

    #[test]
    fn test_status_cas_guard() {
        let (store, _temp) = test_store();

        let land = test_land(Uuid::new_v4());
        store.create_land(&land).unwrap();
        let request = store
            .append_purchase_request(land.id, Uuid::new_v4())
            .unwrap();

        // Pending -> Approved succeeds
        let updated = store
            .update_request_status(
                land.id,
                request.id,
                RequestStatus::Pending,
                RequestStatus::Approved,
            )
            .unwrap();
        assert_eq!(
            updated.request(request.id).unwrap().status,
            RequestStatus::Approved
        );

        // Second Pending-guarded transition loses
        let err = store
            .update_request_status(
                land.id,
                request.id,
                RequestStatus::Pending,
                RequestStatus::Rejected,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::StatusConflict {
                actual: RequestStatus::Approved,
                ..
            }
        ));
    }

    #[test]
    fn test_concurrent_cas_single_winner() {
        let (store, _temp) = test_store();

        let land = test_land(Uuid::new_v4());
        store.create_land(&land).unwrap();
        let request = store
            .append_purchase_request(land.id, Uuid::new_v4())
            .unwrap();

        let approve = {
            let store = store.clone();
            let (land_id, request_id) = (land.id, request.id);
            std::thread::spawn(move || {
                store.update_request_status(
                    land_id,
                    request_id,
                    RequestStatus::Pending,
                    RequestStatus::Approved,
                )
            })
        };
        let reject = {
            let store = store.clone();
            let (land_id, request_id) = (land.id, request.id);
            std::thread::spawn(move || {
                store.update_request_status(
                    land_id,
                    request_id,
                    RequestStatus::Pending,
                    RequestStatus::Rejected,
                )
            })
        };

        let results = [approve.join().unwrap(), reject.join().unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::StatusConflict { .. }))));
    }

    #[test]
    fn test_transfer_ownership() {
        let (store, _temp) = test_store();

        let seller = Uuid::new_v4();
        let land = test_land(seller);
        store.create_land(&land).unwrap();
        let buyer = Uuid::new_v4();

        let request = store.append_purchase_request(land.id, buyer).unwrap();

        // Not approved yet
        let err = store.transfer_ownership(land.id, request.id).unwrap_err();
        assert!(matches!(err, Error::StatusConflict { .. }));

        store
            .update_request_status(
                land.id,
                request.id,
                RequestStatus::Pending,
                RequestStatus::Approved,
            )
            .unwrap();

        let transfer = store.transfer_ownership(land.id, request.id).unwrap();
        assert_eq!(transfer.previous_owner, seller);
        assert_eq!(transfer.buyer, buyer);
        assert_eq!(transfer.land.owner, buyer);
        assert!(!transfer.land.is_for_sale);
        assert_eq!(
            transfer.land.request(request.id).unwrap().status,
            RequestStatus::Completed
        );

        // Owner index follows the transfer
        assert!(store.lands_by_owner(seller).unwrap().is_empty());
        assert_eq!(store.lands_by_owner(buyer).unwrap().len(), 1);
    }

    #[test]
    fn test_notifications_order_and_idempotent_read() {
        let (store, _temp) = test_store();

        let user = store.create_user(test_user("n@b.c", "0xn")).unwrap();
        let land_id = Uuid::new_v4();

        for i in 0..3 {
            store
                .append_notification(
                    user.id,
                    Notification::new(
                        NotificationKind::PurchaseRequested,
                        format!("message {}", i),
                        land_id,
                    ),
                )
                .unwrap();
        }

        let feed = store.get_user(user.id).unwrap().notifications;
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].message, "message 0");
        assert_eq!(feed[2].message, "message 2");

        let target = feed[1].id;
        store.mark_notification_read(user.id, target).unwrap();
        store.mark_notification_read(user.id, target).unwrap();

        let feed = store.get_user(user.id).unwrap().notifications;
        assert!(feed[1].is_read);
        assert!(!feed[0].is_read);

        let err = store
            .mark_notification_read(user.id, Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, Error::NotificationNotFound(_)));
    }

    #[test]
    fn test_set_verified_idempotent() {
        let (store, _temp) = test_store();

        let land = test_land(Uuid::new_v4());
        store.create_land(&land).unwrap();

        store.set_verified(land.id, false).unwrap();
        assert!(!store.get_land(land.id).unwrap().is_verified);

        store.set_verified(land.id, false).unwrap();
        assert!(!store.get_land(land.id).unwrap().is_verified);

        store.set_verified(land.id, true).unwrap();
        assert!(store.get_land(land.id).unwrap().is_verified);
    }

    #[test]
    fn test_lands_for_sale_filter() {
        let (store, _temp) = test_store();

        let mut for_sale = test_land(Uuid::new_v4());
        for_sale.title = "for sale".to_string();
        store.create_land(&for_sale).unwrap();

        let mut sold = test_land(Uuid::new_v4());
        sold.is_for_sale = false;
        store.create_land(&sold).unwrap();

        let listed = store.lands_for_sale().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "for sale");

        assert_eq!(store.list_lands().unwrap().len(), 2);
    }
}
