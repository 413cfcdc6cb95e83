//! Notification emitter
//!
//! Pure side-effect layer over the record store's per-user feeds.
//! Workflow and registry call [`Notifier::emit_best_effort`] after the
//! store commit: a failed append is logged and never fails the primary
//! operation.

use crate::Result;
use record_store::{Notification, NotificationKind, Storage};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Notification emitter
#[derive(Debug, Clone)]
pub struct Notifier {
    store: Arc<Storage>,
}

impl Notifier {
    /// Create emitter over a store
    pub fn new(store: Arc<Storage>) -> Self {
        Self { store }
    }

    /// Append a notification to a user's feed
    pub fn emit(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
        land_id: Uuid,
    ) -> Result<()> {
        self.store
            .append_notification(user_id, Notification::new(kind, message, land_id))?;
        Ok(())
    }

    /// Append a notification, absorbing any failure into a log entry
    pub fn emit_best_effort(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
        land_id: Uuid,
    ) {
        if let Err(e) = self.emit(user_id, kind, message, land_id) {
            warn!(user_id = %user_id, error = %e, "Failed to append notification");
        }
    }

    /// Full feed for a user, newest first
    pub fn for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let mut feed = self.store.get_user(user_id)?.notifications;
        feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(feed)
    }

    /// Count of unread notifications
    pub fn unread_count(&self, user_id: Uuid) -> Result<usize> {
        let user = self.store.get_user(user_id)?;
        Ok(user.notifications.iter().filter(|n| !n.is_read).count())
    }

    /// Mark one notification as read (idempotent)
    pub fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
        self.store.mark_notification_read(user_id, notification_id)?;
        Ok(())
    }
}
