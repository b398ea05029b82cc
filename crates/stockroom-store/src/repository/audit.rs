//! # Audit Log
//!
//! Append-only record of every registration and login attempt.
//! Prior rows are never rewritten; the header is written once, when the
//! file is first created.

use chrono::Utc;
use tracing::debug;

use stockroom_core::{AuditAction, AuditEntry};

use crate::error::StoreResult;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct AuditLog {
    store: Store,
}

impl AuditLog {
    pub fn new(store: Store) -> Self {
        AuditLog { store }
    }

    /// Appends one entry stamped with the current time.
    pub async fn record(
        &self,
        username: &str,
        action: AuditAction,
        success: bool,
    ) -> StoreResult<AuditEntry> {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            username: username.to_string(),
            action,
            success,
        };

        let tx = self.store.begin().await;
        tx.append(std::slice::from_ref(&entry)).await?;

        debug!(username = %username, action = %action, success, "Audit entry appended");
        Ok(entry)
    }

    /// Reads the whole log back, oldest first.
    pub async fn entries(&self) -> StoreResult<Vec<AuditEntry>> {
        let tx = self.store.begin().await;
        tx.load().await
    }
}
