//! # Credential Repository
//!
//! Registration and login over `users.csv`, audited in `audit.csv`.
//!
//! ## Registration Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register("ana", "Abcdef12")                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [lock] load users → username shape, uniqueness, strength   [unlock]   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  breach check (bounded by timeout, no lock held)                       │
//! │       ├── Compromised(n) → CompromisedPassword { occurrences: n }      │
//! │       └── Inconclusive   → warn!, continue                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [lock] reload users → uniqueness again, salt, hash, commit [unlock]   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  audit (timestamp, "ana", register, success)   ◄── on every outcome    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The uniqueness check runs twice because another registration may commit
//! while the breach check is in flight.

use chrono::Utc;
use tracing::{debug, info, warn};

use stockroom_core::{credentials, AuditAction, CoreError, Role, User, UserSummary};

use crate::breach::{self, BreachVerdict};
use crate::error::StoreResult;
use crate::store::Store;

/// Repository for account operations.
///
/// ## Usage
/// ```rust,ignore
/// let users = store.credentials();
///
/// users.register("ana", "Abcdef12").await?;
/// let ana = users.login("ana", "Abcdef12").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CredentialRepository {
    store: Store,
}

impl CredentialRepository {
    pub fn new(store: Store) -> Self {
        CredentialRepository { store }
    }

    /// Creates a `user`-role account.
    ///
    /// ## Errors
    /// * `Validation` - malformed username
    /// * `DuplicateUser` - username taken
    /// * `WeakPassword` - every rule the password misses
    /// * `CompromisedPassword` - the breach check found it
    pub async fn register(&self, username: &str, password: &str) -> StoreResult<User> {
        let result = self.create(username, password, Role::User).await;
        self.audit(username, AuditAction::Register, result.is_ok()).await;
        result
    }

    /// Creates the first `admin`-role account. Fails with
    /// `AdminAlreadyExists` once any admin exists.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> StoreResult<User> {
        let result = self.create(username, password, Role::Admin).await;
        self.audit(username, AuditAction::Register, result.is_ok()).await;
        result
    }

    /// Verifies a password. The comparison runs in constant time.
    ///
    /// ## Errors
    /// * `UnknownUser` - no such username
    /// * `BadPassword` - hash mismatch
    pub async fn login(&self, username: &str, password: &str) -> StoreResult<User> {
        let result = self.verify(username, password).await;

        match &result {
            Ok(user) => info!(username = %user.username, role = %user.role, "Login succeeded"),
            Err(e) => info!(username = %username, error = %e, "Login failed"),
        }

        self.audit(username, AuditAction::Login, result.is_ok()).await;
        result
    }

    /// Every account without credential material.
    pub async fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let tx = self.store.begin().await;
        let users: Vec<User> = tx.load().await?;
        Ok(users.iter().map(UserSummary::from).collect())
    }

    /// Looks up one account by exact username.
    pub async fn find(&self, username: &str) -> StoreResult<Option<UserSummary>> {
        let tx = self.store.begin().await;
        let users: Vec<User> = tx.load().await?;
        Ok(users
            .iter()
            .find(|u| u.username == username)
            .map(UserSummary::from))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn verify(&self, username: &str, password: &str) -> StoreResult<User> {
        let tx = self.store.begin().await;
        let users: Vec<User> = tx.load().await?;
        let user = credentials::authenticate(&users, username, password)?;
        Ok(user.clone())
    }

    async fn create(&self, username: &str, password: &str, role: Role) -> StoreResult<User> {
        {
            let tx = self.store.begin().await;
            let users: Vec<User> = tx.load().await?;
            ensure_admin_slot(&users, role)?;
            credentials::check_registration(&users, username, password)?;
        }

        self.screen(username, password).await?;

        let mut tx = self.store.begin().await;
        let mut users: Vec<User> = tx.load().await?;
        ensure_admin_slot(&users, role)?;

        let user = credentials::create_account(&mut users, username, password, role, Utc::now())?;

        tx.stage(&users)?;
        tx.commit().await?;

        info!(id = user.id, username = %user.username, role = %user.role, "Account created");
        Ok(user)
    }

    async fn screen(&self, username: &str, password: &str) -> StoreResult<()> {
        let Some(checker) = self.store.breach_check() else {
            debug!(username = %username, "Breach check disabled");
            return Ok(());
        };

        let timeout = self.store.config().breach_timeout();
        match breach::screen(checker, password, timeout).await {
            BreachVerdict::Clean => {
                debug!(username = %username, "Password not found in breach corpus");
                Ok(())
            }
            BreachVerdict::Compromised(occurrences) => {
                warn!(username = %username, occurrences, "Rejected breached password");
                Err(CoreError::CompromisedPassword { occurrences }.into())
            }
            BreachVerdict::Inconclusive(reason) => {
                warn!(username = %username, reason = %reason, "Breach check inconclusive, proceeding");
                Ok(())
            }
        }
    }

    async fn audit(&self, username: &str, action: AuditAction, success: bool) {
        if let Err(e) = self.store.audit().record(username, action, success).await {
            warn!(username = %username, action = %action, error = %e, "Failed to append audit entry");
        }
    }
}

fn ensure_admin_slot(users: &[User], role: Role) -> Result<(), CoreError> {
    if role == Role::Admin && users.iter().any(|u| u.role == Role::Admin) {
        return Err(CoreError::AdminAlreadyExists);
    }
    Ok(())
}
