//! # Store Handle
//!
//! Opens the data directory and serializes every load-mutate-save cycle.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Store (cheap to clone)                         │
//! │                                                                         │
//! │  Store::open(config).await                                             │
//! │       │  create data_dir, run journal recovery                         │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────┐                         │
//! │  │ Arc<Inner>                                │                         │
//! │  │   data_dir                                │                         │
//! │  │   writer: tokio::sync::Mutex<()>  ◄───────┼── one holder at a time  │
//! │  │   breach: Option<Arc<dyn BreachCheck>>    │                         │
//! │  └───────────────────────────────────────────┘                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store.begin().await  →  Transaction (holds the lock guard)            │
//! │       tx.load::<Product>()      read a table                           │
//! │       tx.stage(&products)       queue a full snapshot                  │
//! │       tx.commit()               journaled write of every staged table  │
//! │  drop(tx) without commit        nothing written, lock released         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two requests that both read stock before either writes would oversell;
//! holding the lock across the whole cycle rules that out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::breach::{BreachCheck, PwnedRangeClient};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::journal::{self, StagedWrite};
use crate::repository::{
    AuditLog, CatalogRepository, CredentialRepository, OrderRepository, StatsRepository,
};
use crate::tables::{self, Record};

// =============================================================================
// Store
// =============================================================================

/// Handle to one data directory.
///
/// ## Usage
/// ```rust,ignore
/// let store = Store::open(StoreConfig::load_or_default(None)).await?;
///
/// let product = store.catalog().add(NewProduct::new("Pen", price, 10)).await?;
/// let order = store.orders().place("ana", &cart).await?;
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    config: StoreConfig,
    writer: Mutex<()>,
    breach: Option<Arc<dyn BreachCheck>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("data_dir", &self.inner.config.data_dir())
            .field("breach_check", &self.inner.breach.is_some())
            .finish()
    }
}

impl Store {
    /// Opens the data directory with the breach client the config asks for.
    ///
    /// ## What This Does
    /// 1. Creates the data directory if it doesn't exist
    /// 2. Completes or discards an interrupted commit
    /// 3. Builds the breach-check client (if enabled)
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        let breach: Option<Arc<dyn BreachCheck>> = if config.security.breach_check {
            match PwnedRangeClient::new(
                config.security.breach_check_url.clone(),
                config.breach_timeout(),
            ) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    warn!(error = %e, "Breach check client unavailable, continuing without it");
                    None
                }
            }
        } else {
            None
        };

        Self::open_with(config, breach).await
    }

    /// Opens the data directory with an explicit breach checker (or none).
    pub async fn open_with(
        config: StoreConfig,
        breach: Option<Arc<dyn BreachCheck>>,
    ) -> StoreResult<Self> {
        config.validate()?;
        let dir = config.data_dir().to_path_buf();

        info!(path = %dir.display(), "Opening store");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(StoreError::io(&dir))?;

        let recovery = journal::recover(&dir).await?;
        info!(?recovery, "Store ready");

        Ok(Store {
            inner: Arc::new(Inner {
                config,
                writer: Mutex::new(()),
                breach,
            }),
        })
    }

    /// Acquires the writer lock. Waits while another cycle is in progress.
    pub async fn begin(&self) -> Transaction<'_> {
        let guard = self.inner.writer.lock().await;
        Transaction {
            dir: self.inner.config.data_dir(),
            _guard: guard,
            staged: Vec::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn data_dir(&self) -> &Path {
        self.inner.config.data_dir()
    }

    pub(crate) fn breach_check(&self) -> Option<&dyn BreachCheck> {
        self.inner.breach.as_deref()
    }

    // =========================================================================
    // Repositories
    // =========================================================================

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.clone())
    }

    pub fn credentials(&self) -> CredentialRepository {
        CredentialRepository::new(self.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.clone())
    }

    pub fn stats(&self) -> StatsRepository {
        StatsRepository::new(self.clone())
    }

    pub fn audit(&self) -> AuditLog {
        AuditLog::new(self.clone())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Exclusive access to the tables for one load-mutate-save cycle.
///
/// Staged snapshots are written only by [`Transaction::commit`].
pub struct Transaction<'a> {
    dir: &'a Path,
    _guard: MutexGuard<'a, ()>,
    staged: Vec<StagedWrite>,
}

impl Transaction<'_> {
    /// Reads the committed state of a table.
    pub async fn load<R: Record>(&self) -> StoreResult<Vec<R>> {
        tables::read_table(self.dir).await
    }

    /// Queues a full snapshot of a table. Staging the same table twice keeps
    /// the later snapshot.
    pub fn stage<R: Record>(&mut self, rows: &[R]) -> StoreResult<()> {
        let bytes = tables::encode(rows)?;
        self.staged.retain(|w| w.file != R::FILE);
        self.staged.push(StagedWrite {
            file: R::FILE,
            bytes,
        });
        Ok(())
    }

    /// Appends rows to an append-only table, writing the header first if the
    /// file is new or empty. Not journaled: appends never rewrite old rows.
    pub async fn append<R: Record>(&self, rows: &[R]) -> StoreResult<()> {
        let path: PathBuf = self.dir.join(R::FILE);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(StoreError::io(&path))?;

        let len = file
            .metadata()
            .await
            .map_err(StoreError::io(&path))?
            .len();
        let bytes = if len == 0 {
            tables::encode(rows)?
        } else {
            tables::encode_rows(rows)?
        };

        file.write_all(&bytes).await.map_err(StoreError::io(&path))?;
        file.flush().await.map_err(StoreError::io(&path))?;
        Ok(())
    }

    /// Writes every staged snapshot in one journaled commit and releases the lock.
    pub async fn commit(self) -> StoreResult<()> {
        journal::commit(self.dir, &self.staged).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
