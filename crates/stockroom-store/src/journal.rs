//! # Commit Journal
//!
//! Makes a multi-table write all-or-nothing across crashes.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    commit([products, orders, order_lines])              │
//! │                                                                         │
//! │  1. write + fsync  products.csv.staged                                 │
//! │                    orders.csv.staged                                   │
//! │                    order_lines.csv.staged                              │
//! │                                                                         │
//! │  2. write + fsync  commit.journal.tmp                                  │
//! │                    ("products.csv\norders.csv\n...\nend\n")            │
//! │                                                                         │
//! │  3. rename         commit.journal.tmp → commit.journal                 │
//! │                    ───────────── COMMIT POINT ─────────────            │
//! │                                                                         │
//! │  4. rename each    <table>.staged → <table>                            │
//! │                                                                         │
//! │  5. remove         commit.journal                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recovery (on open)
//! ```text
//! commit.journal.tmp exists?  → delete it (never reached the commit point)
//!
//! commit.journal exists?
//!   ├── yes, ends with "end" → finish step 4 for every listed table,
//!   │                          then step 5                    (roll forward)
//!   ├── yes, no "end" line   → torn journal: delete it and
//!   │                          every *.staged leftover        (roll back)
//!   └── no                   → delete any *.staged leftovers  (roll back)
//! ```
//!
//! A crash before the commit point loses the whole write; a crash after it
//! keeps the whole write. Readers never see a mix.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::tables::TABLE_FILES;

/// Name of the commit marker inside the data directory.
pub const JOURNAL_FILE: &str = "commit.journal";

/// The journal is written here first and renamed into place.
const JOURNAL_TMP_FILE: &str = "commit.journal.tmp";

/// Last line of a complete journal.
const END_MARKER: &str = "end";

const STAGED_SUFFIX: &str = ".staged";

/// One full table snapshot waiting to be committed.
#[derive(Debug, Clone)]
pub struct StagedWrite {
    pub file: &'static str,
    pub bytes: Vec<u8>,
}

/// What [`recover`] found on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// No interrupted commit.
    Clean,
    /// An interrupted commit was completed for these tables.
    RolledForward(Vec<String>),
    /// Staged files from a commit that never reached its commit point were removed.
    RolledBack(usize),
}

fn staged_path(dir: &Path, file: &str) -> PathBuf {
    dir.join(format!("{file}{STAGED_SUFFIX}"))
}

async fn write_synced(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(StoreError::io(path))?;
    file.write_all(bytes).await.map_err(StoreError::io(path))?;
    file.sync_all().await.map_err(StoreError::io(path))?;
    Ok(())
}

/// Writes every staged table atomically with respect to crashes.
pub async fn commit(dir: &Path, writes: &[StagedWrite]) -> StoreResult<()> {
    if writes.is_empty() {
        return Ok(());
    }

    for write in writes {
        write_synced(&staged_path(dir, write.file), &write.bytes).await?;
    }

    let files: Vec<&str> = writes.iter().map(|w| w.file).collect();
    let journal = dir.join(JOURNAL_FILE);
    let journal_tmp = dir.join(JOURNAL_TMP_FILE);

    let mut contents = files.join("\n");
    contents.push('\n');
    contents.push_str(END_MARKER);
    contents.push('\n');
    write_synced(&journal_tmp, contents.as_bytes()).await?;

    tokio::fs::rename(&journal_tmp, &journal)
        .await
        .map_err(StoreError::io(&journal_tmp))?;
    sync_dir(dir).await?;

    roll_forward(dir, &files).await?;

    tokio::fs::remove_file(&journal)
        .await
        .map_err(StoreError::io(&journal))?;

    debug!(tables = ?files, "Commit complete");
    Ok(())
}

/// Flushes directory entries so the journal rename survives a power cut.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> StoreResult<()> {
    let handle = tokio::fs::File::open(dir)
        .await
        .map_err(StoreError::io(dir))?;
    handle.sync_all().await.map_err(StoreError::io(dir))
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> StoreResult<()> {
    Ok(())
}

/// Renames staged files over their tables. Already-renamed tables are skipped.
async fn roll_forward(dir: &Path, files: &[&str]) -> StoreResult<()> {
    for file in files {
        let staged = staged_path(dir, file);
        let exists = tokio::fs::try_exists(&staged)
            .await
            .map_err(StoreError::io(&staged))?;
        if exists {
            tokio::fs::rename(&staged, dir.join(file))
                .await
                .map_err(StoreError::io(&staged))?;
        }
    }
    Ok(())
}

/// Completes or discards an interrupted commit.
pub async fn recover(dir: &Path) -> StoreResult<Recovery> {
    let journal_tmp = dir.join(JOURNAL_TMP_FILE);
    if remove_if_present(&journal_tmp).await? {
        warn!("Discarded journal that never reached the commit point");
    }

    let journal = dir.join(JOURNAL_FILE);

    match tokio::fs::read_to_string(&journal).await {
        Ok(contents) => {
            let mut files: Vec<&str> = contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();

            if files.pop() != Some(END_MARKER) {
                warn!(path = %journal.display(), "Found torn commit journal, rolling back");
                tokio::fs::remove_file(&journal)
                    .await
                    .map_err(StoreError::io(&journal))?;
                let removed = remove_staged_leftovers(dir).await?;
                return Ok(Recovery::RolledBack(removed));
            }

            if let Some(unknown) = files.iter().find(|f| !TABLE_FILES.contains(*f)) {
                return Err(StoreError::Journal(format!("unknown table {unknown:?}")));
            }

            warn!(tables = ?files, "Found interrupted commit, rolling forward");
            roll_forward(dir, &files).await?;
            tokio::fs::remove_file(&journal)
                .await
                .map_err(StoreError::io(&journal))?;

            info!("Interrupted commit completed");
            Ok(Recovery::RolledForward(
                files.into_iter().map(str::to_string).collect(),
            ))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let removed = remove_staged_leftovers(dir).await?;
            if removed > 0 {
                warn!(removed, "Discarded staged files from an uncommitted write");
                Ok(Recovery::RolledBack(removed))
            } else {
                Ok(Recovery::Clean)
            }
        }
        Err(e) => Err(StoreError::io(&journal)(e)),
    }
}

/// Removes `path`, returning whether it existed.
async fn remove_if_present(path: &Path) -> StoreResult<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(path)(e)),
    }
}

async fn remove_staged_leftovers(dir: &Path) -> StoreResult<usize> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(StoreError::io(dir))?;
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await.map_err(StoreError::io(dir))? {
        let path = entry.path();
        let is_staged = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(STAGED_SUFFIX));
        if is_staged {
            tokio::fs::remove_file(&path)
                .await
                .map_err(StoreError::io(&path))?;
            removed += 1;
        }
    }

    Ok(removed)
}
