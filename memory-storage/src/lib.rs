//! Embedded, local-first storage backend for the memory engine, built on
//! `redb` (SPEC_FULL §0, §4.1). A single database file holds the event log,
//! semantic/procedural/prospective stores, and the knowledge graph; every
//! read/search operation that needs to rank or scan a whole table does so
//! in a blocking task, matching `memory-core`'s own note that the BM25 index
//! is rebuilt rather than maintained incrementally — this engine targets a
//! single user on a single node, not multi-tenant scale.
//!
//! ```no_run
//! use memory_storage::RedbStorage;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let storage = RedbStorage::open(Path::new("./memory.redb")).await?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use memory_core::{Error, Result};
use redb::Database;
use tracing::info;

mod backend;
mod codec;
mod cursors;
mod events;
mod graph;
mod memories;
mod procedures;
mod prospective;
mod tables;

use tables::{
    CURSORS_TABLE, ENTITIES_TABLE, ENTITY_NAME_INDEX, EVENTS_TABLE, EVENT_HASH_INDEX, GOALS_TABLE,
    MEMORIES_TABLE, OBSERVATIONS_TABLE, PROCEDURES_TABLE, PROCEDURE_EXECUTIONS_TABLE,
    PROCEDURE_NAME_INDEX, RELATIONS_TABLE, TASKS_TABLE,
};

/// The redb-backed [`memory_core::storage::StorageBackend`] implementation.
pub struct RedbStorage {
    pub(crate) db: Arc<Database>,
}

impl RedbStorage {
    /// Open (creating if absent) the database file at `path` and ensure all
    /// tables exist.
    pub async fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening redb store");
        let path_buf = path.to_path_buf();
        let db = codec::blocking(move || {
            Database::create(&path_buf).map_err(|e| Error::Storage(format!("failed to open database: {e}")))
        })
        .await?;

        let db = Arc::new(db);
        let init_db = Arc::clone(&db);
        codec::blocking(move || {
            let txn = init_db
                .begin_write()
                .map_err(|e| Error::Storage(format!("failed to begin init transaction: {e}")))?;
            {
                txn.open_table(EVENTS_TABLE).map_err(storage_err)?;
                txn.open_table(EVENT_HASH_INDEX).map_err(storage_err)?;
                txn.open_table(MEMORIES_TABLE).map_err(storage_err)?;
                txn.open_table(PROCEDURES_TABLE).map_err(storage_err)?;
                txn.open_table(PROCEDURE_NAME_INDEX).map_err(storage_err)?;
                txn.open_table(PROCEDURE_EXECUTIONS_TABLE).map_err(storage_err)?;
                txn.open_table(TASKS_TABLE).map_err(storage_err)?;
                txn.open_table(GOALS_TABLE).map_err(storage_err)?;
                txn.open_table(ENTITIES_TABLE).map_err(storage_err)?;
                txn.open_table(ENTITY_NAME_INDEX).map_err(storage_err)?;
                txn.open_table(RELATIONS_TABLE).map_err(storage_err)?;
                txn.open_table(OBSERVATIONS_TABLE).map_err(storage_err)?;
                txn.open_table(CURSORS_TABLE).map_err(storage_err)?;
            }
            txn.commit()
                .map_err(|e| Error::Storage(format!("failed to commit init transaction: {e}")))?;
            Ok(())
        })
        .await?;

        Ok(Self { db })
    }

    /// Open a database backed by a fresh temp file; used by this crate's own
    /// tests and by `test-utils` fixtures.
    #[cfg(test)]
    async fn open_temp() -> Result<(Self, tempfile::TempDir)> {
        let dir = tempfile::tempdir().map_err(|e| Error::Storage(format!("tempdir: {e}")))?;
        let path = dir.path().join("memory.redb");
        let storage = Self::open(&path).await?;
        Ok((storage, dir))
    }
}

pub(crate) fn storage_err(e: redb::TableError) -> Error {
    Error::Storage(format!("failed to open table: {e}"))
}
