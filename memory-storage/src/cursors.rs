//! Opaque ingestion cursors for out-of-core external sources (spec §3 `Cursor`).

use redb::ReadableTable;

use memory_core::types::Cursor;
use memory_core::{Error, Result};

use crate::codec::{blocking, decode, encode};
use crate::tables::CURSORS_TABLE;
use crate::RedbStorage;

impl RedbStorage {
    pub(crate) async fn get_cursor_impl(&self, source_id: &str) -> Result<Option<Cursor>> {
        let source_id = source_id.to_string();
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(CURSORS_TABLE).map_err(crate::storage_err)?;
            match table.get(source_id.as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                Some(bytes) => Ok(Some(decode(bytes.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub(crate) async fn put_cursor_impl(&self, cursor: Cursor) -> Result<()> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(CURSORS_TABLE).map_err(crate::storage_err)?;
                let bytes = encode(&cursor)?;
                table
                    .insert(cursor.source_id.as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        let cursor = Cursor {
            source_id: "github-issues".to_string(),
            cursor_data: serde_json::json!({"page": 3}),
            updated_at: chrono::Utc::now(),
        };
        storage.put_cursor_impl(cursor).await.unwrap();
        let fetched = storage.get_cursor_impl("github-issues").await.unwrap().unwrap();
        assert_eq!(fetched.cursor_data["page"], 3);
    }

    #[tokio::test]
    async fn missing_cursor_is_none() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        assert!(storage.get_cursor_impl("unseen").await.unwrap().is_none());
    }
}
