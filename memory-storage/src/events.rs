//! Event-log operations: append with hash-based dedup, range/session
//! queries, lifecycle transitions, and retention scanning (SPEC_FULL §4.1,
//! grounded in the teacher's `memory-storage-redb/src/episodes.rs`).

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use tracing::debug;
use uuid::Uuid;

use memory_core::storage::hash::compute_event_hash;
use memory_core::storage::EventFilter;
use memory_core::types::{Event, LifecycleStatus};
use memory_core::{Error, Result};

use crate::codec::{blocking, decode, encode};
use crate::tables::{EVENTS_TABLE, EVENT_HASH_INDEX};
use crate::RedbStorage;

impl RedbStorage {
    pub(crate) async fn append_event_impl(&self, mut event: Event) -> Result<(Uuid, bool)> {
        event.hash = compute_event_hash(
            &event.project_id,
            &event.session_id,
            event.event_type,
            &event.content,
            &event.context,
        );
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            let outcome = {
                let mut hash_index = txn.open_table(EVENT_HASH_INDEX).map_err(crate::storage_err)?;
                if let Some(existing) = hash_index.get(event.hash.as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                    let existing_id = existing
                        .value()
                        .parse::<Uuid>()
                        .map_err(|e| Error::Storage(format!("corrupt hash index entry: {e}")))?;
                    (existing_id, true)
                } else {
                    let id = event.id;
                    let id_str = id.to_string();
                    hash_index
                        .insert(event.hash.as_str(), id_str.as_str())
                        .map_err(|e| Error::Storage(e.to_string()))?;
                    drop(hash_index);
                    let mut events = txn.open_table(EVENTS_TABLE).map_err(crate::storage_err)?;
                    let bytes = encode(&event)?;
                    events
                        .insert(id_str.as_str(), bytes.as_slice())
                        .map_err(|e| Error::Storage(e.to_string()))?;
                    (id, false)
                }
            };
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(outcome)
        })
        .await
    }

    pub(crate) async fn get_event_impl(&self, project_id: &str, id: Uuid) -> Result<Option<Event>> {
        let project_id = project_id.to_string();
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(EVENTS_TABLE).map_err(crate::storage_err)?;
            match table.get(id.to_string().as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                Some(bytes) => {
                    let event: Event = decode(bytes.value())?;
                    Ok((event.project_id == project_id).then_some(event))
                }
                None => Ok(None),
            }
        })
        .await
    }

    pub(crate) async fn get_range_impl(
        &self,
        project_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        filter: &EventFilter,
    ) -> Result<Vec<Event>> {
        let project_id = project_id.to_string();
        let filter = filter.clone();
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(EVENTS_TABLE).map_err(crate::storage_err)?;
            let mut events = Vec::new();
            for row in table.iter().map_err(|e| Error::Storage(e.to_string()))? {
                let (_, bytes) = row.map_err(|e| Error::Storage(e.to_string()))?;
                let event: Event = decode(bytes.value())?;
                if event.project_id != project_id || event.timestamp < from || event.timestamp > to {
                    continue;
                }
                if let Some(session_id) = &filter.session_id {
                    if &event.session_id != session_id {
                        continue;
                    }
                }
                if let Some(status) = filter.lifecycle_status {
                    if event.lifecycle_status != status {
                        continue;
                    }
                }
                events.push(event);
            }
            events.sort_by_key(|e| e.timestamp);
            Ok(events)
        })
        .await
    }

    pub(crate) async fn get_by_session_impl(&self, project_id: &str, session_id: &str) -> Result<Vec<Event>> {
        let project_id = project_id.to_string();
        let session_id = session_id.to_string();
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(EVENTS_TABLE).map_err(crate::storage_err)?;
            let mut events = Vec::new();
            for row in table.iter().map_err(|e| Error::Storage(e.to_string()))? {
                let (_, bytes) = row.map_err(|e| Error::Storage(e.to_string()))?;
                let event: Event = decode(bytes.value())?;
                if event.project_id == project_id && event.session_id == session_id {
                    events.push(event);
                }
            }
            events.sort_by_key(|e| e.timestamp);
            Ok(events)
        })
        .await
    }

    pub(crate) async fn update_lifecycle_impl(
        &self,
        id: Uuid,
        status: LifecycleStatus,
        consolidation_score: f64,
    ) -> Result<()> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(EVENTS_TABLE).map_err(crate::storage_err)?;
                let id_str = id.to_string();
                let mut event: Event = match table.get(id_str.as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                    Some(bytes) => decode(bytes.value())?,
                    None => return Err(Error::not_found_id("event", id)),
                };
                event.lifecycle_status = status;
                event.consolidation_score = consolidation_score;
                let bytes = encode(&event)?;
                table
                    .insert(id_str.as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn increment_activation_impl(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(EVENTS_TABLE).map_err(crate::storage_err)?;
                let id_str = id.to_string();
                let mut event: Event = match table.get(id_str.as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                    Some(bytes) => decode(bytes.value())?,
                    None => return Err(Error::not_found_id("event", id)),
                };
                event.last_activation = at;
                event.activation_count += 1;
                let bytes = encode(&event)?;
                table
                    .insert(id_str.as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn archive_eligible_impl(
        &self,
        project_id: &str,
        retention_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let project_id = project_id.to_string();
        let db = self.db.clone();
        let cutoff = now - chrono::Duration::days(retention_days);
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(EVENTS_TABLE).map_err(crate::storage_err)?;
            let mut ids = Vec::new();
            for row in table.iter().map_err(|e| Error::Storage(e.to_string()))? {
                let (_, bytes) = row.map_err(|e| Error::Storage(e.to_string()))?;
                let event: Event = decode(bytes.value())?;
                if event.project_id == project_id
                    && event.lifecycle_status == LifecycleStatus::Consolidated
                    && event.last_activation < cutoff
                {
                    ids.push(event.id);
                }
            }
            debug!(count = ids.len(), "events eligible for archival");
            Ok(ids)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::types::{EventContext, EventType, Outcome};

    fn make_event(project: &str, session: &str, content: &str, now: DateTime<Utc>) -> Event {
        Event::new(project, session, EventType::Action, content, Outcome::Success, EventContext::default(), now)
    }

    #[tokio::test]
    async fn append_then_get_round_trips() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        let now = Utc::now();
        let event = make_event("p1", "s1", "ran tests", now);
        let (id, dedup) = storage.append_event_impl(event).await.unwrap();
        assert!(!dedup);
        let fetched = storage.get_event_impl("p1", id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "ran tests");
    }

    #[tokio::test]
    async fn identical_payload_deduplicates_to_original_id() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        let now = Utc::now();
        let (first_id, _) = storage.append_event_impl(make_event("p1", "s1", "ran tests", now)).await.unwrap();
        let (second_id, dedup) = storage.append_event_impl(make_event("p1", "s1", "ran tests", now)).await.unwrap();
        assert!(dedup);
        assert_eq!(first_id, second_id);
    }

    #[tokio::test]
    async fn get_range_filters_by_project_and_window() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        let now = Utc::now();
        storage.append_event_impl(make_event("p1", "s1", "in window", now)).await.unwrap();
        storage.append_event_impl(make_event("p2", "s1", "other project", now)).await.unwrap();
        let events = storage
            .get_range_impl("p1", now - chrono::Duration::hours(1), now + chrono::Duration::hours(1), &EventFilter::default())
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].content, "in window");
    }

    #[tokio::test]
    async fn archive_eligible_requires_consolidated_and_stale() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        let now = Utc::now();
        let (id, _) = storage.append_event_impl(make_event("p1", "s1", "old", now - chrono::Duration::days(40))).await.unwrap();
        storage.update_lifecycle_impl(id, LifecycleStatus::Consolidated, 0.9).await.unwrap();
        storage.increment_activation_impl(id, now - chrono::Duration::days(40)).await.unwrap();
        let eligible = storage.archive_eligible_impl("p1", 30, now).await.unwrap();
        assert_eq!(eligible, vec![id]);
    }
}
