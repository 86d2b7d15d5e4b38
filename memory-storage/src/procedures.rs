//! Procedural-memory store: upsert/lookup by id or name, plus execution
//! history (SPEC_FULL §4.1).

use redb::ReadableTable;
use uuid::Uuid;

use memory_core::types::{Procedure, ProcedureExecution};
use memory_core::{Error, Result};

use crate::codec::{blocking, decode, encode};
use crate::tables::{procedure_name_key, PROCEDURES_TABLE, PROCEDURE_EXECUTIONS_TABLE, PROCEDURE_NAME_INDEX};
use crate::RedbStorage;

impl RedbStorage {
    pub(crate) async fn upsert_procedure_impl(&self, procedure: Procedure) -> Result<Uuid> {
        let db = self.db.clone();
        let id = procedure.id;
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let name_key = procedure_name_key(&procedure.project_id, &procedure.name);
                let mut name_index = txn.open_table(PROCEDURE_NAME_INDEX).map_err(crate::storage_err)?;
                name_index
                    .insert(name_key.as_str(), id.to_string().as_str())
                    .map_err(|e| Error::Storage(e.to_string()))?;
                drop(name_index);

                let mut table = txn.open_table(PROCEDURES_TABLE).map_err(crate::storage_err)?;
                let bytes = encode(&procedure)?;
                table
                    .insert(id.to_string().as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(id)
        })
        .await
    }

    pub(crate) async fn get_procedure_impl(&self, id: Uuid) -> Result<Option<Procedure>> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(PROCEDURES_TABLE).map_err(crate::storage_err)?;
            match table.get(id.to_string().as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                Some(bytes) => Ok(Some(decode(bytes.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub(crate) async fn get_procedure_by_name_impl(&self, project_id: &str, name: &str) -> Result<Option<Procedure>> {
        let key = procedure_name_key(project_id, name);
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let name_index = txn.open_table(PROCEDURE_NAME_INDEX).map_err(crate::storage_err)?;
            let Some(id_bytes) = name_index.get(key.as_str()).map_err(|e| Error::Storage(e.to_string()))? else {
                return Ok(None);
            };
            let id = id_bytes.value().to_string();
            let table = txn.open_table(PROCEDURES_TABLE).map_err(crate::storage_err)?;
            match table.get(id.as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                Some(bytes) => Ok(Some(decode(bytes.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub(crate) async fn list_procedures_impl(&self, project_id: &str, limit: usize) -> Result<Vec<Procedure>> {
        let project_id = project_id.to_string();
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(PROCEDURES_TABLE).map_err(crate::storage_err)?;
            let mut procedures = Vec::new();
            for row in table.iter().map_err(|e| Error::Storage(e.to_string()))? {
                let (_, bytes) = row.map_err(|e| Error::Storage(e.to_string()))?;
                let procedure: Procedure = decode(bytes.value())?;
                if procedure.project_id == project_id {
                    procedures.push(procedure);
                }
            }
            procedures.sort_by(|a, b| b.success_rate.partial_cmp(&a.success_rate).unwrap_or(std::cmp::Ordering::Equal));
            procedures.truncate(limit);
            Ok(procedures)
        })
        .await
    }

    pub(crate) async fn record_execution_impl(&self, execution: ProcedureExecution) -> Result<Uuid> {
        let db = self.db.clone();
        let id = execution.id;
        let procedure_id = execution.procedure_id;
        let duration_ms = execution.duration_ms;
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut executions = txn.open_table(PROCEDURE_EXECUTIONS_TABLE).map_err(crate::storage_err)?;
                let bytes = encode(&execution)?;
                executions
                    .insert(id.to_string().as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
                drop(executions);

                let mut procedures = txn.open_table(PROCEDURES_TABLE).map_err(crate::storage_err)?;
                let proc_id_str = procedure_id.to_string();
                if let Some(bytes) = procedures.get(proc_id_str.as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                    let mut procedure: Procedure = decode(bytes.value())?;
                    drop(bytes);
                    let success = matches!(execution.outcome, memory_core::types::Outcome::Success);
                    let n = procedure.usage_count as f64;
                    procedure.success_rate = (procedure.success_rate * n + if success { 1.0 } else { 0.0 }) / (n + 1.0);
                    procedure.avg_duration_ms = (procedure.avg_duration_ms * n + duration_ms as f64) / (n + 1.0);
                    procedure.usage_count += 1;
                    let bytes = encode(&procedure)?;
                    procedures
                        .insert(proc_id_str.as_str(), bytes.as_slice())
                        .map_err(|e| Error::Storage(e.to_string()))?;
                }
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(id)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::types::{Outcome, ProcedureParam};
    use chrono::Utc;

    fn make_procedure(project: &str, name: &str) -> Procedure {
        Procedure {
            id: Uuid::new_v4(),
            project_id: project.to_string(),
            name: name.to_string(),
            category: "build".to_string(),
            template: "cargo test".to_string(),
            params: Vec::<ProcedureParam>::new(),
            success_rate: 1.0,
            usage_count: 0,
            avg_duration_ms: 0.0,
            trigger_pattern: None,
            examples: vec![],
            source_event_ids: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn lookup_by_name_finds_upserted_procedure() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        let procedure = make_procedure("p1", "run-tests");
        storage.upsert_procedure_impl(procedure).await.unwrap();
        let found = storage.get_procedure_by_name_impl("p1", "run-tests").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn recording_execution_updates_success_rate_and_usage_count() {
        let (storage, _dir) = RedbStorage::open_temp().await.unwrap();
        let id = storage.upsert_procedure_impl(make_procedure("p1", "deploy")).await.unwrap();
        let execution = ProcedureExecution {
            id: Uuid::new_v4(),
            procedure_id: id,
            project_id: "p1".to_string(),
            outcome: Outcome::Failure,
            duration_ms: 500,
            learned: None,
            variables: serde_json::json!({}),
            at: Utc::now(),
        };
        storage.record_execution_impl(execution).await.unwrap();
        let procedure = storage.get_procedure_impl(id).await.unwrap().unwrap();
        assert_eq!(procedure.usage_count, 1);
        assert!((procedure.success_rate - 0.0).abs() < 1e-9);
    }
}
