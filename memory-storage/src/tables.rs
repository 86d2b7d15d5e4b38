//! redb table definitions for the embedded backend.
//!
//! Every value column stores `postcard`-encoded bytes. Index tables map a
//! composite string key to the primary key of the table they index; there is
//! no foreign-key enforcement, matching redb's lack of transaction-spanning
//! constraints.

use redb::TableDefinition;

pub(crate) const EVENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("events");
pub(crate) const EVENT_HASH_INDEX: TableDefinition<&str, &str> = TableDefinition::new("event_hash_index");

pub(crate) const MEMORIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memories");

pub(crate) const PROCEDURES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("procedures");
pub(crate) const PROCEDURE_NAME_INDEX: TableDefinition<&str, &str> = TableDefinition::new("procedure_name_index");
pub(crate) const PROCEDURE_EXECUTIONS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("procedure_executions");

pub(crate) const TASKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tasks");
pub(crate) const GOALS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("goals");

pub(crate) const ENTITIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("entities");
pub(crate) const ENTITY_NAME_INDEX: TableDefinition<&str, &str> = TableDefinition::new("entity_name_index");
pub(crate) const RELATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("relations");
pub(crate) const OBSERVATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("observations");

pub(crate) const CURSORS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cursors");

/// Build the `project_id\u{0}name\u{0}type` composite key used by
/// [`ENTITY_NAME_INDEX`].
pub(crate) fn entity_name_key(project_id: &str, name: &str, entity_type: &str) -> String {
    format!("{project_id}\u{0}{name}\u{0}{entity_type}")
}

/// Build the `project_id\u{0}name` composite key used by [`PROCEDURE_NAME_INDEX`].
pub(crate) fn procedure_name_key(project_id: &str, name: &str) -> String {
    format!("{project_id}\u{0}{name}")
}
