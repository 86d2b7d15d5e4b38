//! Common types shared across the engine (spec §3).

pub mod constants;
pub mod enums;
pub mod structs;

pub use constants::*;
pub use enums::{
    ConfidenceLevel, ConsolidationStrategy, DreamStatus, EventType, EvictionPolicy, LifecycleStatus,
    MemoryType, Outcome, Phase, Priority, QueryType, TaskStatus,
};
pub use structs::{
    Confidence, Cursor, DreamVariant, Entity, Event, EventContext, Goal, ItemRef, Layer, Memory,
    Observation, Procedure, ProcedureExecution, ProcedureParam, Relation, SessionContext, Task,
    WorkingMemorySlot,
};
