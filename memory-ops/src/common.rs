//! Argument-extraction helpers shared by every operation module. Operations
//! receive loosely-typed `serde_json::Value` arguments (spec §4.6 `invoke`);
//! these helpers turn field access into a consistent `INVALID_ARGUMENT`.

use chrono::{DateTime, Utc};
use memory_core::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

pub fn opt_datetime(args: &Value, field: &str) -> Result<Option<DateTime<Utc>>> {
    match args.get(field).and_then(Value::as_str) {
        None => Ok(None),
        Some(raw) => Ok(Some(
            DateTime::parse_from_rfc3339(raw)
                .map_err(|e| Error::InvalidArgument(format!("field '{field}' is not rfc3339: {e}")))?
                .with_timezone(&Utc),
        )),
    }
}

pub fn require_str<'a>(args: &'a Value, field: &str) -> Result<&'a str> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidArgument(format!("missing or empty required field '{field}'")))
}

pub fn opt_str<'a>(args: &'a Value, field: &str) -> Option<&'a str> {
    args.get(field).and_then(Value::as_str)
}

pub fn require_uuid(args: &Value, field: &str) -> Result<Uuid> {
    let raw = require_str(args, field)?;
    Uuid::parse_str(raw).map_err(|e| Error::InvalidArgument(format!("field '{field}' is not a uuid: {e}")))
}

pub fn opt_uuid(args: &Value, field: &str) -> Result<Option<Uuid>> {
    match args.get(field).and_then(Value::as_str) {
        None => Ok(None),
        Some(raw) => Ok(Some(
            Uuid::parse_str(raw).map_err(|e| Error::InvalidArgument(format!("field '{field}' is not a uuid: {e}")))?,
        )),
    }
}

pub fn opt_f64(args: &Value, field: &str) -> Option<f64> {
    args.get(field).and_then(Value::as_f64)
}

pub fn opt_u64(args: &Value, field: &str) -> Option<u64> {
    args.get(field).and_then(Value::as_u64)
}

pub fn opt_usize(args: &Value, field: &str, default: usize) -> usize {
    args.get(field).and_then(Value::as_u64).map_or(default, |v| v as usize)
}

pub fn opt_bool(args: &Value, field: &str, default: bool) -> bool {
    args.get(field).and_then(Value::as_bool).unwrap_or(default)
}

/// Deserialize a required string field into an enum variant (spec enums are
/// `#[serde(rename_all = "snake_case")]`, so this accepts e.g. `"action"`).
pub fn require_enum<T: DeserializeOwned>(args: &Value, field: &str) -> Result<T> {
    let raw = require_str(args, field)?;
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|e| Error::InvalidArgument(format!("field '{field}' is not a valid value: {e}")))
}

pub fn opt_enum<T: DeserializeOwned>(args: &Value, field: &str, default: T) -> Result<T> {
    match args.get(field).and_then(Value::as_str) {
        None => Ok(default),
        Some(raw) => serde_json::from_value(Value::String(raw.to_string()))
            .map_err(|e| Error::InvalidArgument(format!("field '{field}' is not a valid value: {e}"))),
    }
}

/// Deserialize a named sub-object/field into a concrete type, surfacing
/// deserialization failures as `INVALID_ARGUMENT` rather than a panic.
pub fn parse_field<T: DeserializeOwned>(args: &Value, field: &str) -> Result<Option<T>> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            serde_json::from_value(value.clone()).map(Some).map_err(|e| Error::InvalidArgument(format!("field '{field}' is malformed: {e}")))
        }
    }
}
