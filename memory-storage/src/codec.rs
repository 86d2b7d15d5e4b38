//! postcard (de)serialization helpers shared by every table (SPEC_FULL §4.1,
//! grounded in the teacher's `memory-storage-redb` use of `postcard`).

use memory_core::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(value).map_err(|e| Error::Storage(format!("serialize failed: {e}")))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    postcard::from_bytes(bytes).map_err(|e| Error::Storage(format!("deserialize failed: {e}")))
}

/// Run a blocking closure on the blocking pool, flattening join errors into
/// [`Error::Storage`] (every redb transaction is synchronous).
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Storage(format!("task join error: {e}")))?
}
