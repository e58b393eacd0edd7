//! Storage module
//!
//! Local key-value persistence for the store snapshot. Each backend keeps
//! one slot, named by `STORAGE_KEY`, holding the JSON envelope
//! `{ "state": <snapshot>, "version": 0 }`.

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteKvStorage;

use crate::config::SNAPSHOT_VERSION;
use crate::error::Result;
use crate::store::Snapshot;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Persistence provider for the store snapshot
pub trait SnapshotStorage: Send + Sync + 'static {
    /// Read the slot; `None` when nothing has been saved yet
    fn load(&self) -> impl Future<Output = Result<Option<Snapshot>>> + Send;

    /// Replace the slot with `snapshot`
    fn save(&self, snapshot: &Snapshot) -> impl Future<Output = Result<()>> + Send;
}

/// Wire layout of the persisted slot
#[derive(Debug, Deserialize)]
struct Envelope {
    state: Snapshot,
    #[serde(default)]
    version: u32,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a Snapshot,
    version: u32,
}

/// Serialize a snapshot into the persisted envelope
pub(crate) fn encode(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string(&EnvelopeRef {
        state: snapshot,
        version: SNAPSHOT_VERSION,
    })?)
}

/// Human-readable variant of `encode`
pub(crate) fn encode_pretty(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(&EnvelopeRef {
        state: snapshot,
        version: SNAPSHOT_VERSION,
    })?)
}

/// Parse a persisted envelope back into a snapshot
pub(crate) fn decode(raw: &str) -> Result<Snapshot> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    if envelope.version > SNAPSHOT_VERSION {
        tracing::warn!(
            "Snapshot version {} is newer than supported version {}",
            envelope.version,
            SNAPSHOT_VERSION
        );
    }
    Ok(envelope.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Theme;

    #[test]
    fn test_envelope_layout() {
        let snapshot = Snapshot {
            theme: Theme::Dark,
            ..Snapshot::default()
        };

        let raw = encode(&snapshot).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["theme"], "dark");
        assert_eq!(value["state"]["isAuthenticated"], false);
        assert!(value["state"]["user"].is_null());

        assert_eq!(decode(&raw).unwrap(), snapshot);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not json").is_err());
    }
}
