//! Flat-file result cache.
//!
//! One JSON file with a `cached_at` stamp; reads honour a 24 h max age
//! unless the caller explicitly allows stale data. This is the only
//! persistence in the system.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::CoreError;

const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    cached_at: String,
    payload: T,
}

pub struct SnapshotStore {
    path: PathBuf,
    max_age: Duration,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_age: DEFAULT_MAX_AGE,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `payload` with a fresh timestamp, replacing any previous
    /// snapshot.
    pub fn write<T: Serialize>(&self, payload: &T) -> Result<(), CoreError> {
        let envelope = Envelope {
            cached_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            payload,
        };
        let body = serde_json::to_string_pretty(&envelope)?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }

    /// Load the snapshot. Returns `None` when the file is missing,
    /// unreadable, malformed, or older than `max_age` (unless
    /// `allow_stale`). A bad cache is never fatal.
    pub fn read<T: DeserializeOwned>(&self, allow_stale: bool) -> Option<T> {
        let body = std::fs::read_to_string(&self.path).ok()?;
        let envelope: Envelope<T> = serde_json::from_str(&body).ok()?;

        if !allow_stale {
            let cached_at = OffsetDateTime::parse(&envelope.cached_at, &Rfc3339).ok()?;
            let age = OffsetDateTime::now_utc() - cached_at;
            if age > self.max_age {
                tracing::debug!(path = %self.path.display(), "snapshot expired");
                return None;
            }
        }

        Some(envelope.payload)
    }

    /// Timestamp of the stored snapshot, if one exists and parses.
    pub fn cached_at(&self) -> Option<OffsetDateTime> {
        let body = std::fs::read_to_string(&self.path).ok()?;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(&body).ok()?;
        OffsetDateTime::parse(&envelope.cached_at, &Rfc3339).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        tickers: Vec<String>,
    }

    #[test]
    fn round_trips_fresh_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("scan.json"));

        let payload = Payload {
            tickers: vec![String::from("AAPL")],
        };
        store.write(&payload).unwrap();

        assert_eq!(store.read::<Payload>(false), Some(payload));
        assert!(store.cached_at().is_some());
    }

    #[test]
    fn expired_snapshot_reads_only_when_stale_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            SnapshotStore::new(dir.path().join("scan.json")).with_max_age(Duration::ZERO);

        store
            .write(&Payload {
                tickers: vec![String::from("MSFT")],
            })
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(store.read::<Payload>(false), None);
        assert!(store.read::<Payload>(true).is_some());
    }

    #[test]
    fn missing_or_garbled_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        let store = SnapshotStore::new(&path);

        assert_eq!(store.read::<Payload>(true), None);

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(store.read::<Payload>(true), None);
    }
}
