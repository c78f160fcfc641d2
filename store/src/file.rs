//! Snapshot persistence in a single binary file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Snapshot, SnapshotStore, StoreError, VideoRecord};

/// Default cache file name inside the cache directory.
pub const DEFAULT_CACHE_FILE: &str = "video_embeddings.msgpack";

const SNAPSHOT_MAGIC: [u8; 4] = [b'V', b'C', b'S', b'N'];
const SNAPSHOT_VERSION: u32 = 1;

/// Body of the snapshot file. The layout is:
///
/// ```text
/// [4B magic "VCSN"] [4B version=1, little-endian]
/// [msgpack map { dim, records, vectors }]
/// ```
#[derive(Serialize)]
struct SnapshotBodyRef<'a> {
    dim: usize,
    records: &'a [VideoRecord],
    vectors: &'a [Vec<f32>],
}

#[derive(Deserialize)]
struct SnapshotBody {
    dim: usize,
    records: Vec<VideoRecord>,
    vectors: Vec<Vec<f32>>,
}

/// [`SnapshotStore`] backed by one file on disk.
///
/// `save` writes a temporary file in the target directory, syncs it, and
/// renames it over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn decode(&self, data: &[u8]) -> Result<Snapshot, StoreError> {
        if data.len() < 8 {
            return Err(self.corrupt(format!("truncated header ({} bytes)", data.len())));
        }
        if data[..4] != SNAPSHOT_MAGIC {
            return Err(self.corrupt(format!("invalid magic {:?}", &data[..4])));
        }
        let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if version != SNAPSHOT_VERSION {
            return Err(self.corrupt(format!(
                "unsupported version {version} (want {SNAPSHOT_VERSION})"
            )));
        }

        let body: SnapshotBody =
            rmp_serde::from_slice(&data[8..]).map_err(|e| self.corrupt(e.to_string()))?;

        if body.records.len() != body.vectors.len() {
            return Err(self.corrupt(format!(
                "{} records but {} vectors",
                body.records.len(),
                body.vectors.len()
            )));
        }
        if let Some(v) = body.vectors.iter().find(|v| v.len() != body.dim) {
            return Err(self.corrupt(format!(
                "row of length {} in a {}-dim snapshot",
                v.len(),
                body.dim
            )));
        }
        Snapshot::new(body.records, body.vectors).map_err(|e| self.corrupt(e.to_string()))
    }

    fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, StoreError> {
        let body = SnapshotBodyRef {
            dim: snapshot.dim().unwrap_or(0),
            records: snapshot.records(),
            vectors: snapshot.vectors(),
        };
        let mut out = Vec::with_capacity(8 + snapshot.len() * (body.dim * 5 + 64));
        out.extend_from_slice(&SNAPSHOT_MAGIC);
        out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        rmp_serde::encode::write_named(&mut out, &body)
            .map_err(|e| StoreError::Encode(e.to_string()))?;
        Ok(out)
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        let snapshot = self.decode(&data)?;
        debug!(path = %self.path.display(), rows = snapshot.len(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let data = Self::encode(snapshot)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %self.path.display(), rows = snapshot.len(), bytes = data.len(), "snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot::new(
            vec![
                VideoRecord::new("/c/ocean/a.mp4", "a.mp4", "ocean", 1_000),
                VideoRecord::new("/c/city/b.mp4", "b.mp4", "city", 2_000),
            ],
            vec![vec![0.6, 0.8, 0.0], vec![0.0, 0.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn missing_file_is_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("none.msgpack"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("cache").join(DEFAULT_CACHE_FILE));
        let snap = sample();
        store.save(&snap).unwrap();
        assert_eq!(store.load().unwrap(), Some(snap));
    }

    #[test]
    fn reload_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join(DEFAULT_CACHE_FILE));
        let snap = sample();
        store.save(&snap).unwrap();
        let first = std::fs::read(store.path()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        store.save(&loaded).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), snap);
        assert_eq!(std::fs::read(store.path()).unwrap(), first);
    }

    #[test]
    fn empty_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join(DEFAULT_CACHE_FILE));
        store.save(&Snapshot::empty()).unwrap();
        assert_eq!(store.load().unwrap(), Some(Snapshot::empty()));
    }

    #[test]
    fn garbage_is_corrupt_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CACHE_FILE);
        std::fs::write(&path, b"definitely not a snapshot").unwrap();
        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }), "got {err}");
    }

    #[test]
    fn truncated_body_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join(DEFAULT_CACHE_FILE));
        store.save(&sample()).unwrap();
        let data = std::fs::read(store.path()).unwrap();
        std::fs::write(store.path(), &data[..data.len() / 2]).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn wrong_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join(DEFAULT_CACHE_FILE));
        store.save(&sample()).unwrap();
        let mut data = std::fs::read(store.path()).unwrap();
        data[4] = 9;
        std::fs::write(store.path(), &data).unwrap();
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("unsupported version"), "got {err}");
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join(DEFAULT_CACHE_FILE));
        store.save(&sample()).unwrap();
        let grown = sample()
            .merge(
                vec![VideoRecord::new("/c/city/c.mp4", "c.mp4", "city", 3_000)],
                vec![vec![1.0, 0.0, 0.0]],
            )
            .unwrap();
        store.save(&grown).unwrap();
        assert_eq!(store.load().unwrap().unwrap().len(), 3);

        // Only the target file remains; the temporary file was renamed.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // Parent "directory" is a regular file.
        let store = FileStore::new(blocker.join("cache.msgpack"));
        assert!(matches!(store.save(&sample()), Err(StoreError::Io(_))));
    }
}
