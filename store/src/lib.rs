//! Embedding cache for video collections.
//!
//! A [`Snapshot`] pairs video records with their embedding rows; row `i`
//! always belongs to record `i`. Snapshots only grow through
//! [`Snapshot::merge`], which appends and never reorders.
//!
//! [`SnapshotStore`] persists whole snapshots. [`FileStore`] writes a
//! temporary file next to the target and renames it into place, so a
//! reader sees either the previous snapshot or the new one.
//!
//! ```
//! use vidchan_store::{MemoryStore, Snapshot, SnapshotStore, VideoRecord};
//!
//! let store = MemoryStore::new();
//! let rec = VideoRecord::new("/v/a.mp4", "a.mp4", "ocean", 1024);
//! let snap = Snapshot::empty().merge(vec![rec], vec![vec![1.0, 0.0]]).unwrap();
//! store.save(&snap).unwrap();
//! assert_eq!(store.load().unwrap().unwrap().len(), 1);
//! ```

mod error;
mod file;
mod memory;
mod record;
mod snapshot;

pub use error::StoreError;
pub use file::{FileStore, DEFAULT_CACHE_FILE};
pub use memory::MemoryStore;
pub use record::VideoRecord;
pub use snapshot::Snapshot;

/// Persists complete snapshots.
///
/// Implementations must be safe for concurrent use.
pub trait SnapshotStore: Send + Sync {
    /// Returns the persisted snapshot, or `None` when nothing was saved yet.
    ///
    /// A snapshot that exists but cannot be read back is an error
    /// ([`StoreError::Corrupt`]), not `None`.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Replaces the persisted snapshot as a whole.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}
