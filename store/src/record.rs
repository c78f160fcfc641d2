use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A discovered video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Stable identity key (resolved path or tagged filename).
    pub id: String,

    /// Display name, usually the file name.
    pub name: String,

    /// Collection the clip came from (e.g. its original channel folder).
    pub source_group: String,

    pub size_bytes: u64,

    /// Where the sampler opens the video. Defaults to `id`.
    pub path: PathBuf,
}

impl VideoRecord {
    /// Creates a record whose path is its identity.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source_group: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        let id = id.into();
        Self {
            path: PathBuf::from(&id),
            id,
            name: name.into(),
            source_group: source_group.into(),
            size_bytes,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_id_as_path() {
        let r = VideoRecord::new("/videos/ocean/a.mp4", "a.mp4", "ocean", 2 * 1024 * 1024);
        assert_eq!(r.path, PathBuf::from("/videos/ocean/a.mp4"));
        assert_eq!(r.size_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn with_path_overrides() {
        let r = VideoRecord::new("[existing]_a.mp4", "a.mp4", "existing", 0).with_path("/real/a.mp4");
        assert_eq!(r.id, "[existing]_a.mp4");
        assert_eq!(r.path, PathBuf::from("/real/a.mp4"));
    }
}
