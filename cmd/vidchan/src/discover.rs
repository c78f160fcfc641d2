//! Collection discovery.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;
use vidchan_store::VideoRecord;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| VIDEO_EXTENSIONS.iter().any(|v| e.eq_ignore_ascii_case(v)))
}

fn sorted_entries(dir: &Path) -> anyhow::Result<Vec<std::path::PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("read {}", dir.display()))?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("read {}", dir.display()))?;
    paths.sort();
    Ok(paths)
}

/// Lists videos under `<root>/<group>/<file>`, sorted by group then file.
///
/// Each record is keyed by the file's canonical path. Hidden entries and
/// files directly under `root` are ignored.
pub fn discover(root: &Path) -> anyhow::Result<Vec<VideoRecord>> {
    let mut records = Vec::new();
    for group_dir in sorted_entries(root)? {
        if is_hidden(&group_dir) || !group_dir.is_dir() {
            continue;
        }
        let group = group_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let before = records.len();
        for file in sorted_entries(&group_dir)? {
            if is_hidden(&file) || !file.is_file() || !is_video(&file) {
                continue;
            }
            let canonical = fs::canonicalize(&file)
                .with_context(|| format!("resolve {}", file.display()))?;
            let size = fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            records.push(VideoRecord::new(
                canonical.to_string_lossy().into_owned(),
                name,
                group.clone(),
                size,
            ));
        }
        debug!(group = %group, videos = records.len() - before, "group scanned");
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, bytes: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn walks_group_folders_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("ocean/b.mp4"), 10);
        touch(&root.join("ocean/a.MOV"), 20);
        touch(&root.join("city/night.webm"), 30);
        touch(&root.join("city/notes.txt"), 1);
        touch(&root.join("city/.hidden.mp4"), 1);
        touch(&root.join(".trash/x.mp4"), 1);
        touch(&root.join("loose.mp4"), 1);

        let records = discover(root).unwrap();
        let found: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.source_group.as_str(), r.name.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![("city", "night.webm"), ("ocean", "a.MOV"), ("ocean", "b.mp4")]
        );
        assert_eq!(records[1].size_bytes, 20);
        let canonical = fs::canonicalize(root.join("ocean/a.MOV")).unwrap();
        assert_eq!(records[1].id, canonical.to_string_lossy());
        assert_eq!(records[1].path, canonical);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn extensions_are_case_insensitive() {
        assert!(is_video(Path::new("a.MKV")));
        assert!(is_video(Path::new("a.avi")));
        assert!(!is_video(Path::new("a.gif")));
        assert!(!is_video(Path::new("mp4")));
    }
}
