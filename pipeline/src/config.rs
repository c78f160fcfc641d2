//! Operator configuration.
//!
//! Stored as YAML in `~/.vidchan/config.yaml`. Every field has a default,
//! so a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vidchan_cluster::ClusterParams;
use vidchan_frames::{FfmpegConfig, DEFAULT_FRAMES_PER_VIDEO};
use vidchan_store::DEFAULT_CACHE_FILE;

use crate::PipelineError;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".vidchan";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "video_embeddings_cache";
pub const DEFAULT_CHECKPOINT_EVERY: usize = 25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frames sampled per video.
    pub frames_per_video: usize,

    /// Embedding cache file.
    pub cache_path: PathBuf,

    /// Newly embedded videos between cache checkpoints.
    pub checkpoint_every: usize,

    /// Where the image model is downloaded (model default if unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_cache_dir: Option<PathBuf>,

    pub ffmpeg: FfmpegConfig,

    pub cluster: ClusterParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frames_per_video: DEFAULT_FRAMES_PER_VIDEO,
            cache_path: Path::new(DEFAULT_CACHE_DIR).join(DEFAULT_CACHE_FILE),
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            model_cache_dir: None,
            ffmpeg: FfmpegConfig::default(),
            cluster: ClusterParams::default(),
        }
    }
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR))
    }

    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.frames_per_video == 0 {
            return Err(PipelineError::Config("frames_per_video must be at least 1".into()));
        }
        if self.checkpoint_every == 0 {
            return Err(PipelineError::Config("checkpoint_every must be at least 1".into()));
        }
        if self.cache_path.as_os_str().is_empty() {
            return Err(PipelineError::Config("cache_path is empty".into()));
        }
        self.cluster
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))
    }
}

/// Loads configuration from `custom_path`, or from the default location.
///
/// A missing file yields the defaults. A file that exists but does not
/// parse, or fails validation, is an error.
pub fn load_config(custom_path: Option<&Path>) -> Result<Config, PipelineError> {
    let config_path = match custom_path {
        Some(p) => p.to_path_buf(),
        None => match Config::default_config_path() {
            Some(p) => p,
            None => return Ok(Config::default()),
        },
    };

    let cfg = match std::fs::read_to_string(&config_path) {
        Ok(content) => serde_yaml::from_str::<Config>(&content).map_err(|e| {
            PipelineError::Config(format!("parse {}: {e}", config_path.display()))
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(e) => {
            return Err(PipelineError::Config(format!(
                "read {}: {e}",
                config_path.display()
            )))
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Saves configuration to `path`, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| PipelineError::Config(format!("create {}: {e}", parent.display())))?;
    }
    let content =
        serde_yaml::to_string(config).map_err(|e| PipelineError::Config(e.to_string()))?;
    std::fs::write(path, content)
        .map_err(|e| PipelineError::Config(format!("write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.frames_per_video, 5);
        assert_eq!(cfg.checkpoint_every, 25);
        assert_eq!(
            cfg.cache_path,
            PathBuf::from("video_embeddings_cache/video_embeddings.msgpack")
        );
        assert_eq!(cfg.cluster, ClusterParams::default());
        cfg.validate().unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&dir.path().join("nope.yaml"))).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "frames_per_video: 8\ncluster:\n  min_cluster_size: 4\nffmpeg:\n  ffmpeg_bin: /opt/ffmpeg\n",
        )
        .unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.frames_per_video, 8);
        assert_eq!(cfg.cluster.min_cluster_size, 4);
        assert_eq!(cfg.cluster.n_neighbors, 15);
        assert_eq!(cfg.ffmpeg.ffmpeg_bin, "/opt/ffmpeg");
        assert_eq!(cfg.ffmpeg.ffprobe_bin, "ffprobe");
        assert_eq!(cfg.checkpoint_every, 25);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "frames_per_video: [not, a, number]\n").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(PipelineError::Config(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for cfg in [
            Config { frames_per_video: 0, ..Config::default() },
            Config { checkpoint_every: 0, ..Config::default() },
            Config {
                cluster: ClusterParams { min_cluster_size: 1, ..ClusterParams::default() },
                ..Config::default()
            },
        ] {
            assert!(matches!(cfg.validate(), Err(PipelineError::Config(_))));
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);
        let cfg = Config {
            checkpoint_every: 3,
            model_cache_dir: Some(PathBuf::from("/models")),
            ..Config::default()
        };
        save_config(&cfg, &path).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), cfg);
    }
}
