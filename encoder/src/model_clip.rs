//! [`FrameEncoder`] implementation using fastembed's CLIP image model.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fastembed::{ImageEmbedding, ImageEmbeddingModel, ImageInitOptions};
use vidchan_frames::Frame;

use crate::error::EncodeError;
use crate::model::FrameEncoder;

/// Output dimension of CLIP ViT-B/32.
pub const CLIP_DIMENSION: usize = 512;

/// CLIP ViT-B/32 image encoder.
///
/// # Pipeline
///
/// 1. RGB frames -> PNG files in a scratch directory
/// 2. fastembed preprocessing (resize, center crop, normalize)
/// 3. ONNX inference, one vector per frame
///
/// # Thread Safety
///
/// The ONNX session is loaded once and guarded by a mutex.
pub struct ClipEncoder {
    model: Mutex<ImageEmbedding>,
}

impl ClipEncoder {
    /// Loads the model, downloading it into `cache_dir` on first use.
    pub fn new(cache_dir: Option<&Path>) -> Result<Self, EncodeError> {
        let mut opts = ImageInitOptions::new(ImageEmbeddingModel::ClipVitB32)
            .with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            opts = opts.with_cache_dir(dir.to_path_buf());
        }
        let model = ImageEmbedding::try_new(opts).map_err(|e| EncodeError::Model(e.to_string()))?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }

    fn write_frames(dir: &Path, frames: &[Frame]) -> Result<Vec<PathBuf>, EncodeError> {
        frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let img = image::RgbImage::from_raw(frame.width, frame.height, frame.rgb.clone())
                    .ok_or_else(|| EncodeError::Model(format!("frame {} has a bad buffer", frame.index)))?;
                let path = dir.join(format!("frame_{i:04}.png"));
                img.save(&path)
                    .map_err(|e| EncodeError::Model(format!("write {}: {e}", path.display())))?;
                Ok(path)
            })
            .collect()
    }
}

impl FrameEncoder for ClipEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<f32>, EncodeError> {
        let mut out = self.encode_batch(std::slice::from_ref(frame))?;
        out.pop()
            .ok_or_else(|| EncodeError::Model("model returned no embedding".into()))
    }

    fn encode_batch(&self, frames: &[Frame]) -> Result<Vec<Vec<f32>>, EncodeError> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }
        let scratch = tempfile::tempdir().map_err(|e| EncodeError::Model(e.to_string()))?;
        let paths = Self::write_frames(scratch.path(), frames)?;

        let mut model = self
            .model
            .lock()
            .map_err(|_| EncodeError::Model("model lock poisoned".into()))?;
        model
            .embed(paths, None)
            .map_err(|e| EncodeError::Model(e.to_string()))
    }

    fn dimension(&self) -> usize {
        CLIP_DIMENSION
    }
}
