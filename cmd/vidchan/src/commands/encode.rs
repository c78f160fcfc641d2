use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use vidchan_encoder::{EncodeError, FrameEncoder, VideoEncoder};
use vidchan_frames::{FfmpegOpener, FrameSampler};
use vidchan_pipeline::{Config, Pipeline};

use super::{get_config, print_info, print_success, print_warning};
use crate::discover::discover;
use crate::Cli;

/// Embed every video under the channels directory that is not cached yet.
///
/// Progress is checkpointed, so an interrupted run picks up where it left off.
#[derive(Args)]
pub struct EncodeCommand {
    /// Collection root, laid out as <dir>/<group>/<video>
    #[arg(default_value = "channels")]
    channels_dir: PathBuf,

    /// Ignore the cache and embed everything again
    #[arg(long)]
    force: bool,

    /// Frames sampled per video (overrides config)
    #[arg(long)]
    frames: Option<usize>,

    /// Embedding cache file (overrides config)
    #[arg(long)]
    cache: Option<PathBuf>,
}

impl EncodeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut cfg = get_config(cli)?;
        if let Some(frames) = self.frames {
            cfg.frames_per_video = frames;
        }
        if let Some(cache) = &self.cache {
            cfg.cache_path = cache.clone();
        }
        cfg.validate()?;

        let records = discover(&self.channels_dir)
            .with_context(|| format!("discover videos in {}", self.channels_dir.display()))?;
        print_info(&format!(
            "found {} videos in {}",
            records.len(),
            self.channels_dir.display()
        ));

        let model = frame_encoder(&cfg).context("load image encoder")?;
        let encoder = VideoEncoder::new(model, FrameSampler::new(cfg.frames_per_video));
        let opener = FfmpegOpener::new(cfg.ffmpeg.clone());

        let pipeline = Pipeline::from_config(&cfg);
        let (snapshot, summary) = pipeline
            .encode_collection(&encoder, &opener, &records, self.force)
            .with_context(|| format!("encode into {}", cfg.cache_path.display()))?;

        for (id, reason) in &summary.skipped {
            print_warning(&format!("skipped {id}: {reason}"));
        }
        print_success(&format!(
            "{} embedded, {} cached, {} skipped; cache holds {} videos",
            summary.embedded,
            summary.cached,
            summary.skipped.len(),
            snapshot.len()
        ));
        Ok(())
    }
}

#[cfg(feature = "clip")]
fn frame_encoder(cfg: &Config) -> Result<Box<dyn FrameEncoder>, EncodeError> {
    let model = vidchan_encoder::ClipEncoder::new(cfg.model_cache_dir.as_deref())?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "clip"))]
fn frame_encoder(_cfg: &Config) -> Result<Box<dyn FrameEncoder>, EncodeError> {
    Err(EncodeError::Unavailable(
        "image model (built without the `clip` feature)".into(),
    ))
}
