//! Video source backed by the `ffprobe`/`ffmpeg` command line tools.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::frame::{Frame, VideoOpener, VideoSource};
use crate::FrameError;

/// Locations of the ffmpeg binaries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".into(),
            ffprobe_bin: "ffprobe".into(),
        }
    }
}

/// Opens videos by probing them with `ffprobe`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegOpener {
    cfg: FfmpegConfig,
}

impl FfmpegOpener {
    pub fn new(cfg: FfmpegConfig) -> Self {
        Self { cfg }
    }
}

impl VideoOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, FrameError> {
        let src = FfmpegSource::open(&self.cfg, path)?;
        Ok(Box::new(src))
    }
}

/// A probed video file. Every [`VideoSource::read_frame`] runs one
/// `ffmpeg` process that decodes exactly one frame to raw RGB24.
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    ffmpeg_bin: String,
    path: PathBuf,
    width: u32,
    height: u32,
    frames: u64,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    nb_read_packets: Option<String>,
    nb_frames: Option<String>,
}

impl FfmpegSource {
    /// Probes `path` for the first video stream's geometry and frame count.
    pub fn open(cfg: &FfmpegConfig, path: &Path) -> Result<Self, FrameError> {
        if !path.is_file() {
            return Err(FrameError::Open {
                path: path.display().to_string(),
                reason: "not a file".into(),
            });
        }

        let out = Command::new(&cfg.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_packets",
                "-show_entries",
                "stream=width,height,nb_read_packets,nb_frames",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| FrameError::Open {
                path: path.display().to_string(),
                reason: format!("spawn {}: {e}", cfg.ffprobe_bin),
            })?;

        if !out.status.success() {
            return Err(FrameError::Open {
                path: path.display().to_string(),
                reason: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        let (width, height, frames) = parse_probe(&out.stdout)?;
        Ok(Self {
            ffmpeg_bin: cfg.ffmpeg_bin.clone(),
            path: path.to_path_buf(),
            width,
            height,
            frames,
        })
    }
}

/// Extracts `(width, height, frame_count)` from ffprobe's JSON output.
fn parse_probe(stdout: &[u8]) -> Result<(u32, u32, u64), FrameError> {
    let probe: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| FrameError::Probe(e.to_string()))?;
    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| FrameError::Probe("no video stream".into()))?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(FrameError::Probe(format!("invalid geometry {width}x{height}")));
    }

    // Packet count is exact; nb_frames comes from the container header and
    // is missing for some formats (e.g. webm).
    let count = |v: Option<String>| v.and_then(|s| s.trim().parse::<u64>().ok());
    let frames = count(stream.nb_read_packets)
        .or_else(|| count(stream.nb_frames))
        .unwrap_or(0);
    Ok((width, height, frames))
}

impl VideoSource for FfmpegSource {
    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn read_frame(&mut self, index: u64) -> Result<Frame, FrameError> {
        let filter = format!("select=eq(n\\,{index})");
        let out = Command::new(&self.ffmpeg_bin)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(&self.path)
            .args([
                "-vf",
                &filter,
                "-fps_mode",
                "passthrough",
                "-frames:v",
                "1",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .output()?;

        if !out.status.success() {
            return Err(FrameError::Decode {
                index,
                reason: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        if out.stdout.is_empty() {
            return Err(FrameError::Decode {
                index,
                reason: "no frame produced".into(),
            });
        }
        Frame::new(index, self.width, self.height, out.stdout)
    }
}
