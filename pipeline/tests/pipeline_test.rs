use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vidchan_cluster::{Capability, ClusterError, ClusterParams, NOISE};
use vidchan_encoder::{l2_norm, EncodeError, FrameEncoder, SkipReason, VideoEncoder};
use vidchan_frames::{Frame, FrameError, FrameSampler, VideoOpener, VideoSource};
use vidchan_pipeline::{Capabilities, Pipeline, PipelineError};
use vidchan_store::{
    FileStore, MemoryStore, Snapshot, SnapshotStore, StoreError, VideoRecord, DEFAULT_CACHE_FILE,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Embeds a frame as its (shifted) first-pixel color.
struct ColorEncoder;

impl FrameEncoder for ColorEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<f32>, EncodeError> {
        let [r, g, b] = frame.pixel(0, 0);
        Ok(vec![r as f32 + 1.0, g as f32 + 1.0, b as f32 + 1.0])
    }

    fn dimension(&self) -> usize {
        3
    }
}

struct Solid {
    frames: u64,
    rgb: [u8; 3],
}

impl VideoSource for Solid {
    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn read_frame(&mut self, index: u64) -> Result<Frame, FrameError> {
        Frame::new(index, 1, 1, self.rgb.to_vec())
    }
}

/// Serves solid-color videos and counts how often it was asked to.
#[derive(Default)]
struct ColorOpener {
    videos: BTreeMap<PathBuf, ([u8; 3], u64)>,
    opens: AtomicUsize,
}

impl ColorOpener {
    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl VideoOpener for ColorOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, FrameError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let (rgb, frames) = self.videos.get(path).copied().ok_or_else(|| FrameError::Open {
            path: path.display().to_string(),
            reason: "unknown".into(),
        })?;
        Ok(Box::new(Solid { frames, rgb }))
    }
}

/// Memory store whose `fail_at`-th save (1-based) fails.
struct FlakyStore {
    inner: Arc<MemoryStore>,
    saves: AtomicUsize,
    fail_at: usize,
}

impl FlakyStore {
    fn new(inner: Arc<MemoryStore>, fail_at: usize) -> Self {
        Self {
            inner,
            saves: AtomicUsize::new(0),
            fail_at,
        }
    }
}

impl SnapshotStore for FlakyStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        self.inner.load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_at {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.save(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const PER_GROUP: usize = 12;
const EMPTY_VIDEO: &str = "/videos/broken/empty.mp4";

/// Three color families plus one video without frames.
fn collection() -> (Vec<VideoRecord>, ColorOpener) {
    let mut records = Vec::new();
    let mut opener = ColorOpener::default();
    for (group, base) in [("sunset", 0usize), ("forest", 1), ("ocean", 2)] {
        for i in 0..PER_GROUP {
            let mut rgb = [20u8, 20, 20];
            rgb[base] = 200;
            rgb[(base + 1) % 3] = 20 + 2 * i as u8;
            let id = format!("/videos/{group}/{group}_{i:02}.mp4");
            opener.videos.insert(PathBuf::from(&id), (rgb, 50));
            records.push(VideoRecord::new(
                id,
                format!("{group}_{i:02}.mp4"),
                group,
                1 << 20,
            ));
        }
    }
    opener.videos.insert(PathBuf::from(EMPTY_VIDEO), ([0, 0, 0], 0));
    records.push(VideoRecord::new(EMPTY_VIDEO, "empty.mp4", "broken", 0));
    (records, opener)
}

fn encoder() -> VideoEncoder {
    VideoEncoder::new(Box::new(ColorEncoder), FrameSampler::new(5))
}

fn params() -> ClusterParams {
    ClusterParams {
        n_neighbors: 10,
        n_components: 2,
        min_cluster_size: 5,
        ..ClusterParams::default()
    }
}

fn memory_pipeline(checkpoint_every: usize) -> Pipeline {
    Pipeline::new(Box::new(MemoryStore::new()), checkpoint_every)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[test]
fn encode_skips_video_without_frames() {
    let (records, opener) = collection();
    let pipeline = memory_pipeline(25);
    let (snapshot, summary) = pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();

    assert_eq!(summary.embedded, 3 * PER_GROUP);
    assert_eq!(summary.cached, 0);
    assert_eq!(
        summary.skipped,
        vec![(EMPTY_VIDEO.to_string(), SkipReason::NoFrames)]
    );
    assert_eq!(snapshot.len(), 3 * PER_GROUP);
    assert!(!snapshot.contains(EMPTY_VIDEO));
    assert_eq!(snapshot.records().len(), snapshot.vectors().len());
    for (_, v) in snapshot.iter() {
        assert!((l2_norm(v) - 1.0).abs() < 1e-5);
    }
}

#[test]
fn encode_saves_checkpoints() {
    let (records, opener) = collection();
    let pipeline = memory_pipeline(10);
    let (_, summary) = pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();
    // 36 embeddings: checkpoints at 10, 20 and 30, then the final save.
    assert_eq!(summary.checkpoints, 4);
    assert_eq!(pipeline.load().unwrap().len(), 3 * PER_GROUP);
}

#[test]
fn second_pass_reuses_cache() {
    let (records, opener) = collection();
    let pipeline = memory_pipeline(25);
    let (first, _) = pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();
    let opens_after_first = opener.opens();

    let (second, summary) = pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();
    assert_eq!(summary.embedded, 0);
    assert_eq!(summary.cached, 3 * PER_GROUP);
    assert_eq!(summary.checkpoints, 0);
    // Only the frameless video is tried again.
    assert_eq!(opener.opens() - opens_after_first, 1);
    assert_eq!(second, first);
}

#[test]
fn new_videos_are_appended() {
    let (records, opener) = collection();
    let pipeline = memory_pipeline(25);
    let (first, _) = pipeline
        .encode_collection(&encoder(), &opener, &records[..20], false)
        .unwrap();
    let (grown, summary) = pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();

    assert_eq!(summary.cached, 20);
    assert_eq!(summary.embedded, 3 * PER_GROUP - 20);
    assert_eq!(&grown.records()[..20], first.records());
    assert_eq!(&grown.vectors()[..20], first.vectors());
}

#[test]
fn interrupted_pass_resumes_from_checkpoint() {
    let (records, opener) = collection();
    let shared = Arc::new(MemoryStore::new());

    let crashing = Pipeline::new(Box::new(FlakyStore::new(shared.clone(), 2)), 4);
    let err = crashing
        .encode_collection(&encoder(), &opener, &records[..10], false)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Store(StoreError::Io(_))));
    assert_eq!(shared.load().unwrap().unwrap().len(), 4);

    let before = opener.opens();
    let resumed = Pipeline::new(Box::new(FlakyStore::new(shared.clone(), usize::MAX)), 4);
    let (snapshot, summary) = resumed
        .encode_collection(&encoder(), &opener, &records[..10], false)
        .unwrap();
    assert_eq!(summary.cached, 4);
    assert_eq!(summary.embedded, 6);
    assert_eq!(opener.opens() - before, 6);
    assert_eq!(snapshot.len(), 10);
}

#[test]
fn force_recomputes_everything() {
    let (records, opener) = collection();
    let pipeline = memory_pipeline(25);
    pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();
    let (snapshot, summary) = pipeline
        .encode_collection(&encoder(), &opener, &records, true)
        .unwrap();
    assert_eq!(summary.cached, 0);
    assert_eq!(summary.embedded, 3 * PER_GROUP);
    assert_eq!(snapshot.len(), 3 * PER_GROUP);
}

#[test]
fn duplicate_identities_are_encoded_once() {
    let (records, opener) = collection();
    let mut doubled = records[..3].to_vec();
    doubled.push(records[0].clone());
    let pipeline = memory_pipeline(25);
    let (snapshot, summary) = pipeline
        .encode_collection(&encoder(), &opener, &doubled, false)
        .unwrap();
    assert_eq!(summary.duplicates, 1);
    assert_eq!(snapshot.len(), 3);
}

// ---------------------------------------------------------------------------
// Cache file
// ---------------------------------------------------------------------------

#[test]
fn corrupt_cache_is_fatal_unless_forced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CACHE_FILE);
    std::fs::write(&path, b"\x00\x01garbage").unwrap();

    let (records, opener) = collection();
    let pipeline = Pipeline::new(Box::new(FileStore::new(&path)), 25);
    let err = pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Store(StoreError::Corrupt { .. })));

    let (snapshot, _) = pipeline
        .encode_collection(&encoder(), &opener, &records, true)
        .unwrap();
    assert_eq!(pipeline.load().unwrap(), snapshot);
}

#[test]
fn missing_cache_is_an_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        Box::new(FileStore::new(dir.path().join("cache").join(DEFAULT_CACHE_FILE))),
        25,
    );
    assert!(pipeline.load().unwrap().is_empty());

    let outcome = pipeline
        .cluster(&Capabilities::default().engine(params()))
        .unwrap();
    assert_eq!(outcome.report.summary.total_videos, 0);
    assert!(outcome.report.assignments().is_empty());
}

#[test]
fn reload_after_save_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join(DEFAULT_CACHE_FILE));
    let (records, opener) = collection();
    let pipeline = Pipeline::new(Box::new(store.clone()), 25);
    let (snapshot, _) = pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, snapshot);
    store.save(&loaded).unwrap();
    assert_eq!(store.load().unwrap().unwrap(), snapshot);
}

// ---------------------------------------------------------------------------
// Clustering
// ---------------------------------------------------------------------------

#[test]
fn clustering_labels_every_cached_video() {
    let (records, opener) = collection();
    let pipeline = memory_pipeline(25);
    pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();

    let outcome = pipeline
        .cluster(&Capabilities::default().engine(params()))
        .unwrap();
    assert!(outcome.run.labels.iter().all(|&l| l != NOISE));
    assert_eq!(outcome.report.summary.num_noise, 0);
    assert_eq!(outcome.report.summary.num_clusters, 3);
    for cluster in &outcome.report.clusters {
        let group = &cluster.members[0].source_group;
        assert!(
            cluster.members.iter().all(|m| &m.source_group == group),
            "cluster {} mixes source groups",
            cluster.id
        );
        assert_eq!(cluster.size, PER_GROUP);
    }

    let assignments = outcome.report.assignments();
    assert_eq!(assignments.len(), 3 * PER_GROUP);
    assert!(!assignments.contains_key(EMPTY_VIDEO));

    let channels = outcome.report.channel_config();
    assert_eq!(channels.total_videos(), 3 * PER_GROUP);
    assert!(channels
        .channels
        .iter()
        .all(|c| !c.videos.iter().any(|v| v == "empty.mp4")));

    assert_eq!(outcome.embedding_export().total_videos, 3 * PER_GROUP);
    let projection = outcome.projection_export().unwrap();
    assert_eq!(projection.videos.len(), 3 * PER_GROUP);
}

#[test]
fn repeated_clustering_gives_same_membership() {
    let (records, opener) = collection();
    let pipeline = memory_pipeline(25);
    pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();

    let engine = Capabilities::default().engine(params());
    let a = pipeline.cluster(&engine).unwrap();
    let b = pipeline.cluster(&engine).unwrap();
    assert_eq!(a.report.assignments(), b.report.assignments());
}

#[test]
fn unavailable_clustering_aborts() {
    let (records, opener) = collection();
    let pipeline = memory_pipeline(25);
    pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();

    let caps = Capabilities {
        clustering: Capability::Unavailable("not built".into()),
        ..Capabilities::default()
    };
    let err = pipeline.cluster(&caps.engine(params())).unwrap_err();
    assert!(matches!(err, PipelineError::Cluster(ClusterError::Unavailable(_))));
}

#[test]
fn unavailable_projection_is_explicit() {
    let (records, opener) = collection();
    let pipeline = memory_pipeline(25);
    pipeline
        .encode_collection(&encoder(), &opener, &records, false)
        .unwrap();

    let caps = Capabilities {
        projection: Capability::Unavailable("headless".into()),
        ..Capabilities::default()
    };
    let outcome = pipeline.cluster(&caps.engine(params())).unwrap();
    assert_eq!(outcome.report.assignments().len(), 3 * PER_GROUP);
    let err = outcome.projection_export().unwrap_err();
    assert!(matches!(err, PipelineError::Cluster(ClusterError::Unavailable(_))));
}
