//! End-to-end pipeline runs against in-memory archive and decoder fakes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use archive::{Archive, ArchiveError, ArchiveResult, ByteStream, CandidateProduct};
use async_trait::async_trait;
use bytes::Bytes;
use decoder::{DecodeError, DecodeRequest, DecodeResult, ResampledScene, SceneDecoder};
use futures::StreamExt;
use image::GenericImageView;
use pipeline::{
    default_render_mode, plan, DownloadConfig, FamilyConfig, OutputMode, PipelineError, ProductPipeline,
    RunRequest, RunSummary, SatelliteFamily, ScratchSpace,
};
use region::RegionSpec;
use renderer::{read_npy, RawArray, DEFAULT_JPEG_QUALITY};
use sat_common::TimeWindow;
use tempfile::TempDir;
use test_utils::create_ramp;
use test_utils::fixtures::entries;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fakes
// ============================================================================

struct FakeArchive {
    products: Vec<CandidateProduct>,
    opens: AtomicUsize,
    limits: Mutex<Vec<Option<usize>>>,
    fail_search: bool,
}

impl FakeArchive {
    fn new(products: Vec<CandidateProduct>) -> Arc<Self> {
        Arc::new(Self {
            products,
            opens: AtomicUsize::new(0),
            limits: Mutex::new(Vec::new()),
            fail_search: false,
        })
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// The `limit` passed to each search call.
    fn search_limits(&self) -> Vec<Option<usize>> {
        self.limits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Archive for FakeArchive {
    async fn search(&self, _window: &TimeWindow, limit: Option<usize>) -> ArchiveResult<Vec<CandidateProduct>> {
        self.limits.lock().unwrap().push(limit);
        if self.fail_search {
            return Err(ArchiveError::Status {
                status: 500,
                url: "https://example.invalid/search".to_string(),
            });
        }
        let take = limit.unwrap_or(self.products.len());
        Ok(self.products.iter().take(take).cloned().collect())
    }

    async fn open(&self, _product: &CandidateProduct, entry: &str) -> ArchiveResult<ByteStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let body = Bytes::from(format!("contents of {entry}"));
        Ok(futures::stream::iter(vec![Ok(body)]).boxed())
    }
}

/// Fills every requested band with a ramp over the target grid.
#[derive(Default)]
struct FakeDecoder {
    requests: Mutex<Vec<DecodeRequest>>,
    fail: bool,
}

#[async_trait]
impl SceneDecoder for FakeDecoder {
    async fn decode(&self, request: &DecodeRequest) -> DecodeResult<ResampledScene> {
        for file in &request.files {
            assert!(file.exists(), "decoder got missing file {}", file.display());
            assert!(file.starts_with(&request.work_dir));
        }
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(DecodeError::Failed {
                program: "fake".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "reader exploded".to_string(),
            });
        }

        let (w, h) = (request.grid.width, request.grid.height);
        let mut scene = ResampledScene::new();
        for (i, band) in request.bands.iter().enumerate() {
            let data = create_ramp(w, h, 200.0 + i as f32, 300.0);
            scene.insert(band.clone(), RawArray::single(h, w, data).unwrap());
        }
        Ok(scene)
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Dirs {
    _root: TempDir,
    output: PathBuf,
    scratch: PathBuf,
}

fn dirs() -> Dirs {
    let root = tempfile::tempdir().unwrap();
    let output = root.path().join("imgs");
    let scratch = root.path().join("scratch");
    Dirs {
        output,
        scratch,
        _root: root,
    }
}

fn msg_product(id: &str, ts: &str) -> CandidateProduct {
    CandidateProduct {
        product_id: id.to_string(),
        collection_id: "EO:EUM:DAT:MSG:HRSEVIRI".to_string(),
        entries: vec![entries::msg_native(ts), "manifest.xml".to_string()],
    }
}

fn msg_request(sun_angle: Option<f64>) -> RunRequest {
    RunRequest {
        channel: None,
        region: RegionSpec::Named("spain".to_string()),
        base_pixels: Some(40),
        sun_angle,
        sun_lat: None,
        sun_lon: None,
        chunk_catalog: PathBuf::from("unused.wkt"),
        start: Some("2025-07-17T11:00:00".to_string()),
        end: Some("2025-07-17T13:00:00".to_string()),
    }
}

fn fast_downloads() -> DownloadConfig {
    DownloadConfig {
        max_retries: 1,
        initial_retry_delay: Duration::from_millis(1),
        max_retry_delay: Duration::from_millis(1),
    }
}

fn rendered(family: &FamilyConfig, request: &RunRequest) -> OutputMode {
    let channel = family
        .channel(request.channel.as_deref().unwrap_or(&family.default_channel))
        .unwrap();
    OutputMode::Rendered {
        mode: default_render_mode(channel),
        width: None,
        quality: DEFAULT_JPEG_QUALITY,
    }
}

async fn run(
    family: SatelliteFamily,
    request: &RunRequest,
    archive: Arc<FakeArchive>,
    decoder: Arc<FakeDecoder>,
    output: Option<OutputMode>,
    dirs: &Dirs,
) -> Result<RunSummary, PipelineError> {
    let config = FamilyConfig::builtin(family);
    let run_plan = plan(&config, request)?;
    let output = output.unwrap_or_else(|| rendered(&config, request));
    let pipeline = ProductPipeline::new(
        run_plan,
        archive,
        decoder,
        output,
        &dirs.output,
        ScratchSpace::new(&dirs.scratch).unwrap(),
        fast_downloads(),
    )?;
    pipeline.run(CancellationToken::new()).await
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_kept_product_writes_one_image() {
    let dirs = dirs();
    let archive = FakeArchive::new(vec![msg_product("P1", "20250717120000")]);
    let decoder = Arc::new(FakeDecoder::default());

    let summary = run(SatelliteFamily::Msg, &msg_request(Some(10.0)), archive.clone(), decoder.clone(), None, &dirs)
        .await
        .unwrap();

    assert_eq!(summary.produced, 1);
    assert_eq!(summary.units, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(archive.opens(), 1);
    assert_eq!(archive.search_limits(), vec![None]);
    assert_eq!(dir_entries(&dirs.output), vec!["hrv_MSG_HRSEVIRI_spain_20250717T120000.jpg"]);
    assert!(dir_entries(&dirs.scratch).is_empty());

    let decoded = image::open(dirs.output.join("hrv_MSG_HRSEVIRI_spain_20250717T120000.jpg")).unwrap();
    assert_eq!(decoded.width(), 40);

    let requests = decoder.requests.lock().unwrap();
    assert_eq!(requests[0].reader_id, "seviri_l1b_native");
    assert_eq!(requests[0].bands, vec!["HRV"]);
}

#[tokio::test]
async fn test_dark_product_is_skipped_without_download() {
    let dirs = dirs();
    let archive = FakeArchive::new(vec![msg_product("P1", "20250717120000")]);
    let decoder = Arc::new(FakeDecoder::default());

    let summary = run(SatelliteFamily::Msg, &msg_request(Some(90.0)), archive.clone(), decoder, None, &dirs)
        .await
        .unwrap();

    assert_eq!(summary.skipped_illumination, 1);
    assert_eq!(summary.produced, 0);
    assert_eq!(archive.opens(), 0);
    assert!(dir_entries(&dirs.output).is_empty());
    assert!(dir_entries(&dirs.scratch).is_empty());
}

#[tokio::test]
async fn test_second_run_downloads_nothing() {
    let dirs = dirs();
    let products = vec![msg_product("P1", "20250717120000"), msg_product("P2", "20250717121500")];
    let request = msg_request(None);

    let first = FakeArchive::new(products.clone());
    let summary = run(SatelliteFamily::Msg, &request, first.clone(), Arc::default(), None, &dirs)
        .await
        .unwrap();
    assert_eq!(summary.produced, 2);
    let files = dir_entries(&dirs.output);
    let bytes: Vec<Vec<u8>> = files.iter().map(|f| std::fs::read(dirs.output.join(f)).unwrap()).collect();

    let second = FakeArchive::new(products);
    let summary = run(SatelliteFamily::Msg, &request, second.clone(), Arc::default(), None, &dirs)
        .await
        .unwrap();
    assert_eq!(summary.skipped_existing, 2);
    assert_eq!(summary.produced, 0);
    assert_eq!(second.opens(), 0);
    assert_eq!(dir_entries(&dirs.output), files);
    for (f, b) in files.iter().zip(bytes) {
        assert_eq!(std::fs::read(dirs.output.join(f)).unwrap(), b);
    }
}

#[tokio::test]
async fn test_existing_output_for_another_region_is_skipped() {
    let dirs = dirs();
    std::fs::create_dir_all(&dirs.output).unwrap();
    std::fs::write(dirs.output.join("hrv_MSG_HRSEVIRI_france_20250717T120000.jpg"), b"old").unwrap();
    let archive = FakeArchive::new(vec![msg_product("P1", "20250717120000")]);

    let summary = run(SatelliteFamily::Msg, &msg_request(None), archive.clone(), Arc::default(), None, &dirs)
        .await
        .unwrap();
    assert_eq!(summary.skipped_existing, 1);
    assert_eq!(archive.opens(), 0);
}

#[tokio::test]
async fn test_unparseable_timestamp_does_not_stop_run() {
    let dirs = dirs();
    let bad = CandidateProduct {
        product_id: "BAD".to_string(),
        collection_id: "EO:EUM:DAT:MSG:HRSEVIRI".to_string(),
        entries: vec!["MSG3-SEVI-MSG15-0100-NA-garbage.nat".to_string()],
    };
    let archive = FakeArchive::new(vec![bad, msg_product("P2", "20250717121500")]);

    let summary = run(SatelliteFamily::Msg, &msg_request(None), archive.clone(), Arc::default(), None, &dirs)
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.produced, 1);
    assert_eq!(archive.opens(), 1);
}

#[tokio::test]
async fn test_latest_mode_processes_first_product_only() {
    let dirs = dirs();
    let archive = FakeArchive::new(vec![msg_product("P1", "20250717121500"), msg_product("P2", "20250717120000")]);
    let mut request = msg_request(None);
    request.start = None;
    request.end = None;

    let summary = run(SatelliteFamily::Msg, &request, archive.clone(), Arc::default(), None, &dirs)
        .await
        .unwrap();
    assert_eq!(summary.products, 1);
    assert_eq!(summary.produced, 1);
    assert_eq!(archive.search_limits(), vec![Some(1)]);
    assert_eq!(dir_entries(&dirs.output), vec!["hrv_MSG_HRSEVIRI_spain_20250717T121500.jpg"]);
}

#[tokio::test]
async fn test_raw_mode_writes_npy() {
    let dirs = dirs();
    let archive = FakeArchive::new(vec![msg_product("P1", "20250717120000")]);
    let mut request = msg_request(None);
    request.channel = Some("rgb".to_string());

    let summary = run(SatelliteFamily::Msg, &request, archive, Arc::default(), Some(OutputMode::Raw), &dirs)
        .await
        .unwrap();
    assert_eq!(summary.produced, 1);

    let path = dirs.output.join("rgb_MSG_HRSEVIRI_spain_20250717T120000.npy");
    let array = read_npy(&path).unwrap();
    assert_eq!(array.channels, 3);
    assert_eq!(array.width, 40);
}

#[tokio::test]
async fn test_chunked_product_decodes_selected_chunks_together() {
    let dirs = dirs();
    let ts = "20250717120000";
    let product = CandidateProduct {
        product_id: "MTG1".to_string(),
        collection_id: "EO:EUM:DAT:0665".to_string(),
        entries: vec![
            entries::mtg_chunk(ts, "0033"),
            entries::mtg_chunk(ts, "0034"),
            entries::mtg_chunk(ts, "0035"),
            entries::mtg_trailer(ts),
        ],
    };
    let archive = FakeArchive::new(vec![product]);
    let decoder = Arc::new(FakeDecoder::default());
    let request = RunRequest {
        region: RegionSpec::Named("mallorca".to_string()),
        base_pixels: Some(30),
        ..msg_request(None)
    };

    let summary = run(SatelliteFamily::Mtg, &request, archive.clone(), decoder.clone(), None, &dirs)
        .await
        .unwrap();
    assert_eq!(summary.units, 1);
    assert_eq!(summary.produced, 1);
    assert_eq!(archive.opens(), 2);
    assert_eq!(dir_entries(&dirs.output), vec!["vis_06_MTG_FCI_mallorca_20250717T120000.jpg"]);

    let requests = decoder.requests.lock().unwrap();
    let names: Vec<String> = requests[0]
        .files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![entries::mtg_chunk(ts, "0034"), entries::mtg_chunk(ts, "0035")]);
    assert_eq!(requests[0].reader_id, "fci_l1c_nc");
}

#[tokio::test]
async fn test_decode_failure_cleans_scratch() {
    let dirs = dirs();
    let archive = FakeArchive::new(vec![msg_product("P1", "20250717120000")]);
    let decoder = Arc::new(FakeDecoder {
        fail: true,
        ..FakeDecoder::default()
    });

    let summary = run(SatelliteFamily::Msg, &msg_request(None), archive, decoder, None, &dirs)
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);
    assert!(dir_entries(&dirs.output).is_empty());
    assert!(dir_entries(&dirs.scratch).is_empty());
}

#[tokio::test]
async fn test_search_failure_is_fatal() {
    let dirs = dirs();
    let archive = Arc::new(FakeArchive {
        products: Vec::new(),
        opens: AtomicUsize::new(0),
        limits: Mutex::new(Vec::new()),
        fail_search: true,
    });

    let result = run(SatelliteFamily::Msg, &msg_request(None), archive, Arc::default(), None, &dirs).await;
    assert!(matches!(result, Err(PipelineError::Discovery(_))));
}

#[tokio::test]
async fn test_stale_scratch_is_swept_before_search() {
    let dirs = dirs();
    std::fs::create_dir_all(dirs.scratch.join("unit-leftover")).unwrap();
    let archive = Arc::new(FakeArchive {
        products: Vec::new(),
        opens: AtomicUsize::new(0),
        limits: Mutex::new(Vec::new()),
        fail_search: true,
    });

    let result = run(SatelliteFamily::Msg, &msg_request(None), archive, Arc::default(), None, &dirs).await;
    assert!(matches!(result, Err(PipelineError::Discovery(_))));
    assert!(dir_entries(&dirs.scratch).is_empty());
}

#[tokio::test]
async fn test_unreadable_output_dir_fails_before_search() {
    let dirs = dirs();
    let archive = FakeArchive::new(vec![msg_product("P1", "20250717120000")]);
    let config = FamilyConfig::builtin(SatelliteFamily::Msg);
    let request = msg_request(None);
    let pipeline = ProductPipeline::new(
        plan(&config, &request).unwrap(),
        archive.clone(),
        Arc::new(FakeDecoder::default()),
        rendered(&config, &request),
        &dirs.output,
        ScratchSpace::new(&dirs.scratch).unwrap(),
        fast_downloads(),
    )
    .unwrap();
    // replace the output directory with a plain file
    std::fs::remove_dir_all(&dirs.output).unwrap();
    std::fs::write(&dirs.output, b"not a directory").unwrap();

    let result = pipeline.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(PipelineError::Config(_))));
    assert!(archive.search_limits().is_empty());
}

#[tokio::test]
async fn test_stale_scratch_is_swept() {
    let dirs = dirs();
    std::fs::create_dir_all(dirs.scratch.join("unit-leftover")).unwrap();
    let archive = FakeArchive::new(Vec::new());

    run(SatelliteFamily::Msg, &msg_request(None), archive, Arc::default(), None, &dirs)
        .await
        .unwrap();
    assert!(dir_entries(&dirs.scratch).is_empty());
}

#[tokio::test]
async fn test_cancelled_run_stops_before_first_unit() {
    let dirs = dirs();
    let config = FamilyConfig::builtin(SatelliteFamily::Msg);
    let request = msg_request(None);
    let archive = FakeArchive::new(vec![msg_product("P1", "20250717120000")]);
    let pipeline = ProductPipeline::new(
        plan(&config, &request).unwrap(),
        archive.clone(),
        Arc::new(FakeDecoder::default()),
        rendered(&config, &request),
        &dirs.output,
        ScratchSpace::new(&dirs.scratch).unwrap(),
        fast_downloads(),
    )
    .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = pipeline.run(cancel).await.unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.units, 0);
    assert_eq!(archive.opens(), 0);
}
