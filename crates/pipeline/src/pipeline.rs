//! The product pipeline: search, filter, download, decode, render.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use archive::{Archive, CandidateProduct};
use chrono::{DateTime, Utc};
use decoder::{DecodeRequest, ResampledScene, SceneDecoder};
use renderer::{render, resize_to_width, write_jpeg, write_npy, RawArray, RenderMode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::download::{DownloadConfig, DownloadManager};
use crate::error::{ConfigError, ConfigResult, EntryError, EntryResult, PipelineError, PipelineResult};
use crate::family::ProductLayout;
use crate::naming::{output_file_name, OutputKind};
use crate::plan::RunPlan;
use crate::resume::OutputIndex;
use crate::scratch::{ScratchSpace, ScratchUnit};

/// What a work unit produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    /// 8-bit JPEG, optionally resized to `width`
    Rendered {
        mode: RenderMode,
        width: Option<usize>,
        quality: u8,
    },
    /// Float `.npy`, never resized
    Raw,
}

impl OutputMode {
    fn kind(&self) -> OutputKind {
        match self {
            Self::Rendered { .. } => OutputKind::Jpeg,
            Self::Raw => OutputKind::Npy,
        }
    }
}

/// Entries of one product that are decoded together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub entries: Vec<String>,
}

/// Counters of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub products: usize,
    pub units: usize,
    pub produced: usize,
    pub skipped_existing: usize,
    pub skipped_illumination: usize,
    pub failed: usize,
    pub cancelled: bool,
}

#[derive(Debug)]
enum UnitOutcome {
    Produced { path: PathBuf, stem: String },
    SkippedExisting,
    SkippedIllumination,
}

pub struct ProductPipeline {
    plan: RunPlan,
    archive: Arc<dyn Archive>,
    decoder: Arc<dyn SceneDecoder>,
    downloads: DownloadManager,
    output: OutputMode,
    output_dir: PathBuf,
    scratch: ScratchSpace,
}

impl ProductPipeline {
    pub fn new(
        plan: RunPlan,
        archive: Arc<dyn Archive>,
        decoder: Arc<dyn SceneDecoder>,
        output: OutputMode,
        output_dir: impl Into<PathBuf>,
        scratch: ScratchSpace,
        download: DownloadConfig,
    ) -> ConfigResult<Self> {
        if let OutputMode::Rendered { mode, width, .. } = output {
            mode.validate()?;
            if width == Some(0) {
                return Err(ConfigError::Render(renderer::RenderError::InvalidMode(
                    "output width must be positive".to_string(),
                )));
            }
        }
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|source| ConfigError::Io {
            path: output_dir.clone(),
            source,
        })?;

        Ok(Self {
            downloads: DownloadManager::new(archive.clone(), download),
            plan,
            archive,
            decoder,
            output,
            output_dir,
            scratch,
        })
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Run until every work unit is handled or `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) -> PipelineResult<RunSummary> {
        let mut index = OutputIndex::scan(&self.output_dir, &self.plan.family.output_tag).map_err(|source| {
            ConfigError::Io {
                path: self.output_dir.clone(),
                source,
            }
        })?;
        self.scratch.sweep();

        let window = self.plan.window.resolve(Utc::now());
        let limit = self.plan.window.is_latest().then_some(1);
        info!(
            collection = %self.plan.family.collection_id,
            start = %window.start,
            end = %window.end,
            limit = ?limit,
            "Searching archive"
        );

        let mut products = self
            .archive
            .search(&window, limit)
            .await
            .map_err(PipelineError::Discovery)?;
        info!(count = products.len(), "Products found");
        if let Some(limit) = limit {
            products.truncate(limit);
        }

        let mut summary = RunSummary::default();
        'products: for product in &products {
            summary.products += 1;
            for unit in self.work_units(product) {
                if cancel.is_cancelled() {
                    summary.cancelled = true;
                    break 'products;
                }
                summary.units += 1;

                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        warn!(product = %product.product_id, "Run cancelled during work unit");
                        summary.cancelled = true;
                        break 'products;
                    }
                    outcome = self.process_unit(product, &unit, &index) => outcome,
                };

                match outcome {
                    Ok(UnitOutcome::Produced { path, stem }) => {
                        info!(path = %path.display(), "Output written");
                        index.insert(&stem);
                        summary.produced += 1;
                    }
                    Ok(UnitOutcome::SkippedExisting) => summary.skipped_existing += 1,
                    Ok(UnitOutcome::SkippedIllumination) => summary.skipped_illumination += 1,
                    Err(e) => {
                        error!(
                            product = %product.product_id,
                            entries = ?unit.entries,
                            error = %e,
                            "Work unit failed"
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        info!(
            products = summary.products,
            units = summary.units,
            produced = summary.produced,
            skipped_existing = summary.skipped_existing,
            skipped_illumination = summary.skipped_illumination,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Run complete"
        );
        Ok(summary)
    }

    /// Split a product into work units according to the family layout.
    pub fn work_units(&self, product: &CandidateProduct) -> Vec<WorkUnit> {
        let units = match &self.plan.family.layout {
            ProductLayout::Chunked => {
                let suffixes: Vec<String> = self.plan.chunks.iter().map(|c| format!("_{c}.nc")).collect();
                let entries: Vec<String> = product
                    .entries
                    .iter()
                    .filter(|e| suffixes.iter().any(|s| e.contains(s.as_str())))
                    .cloned()
                    .collect();
                if entries.is_empty() {
                    Vec::new()
                } else {
                    vec![WorkUnit { entries }]
                }
            }
            ProductLayout::FullDisk { extension } => {
                let extension = extension.to_lowercase();
                product
                    .entries
                    .iter()
                    .filter(|e| e.to_lowercase().ends_with(&extension))
                    .map(|e| WorkUnit { entries: vec![e.clone()] })
                    .collect()
            }
        };
        if units.is_empty() {
            debug!(product = %product.product_id, "No relevant entries in product");
        }
        units
    }

    async fn process_unit(
        &self,
        product: &CandidateProduct,
        unit: &WorkUnit,
        index: &OutputIndex,
    ) -> EntryResult<UnitOutcome> {
        let (entries, timestamp) = self.parse_timestamps(product, unit)?;
        let channel = &self.plan.channel.name;

        if index.contains(channel, timestamp) {
            info!(channel = %channel, timestamp = %timestamp, "Output already exists, skipping");
            return Ok(UnitOutcome::SkippedExisting);
        }

        let decision = self.plan.gate.evaluate(timestamp)?;
        if !decision.keep {
            info!(
                timestamp = %timestamp,
                elevation = ?decision.elevation_degrees,
                threshold = ?self.plan.gate.threshold(),
                "Sun below threshold, skipping"
            );
            return Ok(UnitOutcome::SkippedIllumination);
        }

        let scratch = self.scratch.create_unit().map_err(EntryError::Scratch)?;
        let result = self.produce(product, &entries, timestamp, &scratch).await;
        scratch.close_logged();
        result
    }

    /// Parseable entries of a unit and the earliest of their timestamps.
    fn parse_timestamps(&self, product: &CandidateProduct, unit: &WorkUnit) -> EntryResult<(Vec<String>, DateTime<Utc>)> {
        let pattern = &self.plan.family.timestamp;
        let mut parsed = Vec::with_capacity(unit.entries.len());
        let mut first_error = None;

        for entry in &unit.entries {
            match pattern.parse(entry) {
                Ok(ts) => parsed.push((entry.clone(), ts)),
                Err(message) => {
                    let e = EntryError::TimestampParse {
                        entry: entry.clone(),
                        message,
                    };
                    warn!(entry = %entry, error = %e, "Dropping entry with unparseable timestamp");
                    first_error.get_or_insert(e);
                }
            }
        }

        let Some(earliest) = parsed.iter().map(|(_, ts)| *ts).min() else {
            return Err(match (unit.entries.len(), first_error) {
                (1, Some(e)) => e,
                _ => EntryError::NoTimestamp(product.product_id.clone()),
            });
        };
        Ok((parsed.into_iter().map(|(e, _)| e).collect(), earliest))
    }

    async fn produce(
        &self,
        product: &CandidateProduct,
        entries: &[String],
        timestamp: DateTime<Utc>,
        scratch: &ScratchUnit,
    ) -> EntryResult<UnitOutcome> {
        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            files.push(self.downloads.download(product, entry, scratch.path()).await?);
        }

        let request = DecodeRequest {
            files,
            bands: self.plan.channel.bands.clone(),
            reader_id: self.plan.family.reader_id.clone(),
            grid: self.plan.area.grid,
            work_dir: scratch.path().to_path_buf(),
        };
        let scene = self.decoder.decode(&request).await?;
        let array = assemble(scene, &self.plan.channel.bands)?;

        let name = output_file_name(
            &self.plan.channel.name,
            &self.plan.family.output_tag,
            &self.plan.area.canonical_name,
            timestamp,
            self.output.kind(),
        );
        let path = self.output_dir.join(&name);
        self.write_output(&array, &path)?;

        let stem = match name.rsplit_once('.') {
            Some((stem, _)) => stem.to_string(),
            None => name.clone(),
        };
        Ok(UnitOutcome::Produced { path, stem })
    }

    fn write_output(&self, array: &RawArray, path: &Path) -> EntryResult<()> {
        match self.output {
            OutputMode::Raw => write_npy(array, path)?,
            OutputMode::Rendered { mode, width, quality } => {
                let mut image = render(array, mode)?;
                if let Some(width) = width {
                    image = resize_to_width(&image, width)?;
                }
                write_jpeg(&image, path, quality)?;
            }
        }
        Ok(())
    }
}

/// One band → its array; three bands → stacked channel-last.
fn assemble(mut scene: ResampledScene, bands: &[String]) -> EntryResult<RawArray> {
    let mut arrays = Vec::with_capacity(bands.len());
    for band in bands {
        let array = scene.remove(band).ok_or_else(|| EntryError::MissingBand(band.clone()))?;
        arrays.push(array);
    }
    match arrays.len() {
        1 => Ok(arrays.remove(0)),
        _ => Ok(RawArray::stack(&arrays)?),
    }
}
