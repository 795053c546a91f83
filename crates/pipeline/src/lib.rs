//! Satellite product pipeline.
//!
//! Plans a run from user inputs, then for each product found in the
//! archive: parses the sensing time, skips what already exists or is too
//! dark, downloads into a scratch directory, decodes onto the target grid
//! and writes a JPEG or raw `.npy` file.

pub mod config;
pub mod download;
pub mod error;
pub mod family;
pub mod naming;
pub mod pipeline;
pub mod plan;
pub mod resume;
pub mod scratch;
pub mod timestamp;

pub use config::{FamilyOverride, FamilyRegistry};
pub use download::{DownloadConfig, DownloadManager};
pub use error::{CleanupError, ConfigError, ConfigResult, EntryError, EntryResult, PipelineError, PipelineResult};
pub use family::{ChannelSpec, DefaultSizing, FamilyConfig, ProductLayout, SatelliteFamily};
pub use naming::{output_file_name, resume_key, OutputKind};
pub use pipeline::{OutputMode, ProductPipeline, RunSummary, WorkUnit};
pub use plan::{default_render_mode, plan, plan_routed, RunPlan, RunRequest, WindowMode};
pub use resume::OutputIndex;
pub use scratch::{ScratchSpace, ScratchUnit};
pub use timestamp::TimestampPattern;
