//! External-program decoder.
//!
//! Invocation:
//!
//! ```text
//! {program} --reader R --bands a,b --area lon_min,lat_min,lon_max,lat_max \
//!           --width W --height H --output DIR FILE...
//! ```
//!
//! The program must write `DIR/{band}.npy` for every requested band.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use renderer::read_npy;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::{DecodeError, DecodeRequest, DecodeResult, ResampledScene, SceneDecoder};

/// Runs a decode+resample program as a subprocess.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    program: PathBuf,
}

impl CommandDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Argument list for a request writing into `output_dir`.
    pub fn build_args(request: &DecodeRequest, output_dir: &Path) -> Vec<OsString> {
        let b = request.grid.bbox;
        let mut args: Vec<OsString> = vec![
            "--reader".into(),
            request.reader_id.clone().into(),
            "--bands".into(),
            request.bands.join(",").into(),
            "--area".into(),
            format!("{},{},{},{}", b.lon_min, b.lat_min, b.lon_max, b.lat_max).into(),
            "--width".into(),
            request.grid.width.to_string().into(),
            "--height".into(),
            request.grid.height.to_string().into(),
            "--output".into(),
            output_dir.as_os_str().to_owned(),
        ];
        args.extend(request.files.iter().map(|f| f.as_os_str().to_owned()));
        args
    }
}

#[async_trait]
impl SceneDecoder for CommandDecoder {
    #[instrument(skip(self, request), fields(reader = %request.reader_id, bands = ?request.bands))]
    async fn decode(&self, request: &DecodeRequest) -> DecodeResult<ResampledScene> {
        if request.files.is_empty() {
            return Err(DecodeError::EmptyRequest("no input files".to_string()));
        }
        if request.bands.is_empty() {
            return Err(DecodeError::EmptyRequest("no bands requested".to_string()));
        }

        let output_dir = request.work_dir.join("decoded");
        tokio::fs::create_dir_all(&output_dir).await?;

        let program = self.program.display().to_string();
        debug!(program = %program, files = request.files.len(), "Running decoder");

        let output = Command::new(&self.program)
            .args(Self::build_args(request, &output_dir))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DecodeError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DecodeError::Failed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut scene = ResampledScene::new();
        for band in &request.bands {
            let path = output_dir.join(format!("{band}.npy"));
            if !path.exists() {
                return Err(DecodeError::MissingBand {
                    band: band.clone(),
                    path,
                });
            }
            let array = read_npy(&path).map_err(|source| DecodeError::ReadBand {
                band: band.clone(),
                source,
            })?;
            if array.width != request.grid.width || array.height != request.grid.height {
                return Err(DecodeError::GridMismatch {
                    band: band.clone(),
                    width: request.grid.width,
                    height: request.grid.height,
                    actual_width: array.width,
                    actual_height: array.height,
                });
            }
            scene.insert(band.clone(), array);
        }

        info!(bands = scene.len(), "Decoded scene");
        Ok(scene)
    }
}
