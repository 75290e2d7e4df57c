//! Benchmark orchestrator.
//!
//! Runs the reference filter once, then walks every device the backend
//! reports, one at a time:
//!
//! ```text
//! DISCOVERED -> CONTEXT_CREATED -> IMAGE_SUPPORT_CHECKED -+-> SKIPPED
//!                                                         |
//!     UPLOADED -> PROGRAM_BUILT -> DISPATCHED -> READ_BACK -> SAVED
//! ```
//!
//! The output directory is created if missing. A device that fails at any
//! step is recorded and the loop moves on. Only problems that would hit
//! every device (unreadable input, missing kernel file, bad configuration,
//! an output directory that cannot be created) abort the run.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use edgebench_core::{codec, find_edges, CoreError, HostImage};
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

use crate::backend::{ComputeBackend, ComputeDevice, DeviceSession};
use crate::config::RunConfig;
use crate::dispatch::run_once;
use crate::program::{load_and_build, KernelSource};
use crate::registry::{supports_images, DeviceKind, HostInfo};
use crate::report::{DeviceOutcome, DeviceReport, ReferenceReport, RunReport, Stage};
use crate::sizing::{work_sizes, WorkSizes};
use crate::transfer;
use crate::{ComputeError, ComputeResult};

/// Tag used for the host reference output file.
pub const REFERENCE_TAG: &str = "REFERENCE";

/// Intermediate results, reported as soon as they are known.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// Reference filter finished and was saved.
    Reference(&'a ReferenceReport),
    /// One device attempt finished.
    Device(&'a DeviceReport),
}

/// Where and why a device attempt stopped.
struct Failure {
    stage: Stage,
    error: ComputeError,
    work_sizes: Option<WorkSizes>,
}

impl Failure {
    fn at(stage: Stage) -> impl FnOnce(ComputeError) -> Self {
        move |error| Self { stage, error, work_sizes: None }
    }
}

/// Drives one benchmark run over every device of a backend.
pub struct Orchestrator<B: ComputeBackend> {
    backend: B,
    config: RunConfig,
}

impl<B: ComputeBackend> Orchestrator<B> {
    pub fn new(backend: B, config: RunConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Loads `input` and the configured kernel, then runs everything.
    pub fn run(&self, input: &Path) -> ComputeResult<RunReport> {
        self.run_with_progress(input, |_| {})
    }

    /// Like [`run`](Self::run), calling `progress` after the reference run
    /// and after each device.
    pub fn run_with_progress<F>(&self, input: &Path, progress: F) -> ComputeResult<RunReport>
    where
        F: FnMut(Progress<'_>),
    {
        self.config.validate()?;
        for warning in self.config.warnings() {
            warn!("{warning}");
        }
        let image = codec::load(input)?;
        let source = KernelSource::from_file(&self.config.kernel_path, &self.config.entry_point)?;
        self.run_with(input, &image, &source, progress)
    }

    /// Runs with an already decoded image and kernel source.
    ///
    /// `input` only names the output files.
    pub fn run_with<F>(
        &self,
        input: &Path,
        image: &HostImage,
        source: &KernelSource,
        mut progress: F,
    ) -> ComputeResult<RunReport>
    where
        F: FnMut(Progress<'_>),
    {
        let file_name = input
            .file_name()
            .ok_or_else(|| ComputeError::Config(format!("input has no file name: {}", input.display())))?;
        let (width, height) = image.dimensions();
        info!(input = %input.display(), width, height, backend = self.backend.name(), "starting run");

        let reference = self.run_reference(image, file_name)?;
        progress(Progress::Reference(&reference));

        let mut devices = Vec::new();
        for device in self.backend.enumerate() {
            let report = self.run_device(&device, image, source, file_name);
            progress(Progress::Device(&report));
            devices.push(report);
        }

        let report = RunReport {
            input: input.to_path_buf(),
            width,
            height,
            host: HostInfo::detect(),
            reference,
            devices,
        };
        let summary = report.summary();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "run complete"
        );
        Ok(report)
    }

    fn run_reference(&self, image: &HostImage, file_name: &OsStr) -> ComputeResult<ReferenceReport> {
        let start = Instant::now();
        let filtered = find_edges(image);
        let elapsed_secs = start.elapsed().as_secs_f64();

        fs::create_dir_all(&self.config.output_dir).map_err(CoreError::from)?;
        let output = self.config.output_dir.join(output_file_name(REFERENCE_TAG, file_name));
        codec::save(&output, &filtered)?;
        info!(elapsed_secs, output = %output.display(), "reference filter done");

        Ok(ReferenceReport { elapsed_secs, output })
    }

    fn run_device(
        &self,
        device: &B::Device,
        image: &HostImage,
        source: &KernelSource,
        file_name: &OsStr,
    ) -> DeviceReport {
        let info = device.info();
        info!(platform = %device.platform().name, device = %info.name, kind = %info.kind, "device");

        let start = Instant::now();
        let outcome = match self.attempt(device, image, source, file_name) {
            Ok(outcome) => outcome,
            Err(Failure { stage, error, work_sizes }) => {
                warn!(device = %info.name, %stage, %error, "device failed");
                DeviceOutcome::Failed { stage, error: error.to_string(), work_sizes }
            }
        };
        let wall_secs = start.elapsed().as_secs_f64();

        DeviceReport {
            platform: device.platform().clone(),
            device: info.clone(),
            outcome,
            wall_secs,
        }
    }

    fn attempt(
        &self,
        device: &B::Device,
        image: &HostImage,
        source: &KernelSource,
        file_name: &OsStr,
    ) -> Result<DeviceOutcome, Failure> {
        let session = device
            .open_session(&self.config.sampler)
            .map_err(Failure::at(Stage::CreateContext))?;

        let info = session.device();
        if !supports_images(info) {
            info!(device = %info.name, "no image support, skipping");
            return Ok(DeviceOutcome::Skipped { reason: "device does not support images".into() });
        }

        let (width, height) = image.dimensions();
        let input = transfer::upload_input(&session, image).map_err(Failure::at(Stage::Upload))?;
        let output = transfer::allocate_output(&session, width, height).map_err(Failure::at(Stage::Upload))?;

        let program = load_and_build(&session, source).map_err(Failure::at(Stage::BuildProgram))?;

        let sizes = work_sizes(info.kind, &info.limits(), width, height);
        info!(device = %info.name, local = ?sizes.local, global = ?sizes.global, "work sizes");

        let (timing, pixels) = run_once(&session, &program, &sizes, &input, &output, width, height)
            .map_err(|error| Failure { stage: Stage::Dispatch, error, work_sizes: Some(sizes) })?;

        let path = device_output_path(&self.config.output_dir, info.kind, file_name);
        codec::save_rgba8(&path, &pixels, width, height)
            .map_err(|e| Failure::at(Stage::Save)(ComputeError::from(e)))?;

        let kernel_secs = timing.elapsed_secs();
        info!(device = %info.name, kernel_secs, output = %path.display(), "device done");
        Ok(DeviceOutcome::Success { output: path, work_sizes: sizes, kernel_secs })
    }
}

/// `"(" + tag + ")" + name`, e.g. `(GPU)photo.png`.
pub fn output_file_name(tag: &str, name: &OsStr) -> OsString {
    let mut out = OsString::with_capacity(tag.len() + name.len() + 2);
    out.push("(");
    out.push(tag);
    out.push(")");
    out.push(name);
    out
}

/// Output path for a device of `kind` processing an input named `name`.
pub fn device_output_path(dir: &Path, kind: DeviceKind, name: &OsStr) -> PathBuf {
    dir.join(output_file_name(kind.as_str(), name))
}
