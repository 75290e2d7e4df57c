//! OpenCL device dispatch pipeline for the edgebench edge-filter benchmark.
//!
//! Runs one edge-detection kernel on every OpenCL device the runtime reports
//! and times it against the host reference filter.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator<B: ComputeBackend>
//!     ├── reference filter (edgebench-core, once)
//!     └── per device: ComputeDevice -> DeviceSession
//!             ├── transfer  (upload_input / allocate_output / download)
//!             ├── sizing    (local + global work sizes)
//!             ├── program   (load_and_build)
//!             └── dispatch  (run_once: enqueue, wait, profile, read back)
//! ```
//!
//! The OpenCL implementation of the backend traits lives behind the `opencl`
//! feature (on by default). Everything else is backend-agnostic.
//!
//! # Example
//!
//! ```ignore
//! use edgebench_compute::{Orchestrator, OpenClBackend, RunConfig};
//!
//! let orchestrator = Orchestrator::new(OpenClBackend::new(), RunConfig::from_env()?);
//! let report = orchestrator.run("photo.png".as_ref())?;
//! println!("{} devices succeeded", report.summary().succeeded);
//! ```

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod orchestrator;
pub mod program;
pub mod registry;
pub mod report;
pub mod sampler;
pub mod sizing;
pub mod transfer;

pub use backend::{ComputeBackend, ComputeDevice, DeviceSession, ImageHandle};
#[cfg(feature = "opencl")]
pub use backend::{OpenClBackend, OpenClDevice, OpenClImage, OpenClProgram, OpenClSession};
pub use config::RunConfig;
pub use dispatch::{run_once, ProfilingResult};
pub use orchestrator::{device_output_path, output_file_name, Orchestrator, Progress};
pub use program::{load_and_build, KernelSource};
pub use registry::{supports_images, DeviceInfo, DeviceKind, DeviceLimits, HostInfo, PlatformInfo};
pub use report::{DeviceOutcome, DeviceReport, ReferenceReport, RunReport, Stage, Summary};
pub use sampler::{AddressingMode, FilterMode, SamplerConfig};
pub use sizing::{compute_local_size, round_up, work_sizes, WorkSizes};

use std::path::PathBuf;

use edgebench_core::CoreError;
use thiserror::Error;

/// Device pipeline errors.
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("device does not support images: {0}")]
    Capability(String),

    #[error("failed to create execution context: {0}")]
    Context(String),

    #[error("device memory error: {0}")]
    DeviceMemory(String),

    #[error("kernel program failed to build:\n{log}")]
    Compile { log: String },

    #[error("dispatch failed: {0}")]
    Dispatch(String),

    #[error("failed to read kernel source {path}: {source}")]
    KernelSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Invalid dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ComputeResult<T> = Result<T, ComputeError>;
