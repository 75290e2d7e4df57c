//! Run configuration.
//!
//! Defaults, overlaid by environment variables, overlaid by whatever the
//! caller (the CLI) sets explicitly.
//!
//! # Environment Variables
//!
//! - `EDGEBENCH_KERNEL` - Kernel source file
//! - `EDGEBENCH_ENTRY` - Kernel entry point name
//! - `EDGEBENCH_OUTPUT_DIR` - Directory for output images
//! - `EDGEBENCH_ADDRESSING` - Sampler addressing: none, clamp-to-edge, clamp, repeat
//! - `EDGEBENCH_FILTER` - Sampler filter: nearest, linear
//! - `EDGEBENCH_NORMALIZED` - Normalized sampler coordinates ("1" or "true")

use std::env;
use std::path::PathBuf;

use crate::program::{DEFAULT_ENTRY_POINT, DEFAULT_KERNEL_PATH};
use crate::sampler::SamplerConfig;
use crate::ComputeResult;

/// Settings for one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Kernel program text file.
    pub kernel_path: PathBuf,
    /// Entry point invoked on every device.
    pub entry_point: String,
    /// Where output images are written.
    pub output_dir: PathBuf,
    /// Sampler passed to the kernel.
    pub sampler: SamplerConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            kernel_path: PathBuf::from(DEFAULT_KERNEL_PATH),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            output_dir: PathBuf::from("."),
            sampler: SamplerConfig::default(),
        }
    }
}

impl RunConfig {
    /// Defaults with process environment overrides applied.
    pub fn from_env() -> ComputeResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults with overrides from `lookup(name)`.
    pub fn from_lookup<F>(lookup: F) -> ComputeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(path) = lookup("EDGEBENCH_KERNEL") {
            cfg.kernel_path = PathBuf::from(path);
        }
        if let Some(entry) = lookup("EDGEBENCH_ENTRY").filter(|e| !e.is_empty()) {
            cfg.entry_point = entry;
        }
        if let Some(dir) = lookup("EDGEBENCH_OUTPUT_DIR") {
            cfg.output_dir = PathBuf::from(dir);
        }
        if let Some(mode) = lookup("EDGEBENCH_ADDRESSING") {
            cfg.sampler.addressing = mode.parse()?;
        }
        if let Some(mode) = lookup("EDGEBENCH_FILTER") {
            cfg.sampler.filter = mode.parse()?;
        }
        if let Some(flag) = lookup("EDGEBENCH_NORMALIZED") {
            cfg.sampler.normalized_coords = flag == "1" || flag.eq_ignore_ascii_case("true");
        }

        Ok(cfg)
    }

    /// Checks settings that would fail the same way on every device.
    pub fn validate(&self) -> ComputeResult<()> {
        self.sampler.validate()
    }

    /// Accepted settings the bundled kernel does not handle.
    ///
    /// The bundled `x_filter` reads with integer pixel coordinates, so
    /// sampler settings outside nearest/unnormalized give undefined results.
    /// Custom entry points are assumed to know their sampler.
    pub fn warnings(&self) -> Vec<String> {
        if self.entry_point != DEFAULT_ENTRY_POINT {
            return Vec::new();
        }
        self.sampler
            .integer_read_conflicts()
            .into_iter()
            .map(|note| format!("{note}; the default {DEFAULT_ENTRY_POINT} kernel may produce garbage"))
            .collect()
    }
}
