//! Kernel program loading.
//!
//! The kernel source is an external text resource. It is read once per run
//! and compiled separately for every device.

use std::fs;
use std::path::{Path, PathBuf};

#[allow(unused_imports)]
use tracing::{debug, trace, warn};

use crate::backend::DeviceSession;
use crate::{ComputeError, ComputeResult};

/// Default kernel file, relative to the working directory.
pub const DEFAULT_KERNEL_PATH: &str = "kernels/xFilter.cl";

/// Default entry point name.
pub const DEFAULT_ENTRY_POINT: &str = "x_filter";

/// Kernel program text plus the entry point to invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSource {
    path: PathBuf,
    entry: String,
    text: String,
}

impl KernelSource {
    /// Reads the program text from `path`.
    pub fn from_file(path: &Path, entry: &str) -> ComputeResult<Self> {
        trace!(path = %path.display(), entry, "KernelSource::from_file");
        let text = fs::read_to_string(path).map_err(|source| ComputeError::KernelSource {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(bytes = text.len(), "kernel source loaded");
        Ok(Self { path: path.to_path_buf(), entry: entry.to_string(), text })
    }

    /// Wraps in-memory program text.
    pub fn from_text(entry: &str, text: impl Into<String>) -> Self {
        Self {
            path: PathBuf::from("<inline>"),
            entry: entry.to_string(),
            text: text.into(),
        }
    }

    /// Where the text came from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry point name.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Program text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Compiles `source` for the session's device.
///
/// Build failures come back as [`ComputeError::Compile`] carrying the
/// backend's build log.
pub fn load_and_build<S: DeviceSession>(session: &S, source: &KernelSource) -> ComputeResult<S::Program> {
    trace!(device = %session.device().name, entry = source.entry(), "load_and_build");

    if source.entry().is_empty() {
        return Err(ComputeError::Compile { log: "empty entry point name".into() });
    }

    session.build_program(source).inspect_err(|e| {
        warn!(device = %session.device().name, error = %e, "kernel build failed");
    })
}
