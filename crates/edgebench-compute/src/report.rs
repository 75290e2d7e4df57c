//! Run report returned by the orchestrator.
//!
//! Plain data, serializable. Rendering (console, JSON file) is up to the
//! caller.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::registry::{DeviceInfo, HostInfo, PlatformInfo};
use crate::sizing::WorkSizes;

/// Pipeline step a device attempt failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CreateContext,
    Upload,
    BuildProgram,
    Dispatch,
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateContext => "create context",
            Self::Upload => "upload",
            Self::BuildProgram => "build program",
            Self::Dispatch => "dispatch",
            Self::Save => "save",
        })
    }
}

/// Terminal state of one device attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeviceOutcome {
    /// Filtered image written to `output`.
    Success {
        output: PathBuf,
        work_sizes: WorkSizes,
        /// Kernel execution time from device profiling.
        kernel_secs: f64,
    },
    /// Device cannot run the pipeline; nothing was uploaded.
    Skipped { reason: String },
    /// Attempt aborted at `stage`.
    Failed {
        stage: Stage,
        error: String,
        /// Launch geometry, when the failure happened at or after dispatch.
        #[serde(skip_serializing_if = "Option::is_none")]
        work_sizes: Option<WorkSizes>,
    },
}

impl DeviceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Launch geometry used, if the attempt got that far.
    pub fn work_sizes(&self) -> Option<&WorkSizes> {
        match self {
            Self::Success { work_sizes, .. } => Some(work_sizes),
            Self::Failed { work_sizes, .. } => work_sizes.as_ref(),
            Self::Skipped { .. } => None,
        }
    }

    /// Kernel time for successful attempts.
    pub fn kernel_secs(&self) -> Option<f64> {
        match self {
            Self::Success { kernel_secs, .. } => Some(*kernel_secs),
            _ => None,
        }
    }
}

/// One device's entry in the run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceReport {
    pub platform: PlatformInfo,
    pub device: DeviceInfo,
    pub outcome: DeviceOutcome,
    /// Host wall-clock for the whole attempt, context to save.
    pub wall_secs: f64,
}

impl DeviceReport {
    /// Reference time divided by kernel time, for successful attempts.
    pub fn speedup(&self, reference_secs: f64) -> Option<f64> {
        self.outcome
            .kernel_secs()
            .filter(|&k| k > 0.0)
            .map(|k| reference_secs / k)
    }
}

/// Host reference filter result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceReport {
    pub elapsed_secs: f64,
    pub output: PathBuf,
}

/// Counts by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub width: u32,
    pub height: u32,
    pub host: HostInfo,
    pub reference: ReferenceReport,
    pub devices: Vec<DeviceReport>,
}

impl RunReport {
    pub fn summary(&self) -> Summary {
        self.devices.iter().fold(Summary::default(), |mut s, d| {
            s.total += 1;
            match d.outcome {
                DeviceOutcome::Success { .. } => s.succeeded += 1,
                DeviceOutcome::Skipped { .. } => s.skipped += 1,
                DeviceOutcome::Failed { .. } => s.failed += 1,
            }
            s
        })
    }

    /// Output files written, reference first.
    pub fn outputs(&self) -> Vec<&PathBuf> {
        std::iter::once(&self.reference.output)
            .chain(self.devices.iter().filter_map(|d| match &d.outcome {
                DeviceOutcome::Success { output, .. } => Some(output),
                _ => None,
            }))
            .collect()
    }

    /// Fastest successful device.
    pub fn fastest(&self) -> Option<&DeviceReport> {
        self.devices
            .iter()
            .filter(|d| d.outcome.is_success())
            .min_by(|a, b| {
                let ka = a.outcome.kernel_secs().unwrap_or(f64::INFINITY);
                let kb = b.outcome.kernel_secs().unwrap_or(f64::INFINITY);
                ka.total_cmp(&kb)
            })
    }
}
