//! Device registry types and capability queries.
//!
//! Platform and device descriptions are plain data captured once at
//! discovery; the backend keeps the live handles. Enumeration itself is
//! [`crate::ComputeBackend::enumerate`].

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

/// Compute platform (one installed OpenCL implementation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub name: String,
    pub profile: String,
    pub vendor: String,
    pub version: String,
}

/// Device class as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceKind {
    Cpu,
    Gpu,
    Accelerator,
    Other,
}

impl DeviceKind {
    /// Upper-case tag used in reports and output file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Accelerator => "ACCELERATOR",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable device description captured at discovery.
///
/// Zero in a numeric limit means the backend did not report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub kind: DeviceKind,
    /// Global memory in bytes.
    pub global_mem_size: u64,
    /// Max clock frequency in MHz.
    pub max_clock_frequency: u32,
    pub max_compute_units: u32,
    pub max_work_group_size: usize,
    /// Per-dimension work-item limits, outermost last.
    pub max_work_item_sizes: Vec<usize>,
    pub image_support: bool,
    pub image2d_max_width: usize,
    pub image2d_max_height: usize,
}

impl DeviceInfo {
    /// Limits the workgroup sizing policy consults.
    pub fn limits(&self) -> DeviceLimits {
        DeviceLimits {
            max_work_group_size: self.max_work_group_size,
            max_work_item_sizes: self.max_work_item_sizes.clone(),
        }
    }

    /// Global memory in whole megabytes.
    pub fn global_mem_mb(&self) -> u64 {
        self.global_mem_size / 1024 / 1024
    }

    /// Whether a 2-D image of this size is within the reported image limits.
    pub fn fits_image(&self, width: u32, height: u32) -> bool {
        let fits = |limit: usize, extent: u32| limit == 0 || extent as usize <= limit;
        fits(self.image2d_max_width, width) && fits(self.image2d_max_height, height)
    }
}

/// Dispatch limits reported by a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Max work-items per group (product of local sizes). Zero = unknown.
    pub max_work_group_size: usize,
    /// Max work-items per dimension. Missing or zero entries = unknown.
    pub max_work_item_sizes: Vec<usize>,
}

impl DeviceLimits {
    /// Limit for one axis, `None` when unreported.
    pub fn max_items(&self, axis: usize) -> Option<usize> {
        self.max_work_item_sizes.get(axis).copied().filter(|&n| n > 0)
    }
}

/// Whether the device can hold image objects. Side-effect free.
pub fn supports_images(device: &DeviceInfo) -> bool {
    device.image_support
}

/// Host machine summary printed next to the reference timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    pub cpu_count: u32,
    /// Total RAM in bytes.
    pub memory: u64,
}

static HOST_INFO: OnceLock<HostInfo> = OnceLock::new();

impl HostInfo {
    /// Detects CPU count and total RAM once per process.
    pub fn detect() -> Self {
        *HOST_INFO.get_or_init(|| HostInfo {
            cpu_count: sys_info::cpu_num().unwrap_or(1),
            memory: sys_info::mem_info()
                .map(|m| m.total * 1024) // KB to bytes
                .unwrap_or(0),
        })
    }
}
