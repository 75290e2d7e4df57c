//! Compute backend abstraction.
//!
//! # Architecture
//!
//! ```text
//! ComputeBackend          enumerate() -> devices
//!     └── ComputeDevice   platform/device info, open_session()
//!             └── DeviceSession   context + queue + sampler
//!                     ├── upload_image / allocate_image / read_image
//!                     ├── build_program
//!                     └── execute
//! ```
//!
//! Sessions own every device-side resource they create. Dropping a session
//! (and the images/programs it handed out) releases them, so a failing
//! device never leaks into the next one.
//!
//! The pipeline modules ([`crate::transfer`], [`crate::program`],
//! [`crate::dispatch`]) wrap these primitives with validation; call those
//! rather than the trait methods directly.

#[cfg(feature = "opencl")]
mod opencl;

#[cfg(feature = "opencl")]
pub use opencl::{OpenClBackend, OpenClDevice, OpenClImage, OpenClProgram, OpenClSession};

use edgebench_core::HostImage;

use crate::dispatch::ProfilingResult;
use crate::program::KernelSource;
use crate::registry::{DeviceInfo, PlatformInfo};
use crate::sampler::SamplerConfig;
use crate::sizing::WorkSizes;
use crate::ComputeResult;

/// Handle to a device-resident RGBA8 image.
pub trait ImageHandle {
    /// Image dimensions (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Width.
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    /// Height.
    fn height(&self) -> u32 {
        self.dimensions().1
    }

    /// Size in bytes of device memory used.
    fn size_bytes(&self) -> u64 {
        let (w, h) = self.dimensions();
        (w as u64) * (h as u64) * 4
    }
}

/// A source of devices.
pub trait ComputeBackend {
    /// Device handle type.
    type Device: ComputeDevice;

    /// Backend name.
    fn name(&self) -> &'static str;

    /// Every device on every platform, lazily.
    ///
    /// The sequence is finite and one-shot; order is backend-defined. An
    /// unavailable runtime yields an empty sequence rather than an error.
    fn enumerate(&self) -> impl Iterator<Item = Self::Device> + '_;
}

/// One discovered device.
pub trait ComputeDevice {
    /// Execution context type.
    type Session: DeviceSession;

    /// Platform the device belongs to.
    fn platform(&self) -> &PlatformInfo;

    /// Capabilities captured at discovery.
    fn info(&self) -> &DeviceInfo;

    /// Creates a context with a profiling-enabled queue.
    ///
    /// The sampler is only created when the device supports images.
    fn open_session(&self, sampler: &SamplerConfig) -> ComputeResult<Self::Session>;
}

/// Execution context for one device run.
pub trait DeviceSession {
    /// Backend-specific image handle.
    type Image: ImageHandle;

    /// Compiled program with its entry point resolved.
    type Program;

    /// Device this session runs on.
    fn device(&self) -> &DeviceInfo;

    /// Creates a read-only device image initialised from `image`.
    fn upload_image(&self, image: &HostImage) -> ComputeResult<Self::Image>;

    /// Creates a write-only device image of the same pixel format.
    fn allocate_image(&self, width: u32, height: u32) -> ComputeResult<Self::Image>;

    /// Blocking read of the full image region into a new host buffer.
    fn read_image(&self, image: &Self::Image, width: u32, height: u32) -> ComputeResult<Vec<u8>>;

    /// Compiles `source` for this device and resolves its entry point.
    fn build_program(&self, source: &KernelSource) -> ComputeResult<Self::Program>;

    /// Enqueues the entry point with
    /// `(input, output, sampler, width, height)`, waits for completion and
    /// returns the profiling timestamps.
    fn execute(
        &self,
        program: &Self::Program,
        sizes: &WorkSizes,
        input: &Self::Image,
        output: &Self::Image,
        width: i32,
        height: i32,
    ) -> ComputeResult<ProfilingResult>;
}
