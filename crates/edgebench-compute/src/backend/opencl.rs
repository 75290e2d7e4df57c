//! OpenCL backend via `opencl3`.
//!
//! The library is loaded at runtime (`dynamic` feature), so a machine
//! without an OpenCL ICD simply reports no devices.

use std::ffi::c_void;
use std::fmt;
use std::ptr;

use edgebench_core::image::byte_len;
use edgebench_core::HostImage;
use opencl3::command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE};
use opencl3::context::Context;
use opencl3::device::{
    Device, CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU,
};
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::memory::{
    ClMem, Image, Sampler, CL_ADDRESS_CLAMP, CL_ADDRESS_CLAMP_TO_EDGE, CL_ADDRESS_NONE,
    CL_ADDRESS_REPEAT, CL_FILTER_LINEAR, CL_FILTER_NEAREST, CL_MEM_COPY_HOST_PTR,
    CL_MEM_OBJECT_IMAGE2D, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY, CL_RGBA, CL_UNORM_INT8,
};
use opencl3::platform::{get_platforms, Platform};
use opencl3::program::Program;
use opencl3::types::{
    cl_addressing_mode, cl_device_id, cl_device_type, cl_filter_mode, cl_image_desc,
    cl_image_format, cl_mem_flags, CL_BLOCKING, CL_FALSE, CL_TRUE,
};
#[allow(unused_imports)]
use tracing::{debug, trace, warn};

use super::{ComputeBackend, ComputeDevice, DeviceSession, ImageHandle};
use crate::dispatch::ProfilingResult;
use crate::program::KernelSource;
use crate::registry::{DeviceInfo, DeviceKind, PlatformInfo};
use crate::sampler::{AddressingMode, FilterMode, SamplerConfig};
use crate::sizing::WorkSizes;
use crate::{ComputeError, ComputeResult};

/// Enumerates devices across all installed OpenCL platforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenClBackend;

impl OpenClBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for OpenClBackend {
    type Device = OpenClDevice;

    fn name(&self) -> &'static str {
        "opencl"
    }

    fn enumerate(&self) -> impl Iterator<Item = OpenClDevice> + '_ {
        std::iter::once_with(|| {
            get_platforms().unwrap_or_else(|e| {
                debug!(error = %e, "no OpenCL platforms");
                Vec::new()
            })
        })
        .flatten()
        .flat_map(|platform| {
            let info = platform_info(&platform);
            let ids = platform.get_devices(CL_DEVICE_TYPE_ALL).unwrap_or_else(|e| {
                warn!(platform = %info.name, error = %e, "device query failed");
                Vec::new()
            });
            debug!(platform = %info.name, devices = ids.len(), "platform");
            ids.into_iter().map(move |id| OpenClDevice::new(info.clone(), id))
        })
    }
}

fn platform_info(platform: &Platform) -> PlatformInfo {
    PlatformInfo {
        name: platform.name().unwrap_or_default().trim().to_string(),
        profile: platform.profile().unwrap_or_default().trim().to_string(),
        vendor: platform.vendor().unwrap_or_default().trim().to_string(),
        version: platform.version().unwrap_or_default().trim().to_string(),
    }
}

fn device_kind(dev_type: cl_device_type) -> DeviceKind {
    if dev_type & CL_DEVICE_TYPE_GPU != 0 {
        DeviceKind::Gpu
    } else if dev_type & CL_DEVICE_TYPE_CPU != 0 {
        DeviceKind::Cpu
    } else if dev_type & CL_DEVICE_TYPE_ACCELERATOR != 0 {
        DeviceKind::Accelerator
    } else {
        DeviceKind::Other
    }
}

fn device_info(device: &Device) -> DeviceInfo {
    DeviceInfo {
        name: device.name().unwrap_or_default().trim().to_string(),
        kind: device_kind(device.dev_type().unwrap_or_default()),
        global_mem_size: device.global_mem_size().unwrap_or_default(),
        max_clock_frequency: device.max_clock_frequency().unwrap_or_default(),
        max_compute_units: device.max_compute_units().unwrap_or_default(),
        max_work_group_size: device.max_work_group_size().unwrap_or_default(),
        max_work_item_sizes: device.max_work_item_sizes().unwrap_or_default(),
        image_support: device.image_support().unwrap_or_default(),
        image2d_max_width: device.image2d_max_width().unwrap_or_default(),
        image2d_max_height: device.image2d_max_height().unwrap_or_default(),
    }
}

/// One OpenCL device with its capabilities captured at discovery.
pub struct OpenClDevice {
    platform: PlatformInfo,
    info: DeviceInfo,
    device: Device,
}

impl OpenClDevice {
    fn new(platform: PlatformInfo, id: cl_device_id) -> Self {
        let device = Device::new(id);
        let info = device_info(&device);
        Self { platform, info, device }
    }
}

impl fmt::Debug for OpenClDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenClDevice")
            .field("platform", &self.platform.name)
            .field("info", &self.info)
            .finish()
    }
}

impl ComputeDevice for OpenClDevice {
    type Session = OpenClSession;

    fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn open_session(&self, sampler: &SamplerConfig) -> ComputeResult<OpenClSession> {
        trace!(device = %self.info.name, "open_session");

        let context = Context::from_device(&self.device).map_err(|e| ComputeError::Context(e.to_string()))?;

        #[allow(deprecated)]
        let queue = CommandQueue::create_default(&context, CL_QUEUE_PROFILING_ENABLE)
            .map_err(|e| ComputeError::Context(e.to_string()))?;

        let sampler = if self.info.image_support {
            #[allow(deprecated)]
            let s = Sampler::create(
                &context,
                if sampler.normalized_coords { CL_TRUE } else { CL_FALSE },
                addressing_mode(sampler.addressing),
                filter_mode(sampler.filter),
            )
            .map_err(|e| ComputeError::Context(e.to_string()))?;
            Some(s)
        } else {
            None
        };

        Ok(OpenClSession {
            info: self.info.clone(),
            sampler,
            queue,
            context,
        })
    }
}

fn addressing_mode(mode: AddressingMode) -> cl_addressing_mode {
    match mode {
        AddressingMode::None => CL_ADDRESS_NONE,
        AddressingMode::ClampToEdge => CL_ADDRESS_CLAMP_TO_EDGE,
        AddressingMode::Clamp => CL_ADDRESS_CLAMP,
        AddressingMode::Repeat => CL_ADDRESS_REPEAT,
    }
}

fn filter_mode(mode: FilterMode) -> cl_filter_mode {
    match mode {
        FilterMode::Nearest => CL_FILTER_NEAREST,
        FilterMode::Linear => CL_FILTER_LINEAR,
    }
}

/// Context, profiling queue and sampler for one device.
pub struct OpenClSession {
    info: DeviceInfo,
    sampler: Option<Sampler>,
    queue: CommandQueue,
    context: Context,
}

impl fmt::Debug for OpenClSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenClSession")
            .field("device", &self.info.name)
            .field("has_sampler", &self.sampler.is_some())
            .finish()
    }
}

/// RGBA8 2-D image object.
pub struct OpenClImage {
    mem: Image,
    width: u32,
    height: u32,
}

impl ImageHandle for OpenClImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Built program with its kernel resolved.
pub struct OpenClProgram {
    // kernel before program so it is released first
    kernel: Kernel,
    _program: Program,
}

const RGBA8: cl_image_format = cl_image_format {
    image_channel_order: CL_RGBA,
    image_channel_data_type: CL_UNORM_INT8,
};

fn image_desc(width: u32, height: u32) -> cl_image_desc {
    // SAFETY: cl_image_desc is plain C data; all-zero is its documented default.
    let mut desc: cl_image_desc = unsafe { std::mem::zeroed() };
    desc.image_type = CL_MEM_OBJECT_IMAGE2D;
    desc.image_width = width as usize;
    desc.image_height = height as usize;
    desc
}

impl OpenClSession {
    fn create_image(
        &self,
        width: u32,
        height: u32,
        flags: cl_mem_flags,
        host_ptr: *mut c_void,
    ) -> ComputeResult<OpenClImage> {
        let desc = image_desc(width, height);
        // SAFETY: host_ptr is null or points to width*height*4 readable bytes
        // that outlive this call (COPY_HOST_PTR copies them).
        let mem = unsafe { Image::create(&self.context, flags, &RGBA8, &desc, host_ptr) }
            .map_err(|e| ComputeError::DeviceMemory(e.to_string()))?;
        Ok(OpenClImage { mem, width, height })
    }
}

impl DeviceSession for OpenClSession {
    type Image = OpenClImage;
    type Program = OpenClProgram;

    fn device(&self) -> &DeviceInfo {
        &self.info
    }

    fn upload_image(&self, image: &HostImage) -> ComputeResult<OpenClImage> {
        let (width, height) = image.dimensions();
        let expected = byte_len(width, height)?;
        if image.data().len() != expected {
            return Err(ComputeError::BufferSizeMismatch { expected, actual: image.data().len() });
        }
        self.create_image(
            width,
            height,
            CL_MEM_READ_ONLY | CL_MEM_COPY_HOST_PTR,
            image.data().as_ptr() as *mut c_void,
        )
    }

    fn allocate_image(&self, width: u32, height: u32) -> ComputeResult<OpenClImage> {
        self.create_image(width, height, CL_MEM_WRITE_ONLY, ptr::null_mut())
    }

    fn read_image(&self, image: &OpenClImage, width: u32, height: u32) -> ComputeResult<Vec<u8>> {
        let mut data = vec![0u8; byte_len(width, height)?];
        let origin = [0usize; 3];
        let region = [width as usize, height as usize, 1];

        // SAFETY: data holds exactly region[0]*region[1]*4 bytes and the read
        // is blocking.
        let event = unsafe {
            self.queue.enqueue_read_image(
                &image.mem,
                CL_BLOCKING,
                origin.as_ptr(),
                region.as_ptr(),
                0,
                0,
                data.as_mut_ptr() as *mut c_void,
                &[],
            )
        }
        .map_err(|e| ComputeError::Dispatch(format!("read back: {e}")))?;
        event.wait().map_err(|e| ComputeError::Dispatch(format!("read back: {e}")))?;

        Ok(data)
    }

    fn build_program(&self, source: &KernelSource) -> ComputeResult<OpenClProgram> {
        let program = Program::create_and_build_from_source(&self.context, source.text(), "")
            .map_err(|log| ComputeError::Compile { log })?;
        let kernel = Kernel::create(&program, source.entry()).map_err(|e| ComputeError::Compile {
            log: format!("entry point '{}': {e}", source.entry()),
        })?;
        debug!(device = %self.info.name, entry = source.entry(), "program built");
        Ok(OpenClProgram { kernel, _program: program })
    }

    fn execute(
        &self,
        program: &OpenClProgram,
        sizes: &WorkSizes,
        input: &OpenClImage,
        output: &OpenClImage,
        width: i32,
        height: i32,
    ) -> ComputeResult<ProfilingResult> {
        let sampler = self
            .sampler
            .as_ref()
            .ok_or_else(|| ComputeError::Capability(self.info.name.clone()))?;

        // SAFETY: argument order and types match
        // (image2d_t, image2d_t, sampler_t, int, int).
        let event = unsafe {
            ExecuteKernel::new(&program.kernel)
                .set_arg(&input.mem.get())
                .set_arg(&output.mem.get())
                .set_arg(&sampler.get())
                .set_arg(&width)
                .set_arg(&height)
                .set_global_work_sizes(&sizes.global)
                .set_local_work_sizes(&sizes.local)
                .enqueue_nd_range(&self.queue)
        }
        .map_err(|e| ComputeError::Dispatch(e.to_string()))?;

        event.wait().map_err(|e| ComputeError::Dispatch(e.to_string()))?;

        let start = event
            .profiling_command_start()
            .map_err(|e| ComputeError::Dispatch(format!("profiling: {e}")))?;
        let end = event
            .profiling_command_end()
            .map_err(|e| ComputeError::Dispatch(format!("profiling: {e}")))?;
        Ok(ProfilingResult::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_kind_from_type_bits() {
        assert_eq!(device_kind(CL_DEVICE_TYPE_GPU), DeviceKind::Gpu);
        assert_eq!(device_kind(CL_DEVICE_TYPE_CPU), DeviceKind::Cpu);
        assert_eq!(device_kind(CL_DEVICE_TYPE_ACCELERATOR), DeviceKind::Accelerator);
        assert_eq!(device_kind(CL_DEVICE_TYPE_GPU | CL_DEVICE_TYPE_CPU), DeviceKind::Gpu);
        assert_eq!(device_kind(0), DeviceKind::Other);
    }

    #[test]
    fn test_sampler_mode_mapping() {
        assert_eq!(addressing_mode(AddressingMode::ClampToEdge), CL_ADDRESS_CLAMP_TO_EDGE);
        assert_eq!(addressing_mode(AddressingMode::Repeat), CL_ADDRESS_REPEAT);
        assert_eq!(filter_mode(FilterMode::Nearest), CL_FILTER_NEAREST);
    }

    #[test]
    fn test_image_desc() {
        let desc = image_desc(640, 480);
        assert_eq!(desc.image_type, CL_MEM_OBJECT_IMAGE2D);
        assert_eq!((desc.image_width, desc.image_height), (640, 480));
        assert_eq!(desc.image_depth, 0);
    }

    #[test]
    fn test_enumerate_without_runtime_does_not_panic() {
        let count = OpenClBackend::new().enumerate().count();
        debug!(count, "devices");
    }
}
