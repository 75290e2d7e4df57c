//! Image transfer between host and device.
//!
//! All device images use one pixel format: RGBA, 8-bit unsigned normalized.
//! These helpers check sizes on both sides of the backend calls so the
//! output image always matches the input dimensions and downloads always
//! return exactly `width * height * 4` bytes.

use edgebench_core::image::byte_len;
use edgebench_core::HostImage;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::backend::{DeviceSession, ImageHandle};
use crate::{ComputeError, ComputeResult};

/// Creates a read-only device copy of `image`.
///
/// Fails with [`ComputeError::DeviceMemory`] when the image exceeds the
/// device's 2-D image limits or the allocation is refused. Not retried.
pub fn upload_input<S: DeviceSession>(session: &S, image: &HostImage) -> ComputeResult<S::Image> {
    let (width, height) = image.dimensions();
    trace!(width, height, device = %session.device().name, "upload_input");

    check_fits(session, width, height)?;
    let handle = session.upload_image(image)?;
    check_handle(&handle, width, height)?;

    debug!(bytes = handle.size_bytes(), "input image uploaded");
    Ok(handle)
}

/// Allocates a write-only device image of `width x height`.
pub fn allocate_output<S: DeviceSession>(session: &S, width: u32, height: u32) -> ComputeResult<S::Image> {
    trace!(width, height, "allocate_output");

    byte_len(width, height)?;
    check_fits(session, width, height)?;
    let handle = session.allocate_image(width, height)?;
    check_handle(&handle, width, height)?;
    Ok(handle)
}

/// Blocking read of the whole image into host memory.
pub fn download<S: DeviceSession>(
    session: &S,
    image: &S::Image,
    width: u32,
    height: u32,
) -> ComputeResult<Vec<u8>> {
    trace!(width, height, "download");

    check_handle(image, width, height)?;
    let expected = byte_len(width, height)?;
    let data = session.read_image(image, width, height)?;
    if data.len() != expected {
        return Err(ComputeError::BufferSizeMismatch { expected, actual: data.len() });
    }
    Ok(data)
}

fn check_fits<S: DeviceSession>(session: &S, width: u32, height: u32) -> ComputeResult<()> {
    let device = session.device();
    if !device.fits_image(width, height) {
        return Err(ComputeError::DeviceMemory(format!(
            "image {width}x{height} exceeds device image limit {}x{}",
            device.image2d_max_width, device.image2d_max_height
        )));
    }
    Ok(())
}

fn check_handle<H: ImageHandle>(handle: &H, width: u32, height: u32) -> ComputeResult<()> {
    if handle.dimensions() != (width, height) {
        let (w, h) = handle.dimensions();
        return Err(ComputeError::InvalidDimensions(w, h));
    }
    Ok(())
}
