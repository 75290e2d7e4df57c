//! Decode/encode glue over the `image` crate.
//!
//! The format is picked from the file extension in both directions.

use std::path::Path;

#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::{CoreError, CoreResult, HostImage};

/// Decodes `path` and promotes it to RGBA8.
pub fn load(path: &Path) -> CoreResult<HostImage> {
    trace!(path = %path.display(), "codec::load");

    let decoded = ::image::open(path).map_err(|source| CoreError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(color = ?decoded.color(), w = decoded.width(), h = decoded.height(), "decoded");

    HostImage::from_dynamic(decoded)
}

/// Encodes `image` to `path`.
pub fn save(path: &Path, image: &HostImage) -> CoreResult<()> {
    save_rgba8(path, image.data(), image.width(), image.height())
}

/// Encodes a raw RGBA8 buffer to `path`.
///
/// Formats without an alpha channel (JPEG) get the alpha dropped.
pub fn save_rgba8(path: &Path, data: &[u8], width: u32, height: u32) -> CoreResult<()> {
    trace!(path = %path.display(), width, height, "codec::save_rgba8");

    let expected = crate::image::byte_len(width, height)?;
    if data.len() != expected {
        return Err(CoreError::BufferSizeMismatch { expected, actual: data.len() });
    }

    let encode_err = |source| CoreError::Encode { path: path.to_path_buf(), source };

    if has_alpha_support(path) {
        ::image::save_buffer(path, data, width, height, ::image::ExtendedColorType::Rgba8)
            .map_err(encode_err)
    } else {
        let rgba = ::image::RgbaImage::from_raw(width, height, data.to_vec())
            .ok_or(CoreError::BufferSizeMismatch { expected, actual: data.len() })?;
        ::image::DynamicImage::ImageRgba8(rgba)
            .to_rgb8()
            .save(path)
            .map_err(encode_err)
    }
}

fn has_alpha_support(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    !matches!(ext.as_deref(), Some("jpg") | Some("jpeg"))
}
