//! Host-side RGBA8 image buffer.
//!
//! [`HostImage`] is the hand-off format between the codec and the device
//! pipeline: 4 channels, 8 bits per channel, row-major, no row padding.
//! Whatever layout the decoder produced is promoted to RGBA8 on the way in.
//!
//! # Example
//!
//! ```rust
//! use edgebench_core::HostImage;
//!
//! let img = HostImage::new(4, 2);
//! assert_eq!(img.data().len(), 4 * 2 * 4);
//! assert_eq!(img.pixel(3, 1), [0, 0, 0, 0]);
//! ```

use ::image::{DynamicImage, RgbaImage};

use crate::{CoreError, CoreResult};

/// Channels per pixel in every buffer this crate hands out.
pub const CHANNELS: usize = 4;

/// Decoded image in tightly packed RGBA8 layout.
#[derive(Clone, PartialEq, Eq)]
pub struct HostImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl HostImage {
    /// Creates a zero-filled (transparent black) image.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * CHANNELS;
        Self { width, height, data: vec![0; len] }
    }

    /// Wraps an existing RGBA8 buffer.
    ///
    /// Fails when the dimensions are zero or the buffer length is not
    /// exactly `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> CoreResult<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(CoreError::BufferSizeMismatch { expected, actual: data.len() });
        }
        Ok(Self { width, height, data })
    }

    /// Converts any decoded image to RGBA8.
    ///
    /// Grey, RGB, 16-bit and float inputs are promoted; alpha defaults to
    /// fully opaque when the source has none.
    pub fn from_dynamic(image: DynamicImage) -> CoreResult<Self> {
        let rgba = match image {
            DynamicImage::ImageRgba8(buf) => buf,
            other => other.to_rgba8(),
        };
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw pixel bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw pixel bytes.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes per row.
    #[inline]
    pub fn row_pitch(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Size of the pixel buffer in bytes.
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Reads one pixel. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = self.index(x, y);
        [self.data[idx], self.data[idx + 1], self.data[idx + 2], self.data[idx + 3]]
    }

    /// Writes one pixel. Panics when out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = self.index(x, y);
        self.data[idx..idx + CHANNELS].copy_from_slice(&rgba);
    }

    /// Consumes the image and returns its pixel bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Converts into an `image` crate buffer for encoding.
    pub fn into_rgba_image(self) -> CoreResult<RgbaImage> {
        let actual = self.data.len();
        let expected = byte_len(self.width, self.height)?;
        RgbaImage::from_raw(self.width, self.height, self.data)
            .ok_or(CoreError::BufferSizeMismatch { expected, actual })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

/// Expected byte length of an RGBA8 buffer, rejecting empty or overflowing sizes.
pub fn byte_len(width: u32, height: u32) -> CoreResult<usize> {
    if width == 0 || height == 0 {
        return Err(CoreError::InvalidDimensions(width, height));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(CoreError::InvalidDimensions(width, height))
}

impl std::fmt::Debug for HostImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_from_rgba8_checks_length() {
        assert!(HostImage::from_rgba8(2, 2, vec![0; 16]).is_ok());
        let err = HostImage::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, CoreError::BufferSizeMismatch { expected: 16, actual: 15 }));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            HostImage::from_rgba8(0, 4, Vec::new()),
            Err(CoreError::InvalidDimensions(0, 4))
        ));
    }

    #[test]
    fn test_rgb_promoted_to_rgba() {
        let mut rgb = RgbImage::new(2, 1);
        rgb.put_pixel(0, 0, Rgb([10, 20, 30]));
        rgb.put_pixel(1, 0, Rgb([40, 50, 60]));

        let img = HostImage::from_dynamic(DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.pixel(0, 0), [10, 20, 30, 255]);
        assert_eq!(img.pixel(1, 0), [40, 50, 60, 255]);
    }

    #[test]
    fn test_gray_promoted_to_rgba() {
        let gray = GrayImage::from_pixel(3, 3, Luma([77]));
        let img = HostImage::from_dynamic(DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(img.size_bytes(), 3 * 3 * 4);
        assert_eq!(img.pixel(2, 2), [77, 77, 77, 255]);
    }

    #[test]
    fn test_set_pixel_and_row_pitch() {
        let mut img = HostImage::new(5, 3);
        img.set_pixel(4, 2, [1, 2, 3, 4]);
        assert_eq!(img.row_pitch(), 20);
        assert_eq!(&img.data()[img.size_bytes() - 4..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_into_rgba_image_keeps_pixels() {
        let mut img = HostImage::new(2, 2);
        img.set_pixel(1, 1, [9, 8, 7, 6]);
        let buf = img.into_rgba_image().unwrap();
        assert_eq!(buf.dimensions(), (2, 2));
        assert_eq!(buf.get_pixel(1, 1).0, [9, 8, 7, 6]);
    }
}
