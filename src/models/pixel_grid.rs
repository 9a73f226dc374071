use crate::error::DecodeError;
use crate::utils::grayscale::rgb_to_grayscale;

/// Largest side accepted for an input or resampled pass
pub const MAX_SIDE: usize = 16_384;

/// 8-bit luminance image. Immutable once built; every preprocessing pass
/// produces a fresh grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wrap a row-major luminance buffer
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, DecodeError> {
        check_size(width, height)?;
        let expected = width * height;
        if data.len() != expected {
            return Err(DecodeError::DimensionMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build from packed RGB bytes (3 bytes per pixel)
    pub fn from_rgb(rgb: &[u8], width: usize, height: usize) -> Result<Self, DecodeError> {
        check_size(width, height)?;
        let expected = width * height * 3;
        if rgb.len() != expected {
            return Err(DecodeError::DimensionMismatch {
                width,
                height,
                expected,
                actual: rgb.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data: rgb_to_grayscale(rgb, width, height),
        })
    }

    /// Uniform grid, mostly useful in tests
    pub fn filled(width: usize, height: usize, value: u8) -> Result<Self, DecodeError> {
        Self::new(width, height, vec![value; width * height])
    }

    /// Grid width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luminance at (x, y); callers stay in bounds
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Row-major luminance bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Give the buffer back
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

fn check_size(width: usize, height: usize) -> Result<(), DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage);
    }
    if width > MAX_SIDE || height > MAX_SIDE {
        return Err(DecodeError::ImageTooLarge { width, height });
    }
    Ok(())
}
