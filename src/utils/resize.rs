/// Resampling of luminance grids through the `image` crate
use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::error::DecodeError;
use crate::models::PixelGrid;
use crate::models::pixel_grid::MAX_SIDE;

/// Scale a grid by `factor` with bicubic (Catmull-Rom) interpolation.
/// Target sizes are truncated, as image toolkits usually do.
pub fn upscale(grid: &PixelGrid, factor: f32) -> Result<PixelGrid, DecodeError> {
    let width = (grid.width() as f32 * factor) as usize;
    let height = (grid.height() as f32 * factor) as usize;
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage);
    }
    if width > MAX_SIDE || height > MAX_SIDE {
        return Err(DecodeError::ImageTooLarge { width, height });
    }
    if width == grid.width() && height == grid.height() {
        return Ok(grid.clone());
    }

    let source = GrayImage::from_raw(
        grid.width() as u32,
        grid.height() as u32,
        grid.as_bytes().to_vec(),
    )
    .ok_or(DecodeError::DimensionMismatch {
        width: grid.width(),
        height: grid.height(),
        expected: grid.width() * grid.height(),
        actual: grid.as_bytes().len(),
    })?;
    let resized = imageops::resize(&source, width as u32, height as u32, FilterType::CatmullRom);
    PixelGrid::new(width, height, resized.into_raw())
}
