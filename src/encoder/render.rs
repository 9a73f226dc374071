/// Rendering symbols onto a luminance canvas
use crate::error::DecodeError;
use crate::models::{BitMatrix, PixelGrid, Point};
use crate::utils::geometry::PerspectiveTransform;

/// Luminance of dark modules
pub const DARK: u8 = 0;
/// Luminance of the background and light modules
pub const LIGHT: u8 = 255;

/// A white 8-bit canvas that symbols are painted onto
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    /// All-light canvas
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![LIGHT; width * height],
        }
    }

    /// Canvas holding one symbol with a quiet zone of `quiet` modules
    pub fn for_symbol(modules: &BitMatrix, module_px: usize, quiet: usize) -> Self {
        let side = (modules.width() + 2 * quiet) * module_px;
        let mut canvas = Self::new(side, side);
        canvas.draw_modules(modules, quiet * module_px, quiet * module_px, module_px);
        canvas
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major luminance
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable row-major luminance
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Luminance at (x, y); panics outside the canvas
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// Set one pixel; writes outside the canvas are ignored
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = value;
        }
    }

    /// Axis-aligned symbol with its top-left module corner at (x0, y0)
    pub fn draw_modules(&mut self, modules: &BitMatrix, x0: usize, y0: usize, module_px: usize) {
        for my in 0..modules.height() {
            for mx in 0..modules.width() {
                if !modules.get(mx, my) {
                    continue;
                }
                for dy in 0..module_px {
                    for dx in 0..module_px {
                        self.set(x0 + mx * module_px + dx, y0 + my * module_px + dy, DARK);
                    }
                }
            }
        }
    }

    /// Symbol mapped onto an arbitrary quadrilateral; `corners` are the
    /// image positions of the symbol's top-left, top-right, bottom-right and
    /// bottom-left corners. Returns `None` for degenerate quadrilaterals.
    pub fn draw_warped(&mut self, modules: &BitMatrix, corners: [Point; 4]) -> Option<()> {
        let n = modules.width() as f32;
        let module_space = [
            Point::new(0.0, 0.0),
            Point::new(n, 0.0),
            Point::new(n, n),
            Point::new(0.0, n),
        ];
        let to_modules = PerspectiveTransform::from_points(&corners, &module_space)?;

        let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
        let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
        let max_x = (corners.iter().map(|p| p.x).fold(0.0, f32::max).ceil() as usize).min(self.width);
        let max_y = (corners.iter().map(|p| p.y).fold(0.0, f32::max).ceil() as usize).min(self.height);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let (mx, my) = to_modules.transform_f64(x as f64 + 0.5, y as f64 + 0.5);
                if !(mx >= 0.0 && my >= 0.0 && mx < n as f64 && my < n as f64) {
                    continue;
                }
                if modules.get(mx as usize, my as usize) {
                    self.set(x, y, DARK);
                }
            }
        }
        Some(())
    }

    /// Map every pixel through `f(x, y, value)`
    pub fn map_pixels(&mut self, mut f: impl FnMut(usize, usize, u8) -> u8) {
        for y in 0..self.height {
            for x in 0..self.width {
                let i = y * self.width + x;
                self.pixels[i] = f(x, y, self.pixels[i]);
            }
        }
    }

    /// Hand the canvas to the decoder
    pub fn into_pixel_grid(self) -> Result<PixelGrid, DecodeError> {
        PixelGrid::new(self.width, self.height, self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_aligned_modules() {
        let mut modules = BitMatrix::square(3);
        modules.set(1, 1, true);
        let canvas = Canvas::for_symbol(&modules, 2, 1);
        assert_eq!(canvas.width(), 10);
        assert_eq!(canvas.get(4, 4), DARK);
        assert_eq!(canvas.get(5, 5), DARK);
        assert_eq!(canvas.get(6, 6), LIGHT);
        assert_eq!(canvas.get(3, 3), LIGHT);
    }

    #[test]
    fn test_warped_matches_axis_aligned_for_square() {
        let mut modules = BitMatrix::square(4);
        modules.set(0, 0, true);
        modules.set(3, 2, true);
        let mut warped = Canvas::new(20, 20);
        warped
            .draw_warped(
                &modules,
                [
                    Point::new(2.0, 2.0),
                    Point::new(18.0, 2.0),
                    Point::new(18.0, 18.0),
                    Point::new(2.0, 18.0),
                ],
            )
            .unwrap();
        let mut plain = Canvas::new(20, 20);
        plain.draw_modules(&modules, 2, 2, 4);
        assert_eq!(warped, plain);
    }
}
