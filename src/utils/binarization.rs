//! Luminance to black/white conversion.
//!
//! The main path is a hybrid local binarizer: the image is cut into 8x8
//! blocks, each block gets a representative level, and every pixel is
//! compared with the mean level of the 5x5 blocks around its own block.
//! Flat blocks borrow from already-computed neighbours so that large uniform
//! areas never flip to all-black. Images too small for that window fall back
//! to Otsu's global threshold.

use crate::models::{BitMatrix, PixelGrid};

const BLOCK_SIZE_POWER: usize = 3;
const BLOCK_SIZE: usize = 1 << BLOCK_SIZE_POWER;
/// Blocks whose max - min does not exceed this are treated as flat
const MIN_DYNAMIC_RANGE: u32 = 24;
/// Below this side length the 5x5 block window does not fit
const MINIMUM_DIMENSION: usize = BLOCK_SIZE * 5;

/// Binarize with the hybrid local method, or Otsu for tiny images
pub fn binarize(grid: &PixelGrid) -> BitMatrix {
    if grid.width() >= MINIMUM_DIMENSION && grid.height() >= MINIMUM_DIMENSION {
        hybrid_binarize(grid)
    } else {
        otsu_binarize(grid.as_bytes(), grid.width(), grid.height())
    }
}

/// Hybrid block-based binarization. Requires at least 40x40 pixels;
/// smaller inputs are delegated to Otsu.
pub fn hybrid_binarize(grid: &PixelGrid) -> BitMatrix {
    let width = grid.width();
    let height = grid.height();
    if width < MINIMUM_DIMENSION || height < MINIMUM_DIMENSION {
        return otsu_binarize(grid.as_bytes(), width, height);
    }

    let sub_width = width.div_ceil(BLOCK_SIZE);
    let sub_height = height.div_ceil(BLOCK_SIZE);
    let levels = block_levels(grid, sub_width, sub_height);

    let mut binary = BitMatrix::new(width, height);
    let max_y_offset = height - BLOCK_SIZE;
    let max_x_offset = width - BLOCK_SIZE;
    for by in 0..sub_height {
        let y_offset = (by << BLOCK_SIZE_POWER).min(max_y_offset);
        let top = by.clamp(2, sub_height - 3);
        for bx in 0..sub_width {
            let x_offset = (bx << BLOCK_SIZE_POWER).min(max_x_offset);
            let left = bx.clamp(2, sub_width - 3);
            let mut sum = 0u32;
            for row in &levels[top - 2..=top + 2] {
                sum += row[left - 2..=left + 2].iter().sum::<u32>();
            }
            let threshold = sum / 25;
            threshold_block(grid, &mut binary, x_offset, y_offset, threshold);
        }
    }
    binary
}

/// Representative level per block: the mean for blocks with contrast,
/// a neighbour-derived estimate for flat ones.
fn block_levels(grid: &PixelGrid, sub_width: usize, sub_height: usize) -> Vec<Vec<u32>> {
    let width = grid.width();
    let max_y_offset = grid.height() - BLOCK_SIZE;
    let max_x_offset = width - BLOCK_SIZE;
    let pixels = grid.as_bytes();
    let mut levels = vec![vec![0u32; sub_width]; sub_height];

    for by in 0..sub_height {
        let y_offset = (by << BLOCK_SIZE_POWER).min(max_y_offset);
        for bx in 0..sub_width {
            let x_offset = (bx << BLOCK_SIZE_POWER).min(max_x_offset);
            let mut sum = 0u32;
            let mut min = u32::MAX;
            let mut max = 0u32;
            for yy in 0..BLOCK_SIZE {
                let start = (y_offset + yy) * width + x_offset;
                for &p in &pixels[start..start + BLOCK_SIZE] {
                    let p = p as u32;
                    sum += p;
                    min = min.min(p);
                    max = max.max(p);
                }
            }

            let mut level = sum >> (BLOCK_SIZE_POWER * 2);
            if max - min <= MIN_DYNAMIC_RANGE {
                // Flat block: assume it is light unless the neighbourhood
                // says the local background is brighter than its minimum.
                level = min / 2;
                if by > 0 && bx > 0 {
                    let neighbour = (levels[by - 1][bx]
                        + 2 * levels[by][bx - 1]
                        + levels[by - 1][bx - 1])
                        / 4;
                    if min < neighbour {
                        level = neighbour;
                    }
                }
            }
            levels[by][bx] = level;
        }
    }
    levels
}

fn threshold_block(
    grid: &PixelGrid,
    binary: &mut BitMatrix,
    x_offset: usize,
    y_offset: usize,
    threshold: u32,
) {
    for yy in 0..BLOCK_SIZE {
        let y = y_offset + yy;
        for xx in 0..BLOCK_SIZE {
            let x = x_offset + xx;
            if (grid.get(x, y) as u32) <= threshold {
                binary.set(x, y, true);
            }
        }
    }
}

/// Convert grayscale image to binary using Otsu's thresholding method.
/// Returns a BitMatrix where true = black, false = white.
pub fn otsu_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    let threshold = calculate_otsu_threshold(gray);
    threshold_binarize(gray, width, height, threshold)
}

/// Otsu's optimal global threshold
fn calculate_otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut max_variance = 0.0;
    let mut optimal_threshold = 128u8;
    let mut below_count = 0.0;
    let mut below_sum = 0.0;

    for threshold in 1..=255usize {
        below_count += histogram[threshold - 1] as f64;
        below_sum += (threshold - 1) as f64 * histogram[threshold - 1] as f64;
        let above_count = total - below_count;
        if below_count == 0.0 || above_count == 0.0 {
            continue;
        }

        let below_mean = below_sum / below_count;
        let above_mean = (total_sum - below_sum) / above_count;
        let variance =
            (below_count / total) * (above_count / total) * (below_mean - above_mean).powi(2);

        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = threshold as u8;
        }
    }

    optimal_threshold
}

/// Simple global threshold binarization (`< threshold` is black)
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    let mut binary = BitMatrix::new(width, height);
    for y in 0..height {
        for x in 0..width {
            if gray[y * width + x] < threshold {
                binary.set(x, y, true);
            }
        }
    }
    binary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: usize, height: usize, cell: usize, dark: u8, light: u8) -> PixelGrid {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let black = ((x / cell) + (y / cell)) % 2 == 0;
                data.push(if black { dark } else { light });
            }
        }
        PixelGrid::new(width, height, data).unwrap()
    }

    #[test]
    fn test_threshold_binarize() {
        let gray = vec![100, 150, 200, 50]; // 2x2 image
        let binary = threshold_binarize(&gray, 2, 2, 128);

        assert!(binary.get(0, 0)); // 100 < 128
        assert!(!binary.get(1, 0)); // 150 >= 128
        assert!(!binary.get(0, 1)); // 200 >= 128
        assert!(binary.get(1, 1)); // 50 < 128
    }

    #[test]
    fn test_otsu_binarize() {
        let mut gray = vec![50u8; 50];
        gray.extend(vec![200u8; 50]);

        let binary = otsu_binarize(&gray, 10, 10);

        assert!(binary.get(0, 0)); // Dark
        assert!(!binary.get(0, 7)); // Light
    }

    #[test]
    fn test_hybrid_recovers_checkerboard() {
        let grid = checkerboard(96, 80, 6, 20, 230);
        let binary = binarize(&grid);
        for y in 0..80 {
            for x in 0..96 {
                let expected = ((x / 6) + (y / 6)) % 2 == 0;
                assert_eq!(binary.get(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_flat_image_is_not_black() {
        let grid = PixelGrid::filled(64, 64, 200).unwrap();
        let binary = binarize(&grid);
        assert_eq!(binary.count_ones(), 0);
    }

    #[test]
    fn test_uneven_lighting() {
        // Checkerboard under a strong left-to-right illumination ramp
        let width = 160;
        let height = 64;
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let gain = 0.35 + 0.65 * x as f32 / width as f32;
                let black = ((x / 8) + (y / 8)) % 2 == 0;
                let base = if black { 40.0 } else { 240.0 };
                data.push((base * gain) as u8);
            }
        }
        let grid = PixelGrid::new(width, height, data).unwrap();
        let binary = binarize(&grid);
        let mut wrong = 0;
        for y in 0..height {
            for x in 0..width {
                let expected = ((x / 8) + (y / 8)) % 2 == 0;
                if binary.get(x, y) != expected {
                    wrong += 1;
                }
            }
        }
        assert_eq!(wrong, 0);
    }

    #[test]
    fn test_small_image_uses_otsu() {
        let grid = checkerboard(16, 16, 4, 10, 240);
        let binary = binarize(&grid);
        assert!(binary.get(0, 0));
        assert!(!binary.get(4, 0));
    }
}
