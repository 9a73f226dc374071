/// RGB to luminance conversion and luminance normalization.
///
/// Y = 0.299*R + 0.587*G + 0.114*B, computed as (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Convert packed RGB bytes to luminance
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    let pixel_count = width * height;
    rgb.chunks_exact(3)
        .take(pixel_count)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect()
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

/// Linearly stretch luminance so the 1st and 99th percentiles map to 0 and
/// 255. Flat images come back unchanged.
pub fn stretch_contrast(gray: &[u8]) -> Vec<u8> {
    if gray.is_empty() {
        return Vec::new();
    }
    let mut histogram = [0usize; 256];
    for &v in gray {
        histogram[v as usize] += 1;
    }
    let clip = gray.len() / 100;
    let low = percentile(&histogram, clip);
    let high = percentile_from_top(&histogram, clip);
    if high <= low {
        return gray.to_vec();
    }
    let range = (high - low) as u32;
    gray.iter()
        .map(|&v| {
            let v = v.clamp(low, high) - low;
            ((v as u32 * 255 + range / 2) / range) as u8
        })
        .collect()
}

fn percentile(histogram: &[usize; 256], skip: usize) -> u8 {
    let mut seen = 0;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen > skip {
            return value as u8;
        }
    }
    255
}

fn percentile_from_top(histogram: &[usize; 256], skip: usize) -> u8 {
    let mut seen = 0;
    for (value, &count) in histogram.iter().enumerate().rev() {
        seen += count;
        if seen > skip {
            return value as u8;
        }
    }
    0
}
