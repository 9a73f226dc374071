/// Alignment pattern search
/// The 5x5 alignment pattern (dark ring, light ring, dark center) near the
/// bottom-right corner pins the fourth point of the perspective transform for
/// version 2 and above.
use log::trace;

use crate::models::{BitMatrix, Point};

/// Mismatching template samples tolerated in a match (out of 25)
pub const MAX_TEMPLATE_MISMATCH: usize = 8;

/// Search within four modules of `predicted` for the pixel that best matches
/// the alignment template, then refine it to the middle of the center module
pub fn find_alignment_center(
    binary: &BitMatrix,
    predicted: Point,
    module_size: f32,
) -> Option<Point> {
    if !predicted.is_finite() || module_size < 1.0 {
        return None;
    }

    let radius = (module_size * 4.0).max(4.0);
    let min_x = (predicted.x - radius).floor().max(0.0) as isize;
    let max_x = (predicted.x + radius)
        .ceil()
        .min(binary.width().saturating_sub(1) as f32) as isize;
    let min_y = (predicted.y - radius).floor().max(0.0) as isize;
    let max_y = (predicted.y + radius)
        .ceil()
        .min(binary.height().saturating_sub(1) as f32) as isize;

    let mut best: Option<(Point, usize, f32)> = None;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let center = Point::new(x as f32, y as f32);
            let Some(mismatch) = alignment_pattern_mismatch(binary, &center, module_size) else {
                continue;
            };
            let distance = center.distance_squared(&predicted);
            match best {
                Some((_, best_mismatch, best_distance))
                    if mismatch > best_mismatch
                        || (mismatch == best_mismatch && distance >= best_distance) => {}
                _ => best = Some((center, mismatch, distance)),
            }
        }
    }

    match best {
        Some((center, mismatch, _)) if mismatch <= MAX_TEMPLATE_MISMATCH => {
            let refined = refine_to_run_midpoints(binary, center);
            trace!(
                "alignment at ({:.1}, {:.1}), predicted ({:.1}, {:.1}), mismatch {}",
                refined.x, refined.y, predicted.x, predicted.y, mismatch
            );
            Some(refined)
        }
        _ => None,
    }
}

/// Template samples that disagree with the pattern, or `None` if the
/// template does not fit inside the image
pub fn alignment_pattern_mismatch(
    binary: &BitMatrix,
    center: &Point,
    module_size: f32,
) -> Option<usize> {
    let mut mismatches = 0usize;
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let expected_black = dx.abs() == 2 || dy.abs() == 2 || (dx == 0 && dy == 0);
            let ix = (center.x + dx as f32 * module_size).round() as isize;
            let iy = (center.y + dy as f32 * module_size).round() as isize;
            if ix < 0
                || iy < 0
                || (ix as usize) >= binary.width()
                || (iy as usize) >= binary.height()
            {
                return None;
            }
            if binary.get(ix as usize, iy as usize) != expected_black {
                mismatches += 1;
            }
        }
    }
    Some(mismatches)
}

/// Center of the dark run through `p`, horizontally then vertically
fn refine_to_run_midpoints(binary: &BitMatrix, p: Point) -> Point {
    let (x, y) = (p.x as isize, p.y as isize);
    if !binary.get_i(x, y) {
        return p;
    }
    let run_mid = |at: &dyn Fn(isize) -> bool, start: isize| {
        let mut lo = start;
        while at(lo - 1) {
            lo -= 1;
        }
        let mut hi = start;
        while at(hi + 1) {
            hi += 1;
        }
        (lo + hi + 1) as f32 / 2.0
    };
    let cx = run_mid(&|i| binary.get_i(i, y), x);
    let cy = run_mid(&|i| binary.get_i(cx as isize, i), y);
    Point::new(cx, cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_alignment(matrix: &mut BitMatrix, x0: usize, y0: usize, module: usize) {
        for my in 0..5 {
            for mx in 0..5 {
                let ring = (mx as isize - 2).abs().max((my as isize - 2).abs());
                if ring != 1 {
                    for dy in 0..module {
                        for dx in 0..module {
                            matrix.set(x0 + mx * module + dx, y0 + my * module + dy, true);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_finds_offset_pattern() {
        let mut matrix = BitMatrix::new(100, 100);
        draw_alignment(&mut matrix, 40, 44, 4);
        // true center is (50, 54)
        let found = find_alignment_center(&matrix, Point::new(45.0, 58.0), 4.0).unwrap();
        assert!((found.x - 50.0).abs() < 0.01, "{found:?}");
        assert!((found.y - 54.0).abs() < 0.01, "{found:?}");
    }

    #[test]
    fn test_blank_area_has_no_pattern() {
        let matrix = BitMatrix::new(100, 100);
        assert!(find_alignment_center(&matrix, Point::new(50.0, 50.0), 4.0).is_none());
    }

    #[test]
    fn test_template_outside_image() {
        let matrix = BitMatrix::new(10, 10);
        assert_eq!(
            alignment_pattern_mismatch(&matrix, &Point::new(1.0, 1.0), 2.0),
            None
        );
    }
}
