/// Perspective sampling of the module grid
use log::trace;

use crate::detector::alignment::find_alignment_center;
use crate::detector::grouping::SymbolLocation;
use crate::error::MalformedReason;
use crate::models::{BitMatrix, ModuleGrid, Point, Version};
use crate::utils::geometry::PerspectiveTransform;

/// Module centers may fall this far outside the image before sampling fails
const MAX_OUTSIDE_PX: f64 = 2.0;
/// Sub-sample offsets within a module, in modules
const VOTE_OFFSETS: [f64; 3] = [-0.25, 0.0, 0.25];

/// A module grid together with where it was read from
#[derive(Debug, Clone)]
pub struct SampledSymbol {
    /// Sampled modules with vote confidence
    pub grid: ModuleGrid,
    /// Symbol corners in image coordinates: top-left, top-right,
    /// bottom-right, bottom-left
    pub position: [Point; 4],
    /// Whether an alignment pattern anchored the fourth point
    pub used_alignment: bool,
}

/// Transform from module space to image space anchored on the three finder
/// centers and a fourth point in module space
pub fn build_transform(
    location: &SymbolLocation,
    dimension: usize,
    fourth_src: Point,
    fourth_dst: Point,
) -> Option<PerspectiveTransform> {
    let n = dimension as f32;
    let src = [
        Point::new(3.5, 3.5),
        Point::new(n - 3.5, 3.5),
        Point::new(3.5, n - 3.5),
        fourth_src,
    ];
    let dst = [
        location.top_left,
        location.top_right,
        location.bottom_left,
        fourth_dst,
    ];
    PerspectiveTransform::from_points(&src, &dst)
}

/// Transform for `location` at `dimension`: parallelogram completion first,
/// then re-anchored on the bottom-right alignment pattern when one is found
pub fn locate_transform(
    binary: &BitMatrix,
    location: &SymbolLocation,
    dimension: usize,
) -> Result<(PerspectiveTransform, bool), MalformedReason> {
    let version =
        Version::from_dimension(dimension).ok_or(MalformedReason::InvalidDimension(dimension))?;
    let n = dimension as f32;
    let bottom_right = Point::new(
        location.top_right.x + location.bottom_left.x - location.top_left.x,
        location.top_right.y + location.bottom_left.y - location.top_left.y,
    );
    let parallelogram = build_transform(location, dimension, Point::new(n - 3.5, n - 3.5), bottom_right)
        .ok_or(MalformedReason::Sampling("degenerate finder geometry"))?;

    if version.number() < 2 {
        return Ok((parallelogram, false));
    }

    let align_src = Point::new(n - 6.5, n - 6.5);
    let predicted = parallelogram.transform(&align_src);
    let refined = find_alignment_center(binary, predicted, location.module_size)
        .and_then(|found| build_transform(location, dimension, align_src, found));
    match refined {
        Some(transform) => Ok((transform, true)),
        None => {
            trace!("no alignment pattern near ({:.1}, {:.1})", predicted.x, predicted.y);
            Ok((parallelogram, false))
        }
    }
}

/// Sample an N x N grid through `transform`. Every module is a 3x3 vote at
/// quarter-module offsets; its confidence is the vote margin.
pub fn sample_with_transform(
    binary: &BitMatrix,
    transform: &PerspectiveTransform,
    dimension: usize,
) -> Result<ModuleGrid, MalformedReason> {
    let width = binary.width() as f64;
    let height = binary.height() as f64;
    let mut modules = BitMatrix::square(dimension);
    let mut confidence = vec![0u8; dimension * dimension];

    for my in 0..dimension {
        for mx in 0..dimension {
            let cx = mx as f64 + 0.5;
            let cy = my as f64 + 0.5;
            let (px, py) = transform.transform_f64(cx, cy);
            if !px.is_finite()
                || !py.is_finite()
                || px < -MAX_OUTSIDE_PX
                || py < -MAX_OUTSIDE_PX
                || px > width + MAX_OUTSIDE_PX
                || py > height + MAX_OUTSIDE_PX
            {
                return Err(MalformedReason::Sampling("module center outside the image"));
            }

            let mut black = 0i32;
            for oy in VOTE_OFFSETS {
                for ox in VOTE_OFFSETS {
                    let (sx, sy) = transform.transform_f64(cx + ox, cy + oy);
                    if sx.is_finite()
                        && sy.is_finite()
                        && binary.get_i(sx.floor() as isize, sy.floor() as isize)
                    {
                        black += 1;
                    }
                }
            }
            modules.set(mx, my, black >= 5);
            confidence[my * dimension + mx] = (2 * black - 9).unsigned_abs() as u8;
        }
    }
    Ok(ModuleGrid::with_confidence(modules, confidence))
}

/// Locate the transform and sample `location` at `dimension`
pub fn sample_grid(
    binary: &BitMatrix,
    location: &SymbolLocation,
    dimension: usize,
) -> Result<SampledSymbol, MalformedReason> {
    let (transform, used_alignment) = locate_transform(binary, location, dimension)?;
    let grid = sample_with_transform(binary, &transform, dimension)?;
    let n = dimension as f32;
    let position = [
        transform.transform(&Point::new(0.0, 0.0)),
        transform.transform(&Point::new(n, 0.0)),
        transform.transform(&Point::new(n, n)),
        transform.transform(&Point::new(0.0, n)),
    ];
    Ok(SampledSymbol {
        grid,
        position,
        used_alignment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(tl: (f32, f32), tr: (f32, f32), bl: (f32, f32), module: f32, dim: usize) -> SymbolLocation {
        SymbolLocation {
            top_left: Point::new(tl.0, tl.1),
            top_right: Point::new(tr.0, tr.1),
            bottom_left: Point::new(bl.0, bl.1),
            module_size: module,
            dimension: dim,
            rotation: 0.0,
            score: 1.0,
            finders: [0, 1, 2],
        }
    }

    /// Checkerboard of 21 modules at 5 px each, offset by 10 px
    fn checkerboard() -> BitMatrix {
        let mut matrix = BitMatrix::new(125, 125);
        for y in 0..105 {
            for x in 0..105 {
                matrix.set(x + 10, y + 10, (x / 5 + y / 5) % 2 == 0);
            }
        }
        matrix
    }

    #[test]
    fn test_samples_axis_aligned_grid() {
        let matrix = checkerboard();
        let loc = location((27.5, 27.5), (97.5, 27.5), (27.5, 97.5), 5.0, 21);
        let sampled = sample_grid(&matrix, &loc, 21).unwrap();
        assert!(!sampled.used_alignment);
        for y in 0..21 {
            for x in 0..21 {
                assert_eq!(sampled.grid.get(x, y), (x + y) % 2 == 0, "({x}, {y})");
                assert_eq!(sampled.grid.confidence(x, y), 9);
            }
        }
        assert!(sampled.position[0].distance(&Point::new(10.0, 10.0)) < 1e-3);
        assert!(sampled.position[2].distance(&Point::new(115.0, 115.0)) < 1e-3);
    }

    #[test]
    fn test_invalid_dimension() {
        let matrix = checkerboard();
        let loc = location((27.5, 27.5), (97.5, 27.5), (27.5, 97.5), 5.0, 22);
        assert!(matches!(
            sample_grid(&matrix, &loc, 22),
            Err(MalformedReason::InvalidDimension(22))
        ));
    }

    #[test]
    fn test_symbol_past_the_edge() {
        let matrix = BitMatrix::new(60, 60);
        let loc = location((27.5, 27.5), (97.5, 27.5), (27.5, 97.5), 5.0, 21);
        assert!(matches!(
            sample_grid(&matrix, &loc, 21),
            Err(MalformedReason::Sampling(_))
        ));
    }
}
