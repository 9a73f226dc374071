/// Grouping finder patterns into symbol locations
use log::{debug, trace};

use crate::config::DecoderConfig;
use crate::detector::finder::FinderPattern;
use crate::detector::timing::timing_score;
use crate::models::{BitMatrix, Point, Version, point::cross};

/// Largest accepted ratio between the two legs of the finder triangle
const MAX_LEG_RATIO: f32 = 1.4;
/// Leg-based dimension estimates may disagree by this many modules
const MAX_DIMENSION_SPREAD: usize = 8;
/// Largest accepted Pythagoras residual, see [`pythagoras_distortion`]
const MAX_PYTHAGORAS_DISTORTION: f32 = 1.0;

/// Three finder centers that form one QR symbol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolLocation {
    /// Center of the top-left finder
    pub top_left: Point,
    /// Center of the top-right finder
    pub top_right: Point,
    /// Center of the bottom-left finder
    pub bottom_left: Point,
    /// Module size measured along the finder-to-finder lines, in pixels
    pub module_size: f32,
    /// Estimated modules per side (`4v + 17`)
    pub dimension: usize,
    /// Angle of the top edge in radians, clockwise from the x axis
    pub rotation: f32,
    /// Geometry plus timing score; higher is better
    pub score: f32,
    /// Indices of the finders in the candidate list (top-left, top-right, bottom-left)
    pub finders: [usize; 3],
}

impl SymbolLocation {
    /// Version implied by the estimated dimension
    pub fn version(&self) -> Option<Version> {
        Version::from_dimension(self.dimension)
    }
}

/// Modules spanned by a finder-to-finder distance, snapped to `4v + 17`
pub fn estimate_dimension_from_distance(distance: f32, module_size: f32) -> Option<usize> {
    if module_size <= 0.0 || !distance.is_finite() {
        return None;
    }
    let raw_dim = (distance / module_size).round() + 7.0;
    if raw_dim < 19.0 {
        return None;
    }
    let version = ((raw_dim - 17.0) / 4.0).round() as i32;
    if !(1..=40).contains(&version) {
        return None;
    }
    Some(17 + 4 * version as usize)
}

/// Residual of `c = a + b = 2a = 2b` for squared legs `a`, `b` and squared
/// hypotenuse `c`, relative to `c`; zero for an isosceles right triangle
pub fn pythagoras_distortion(top_left: &Point, top_right: &Point, bottom_left: &Point) -> f32 {
    let a = top_left.distance_squared(top_right);
    let b = top_left.distance_squared(bottom_left);
    let c = top_right.distance_squared(bottom_left);
    if c <= 0.0 {
        return f32::INFINITY;
    }
    ((c - 2.0 * a).abs() + (c - 2.0 * b).abs()) / c
}

/// Pixels covered by the black-white-black run that starts at `from` and heads
/// towards `to`, walking a Bresenham line. `None` if the line ends first.
fn black_white_black_run(matrix: &BitMatrix, from: (i32, i32), to: (i32, i32)) -> Option<f32> {
    let steep = (to.1 - from.1).abs() > (to.0 - from.0).abs();
    let (from, to) = if steep {
        ((from.1, from.0), (to.1, to.0))
    } else {
        (from, to)
    };
    let dx = (to.0 - from.0).abs();
    let dy = (to.1 - from.1).abs();
    let x_step = if from.0 < to.0 { 1 } else { -1 };
    let y_step = if from.1 < to.1 { 1 } else { -1 };
    let span = |x: i32, y: i32| (((x - from.0).pow(2) + (y - from.1).pow(2)) as f32).sqrt();

    // state 0: inside the center, 1: white ring, 2: black ring
    let mut state = 0;
    let mut error = -dx / 2;
    let (mut x, mut y) = from;
    while x != to.0 + x_step {
        let (px, py) = if steep { (y, x) } else { (x, y) };
        if (state == 1) == matrix.get(px as usize, py as usize) {
            if state == 2 {
                return Some(span(x, y));
            }
            state += 1;
        }
        error += dy;
        if error > 0 {
            if y == to.1 {
                break;
            }
            y += y_step;
            error -= dx;
        }
        x += x_step;
    }
    (state == 2).then(|| span(to.0 + x_step, to.1))
}

/// Width of a finder at `from` measured through its center along the line to
/// `to`, covering both sides; about seven modules
fn finder_width_along(matrix: &BitMatrix, from: &Point, to: &Point) -> Option<f32> {
    let (fx, fy) = (from.x as i32, from.y as i32);
    let (tx, ty) = (to.x as i32, to.y as i32);
    let forward = black_white_black_run(matrix, (fx, fy), (tx, ty))?;

    // mirror `to` through `from`, clamped to the image
    let width = matrix.width() as i32;
    let height = matrix.height() as i32;
    let mut scale = 1.0f32;
    let mut other_x = fx - (tx - fx);
    if other_x < 0 {
        scale = fx as f32 / (fx - other_x) as f32;
        other_x = 0;
    } else if other_x >= width {
        scale = (width - 1 - fx) as f32 / (other_x - fx) as f32;
        other_x = width - 1;
    }
    let mut other_y = (fy as f32 - (ty - fy) as f32 * scale) as i32;
    scale = 1.0;
    if other_y < 0 {
        scale = fy as f32 / (fy - other_y) as f32;
        other_y = 0;
    } else if other_y >= height {
        scale = (height - 1 - fy) as f32 / (other_y - fy) as f32;
        other_y = height - 1;
    }
    other_x = (fx as f32 + (other_x - fx) as f32 * scale) as i32;

    let backward = black_white_black_run(matrix, (fx, fy), (other_x, other_y))?;
    // the center pixel is counted by both walks
    Some(forward + backward - 1.0)
}

/// Module size along the line joining two finders, measured through both
pub fn module_size_between(matrix: &BitMatrix, a: &Point, b: &Point) -> Option<f32> {
    match (finder_width_along(matrix, a, b), finder_width_along(matrix, b, a)) {
        (Some(wa), Some(wb)) => Some((wa + wb) / 14.0),
        (Some(w), None) | (None, Some(w)) => Some(w / 7.0),
        (None, None) => None,
    }
}

/// Module size of a symbol from runs along its two finder legs. The finders'
/// own estimates come from horizontal runs and grow by 1/cos of the rotation,
/// so they only serve as a plausibility bound and fallback.
fn measure_module_size(
    matrix: &BitMatrix,
    tl: &FinderPattern,
    tr: &FinderPattern,
    bl: &FinderPattern,
) -> f32 {
    let finder_average = (tl.module_size + tr.module_size + bl.module_size) / 3.0;
    let legs: Vec<f32> = [
        module_size_between(matrix, &tl.center, &tr.center),
        module_size_between(matrix, &tl.center, &bl.center),
    ]
    .into_iter()
    .flatten()
    .filter(|m| m.is_finite() && *m >= 0.5 * finder_average && *m <= 1.5 * finder_average)
    .collect();
    if legs.is_empty() {
        finder_average
    } else {
        legs.iter().sum::<f32>() / legs.len() as f32
    }
}

/// Identify the corner with the right angle; returns (top-left, top-right,
/// bottom-left) indices into `triple` and |cos| at that corner
fn order_finder_patterns(triple: [&FinderPattern; 3]) -> Option<([usize; 3], f32)> {
    let mut best_idx = 0usize;
    let mut best_cos = f32::INFINITY;
    for i in 0..3 {
        let p = &triple[i].center;
        let (v1x, v1y) = p.to(&triple[(i + 1) % 3].center);
        let (v2x, v2y) = p.to(&triple[(i + 2) % 3].center);
        let denom = (v1x * v1x + v1y * v1y).sqrt() * (v2x * v2x + v2y * v2y).sqrt();
        if denom == 0.0 {
            return None;
        }
        let cos = ((v1x * v2x + v1y * v2y) / denom).abs();
        if cos < best_cos {
            best_cos = cos;
            best_idx = i;
        }
    }

    let p1 = (best_idx + 1) % 3;
    let p2 = (best_idx + 2) % 3;
    let turn = cross(&triple[best_idx].center, &triple[p1].center, &triple[p2].center);
    let (tr, bl) = if turn > 0.0 { (p1, p2) } else { (p2, p1) };
    Some(([best_idx, tr, bl], best_cos))
}

/// Test one triple of finders; returns the location it implies, if consistent
pub fn evaluate_triple(
    matrix: &BitMatrix,
    patterns: &[FinderPattern],
    indices: [usize; 3],
    config: &DecoderConfig,
) -> Option<SymbolLocation> {
    let triple = indices.map(|i| &patterns[i]);

    let min_size = triple.iter().map(|p| p.module_size).fold(f32::INFINITY, f32::min);
    let max_size = triple.iter().map(|p| p.module_size).fold(0.0f32, f32::max);
    if min_size < 1.0 || max_size / min_size > config.module_size_tolerance {
        return None;
    }

    let (order, cos) = order_finder_patterns(triple)?;
    if cos > config.right_angle_tolerance {
        return None;
    }
    let [tl, tr, bl] = order.map(|i| triple[i]);

    let d_tr = tl.center.distance(&tr.center);
    let d_bl = tl.center.distance(&bl.center);
    let leg_ratio = d_tr.max(d_bl) / d_tr.min(d_bl);
    if leg_ratio > MAX_LEG_RATIO {
        return None;
    }
    let distortion = pythagoras_distortion(&tl.center, &tr.center, &bl.center);
    if distortion > MAX_PYTHAGORAS_DISTORTION {
        return None;
    }

    let module_size = measure_module_size(matrix, tl, tr, bl);
    let dim_tr = estimate_dimension_from_distance(d_tr, module_size)?;
    let dim_bl = estimate_dimension_from_distance(d_bl, module_size)?;
    if dim_tr.abs_diff(dim_bl) > MAX_DIMENSION_SPREAD {
        return None;
    }
    let dimension = estimate_dimension_from_distance((d_tr + d_bl) / 2.0, module_size)?;

    let timing = timing_score(matrix, &tl.center, &tr.center, &bl.center, dimension);
    if timing < config.min_timing_score {
        trace!(
            "triple {:?} rejected: timing {:.2} at dimension {}",
            indices, timing, dimension
        );
        return None;
    }

    let geometry = cos + (max_size / min_size - 1.0) + (leg_ratio - 1.0);
    let (dx, dy) = tl.center.to(&tr.center);
    Some(SymbolLocation {
        top_left: tl.center,
        top_right: tr.center,
        bottom_left: bl.center,
        module_size,
        dimension,
        rotation: dy.atan2(dx),
        score: timing - geometry,
        finders: order.map(|i| indices[i]),
    })
}

/// Every consistent triple, best first, chosen greedily so that no finder is
/// shared between two locations
pub fn locate_symbols(
    matrix: &BitMatrix,
    patterns: &[FinderPattern],
    config: &DecoderConfig,
) -> Vec<SymbolLocation> {
    let n = patterns.len();
    let mut accepted = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                if let Some(location) = evaluate_triple(matrix, patterns, [i, j, k], config) {
                    accepted.push(location);
                }
            }
        }
    }

    accepted.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut used = vec![false; n];
    let mut selected = Vec::new();
    for location in accepted {
        if selected.len() >= config.max_symbols {
            break;
        }
        if location.finders.iter().any(|&f| used[f]) {
            continue;
        }
        for &f in &location.finders {
            used[f] = true;
        }
        debug!(
            "location v~{} at ({:.1}, {:.1}) module {:.2} score {:.2}",
            (location.dimension - 17) / 4,
            location.top_left.x,
            location.top_left.y,
            location.module_size,
            location.score
        );
        selected.push(location);
    }
    selected
}
