/// Timing pattern scoring
/// Row 6 and column 6 alternate dark/light between the finders; a triple of
/// finders that really belongs to one symbol reproduces that alternation.
use crate::models::{BitMatrix, Point};

/// Affine map from module coordinates to image coordinates spanned by the
/// three finder centers (the parallelogram approximation)
#[derive(Debug, Clone, Copy)]
pub struct ModuleFrame {
    origin: Point,
    u: (f32, f32),
    v: (f32, f32),
}

impl ModuleFrame {
    /// Frame spanned by the finder centers of an `dimension` module symbol
    pub fn new(top_left: &Point, top_right: &Point, bottom_left: &Point, dimension: usize) -> Self {
        let span = dimension as f32 - 7.0;
        let (ux, uy) = top_left.to(top_right);
        let (vx, vy) = top_left.to(bottom_left);
        Self {
            origin: *top_left,
            u: (ux / span, uy / span),
            v: (vx / span, vy / span),
        }
    }

    /// Image position of the center of module (mx, my)
    pub fn module_center(&self, mx: usize, my: usize) -> Point {
        let a = mx as f32 + 0.5 - 3.5;
        let b = my as f32 + 0.5 - 3.5;
        Point::new(
            self.origin.x + self.u.0 * a + self.v.0 * b,
            self.origin.y + self.u.1 * a + self.v.1 * b,
        )
    }
}

/// Fraction of timing modules (row 6 and column 6, modules 8..N-9) with the
/// expected color: dark at even indices
pub fn timing_score(
    matrix: &BitMatrix,
    top_left: &Point,
    top_right: &Point,
    bottom_left: &Point,
    dimension: usize,
) -> f32 {
    if dimension < 21 {
        return 0.0;
    }
    let frame = ModuleFrame::new(top_left, top_right, bottom_left, dimension);
    let read = |p: Point| {
        p.is_finite() && matrix.get_i(p.x.floor() as isize, p.y.floor() as isize)
    };

    let mut matches = 0usize;
    let mut total = 0usize;
    for i in 8..=dimension - 9 {
        let expected = i % 2 == 0;
        if read(frame.module_center(i, 6)) == expected {
            matches += 1;
        }
        if read(frame.module_center(6, i)) == expected {
            matches += 1;
        }
        total += 2;
    }
    matches as f32 / total as f32
}
