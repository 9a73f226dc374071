/// 2D point with sub-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance (no sqrt)
    pub fn distance_squared(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Vector from `self` to `other`
    pub fn to(&self, other: &Point) -> (f32, f32) {
        (other.x - self.x, other.y - self.y)
    }

    /// Both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Z component of the cross product of `(b - a)` and `(c - a)`
pub fn cross(a: &Point, b: &Point, c: &Point) -> f32 {
    let (x1, y1) = a.to(b);
    let (x2, y2) = a.to(c);
    x1 * y2 - y1 * x2
}
