use crate::models::{BitMatrix, Version};

/// Function module mask for a specific QR version.
/// true = function module (not data), false = data module.
pub struct FunctionMask {
    mask: BitMatrix,
    version: Version,
}

impl FunctionMask {
    /// Mark every function module of `version`
    pub fn new(version: Version) -> Self {
        let size = version.dimension();
        let mut mask = BitMatrix::square(size);

        // Finder patterns + separators (8x8 areas)
        Self::mark_finder_area(&mut mask, 0, 0);
        Self::mark_finder_area(&mut mask, size - 7, 0);
        Self::mark_finder_area(&mut mask, 0, size - 7);

        // Timing patterns (row 6 and column 6)
        for i in 0..size {
            mask.set(6, i, true);
            mask.set(i, 6, true);
        }

        for (cx, cy) in alignment_pattern_centers(version) {
            for y in cy - 2..=cy + 2 {
                for x in cx - 2..=cx + 2 {
                    mask.set(x, y, true);
                }
            }
        }

        // Format info areas
        for i in 0..9 {
            mask.set(8, i, true);
            mask.set(i, 8, true);
        }
        for i in 0..8 {
            mask.set(size - 1 - i, 8, true);
            mask.set(8, size - 1 - i, true);
        }

        // Dark module
        mask.set(8, size - 8, true);

        if version.has_version_info() {
            for dy in 0..6 {
                for dx in 0..3 {
                    mask.set(size - 11 + dx, dy, true);
                    mask.set(dy, size - 11 + dx, true);
                }
            }
        }

        Self { mask, version }
    }

    /// Modules per side
    pub fn size(&self) -> usize {
        self.mask.width()
    }

    /// Version the mask was built for
    pub fn version(&self) -> Version {
        self.version
    }

    /// True for finder, timing, alignment, format and version modules
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    /// Modules left for data and EC codewords
    pub fn data_modules_count(&self) -> usize {
        let size = self.size();
        size * size - self.mask.count_ones()
    }

    fn mark_finder_area(mask: &mut BitMatrix, x: usize, y: usize) {
        let size = mask.width();
        let start_x = x.saturating_sub(1);
        let start_y = y.saturating_sub(1);
        let end_x = (x + 8).min(size);
        let end_y = (y + 8).min(size);
        for yy in start_y..end_y {
            for xx in start_x..end_x {
                mask.set(xx, yy, true);
            }
        }
    }
}

/// Alignment pattern center coordinates (shared by rows and columns).
pub fn alignment_pattern_positions(version: Version) -> Vec<usize> {
    let v = version.number() as usize;
    if v == 1 {
        return Vec::new();
    }
    let num_align = v / 7 + 2;
    let step = (v * 8 + num_align * 3 + 5) / (num_align * 4 - 4) * 2;
    let size = version.dimension();

    let mut positions: Vec<usize> = (0..num_align - 1).map(|i| size - 7 - i * step).collect();
    positions.push(6);
    positions.reverse();
    positions
}

/// Every alignment pattern center (x, y), skipping the three finder corners
pub fn alignment_pattern_centers(version: Version) -> Vec<(usize, usize)> {
    let positions = alignment_pattern_positions(version);
    let last = positions.len().saturating_sub(1);
    let mut centers = Vec::new();
    for (i, &cy) in positions.iter().enumerate() {
        for (j, &cx) in positions.iter().enumerate() {
            let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
            if !corner {
                centers.push((cx, cy));
            }
        }
    }
    centers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::tables::raw_data_modules;

    fn v(n: u8) -> Version {
        Version::new(n).unwrap()
    }

    #[test]
    fn test_alignment_positions() {
        assert!(alignment_pattern_positions(v(1)).is_empty());
        assert_eq!(alignment_pattern_positions(v(2)), vec![6, 18]);
        assert_eq!(alignment_pattern_positions(v(7)), vec![6, 22, 38]);
        assert_eq!(alignment_pattern_positions(v(14)), vec![6, 26, 46, 66]);
        assert_eq!(alignment_pattern_positions(v(32)), vec![6, 34, 60, 86, 112, 138]);
        assert_eq!(
            alignment_pattern_positions(v(36)),
            vec![6, 24, 50, 76, 102, 128, 154]
        );
        assert_eq!(
            alignment_pattern_positions(v(40)),
            vec![6, 30, 58, 86, 114, 142, 170]
        );
    }

    #[test]
    fn test_alignment_centers_skip_finders() {
        assert_eq!(alignment_pattern_centers(v(2)), vec![(18, 18)]);
        assert_eq!(alignment_pattern_centers(v(7)).len(), 6);
    }

    #[test]
    fn test_data_modules_match_capacity() {
        for n in 1..=40 {
            let mask = FunctionMask::new(v(n));
            assert_eq!(mask.data_modules_count(), raw_data_modules(v(n)), "v{n}");
        }
    }

    #[test]
    fn test_function_regions() {
        let mask = FunctionMask::new(v(7));
        assert!(mask.is_function(0, 0));
        assert!(mask.is_function(7, 7));
        assert!(mask.is_function(8, 37));
        assert!(mask.is_function(34, 5));
        assert!(mask.is_function(5, 34));
        assert!(mask.is_function(22, 22));
        assert!(!mask.is_function(9, 9));
        assert!(!mask.is_function(44, 44));
    }
}
