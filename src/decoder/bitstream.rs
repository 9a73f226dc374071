/// Codeword extraction from the module grid along the zig-zag placement path
use crate::decoder::function_mask::FunctionMask;
use crate::models::ModuleGrid;

/// Data module positions (x, y) in placement order: column pairs from the
/// right edge, skipping the vertical timing column, alternating direction.
pub fn placement_order(func: &FunctionMask) -> Vec<(usize, usize)> {
    let dimension = func.size();
    let mut order = Vec::with_capacity(func.data_modules_count());
    let mut upward = true;
    let mut right = dimension as isize - 1;

    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        for step in 0..dimension {
            let y = if upward { dimension - 1 - step } else { step };
            for x in [right as usize, right as usize - 1] {
                if !func.is_function(x, y) {
                    order.push((x, y));
                }
            }
        }
        upward = !upward;
        right -= 2;
    }
    order
}

/// Codewords read from a grid, with the lowest module confidence of each
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCodewords {
    /// Codewords in placement order
    pub bytes: Vec<u8>,
    /// Weakest module vote margin per codeword
    pub confidence: Vec<u8>,
}

/// Extract raw codewords from an (already unmasked) grid
pub struct BitstreamExtractor;

impl BitstreamExtractor {
    /// Read whole codewords MSB first; remainder bits are dropped
    pub fn extract(grid: &ModuleGrid, func: &FunctionMask) -> RawCodewords {
        let order = placement_order(func);
        let count = order.len() / 8;
        let mut bytes = Vec::with_capacity(count);
        let mut confidence = Vec::with_capacity(count);

        for chunk in order.chunks_exact(8) {
            let mut byte = 0u8;
            let mut lowest = u8::MAX;
            for &(x, y) in chunk {
                byte = (byte << 1) | grid.get(x, y) as u8;
                lowest = lowest.min(grid.confidence(x, y));
            }
            bytes.push(byte);
            confidence.push(lowest);
        }

        RawCodewords { bytes, confidence }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::tables::raw_data_modules;
    use crate::models::{BitMatrix, Version};

    #[test]
    fn test_placement_starts_bottom_right() {
        let func = FunctionMask::new(Version::new(1).unwrap());
        let order = placement_order(&func);
        assert_eq!(&order[..4], &[(20, 20), (19, 20), (20, 19), (19, 19)]);
        assert_eq!(order.len(), 208);
        // the first downward column pair starts at the top of the data area
        assert_eq!(order[24], (18, 9));
    }

    #[test]
    fn test_placement_covers_every_data_module() {
        for n in [1u8, 2, 7, 21, 40] {
            let version = Version::new(n).unwrap();
            let func = FunctionMask::new(version);
            let order = placement_order(&func);
            assert_eq!(order.len(), raw_data_modules(version));
            let mut seen = BitMatrix::square(func.size());
            for &(x, y) in &order {
                assert!(!seen.get(x, y));
                seen.set(x, y, true);
            }
        }
    }

    #[test]
    fn test_extract_bytes_and_confidence() {
        let version = Version::new(1).unwrap();
        let func = FunctionMask::new(version);
        let order = placement_order(&func);
        let mut matrix = BitMatrix::square(21);
        // first codeword 0b1010_0000
        matrix.set(order[0].0, order[0].1, true);
        matrix.set(order[2].0, order[2].1, true);
        let mut confidence = vec![9u8; 21 * 21];
        let (x, y) = order[9];
        confidence[y * 21 + x] = 1;

        let grid = ModuleGrid::with_confidence(matrix, confidence);
        let raw = BitstreamExtractor::extract(&grid, &func);
        assert_eq!(raw.bytes.len(), 26);
        assert_eq!(raw.bytes[0], 0b1010_0000);
        assert_eq!(raw.confidence[0], 9);
        assert_eq!(raw.confidence[1], 1);
    }
}
