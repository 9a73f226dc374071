/// Unmask QR code by applying the mask pattern
use crate::decoder::function_mask::FunctionMask;
use crate::models::{BitMatrix, MaskPattern};

/// XOR every data module with the mask pattern. Applying it twice is a no-op,
/// so the encoder uses the same routine.
pub fn unmask(matrix: &mut BitMatrix, mask_pattern: MaskPattern, func: &FunctionMask) {
    let size = func.size().min(matrix.width()).min(matrix.height());

    for y in 0..size {
        for x in 0..size {
            if !func.is_function(x, y) && mask_pattern.is_masked(y, x) {
                matrix.toggle(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Version;

    #[test]
    fn test_unmask() {
        let mut matrix = BitMatrix::square(21);
        matrix.set(10, 10, true);
        matrix.set(10, 11, true);

        let func = FunctionMask::new(Version::new(1).unwrap());
        unmask(&mut matrix, MaskPattern::Pattern0, &func);

        // Pattern0 toggles where (row + col) is even
        assert!(!matrix.get(10, 10));
        assert!(matrix.get(10, 11));
        assert!(matrix.get(11, 11));
        // function modules are untouched
        assert!(!matrix.get(0, 0));
    }

    #[test]
    fn test_unmask_twice_is_identity() {
        let func = FunctionMask::new(Version::new(3).unwrap());
        let mut matrix = BitMatrix::square(29);
        for i in 0..29 {
            matrix.set(i, (i * 7) % 29, true);
        }
        let original = matrix.clone();
        for mask in MaskPattern::ALL {
            unmask(&mut matrix, mask, &func);
            assert_ne!(matrix, original);
            unmask(&mut matrix, mask, &func);
            assert_eq!(matrix, original);
        }
    }
}
