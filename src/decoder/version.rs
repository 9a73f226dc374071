/// Version information extraction for QR codes v7+
use log::trace;

use crate::decoder::bch::{nearest_version, version_codeword};
use crate::error::MalformedReason;
use crate::models::{ModuleGrid, Version};

/// Largest number of bit errors accepted in a version copy
pub const MAX_VERSION_ERRORS: u32 = 3;

/// Positions (x, y) of bit `k` (0 = least significant) in the copy left of
/// the top-right finder and in the transposed copy above the bottom-left one
pub fn version_bit_position(dimension: usize, k: usize) -> ((usize, usize), (usize, usize)) {
    let a = dimension - 11 + k % 3;
    let b = k / 3;
    ((a, b), (b, a))
}

/// Version info is 18 bits (6 data + 12 ECC) for versions 7-40
pub struct VersionInfo;

impl VersionInfo {
    /// Read the version from a grid of at least 45 modules.
    /// Both copies are compared against every valid codeword.
    pub fn read(grid: &ModuleGrid) -> Result<Version, MalformedReason> {
        let dimension = grid.dimension();
        if dimension < 45 {
            return Err(MalformedReason::InvalidDimension(dimension));
        }

        let mut top_right = 0u32;
        let mut bottom_left = 0u32;
        for k in 0..18 {
            let ((tx, ty), (bx, by)) = version_bit_position(dimension, k);
            top_right |= (grid.get(tx, ty) as u32) << k;
            bottom_left |= (grid.get(bx, by) as u32) << k;
        }

        let (number, distance) = nearest_version(&[top_right, bottom_left]);
        trace!("version copies {top_right:#07x} / {bottom_left:#07x} -> v{number} (d={distance})");
        if distance > MAX_VERSION_ERRORS {
            return Err(MalformedReason::VersionUncorrectable);
        }
        Version::new(number).ok_or(MalformedReason::VersionUncorrectable)
    }

    /// The 18-bit codeword written for `version`
    pub fn codeword(version: Version) -> u32 {
        version_codeword(version.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BitMatrix;

    fn grid_with_version(version: u8) -> ModuleGrid {
        let v = Version::new(version).unwrap();
        let n = v.dimension();
        let code = VersionInfo::codeword(v);
        let mut matrix = BitMatrix::square(n);
        for k in 0..18 {
            let bit = (code >> k) & 1 == 1;
            let ((tx, ty), (bx, by)) = version_bit_position(n, k);
            matrix.set(tx, ty, bit);
            matrix.set(bx, by, bit);
        }
        ModuleGrid::from_matrix(matrix)
    }

    #[test]
    fn test_read_version() {
        for version in [7u8, 12, 21, 33, 40] {
            let grid = grid_with_version(version);
            assert_eq!(VersionInfo::read(&grid), Ok(Version::new(version).unwrap()));
        }
    }

    #[test]
    fn test_read_version_with_one_copy_destroyed() {
        let mut grid = grid_with_version(18);
        let n = grid.dimension();
        for k in 0..18 {
            let ((tx, ty), _) = version_bit_position(n, k);
            grid.modules_mut().toggle(tx, ty);
        }
        assert_eq!(VersionInfo::read(&grid), Ok(Version::new(18).unwrap()));
    }

    #[test]
    fn test_msb_sits_next_to_finder() {
        // bit 17 of the top-right copy is at (N-9, 5)
        let ((x, y), (bx, by)) = version_bit_position(45, 17);
        assert_eq!((x, y), (36, 5));
        assert_eq!((bx, by), (5, 36));
    }

    #[test]
    fn test_too_small() {
        let grid = ModuleGrid::from_matrix(BitMatrix::square(41));
        assert!(VersionInfo::read(&grid).is_err());
    }
}
