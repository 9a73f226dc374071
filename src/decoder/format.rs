/// Format information (EC level + mask) read from its two redundant copies
use log::trace;

use crate::decoder::bch::{format_codeword, nearest_format};
use crate::error::MalformedReason;
use crate::models::{ECLevel, MaskPattern, ModuleGrid};

/// Largest number of bit errors accepted in a format copy
pub const MAX_FORMAT_ERRORS: u32 = 3;

/// Module positions (x, y) of the copy around the top-left finder,
/// most significant bit first
pub const FORMAT_COPY_TOP_LEFT: [(usize, usize); 15] = [
    (0, 8),
    (1, 8),
    (2, 8),
    (3, 8),
    (4, 8),
    (5, 8),
    (7, 8),
    (8, 8),
    (8, 7),
    (8, 5),
    (8, 4),
    (8, 3),
    (8, 2),
    (8, 1),
    (8, 0),
];

/// Module positions (x, y) of the copy split between the top-right and
/// bottom-left finders, most significant bit first
pub fn format_copy_split(dimension: usize) -> [(usize, usize); 15] {
    let mut positions = [(0usize, 0usize); 15];
    for (k, slot) in positions.iter_mut().enumerate() {
        *slot = if k < 7 {
            (8, dimension - 1 - k)
        } else {
            (dimension - 15 + k, 8)
        };
    }
    positions
}

/// Decoded format information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Error correction level
    pub ec_level: ECLevel,
    /// Data mask
    pub mask_pattern: MaskPattern,
}

impl FormatInfo {
    /// Read both copies and pick the nearest valid codeword
    pub fn read(grid: &ModuleGrid) -> Result<Self, MalformedReason> {
        let dimension = grid.dimension();
        if dimension < 21 {
            return Err(MalformedReason::InvalidDimension(dimension));
        }
        let first = read_bits(grid, &FORMAT_COPY_TOP_LEFT);
        let second = read_bits(grid, &format_copy_split(dimension));
        let info = Self::decode_copies(first, second);
        trace!(
            "format copies {first:#06x} / {second:#06x} -> {:?}",
            info.as_ref().ok()
        );
        info
    }

    /// Decode from the two raw (still masked) 15-bit copies
    pub fn decode_copies(first: u16, second: u16) -> Result<Self, MalformedReason> {
        let (data, distance) = nearest_format(&[first, second]);
        if distance > MAX_FORMAT_ERRORS {
            return Err(MalformedReason::FormatUncorrectable);
        }
        Ok(Self::from_data(data))
    }

    /// Format from its 5 data bits
    pub fn from_data(data: u8) -> Self {
        Self {
            ec_level: ECLevel::from_format_bits(data >> 3),
            mask_pattern: MaskPattern::from_bits(data),
        }
    }

    /// The 5 data bits
    pub fn data(&self) -> u8 {
        (self.ec_level.format_bits() << 3) | self.mask_pattern.bits()
    }

    /// Masked 15-bit codeword as written into the symbol
    pub fn codeword(&self) -> u16 {
        format_codeword(self.data())
    }
}

fn read_bits(grid: &ModuleGrid, positions: &[(usize, usize); 15]) -> u16 {
    positions
        .iter()
        .fold(0u16, |acc, &(x, y)| (acc << 1) | grid.get(x, y) as u16)
}
