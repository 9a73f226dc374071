use super::payload::{DecodedPayload, Segment, StructuredAppend};
use super::Point;

/// QR Code Model 2 version (1-40)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u8);

impl Version {
    /// Smallest version
    pub const MIN: Version = Version(1);
    /// Largest version
    pub const MAX: Version = Version(40);

    /// Version from its number, if in 1..=40
    pub fn new(number: u8) -> Option<Self> {
        (1..=40).contains(&number).then_some(Self(number))
    }

    /// Version whose symbol is `dimension` modules wide (`4v + 17`)
    pub fn from_dimension(dimension: usize) -> Option<Self> {
        if dimension < 21 || (dimension - 17) % 4 != 0 {
            return None;
        }
        u8::try_from((dimension - 17) / 4).ok().and_then(Self::new)
    }

    /// The version number (1-40)
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Size in modules (width = height)
    pub fn dimension(&self) -> usize {
        4 * self.0 as usize + 17
    }

    /// Versions 7 and up carry explicit version information
    pub fn has_version_info(&self) -> bool {
        self.0 >= 7
    }
}

/// Error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ECLevel {
    /// Low (~7% recovery capacity)
    L,
    /// Medium (~15% recovery capacity)
    M,
    /// Quartile (~25% recovery capacity)
    Q,
    /// High (~30% recovery capacity)
    H,
}

impl ECLevel {
    /// All levels, lowest first
    pub const ALL: [ECLevel; 4] = [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H];

    /// Level from the two format-information bits (01=L, 00=M, 11=Q, 10=H)
    pub fn from_format_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b01 => ECLevel::L,
            0b00 => ECLevel::M,
            0b11 => ECLevel::Q,
            _ => ECLevel::H,
        }
    }

    /// The two bits written into format information
    pub fn format_bits(&self) -> u8 {
        match self {
            ECLevel::L => 0b01,
            ECLevel::M => 0b00,
            ECLevel::Q => 0b11,
            ECLevel::H => 0b10,
        }
    }

    /// Row index into the block tables
    pub fn ordinal(&self) -> usize {
        match self {
            ECLevel::L => 0,
            ECLevel::M => 1,
            ECLevel::Q => 2,
            ECLevel::H => 3,
        }
    }
}

/// Mask pattern (0-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskPattern {
    /// (i + j) % 2 == 0
    Pattern0 = 0,
    /// i % 2 == 0
    Pattern1 = 1,
    /// j % 3 == 0
    Pattern2 = 2,
    /// (i + j) % 3 == 0
    Pattern3 = 3,
    /// (i/2 + j/3) % 2 == 0
    Pattern4 = 4,
    /// (i*j)%2 + (i*j)%3 == 0
    Pattern5 = 5,
    /// ((i*j)%2 + (i*j)%3) % 2 == 0
    Pattern6 = 6,
    /// ((i+j)%2 + (i*j)%3) % 2 == 0
    Pattern7 = 7,
}

impl MaskPattern {
    /// All patterns in id order
    pub const ALL: [MaskPattern; 8] = [
        MaskPattern::Pattern0,
        MaskPattern::Pattern1,
        MaskPattern::Pattern2,
        MaskPattern::Pattern3,
        MaskPattern::Pattern4,
        MaskPattern::Pattern5,
        MaskPattern::Pattern6,
        MaskPattern::Pattern7,
    ];

    /// Mask pattern from its 3-bit id
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0x07) as usize]
    }

    /// The 3-bit id
    pub fn bits(&self) -> u8 {
        *self as u8
    }

    /// Whether the module at row `i`, column `j` is flipped
    pub fn is_masked(&self, i: usize, j: usize) -> bool {
        match self {
            MaskPattern::Pattern0 => (i + j) % 2 == 0,
            MaskPattern::Pattern1 => i % 2 == 0,
            MaskPattern::Pattern2 => j % 3 == 0,
            MaskPattern::Pattern3 => (i + j) % 3 == 0,
            MaskPattern::Pattern4 => (i / 2 + j / 3) % 2 == 0,
            MaskPattern::Pattern5 => ((i * j) % 2 + (i * j) % 3) == 0,
            MaskPattern::Pattern6 => (((i * j) % 2) + ((i * j) % 3)) % 2 == 0,
            MaskPattern::Pattern7 => (((i + j) % 2) + ((i * j) % 3)) % 2 == 0,
        }
    }
}

/// Format and version information of one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolMetadata {
    /// Symbol version
    pub version: Version,
    /// Error correction level
    pub ec_level: ECLevel,
    /// Data mask
    pub mask: MaskPattern,
}

/// A decoded QR code
#[derive(Debug, Clone)]
pub struct QRCode {
    /// Raw payload bytes, all segments concatenated
    pub data: Vec<u8>,
    /// Decoded text
    pub content: String,
    /// Segments in stream order
    pub segments: Vec<Segment>,
    /// QR code version
    pub version: Version,
    /// Error correction level
    pub error_correction: ECLevel,
    /// Mask pattern used
    pub mask_pattern: MaskPattern,
    /// Symbol corners in image coordinates: top-left, top-right,
    /// bottom-right, bottom-left
    pub position: [Point; 4],
    /// Structured-append header, if the symbol is part of a sequence
    pub structured_append: Option<StructuredAppend>,
    /// Symbol was read from a mirrored image
    pub mirrored: bool,
    /// Codewords repaired by Reed-Solomon across all blocks
    pub corrected_codewords: usize,
}

impl QRCode {
    /// Assemble a decoded code from its payload and metadata
    pub fn new(payload: DecodedPayload, metadata: SymbolMetadata, position: [Point; 4]) -> Self {
        let data = payload.bytes();
        let content = payload.text();
        Self {
            data,
            content,
            segments: payload.segments,
            version: metadata.version,
            error_correction: metadata.ec_level,
            mask_pattern: metadata.mask,
            position,
            structured_append: payload.structured_append,
            mirrored: false,
            corrected_codewords: 0,
        }
    }

    /// Format and version information
    pub fn metadata(&self) -> SymbolMetadata {
        SymbolMetadata {
            version: self.version,
            ec_level: self.error_correction,
            mask: self.mask_pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_dimension() {
        assert_eq!(Version::new(1).map(|v| v.dimension()), Some(21));
        assert_eq!(Version::new(40).map(|v| v.dimension()), Some(177));
        assert_eq!(Version::from_dimension(25), Version::new(2));
        assert_eq!(Version::from_dimension(26), None);
        assert_eq!(Version::from_dimension(181), None);
        assert!(Version::new(0).is_none());
        assert!(Version::new(41).is_none());
    }

    #[test]
    fn test_ec_level_format_bits() {
        assert_eq!(ECLevel::from_format_bits(0b01), ECLevel::L);
        assert_eq!(ECLevel::from_format_bits(0b00), ECLevel::M);
        assert_eq!(ECLevel::from_format_bits(0b11), ECLevel::Q);
        assert_eq!(ECLevel::from_format_bits(0b10), ECLevel::H);
        for level in ECLevel::ALL {
            assert_eq!(ECLevel::from_format_bits(level.format_bits()), level);
        }
    }

    #[test]
    fn test_mask_pattern() {
        let mask = MaskPattern::Pattern0;
        assert!(mask.is_masked(0, 0));
        assert!(!mask.is_masked(0, 1));
        assert!(mask.is_masked(1, 1));
        assert!(MaskPattern::Pattern1.is_masked(2, 5));
        assert!(!MaskPattern::Pattern1.is_masked(5, 2));
        assert_eq!(MaskPattern::from_bits(6), MaskPattern::Pattern6);
    }
}
