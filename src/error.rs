//! Error types shared by every decoding stage.

use thiserror::Error;

/// Failure of the top-level call that is not about the symbol's content:
/// bad input buffers, undecodable image containers, broken base64.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Luminance buffer length does not match `width * height`
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    DimensionMismatch {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
        /// `width * height` (or `* 3` for RGB input)
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },
    /// Zero-sized image
    #[error("image has no pixels")]
    EmptyImage,
    /// No image data was supplied, or nothing was left after base64 cleanup
    #[error("no image data supplied")]
    MissingInput,
    /// Image (or a resampled pass of it) would exceed the supported size
    #[error("image of {width}x{height} exceeds the supported size")]
    ImageTooLarge {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },
    /// Input text did not contain valid base64
    #[error("invalid base64 input: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    /// Image container could not be decoded
    #[error("unreadable image: {0}")]
    ImageDecode(#[from] image::ImageError),
    /// Reading the input failed
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a located symbol could not be turned into text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// Estimated module count is not `4v + 17` for any v in 1..=40
    #[error("module count {0} is not a valid QR dimension")]
    InvalidDimension(usize),
    /// Perspective transform was degenerate or sampled outside the image
    #[error("sampling failed: {0}")]
    Sampling(&'static str),
    /// Neither format-information copy is within 3 bits of a valid code
    #[error("format information is uncorrectable")]
    FormatUncorrectable,
    /// Neither version-information copy is within 3 bits of a valid code
    #[error("version information is uncorrectable")]
    VersionUncorrectable,
    /// Version bits disagree with the sampled dimension even after resampling
    #[error("version {decoded} does not match grid dimension {dimension}")]
    VersionMismatch {
        /// Version read from the version-information field
        decoded: u8,
        /// Dimension of the sampled grid
        dimension: usize,
    },
    /// Codeword count does not fit the block table for this version and level
    #[error("codeword layout does not match the block structure")]
    BlockStructure,
    /// A Reed-Solomon block has more errata than its EC codewords can fix
    #[error("block {block} has more errors than its {ecc} EC codewords can correct")]
    TooManyErrors {
        /// Block index in interleave order
        block: usize,
        /// EC codewords in that block
        ecc: usize,
    },
    /// Mode indicator outside the supported set
    #[error("unknown mode indicator {0:#06b}")]
    UnknownMode(u8),
    /// Character count needs more bits than remain in the stream
    #[error("character count {count} needs {needed} bits but only {available} remain")]
    CountOverflow {
        /// Declared character count
        count: usize,
        /// Bits the segment would need
        needed: usize,
        /// Bits left in the stream
        available: usize,
    },
    /// Numeric group value out of range
    #[error("numeric group value {0} is out of range")]
    InvalidNumeric(u16),
    /// Alphanumeric pair value out of range
    #[error("alphanumeric value {0} is out of range")]
    InvalidAlphanumeric(u16),
    /// Kanji value does not map to an assigned Shift_JIS character
    #[error("kanji value {0:#x} is not a Shift_JIS character")]
    InvalidKanji(u16),
    /// ECI designator is malformed
    #[error("malformed ECI designator")]
    InvalidEci,
}

impl MalformedReason {
    /// True once the symbol has passed format validation. Failures before
    /// that point mean the candidate was never really a QR symbol.
    pub fn after_format(&self) -> bool {
        !matches!(
            self,
            MalformedReason::InvalidDimension(_)
                | MalformedReason::Sampling(_)
                | MalformedReason::FormatUncorrectable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        assert!(!MalformedReason::FormatUncorrectable.after_format());
        assert!(!MalformedReason::InvalidDimension(22).after_format());
        assert!(MalformedReason::TooManyErrors { block: 0, ecc: 10 }.after_format());
        assert!(MalformedReason::UnknownMode(0b1111).after_format());
    }

    #[test]
    fn test_messages() {
        let err = DecodeError::DimensionMismatch {
            width: 4,
            height: 4,
            expected: 16,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "pixel buffer holds 3 bytes, expected 16 for 4x4"
        );
        assert_eq!(
            MalformedReason::UnknownMode(0b1111).to_string(),
            "unknown mode indicator 0b1111"
        );
    }
}
