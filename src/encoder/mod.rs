//! Companion QR encoder
//!
//! Builds symbols for fixtures, tests and benches: numeric, alphanumeric,
//! byte and kanji segments, optional ECI, every EC level, automatic or fixed
//! version and mask, rendered onto a luminance [`Canvas`].

/// Luminance canvas and symbol rendering
pub mod render;
/// Mode-specific bit packing
pub mod segment;
/// Codewords, function patterns, placement and mask selection
pub mod symbol;

pub use render::Canvas;
pub use segment::{BitBuffer, EncodeSegment, SegmentKind};
pub use symbol::{EncodedSymbol, encode_segments};

use thiserror::Error;

use crate::models::{ECLevel, Mode};

/// Why a payload could not be encoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Payload does not fit the chosen (or any) version
    #[error("payload needs {bits} bits but the symbol holds {capacity}")]
    DataTooLong {
        /// Bits required
        bits: usize,
        /// Bits available
        capacity: usize,
    },
    /// Character outside the segment's mode
    #[error("{ch:?} cannot be encoded in {mode:?} mode")]
    InvalidCharacter {
        /// Requested mode
        mode: Mode,
        /// Offending character
        ch: char,
    },
    /// ECI assignment number too large for a three-byte designator
    #[error("ECI assignment {0} is out of range")]
    InvalidEci(u32),
}

/// Encode text in its densest single mode with an automatic version
pub fn encode_text(text: &str, ec_level: ECLevel) -> Result<EncodedSymbol, EncodeError> {
    encode_segments(&[EncodeSegment::auto(text)], ec_level, None, None)
}

/// Encode text as UTF-8 bytes behind an ECI 26 designator
pub fn encode_utf8_with_eci(text: &str, ec_level: ECLevel) -> Result<EncodedSymbol, EncodeError> {
    let segments = [EncodeSegment::eci(26)?, EncodeSegment::bytes(text.as_bytes())];
    encode_segments(&segments, ec_level, None, None)
}
