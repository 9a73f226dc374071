//! QR code data mode decoders
//!
//! - Numeric: digits in groups of three
//! - Alphanumeric: the 45-character set
//! - Byte: raw 8-bit data, interpreted through the active character set
//! - Kanji: 13-bit compacted Shift_JIS

/// Alphanumeric mode
pub mod alphanumeric;
/// Byte mode
pub mod byte;
/// ECI character sets
pub mod charset;
/// Kanji mode
pub mod kanji;
/// Numeric mode
pub mod numeric;
