//! QR code decoding modules
//!
//! Everything after a module grid has been sampled:
//! - Format and version information (BCH protected)
//! - Unmasking and codeword extraction along the zig-zag path
//! - Block deinterleaving and Reed-Solomon correction
//! - Segment parsing (numeric, alphanumeric, byte, kanji, ECI)

/// BCH error correction for format and version info
pub mod bch;
/// MSB-first bit reader over data codewords
pub mod bit_reader;
/// Codeword extraction from the module grid
pub mod bitstream;
/// Block deinterleaving and correction
pub mod blocks;
/// Format information extraction (mask pattern, EC level)
pub mod format;
/// Function module mask builder (finder/timing/format/alignment/version)
pub mod function_mask;
/// Data mode decoders
pub mod modes;
/// Segment parsing of corrected data
pub mod payload;
/// Grid-level decoder tying the stages together
pub mod qr_decoder;
/// Reed-Solomon error correction
pub mod reed_solomon;
/// Block structure tables (ECC codewords/blocks) from ISO/IEC 18004
pub mod tables;
/// QR code unmasking (removes mask patterns)
pub mod unmask;
/// Version information extraction (versions 7-40)
pub mod version;

pub use qr_decoder::{DecodedSymbol, QrDecoder};
