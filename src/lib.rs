//! qrscan - QR code recognition and decoding from still images
//!
//! A from-scratch pipeline: hybrid binarization, finder-pattern location,
//! perspective sampling, format and version decoding, Reed-Solomon error
//! correction and payload decoding. A decode runs several preprocessing
//! passes (original, 2x upscale, contrast-stretched 1.5x upscale) and reports
//! the longest text of the first pass that finds a symbol.
//!
//! ```
//! use qrscan::encoder::{Canvas, encode_text};
//! use qrscan::{DecodeOutcome, ECLevel};
//!
//! let symbol = encode_text("HELLO WORLD", ECLevel::M).unwrap();
//! let canvas = Canvas::for_symbol(&symbol.modules, 4, 4);
//! let outcome = qrscan::decode(canvas.pixels(), canvas.width(), canvas.height()).unwrap();
//! assert!(matches!(outcome, DecodeOutcome::Success(ref code) if code.content == "HELLO WORLD"));
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Decoder tuning and `QR_*` environment overrides
pub mod config;
/// Symbol decoding (format, version, codewords, Reed-Solomon, payload modes)
pub mod decoder;
/// Symbol location (finder patterns, grouping, timing, alignment, sampling)
pub mod detector;
/// Companion encoder for fixtures, tests and benches
pub mod encoder;
/// Error types
pub mod error;
/// Core data structures (QRCode, BitMatrix, Point, PixelGrid, etc.)
pub mod models;
/// Multi-pass decode orchestration
pub mod pipeline;
/// `{code, message, data}` status reports
pub mod status;
/// Image containers, base64 input and symbol export
pub mod tools;
/// Utility functions (grayscale, binarization, geometry, resampling)
pub mod utils;

pub use config::DecoderConfig;
pub use error::{DecodeError, MalformedReason};
pub use models::{BitMatrix, ECLevel, MaskPattern, PixelGrid, Point, QRCode, Version};
pub use pipeline::{DecodeOutcome, Preprocess, QrReader};
pub use status::StatusReport;

/// Decode the best symbol in a luminance image with default settings
///
/// # Arguments
/// * `luma` - Luminance bytes (1 byte per pixel, row-major)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
pub fn decode(luma: &[u8], width: usize, height: usize) -> Result<DecodeOutcome, DecodeError> {
    QrReader::default().decode_luma(luma, width, height)
}

/// Decode the best symbol in a packed RGB image with default settings
pub fn decode_rgb(rgb: &[u8], width: usize, height: usize) -> Result<DecodeOutcome, DecodeError> {
    QrReader::default().decode_rgb(rgb, width, height)
}

/// Every symbol decoded from an RGB image
///
/// # Arguments
/// * `image` - Raw RGB bytes (3 bytes per pixel)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// Decoded QR codes of the first pass that found any, empty on bad input
pub fn detect(image: &[u8], width: usize, height: usize) -> Vec<QRCode> {
    match PixelGrid::from_rgb(image, width, height) {
        Ok(grid) => QrReader::default().decode_all(&grid),
        Err(err) => {
            log::debug!("detect rejected input: {err}");
            Vec::new()
        }
    }
}
