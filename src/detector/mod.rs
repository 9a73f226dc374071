//! QR code detection modules
//!
//! This module contains all the logic for locating QR symbols in a binary image:
//! - Finder pattern detection (the three square markers)
//! - Grouping finders into symbol locations, checked against the timing pattern
//! - Alignment pattern search (for version 2 and up)
//! - Perspective sampling of the module grid

/// Alignment pattern search for QR versions 2+
pub mod alignment;
/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Finder triples to symbol locations
pub mod grouping;
/// Module grid sampling through a perspective transform
pub mod sampler;
/// Timing pattern scoring between finder patterns
pub mod timing;

pub use finder::{FinderDetector, FinderPattern};
pub use grouping::{SymbolLocation, locate_symbols};
pub use sampler::{SampledSymbol, sample_grid};

use crate::config::DecoderConfig;
use crate::models::BitMatrix;

/// Finder scan and grouping over one binary image
pub fn detect_locations(binary: &BitMatrix, config: &DecoderConfig) -> Vec<SymbolLocation> {
    let patterns = FinderDetector::detect_with_limit(binary, config.max_finder_candidates);
    if patterns.len() < 3 {
        return Vec::new();
    }
    locate_symbols(binary, &patterns, config)
}
