//! Utility functions for image processing
//!
//! - Grayscale conversion and contrast normalization
//! - Binarization (hybrid local, Otsu, fixed threshold)
//! - Geometry (perspective transforms)
//! - Resampling (bicubic upscale)

/// Hybrid, Otsu and fixed-threshold binarization
pub mod binarization;
/// Perspective transforms
pub mod geometry;
/// RGB to luminance and contrast stretching
pub mod grayscale;
/// Bicubic resampling
pub mod resize;
