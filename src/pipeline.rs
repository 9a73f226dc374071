//! Multi-candidate decode orchestration.
//!
//! A decode runs an ordered list of preprocessing passes over the same image.
//! Each pass binarizes, locates every symbol and decodes each location; the
//! first pass that yields at least one symbol wins, and among its symbols the
//! one with the longest text is reported.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, trace};
use rayon::prelude::*;

use crate::config::DecoderConfig;
use crate::decoder::QrDecoder;
use crate::decoder::version::VersionInfo;
use crate::detector::{SymbolLocation, detect_locations, sample_grid};
use crate::error::{DecodeError, MalformedReason};
use crate::models::{BitMatrix, PixelGrid, Point, QRCode, Version};
use crate::utils::binarization::binarize;
use crate::utils::grayscale::stretch_contrast;
use crate::utils::resize::upscale;

/// Largest version step accepted when version information disagrees with the
/// finder-based estimate
const MAX_VERSION_CORRECTION: i32 = 3;
/// Alternative dimensions tried when the estimate fails
const DIMENSION_RETRY_STEPS: [isize; 2] = [-4, 4];

/// A preprocessing step applied before binarization
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preprocess {
    /// The image as given
    Original,
    /// Bicubic upscale by the factor
    Upscale(f32),
    /// Contrast-stretched luminance, then bicubic upscale by the factor
    GrayscaleUpscale(f32),
}

impl Preprocess {
    /// Original, 2x upscale, then grayscale + 1.5x upscale
    pub fn default_passes() -> Vec<Preprocess> {
        vec![
            Preprocess::Original,
            Preprocess::Upscale(2.0),
            Preprocess::GrayscaleUpscale(1.5),
        ]
    }

    /// Produce the pass input; `None` means the grid is used unchanged
    pub fn apply(&self, grid: &PixelGrid) -> Result<Option<PixelGrid>, DecodeError> {
        match *self {
            Preprocess::Original => Ok(None),
            Preprocess::Upscale(factor) => upscale(grid, factor).map(Some),
            Preprocess::GrayscaleUpscale(factor) => {
                let stretched =
                    PixelGrid::new(grid.width(), grid.height(), stretch_contrast(grid.as_bytes()))?;
                upscale(&stretched, factor).map(Some)
            }
        }
    }
}

impl fmt::Display for Preprocess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preprocess::Original => write!(f, "original"),
            Preprocess::Upscale(factor) => write!(f, "upscale:{factor}"),
            Preprocess::GrayscaleUpscale(factor) => write!(f, "gray:{factor}"),
        }
    }
}

/// Result of one top-level decode
#[derive(Debug, Clone)]
pub enum DecodeOutcome {
    /// A symbol decoded; the longest text of the winning pass
    Success(QRCode),
    /// No pass produced a symbol that passed format validation
    NotFound,
    /// A symbol passed format validation but its data could not be recovered
    Malformed(MalformedReason),
}

impl DecodeOutcome {
    /// Decoded text on success
    pub fn text(&self) -> Option<&str> {
        match self {
            DecodeOutcome::Success(code) => Some(&code.content),
            _ => None,
        }
    }

    /// Whether a symbol was decoded
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeOutcome::Success(_))
    }

    /// The decoded code on success
    pub fn code(&self) -> Option<&QRCode> {
        match self {
            DecodeOutcome::Success(code) => Some(code),
            _ => None,
        }
    }
}

/// What one pass produced
#[derive(Debug, Default)]
struct PassReport {
    codes: Vec<QRCode>,
    /// First failure that happened after format validation
    malformed: Option<MalformedReason>,
}

/// Reusable, stateless QR reader
#[derive(Debug, Clone, Default)]
pub struct QrReader {
    config: DecoderConfig,
}

impl QrReader {
    /// Reader with explicit settings
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Reader configured from `QR_*` environment variables
    pub fn from_env() -> Self {
        Self::new(DecoderConfig::from_env())
    }

    /// Settings in effect
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode the best symbol in a luminance grid
    pub fn decode(&self, grid: &PixelGrid) -> DecodeOutcome {
        let reports = self.run_passes(grid);
        let mut malformed = None;
        for (pass, report) in self.config.passes.iter().zip(reports) {
            let Some(report) = report else { continue };
            if let Some(best) = longest_text(report.codes) {
                debug!("pass {pass} won with {} chars", best.content.chars().count());
                return DecodeOutcome::Success(best);
            }
            if malformed.is_none() {
                malformed = report.malformed;
            }
        }
        match malformed {
            Some(reason) => DecodeOutcome::Malformed(reason),
            None => DecodeOutcome::NotFound,
        }
    }

    /// Every symbol decoded by the first successful pass, in location order
    pub fn decode_all(&self, grid: &PixelGrid) -> Vec<QRCode> {
        self.run_passes(grid)
            .into_iter()
            .flatten()
            .find(|report| !report.codes.is_empty())
            .map(|report| report.codes)
            .unwrap_or_default()
    }

    /// Decode raw luminance bytes
    pub fn decode_luma(
        &self,
        luma: &[u8],
        width: usize,
        height: usize,
    ) -> Result<DecodeOutcome, DecodeError> {
        let grid = PixelGrid::new(width, height, luma.to_vec())?;
        Ok(self.decode(&grid))
    }

    /// Decode packed RGB bytes
    pub fn decode_rgb(
        &self,
        rgb: &[u8],
        width: usize,
        height: usize,
    ) -> Result<DecodeOutcome, DecodeError> {
        let grid = PixelGrid::from_rgb(rgb, width, height)?;
        Ok(self.decode(&grid))
    }

    /// Symbol locations found in the unprocessed image
    pub fn locate(&self, grid: &PixelGrid) -> Vec<SymbolLocation> {
        detect_locations(&binarize(grid), &self.config)
    }

    /// Run the configured passes, sequentially stopping at the first success
    /// or on the rayon pool. Skipped and failed-to-prepare passes are `None`.
    fn run_passes(&self, grid: &PixelGrid) -> Vec<Option<PassReport>> {
        let passes = &self.config.passes;
        if !self.config.parallel_passes {
            let mut reports = Vec::with_capacity(passes.len());
            for pass in passes {
                let report = self.run_pass(grid, pass);
                let done = report.as_ref().is_some_and(|r| !r.codes.is_empty());
                reports.push(report);
                if done {
                    break;
                }
            }
            return reports;
        }

        // lowest index of a pass that has already succeeded
        let first_success = AtomicUsize::new(usize::MAX);
        passes
            .par_iter()
            .enumerate()
            .map(|(index, pass)| {
                if first_success.load(Ordering::Acquire) < index {
                    trace!("pass {pass} skipped");
                    return None;
                }
                let report = self.run_pass(grid, pass)?;
                if !report.codes.is_empty() {
                    first_success.fetch_min(index, Ordering::AcqRel);
                }
                Some(report)
            })
            .collect()
    }

    fn run_pass(&self, grid: &PixelGrid, pass: &Preprocess) -> Option<PassReport> {
        let prepared = match pass.apply(grid) {
            Ok(prepared) => prepared,
            Err(err) => {
                debug!("pass {pass} skipped: {err}");
                return None;
            }
        };
        let input = prepared.as_ref().unwrap_or(grid);
        let scale = (
            grid.width() as f32 / input.width() as f32,
            grid.height() as f32 / input.height() as f32,
        );

        let binary = binarize(input);
        let locations = detect_locations(&binary, &self.config);
        debug!(
            "pass {pass}: {}x{}, {} locations",
            input.width(),
            input.height(),
            locations.len()
        );

        let mut report = PassReport::default();
        for location in &locations {
            match decode_location(&binary, location, &self.config) {
                Ok(mut code) => {
                    for p in code.position.iter_mut() {
                        *p = Point::new(p.x * scale.0, p.y * scale.1);
                    }
                    report.codes.push(code);
                }
                Err(reason) => {
                    trace!("location at ({:.1}, {:.1}): {reason}", location.top_left.x, location.top_left.y);
                    if reason.after_format() && report.malformed.is_none() {
                        report.malformed = Some(reason);
                    }
                }
            }
        }
        Some(report)
    }
}

/// Longest text wins; the earliest code wins ties
fn longest_text(codes: Vec<QRCode>) -> Option<QRCode> {
    codes.into_iter().fold(None, |best: Option<QRCode>, code| match best {
        Some(b) if b.content.chars().count() >= code.content.chars().count() => Some(b),
        _ => Some(code),
    })
}

/// Sample and decode one location, correcting the dimension estimate from
/// version information and retrying neighbouring dimensions on failure
pub fn decode_location(
    binary: &BitMatrix,
    location: &SymbolLocation,
    config: &DecoderConfig,
) -> Result<QRCode, MalformedReason> {
    let estimated = location.dimension;
    let dimension = corrected_dimension(binary, location).unwrap_or(estimated);

    let first = decode_at(binary, location, dimension, config);
    if first.is_ok() {
        return first;
    }
    for step in DIMENSION_RETRY_STEPS {
        let Some(candidate) = dimension.checked_add_signed(step) else {
            continue;
        };
        if Version::from_dimension(candidate).is_none() {
            continue;
        }
        if let Ok(code) = decode_at(binary, location, candidate, config) {
            debug!("decoded at dimension {candidate} instead of {dimension}");
            return Ok(code);
        }
    }
    first
}

/// Dimension from version information when it is close to the estimate
fn corrected_dimension(binary: &BitMatrix, location: &SymbolLocation) -> Option<usize> {
    let estimated = location.version()?;
    if !estimated.has_version_info() {
        return None;
    }
    let sampled = sample_grid(binary, location, location.dimension).ok()?;
    let decoded = VersionInfo::read(&sampled.grid).ok()?;
    let step = (decoded.number() as i32 - estimated.number() as i32).abs();
    if decoded != estimated && step <= MAX_VERSION_CORRECTION {
        debug!(
            "version info says v{} for estimated v{}",
            decoded.number(),
            estimated.number()
        );
        return Some(decoded.dimension());
    }
    None
}

fn decode_at(
    binary: &BitMatrix,
    location: &SymbolLocation,
    dimension: usize,
    config: &DecoderConfig,
) -> Result<QRCode, MalformedReason> {
    let sampled = sample_grid(binary, location, dimension)?;
    let threshold = config.erasure_threshold();

    let (symbol, position, mirrored) = match QrDecoder::decode(&sampled.grid, threshold) {
        Ok(symbol) => (symbol, sampled.position, false),
        Err(err) if config.try_mirrored => {
            match QrDecoder::decode(&sampled.grid.transposed(), threshold) {
                Ok(symbol) => {
                    let [tl, tr, br, bl] = sampled.position;
                    (symbol, [tl, bl, br, tr], true)
                }
                Err(mirror_err) => {
                    trace!("mirrored read failed too: {mirror_err}");
                    return Err(err);
                }
            }
        }
        Err(err) => return Err(err),
    };

    let mut code = QRCode::new(symbol.payload, symbol.metadata, position);
    code.mirrored = mirrored;
    code.corrected_codewords = symbol.corrected_codewords;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{Canvas, encode_text};
    use crate::models::ECLevel;

    fn fixture(text: &str, module_px: usize) -> PixelGrid {
        let symbol = encode_text(text, ECLevel::M).unwrap();
        Canvas::for_symbol(&symbol.modules, module_px, 4)
            .into_pixel_grid()
            .unwrap()
    }

    #[test]
    fn test_decode_simple_fixture() {
        let reader = QrReader::default();
        let outcome = reader.decode(&fixture("HELLO WORLD", 4));
        assert_eq!(outcome.text(), Some("HELLO WORLD"));
        let code = outcome.code().unwrap();
        assert!(!code.mirrored);
        // top-left corner of the symbol sits behind a 4 module quiet zone
        assert!(code.position[0].distance(&Point::new(16.0, 16.0)) < 2.0);
    }

    #[test]
    fn test_blank_is_not_found() {
        let reader = QrReader::default();
        let blank = PixelGrid::filled(120, 120, 255).unwrap();
        assert!(matches!(reader.decode(&blank), DecodeOutcome::NotFound));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let grid = fixture("parallel passes", 3);
        let sequential = QrReader::default().decode(&grid);
        let parallel =
            QrReader::new(DecoderConfig::default().with_parallel_passes(true)).decode(&grid);
        assert_eq!(sequential.text(), parallel.text());
        assert_eq!(parallel.text(), Some("parallel passes"));
    }

    #[test]
    fn test_mirrored_symbol() {
        let symbol = encode_text("MIRROR", ECLevel::Q).unwrap();
        let mirrored = symbol.modules.transposed();
        let grid = Canvas::for_symbol(&mirrored, 4, 4).into_pixel_grid().unwrap();
        let outcome = QrReader::default().decode(&grid);
        assert_eq!(outcome.text(), Some("MIRROR"));
        assert!(outcome.code().unwrap().mirrored);

        let strict = QrReader::new(DecoderConfig::default().with_mirrored(false));
        assert!(!strict.decode(&grid).is_success());
    }

    #[test]
    fn test_upscale_positions_map_back() {
        let grid = fixture("SCALE", 4);
        let config = DecoderConfig::default().with_passes(vec![Preprocess::Upscale(2.0)]);
        let code = QrReader::new(config).decode(&grid);
        let position = code.code().unwrap().position;
        assert!(position[0].distance(&Point::new(16.0, 16.0)) < 2.0, "{position:?}");
    }

    #[test]
    fn test_longest_text_prefers_first_on_tie() {
        let a = fixture_code("AB");
        let b = fixture_code("CD");
        let c = fixture_code("E");
        let best = longest_text(vec![c, a, b]).unwrap();
        assert_eq!(best.content, "AB");
    }

    fn fixture_code(text: &str) -> QRCode {
        let outcome = QrReader::default().decode(&fixture(text, 3));
        outcome.code().cloned().unwrap()
    }
}
