//! Decoder tuning knobs with `QR_*` environment overrides.

use crate::pipeline::Preprocess;

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default)
}

fn parse_env_f32(name: &str, default: f32) -> f32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

fn parse_env_passes(name: &str, default: Vec<Preprocess>) -> Vec<Preprocess> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_passes(&v))
        .unwrap_or(default)
}

/// Parse a comma list such as `original,upscale:2,gray:1.5`
pub fn parse_passes(list: &str) -> Option<Vec<Preprocess>> {
    let passes = list
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, factor) = match item.split_once(':') {
                Some((name, factor)) => (name, Some(factor.trim().parse::<f32>().ok()?)),
                None => (item, None),
            };
            if factor.is_some_and(|f| !f.is_finite() || f <= 0.0) {
                return None;
            }
            match name.trim().to_ascii_lowercase().as_str() {
                "original" => Some(Preprocess::Original),
                "upscale" => Some(Preprocess::Upscale(factor.unwrap_or(2.0))),
                "gray" | "grayscale" => Some(Preprocess::GrayscaleUpscale(factor.unwrap_or(1.5))),
                _ => None,
            }
        })
        .collect::<Option<Vec<_>>>()?;
    (!passes.is_empty()).then_some(passes)
}

/// Configuration of a [`crate::QrReader`]
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Preprocessing passes, tried in order
    pub passes: Vec<Preprocess>,
    /// Run passes on the rayon pool; the earliest successful pass still wins
    pub parallel_passes: bool,
    /// Largest accepted ratio between module sizes of grouped finders
    pub module_size_tolerance: f32,
    /// Largest accepted |cos| of the angle at the top-left finder
    pub right_angle_tolerance: f32,
    /// Fraction of timing-pattern modules that must alternate as expected
    pub min_timing_score: f32,
    /// Finder candidates kept per pass
    pub max_finder_candidates: usize,
    /// Symbol locations decoded per pass
    pub max_symbols: usize,
    /// Retry failed Reed-Solomon blocks with low-confidence codewords as
    /// erasures. Off by default: a block recovered this way carries more than
    /// `ecc/2` corrections, beyond the errors-only guarantee.
    pub use_erasures: bool,
    /// Codewords whose weakest module vote margin is at or below this are erasure candidates
    pub erasure_confidence: u8,
    /// Try the transposed grid when a located symbol fails to decode
    pub try_mirrored: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            passes: Preprocess::default_passes(),
            parallel_passes: false,
            module_size_tolerance: 1.4,
            right_angle_tolerance: 0.4,
            min_timing_score: 0.65,
            max_finder_candidates: 48,
            max_symbols: 8,
            use_erasures: false,
            erasure_confidence: 1,
            try_mirrored: true,
        }
    }
}

impl DecoderConfig {
    /// Defaults with `QR_*` environment overrides applied. Values that do not
    /// parse keep their default.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            passes: parse_env_passes("QR_PASSES", d.passes),
            parallel_passes: parse_env_bool_u8("QR_PARALLEL_PASSES", d.parallel_passes),
            module_size_tolerance: parse_env_f32(
                "QR_MODULE_SIZE_TOLERANCE",
                d.module_size_tolerance,
            ),
            right_angle_tolerance: parse_env_f32(
                "QR_RIGHT_ANGLE_TOLERANCE",
                d.right_angle_tolerance,
            ),
            min_timing_score: parse_env_f32("QR_MIN_TIMING_SCORE", d.min_timing_score),
            max_finder_candidates: parse_env_usize(
                "QR_MAX_FINDER_CANDIDATES",
                d.max_finder_candidates,
            )
            .max(3),
            max_symbols: parse_env_usize("QR_MAX_SYMBOLS", d.max_symbols).max(1),
            use_erasures: parse_env_bool_u8("QR_USE_ERASURES", d.use_erasures),
            erasure_confidence: parse_env_u8("QR_ERASURE_CONFIDENCE", d.erasure_confidence),
            try_mirrored: parse_env_bool_u8("QR_TRY_MIRRORED", d.try_mirrored),
        }
    }

    /// Replace the preprocessing passes
    pub fn with_passes(mut self, passes: Vec<Preprocess>) -> Self {
        self.passes = passes;
        self
    }

    /// Enable or disable parallel passes
    pub fn with_parallel_passes(mut self, parallel: bool) -> Self {
        self.parallel_passes = parallel;
        self
    }

    /// Set the module size tolerance
    pub fn with_module_size_tolerance(mut self, tolerance: f32) -> Self {
        self.module_size_tolerance = tolerance;
        self
    }

    /// Set the right angle tolerance
    pub fn with_right_angle_tolerance(mut self, tolerance: f32) -> Self {
        self.right_angle_tolerance = tolerance;
        self
    }

    /// Set the minimum timing score
    pub fn with_min_timing_score(mut self, score: f32) -> Self {
        self.min_timing_score = score;
        self
    }

    /// Set the finder candidate cap
    pub fn with_max_finder_candidates(mut self, count: usize) -> Self {
        self.max_finder_candidates = count;
        self
    }

    /// Set the symbol cap per pass
    pub fn with_max_symbols(mut self, count: usize) -> Self {
        self.max_symbols = count;
        self
    }

    /// Enable or disable erasure retries
    pub fn with_erasures(mut self, enabled: bool) -> Self {
        self.use_erasures = enabled;
        self
    }

    /// Set the erasure confidence threshold
    pub fn with_erasure_confidence(mut self, confidence: u8) -> Self {
        self.erasure_confidence = confidence;
        self
    }

    /// Enable or disable the mirrored retry
    pub fn with_mirrored(mut self, enabled: bool) -> Self {
        self.try_mirrored = enabled;
        self
    }

    /// Erasure threshold passed to block correction, if enabled
    pub fn erasure_threshold(&self) -> Option<u8> {
        self.use_erasures.then_some(self.erasure_confidence)
    }
}
