use super::{BitMatrix, Version};

/// Confidence assigned to modules that were not sampled from pixels
pub const FULL_CONFIDENCE: u8 = u8::MAX;

/// N x N modules sampled from an image, with a per-module confidence
/// (the vote margin of the sampler; higher is surer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    modules: BitMatrix,
    confidence: Vec<u8>,
}

impl ModuleGrid {
    /// Grid with full confidence in every module
    pub fn from_matrix(modules: BitMatrix) -> Self {
        let n = modules.width() * modules.height();
        Self {
            modules,
            confidence: vec![FULL_CONFIDENCE; n],
        }
    }

    /// Grid with explicit confidences (row-major, one per module)
    pub fn with_confidence(modules: BitMatrix, confidence: Vec<u8>) -> Self {
        debug_assert_eq!(confidence.len(), modules.width() * modules.height());
        Self {
            modules,
            confidence,
        }
    }

    /// Modules per side
    pub fn dimension(&self) -> usize {
        self.modules.width()
    }

    /// Version implied by the dimension, if it is a valid one
    pub fn version(&self) -> Option<Version> {
        if self.modules.width() != self.modules.height() {
            return None;
        }
        Version::from_dimension(self.dimension())
    }

    /// Dark module at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.modules.get(x, y)
    }

    /// Sampling confidence at column `x`, row `y`
    pub fn confidence(&self, x: usize, y: usize) -> u8 {
        self.confidence
            .get(y * self.dimension() + x)
            .copied()
            .unwrap_or(0)
    }

    /// Underlying bits
    pub fn modules(&self) -> &BitMatrix {
        &self.modules
    }

    /// Mutable access to the bits, used to corrupt fixtures in tests
    pub fn modules_mut(&mut self) -> &mut BitMatrix {
        &mut self.modules
    }

    /// Grid as read from a mirror image
    pub fn transposed(&self) -> Self {
        let n = self.dimension();
        let mut confidence = vec![0u8; self.confidence.len()];
        for y in 0..n {
            for x in 0..n {
                confidence[x * n + y] = self.confidence[y * n + x];
            }
        }
        Self {
            modules: self.modules.transposed(),
            confidence,
        }
    }
}
