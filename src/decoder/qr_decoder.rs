/// Main QR decoder - wires everything together
use log::debug;

use crate::decoder::bitstream::BitstreamExtractor;
use crate::decoder::blocks::{correct_blocks, deinterleave};
use crate::decoder::format::FormatInfo;
use crate::decoder::function_mask::FunctionMask;
use crate::decoder::payload::decode_payload;
use crate::decoder::tables::ec_block_info;
use crate::decoder::unmask::unmask;
use crate::decoder::version::VersionInfo;
use crate::error::MalformedReason;
use crate::models::{DecodedPayload, ModuleGrid, SymbolMetadata};

/// Payload and metadata of a successfully decoded grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSymbol {
    /// Segments and assembled text
    pub payload: DecodedPayload,
    /// Version, EC level and mask
    pub metadata: SymbolMetadata,
    /// Codewords changed by Reed-Solomon correction
    pub corrected_codewords: usize,
}

/// Decodes sampled module grids
pub struct QrDecoder;

impl QrDecoder {
    /// Read format and version information from the grid
    pub fn read_metadata(grid: &ModuleGrid) -> Result<SymbolMetadata, MalformedReason> {
        let dimension = grid.dimension();
        let version = grid
            .version()
            .ok_or(MalformedReason::InvalidDimension(dimension))?;
        let format = FormatInfo::read(grid)?;

        if version.has_version_info() {
            let decoded = VersionInfo::read(grid)?;
            if decoded != version {
                return Err(MalformedReason::VersionMismatch {
                    decoded: decoded.number(),
                    dimension,
                });
            }
        }

        Ok(SymbolMetadata {
            version,
            ec_level: format.ec_level,
            mask: format.mask_pattern,
        })
    }

    /// Decode a grid end to end. `erasure_threshold` enables the erasure
    /// retry for codewords whose weakest module confidence is at or below it.
    pub fn decode(
        grid: &ModuleGrid,
        erasure_threshold: Option<u8>,
    ) -> Result<DecodedSymbol, MalformedReason> {
        let metadata = Self::read_metadata(grid)?;
        Self::decode_with_metadata(grid, metadata, erasure_threshold)
    }

    /// Decode a grid whose metadata has already been read
    pub fn decode_with_metadata(
        grid: &ModuleGrid,
        metadata: SymbolMetadata,
        erasure_threshold: Option<u8>,
    ) -> Result<DecodedSymbol, MalformedReason> {
        let (data, corrected_codewords) =
            Self::corrected_data(grid, metadata, erasure_threshold)?;
        let payload = decode_payload(&data, metadata.version)?;
        debug!(
            "decoded v{} {:?} {:?}: {} segments, {} corrections",
            metadata.version.number(),
            metadata.ec_level,
            metadata.mask,
            payload.segments.len(),
            corrected_codewords
        );
        Ok(DecodedSymbol {
            payload,
            metadata,
            corrected_codewords,
        })
    }

    /// Unmask, extract, deinterleave and correct; returns the data codewords
    fn corrected_data(
        grid: &ModuleGrid,
        metadata: SymbolMetadata,
        erasure_threshold: Option<u8>,
    ) -> Result<(Vec<u8>, usize), MalformedReason> {
        let version = metadata.version;
        let func = FunctionMask::new(version);
        let mut unmasked = grid.clone();
        unmask(unmasked.modules_mut(), metadata.mask, &func);

        let raw = BitstreamExtractor::extract(&unmasked, &func);
        let info = ec_block_info(version, metadata.ec_level);
        let blocks = deinterleave(&raw, &info)?;
        correct_blocks(&blocks, info.ecc_per_block, erasure_threshold)
    }
}
