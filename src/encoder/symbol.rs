/// Symbol construction: codewords, function patterns, placement and masking
use log::debug;

use crate::decoder::bitstream::placement_order;
use crate::decoder::format::{FORMAT_COPY_TOP_LEFT, FormatInfo, format_copy_split};
use crate::decoder::function_mask::{FunctionMask, alignment_pattern_centers};
use crate::decoder::reed_solomon::ReedSolomonEncoder;
use crate::decoder::tables::{data_capacity_bits, ec_block_info};
use crate::decoder::unmask::unmask;
use crate::decoder::version::{VersionInfo, version_bit_position};
use crate::encoder::EncodeError;
use crate::encoder::segment::{BitBuffer, EncodeSegment};
use crate::models::{BitMatrix, ECLevel, MaskPattern, Version};

const PAD_BYTES: [u8; 2] = [0xEC, 0x11];

/// A finished symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSymbol {
    /// Dark modules, `version.dimension()` per side, no quiet zone
    pub modules: BitMatrix,
    /// Symbol version
    pub version: Version,
    /// Error correction level
    pub ec_level: ECLevel,
    /// Mask applied to the data modules
    pub mask: MaskPattern,
}

impl EncodedSymbol {
    /// Modules per side
    pub fn dimension(&self) -> usize {
        self.version.dimension()
    }
}

/// Smallest version in `min..=40` whose capacity holds the segments
fn choose_version(
    segments: &[EncodeSegment],
    ec_level: ECLevel,
    min: Version,
) -> Result<Version, EncodeError> {
    let mut needed = 0;
    for number in min.number()..=Version::MAX.number() {
        let version = Version::new(number).ok_or(EncodeError::DataTooLong {
            bits: needed,
            capacity: 0,
        })?;
        let bits: Option<usize> = segments.iter().map(|s| s.encoded_bits(number)).sum();
        if let Some(bits) = bits {
            needed = bits;
            if bits <= data_capacity_bits(version, ec_level) {
                return Ok(version);
            }
        }
    }
    Err(EncodeError::DataTooLong {
        bits: needed,
        capacity: data_capacity_bits(Version::MAX, ec_level),
    })
}

/// Segment bits, terminator and padding as data codewords
pub fn data_codewords(
    segments: &[EncodeSegment],
    version: Version,
    ec_level: ECLevel,
) -> Result<Vec<u8>, EncodeError> {
    let capacity = data_capacity_bits(version, ec_level);
    let mut bits = BitBuffer::new();
    for segment in segments {
        if segment.encoded_bits(version.number()).is_none() {
            return Err(EncodeError::DataTooLong {
                bits: segment.data.len(),
                capacity,
            });
        }
        segment.write(version.number(), &mut bits);
    }
    if bits.len() > capacity {
        return Err(EncodeError::DataTooLong {
            bits: bits.len(),
            capacity,
        });
    }

    bits.append(0, (capacity - bits.len()).min(4));
    let mut bytes = bits.to_bytes();
    let mut pad = PAD_BYTES.iter().cycle();
    while bytes.len() < capacity / 8 {
        bytes.push(*pad.next().unwrap_or(&PAD_BYTES[0]));
    }
    Ok(bytes)
}

/// Split data into blocks, append EC codewords and interleave
pub fn add_ec_and_interleave(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
    let info = ec_block_info(version, ec_level);
    let encoder = ReedSolomonEncoder::new(info.ecc_per_block);

    let mut blocks: Vec<(&[u8], Vec<u8>)> = Vec::with_capacity(info.num_blocks);
    let mut offset = 0;
    for j in 0..info.num_blocks {
        let len = info.data_len(j);
        let block = &data[offset..offset + len];
        blocks.push((block, encoder.encode(block)));
        offset += len;
    }

    let longest = info.data_len(info.num_blocks - 1);
    let mut out = Vec::with_capacity(info.total_codewords);
    for i in 0..longest {
        out.extend(blocks.iter().filter_map(|(d, _)| d.get(i)));
    }
    for i in 0..info.ecc_per_block {
        out.extend(blocks.iter().map(|(_, ec)| ec[i]));
    }
    out
}

/// Finder, separator, timing, alignment, dark module and version information
fn draw_function_patterns(matrix: &mut BitMatrix, version: Version) {
    let n = version.dimension();

    for (cx, cy) in [(3, 3), (n - 4, 3), (3, n - 4)] {
        for dy in -4isize..=4 {
            for dx in -4isize..=4 {
                let x = cx as isize + dx;
                let y = cy as isize + dy;
                if x < 0 || y < 0 || x >= n as isize || y >= n as isize {
                    continue;
                }
                let ring = dx.abs().max(dy.abs());
                matrix.set(x as usize, y as usize, matches!(ring, 0 | 1 | 3));
            }
        }
    }

    for i in 8..n - 8 {
        matrix.set(i, 6, i % 2 == 0);
        matrix.set(6, i, i % 2 == 0);
    }

    for (cx, cy) in alignment_pattern_centers(version) {
        for dy in -2isize..=2 {
            for dx in -2isize..=2 {
                let ring = dx.abs().max(dy.abs());
                matrix.set(
                    (cx as isize + dx) as usize,
                    (cy as isize + dy) as usize,
                    ring != 1,
                );
            }
        }
    }

    matrix.set(8, n - 8, true);

    if version.has_version_info() {
        let codeword = VersionInfo::codeword(version);
        for k in 0..18 {
            let dark = (codeword >> k) & 1 == 1;
            let ((ax, ay), (bx, by)) = version_bit_position(n, k);
            matrix.set(ax, ay, dark);
            matrix.set(bx, by, dark);
        }
    }
}

fn draw_format(matrix: &mut BitMatrix, ec_level: ECLevel, mask: MaskPattern) {
    let codeword = FormatInfo {
        ec_level,
        mask_pattern: mask,
    }
    .codeword();
    let n = matrix.width();
    let split = format_copy_split(n);
    for k in 0..15 {
        let dark = (codeword >> (14 - k)) & 1 == 1;
        let (x, y) = FORMAT_COPY_TOP_LEFT[k];
        matrix.set(x, y, dark);
        let (x, y) = split[k];
        matrix.set(x, y, dark);
    }
}

/// Penalty score of a finished (masked, formatted) symbol
pub fn penalty(matrix: &BitMatrix) -> usize {
    let n = matrix.width();
    let mut score = 0;

    // N1 runs and N3 finder-like sequences, rows then columns
    for transpose in [false, true] {
        let at = |a: usize, b: usize| if transpose { matrix.get(b, a) } else { matrix.get(a, b) };
        for line in 0..n {
            let mut run = 1;
            for i in 1..n {
                if at(i, line) == at(i - 1, line) {
                    run += 1;
                } else {
                    if run >= 5 {
                        score += run - 2;
                    }
                    run = 1;
                }
            }
            if run >= 5 {
                score += run - 2;
            }

            for i in 0..n.saturating_sub(6) {
                let core = at(i, line)
                    && !at(i + 1, line)
                    && at(i + 2, line)
                    && at(i + 3, line)
                    && at(i + 4, line)
                    && !at(i + 5, line)
                    && at(i + 6, line);
                if !core {
                    continue;
                }
                let light_before = (1..=4).all(|k| i < k || !at(i - k, line));
                let light_after = (7..=10).all(|k| i + k >= n || !at(i + k, line));
                if light_before || light_after {
                    score += 40;
                }
            }
        }
    }

    // N2 2x2 blocks
    for y in 0..n - 1 {
        for x in 0..n - 1 {
            let c = matrix.get(x, y);
            if c == matrix.get(x + 1, y) && c == matrix.get(x, y + 1) && c == matrix.get(x + 1, y + 1)
            {
                score += 3;
            }
        }
    }

    // N4 dark proportion
    let total = n * n;
    let dark = matrix.count_ones();
    let k = (dark * 20).abs_diff(total * 10).div_ceil(total).saturating_sub(1);
    score + k * 10
}

/// Build a symbol from segments. `version` fixes the version (it must be
/// large enough), `mask` fixes the mask; otherwise the lowest penalty wins.
pub fn encode_segments(
    segments: &[EncodeSegment],
    ec_level: ECLevel,
    version: Option<Version>,
    mask: Option<MaskPattern>,
) -> Result<EncodedSymbol, EncodeError> {
    let version = match version {
        Some(v) => v,
        None => choose_version(segments, ec_level, Version::MIN)?,
    };
    let data = data_codewords(segments, version, ec_level)?;
    let codewords = add_ec_and_interleave(&data, version, ec_level);

    let func = FunctionMask::new(version);
    let mut base = BitMatrix::square(version.dimension());
    draw_function_patterns(&mut base, version);
    for (i, &(x, y)) in placement_order(&func).iter().enumerate() {
        let dark = codewords
            .get(i / 8)
            .is_some_and(|byte| (byte >> (7 - i % 8)) & 1 == 1);
        base.set(x, y, dark);
    }

    let candidates: Vec<MaskPattern> = match mask {
        Some(m) => vec![m],
        None => MaskPattern::ALL.to_vec(),
    };
    let mut best: Option<(usize, BitMatrix, MaskPattern)> = None;
    for candidate in candidates {
        let mut matrix = base.clone();
        unmask(&mut matrix, candidate, &func);
        draw_format(&mut matrix, ec_level, candidate);
        let score = penalty(&matrix);
        if best.as_ref().is_none_or(|(s, _, _)| score < *s) {
            best = Some((score, matrix, candidate));
        }
    }
    let (score, modules, mask) = best.ok_or(EncodeError::DataTooLong {
        bits: 0,
        capacity: 0,
    })?;
    debug!(
        "encoded v{} {:?} with {:?} (penalty {score})",
        version.number(),
        ec_level,
        mask
    );
    Ok(EncodedSymbol {
        modules,
        version,
        ec_level,
        mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::QrDecoder;
    use crate::models::{ModuleGrid, Mode};

    #[test]
    fn test_known_data_codewords() {
        // "01234567" at 1-M
        let segments = [EncodeSegment::numeric("01234567").unwrap()];
        let data = data_codewords(&segments, Version::new(1).unwrap(), ECLevel::M).unwrap();
        assert_eq!(
            data,
            vec![
                0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC,
                0x11, 0xEC, 0x11
            ]
        );
    }

    #[test]
    fn test_auto_version_grows() {
        let small = encode_segments(&[EncodeSegment::auto("HI")], ECLevel::H, None, None).unwrap();
        assert_eq!(small.version.number(), 1);
        let text = "x".repeat(200);
        let large = encode_segments(&[EncodeSegment::auto(&text)], ECLevel::M, None, None).unwrap();
        assert_eq!(large.version.number(), 10);
    }

    #[test]
    fn test_fixed_version_too_small() {
        let text = "x".repeat(40);
        let result = encode_segments(
            &[EncodeSegment::auto(&text)],
            ECLevel::H,
            Version::new(1),
            None,
        );
        assert!(matches!(result, Err(EncodeError::DataTooLong { .. })));
    }

    #[test]
    fn test_encoded_grid_decodes() {
        for (text, level) in [
            ("4376471154038", ECLevel::M),
            ("HELLO WORLD", ECLevel::Q),
            ("mixed Case bytes!", ECLevel::L),
        ] {
            let symbol =
                encode_segments(&[EncodeSegment::auto(text)], level, None, None).unwrap();
            let grid = ModuleGrid::from_matrix(symbol.modules.clone());
            let decoded = QrDecoder::decode(&grid, None).unwrap();
            assert_eq!(decoded.payload.text(), text);
            assert_eq!(decoded.metadata.ec_level, level);
            assert_eq!(decoded.metadata.mask, symbol.mask);
        }
    }

    #[test]
    fn test_version_seven_carries_version_info() {
        let symbol = encode_segments(
            &[EncodeSegment::kanji("ひらがなカタカナ").unwrap()],
            ECLevel::H,
            Version::new(7),
            Some(MaskPattern::Pattern3),
        )
        .unwrap();
        let grid = ModuleGrid::from_matrix(symbol.modules);
        let decoded = QrDecoder::decode(&grid, None).unwrap();
        assert_eq!(decoded.metadata.version.number(), 7);
        assert_eq!(decoded.metadata.mask, MaskPattern::Pattern3);
        assert_eq!(decoded.payload.segments[0].mode, Mode::Kanji);
        assert_eq!(decoded.payload.text(), "ひらがなカタカナ");
    }

    #[test]
    fn test_penalty_prefers_balanced() {
        let n = 21;
        let blank = BitMatrix::square(n);
        let mut checker = BitMatrix::square(n);
        for y in 0..n {
            for x in 0..n {
                checker.set(x, y, (x + y) % 2 == 0);
            }
        }
        assert!(penalty(&checker) < penalty(&blank));
    }
}
