/// Splitting interleaved codewords into Reed-Solomon blocks and correcting them
use log::{debug, trace};

use crate::decoder::bitstream::RawCodewords;
use crate::decoder::reed_solomon::ReedSolomonDecoder;
use crate::decoder::tables::EcBlockInfo;
use crate::error::MalformedReason;

/// One Reed-Solomon block: data codewords followed by its EC codewords
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodewordBlock {
    /// Leading data codewords
    pub data_len: usize,
    /// Data then EC codewords
    pub codewords: Vec<u8>,
    /// Confidence of each codeword
    pub confidence: Vec<u8>,
}

impl CodewordBlock {
    fn with_capacity(data_len: usize, ecc: usize) -> Self {
        Self {
            data_len,
            codewords: Vec::with_capacity(data_len + ecc),
            confidence: Vec::with_capacity(data_len + ecc),
        }
    }

    /// Data codewords only
    pub fn data(&self) -> &[u8] {
        &self.codewords[..self.data_len]
    }
}

/// Undo the interleaving: data codewords are spread round-robin over the
/// blocks (long blocks take one extra at the end), then EC codewords likewise.
pub fn deinterleave(
    raw: &RawCodewords,
    info: &EcBlockInfo,
) -> Result<Vec<CodewordBlock>, MalformedReason> {
    if raw.bytes.len() != info.total_codewords || raw.confidence.len() != raw.bytes.len() {
        return Err(MalformedReason::BlockStructure);
    }

    let mut blocks: Vec<CodewordBlock> = (0..info.num_blocks)
        .map(|j| CodewordBlock::with_capacity(info.data_len(j), info.ecc_per_block))
        .collect();
    let mut source = raw.bytes.iter().zip(&raw.confidence);
    let longest = info.data_len(info.num_blocks - 1);

    for i in 0..longest {
        for block in blocks.iter_mut().filter(|b| i < b.data_len) {
            let (&byte, &conf) = source.next().ok_or(MalformedReason::BlockStructure)?;
            block.codewords.push(byte);
            block.confidence.push(conf);
        }
    }
    for _ in 0..info.ecc_per_block {
        for block in blocks.iter_mut() {
            let (&byte, &conf) = source.next().ok_or(MalformedReason::BlockStructure)?;
            block.codewords.push(byte);
            block.confidence.push(conf);
        }
    }
    Ok(blocks)
}

/// Least confident codewords at or below `threshold`, at most `limit` of them
pub fn erasure_candidates(confidence: &[u8], threshold: u8, limit: usize) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..confidence.len())
        .filter(|&i| confidence[i] <= threshold)
        .collect();
    positions.sort_by_key(|&i| confidence[i]);
    positions.truncate(limit);
    positions
}

/// Correct every block and concatenate the data codewords.
///
/// Each block is decoded errors-only, so a block with more than `ecc/2` bad
/// codewords is `TooManyErrors`. Only when `erasure_threshold` is set are
/// failed blocks retried with low-confidence codewords as erasures (at most
/// half the EC codewords); such a retry may correct past `ecc/2`. Returns the
/// data bytes and the number of corrected codewords.
pub fn correct_blocks(
    blocks: &[CodewordBlock],
    ecc_per_block: usize,
    erasure_threshold: Option<u8>,
) -> Result<(Vec<u8>, usize), MalformedReason> {
    let decoder = ReedSolomonDecoder::new(ecc_per_block);
    let mut data = Vec::with_capacity(blocks.iter().map(|b| b.data_len).sum());
    let mut corrected = 0;

    for (index, block) in blocks.iter().enumerate() {
        let mut codewords = block.codewords.clone();
        let fixed = match decoder.decode(&mut codewords) {
            Ok(fixed) => fixed,
            Err(err) => {
                trace!("block {index}: {err}");
                let retry = erasure_threshold.and_then(|threshold| {
                    let erasures =
                        erasure_candidates(&block.confidence, threshold, ecc_per_block / 2);
                    if erasures.is_empty() {
                        return None;
                    }
                    let mut retry = block.codewords.clone();
                    match decoder.decode_with_erasures(&mut retry, &erasures) {
                        Ok(fixed) => {
                            debug!("block {index}: recovered with {} erasures", erasures.len());
                            codewords = retry;
                            Some(fixed)
                        }
                        Err(err) => {
                            trace!("block {index} with erasures: {err}");
                            None
                        }
                    }
                });
                retry.ok_or(MalformedReason::TooManyErrors {
                    block: index,
                    ecc: ecc_per_block,
                })?
            }
        };
        corrected += fixed;
        data.extend_from_slice(&codewords[..block.data_len]);
    }
    Ok((data, corrected))
}
