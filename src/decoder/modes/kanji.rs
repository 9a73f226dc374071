/// Kanji mode decoder (Mode 1000): 13-bit compacted Shift_JIS pairs
use crate::decoder::bit_reader::BitReader;
use crate::decoder::modes::charset::shift_jis_char;
use crate::error::MalformedReason;

/// Thirteen bits per character
pub struct KanjiDecoder;

impl KanjiDecoder {
    /// Expand a 13-bit value into its Shift_JIS double byte
    pub fn expand(value: u16) -> Option<u16> {
        let assembled = ((value / 0xC0) << 8) | (value % 0xC0);
        let code = if assembled < 0x1F00 {
            assembled + 0x8140
        } else {
            assembled + 0xC140
        };
        let trail = code & 0xFF;
        (trail != 0x7F && trail <= 0xFC).then_some(code)
    }

    /// Compact a Shift_JIS double byte into 13 bits
    pub fn compact(code: u16) -> Option<u16> {
        let offset = match code {
            0x8140..=0x9FFC => code - 0x8140,
            0xE040..=0xEBBF => code - 0xC140,
            _ => return None,
        };
        Some((offset >> 8) * 0xC0 + (offset & 0xFF))
    }

    /// Text and Shift_JIS bytes of `character_count` characters
    pub fn decode(
        reader: &mut BitReader,
        character_count: usize,
    ) -> Result<(String, Vec<u8>), MalformedReason> {
        if character_count * 13 > reader.available() {
            return Err(MalformedReason::CountOverflow {
                count: character_count,
                needed: character_count * 13,
                available: reader.available(),
            });
        }
        let mut text = String::with_capacity(character_count);
        let mut bytes = Vec::with_capacity(character_count * 2);
        for _ in 0..character_count {
            let value = reader.read(13).ok_or(MalformedReason::BlockStructure)? as u16;
            let code = Self::expand(value).ok_or(MalformedReason::InvalidKanji(value))?;
            text.push(shift_jis_char(code).ok_or(MalformedReason::InvalidKanji(value))?);
            bytes.extend_from_slice(&code.to_be_bytes());
        }
        Ok((text, bytes))
    }
}
