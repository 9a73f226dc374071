/// Segment encoding: mode-specific bit packing
use crate::decoder::modes::alphanumeric::alphanumeric_index;
use crate::decoder::modes::charset::shift_jis_code;
use crate::decoder::modes::kanji::KanjiDecoder;
use crate::encoder::EncodeError;
use crate::models::Mode;

/// ECI mode indicator
const MODE_ECI: u32 = 0b0111;

/// Append-only bit buffer, MSB first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits written
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// No bits written yet
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Append the low `count` bits of `value`
    pub fn append(&mut self, value: u32, count: usize) {
        debug_assert!(count <= 32);
        for i in (0..count).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    /// Append every bit of `other`
    pub fn extend(&mut self, other: &BitBuffer) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Pack into bytes; a trailing partial byte is zero-padded
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << (7 - i)))
            })
            .collect()
    }
}

/// What a segment carries ahead of its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// A data segment with a character count
    Data(Mode),
    /// An ECI designator switching the charset of following byte segments
    Eci(u32),
}

/// One segment ready to be written into a symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSegment {
    /// Mode indicator and header shape
    pub kind: SegmentKind,
    /// Characters (bytes for byte mode)
    pub char_count: usize,
    /// Packed payload bits, without mode indicator or count
    pub data: BitBuffer,
}

impl EncodeSegment {
    /// Digits only, three per 10 bits
    pub fn numeric(text: &str) -> Result<Self, EncodeError> {
        let digits: Vec<u32> = text
            .chars()
            .map(|c| {
                c.to_digit(10).ok_or(EncodeError::InvalidCharacter {
                    mode: Mode::Numeric,
                    ch: c,
                })
            })
            .collect::<Result<_, _>>()?;
        let mut data = BitBuffer::new();
        for group in digits.chunks(3) {
            let value = group.iter().fold(0, |acc, &d| acc * 10 + d);
            data.append(value, group.len() * 3 + 1);
        }
        Ok(Self {
            kind: SegmentKind::Data(Mode::Numeric),
            char_count: digits.len(),
            data,
        })
    }

    /// Upper-case letters, digits and ` $%*+-./:`, two per 11 bits
    pub fn alphanumeric(text: &str) -> Result<Self, EncodeError> {
        let values: Vec<u32> = text
            .chars()
            .map(|c| {
                alphanumeric_index(c).map(|i| i as u32).ok_or(EncodeError::InvalidCharacter {
                    mode: Mode::Alphanumeric,
                    ch: c,
                })
            })
            .collect::<Result<_, _>>()?;
        let mut data = BitBuffer::new();
        for pair in values.chunks(2) {
            match pair {
                [a, b] => data.append(a * 45 + b, 11),
                [a] => data.append(*a, 6),
                _ => {}
            }
        }
        Ok(Self {
            kind: SegmentKind::Data(Mode::Alphanumeric),
            char_count: values.len(),
            data,
        })
    }

    /// Raw bytes, eight bits each
    pub fn bytes(bytes: &[u8]) -> Self {
        let mut data = BitBuffer::new();
        for &b in bytes {
            data.append(b as u32, 8);
        }
        Self {
            kind: SegmentKind::Data(Mode::Byte),
            char_count: bytes.len(),
            data,
        }
    }

    /// Characters with a Shift_JIS double-byte code, 13 bits each
    pub fn kanji(text: &str) -> Result<Self, EncodeError> {
        let mut data = BitBuffer::new();
        let mut count = 0;
        for c in text.chars() {
            let value = shift_jis_code(c)
                .and_then(KanjiDecoder::compact)
                .ok_or(EncodeError::InvalidCharacter {
                    mode: Mode::Kanji,
                    ch: c,
                })?;
            data.append(value as u32, 13);
            count += 1;
        }
        Ok(Self {
            kind: SegmentKind::Data(Mode::Kanji),
            char_count: count,
            data,
        })
    }

    /// ECI designator in its 1, 2 or 3 byte form
    pub fn eci(assignment: u32) -> Result<Self, EncodeError> {
        let mut data = BitBuffer::new();
        match assignment {
            0..=0x7F => data.append(assignment, 8),
            0x80..=0x3FFF => data.append((0b10 << 14) | assignment, 16),
            0x4000..=0x1F_FFFF => data.append((0b110 << 21) | assignment, 24),
            _ => return Err(EncodeError::InvalidEci(assignment)),
        }
        Ok(Self {
            kind: SegmentKind::Eci(assignment),
            char_count: 0,
            data,
        })
    }

    /// The densest single mode that can hold `text`
    pub fn auto(text: &str) -> Self {
        if text.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(segment) = Self::numeric(text) {
                return segment;
            }
        }
        if text.chars().all(|c| alphanumeric_index(c).is_some()) {
            if let Ok(segment) = Self::alphanumeric(text) {
                return segment;
            }
        }
        Self::bytes(text.as_bytes())
    }

    /// Mode of a data segment
    pub fn mode(&self) -> Option<Mode> {
        match self.kind {
            SegmentKind::Data(mode) => Some(mode),
            SegmentKind::Eci(_) => None,
        }
    }

    /// Bits this segment occupies in a symbol of `version`, or `None` if the
    /// character count does not fit its field
    pub fn encoded_bits(&self, version: u8) -> Option<usize> {
        match self.kind {
            SegmentKind::Eci(_) => Some(4 + self.data.len()),
            SegmentKind::Data(mode) => {
                let count_bits = mode.count_bits(version);
                (self.char_count < 1 << count_bits).then_some(4 + count_bits + self.data.len())
            }
        }
    }

    /// Write mode indicator, count and data
    pub fn write(&self, version: u8, out: &mut BitBuffer) {
        match self.kind {
            SegmentKind::Eci(_) => out.append(MODE_ECI, 4),
            SegmentKind::Data(mode) => {
                out.append(mode.indicator() as u32, 4);
                out.append(self.char_count as u32, mode.count_bits(version));
            }
        }
        out.extend(&self.data);
    }
}
