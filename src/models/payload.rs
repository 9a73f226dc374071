/// Data mode of a payload segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Digits 0-9, 10 bits per 3 digits
    Numeric,
    /// 45-symbol set, 11 bits per pair
    Alphanumeric,
    /// Arbitrary 8-bit bytes
    Byte,
    /// Shift_JIS double-byte characters, 13 bits each
    Kanji,
}

impl Mode {
    /// 4-bit mode indicator
    pub fn indicator(&self) -> u8 {
        match self {
            Mode::Numeric => 0b0001,
            Mode::Alphanumeric => 0b0010,
            Mode::Byte => 0b0100,
            Mode::Kanji => 0b1000,
        }
    }

    /// Width of the character-count field for a version
    pub fn count_bits(&self, version: u8) -> usize {
        let group = match version {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        match self {
            Mode::Numeric => [10, 12, 14][group],
            Mode::Alphanumeric => [9, 11, 13][group],
            Mode::Byte => [8, 16, 16][group],
            Mode::Kanji => [8, 10, 12][group],
        }
    }
}

/// One run of same-mode data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment mode
    pub mode: Mode,
    /// Decoded text
    pub text: String,
    /// Raw bytes as carried by the symbol (Shift_JIS for kanji)
    pub bytes: Vec<u8>,
}

/// Structured-append header (mode 0011)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredAppend {
    /// Position of this symbol in the sequence, from 0
    pub index: u8,
    /// Number of symbols in the sequence
    pub total: u8,
    /// XOR of all payload bytes of the whole sequence
    pub parity: u8,
}

/// Everything read from a symbol's corrected data codewords
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Segments in stream order
    pub segments: Vec<Segment>,
    /// Structured-append header, if present
    pub structured_append: Option<StructuredAppend>,
    /// An FNC1 indicator was present (GS1 or AIM application data)
    pub fnc1: bool,
    /// Last ECI assignment number seen in the stream
    pub eci: Option<u32>,
}

impl DecodedPayload {
    /// Concatenated text of all segments
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Concatenated raw bytes of all segments
    pub fn bytes(&self) -> Vec<u8> {
        self.segments
            .iter()
            .flat_map(|s| s.bytes.iter().copied())
            .collect()
    }
}
