use encoding_rs::SHIFT_JIS;

/// Character sets selectable through ECI designators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8 (ECI 26)
    Utf8,
    /// ISO-8859-1 (ECI 0-3)
    Latin1,
    /// US-ASCII (ECI 27, 170)
    Ascii,
    /// Shift_JIS (ECI 20)
    ShiftJis,
}

impl Charset {
    /// Charset for an ECI assignment number, if supported
    pub fn from_eci(value: u32) -> Option<Self> {
        match value {
            0..=3 => Some(Charset::Latin1),
            20 => Some(Charset::ShiftJis),
            26 => Some(Charset::Utf8),
            27 | 170 => Some(Charset::Ascii),
            _ => None,
        }
    }

    /// ECI assignment number written by the encoder
    pub fn eci(&self) -> u32 {
        match self {
            Charset::Latin1 => 3,
            Charset::ShiftJis => 20,
            Charset::Utf8 => 26,
            Charset::Ascii => 27,
        }
    }

    /// Decode bytes; unmappable bytes become U+FFFD
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Charset::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{FFFD}' })
                .collect(),
            Charset::ShiftJis => SHIFT_JIS.decode_without_bom_handling(bytes).0.into_owned(),
        }
    }
}

/// Text of byte-mode data with no ECI in effect: UTF-8 when valid, else Latin-1
pub fn decode_default(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => Charset::Latin1.decode(bytes),
    }
}

/// Character of a Shift_JIS double-byte code, `None` when JIS X 0208 leaves
/// the code unassigned
pub fn shift_jis_char(code: u16) -> Option<char> {
    let bytes = code.to_be_bytes();
    let (text, had_errors) = SHIFT_JIS.decode_without_bom_handling(&bytes);
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !had_errors => Some(c),
        _ => None,
    }
}

/// Shift_JIS double-byte code of a character, `None` for characters with a
/// single-byte encoding or none at all
pub fn shift_jis_code(c: char) -> Option<u16> {
    let mut buf = [0u8; 4];
    let (bytes, _, had_errors) = SHIFT_JIS.encode(c.encode_utf8(&mut buf));
    match *bytes {
        [lead, trail] if !had_errors => Some(u16::from_be_bytes([lead, trail])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eci_assignments() {
        assert_eq!(Charset::from_eci(26), Some(Charset::Utf8));
        assert_eq!(Charset::from_eci(3), Some(Charset::Latin1));
        assert_eq!(Charset::from_eci(20), Some(Charset::ShiftJis));
        assert_eq!(Charset::from_eci(999), None);
        for cs in [Charset::Utf8, Charset::Latin1, Charset::Ascii, Charset::ShiftJis] {
            assert_eq!(Charset::from_eci(cs.eci()), Some(cs));
        }
    }

    #[test]
    fn test_default_guess() {
        assert_eq!(decode_default("héllo".as_bytes()), "héllo");
        assert_eq!(decode_default(&[0x68, 0xE9]), "hé");
    }

    #[test]
    fn test_shift_jis_bytes() {
        // "アゥ" full-width katakana, then half-width "ｱ" and ASCII
        let bytes = [0x83, 0x41, 0x83, 0x44, 0xB1, b'!'];
        assert_eq!(Charset::ShiftJis.decode(&bytes), "アゥｱ!");
        assert_eq!(Charset::ShiftJis.decode(&[0x8A, 0xBF, 0x8E, 0x9A]), "漢字");
        assert_eq!(Charset::Ascii.decode(&[0x41, 0xC0]), "A\u{FFFD}");
    }

    #[test]
    fn test_shift_jis_char() {
        assert_eq!(shift_jis_char(0x8343), Some('イ'));
        assert_eq!(shift_jis_char(0x82A0), Some('あ'));
        assert_eq!(shift_jis_char(0x8260), Some('Ａ'));
        assert_eq!(shift_jis_char(0x889F), Some('亜'));
        assert_eq!(shift_jis_char(0x935F), Some('点'));
        assert_eq!(shift_jis_char(0xE4AA), Some('茗'));
        // row 0x85 holds no JIS X 0208 characters
        assert_eq!(shift_jis_char(0x8540), None);
    }

    #[test]
    fn test_shift_jis_code_inverts_char() {
        for c in ['　', '０', 'Ｚ', 'ｚ', 'ぁ', 'ん', 'ァ', 'ヶ', '漢', '字', '亜', '茗'] {
            let code = shift_jis_code(c).unwrap();
            assert_eq!(shift_jis_char(code), Some(c));
        }
        assert_eq!(shift_jis_code('漢'), Some(0x8ABF));
        assert_eq!(shift_jis_code('A'), None);
        assert_eq!(shift_jis_code('ｱ'), None);
        assert_eq!(shift_jis_code('€'), None);
    }
}
