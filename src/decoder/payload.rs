/// Segment parsing of corrected data codewords
use log::trace;

use crate::decoder::bit_reader::BitReader;
use crate::decoder::modes::alphanumeric::AlphanumericDecoder;
use crate::decoder::modes::byte::ByteDecoder;
use crate::decoder::modes::charset::{Charset, decode_default};
use crate::decoder::modes::kanji::KanjiDecoder;
use crate::decoder::modes::numeric::NumericDecoder;
use crate::error::MalformedReason;
use crate::models::{DecodedPayload, Mode, Segment, StructuredAppend, Version};

const MODE_TERMINATOR: u32 = 0b0000;
const MODE_NUMERIC: u32 = 0b0001;
const MODE_ALPHANUMERIC: u32 = 0b0010;
const MODE_STRUCTURED_APPEND: u32 = 0b0011;
const MODE_BYTE: u32 = 0b0100;
const MODE_FNC1_FIRST: u32 = 0b0101;
const MODE_ECI: u32 = 0b0111;
const MODE_KANJI: u32 = 0b1000;
const MODE_FNC1_SECOND: u32 = 0b1001;

/// ASCII group separator standing in for FNC1 inside GS1 data
const GROUP_SEPARATOR: char = '\u{1D}';

/// Parse the data codewords of a symbol into segments. The stream ends at the
/// terminator or when fewer than four bits remain.
pub fn decode_payload(data: &[u8], version: Version) -> Result<DecodedPayload, MalformedReason> {
    let mut reader = BitReader::new(data);
    let mut payload = DecodedPayload::default();
    let mut charset: Option<Charset> = None;

    while reader.available() >= 4 {
        let indicator = reader.read(4).ok_or(MalformedReason::BlockStructure)?;
        match indicator {
            MODE_TERMINATOR => break,
            MODE_ECI => {
                let value = read_eci(&mut reader)?;
                trace!("ECI {value}");
                charset = Charset::from_eci(value);
                payload.eci = Some(value);
            }
            MODE_STRUCTURED_APPEND => {
                if reader.available() < 16 {
                    return Err(MalformedReason::CountOverflow {
                        count: 1,
                        needed: 16,
                        available: reader.available(),
                    });
                }
                let sequence = reader.read(8).ok_or(MalformedReason::BlockStructure)?;
                let parity = reader.read(8).ok_or(MalformedReason::BlockStructure)?;
                payload.structured_append = Some(StructuredAppend {
                    index: (sequence >> 4) as u8,
                    total: (sequence & 0x0F) as u8 + 1,
                    parity: parity as u8,
                });
            }
            MODE_FNC1_FIRST => payload.fnc1 = true,
            MODE_FNC1_SECOND => {
                // application indicator
                reader.read(8).ok_or(MalformedReason::CountOverflow {
                    count: 1,
                    needed: 8,
                    available: reader.available(),
                })?;
                payload.fnc1 = true;
            }
            MODE_NUMERIC | MODE_ALPHANUMERIC | MODE_BYTE | MODE_KANJI => {
                let mode = match indicator {
                    MODE_NUMERIC => Mode::Numeric,
                    MODE_ALPHANUMERIC => Mode::Alphanumeric,
                    MODE_BYTE => Mode::Byte,
                    _ => Mode::Kanji,
                };
                let segment = read_segment(&mut reader, mode, version, charset, payload.fnc1)?;
                payload.segments.push(segment);
            }
            other => return Err(MalformedReason::UnknownMode(other as u8)),
        }
    }

    Ok(payload)
}

fn read_segment(
    reader: &mut BitReader,
    mode: Mode,
    version: Version,
    charset: Option<Charset>,
    fnc1: bool,
) -> Result<Segment, MalformedReason> {
    let count_bits = mode.count_bits(version.number());
    let count = reader.read(count_bits).ok_or(MalformedReason::CountOverflow {
        count: 0,
        needed: count_bits,
        available: reader.available(),
    })? as usize;

    let needed = match mode {
        Mode::Numeric => NumericDecoder::bits_needed(count),
        Mode::Alphanumeric => AlphanumericDecoder::bits_needed(count),
        Mode::Byte => count * 8,
        Mode::Kanji => count * 13,
    };
    if needed > reader.available() {
        return Err(MalformedReason::CountOverflow {
            count,
            needed,
            available: reader.available(),
        });
    }

    let segment = match mode {
        Mode::Numeric => {
            let text = NumericDecoder::decode(reader, count)?;
            Segment {
                mode,
                bytes: text.clone().into_bytes(),
                text,
            }
        }
        Mode::Alphanumeric => {
            let mut text = AlphanumericDecoder::decode(reader, count)?;
            if fnc1 {
                text = expand_gs1_percent(&text);
            }
            Segment {
                mode,
                bytes: text.clone().into_bytes(),
                text,
            }
        }
        Mode::Byte => {
            let bytes = ByteDecoder::decode(reader, count)?;
            let text = match charset {
                Some(charset) => charset.decode(&bytes),
                None => decode_default(&bytes),
            };
            Segment { mode, text, bytes }
        }
        Mode::Kanji => {
            let (text, bytes) = KanjiDecoder::decode(reader, count)?;
            Segment { mode, text, bytes }
        }
    };
    trace!("{:?} segment of {count}", segment.mode);
    Ok(segment)
}

/// 0xxxxxxx, 10xxxxxx xxxxxxxx or 110xxxxx xxxxxxxx xxxxxxxx
fn read_eci(reader: &mut BitReader) -> Result<u32, MalformedReason> {
    let first = reader.read(8).ok_or(MalformedReason::InvalidEci)?;
    if first & 0x80 == 0 {
        Ok(first & 0x7F)
    } else if first & 0xC0 == 0x80 {
        let rest = reader.read(8).ok_or(MalformedReason::InvalidEci)?;
        Ok(((first & 0x3F) << 8) | rest)
    } else if first & 0xE0 == 0xC0 {
        let rest = reader.read(16).ok_or(MalformedReason::InvalidEci)?;
        Ok(((first & 0x1F) << 16) | rest)
    } else {
        Err(MalformedReason::InvalidEci)
    }
}

/// In FNC1 alphanumeric data "%%" stands for '%' and a lone '%' for FNC1
fn expand_gs1_percent(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
            } else {
                out.push(GROUP_SEPARATOR);
            }
        } else {
            out.push(c);
        }
    }
    out
}
