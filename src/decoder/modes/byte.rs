/// Byte mode decoder (Mode 0100) for 8-bit data
use crate::decoder::bit_reader::BitReader;
use crate::error::MalformedReason;

/// Eight bits per character
pub struct ByteDecoder;

impl ByteDecoder {
    /// Raw bytes; the caller picks the character set
    pub fn decode(reader: &mut BitReader, character_count: usize) -> Result<Vec<u8>, MalformedReason> {
        if character_count * 8 > reader.available() {
            return Err(MalformedReason::CountOverflow {
                count: character_count,
                needed: character_count * 8,
                available: reader.available(),
            });
        }
        let mut bytes = Vec::with_capacity(character_count);
        for _ in 0..character_count {
            bytes.push(reader.read(8).ok_or(MalformedReason::BlockStructure)? as u8);
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_decode() {
        let data = [0x48, 0x49, 0x00];
        let mut reader = BitReader::new(&data);
        assert_eq!(ByteDecoder::decode(&mut reader, 2), Ok(b"HI".to_vec()));
    }

    #[test]
    fn test_count_overflow() {
        let data = [0x48, 0x49];
        let mut reader = BitReader::new(&data);
        assert_eq!(
            ByteDecoder::decode(&mut reader, 3),
            Err(MalformedReason::CountOverflow {
                count: 3,
                needed: 24,
                available: 16
            })
        );
    }
}
