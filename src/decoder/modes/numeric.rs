/// Numeric mode decoder (Mode 0001)
use crate::decoder::bit_reader::BitReader;
use crate::error::MalformedReason;

/// Groups of 3 digits = 10 bits, 2 digits = 7 bits, 1 digit = 4 bits
pub struct NumericDecoder;

impl NumericDecoder {
    /// Bits needed for `count` digits
    pub fn bits_needed(count: usize) -> usize {
        count / 3 * 10 + [0, 4, 7][count % 3]
    }

    /// Read `character_count` digits
    pub fn decode(reader: &mut BitReader, character_count: usize) -> Result<String, MalformedReason> {
        let mut result = String::with_capacity(character_count);
        let mut remaining = character_count;

        while remaining > 0 {
            let (digits, bits) = match remaining {
                1 => (1, 4),
                2 => (2, 7),
                _ => (3, 10),
            };
            let value = reader.read(bits).ok_or(MalformedReason::CountOverflow {
                count: character_count,
                needed: Self::bits_needed(remaining),
                available: reader.available(),
            })? as u16;
            if value >= [10, 100, 1000][digits - 1] {
                return Err(MalformedReason::InvalidNumeric(value));
            }
            result.push_str(&format!("{value:0digits$}"));
            remaining -= digits;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_decode() {
        // 012 | 345 | 67 -> 0000001100 0101011001 1000011
        let data = [0b0000_0011, 0b0001_0101, 0b1001_1000, 0b0110_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(NumericDecoder::decode(&mut reader, 8), Ok("01234567".into()));
        assert_eq!(reader.position(), 27);
    }

    #[test]
    fn test_rejects_group_out_of_range() {
        // 1017 does not fit three digits
        let data = [0b1111_1110, 0b0100_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(
            NumericDecoder::decode(&mut reader, 3),
            Err(MalformedReason::InvalidNumeric(1017))
        );
    }

    #[test]
    fn test_bits_needed() {
        assert_eq!(NumericDecoder::bits_needed(8), 27);
        assert_eq!(NumericDecoder::bits_needed(3), 10);
        assert_eq!(NumericDecoder::bits_needed(1), 4);
    }
}
