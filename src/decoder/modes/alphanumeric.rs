/// Alphanumeric mode decoder (Mode 0010)
use crate::decoder::bit_reader::BitReader;
use crate::error::MalformedReason;

/// Alphanumeric character set: 0-9, A-Z, space, $%*+-./:
pub const ALPHANUMERIC_TABLE: [char; 45] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', ' ', '$',
    '%', '*', '+', '-', '.', '/', ':',
];

/// Index of `c` in the alphanumeric table
pub fn alphanumeric_index(c: char) -> Option<usize> {
    ALPHANUMERIC_TABLE.iter().position(|&t| t == c)
}

/// Pairs = 11 bits, single = 6 bits
pub struct AlphanumericDecoder;

impl AlphanumericDecoder {
    /// Bits needed for `count` characters
    pub fn bits_needed(count: usize) -> usize {
        count / 2 * 11 + count % 2 * 6
    }

    /// Read `character_count` characters
    pub fn decode(reader: &mut BitReader, character_count: usize) -> Result<String, MalformedReason> {
        let mut result = String::with_capacity(character_count);
        let mut remaining = character_count;

        while remaining > 0 {
            let pair = remaining >= 2;
            let bits = if pair { 11 } else { 6 };
            let value = reader.read(bits).ok_or(MalformedReason::CountOverflow {
                count: character_count,
                needed: Self::bits_needed(remaining),
                available: reader.available(),
            })? as u16;

            if pair {
                if value >= 45 * 45 {
                    return Err(MalformedReason::InvalidAlphanumeric(value));
                }
                result.push(ALPHANUMERIC_TABLE[(value / 45) as usize]);
                result.push(ALPHANUMERIC_TABLE[(value % 45) as usize]);
                remaining -= 2;
            } else {
                let c = ALPHANUMERIC_TABLE
                    .get(value as usize)
                    .ok_or(MalformedReason::InvalidAlphanumeric(value))?;
                result.push(*c);
                remaining -= 1;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphanumeric_decode() {
        // "A1" = 10 * 45 + 1 = 451 = 00111000011, then "Z" = 35 = 100011
        let data = [0b0011_1000, 0b0111_0001, 0b1000_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(AlphanumericDecoder::decode(&mut reader, 3), Ok("A1Z".into()));
        assert_eq!(reader.position(), 17);
    }

    #[test]
    fn test_rejects_out_of_range_pair() {
        // 2047 >= 2025
        let data = [0xFF, 0xE0];
        let mut reader = BitReader::new(&data);
        assert_eq!(
            AlphanumericDecoder::decode(&mut reader, 2),
            Err(MalformedReason::InvalidAlphanumeric(2047))
        );
    }

    #[test]
    fn test_index_lookup() {
        assert_eq!(alphanumeric_index('0'), Some(0));
        assert_eq!(alphanumeric_index(':'), Some(44));
        assert_eq!(alphanumeric_index('a'), None);
    }
}
