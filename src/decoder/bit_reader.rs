/// MSB-first reader over corrected data codewords
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Reader positioned at the first bit
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bits not yet consumed
    pub fn available(&self) -> usize {
        self.data.len() * 8 - self.position
    }

    /// Bits consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read `count` bits (at most 32); None if fewer remain
    pub fn read(&mut self, count: usize) -> Option<u32> {
        if count > 32 || count > self.available() {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..count {
            let byte = self.data[self.position / 8];
            let bit = (byte >> (7 - self.position % 8)) & 1;
            value = (value << 1) | bit as u32;
            self.position += 1;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_across_bytes() {
        let data = [0b1010_1100, 0b0101_0011];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(4), Some(0b1010));
        assert_eq!(reader.read(6), Some(0b1100_01));
        assert_eq!(reader.available(), 6);
        assert_eq!(reader.position(), 10);
        assert_eq!(reader.read(7), None);
        assert_eq!(reader.read(6), Some(0b01_0011));
        assert_eq!(reader.read(1), None);
        assert_eq!(reader.read(0), Some(0));
    }
}
