/// BCH codes protecting format information (15,5) and version information (18,6)

/// x^10 + x^8 + x^5 + x^4 + x^2 + x + 1
pub const FORMAT_GENERATOR: u32 = 0x537;
/// XOR mask applied to every format codeword
pub const FORMAT_MASK: u16 = 0x5412;
/// x^12 + x^11 + x^10 + x^9 + x^8 + x^5 + x^2 + 1
pub const VERSION_GENERATOR: u32 = 0x1F25;

/// Remainder of `value` divided by `generator` over GF(2)
pub fn poly_remainder(mut value: u32, generator: u32) -> u32 {
    let degree = 31 - generator.leading_zeros();
    while value != 0 && 31 - value.leading_zeros() >= degree {
        let shift = (31 - value.leading_zeros()) - degree;
        value ^= generator << shift;
    }
    value
}

/// Masked 15-bit format codeword for 5 data bits (EC level bits << 3 | mask)
pub fn format_codeword(data: u8) -> u16 {
    let data = (data & 0x1F) as u32;
    let code = (data << 10) | poly_remainder(data << 10, FORMAT_GENERATOR);
    (code as u16) ^ FORMAT_MASK
}

/// 18-bit version codeword (version << 12 | remainder)
pub fn version_codeword(version: u8) -> u32 {
    let data = (version & 0x3F) as u32;
    (data << 12) | poly_remainder(data << 12, VERSION_GENERATOR)
}

/// Number of differing bits
pub fn hamming_distance(a: u32, b: u32) -> u32 {
    (a ^ b).count_ones()
}

/// Closest format data value to any of the read copies, with its distance
pub fn nearest_format(copies: &[u16]) -> (u8, u32) {
    let mut best = (0u8, u32::MAX);
    for data in 0..32u8 {
        let code = format_codeword(data) as u32;
        for &copy in copies {
            let d = hamming_distance(code, copy as u32);
            if d < best.1 {
                best = (data, d);
            }
        }
    }
    best
}

/// Closest version (7-40) to any of the read copies, with its distance
pub fn nearest_version(copies: &[u32]) -> (u8, u32) {
    let mut best = (7u8, u32::MAX);
    for version in 7..=40u8 {
        let code = version_codeword(version);
        for &copy in copies {
            let d = hamming_distance(code, copy);
            if d < best.1 {
                best = (version, d);
            }
        }
    }
    best
}
