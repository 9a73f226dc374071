/// Reed-Solomon error correction for QR codes
/// QR codes use RS over GF(256) with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
/// and generator roots alpha^0 .. alpha^(ecc-1).
use thiserror::Error;

/// GF(256) field operations using log/exp tables
pub struct Gf256;

static LOG_TABLE: [u8; 256] = [
    0, 0, 1, 25, 2, 50, 26, 198, 3, 223, 51, 238, 27, 104, 199, 75, 4, 100, 224, 14, 52, 141, 239,
    129, 28, 193, 105, 248, 200, 8, 76, 113, 5, 138, 101, 47, 225, 36, 15, 33, 53, 147, 142, 218,
    240, 18, 130, 69, 29, 181, 194, 125, 106, 39, 249, 185, 201, 154, 9, 120, 77, 228, 114, 166, 6,
    191, 139, 98, 102, 221, 48, 253, 226, 152, 37, 179, 16, 145, 34, 136, 54, 208, 148, 206, 143,
    150, 219, 189, 241, 210, 19, 92, 131, 56, 70, 64, 30, 66, 182, 163, 195, 72, 126, 110, 107, 58,
    40, 84, 250, 133, 186, 61, 202, 94, 155, 159, 10, 21, 121, 43, 78, 212, 229, 172, 115, 243,
    167, 87, 7, 112, 192, 247, 140, 128, 99, 13, 103, 74, 222, 237, 49, 197, 254, 24, 227, 165,
    153, 119, 38, 184, 180, 124, 17, 68, 146, 217, 35, 32, 137, 46, 55, 63, 209, 91, 149, 188, 207,
    205, 144, 135, 151, 178, 220, 252, 190, 97, 242, 86, 211, 171, 20, 42, 93, 158, 132, 60, 57,
    83, 71, 109, 65, 162, 31, 45, 67, 216, 183, 123, 164, 118, 196, 23, 73, 236, 127, 12, 111, 246,
    108, 161, 59, 82, 41, 157, 85, 170, 251, 96, 134, 177, 187, 204, 62, 90, 203, 89, 95, 176, 156,
    169, 160, 81, 11, 245, 22, 235, 122, 117, 44, 215, 79, 174, 213, 233, 230, 231, 173, 232, 116,
    214, 244, 234, 168, 80, 88, 175,
];

static EXP_TABLE: [u8; 256] = [
    1, 2, 4, 8, 16, 32, 64, 128, 29, 58, 116, 232, 205, 135, 19, 38, 76, 152, 45, 90, 180, 117,
    234, 201, 143, 3, 6, 12, 24, 48, 96, 192, 157, 39, 78, 156, 37, 74, 148, 53, 106, 212, 181,
    119, 238, 193, 159, 35, 70, 140, 5, 10, 20, 40, 80, 160, 93, 186, 105, 210, 185, 111, 222, 161,
    95, 190, 97, 194, 153, 47, 94, 188, 101, 202, 137, 15, 30, 60, 120, 240, 253, 231, 211, 187,
    107, 214, 177, 127, 254, 225, 223, 163, 91, 182, 113, 226, 217, 175, 67, 134, 17, 34, 68, 136,
    13, 26, 52, 104, 208, 189, 103, 206, 129, 31, 62, 124, 248, 237, 199, 147, 59, 118, 236, 197,
    151, 51, 102, 204, 133, 23, 46, 92, 184, 109, 218, 169, 79, 158, 33, 66, 132, 21, 42, 84, 168,
    77, 154, 41, 82, 164, 85, 170, 73, 146, 57, 114, 228, 213, 183, 115, 230, 209, 191, 99, 198,
    145, 63, 126, 252, 229, 215, 179, 123, 246, 241, 255, 227, 219, 171, 75, 150, 49, 98, 196, 149,
    55, 110, 220, 165, 87, 174, 65, 130, 25, 50, 100, 200, 141, 7, 14, 28, 56, 112, 224, 221, 167,
    83, 166, 81, 162, 89, 178, 121, 242, 249, 239, 195, 155, 43, 86, 172, 69, 138, 9, 18, 36, 72,
    144, 61, 122, 244, 245, 247, 243, 251, 235, 203, 139, 11, 22, 44, 88, 176, 125, 250, 233, 207,
    131, 27, 54, 108, 216, 173, 71, 142, 1,
];

impl Gf256 {
    /// `a * b`
    pub fn mul(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        EXP_TABLE[(log_a + log_b) % 255]
    }

    /// `a / b`; division by zero yields zero
    pub fn div(a: u8, b: u8) -> u8 {
        debug_assert!(b != 0, "division by zero in GF(256)");
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        EXP_TABLE[(log_a + 255 - log_b) % 255]
    }

    /// `a^n`
    pub fn pow_usize(a: u8, n: usize) -> u8 {
        if a == 0 {
            return if n == 0 { 1 } else { 0 };
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let exp = (log_a * (n % 255)) % 255;
        EXP_TABLE[exp]
    }

    /// alpha^n
    pub fn exp(n: usize) -> u8 {
        EXP_TABLE[n % 255]
    }

    /// alpha^(-n)
    pub fn exp_neg(n: usize) -> u8 {
        EXP_TABLE[(255 - n % 255) % 255]
    }
}

/// Evaluate a polynomial stored lowest power first
fn eval_ascending(poly: &[u8], x: u8) -> u8 {
    poly.iter().rev().fold(0u8, |acc, &c| Gf256::mul(acc, x) ^ c)
}

/// Why a block could not be corrected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReedSolomonError {
    /// Block shorter than its EC codewords or longer than 255
    #[error("block length {len} is invalid for {ecc} EC codewords")]
    BlockLength {
        /// Codewords in the block
        len: usize,
        /// EC codewords expected
        ecc: usize,
    },
    /// More erasures than EC codewords
    #[error("{erasures} erasures exceed {ecc} EC codewords")]
    TooManyErasures {
        /// Erasure positions supplied
        erasures: usize,
        /// EC codewords available
        ecc: usize,
    },
    /// Too many errors for the remaining capacity
    #[error("error locator degree does not fit the EC capacity")]
    LocatorDegree,
    /// Locator roots do not match its degree
    #[error("error locator has {found} roots, expected {expected}")]
    RootCount {
        /// Roots found by the Chien search
        found: usize,
        /// Degree of the locator
        expected: usize,
    },
    /// Forney's formula cannot be evaluated
    #[error("error locator derivative vanishes at a root")]
    ZeroDerivative,
    /// Correction did not produce a codeword
    #[error("syndromes remain after correction")]
    Residual,
}

/// Reed-Solomon decoder for QR codes
///
/// Codewords are stored highest power first: position `p` of an `n` byte block
/// has locator alpha^(n-1-p). Errors and erasures are corrected together as
/// long as `2 * errors + erasures <= ecc`.
pub struct ReedSolomonDecoder {
    num_ecc_codewords: usize,
}

impl ReedSolomonDecoder {
    /// Decoder for blocks with `num_ecc_codewords` EC codewords
    pub fn new(num_ecc_codewords: usize) -> Self {
        Self { num_ecc_codewords }
    }

    /// Correct `received` in place and return the number of bytes changed
    pub fn decode(&self, received: &mut [u8]) -> Result<usize, ReedSolomonError> {
        self.decode_with_erasures(received, &[])
    }

    /// Correct `received` in place, treating the given positions as erasures
    pub fn decode_with_erasures(
        &self,
        received: &mut [u8],
        erasures: &[usize],
    ) -> Result<usize, ReedSolomonError> {
        let n = received.len();
        let ecc = self.num_ecc_codewords;
        if n > 255 || n <= ecc {
            return Err(ReedSolomonError::BlockLength { len: n, ecc });
        }

        let syndrome = self.calculate_syndrome(received);
        if syndrome.iter().all(|&s| s == 0) {
            return Ok(0);
        }

        let mut erasures: Vec<usize> = erasures.iter().copied().filter(|&p| p < n).collect();
        erasures.sort_unstable();
        erasures.dedup();
        if erasures.len() > ecc {
            return Err(ReedSolomonError::TooManyErasures {
                erasures: erasures.len(),
                ecc,
            });
        }

        let sigma = self.find_errata_locator(&syndrome, &erasures, n)?;
        let positions = self.find_error_positions(&sigma, n)?;
        let values = self.find_error_values(&sigma, &syndrome, &positions, n)?;

        let mut changed = 0;
        for (&pos, &value) in positions.iter().zip(&values) {
            if value != 0 {
                received[pos] ^= value;
                changed += 1;
            }
        }

        if self.calculate_syndrome(received).iter().any(|&s| s != 0) {
            return Err(ReedSolomonError::Residual);
        }
        Ok(changed)
    }

    /// S_i = r(alpha^i) for i in 0..ecc
    fn calculate_syndrome(&self, received: &[u8]) -> Vec<u8> {
        (0..self.num_ecc_codewords)
            .map(|i| {
                let x = Gf256::exp(i);
                received
                    .iter()
                    .fold(0u8, |acc, &c| Gf256::mul(acc, x) ^ c)
            })
            .collect()
    }

    /// Berlekamp-Massey seeded with the erasure locator; result is lowest power first
    fn find_errata_locator(
        &self,
        syndrome: &[u8],
        erasures: &[usize],
        n: usize,
    ) -> Result<Vec<u8>, ReedSolomonError> {
        let ecc = syndrome.len();
        let nu = erasures.len();

        // Gamma(x) = prod (1 + X_j x)
        let mut gamma = vec![1u8];
        for &pos in erasures {
            let x_j = Gf256::exp(n - 1 - pos);
            let mut next = vec![0u8; gamma.len() + 1];
            for (k, &c) in gamma.iter().enumerate() {
                next[k] ^= c;
                next[k + 1] ^= Gf256::mul(c, x_j);
            }
            gamma = next;
        }

        let mut sigma = gamma.clone();
        let mut b = gamma;
        let mut l = nu;

        for r in nu..ecc {
            let delta = sigma
                .iter()
                .enumerate()
                .take(r + 1)
                .fold(0u8, |acc, (j, &c)| acc ^ Gf256::mul(c, syndrome[r - j]));

            // x * B(x)
            b.insert(0, 0);
            if delta == 0 {
                continue;
            }

            let mut next = sigma.clone();
            if next.len() < b.len() {
                next.resize(b.len(), 0);
            }
            for (k, &c) in b.iter().enumerate() {
                next[k] ^= Gf256::mul(delta, c);
            }

            if 2 * l <= r + nu {
                // B = sigma / delta, undoing the shift applied above
                b = sigma.iter().map(|&c| Gf256::div(c, delta)).collect();
                l = r + 1 + nu - l;
            }
            sigma = next;
        }

        while sigma.len() > 1 && sigma.last() == Some(&0) {
            sigma.pop();
        }
        let degree = sigma.len() - 1;
        if degree != l || l < nu || 2 * (l - nu) + nu > ecc {
            return Err(ReedSolomonError::LocatorDegree);
        }
        Ok(sigma)
    }

    /// Chien search: position p is in error when sigma(alpha^-(n-1-p)) = 0
    fn find_error_positions(&self, sigma: &[u8], n: usize) -> Result<Vec<usize>, ReedSolomonError> {
        let positions: Vec<usize> = (0..n)
            .filter(|&pos| eval_ascending(sigma, Gf256::exp_neg(n - 1 - pos)) == 0)
            .collect();

        let expected = sigma.len() - 1;
        if positions.len() != expected {
            return Err(ReedSolomonError::RootCount {
                found: positions.len(),
                expected,
            });
        }
        Ok(positions)
    }

    /// Forney: e_k = X_k * omega(X_k^-1) / sigma'(X_k^-1)
    fn find_error_values(
        &self,
        sigma: &[u8],
        syndrome: &[u8],
        error_positions: &[usize],
        n: usize,
    ) -> Result<Vec<u8>, ReedSolomonError> {
        // omega = syndrome * sigma mod x^ecc
        let mut omega = vec![0u8; syndrome.len()];
        for (i, slot) in omega.iter_mut().enumerate() {
            for (j, &c) in sigma.iter().enumerate().take(i + 1) {
                *slot ^= Gf256::mul(c, syndrome[i - j]);
            }
        }

        // formal derivative: odd powers shift down by one
        let derivative: Vec<u8> = sigma
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &c)| if i % 2 == 1 { c } else { 0 })
            .collect();

        error_positions
            .iter()
            .map(|&pos| {
                let power = n - 1 - pos;
                let x_inv = Gf256::exp_neg(power);
                let denominator = eval_ascending(&derivative, x_inv);
                if denominator == 0 {
                    return Err(ReedSolomonError::ZeroDerivative);
                }
                let numerator = eval_ascending(&omega, x_inv);
                Ok(Gf256::mul(Gf256::exp(power), Gf256::div(numerator, denominator)))
            })
            .collect()
    }
}

/// Systematic Reed-Solomon encoder producing QR EC codewords
pub struct ReedSolomonEncoder {
    /// Generator coefficients below the leading 1, highest power first
    divisor: Vec<u8>,
}

impl ReedSolomonEncoder {
    /// Encoder with the generator of degree `num_ecc_codewords`
    pub fn new(num_ecc_codewords: usize) -> Self {
        let degree = num_ecc_codewords;
        let mut divisor = vec![0u8; degree];
        if let Some(last) = divisor.last_mut() {
            *last = 1;
        }

        // multiply by (x - alpha^i) for i in 0..degree
        let mut root = 1u8;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = Gf256::mul(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = Gf256::mul(root, 2);
        }
        Self { divisor }
    }

    /// EC codewords for a data block
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        let mut remainder = vec![0u8; self.divisor.len()];
        for &byte in data {
            let factor = byte ^ remainder.first().copied().unwrap_or(0);
            if remainder.is_empty() {
                continue;
            }
            remainder.remove(0);
            remainder.push(0);
            for (r, &d) in remainder.iter_mut().zip(&self.divisor) {
                *r ^= Gf256::mul(d, factor);
            }
        }
        remainder
    }
}
