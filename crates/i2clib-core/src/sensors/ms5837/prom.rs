//! MS5837 calibration PROM and its CRC4.

use serde::Serialize;

/// Number of 16-bit PROM words holding calibration data
pub const PROM_WORDS: usize = 7;

/// Factory calibration words `C0`..`C6`
///
/// `C0` carries the CRC4 in its top nibble and the product type in the
/// rest; `C1`..`C6` are the compensation coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prom {
    pub c: [u16; PROM_WORDS],
}

impl Prom {
    /// CRC4 computed over the words, with the embedded checksum masked out
    pub fn crc4(&self) -> u8 {
        let mut words = [0u16; PROM_WORDS + 1];
        words[..PROM_WORDS].copy_from_slice(&self.c);
        words[0] &= 0x0FFF;

        let mut remainder: u16 = 0;
        for byte in words.iter().flat_map(|word| word.to_be_bytes()) {
            remainder ^= u16::from(byte);
            for _ in 0..8 {
                remainder = if remainder & 0x8000 != 0 {
                    (remainder << 1) ^ 0x3000
                } else {
                    remainder << 1
                };
            }
        }
        ((remainder >> 12) & 0x000F) as u8
    }

    /// CRC4 stored by the factory in the top nibble of `C0`
    pub fn embedded_crc(&self) -> u8 {
        (self.c[0] >> 12) as u8
    }

    /// Check the embedded CRC, returning `(computed, embedded)` on mismatch
    pub fn validate(&self) -> Result<(), (u8, u8)> {
        let computed = self.crc4();
        let embedded = self.embedded_crc();
        if computed == embedded {
            Ok(())
        } else {
            Err((computed, embedded))
        }
    }
}

/// PROM of the datasheet's compensation example, with a valid CRC
#[cfg(test)]
pub(crate) const DATASHEET_PROM: Prom = Prom {
    c: [0x2A5B, 34982, 36352, 20328, 22354, 26646, 26146],
};
