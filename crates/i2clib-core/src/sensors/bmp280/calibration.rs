//! BMP280 factory calibration constants.
//!
//! The chip stores 12 trimming words at 0x88..0x9F, little-endian: three
//! temperature words (`dig_T1` unsigned, `dig_T2`/`dig_T3` signed) followed
//! by nine pressure words (`dig_P1` unsigned, `dig_P2`..`dig_P9` signed).

use serde::Serialize;

/// Size of the calibration block in bytes
pub const CALIBRATION_LEN: usize = 24;

/// Temperature compensation words `dig_T1`..`dig_T3`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TemperatureCalibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
}

/// Pressure compensation words `dig_P1`..`dig_P9`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PressureCalibration {
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
}

/// Complete calibration block of one BMP280
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Calibration {
    pub temperature: TemperatureCalibration,
    pub pressure: PressureCalibration,
}

impl Calibration {
    /// Parse the raw 24-byte block read from 0x88
    ///
    /// No validation is possible: the BMP280 has no checksum over its
    /// trimming data.
    pub fn from_bytes(bytes: &[u8; CALIBRATION_LEN]) -> Self {
        let unsigned = |i: usize| u16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        let signed = |i: usize| i16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]);

        Self {
            temperature: TemperatureCalibration {
                t1: unsigned(0),
                t2: signed(1),
                t3: signed(2),
            },
            pressure: PressureCalibration {
                p1: unsigned(3),
                p2: signed(4),
                p3: signed(5),
                p4: signed(6),
                p5: signed(7),
                p6: signed(8),
                p7: signed(9),
                p8: signed(10),
                p9: signed(11),
            },
        }
    }
}

/// Calibration block of the datasheet's compensation example, as it sits
/// in the chip's registers
#[cfg(test)]
pub(crate) const DATASHEET_BLOCK: [u8; CALIBRATION_LEN] = [
    0x70, 0x6B, // T1 = 27504
    0x43, 0x67, // T2 = 26435
    0x18, 0xFC, // T3 = -1000
    0x7D, 0x8E, // P1 = 36477
    0x43, 0xD6, // P2 = -10685
    0xD0, 0x0B, // P3 = 3024
    0x27, 0x0B, // P4 = 2855
    0x8C, 0x00, // P5 = 140
    0xF9, 0xFF, // P6 = -7
    0x8C, 0x3C, // P7 = 15500
    0xF8, 0xC6, // P8 = -14600
    0x70, 0x17, // P9 = 6000
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datasheet_block() {
        let c = Calibration::from_bytes(&DATASHEET_BLOCK);

        assert_eq!(c.temperature.t1, 27504);
        assert_eq!(c.temperature.t2, 26435);
        assert_eq!(c.temperature.t3, -1000);
        assert_eq!(c.pressure.p1, 36477);
        assert_eq!(c.pressure.p2, -10685);
        assert_eq!(c.pressure.p3, 3024);
        assert_eq!(c.pressure.p4, 2855);
        assert_eq!(c.pressure.p5, 140);
        assert_eq!(c.pressure.p6, -7);
        assert_eq!(c.pressure.p7, 15500);
        assert_eq!(c.pressure.p8, -14600);
        assert_eq!(c.pressure.p9, 6000);
    }

    #[test]
    fn test_unsigned_words_keep_high_bit() {
        let mut block = [0u8; CALIBRATION_LEN];
        block[0] = 0xFF;
        block[1] = 0xFF;
        block[6] = 0x00;
        block[7] = 0x80;

        let c = Calibration::from_bytes(&block);
        assert_eq!(c.temperature.t1, 0xFFFF);
        assert_eq!(c.pressure.p1, 0x8000);
    }
}
