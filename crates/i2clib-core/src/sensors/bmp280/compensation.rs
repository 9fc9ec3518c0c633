//! BMP280 compensation formulas (Bosch BST-BMP280-DS001, section 3.11.3).
//!
//! The driver uses the 32-bit fixed-point pipeline: it is the datasheet's
//! reference and it is deterministic on any target. The double-precision
//! pipeline is kept in [`float`] for cross-checking and for callers that
//! prefer it.
//!
//! Intermediate values are computed in 64 bits and narrowed back to 32 bits
//! wherever the datasheet stores them in 32-bit variables. A value that does
//! not fit there cannot come from a working sensor, and the reading is
//! reported as unknown instead of overflowing.

use log::warn;

use super::calibration::{PressureCalibration, TemperatureCalibration};
use crate::units::{Pressure, Temperature};

/// Fine temperature (`t_fine` in the datasheet), carried from temperature
/// compensation into pressure compensation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FineTemperature(pub i32);

/// Compensate a raw 20-bit temperature
///
/// Resolution is 0.01 degC. Returns `None` if the intermediate values do not
/// fit the datasheet's 32-bit range.
pub fn compensate_temperature(
    adc_t: u32,
    c: &TemperatureCalibration,
) -> Option<(Temperature, FineTemperature)> {
    let adc_t = i64::from(adc_t);
    let t1 = i64::from(c.t1);

    let var1 = (((adc_t >> 3) - (t1 << 1)) * i64::from(c.t2)) >> 11;
    let delta = (adc_t >> 4) - t1;
    let var2 = (((delta * delta) >> 12) * i64::from(c.t3)) >> 14;

    let Ok(t_fine) = i32::try_from(var1 + var2) else {
        warn!("BMP280: fine temperature out of range for raw value {adc_t:#x}");
        return None;
    };

    let centi_celsius = (i64::from(t_fine) * 5 + 128) >> 8;
    let temperature = Temperature::from_celsius(centi_celsius as f64 / 100.0);
    Some((temperature, FineTemperature(t_fine)))
}

/// Compensate a raw 20-bit pressure
///
/// Resolution is 1 Pa. Returns `None` when the datasheet's divisor is zero
/// (or negative), or when the result does not fit its 32-bit range.
pub fn compensate_pressure(
    adc_p: u32,
    t_fine: FineTemperature,
    c: &PressureCalibration,
) -> Option<Pressure> {
    let t_fine = i64::from(t_fine.0);

    let mut var1 = (t_fine >> 1) - 64_000;
    let mut var2 = (((var1 >> 2) * (var1 >> 2)) >> 11) * i64::from(c.p6);
    var2 += (var1 * i64::from(c.p5)) << 1;
    var2 = (var2 >> 2) + (i64::from(c.p4) << 16);
    var1 = (((i64::from(c.p3) * (((var1 >> 2) * (var1 >> 2)) >> 13)) >> 3)
        + ((i64::from(c.p2) * var1) >> 1))
        >> 18;
    var1 = ((32_768 + var1) * i64::from(c.p1)) >> 15;

    let (Ok(var1), Ok(var2), Ok(adc_p)) = (
        i32::try_from(var1),
        i32::try_from(var2),
        i32::try_from(adc_p),
    ) else {
        warn!("BMP280: pressure intermediates out of range");
        return None;
    };

    if var1 == 0 {
        warn!("BMP280: pressure divisor is zero, pressure unknown");
        return None;
    }
    let Ok(divisor) = u32::try_from(var1) else {
        warn!("BMP280: negative pressure divisor {var1}, pressure unknown");
        return None;
    };

    // Unsigned steps wrap modulo 2^32, exactly as the reference's uint32 math
    let mut p = (1_048_576i32.wrapping_sub(adc_p) as u32)
        .wrapping_sub((var2 >> 12) as u32)
        .wrapping_mul(3125);
    p = if p < 0x8000_0000 {
        (p << 1) / divisor
    } else {
        (p / divisor).wrapping_mul(2)
    };

    let var1 = (i64::from(c.p9) * i64::from(((p >> 3).wrapping_mul(p >> 3)) >> 13)) >> 12;
    let var2 = (i64::from(p >> 2) * i64::from(c.p8)) >> 13;
    let pascal = i64::from(p as i32) + ((var1 + var2 + i64::from(c.p7)) >> 4);

    match u32::try_from(pascal) {
        Ok(pascal) => Some(Pressure::from_pascal(f64::from(pascal))),
        Err(_) => {
            warn!("BMP280: compensated pressure {pascal} out of range");
            None
        }
    }
}

/// Double-precision compensation pipeline
///
/// Calibration words are used as plain numbers. The pressure step takes the
/// compensated temperature and derives its own fine temperature from it.
pub mod float {
    use super::{PressureCalibration, TemperatureCalibration};
    use crate::units::{Pressure, Temperature};

    /// Fine temperature units per degree Celsius
    const FINE_PER_CELSIUS: f64 = 5120.0;

    /// Compensate a raw 20-bit temperature
    pub fn compensate_temperature(adc_t: u32, c: &TemperatureCalibration) -> Temperature {
        let adc_t = f64::from(adc_t);
        let t1 = f64::from(c.t1);

        let var1 = (adc_t / 16384.0 - t1 / 1024.0) * f64::from(c.t2);
        let delta = adc_t / 131072.0 - t1 / 8192.0;
        let var2 = delta * delta * f64::from(c.t3);

        Temperature::from_celsius((var1 + var2) / FINE_PER_CELSIUS)
    }

    /// Compensate a raw 20-bit pressure
    ///
    /// Returns `None` when the divisor is zero or the result is not finite.
    pub fn compensate_pressure(
        adc_p: u32,
        temperature: Temperature,
        c: &PressureCalibration,
    ) -> Option<Pressure> {
        let t_fine = temperature.celsius() * FINE_PER_CELSIUS;

        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * f64::from(c.p6) / 32768.0;
        var2 += var1 * f64::from(c.p5) * 2.0;
        var2 = var2 / 4.0 + f64::from(c.p4) * 65536.0;
        var1 = (f64::from(c.p3) * var1 * var1 / 524288.0 + f64::from(c.p2) * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * f64::from(c.p1);
        if var1 == 0.0 {
            return None;
        }

        let mut p = 1048576.0 - f64::from(adc_p);
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        let var1 = f64::from(c.p9) * p * p / 2147483648.0;
        let var2 = p * f64::from(c.p8) / 32768.0;
        p += (var1 + var2 + f64::from(c.p7)) / 16.0;

        p.is_finite().then(|| Pressure::from_pascal(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::bmp280::calibration::{Calibration, DATASHEET_BLOCK};

    const RAW_TEMPERATURE: u32 = 519888;
    const RAW_PRESSURE: u32 = 415148;

    fn datasheet_calibration() -> Calibration {
        Calibration::from_bytes(&DATASHEET_BLOCK)
    }

    #[test]
    fn test_integer_pipeline_matches_datasheet_example() {
        let c = datasheet_calibration();

        let (temperature, t_fine) =
            compensate_temperature(RAW_TEMPERATURE, &c.temperature).unwrap();
        assert_eq!(t_fine, FineTemperature(128422));
        assert!((temperature.celsius() - 25.08).abs() <= 0.02);

        let pressure = compensate_pressure(RAW_PRESSURE, t_fine, &c.pressure).unwrap();
        assert!((pressure.pascal() - 100653.0).abs() <= 10.0);
    }

    #[test]
    fn test_float_pipeline_matches_datasheet_example() {
        let c = datasheet_calibration();

        let temperature = float::compensate_temperature(RAW_TEMPERATURE, &c.temperature);
        assert!((temperature.celsius() - 25.08).abs() <= 0.02);

        let pressure = float::compensate_pressure(RAW_PRESSURE, temperature, &c.pressure).unwrap();
        assert!((pressure.pascal() - 100653.0).abs() <= 10.0);
    }

    #[test]
    fn test_pipelines_agree_within_integer_resolution() {
        let c = datasheet_calibration();

        for adc_t in (450_000..=600_000).step_by(15_000) {
            let (t_int, t_fine) = compensate_temperature(adc_t, &c.temperature).unwrap();
            let t_float = float::compensate_temperature(adc_t, &c.temperature);
            assert!(
                (t_int.celsius() - t_float.celsius()).abs() <= 0.01,
                "temperature mismatch at {adc_t}"
            );

            for adc_p in (250_000..=500_000).step_by(25_000) {
                let p_int = compensate_pressure(adc_p, t_fine, &c.pressure).unwrap();
                let p_float = float::compensate_pressure(adc_p, t_float, &c.pressure).unwrap();
                assert!(
                    (p_int.pascal() - p_float.pascal()).abs() <= 10.0,
                    "pressure mismatch at {adc_t}/{adc_p}"
                );
            }
        }
    }

    #[test]
    fn test_zero_divisor_yields_unknown_pressure() {
        let mut c = datasheet_calibration();
        c.pressure.p1 = 0;

        let (_, t_fine) = compensate_temperature(RAW_TEMPERATURE, &c.temperature).unwrap();
        assert_eq!(compensate_pressure(RAW_PRESSURE, t_fine, &c.pressure), None);

        let temperature = float::compensate_temperature(RAW_TEMPERATURE, &c.temperature);
        assert_eq!(
            float::compensate_pressure(RAW_PRESSURE, temperature, &c.pressure),
            None
        );
    }

    #[test]
    fn test_out_of_range_raw_value_yields_unknown() {
        let c = datasheet_calibration();
        let (_, t_fine) = compensate_temperature(RAW_TEMPERATURE, &c.temperature).unwrap();

        assert_eq!(compensate_pressure(u32::MAX, t_fine, &c.pressure), None);
    }
}
