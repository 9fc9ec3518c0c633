//! MS5837-30BA first-order compensation (datasheet, "Pressure and
//! temperature calculation").
//!
//! All intermediate values are 64-bit: `D1 * SENS` alone overflows 32 bits.

use super::prom::Prom;
use crate::units::{Pressure, Temperature};

/// Difference between actual and reference temperature (`dT`), carried
/// from temperature compensation into pressure compensation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureDelta(pub i64);

/// Pressure resolution of the 30BA: 0.1 mbar per count
const COUNTS_PER_BAR: f64 = 10_000.0;

/// Compensate a raw 24-bit temperature (`D2`)
pub fn compensate_temperature(d2: u32, prom: &Prom) -> (Temperature, TemperatureDelta) {
    let dt = i64::from(d2) - (i64::from(prom.c[5]) << 8);
    let centi_celsius = 2000 + ((dt * i64::from(prom.c[6])) >> 23);
    (
        Temperature::from_celsius(centi_celsius as f64 / 100.0),
        TemperatureDelta(dt),
    )
}

/// Compensate a raw 24-bit pressure (`D1`)
pub fn compensate_pressure(d1: u32, dt: TemperatureDelta, prom: &Prom) -> Pressure {
    let dt = dt.0;
    let offset = (i64::from(prom.c[2]) << 16) + ((i64::from(prom.c[4]) * dt) >> 7);
    let sens = (i64::from(prom.c[1]) << 15) + ((i64::from(prom.c[3]) * dt) >> 8);
    let counts = (((i64::from(d1) * sens) >> 21) - offset) >> 13;
    Pressure::from_bar(counts as f64 / COUNTS_PER_BAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::ms5837::prom::DATASHEET_PROM;

    #[test]
    fn test_datasheet_example() {
        let (temperature, dt) = compensate_temperature(6815414, &DATASHEET_PROM);
        assert_eq!(dt, TemperatureDelta(-5962));
        assert!((temperature.celsius() - 19.81).abs() <= 0.02);

        let pressure = compensate_pressure(4958179, dt, &DATASHEET_PROM);
        assert!((pressure.bar() - 3.9998).abs() <= 0.0005);
    }

    #[test]
    fn test_full_scale_inputs_do_not_overflow() {
        let prom = Prom {
            c: [0, u16::MAX, u16::MAX, u16::MAX, u16::MAX, 0, u16::MAX],
        };
        let (temperature, dt) = compensate_temperature(0x00FF_FFFF, &prom);
        assert_eq!(dt, TemperatureDelta(0x00FF_FFFF));
        assert!(temperature.celsius() > 20.0);

        let pressure = compensate_pressure(0x00FF_FFFF, dt, &prom);
        assert!(pressure.pascal().is_finite());
    }
}
