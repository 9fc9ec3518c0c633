//! PWM period and prescale conversions.
//!
//! The PCA9685 divides its oscillator by `4096 * (prescale + 1)`. All
//! conversions here are done on integers scaled by the oscillator frequency,
//! so that the boundaries are exact for any clock.

use serde::Serialize;

use crate::error::{Error, Result};

/// Smallest prescale the chip accepts
pub const MIN_PRESCALE: u8 = 3;

/// Prescale loaded at power-on (about 200 Hz with the internal oscillator)
pub const DEFAULT_PRESCALE: u8 = 0x1E;

/// Counter steps in one PWM cycle
pub const STEPS_PER_CYCLE: u32 = 4096;

const NS_PER_SECOND: u128 = 1_000_000_000;

/// Nanoseconds times Hz in one full cycle at prescale 0
const CYCLE_UNIT: u128 = STEPS_PER_CYCLE as u128 * NS_PER_SECOND;

/// Clock feeding the PWM counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Oscillator {
    frequency_hz: u32,
}

impl Oscillator {
    /// Internal 25 MHz oscillator
    pub const INTERNAL: Self = Self {
        frequency_hz: 25_000_000,
    };

    /// External clock on the EXTCLK pin. Returns `None` for 0 Hz.
    pub const fn external(frequency_hz: u32) -> Option<Self> {
        if frequency_hz == 0 {
            None
        } else {
            Some(Self { frequency_hz })
        }
    }

    pub const fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Oscillator period in nanoseconds
    pub fn period_ns(&self) -> f64 {
        1e9 / f64::from(self.frequency_hz)
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::INTERNAL
    }
}

/// Rounded `numerator / denominator`
fn div_round(numerator: u128, denominator: u128) -> u128 {
    (numerator + denominator / 2) / denominator
}

/// Prescale giving the PWM period closest to `period_ns`
///
/// Periods shorter than prescale 3 or longer than prescale 255 allow are
/// rejected.
pub fn period_to_prescale<E>(period_ns: u32, oscillator: Oscillator) -> Result<u8, E> {
    let scaled = u128::from(period_ns) * u128::from(oscillator.frequency_hz);

    if scaled < (u128::from(MIN_PRESCALE) + 1) * CYCLE_UNIT {
        return Err(Error::PeriodTooShort { period_ns });
    }
    if scaled > 256 * CYCLE_UNIT {
        return Err(Error::PeriodTooLong { period_ns });
    }

    u8::try_from(div_round(scaled, CYCLE_UNIT) - 1).map_err(|_| Error::PeriodTooLong { period_ns })
}

/// PWM period produced by `prescale`, in nanoseconds
///
/// Saturates at `u32::MAX` for very slow external clocks.
pub fn prescale_to_period(prescale: u8, oscillator: Oscillator) -> u32 {
    let scaled = (u128::from(prescale) + 1) * CYCLE_UNIT;
    let period = div_round(scaled, u128::from(oscillator.frequency_hz));
    u32::try_from(period).unwrap_or(u32::MAX)
}

/// Number of counter steps closest to `duration_ns` at `prescale`
pub(crate) fn duration_to_steps(duration_ns: u32, prescale: u8, oscillator: Oscillator) -> i64 {
    let scaled = u128::from(duration_ns) * u128::from(oscillator.frequency_hz);
    let step = (u128::from(prescale) + 1) * NS_PER_SECOND;
    i64::try_from(div_round(scaled, step)).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;

    fn prescale(period_ns: u32) -> Result<u8, ErrorKind> {
        period_to_prescale(period_ns, Oscillator::INTERNAL)
    }

    #[test]
    fn test_period_to_prescale_boundaries() {
        assert_eq!(prescale(5_000_000), Ok(30));
        assert_eq!(prescale(655_360), Ok(3));
        assert_eq!(prescale(41_666_666), Ok(253));
        assert_eq!(prescale(41_943_040), Ok(255));
    }

    #[test]
    fn test_period_out_of_range() {
        assert_eq!(
            prescale(655_359),
            Err(Error::PeriodTooShort { period_ns: 655_359 })
        );
        assert_eq!(
            prescale(41_943_041),
            Err(Error::PeriodTooLong {
                period_ns: 41_943_041
            })
        );
        assert_eq!(prescale(0), Err(Error::PeriodTooShort { period_ns: 0 }));
        assert!(prescale(u32::MAX).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_prescale_to_period() {
        assert_eq!(prescale_to_period(3, Oscillator::INTERNAL), 655_360);
        assert_eq!(prescale_to_period(255, Oscillator::INTERNAL), 41_943_040);
        assert_eq!(
            prescale_to_period(DEFAULT_PRESCALE, Oscillator::INTERNAL),
            5_079_040
        );
    }

    #[test]
    fn test_external_clock_scales_periods() {
        let clock = Oscillator::external(50_000_000).unwrap();
        assert_eq!(prescale_to_period(3, clock), 327_680);
        assert_eq!(period_to_prescale::<ErrorKind>(327_680, clock), Ok(3));
        assert_eq!(Oscillator::external(0), None);
        assert!((Oscillator::INTERNAL.period_ns() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_to_steps() {
        // One step is 40ns * 31 = 1240ns at the default prescale
        assert_eq!(duration_to_steps(1_240, 30, Oscillator::INTERNAL), 1);
        assert_eq!(duration_to_steps(1_500_000, 30, Oscillator::INTERNAL), 1210);
        assert_eq!(duration_to_steps(0, 30, Oscillator::INTERNAL), 0);
    }
}
