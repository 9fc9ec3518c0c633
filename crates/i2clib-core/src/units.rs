//! Unit-carrying value types
//!
//! Drivers never hand back bare floats: a temperature is a [`Temperature`],
//! a pressure is a [`Pressure`], and the caller picks the unit when reading
//! the value out.

use core::time::Duration;

use serde::Serialize;

/// Offset between the Celsius and Kelvin scales
const KELVIN_OFFSET: f64 = 273.15;

/// Pascals in one bar
const PASCAL_PER_BAR: f64 = 100_000.0;

/// A temperature
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Temperature {
    celsius: f64,
}

impl Temperature {
    /// Create a temperature from degrees Celsius
    pub const fn from_celsius(celsius: f64) -> Self {
        Self { celsius }
    }

    /// Create a temperature from Kelvin
    pub fn from_kelvin(kelvin: f64) -> Self {
        Self {
            celsius: kelvin - KELVIN_OFFSET,
        }
    }

    /// Temperature in degrees Celsius
    pub const fn celsius(self) -> f64 {
        self.celsius
    }

    /// Temperature in Kelvin
    pub fn kelvin(self) -> f64 {
        self.celsius + KELVIN_OFFSET
    }
}

/// A pressure
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Pressure {
    pascal: f64,
}

impl Pressure {
    /// Create a pressure from Pascals
    pub const fn from_pascal(pascal: f64) -> Self {
        Self { pascal }
    }

    /// Create a pressure from bars
    pub fn from_bar(bar: f64) -> Self {
        Self {
            pascal: bar * PASCAL_PER_BAR,
        }
    }

    /// Pressure in Pascals
    pub const fn pascal(self) -> f64 {
        self.pascal
    }

    /// Pressure in hectopascals (millibars)
    pub fn hectopascal(self) -> f64 {
        self.pascal / 100.0
    }

    /// Pressure in bars
    pub fn bar(self) -> f64 {
        self.pascal / PASCAL_PER_BAR
    }
}

/// Wall-clock time of a measurement, in microseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp {
    micros: u64,
}

impl Timestamp {
    /// Create a timestamp from microseconds since the Unix epoch
    pub const fn from_micros(micros: u64) -> Self {
        Self { micros }
    }

    /// Create a timestamp from the time elapsed since the Unix epoch
    ///
    /// Saturates at `u64::MAX` microseconds.
    pub fn from_duration(since_epoch: Duration) -> Self {
        let micros = u64::try_from(since_epoch.as_micros()).unwrap_or(u64::MAX);
        Self { micros }
    }

    /// Microseconds since the Unix epoch
    pub const fn as_micros(self) -> u64 {
        self.micros
    }
}

/// Source of measurement timestamps
///
/// Implemented for any `Fn() -> Timestamp`, so a closure is enough for
/// tests and for platforms that have their own time keeping.
pub trait Clock {
    /// Current time
    fn now(&self) -> Timestamp;
}

impl<F> Clock for F
where
    F: Fn() -> Timestamp,
{
    fn now(&self) -> Timestamp {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressure_unit_conversions() {
        let p = Pressure::from_bar(1.01325);
        assert!((p.pascal() - 101_325.0).abs() < 1e-6);
        assert!((p.hectopascal() - 1013.25).abs() < 1e-9);
        assert!((Pressure::from_pascal(250_000.0).bar() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_temperature_unit_conversions() {
        let t = Temperature::from_celsius(25.0);
        assert!((t.kelvin() - 298.15).abs() < 1e-9);
        assert!((Temperature::from_kelvin(273.15).celsius()).abs() < 1e-9);
    }

    #[test]
    fn test_timestamp_from_duration() {
        let ts = Timestamp::from_duration(Duration::from_millis(1_500));
        assert_eq!(ts.as_micros(), 1_500_000);
    }

    #[test]
    fn test_closure_is_a_clock() {
        let clock = || Timestamp::from_micros(42);
        assert_eq!(clock.now(), Timestamp::from_micros(42));
    }
}
