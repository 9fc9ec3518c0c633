//! Pressure/temperature sensor drivers.
//!
//! Each driver splits a reading into the same three steps: raw acquisition
//! over the bus, calibration constants read once per handle, and a pure
//! compensation function turning both into physical units.

pub mod bmp280;
pub mod ms5837;

use serde::Serialize;

use crate::units::{Pressure, Temperature, Timestamp};

/// Raw ADC values, as read from the chip before compensation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawMeasurement {
    /// Raw pressure ADC value
    pub pressure: u32,
    /// Raw temperature ADC value
    pub temperature: u32,
}

/// Compensated measurement
///
/// Produced fresh on every read. `None` means the value is unknown: the
/// channel is disabled on the chip, or the compensation formula hit its
/// degenerate case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// When the raw data was acquired
    pub time: Timestamp,
    /// Compensated temperature
    pub temperature: Option<Temperature>,
    /// Compensated pressure
    pub pressure: Option<Pressure>,
}

impl Measurement {
    /// A measurement with neither temperature nor pressure
    pub const fn empty(time: Timestamp) -> Self {
        Self {
            time,
            temperature: None,
            pressure: None,
        }
    }
}

/// Trait for sensors producing compensated measurements.
pub trait Sensor {
    /// Error returned when a reading fails
    type Error;

    /// Read the sensor and return a compensated measurement.
    fn read(&mut self) -> Result<Measurement, Self::Error>;
}

impl<S: Sensor + ?Sized> Sensor for &mut S {
    type Error = S::Error;

    fn read(&mut self) -> Result<Measurement, Self::Error> {
        S::read(self)
    }
}
