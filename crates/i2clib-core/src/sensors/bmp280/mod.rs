//! Bosch BMP280 pressure and temperature sensor
//!
//! Calibration is read once when the handle is created. Every compensated
//! read is a single 6-byte burst from the data registers followed by the
//! integer compensation pipeline.

pub mod calibration;
pub mod compensation;
pub mod config;

use embedded_hal::i2c::I2c;
use log::{debug, warn};

use self::calibration::{CALIBRATION_LEN, Calibration};
use self::compensation::{compensate_pressure, compensate_temperature};
use self::config::{Configuration, Mode};
use super::{Measurement, RawMeasurement, Sensor};
use crate::error::Result;
use crate::register::{read_registers, write_registers};
use crate::units::Clock;

/// Default I2C address (SDO pulled low)
pub const DEFAULT_ADDRESS: u8 = 0x76;

/// Chip identification register and its expected content
pub const REG_ID: u8 = 0xD0;
pub const CHIP_ID: u8 = 0x58;

/// Soft reset register and the value triggering a reset
pub const REG_RESET: u8 = 0xE0;
pub const RESET_VALUE: u8 = 0xB6;

pub const REG_STATUS: u8 = 0xF3;
pub const REG_CTRL_MEAS: u8 = 0xF4;
pub const REG_CONFIG: u8 = 0xF5;

/// First data register: press_msb, press_lsb, press_xlsb, then temp_*
pub const REG_PRESS: u8 = 0xF7;

/// First calibration register (dig_T1 LSB)
pub const REG_CALIB: u8 = 0x88;

/// Raw value reported for a channel whose oversampling is `Skipped`
pub const SKIPPED_READING: u32 = 0x80000;

const STATUS_MEASURING: u8 = 1 << 3;
const STATUS_IM_UPDATE: u8 = 1 << 0;

/// Content of the STATUS register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// A conversion is running
    pub measuring: bool,
    /// Calibration data is being copied from NVM to the image registers
    pub im_update: bool,
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Self {
            measuring: value & STATUS_MEASURING != 0,
            im_update: value & STATUS_IM_UPDATE != 0,
        }
    }
}

/// Decode one 20-bit ADC value from its msb, lsb and xlsb registers
///
/// Only the upper nibble of xlsb carries data: xlsb is shifted right by
/// four, not added as a whole byte. A nonzero low nibble never changes the
/// decoded value.
fn decode_adc(bytes: [u8; 3]) -> u32 {
    (u32::from(bytes[0]) << 12) | (u32::from(bytes[1]) << 4) | (u32::from(bytes[2]) >> 4)
}

/// BMP280 driver
///
/// The configuration held here is re-applied on every [`Bmp280::write_mode`].
pub struct Bmp280<I, C> {
    i2c: I,
    clock: C,
    address: u8,
    calibration: Calibration,
    configuration: Configuration,
}

impl<I: I2c, C: Clock> Bmp280<I, C> {
    /// Create a driver and read the chip's calibration constants
    pub fn new(i2c: I, clock: C, address: u8) -> Result<Self, I::Error> {
        let mut sensor = Self {
            i2c,
            clock,
            address,
            calibration: Calibration::default(),
            configuration: Configuration::default(),
        };
        sensor.calibration = sensor.read_calibration()?;
        debug!("BMP280 at {address:#04x}: calibration loaded");
        Ok(sensor)
    }

    /// I2C address of the chip
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Read the chip ID (0x58 for a BMP280)
    pub fn read_id(&mut self) -> Result<u8, I::Error> {
        let [id] = read_registers::<_, 1>(&mut self.i2c, self.address, REG_ID)?;
        Ok(id)
    }

    /// Soft reset, equivalent to a power-on reset
    pub fn reset(&mut self) -> Result<(), I::Error> {
        write_registers(&mut self.i2c, self.address, &[REG_RESET, RESET_VALUE])
    }

    pub fn read_status(&mut self) -> Result<Status, I::Error> {
        let [status] = read_registers::<_, 1>(&mut self.i2c, self.address, REG_STATUS)?;
        Ok(Status::from(status))
    }

    /// Switch power mode, writing CTRL_MEAS and CONFIG in one burst
    pub fn write_mode(&mut self, mode: Mode) -> Result<(), I::Error> {
        let ctrl_meas = self.configuration.measurement_control(mode);
        let config = self.configuration.config();
        debug!("BMP280: mode {mode:?}, ctrl_meas {ctrl_meas:#04x}, config {config:#04x}");
        write_registers(
            &mut self.i2c,
            self.address,
            &[REG_CTRL_MEAS, ctrl_meas, config],
        )
    }

    /// Put the chip to sleep with a new configuration
    ///
    /// The chip ignores CONFIG writes outside of sleep mode, so both happen
    /// in the same write. The configuration is kept only once written.
    pub fn sleep_and_write_configuration(
        &mut self,
        configuration: Configuration,
    ) -> Result<(), I::Error> {
        let previous = core::mem::replace(&mut self.configuration, configuration);
        if let Err(e) = self.write_mode(Mode::Sleep) {
            self.configuration = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Calibration constants read when the handle was created
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Read the calibration block again, for diagnostics
    ///
    /// The constants used for compensation are left untouched.
    pub fn read_calibration(&mut self) -> Result<Calibration, I::Error> {
        let bytes: [u8; CALIBRATION_LEN] =
            read_registers(&mut self.i2c, self.address, REG_CALIB)?;
        Ok(Calibration::from_bytes(&bytes))
    }

    /// Read the raw pressure and temperature ADC values
    pub fn read_raw(&mut self) -> Result<RawMeasurement, I::Error> {
        let [p0, p1, p2, t0, t1, t2] =
            read_registers::<_, 6>(&mut self.i2c, self.address, REG_PRESS)?;
        Ok(RawMeasurement {
            pressure: decode_adc([p0, p1, p2]),
            temperature: decode_adc([t0, t1, t2]),
        })
    }

    /// Read and compensate one measurement
    ///
    /// If either channel is skipped on the chip the measurement is empty.
    pub fn read(&mut self) -> Result<Measurement, I::Error> {
        let time = self.clock.now();
        let raw = self.read_raw()?;

        if raw.temperature == SKIPPED_READING || raw.pressure == SKIPPED_READING {
            warn!("BMP280: skipped channel in reading {raw:?}");
            return Ok(Measurement::empty(time));
        }

        let Some((temperature, t_fine)) =
            compensate_temperature(raw.temperature, &self.calibration.temperature)
        else {
            return Ok(Measurement::empty(time));
        };
        let pressure = compensate_pressure(raw.pressure, t_fine, &self.calibration.pressure);

        Ok(Measurement {
            time,
            temperature: Some(temperature),
            pressure,
        })
    }

    /// Give back the bus
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c, C: Clock> Sensor for Bmp280<I, C> {
    type Error = crate::Error<I::Error>;

    fn read(&mut self) -> core::result::Result<Measurement, Self::Error> {
        Bmp280::read(self)
    }
}
