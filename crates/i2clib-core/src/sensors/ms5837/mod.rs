//! TE Connectivity MS5837 pressure sensor
//!
//! The chip is command driven: every raw reading is a conversion command,
//! a wait that depends on the oversampling ratio, then an ADC read. The
//! calibration PROM is read on demand and checked against its CRC4 before
//! any compensation uses it.

pub mod compensation;
pub mod prom;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use self::compensation::{compensate_pressure, compensate_temperature};
use self::prom::{PROM_WORDS, Prom};
use super::{Measurement, RawMeasurement, Sensor};
use crate::error::{Error, Result};
use crate::register::{read_registers, write_registers};
use crate::units::Clock;

/// Default I2C address (118)
pub const DEFAULT_ADDRESS: u8 = 0x76;

pub const CMD_RESET: u8 = 0x1E;
pub const CMD_CONVERT_D1_BASE: u8 = 0x40;
pub const CMD_CONVERT_D2_BASE: u8 = 0x50;
pub const CMD_ADC_READ: u8 = 0x00;
pub const CMD_PROM_READ_BASE: u8 = 0xA0;

/// Largest oversampling index (OSR 8192)
pub const MAX_OVERSAMPLING: u8 = 5;

/// Conversion time at the smallest oversampling ratio, before scaling
const CONVERSION_UNIT_NS: u32 = 2500;

/// Supported chip variants
///
/// Only the 30BA compensation is implemented; the model is recorded on the
/// driver and does not change any computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    /// 30 bar range, 0.2 mbar resolution
    #[default]
    Ms5837_30Ba,
}

/// Oversampling indices used by [`Sensor::read`]
///
/// Index `n` means an OSR of `256 << n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Oversampling {
    pub temperature: u8,
    pub pressure: u8,
}

impl Default for Oversampling {
    fn default() -> Self {
        Self {
            temperature: 2,
            pressure: 2,
        }
    }
}

/// Time to wait between a conversion command and the ADC read
///
/// Grows from 640 us (index 0) to 20.48 ms (index 5). Returns `None` for
/// an index above [`MAX_OVERSAMPLING`].
pub const fn conversion_wait_ns(osr: u8) -> Option<u32> {
    if osr > MAX_OVERSAMPLING {
        None
    } else {
        Some(CONVERSION_UNIT_NS << (8 + osr))
    }
}

fn check_oversampling<E>(osr: u8) -> Result<u32, E> {
    conversion_wait_ns(osr).ok_or(Error::Oversampling {
        value: osr,
        max: MAX_OVERSAMPLING,
    })
}

/// MS5837 driver
pub struct Ms5837<I, D, C> {
    model: Model,
    i2c: I,
    delay: D,
    clock: C,
    address: u8,
    prom: Option<Prom>,
    oversampling: Oversampling,
}

impl<I: I2c, D: DelayNs, C: Clock> Ms5837<I, D, C> {
    /// Create a driver. No bus transaction happens until the first command.
    pub fn new(model: Model, i2c: I, delay: D, clock: C, address: u8) -> Self {
        Self {
            model,
            i2c,
            delay,
            clock,
            address,
            prom: None,
            oversampling: Oversampling::default(),
        }
    }

    /// Use `oversampling` for readings made through [`Sensor::read`]
    pub fn with_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.oversampling = oversampling;
        self
    }

    /// Chip variant given at construction
    pub fn model(&self) -> Model {
        self.model
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn oversampling(&self) -> Oversampling {
        self.oversampling
    }

    /// Reset the chip, reloading its PROM into the internal registers
    pub fn reset(&mut self) -> Result<(), I::Error> {
        write_registers(&mut self.i2c, self.address, &[CMD_RESET])
    }

    /// Read and validate the calibration PROM, and keep it for compensation
    ///
    /// On CRC mismatch nothing is kept.
    pub fn read_prom(&mut self) -> Result<Prom, I::Error> {
        let mut c = [0u16; PROM_WORDS];
        for (word, command) in c.iter_mut().zip((CMD_PROM_READ_BASE..).step_by(2)) {
            *word = u16::from_be_bytes(read_registers(&mut self.i2c, self.address, command)?);
        }
        let prom = Prom { c };

        if let Err((computed, embedded)) = prom.validate() {
            error!("MS5837 at {:#04x}: PROM words {:04x?}", self.address, prom.c);
            return Err(Error::CalibrationChecksum { computed, embedded });
        }

        debug!("MS5837 at {:#04x}: calibration loaded", self.address);
        self.prom = Some(prom);
        Ok(prom)
    }

    /// Calibration kept by the last successful [`Ms5837::read_prom`]
    pub fn prom(&self) -> Option<&Prom> {
        self.prom.as_ref()
    }

    /// Convert and read the raw temperature (`D2`)
    pub fn read_raw_temperature(&mut self, osr: u8) -> Result<u32, I::Error> {
        let wait_ns = check_oversampling::<I::Error>(osr)?;
        self.convert(CMD_CONVERT_D2_BASE + 2 * osr, wait_ns)
    }

    /// Convert and read the raw pressure (`D1`)
    pub fn read_raw_pressure(&mut self, osr: u8) -> Result<u32, I::Error> {
        let wait_ns = check_oversampling::<I::Error>(osr)?;
        self.convert(CMD_CONVERT_D1_BASE + 2 * osr, wait_ns)
    }

    /// Read both raw values, temperature first
    ///
    /// Both oversampling indices are checked before the first command.
    pub fn read_raw(
        &mut self,
        temperature_osr: u8,
        pressure_osr: u8,
    ) -> Result<RawMeasurement, I::Error> {
        check_oversampling::<I::Error>(temperature_osr)?;
        check_oversampling::<I::Error>(pressure_osr)?;

        let temperature = self.read_raw_temperature(temperature_osr)?;
        let pressure = self.read_raw_pressure(pressure_osr)?;
        Ok(RawMeasurement {
            pressure,
            temperature,
        })
    }

    /// Perform a complete measurement cycle
    ///
    /// Reads the PROM first if it has not been read yet. The measurement
    /// time is taken right before the first conversion command.
    pub fn read(&mut self, temperature_osr: u8, pressure_osr: u8) -> Result<Measurement, I::Error> {
        check_oversampling::<I::Error>(temperature_osr)?;
        check_oversampling::<I::Error>(pressure_osr)?;

        let prom = match self.prom {
            Some(prom) => prom,
            None => self.read_prom()?,
        };

        let time = self.clock.now();
        let raw = self.read_raw(temperature_osr, pressure_osr)?;

        let (temperature, dt) = compensate_temperature(raw.temperature, &prom);
        let pressure = compensate_pressure(raw.pressure, dt, &prom);

        Ok(Measurement {
            time,
            temperature: Some(temperature),
            pressure: Some(pressure),
        })
    }

    /// Give back the bus and the delay
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn convert(&mut self, command: u8, wait_ns: u32) -> Result<u32, I::Error> {
        debug!("MS5837: conversion {command:#04x}, waiting {wait_ns}ns");
        write_registers(&mut self.i2c, self.address, &[command])?;
        self.delay.delay_ns(wait_ns);

        let [high, mid, low] = read_registers::<_, 3>(&mut self.i2c, self.address, CMD_ADC_READ)?;
        Ok(u32::from_be_bytes([0, high, mid, low]))
    }
}

impl<I: I2c, D: DelayNs, C: Clock> Sensor for Ms5837<I, D, C> {
    type Error = Error<I::Error>;

    fn read(&mut self) -> core::result::Result<Measurement, Self::Error> {
        let Oversampling {
            temperature,
            pressure,
        } = self.oversampling;
        Ms5837::read(self, temperature, pressure)
    }
}
