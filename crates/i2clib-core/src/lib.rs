//! Hardware-independent core library for i2clib
//!
//! This crate contains all platform-agnostic logic for the supported I2C
//! chips: calibration readout, datasheet compensation math, conversion
//! sequencing and PWM edge encoding. Drivers are written against the
//! `embedded-hal` 1.0 blocking traits, so the same code runs on the Linux
//! bus from `i2clib-linux` and on the mock bus used by the tests.
//!
//! It is `#![no_std]` so it compiles on both embedded targets and desktop
//! hosts.
//!
//! Drivers own their bus handle. Several drivers share one bus through any
//! `embedded-hal` bus-sharing device, such as `embedded_hal_bus::i2c::RefCellDevice`.

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod pwm;
mod register;
pub mod sensors;
pub mod units;

pub use error::{Error, Result};
pub use pwm::pca9685::{Oscillator, Pca9685, PwmConfiguration};
pub use sensors::bmp280::Bmp280;
pub use sensors::ms5837::Ms5837;
pub use sensors::{Measurement, RawMeasurement, Sensor};
pub use units::{Clock, Pressure, Temperature, Timestamp};

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use embedded_hal::delay::DelayNs;
    use embedded_hal_bus::i2c::RefCellDevice;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use crate::pwm::pca9685::{self, Pca9685};
    use crate::sensors::ms5837::{self, Model, Ms5837};
    use crate::units::Timestamp;

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn test_drivers_share_one_bus() {
        let expectations = [
            I2cTransaction::write(ms5837::DEFAULT_ADDRESS, vec![ms5837::CMD_RESET]),
            I2cTransaction::write(pca9685::DEFAULT_ADDRESS, vec![0xFD, 0x10]),
            I2cTransaction::write(ms5837::DEFAULT_ADDRESS, vec![ms5837::CMD_RESET]),
        ];
        let bus = RefCell::new(I2cMock::new(&expectations));

        let mut sensor = Ms5837::new(
            Model::Ms5837_30Ba,
            RefCellDevice::new(&bus),
            NoDelay,
            || Timestamp::from_micros(0),
            ms5837::DEFAULT_ADDRESS,
        );
        let mut pwm = Pca9685::new(RefCellDevice::new(&bus), NoDelay, pca9685::DEFAULT_ADDRESS);

        sensor.reset().unwrap();
        pwm.stop().unwrap();
        sensor.reset().unwrap();

        bus.borrow_mut().done();
    }
}
