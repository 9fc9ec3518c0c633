//! NXP PCA9685 16-channel, 12-bit PWM controller
//!
//! The chip powers up asleep, and stays asleep after [`Pca9685::init`]: the
//! prescale and the external clock bit can only be written in sleep mode.
//! Call [`Pca9685::write_normal_mode`] to start the oscillator.
//!
//! If outputs were active when the chip was put to sleep, they do not
//! resume on wakeup. Either write the channels again or use
//! [`Pca9685::restart`].

pub mod configuration;
pub mod prescale;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::debug;

pub use self::configuration::PwmConfiguration;
pub use self::prescale::{Oscillator, period_to_prescale, prescale_to_period};

use self::configuration::FULL_OFF;
use self::prescale::{DEFAULT_PRESCALE, MIN_PRESCALE, duration_to_steps};
use crate::error::{Error, Result};
use crate::register::{read_registers, write_registers};

/// Default I2C address (all address pins low)
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Number of PWM channels
pub const CHANNELS: usize = 16;

pub const REG_MODE1: u8 = 0x00;
pub const REG_MODE2: u8 = 0x01;
pub const REG_LED0: u8 = 0x06;
pub const REG_ALL_LED_OFF_H: u8 = 0xFD;
pub const REG_PRE_SCALE: u8 = 0xFE;

/// Registers per channel (ON_L, ON_H, OFF_L, OFF_H)
const REGISTERS_PER_CHANNEL: usize = 4;

pub const MODE1_ALLCALL: u8 = 1 << 0;
pub const MODE1_SLEEP: u8 = 1 << 4;
pub const MODE1_AUTO_INCREMENT: u8 = 1 << 5;
pub const MODE1_EXTCLK: u8 = 1 << 6;
pub const MODE1_RESTART: u8 = 1 << 7;

/// Totem pole outputs
pub const MODE2_OUTDRV: u8 = 1 << 2;

const DEFAULT_MODE1: u8 = MODE1_SLEEP | MODE1_ALLCALL | MODE1_AUTO_INCREMENT;
const DEFAULT_MODE2: u8 = MODE2_OUTDRV;

/// Time the oscillator needs after leaving sleep before RESTART may be set
const RESTART_DELAY_US: u32 = 500;

/// Register pointer plus the four registers of every channel
type Frame = heapless::Vec<u8, { 1 + CHANNELS * REGISTERS_PER_CHANNEL }>;

/// PCA9685 driver
///
/// MODE1 and the prescale are shadowed: the driver assumes it is the only
/// one writing them.
pub struct Pca9685<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    oscillator: Oscillator,
    mode1: u8,
    mode2: u8,
    prescale: u8,
}

impl<I: I2c, D: DelayNs> Pca9685<I, D> {
    /// Create a driver for a chip running on its internal oscillator
    ///
    /// No bus transaction happens here, see [`Pca9685::init`].
    pub fn new(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            oscillator: Oscillator::INTERNAL,
            mode1: DEFAULT_MODE1,
            mode2: DEFAULT_MODE2,
            prescale: DEFAULT_PRESCALE,
        }
    }

    /// Use `oscillator` for period and duration conversions
    pub fn with_oscillator(mut self, oscillator: Oscillator) -> Self {
        self.oscillator = oscillator;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn oscillator(&self) -> Oscillator {
        self.oscillator
    }

    /// Whether the chip was last put in sleep mode
    pub fn is_sleeping(&self) -> bool {
        self.mode1 & MODE1_SLEEP != 0
    }

    /// Stop all outputs, then write the default MODE1 (asleep, all-call,
    /// auto-increment) and MODE2 (totem pole)
    pub fn init(&mut self) -> Result<(), I::Error> {
        self.stop()?;
        self.mode1 = DEFAULT_MODE1;
        self.mode2 = DEFAULT_MODE2;
        self.write_mode1(self.mode1)?;
        write_registers(&mut self.i2c, self.address, &[REG_MODE2, self.mode2])
    }

    /// Turn all outputs fully off
    pub fn stop(&mut self) -> Result<(), I::Error> {
        write_registers(&mut self.i2c, self.address, &[REG_ALL_LED_OFF_H, FULL_OFF])
    }

    /// Stop the oscillator
    pub fn write_sleep_mode(&mut self) -> Result<(), I::Error> {
        self.write_mode1(self.mode1 | MODE1_SLEEP)
    }

    /// Start the oscillator
    pub fn write_normal_mode(&mut self) -> Result<(), I::Error> {
        self.write_mode1(self.mode1 & !MODE1_SLEEP)
    }

    /// Wake the chip up and resume the outputs active before sleep
    pub fn restart(&mut self) -> Result<(), I::Error> {
        self.write_normal_mode()?;
        self.delay.delay_us(RESTART_DELAY_US);
        write_registers(
            &mut self.i2c,
            self.address,
            &[REG_MODE1, self.mode1 | MODE1_RESTART],
        )
    }

    /// Switch to the clock on the EXTCLK pin
    ///
    /// Only a power cycle switches back to the internal oscillator.
    pub fn enable_external_clock(&mut self) -> Result<(), I::Error> {
        self.require_sleep("enable the external clock")?;
        self.write_mode1(self.mode1 | MODE1_EXTCLK)
    }

    /// Write the prescale byte
    pub fn write_prescale(&mut self, prescale: u8) -> Result<(), I::Error> {
        if prescale < MIN_PRESCALE {
            return Err(Error::Prescale { value: prescale });
        }
        self.require_sleep("change the prescale")?;

        write_registers(&mut self.i2c, self.address, &[REG_PRE_SCALE, prescale])?;
        debug!("PCA9685 at {:#04x}: prescale {prescale}", self.address);
        self.prescale = prescale;
        Ok(())
    }

    /// Read the prescale byte back from the chip
    pub fn read_prescale(&mut self) -> Result<u8, I::Error> {
        let [prescale] = read_registers::<_, 1>(&mut self.i2c, self.address, REG_PRE_SCALE)?;
        self.prescale = prescale;
        Ok(prescale)
    }

    /// Set the PWM period to the closest one the prescale can express
    pub fn write_cycle_duration(&mut self, period_ns: u32) -> Result<(), I::Error> {
        let prescale = period_to_prescale::<I::Error>(period_ns, self.oscillator)?;
        self.write_prescale(prescale)
    }

    /// Configure `configurations.len()` consecutive channels starting at
    /// `first`, in a single write
    pub fn write_pwm_configurations(
        &mut self,
        first: u8,
        configurations: &[PwmConfiguration],
    ) -> Result<(), I::Error> {
        check_channels::<I::Error>(first, configurations.len())?;
        let overflow = || Error::ChannelOutOfRange {
            first,
            count: configurations.len(),
        };

        let mut frame = Frame::new();
        frame
            .push(REG_LED0 + first * REGISTERS_PER_CHANNEL as u8)
            .map_err(|_| overflow())?;
        for configuration in configurations {
            frame
                .extend_from_slice(&configuration.encode::<I::Error>()?)
                .map_err(|_| overflow())?;
        }

        write_registers(&mut self.i2c, self.address, &frame)
    }

    /// Set duty ratios in [0, 1] on consecutive channels starting at `first`
    pub fn write_duty_ratios(&mut self, first: u8, ratios: &[f32]) -> Result<(), I::Error> {
        check_channels::<I::Error>(first, ratios.len())?;

        let mut configurations = [PwmConfiguration::Off; CHANNELS];
        for (configuration, ratio) in configurations.iter_mut().zip(ratios) {
            *configuration = PwmConfiguration::from_duty_ratio::<I::Error>(*ratio)?;
        }
        self.write_pwm_configurations(first, &configurations[..ratios.len()])
    }

    /// Set high times in nanoseconds on consecutive channels starting at
    /// `first`, using the current prescale
    ///
    /// Times longer than the period saturate to fully on.
    pub fn write_duty_times(&mut self, first: u8, durations_ns: &[u32]) -> Result<(), I::Error> {
        check_channels::<I::Error>(first, durations_ns.len())?;

        let mut configurations = [PwmConfiguration::Off; CHANNELS];
        for (configuration, duration_ns) in configurations.iter_mut().zip(durations_ns) {
            let steps = duration_to_steps(*duration_ns, self.prescale, self.oscillator);
            *configuration = PwmConfiguration::from_unnormalized_off_edge(steps - 1);
        }
        self.write_pwm_configurations(first, &configurations[..durations_ns.len()])
    }

    /// Stop all outputs and put the chip to sleep
    pub fn shutdown(&mut self) -> Result<(), I::Error> {
        self.stop()?;
        self.write_sleep_mode()
    }

    /// Give back the bus and the delay
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn write_mode1(&mut self, mode1: u8) -> Result<(), I::Error> {
        write_registers(&mut self.i2c, self.address, &[REG_MODE1, mode1])?;
        self.mode1 = mode1;
        Ok(())
    }

    fn require_sleep(&self, operation: &'static str) -> Result<(), I::Error> {
        if self.is_sleeping() {
            Ok(())
        } else {
            Err(Error::NotSleeping { operation })
        }
    }
}

fn check_channels<E>(first: u8, count: usize) -> Result<(), E> {
    if usize::from(first) + count > CHANNELS {
        Err(Error::ChannelOutOfRange { first, count })
    } else {
        Ok(())
    }
}
