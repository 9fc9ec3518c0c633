//! BMP280 device configuration and power modes.
//!
//! The configuration maps onto two registers written in a single burst:
//!
//! | Register | Bits 7:5 | Bits 4:2 | Bits 1:0 |
//! |----------|----------|----------|----------|
//! | CTRL_MEAS (0xF4) | osrs_t | osrs_p | mode |
//! | CONFIG (0xF5)    | t_sb   | filter | spi3w_en (always 0) |

use serde::{Deserialize, Serialize};

/// Oversampling factor for one measurement channel
///
/// `Skipped` disables the channel: the chip then reports `0x80000` for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Oversampling {
    Skipped = 0,
    #[default]
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

/// Inactive time between two measurements in normal mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StandbyTime {
    #[default]
    Ms0_5 = 0,
    Ms62_5 = 1,
    Ms125 = 2,
    Ms250 = 3,
    Ms500 = 4,
    Ms1000 = 5,
    Ms2000 = 6,
    Ms4000 = 7,
}

/// IIR filter time constant applied to pressure and temperature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum IirFilter {
    #[default]
    Off = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
    X16 = 4,
}

/// Power mode (mode[1:0] in CTRL_MEAS)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// No measurements, registers accessible
    Sleep = 0,
    /// One measurement cycle, then back to sleep
    Forced = 1,
    /// Continuous measurement cycles separated by the standby time
    Normal = 3,
}

/// Configuration of the BMP280
///
/// Held by the driver and re-applied on every mode write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// How many samples are integrated in a single pressure readout
    pub pressure_oversampling: Oversampling,
    /// How many samples are integrated in a single temperature readout
    pub temperature_oversampling: Oversampling,
    /// How long the chip waits between readouts in normal mode
    pub standby_time: StandbyTime,
    /// IIR filter applied to the readouts
    pub iir_filter: IirFilter,
}

impl Configuration {
    /// Value of the CTRL_MEAS register for this configuration in `mode`
    pub const fn measurement_control(&self, mode: Mode) -> u8 {
        mode as u8
            | (self.pressure_oversampling as u8) << 2
            | (self.temperature_oversampling as u8) << 5
    }

    /// Value of the CONFIG register for this configuration
    pub const fn config(&self) -> u8 {
        (self.iir_filter as u8) << 2 | (self.standby_time as u8) << 5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_register_values() {
        let config = Configuration::default();
        assert_eq!(config.measurement_control(Mode::Sleep), 0b0010_0100);
        assert_eq!(config.measurement_control(Mode::Normal), 0b0010_0111);
        assert_eq!(config.config(), 0);
    }

    #[test]
    fn test_register_packing() {
        let config = Configuration {
            pressure_oversampling: Oversampling::X16,
            temperature_oversampling: Oversampling::X2,
            standby_time: StandbyTime::Ms1000,
            iir_filter: IirFilter::X16,
        };
        // osrs_t=010, osrs_p=101, mode=01
        assert_eq!(config.measurement_control(Mode::Forced), 0b0101_0101);
        // t_sb=101, filter=100
        assert_eq!(config.config(), 0b1011_0000);
    }

    #[test]
    fn test_skipped_channel_clears_oversampling_bits() {
        let config = Configuration {
            temperature_oversampling: Oversampling::Skipped,
            ..Configuration::default()
        };
        assert_eq!(config.measurement_control(Mode::Sleep), 0b0000_0100);
    }
}
