//! Error type shared by all drivers.
//!
//! The bus error type is a generic parameter so that drivers stay
//! independent of the platform: the Linux bus surfaces its own error (with
//! address, payload and OS error text), the mock bus surfaces
//! `embedded_hal::i2c::ErrorKind`.

use thiserror::Error;

/// Errors raised by the drivers in this crate
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error<E> {
    /// The underlying bus transaction failed
    #[error("{0}")]
    Bus(E),

    /// Calibration PROM content does not match its embedded checksum
    #[error("invalid CRC in calibration data, computed: {computed}, embedded: {embedded}")]
    CalibrationChecksum {
        /// CRC4 computed over the PROM words
        computed: u8,
        /// CRC4 stored in the top nibble of PROM word 0
        embedded: u8,
    },

    /// Oversampling index outside of the chip's range
    #[error("OSR value must be between 0 and {max}, got {value}")]
    Oversampling {
        /// The rejected index
        value: u8,
        /// Largest accepted index
        max: u8,
    },

    /// Requested PWM period is shorter than prescale 3 allows
    #[error("PWM period too low ({period_ns}ns)")]
    PeriodTooShort {
        /// The rejected period
        period_ns: u32,
    },

    /// Requested PWM period is longer than prescale 255 allows
    #[error("PWM period too high ({period_ns}ns)")]
    PeriodTooLong {
        /// The rejected period
        period_ns: u32,
    },

    /// Prescale below the hardware minimum of 3
    #[error("prescale {value} is below the minimum of 3")]
    Prescale {
        /// The rejected prescale byte
        value: u8,
    },

    /// PWM edge outside of [0, 4095]
    #[error("PWM edge {value} out of range 0-4095")]
    EdgeOutOfRange {
        /// The rejected edge value
        value: u16,
    },

    /// Duty ratio is not a finite number
    #[error("duty ratio must be a finite number")]
    DutyRatio,

    /// PWM channel range does not fit on the chip
    #[error("PWM channels {first}..{first}+{count} exceed the 16 available")]
    ChannelOutOfRange {
        /// First channel of the range
        first: u8,
        /// Number of channels in the range
        count: usize,
    },

    /// The PWM chip must be in sleep mode for this write
    #[error("chip must be in sleep mode to {operation}")]
    NotSleeping {
        /// What was attempted
        operation: &'static str,
    },
}

impl<E> Error<E> {
    /// Whether the error was raised by argument validation, before any bus
    /// activity took place
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::Oversampling { .. }
                | Self::PeriodTooShort { .. }
                | Self::PeriodTooLong { .. }
                | Self::Prescale { .. }
                | Self::EdgeOutOfRange { .. }
                | Self::DutyRatio
                | Self::ChannelOutOfRange { .. }
        )
    }
}

/// Result type for driver operations
pub type Result<T, E> = core::result::Result<T, Error<E>>;

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;

    #[test]
    fn test_argument_errors_are_classified() {
        let err: Error<ErrorKind> = Error::Oversampling { value: 6, max: 5 };
        assert!(err.is_invalid_argument());

        let err: Error<ErrorKind> = Error::EdgeOutOfRange { value: 4096 };
        assert!(err.is_invalid_argument());

        let err: Error<ErrorKind> = Error::Bus(ErrorKind::Other);
        assert!(!err.is_invalid_argument());

        let err: Error<ErrorKind> = Error::CalibrationChecksum {
            computed: 2,
            embedded: 3,
        };
        assert!(!err.is_invalid_argument());
    }
}
