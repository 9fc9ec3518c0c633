//! Per-channel PWM edge configuration.
//!
//! Each channel has four registers: ON_L, ON_H, OFF_L, OFF_H. The two
//! 12-bit edges are counter values at which the output goes high and low.
//! Bit 4 of ON_H forces the output fully on, bit 4 of OFF_H fully off; the
//! edges cannot express either state.

use micromath::F32Ext;

use super::prescale::STEPS_PER_CYCLE;
use crate::error::{Error, Result};

/// Largest edge value
pub const MAX_EDGE: u16 = 4095;

/// Full-on bit in LEDn_ON_H
pub const FULL_ON: u8 = 1 << 4;

/// Full-off bit in LEDn_OFF_H
pub const FULL_OFF: u8 = 1 << 4;

/// Output configuration of one channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PwmConfiguration {
    /// Output constantly low
    #[default]
    Off,
    /// Output constantly high
    On,
    /// Output high from `on_edge` to `off_edge` in every cycle
    Normal { on_edge: u16, off_edge: u16 },
}

impl PwmConfiguration {
    /// Normal mode with explicit edges, both within [0, 4095]
    pub fn normal<E>(on_edge: u16, off_edge: u16) -> Result<Self, E> {
        check_edge::<E>(on_edge)?;
        check_edge::<E>(off_edge)?;
        Ok(Self::Normal { on_edge, off_edge })
    }

    /// Configuration closest to a duty ratio in [0, 1]
    ///
    /// Ratios that round to 0 or 4096 steps give fully off and fully on.
    /// Ratios outside of [0, 1] saturate the same way.
    pub fn from_duty_ratio<E>(ratio: f32) -> Result<Self, E> {
        if !ratio.is_finite() {
            return Err(Error::DutyRatio);
        }

        let duty = F32Ext::round(ratio * STEPS_PER_CYCLE as f32) as i32;
        Ok(if duty <= 0 {
            Self::Off
        } else if duty >= STEPS_PER_CYCLE as i32 {
            Self::On
        } else {
            Self::Normal {
                on_edge: 0,
                off_edge: (duty - 1) as u16,
            }
        })
    }

    /// Configuration for an off edge computed from a duration, which may
    /// fall outside of [0, 4095]
    pub fn from_unnormalized_off_edge(off_edge: i64) -> Self {
        if off_edge <= 0 {
            Self::Off
        } else if off_edge >= i64::from(MAX_EDGE) {
            Self::On
        } else {
            Self::Normal {
                on_edge: 0,
                off_edge: off_edge as u16,
            }
        }
    }

    /// Register content: ON_L, ON_H, OFF_L, OFF_H
    pub fn encode<E>(&self) -> Result<[u8; 4], E> {
        match *self {
            Self::Off => Ok([0, 0, 0, FULL_OFF]),
            Self::On => Ok([0, FULL_ON, 0, 0]),
            Self::Normal { on_edge, off_edge } => {
                check_edge::<E>(on_edge)?;
                check_edge::<E>(off_edge)?;
                let [on_l, on_h] = on_edge.to_le_bytes();
                let [off_l, off_h] = off_edge.to_le_bytes();
                Ok([on_l, on_h, off_l, off_h])
            }
        }
    }
}

fn check_edge<E>(value: u16) -> Result<(), E> {
    if value > MAX_EDGE {
        Err(Error::EdgeOutOfRange { value })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;

    type Conf = core::result::Result<PwmConfiguration, Error<ErrorKind>>;

    #[test]
    fn test_extreme_ratios_are_full_modes() {
        let off: Conf = PwmConfiguration::from_duty_ratio(0.0);
        let on: Conf = PwmConfiguration::from_duty_ratio(1.0);
        assert_eq!(off, Ok(PwmConfiguration::Off));
        assert_eq!(on, Ok(PwmConfiguration::On));
    }

    #[test]
    fn test_ratio_rounding() {
        let half: Conf = PwmConfiguration::from_duty_ratio(0.5);
        assert_eq!(
            half,
            Ok(PwmConfiguration::Normal {
                on_edge: 0,
                off_edge: 2047
            })
        );

        // Less than half a step rounds to off
        let tiny: Conf = PwmConfiguration::from_duty_ratio(0.0001);
        assert_eq!(tiny, Ok(PwmConfiguration::Off));

        let almost: Conf = PwmConfiguration::from_duty_ratio(0.9999);
        assert_eq!(almost, Ok(PwmConfiguration::On));

        let below: Conf = PwmConfiguration::from_duty_ratio(-0.3);
        assert_eq!(below, Ok(PwmConfiguration::Off));
        let above: Conf = PwmConfiguration::from_duty_ratio(2.0);
        assert_eq!(above, Ok(PwmConfiguration::On));
    }

    #[test]
    fn test_non_finite_ratio_is_rejected() {
        let nan: Conf = PwmConfiguration::from_duty_ratio(f32::NAN);
        assert_eq!(nan, Err(Error::DutyRatio));
        let inf: Conf = PwmConfiguration::from_duty_ratio(f32::INFINITY);
        assert_eq!(inf, Err(Error::DutyRatio));
    }

    #[test]
    fn test_unnormalized_off_edge() {
        assert_eq!(
            PwmConfiguration::from_unnormalized_off_edge(-5),
            PwmConfiguration::Off
        );
        assert_eq!(
            PwmConfiguration::from_unnormalized_off_edge(0),
            PwmConfiguration::Off
        );
        assert_eq!(
            PwmConfiguration::from_unnormalized_off_edge(1209),
            PwmConfiguration::Normal {
                on_edge: 0,
                off_edge: 1209
            }
        );
        assert_eq!(
            PwmConfiguration::from_unnormalized_off_edge(4095),
            PwmConfiguration::On
        );
    }

    #[test]
    fn test_encoding() {
        assert_eq!(
            PwmConfiguration::Off.encode::<ErrorKind>(),
            Ok([0x00, 0x00, 0x00, 0x10])
        );
        assert_eq!(
            PwmConfiguration::On.encode::<ErrorKind>(),
            Ok([0x00, 0x10, 0x00, 0x00])
        );
        let normal = PwmConfiguration::normal::<ErrorKind>(0x123, 0xABC).unwrap();
        assert_eq!(normal.encode::<ErrorKind>(), Ok([0x23, 0x01, 0xBC, 0x0A]));
    }

    #[test]
    fn test_out_of_range_edges_are_rejected() {
        let conf: Conf = PwmConfiguration::normal(0, 4096);
        assert_eq!(conf, Err(Error::EdgeOutOfRange { value: 4096 }));

        let unchecked = PwmConfiguration::Normal {
            on_edge: 0x1000,
            off_edge: 0,
        };
        assert_eq!(
            unchecked.encode::<ErrorKind>(),
            Err(Error::EdgeOutOfRange { value: 0x1000 })
        );
    }
}
