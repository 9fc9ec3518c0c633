//! Command-line tool for the NXP PCA9685 PWM controller.
//!
//! Every invocation starts from the chip's current state: the driver does
//! not remember anything between two runs.

use std::convert::Infallible;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use i2clib_core::pwm::pca9685::{Oscillator, Pca9685, period_to_prescale, prescale_to_period};
use i2clib_linux::SleepDelay;
use i2clib_rs::cli::{self, CommonArgs};

#[derive(Debug, Parser)]
#[command(name = "pca9685", version, about = "NXP PCA9685 16-channel PWM controller")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Oscillator frequency in MHz, when using an external clock
    #[arg(long, global = true)]
    oscillator_mhz: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stop all outputs and write the default mode registers (asleep)
    Init,
    /// Display the prescales closest to a PWM period, without touching the chip
    PeriodToPrescale {
        /// PWM period in nanoseconds
        period_ns: u32,
    },
    /// Display the PWM period of a prescale, without touching the chip
    PrescaleToPeriod { prescale: u8 },
    /// Stop the outputs, put the chip to sleep and write the prescale
    SetPrescale { prescale: u8 },
    /// Stop the outputs, put the chip to sleep and set the PWM period
    SetPeriod {
        /// PWM period in nanoseconds
        period_ns: u32,
    },
    /// Wake the chip up and resume the outputs active before sleep
    Restart,
    /// Put the chip to sleep
    Sleep,
    /// Wake the chip up
    Wakeup,
    /// Set all outputs to zero
    Stop,
    /// Stop the outputs, put the chip to sleep and switch to the external clock
    EnableExternalClock,
    /// Set the high time of one output, in microseconds
    SetDutyUs { channel: u8, time_us: u32 },
    /// Set the high ratio of one output, between 0 and 1
    SetDutyRatio {
        channel: u8,
        #[arg(allow_negative_numbers = true)]
        ratio: f32,
    },
}

fn oscillator(mhz: Option<f64>) -> Result<Oscillator> {
    let Some(mhz) = mhz else {
        return Ok(Oscillator::INTERNAL);
    };
    let hz = (mhz * 1e6).round();
    if !(1.0..=f64::from(u32::MAX)).contains(&hz) {
        return Err(anyhow!("invalid oscillator frequency {mhz} MHz"));
    }
    Oscillator::external(hz as u32).ok_or_else(|| anyhow!("invalid oscillator frequency {mhz} MHz"))
}

/// Print the prescale closest to `period_ns` and its neighbours
fn print_prescales(period_ns: u32, oscillator: Oscillator) -> Result<()> {
    let prescale = period_to_prescale::<Infallible>(period_ns, oscillator)?;
    let first = prescale.saturating_sub(1).max(3);
    let last = prescale.saturating_add(1);
    for candidate in first..=last {
        println!(
            "prescale: {candidate}, period: {} ns",
            prescale_to_period(candidate, oscillator)
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.common.verbose);
    let oscillator = oscillator(cli.oscillator_mhz)?;

    match cli.command {
        Command::PeriodToPrescale { period_ns } => return print_prescales(period_ns, oscillator),
        Command::PrescaleToPeriod { prescale } => {
            println!("{} ns", prescale_to_period(prescale, oscillator));
            return Ok(());
        }
        _ => {}
    }

    let mut bus = cli.common.bus.open()?;
    let mut chip =
        Pca9685::new(&mut bus, SleepDelay, cli.common.bus.address).with_oscillator(oscillator);

    match cli.command {
        Command::PeriodToPrescale { .. } | Command::PrescaleToPeriod { .. } => {}
        Command::Init => chip.init()?,
        Command::SetPrescale { prescale } => {
            chip.stop()?;
            chip.write_sleep_mode()?;
            chip.write_prescale(prescale)?;
        }
        Command::SetPeriod { period_ns } => {
            chip.stop()?;
            chip.write_sleep_mode()?;
            chip.write_cycle_duration(period_ns)?;
        }
        Command::Restart => chip.restart()?,
        Command::Sleep => chip.write_sleep_mode()?,
        Command::Wakeup => chip.write_normal_mode()?,
        Command::Stop => chip.stop()?,
        Command::EnableExternalClock => {
            chip.stop()?;
            chip.write_sleep_mode()?;
            chip.enable_external_clock()?;
        }
        Command::SetDutyUs { channel, time_us } => {
            let time_ns = time_us
                .checked_mul(1000)
                .with_context(|| format!("{time_us} us does not fit in 32 bits of ns"))?;
            chip.read_prescale()?;
            chip.write_normal_mode()?;
            chip.write_duty_times(channel, &[time_ns])?;
        }
        Command::SetDutyRatio { channel, ratio } => {
            chip.write_normal_mode()?;
            chip.write_duty_ratios(channel, &[ratio])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_oscillator_argument() {
        assert_eq!(oscillator(None).unwrap(), Oscillator::INTERNAL);
        assert_eq!(oscillator(Some(50.0)).unwrap().frequency_hz(), 50_000_000);
        assert!(oscillator(Some(0.0)).is_err());
        assert!(oscillator(Some(-3.0)).is_err());
        assert!(oscillator(Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_parse_duty_ratio() {
        let cli = Cli::try_parse_from([
            "pca9685",
            "/dev/i2c-1",
            "0x40",
            "set-duty-ratio",
            "3",
            "0.25",
            "--oscillator-mhz",
            "26",
        ])
        .unwrap();
        assert_eq!(cli.oscillator_mhz, Some(26.0));
        assert!(matches!(
            cli.command,
            Command::SetDutyRatio {
                channel: 3,
                ratio
            } if ratio == 0.25
        ));
    }
}
