//! Command-line tool for the Bosch BMP280 pressure sensor.
//!
//! The default address for this chip is 0x76.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use i2clib_core::sensors::bmp280::config::{Configuration, Mode};
use i2clib_core::sensors::bmp280::{Bmp280, CHIP_ID};
use i2clib_linux::SystemClock;
use i2clib_rs::cli::{self, CommonArgs, WatchArgs};

#[derive(Debug, Parser)]
#[command(name = "bmp280", version, about = "Bosch BMP280 pressure and temperature sensor")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read and verify the chip ID
    Check,
    /// Start periodic measurements
    Normal,
    /// Perform a single measurement, then go back to sleep
    Forced,
    /// Stop measurements
    Sleep,
    /// Soft-reset the chip
    Reset,
    /// Put the chip to sleep with the default configuration
    Defaults,
    /// Put the chip to sleep with a configuration given as JSON
    ///
    /// Fields: pressure_oversampling, temperature_oversampling,
    /// standby_time, iir_filter. Missing fields keep their default, e.g.
    /// '{"pressure_oversampling": "x16", "iir_filter": "x4"}'
    Configure {
        /// Configuration as a JSON object
        #[arg(value_name = "JSON")]
        config: String,
    },
    /// Display the calibration data
    Calibration,
    /// Display the raw ADC values
    Raw,
    /// Display a compensated measurement
    Read,
    /// Display compensated measurements at a fixed interval
    Watch(WatchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.common.verbose);
    let json = cli.common.json;

    let mut bus = cli.common.bus.open()?;
    let address = cli.common.bus.address;
    let mut chip = Bmp280::new(&mut bus, SystemClock, address)
        .with_context(|| format!("failed to read BMP280 calibration at {address:#04x}"))?;

    match cli.command {
        Command::Check => {
            let id = chip.read_id()?;
            if id != CHIP_ID {
                bail!("unexpected ID {id:#04x}, expected {CHIP_ID:#04x}");
            }
            println!("OK");
        }
        Command::Normal => chip.write_mode(Mode::Normal)?,
        Command::Forced => chip.write_mode(Mode::Forced)?,
        Command::Sleep => chip.write_mode(Mode::Sleep)?,
        Command::Reset => chip.reset()?,
        Command::Defaults => chip.sleep_and_write_configuration(Configuration::default())?,
        Command::Configure { config } => {
            let configuration: Configuration =
                serde_json::from_str(&config).context("invalid configuration")?;
            chip.sleep_and_write_configuration(configuration)?;
        }
        Command::Calibration => {
            let calibration = chip.read_calibration()?;
            if json {
                cli::print_json(&calibration)?;
            } else {
                let t = calibration.temperature;
                let p = calibration.pressure;
                println!("T1: {}\nT2: {}\nT3: {}", t.t1, t.t2, t.t3);
                println!(
                    "P1: {}\nP2: {}\nP3: {}\nP4: {}\nP5: {}\nP6: {}\nP7: {}\nP8: {}\nP9: {}",
                    p.p1, p.p2, p.p3, p.p4, p.p5, p.p6, p.p7, p.p8, p.p9
                );
            }
        }
        Command::Raw => {
            let raw = chip.read_raw()?;
            if json {
                cli::print_json(&raw)?;
            } else {
                println!(
                    "pressure: {:#x}, temperature: {:#x}",
                    raw.pressure, raw.temperature
                );
            }
        }
        Command::Read => {
            let measurement = chip.read()?;
            cli::print_measurement(&measurement, json)?;
        }
        Command::Watch(args) => cli::watch(&mut chip, &args, json)?,
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
    fn test_parse_configure() {
        let cli = Cli::try_parse_from([
            "bmp280",
            "/dev/i2c-1",
            "0x76",
            "configure",
            r#"{"iir_filter": "x4"}"#,
        ])
        .unwrap();
        assert_eq!(cli.common.bus.address, 0x76);
        assert!(matches!(cli.command, Command::Configure { .. }));
    }
}
