//! Command-line tool for the TE Connectivity MS5837-30BA pressure sensor.
//!
//! The default address for this chip is 0x76 (118).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use i2clib_core::sensors::ms5837::{Model, Ms5837, Oversampling};
use i2clib_linux::{SleepDelay, SystemClock};
use i2clib_rs::cli::{self, CommonArgs, WatchArgs};

#[derive(Debug, Parser)]
#[command(name = "ms5837", version, about = "TE Connectivity MS5837-30BA pressure sensor")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Temperature oversampling, from 0 (OSR 256) to 5 (OSR 8192)
    #[arg(long, default_value_t = 2, global = true)]
    temperature_osr: u8,

    /// Pressure oversampling, from 0 (OSR 256) to 5 (OSR 8192)
    #[arg(long, default_value_t = 2, global = true)]
    pressure_osr: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reset the chip
    Reset,
    /// Read, validate and display the calibration PROM
    Prom,
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
    let oversampling = Oversampling {
        temperature: cli.temperature_osr,
        pressure: cli.pressure_osr,
    };

    let mut bus = cli.common.bus.open()?;
    let mut chip = Ms5837::new(
        Model::Ms5837_30Ba,
        &mut bus,
        SleepDelay,
        SystemClock,
        cli.common.bus.address,
    )
    .with_oversampling(oversampling);

    match cli.command {
        Command::Reset => chip.reset()?,
        Command::Prom => {
            let prom = chip.read_prom()?;
            if json {
                cli::print_json(&prom)?;
            } else {
                for (i, c) in prom.c.iter().enumerate() {
                    println!("C{i}: {c}");
                }
            }
        }
        Command::Raw => {
            let raw = chip.read_raw(oversampling.temperature, oversampling.pressure)?;
            if json {
                cli::print_json(&raw)?;
            } else {
                println!(
                    "pressure: {}\ntemperature: {}",
                    raw.pressure, raw.temperature
                );
            }
        }
        Command::Read => {
            let measurement = chip
                .read(oversampling.temperature, oversampling.pressure)
                .context("measurement failed")?;
            cli::print_measurement(&measurement, json)?;
        }
        Command::Watch(args) => cli::watch(&mut chip, &args, json)?,
    }
    Ok(())
}
