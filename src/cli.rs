//! Shared command-line plumbing: bus arguments, logging, output.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use serde::Serialize;

use i2clib_core::{Measurement, Sensor};
use i2clib_linux::{BusConfig, I2cBus};

/// Arguments common to every front end
#[derive(Debug, Args)]
pub struct CommonArgs {
    #[command(flatten)]
    pub bus: BusArgs,

    /// Log driver activity (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Which bus and chip to talk to
#[derive(Debug, Args)]
pub struct BusArgs {
    /// I2C bus device, e.g. /dev/i2c-1
    #[arg(value_name = "DEVICE")]
    pub device: PathBuf,

    /// 7-bit chip address, decimal or 0x-prefixed hex
    #[arg(value_name = "ADDRESS", value_parser = parse_address)]
    pub address: u8,

    /// Bus transaction timeout in milliseconds
    #[arg(
        long,
        env = "I2CLIB_TIMEOUT_MS",
        default_value_t = 100,
        global = true
    )]
    pub timeout_ms: u64,
}

impl BusArgs {
    pub fn config(&self) -> BusConfig {
        BusConfig::new(&self.device).with_timeout(Duration::from_millis(self.timeout_ms))
    }

    /// Open the bus device
    pub fn open(&self) -> Result<I2cBus> {
        let bus = I2cBus::open_with_config(&self.config())
            .with_context(|| format!("cannot use I2C bus {}", self.device.display()))?;
        Ok(bus)
    }
}

/// Parse a 7-bit I2C address given in decimal or with a `0x` prefix
pub fn parse_address(value: &str) -> Result<u8, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse::<u8>(),
    }
    .map_err(|e| format!("invalid address '{value}': {e}"))?;

    if parsed > 0x7F {
        return Err(format!("address {parsed:#04x} is not a 7-bit address"));
    }
    Ok(parsed)
}

/// Install the logger; `verbose` raises the default level to debug
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Print `value` as one line of JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("failed to encode JSON output")?;
    println!("{line}");
    Ok(())
}

/// Human-readable form of a measurement, `unknown` for missing values
pub fn format_measurement(measurement: &Measurement) -> String {
    let pressure = measurement
        .pressure
        .map_or_else(|| "unknown".to_string(), |p| format!("{} Bar", p.bar()));
    let temperature = measurement
        .temperature
        .map_or_else(|| "unknown".to_string(), |t| format!("{}C", t.celsius()));
    format!("{pressure}, {temperature}")
}

pub fn print_measurement(measurement: &Measurement, json: bool) -> Result<()> {
    if json {
        print_json(measurement)
    } else {
        println!("{}", format_measurement(measurement));
        Ok(())
    }
}

/// Arguments of the `watch` command
#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Number of readings, unlimited if omitted
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Time between two readings in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
}

/// Print compensated readings at a fixed interval
///
/// The first failed reading ends the loop.
pub fn watch<S>(mut sensor: S, args: &WatchArgs, json: bool) -> Result<()>
where
    S: Sensor,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let interval = Duration::from_millis(args.interval_ms);
    info!("reading every {interval:?}");

    let mut done = 0u32;
    while args.count.is_none_or(|count| done < count) {
        if done > 0 {
            thread::sleep(interval);
        }
        let measurement = sensor.read().context("measurement failed")?;
        print_measurement(&measurement, json)?;
        done += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use i2clib_core::{Pressure, Temperature, Timestamp};

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x76"), Ok(0x76));
        assert_eq!(parse_address("0X40"), Ok(0x40));
        assert_eq!(parse_address("118"), Ok(118));
        assert!(parse_address("0x80").is_err());
        assert!(parse_address("200").is_err());
        assert!(parse_address("sensor").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_format_measurement() {
        let measurement = Measurement {
            time: Timestamp::from_micros(0),
            temperature: Some(Temperature::from_celsius(19.81)),
            pressure: Some(Pressure::from_pascal(399_980.0)),
        };
        assert_eq!(format_measurement(&measurement), "3.9998 Bar, 19.81C");

        let empty = Measurement::empty(Timestamp::from_micros(0));
        assert_eq!(format_measurement(&empty), "unknown, unknown");
    }

    #[test]
    fn test_watch_stops_after_count() {
        struct Counting(u32);

        impl Sensor for Counting {
            type Error = std::io::Error;

            fn read(&mut self) -> Result<Measurement, Self::Error> {
                self.0 += 1;
                Ok(Measurement::empty(Timestamp::from_micros(u64::from(self.0))))
            }
        }

        let mut sensor = Counting(0);
        let args = WatchArgs {
            count: Some(3),
            interval_ms: 0,
        };
        watch(&mut sensor, &args, true).unwrap();
        assert_eq!(sensor.0, 3);
    }
}
