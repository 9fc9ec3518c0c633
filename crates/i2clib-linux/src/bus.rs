//! I2C bus over a Linux `/dev/i2c-*` character device.
//!
//! Transactions go through `linux_embedded_hal::I2cdev`, which issues one
//! `I2C_RDWR` ioctl per `embedded_hal` transaction, so a register-pointer
//! write followed by a read is atomic on the bus (repeated start, no stop in
//! between). The kernel serializes ioctls from all processes using the
//! adapter; there is no locking here. Failures are reported with the chip
//! address, the bytes written and the OS error.

use std::fmt;
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c as _, NoAcknowledgeSource, Operation};
use linux_embedded_hal::I2cdev;
use linux_embedded_hal::i2cdev::linux::LinuxI2CError;
use log::debug;
use nix::errno::Errno;

use crate::config::BusConfig;

/// `I2C_TIMEOUT` counts in units of 10 ms
const TIMEOUT_UNIT_MS: u128 = 10;

mod ioctl {
    nix::ioctl_write_int_bad!(i2c_set_timeout, 0x0702);
}

/// Bytes printed as space-separated hex, for error messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Errors raised by [`I2cBus`]
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to open bus {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not configure i2c bus timeout: {0}")]
    Timeout(#[source] Errno),

    #[error("failed write to address {address:#04x}: {source} [{payload}]")]
    Write {
        address: u8,
        payload: HexBytes,
        #[source]
        source: Errno,
    },

    #[error("failed read from address {address:#04x}: {source} [{payload}]")]
    Read {
        address: u8,
        payload: HexBytes,
        #[source]
        source: Errno,
    },

    #[error("transfer of {len} bytes exceeds the 65535 bytes of one i2c message")]
    PayloadTooLong { len: usize },
}

impl BusError {
    fn errno(&self) -> Option<Errno> {
        match self {
            Self::Write { source, .. } | Self::Read { source, .. } => Some(*source),
            Self::Timeout(source) => Some(*source),
            Self::Open { .. } | Self::PayloadTooLong { .. } => None,
        }
    }
}

impl i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self.errno() {
            // Adapters report a missing ACK as ENXIO or EREMOTEIO
            Some(Errno::ENXIO | Errno::EREMOTEIO) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
            }
            Some(Errno::EAGAIN) => ErrorKind::ArbitrationLoss,
            _ => ErrorKind::Other,
        }
    }
}

/// Convert a timeout to `I2C_TIMEOUT` units, rounding up, at least one
fn timeout_units(timeout: Duration) -> i32 {
    let units = timeout.as_millis().div_ceil(TIMEOUT_UNIT_MS).max(1);
    i32::try_from(units).unwrap_or(i32::MAX)
}

fn errno(err: &LinuxI2CError) -> Errno {
    match err {
        LinuxI2CError::Errno(code) => Errno::from_raw(*code),
        LinuxI2CError::Io(err) => err.raw_os_error().map_or(Errno::EIO, Errno::from_raw),
    }
}

fn io_error(err: LinuxI2CError) -> io::Error {
    match err {
        LinuxI2CError::Errno(code) => io::Error::from_raw_os_error(code),
        LinuxI2CError::Io(err) => err,
    }
}

/// Attach the transaction context to a failed transfer
fn transfer_error(address: u8, payload: HexBytes, reads: bool, err: &LinuxI2CError) -> BusError {
    let source = errno(err);
    if reads {
        BusError::Read {
            address,
            payload,
            source,
        }
    } else {
        BusError::Write {
            address,
            payload,
            source,
        }
    }
}

/// An opened I2C adapter
///
/// Drivers borrow the bus (`&mut I2cBus` is itself an `I2c`) or share it
/// through an `embedded-hal-bus` device. The device file is closed on drop.
pub struct I2cBus {
    dev: I2cdev,
    path: PathBuf,
}

impl fmt::Debug for I2cBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I2cBus")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl I2cBus {
    /// Open the adapter at `path` with the default timeout
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BusError> {
        Self::open_with_config(&BusConfig::new(path.as_ref()))
    }

    /// Open the adapter at `path` and apply `timeout` to every transaction
    pub fn open_with_timeout(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, BusError> {
        Self::open_with_config(&BusConfig::new(path.as_ref()).with_timeout(timeout))
    }

    pub fn open_with_config(config: &BusConfig) -> Result<Self, BusError> {
        let dev = I2cdev::new(&config.path).map_err(|err| BusError::Open {
            path: config.path.clone(),
            source: io_error(err),
        })?;

        let mut bus = Self {
            dev,
            path: config.path.clone(),
        };
        bus.set_timeout(config.timeout)?;
        debug!("opened {} (timeout {:?})", bus.path.display(), config.timeout);
        Ok(bus)
    }

    /// Path the bus was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Change the timeout of every following transaction
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), BusError> {
        // SAFETY: the descriptor is owned by `self.dev` and I2C_TIMEOUT
        // takes its argument by value
        unsafe { ioctl::i2c_set_timeout(self.dev.as_raw_fd(), timeout_units(timeout)) }
            .map_err(BusError::Timeout)?;
        Ok(())
    }
}

impl ErrorType for I2cBus {
    type Error = BusError;
}

impl i2c::I2c for I2cBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }

        let mut payload = Vec::new();
        let mut reads = false;
        for operation in operations.iter() {
            let len = match operation {
                Operation::Read(buf) => {
                    reads = true;
                    buf.len()
                }
                Operation::Write(bytes) => {
                    payload.extend_from_slice(bytes);
                    bytes.len()
                }
            };
            // One i2c_msg carries at most u16::MAX bytes
            if u16::try_from(len).is_err() {
                return Err(BusError::PayloadTooLong { len });
            }
        }

        self.dev
            .transaction(address, operations)
            .map_err(|err| transfer_error(address, HexBytes(payload), reads, err.inner()))
    }
}
