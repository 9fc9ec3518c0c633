//! Linux platform layer for i2clib
//!
//! Provides the pieces the core drivers are generic over:
//!
//! - [`I2cBus`]: an `embedded_hal::i2c::I2c` implementation over a
//!   `/dev/i2c-*` character device, one `I2C_RDWR` ioctl per transaction
//! - [`SleepDelay`]: a `DelayNs` that puts the calling thread to sleep
//! - [`SystemClock`]: wall-clock timestamps for measurements

pub mod bus;
pub mod clock;
pub mod config;
pub mod delay;

pub use bus::{BusError, HexBytes, I2cBus};
pub use clock::SystemClock;
pub use config::{BusConfig, DEFAULT_TIMEOUT};
pub use delay::SleepDelay;
