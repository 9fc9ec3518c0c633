//! Register-pointer framing shared by the drivers.
//!
//! All supported chips select a register (or command) with a one-byte
//! write and then clock out a fixed number of bytes, in a single
//! write-then-read transaction.

use embedded_hal::i2c::I2c;

use crate::error::Error;

/// Read `N` bytes starting at `register` in one write-then-read transaction
pub(crate) fn read_registers<I: I2c, const N: usize>(
    i2c: &mut I,
    address: u8,
    register: u8,
) -> Result<[u8; N], Error<I::Error>> {
    let mut buffer = [0u8; N];
    i2c.write_read(address, &[register], &mut buffer)
        .map_err(Error::Bus)?;
    Ok(buffer)
}

/// Write `bytes` (register pointer first) in one write transaction
pub(crate) fn write_registers<I: I2c>(
    i2c: &mut I,
    address: u8,
    bytes: &[u8],
) -> Result<(), Error<I::Error>> {
    i2c.write(address, bytes).map_err(Error::Bus)
}
