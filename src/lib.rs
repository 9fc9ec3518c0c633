//! Command-line front ends for the i2clib drivers
//!
//! The binaries in `src/bin` share their argument handling, logging setup
//! and output formatting through [`cli`].

pub mod cli;
