//! Blocking delay on the calling thread.

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// `DelayNs` implementation sleeping the calling thread
///
/// The wait can last longer than requested, never shorter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepDelay;

impl DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_delay_waits_at_least_requested_time() {
        let start = Instant::now();
        SleepDelay.delay_us(2_000);
        assert!(start.elapsed() >= Duration::from_millis(2));
    }
}
