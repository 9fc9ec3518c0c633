//! Bus configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Transaction timeout applied when a bus is opened
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Where the bus lives and how long a transaction may take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Bus device, e.g. `/dev/i2c-1`
    pub path: PathBuf,
    /// Transaction timeout, rounded up to the kernel's 10 ms unit
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl BusConfig {
    /// Configuration for `path` with the default timeout
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let config = BusConfig::new("/dev/i2c-1");
        assert_eq!(config.timeout, Duration::from_millis(100));
        assert_eq!(config.path, PathBuf::from("/dev/i2c-1"));

        let config = config.with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout, Duration::from_millis(250));
    }
}
