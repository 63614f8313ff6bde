//! Block metadata threaded through matching.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Height and time of the block being executed.
///
/// Every value derived from it (settlement timestamps, price snapshots) is
/// identical on every validator, unlike wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl BlockInfo {
    #[must_use]
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }

    /// Block time as whole seconds since the UNIX epoch.
    #[must_use]
    pub fn timestamp_secs(&self) -> i64 {
        self.time.timestamp()
    }
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block:{}", self.height)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl BlockInfo {
    pub fn dummy(height: u64) -> Self {
        let time = DateTime::from_timestamp(1_700_000_000 + i64::try_from(height).unwrap_or(0), 0)
            .unwrap_or_default();
        Self { height, time }
    }
}
