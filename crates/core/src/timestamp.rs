//! Microsecond-precision timestamp type
//!
//! Every `DataItem` carries an `event_time` derived from its id. The id
//! layout only resolves milliseconds, so derived timestamps always have a
//! zero sub-millisecond component.
//!
//! ## Usage
//!
//! Never expose raw arithmetic. Use explicit constructors:
//!
//! ```
//! use versakv_core::Timestamp;
//!
//! let now = Timestamp::now();
//! let from_millis = Timestamp::from_millis(1_000);
//! assert!(from_millis.is_before(now));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Microsecond-precision timestamp
///
/// Represents a point in time as microseconds since Unix epoch.
///
/// ## Invariants
///
/// - Timestamps are always non-negative (u64)
/// - Timestamps are comparable and orderable
/// - The zero timestamp represents Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Maximum representable timestamp
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Create a timestamp for the current moment
    ///
    /// Returns epoch (0) if the system clock is before Unix epoch.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as u64)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Create a timestamp from milliseconds since epoch
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Timestamp(millis.saturating_mul(1_000))
    }

    /// Get microseconds since Unix epoch
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Get milliseconds since Unix epoch (truncates)
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Check if this timestamp is before another
    #[inline]
    pub fn is_before(&self, other: Timestamp) -> bool {
        self.0 < other.0
    }

    /// Convert to a UTC calendar time
    ///
    /// Returns `None` for values beyond chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(i64::try_from(self.0).ok()?)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}us", self.0),
        }
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
