//! Timestamp cursor for the long-polling protocol

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Point in time from which the next poll asks for updates
///
/// Seconds since the Unix epoch. The server returns fractional values, so
/// the cursor is stored as `f64` and echoed back without rounding.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(f64);

impl Cursor {
    /// Create a cursor from a raw timestamp
    pub fn new(timestamp: f64) -> Self {
        Self(timestamp)
    }

    /// Cursor for the current wall-clock time
    pub fn now() -> Self {
        let now = Utc::now();
        Self(now.timestamp_micros() as f64 / 1_000_000.0)
    }

    /// The raw timestamp value
    pub fn timestamp(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f64> for Cursor {
    fn from(timestamp: f64) -> Self {
        Self(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_fraction() {
        assert_eq!(Cursor::new(1555493856.3452).to_string(), "1555493856.3452");
        assert_eq!(Cursor::new(1000.0).to_string(), "1000");
    }

    #[test]
    fn test_now_is_recent() {
        let cursor = Cursor::now();
        let expected = Utc::now().timestamp() as f64;
        assert!((cursor.timestamp() - expected).abs() < 5.0);
    }

    #[test]
    fn test_deserialize_integer_and_float() {
        let a: Cursor = serde_json::from_str("1000").unwrap();
        let b: Cursor = serde_json::from_str("1000.5").unwrap();
        assert_eq!(a, Cursor::new(1000.0));
        assert_eq!(b, Cursor::new(1000.5));
    }
}
