//! Coordinate and timestamp value types
//!
//! Plain values with conversion helpers, no behaviour beyond that.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Why a latitude/longitude pair was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CoordError {
    #[error("coordinates must be finite numbers")]
    NotFinite,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A geographic position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Wire order: `[lat, lng]`
    pub fn as_pair(&self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

/// Build a timestamp from whole Unix seconds
pub fn timestamp_from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Whole Unix seconds of a timestamp.
///
/// Sub-second precision is dropped by truncating division, so
/// `-1.5s` becomes `-1`, not `-2`.
pub fn unix_seconds(at: &DateTime<Utc>) -> i64 {
    at.timestamp_millis() / 1000
}

/// Parse a backend-supplied time value.
///
/// Accepts integer seconds, fractional seconds, or an RFC 3339 string.
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, String> {
    match value {
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return timestamp_from_unix(secs)
                    .ok_or_else(|| format!("{} seconds is out of range", secs));
            }
            let secs = n
                .as_f64()
                .filter(|f| f.is_finite())
                .ok_or_else(|| format!("{} is not a usable timestamp", n))?;
            let whole = secs.floor();
            if whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
                return Err(format!("{} seconds is out of range", secs));
            }
            let nanos = ((secs - whole) * 1_000_000_000.0) as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
                .ok_or_else(|| format!("{} seconds is out of range", secs))
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("cannot parse {:?} as a timestamp: {}", s, e)),
        other => Err(format!("expected a number or string, found {}", kind_of(other))),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
