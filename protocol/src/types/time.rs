//! `time_point_sec`: whole seconds since the Unix epoch, UTC.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, Decode, Encode, Reader};

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A point in time with one-second resolution.
///
/// Wire form is a little-endian `u32`, so it runs out in 2106. JSON form is
/// `YYYY-MM-DDTHH:MM:SS` with no zone suffix, the way the node prints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TimePointSec(pub u32);

impl TimePointSec {
    pub const fn from_unix(seconds: u32) -> Self {
        Self(seconds)
    }

    pub const fn unix(&self) -> u32 {
        self.0
    }

    /// Truncates a chrono timestamp to whole seconds. Times outside the
    /// `u32` range clamp to its ends.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.timestamp().clamp(0, i64::from(u32::MAX)) as u32)
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        // Every u32 is a valid timestamp, so the fallback is unreachable.
        DateTime::from_timestamp(i64::from(self.0), 0).unwrap_or_default()
    }

    /// `self + by`, saturating at the end of the representable range.
    pub fn saturating_add(&self, by: Duration) -> Self {
        let secs = u32::try_from(by.as_secs()).unwrap_or(u32::MAX);
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format(FORMAT))
    }
}

impl FromStr for TimePointSec {
    type Err = chrono::ParseError;

    /// Accepts the node's format, with or without a trailing `Z`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_suffix('Z').unwrap_or(s);
        let naive = NaiveDateTime::parse_from_str(trimmed, FORMAT)?;
        Ok(Self::from_datetime(naive.and_utc()))
    }
}

impl Encode for TimePointSec {
    fn encode(&self, out: &mut Vec<u8>) {
        self.0.encode(out);
    }
}

impl Decode for TimePointSec {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self(u32::decode(reader)?))
    }
}

impl Serialize for TimePointSec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimePointSec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_timestamp() {
        let t: TimePointSec = "2016-04-06T08:29:27".parse().unwrap();
        assert_eq!(t.unix(), 1_459_931_367);
        assert_eq!(t.to_string(), "2016-04-06T08:29:27");
        assert_eq!(t.to_bytes(), hex::decode("e7c80457").unwrap());
    }

    #[test]
    fn test_trailing_z_is_accepted() {
        let a: TimePointSec = "2016-04-06T08:29:27Z".parse().unwrap();
        assert_eq!(a, TimePointSec(1_459_931_367));
        assert!("2016-04-06 08:29:27".parse::<TimePointSec>().is_err());
    }

    #[test]
    fn test_saturating_add() {
        let t = TimePointSec(100);
        assert_eq!(t.saturating_add(Duration::from_secs(30)), TimePointSec(130));
        assert_eq!(
            TimePointSec(u32::MAX - 1).saturating_add(Duration::from_secs(10)),
            TimePointSec(u32::MAX)
        );
    }

    #[test]
    fn test_json_shape() {
        let t = TimePointSec(0);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"1970-01-01T00:00:00\"");
    }
}
