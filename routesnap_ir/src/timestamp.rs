use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// `chrono` format of snapshot timestamps (`2024-05-09_08:30`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M";

/// Snapshot timestamp with minute resolution.
///
/// The textual form is fixed width, so string order equals chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp '{0}', expected YYYY-MM-DD_HH:MM")]
pub struct TimestampError(pub String);

impl Timestamp {
    pub fn parse(text: &str) -> Result<Self, TimestampError> {
        let trimmed = text.trim();
        if !has_timestamp_shape(trimmed)
            || NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT).is_err()
        {
            return Err(TimestampError(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Current local time truncated to the minute.
    pub fn now() -> Self {
        Self(Local::now().format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(datetime.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn has_timestamp_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 16
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            10 => *byte == b'_',
            13 => *byte == b':',
            _ => byte.is_ascii_digit(),
        })
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = TimestampError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}
