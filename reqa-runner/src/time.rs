// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamps for sessions and test records.
//!
//! Timestamps are stored as [`DateTime<FixedOffset>`] and persisted in a fixed format with
//! millisecond precision, for example `2014-06-01T12:30:00:250+02:00`.

use chrono::{DateTime, FixedOffset, Local, ParseError, SubsecRound};

/// The format used to persist timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S:%3f%:z";

/// A source of timestamps for lifecycle events.
///
/// Listeners ask the clock for the current time whenever an event arrives, and truncate it with
/// [`truncate_to_millis`]. The default is [`SystemClock`]; tests substitute a clock they control.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// A [`Clock`] backed by the local realtime clock, with millisecond precision.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        truncate_to_millis(Local::now().fixed_offset())
    }
}

/// Drops any precision finer than [`TIMESTAMP_FORMAT`] can persist.
pub fn truncate_to_millis(timestamp: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    timestamp.trunc_subsecs(3)
}

/// Formats a timestamp using [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a timestamp written in [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(input: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_str(input, TIMESTAMP_FORMAT)
}

/// Serde support for optional timestamps in [`TIMESTAMP_FORMAT`].
pub(crate) mod serde_timestamp_opt {
    use super::{TIMESTAMP_FORMAT, parse_timestamp};
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[expect(clippy::ref_option)]
    pub(crate) fn serialize<S>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        value
            .map(|value| {
                parse_timestamp(&value)
                    .map_err(|error| D::Error::custom(format!("invalid timestamp `{value}`: {error}")))
            })
            .transpose()
    }
}
