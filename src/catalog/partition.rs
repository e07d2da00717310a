use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PARTITION_NAME: &str = "default";

/// Time-based partitioning scheme of a table. Partition timestamps are
/// microseconds since the Unix epoch, floored to the partition boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PartitionBy {
    Day,
    Month,
    Year,
    #[default]
    None,
    Hour,
}

impl PartitionBy {
    pub fn code(self) -> i32 {
        match self {
            PartitionBy::Day => 0,
            PartitionBy::Month => 1,
            PartitionBy::Year => 2,
            PartitionBy::None => 3,
            PartitionBy::Hour => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(PartitionBy::Day),
            1 => Some(PartitionBy::Month),
            2 => Some(PartitionBy::Year),
            3 => Some(PartitionBy::None),
            4 => Some(PartitionBy::Hour),
            _ => None,
        }
    }

    fn pattern(self) -> Option<&'static str> {
        match self {
            PartitionBy::Day => Some("%Y-%m-%d"),
            PartitionBy::Month => Some("%Y-%m"),
            PartitionBy::Year => Some("%Y"),
            PartitionBy::Hour => Some("%Y-%m-%dT%H"),
            PartitionBy::None => None,
        }
    }
}

/// Directory name of the partition holding `timestamp_micros`.
///
/// Timestamps outside chrono's representable range fall back to the raw
/// number so error messages never fail to render.
pub fn partition_name(partition_by: PartitionBy, timestamp_micros: i64) -> String {
    let Some(pattern) = partition_by.pattern() else {
        return DEFAULT_PARTITION_NAME.to_string();
    };
    match DateTime::<Utc>::from_timestamp_micros(timestamp_micros) {
        Some(ts) => ts.format(pattern).to_string(),
        None => timestamp_micros.to_string(),
    }
}
