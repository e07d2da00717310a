pub mod memory;

use crate::catalog::partition::PartitionBy;
use crate::catalog::types::ColumnSpec;
use crate::error::StorageError;

/// Outcome of attaching a partition directory to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachStatus {
    Ok,
    MissingPartition,
    TableHasSymbols,
    PartitionEmpty,
    AlreadyAttached,
    /// A status this build does not know about, kept as its raw code.
    Other(i32),
}

impl AttachStatus {
    pub fn code(self) -> i32 {
        match self {
            AttachStatus::Ok => 0,
            AttachStatus::MissingPartition => 1,
            AttachStatus::TableHasSymbols => 2,
            AttachStatus::PartitionEmpty => 3,
            AttachStatus::AlreadyAttached => 4,
            AttachStatus::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => AttachStatus::Ok,
            1 => AttachStatus::MissingPartition,
            2 => AttachStatus::TableHasSymbols,
            3 => AttachStatus::PartitionEmpty,
            4 => AttachStatus::AlreadyAttached,
            other => AttachStatus::Other(other),
        }
    }
}

/// Single-owner handle through which one thread mutates a table.
///
/// Alter commands only ever talk to storage through this trait; how columns
/// and partitions are laid out on disk is the implementor's business.
pub trait TableWriter {
    fn table_name(&self) -> &str;

    fn table_id(&self) -> i32;

    fn partition_by(&self) -> PartitionBy;

    fn column_index(&self, column_name: &str) -> Option<usize>;

    fn add_column(&mut self, column_name: &str, spec: &ColumnSpec) -> Result<(), StorageError>;

    fn add_index(
        &mut self,
        column_name: &str,
        index_value_block_size: i32,
    ) -> Result<(), StorageError>;

    fn attach_partition(&mut self, timestamp_micros: i64) -> Result<AttachStatus, StorageError>;

    /// `Ok(false)` when there was no such partition to remove.
    fn remove_partition(&mut self, timestamp_micros: i64) -> Result<bool, StorageError>;

    fn remove_column(&mut self, column_name: &str) -> Result<(), StorageError>;

    fn rename_column(&mut self, column_name: &str, new_name: &str) -> Result<(), StorageError>;

    fn set_cache_flag(&mut self, column_index: usize, cached: bool);

    fn set_commit_lag(&mut self, commit_lag_micros: i64);

    fn set_max_uncommitted_rows(&mut self, max_uncommitted_rows: i32);
}

#[cfg(test)]
mod tests {
    use super::AttachStatus;

    #[test]
    fn unknown_status_codes_survive_the_round_trip() {
        for code in 0..=4 {
            assert_eq!(AttachStatus::from_code(code).code(), code);
        }
        assert_eq!(AttachStatus::from_code(-7), AttachStatus::Other(-7));
        assert_eq!(AttachStatus::Other(-7).code(), -7);
    }
}
