use crate::catalog::partition::PartitionBy;
use crate::catalog::types::ColumnSpec;
use crate::catalog::{ColumnMeta, TableMetadata};
use crate::error::StorageError;
use crate::writer::{AttachStatus, TableWriter};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

pub const ERRNO_NOT_FOUND: i32 = 2;
pub const ERRNO_EXISTS: i32 = 17;
pub const ERRNO_INVALID: i32 = 22;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterCall {
    AddColumn { name: String, spec: ColumnSpec },
    AddIndex { name: String, index_value_block_size: i32 },
    AttachPartition(i64),
    RemovePartition(i64),
    RemoveColumn(String),
    RenameColumn { from: String, to: String },
    SetCacheFlag { column_index: usize, cached: bool },
    SetCommitLag(i64),
    SetMaxUncommittedRows(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriterOp {
    AddColumn,
    AddIndex,
    AttachPartition,
    RemovePartition,
    RemoveColumn,
    RenameColumn,
}

/// Shared view of a writer's call history; stays readable after the writer
/// has moved to another thread.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<WriterCall>>>,
}

impl CallLog {
    fn record(&self, call: WriterCall) {
        self.calls.lock().push(call);
    }

    pub fn snapshot(&self) -> Vec<WriterCall> {
        self.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// In-memory [`TableWriter`] that records every mutating call.
#[derive(Debug)]
pub struct MemoryTableWriter {
    metadata: TableMetadata,
    attached: BTreeSet<i64>,
    /// Partition directories present on disk but not attached, with their
    /// row counts.
    detached: BTreeMap<i64, u64>,
    failures: HashMap<(WriterOp, String), StorageError>,
    forced_status: HashMap<i64, AttachStatus>,
    calls: CallLog,
}

impl MemoryTableWriter {
    pub fn new(table_name: impl Into<String>, table_id: i32, partition_by: PartitionBy) -> Self {
        Self::from_metadata(TableMetadata::new(table_name, table_id, partition_by))
    }

    pub fn from_metadata(metadata: TableMetadata) -> Self {
        Self {
            metadata,
            attached: BTreeSet::new(),
            detached: BTreeMap::new(),
            failures: HashMap::new(),
            forced_status: HashMap::new(),
            calls: CallLog::default(),
        }
    }

    pub fn with_column(mut self, name: &str, spec: ColumnSpec) -> Self {
        self.metadata.columns.push(ColumnMeta::new(name, &spec));
        self
    }

    pub fn with_attached_partition(mut self, timestamp_micros: i64) -> Self {
        self.attached.insert(timestamp_micros);
        self
    }

    /// Places a detached partition directory with `rows` rows next to the
    /// table, ready to be attached.
    pub fn stage_partition(&mut self, timestamp_micros: i64, rows: u64) {
        self.detached.insert(timestamp_micros, rows);
    }

    /// Makes the next `op` against `target` (a column name, or a partition
    /// timestamp rendered with `to_string`) fail once with `err`.
    pub fn inject_failure(&mut self, op: WriterOp, target: impl Into<String>, err: StorageError) {
        self.failures.insert((op, target.into()), err);
    }

    /// Makes the next attach of `timestamp_micros` report `status` once,
    /// without touching partition state.
    pub fn inject_status(&mut self, timestamp_micros: i64, status: AttachStatus) {
        self.forced_status.insert(timestamp_micros, status);
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    pub fn attached_partitions(&self) -> Vec<i64> {
        self.attached.iter().copied().collect()
    }

    pub fn detached_partitions(&self) -> Vec<i64> {
        self.detached.keys().copied().collect()
    }

    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn calls(&self) -> Vec<WriterCall> {
        self.calls.snapshot()
    }

    fn injected(&mut self, op: WriterOp, target: &str) -> Result<(), StorageError> {
        match self.failures.remove(&(op, target.to_string())) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn require_column(&self, column_name: &str) -> Result<usize, StorageError> {
        self.metadata.column_index(column_name).ok_or_else(|| {
            StorageError::new(
                ERRNO_NOT_FOUND,
                format!("column '{column_name}' does not exist"),
            )
        })
    }
}

impl TableWriter for MemoryTableWriter {
    fn table_name(&self) -> &str {
        &self.metadata.table_name
    }

    fn table_id(&self) -> i32 {
        self.metadata.table_id
    }

    fn partition_by(&self) -> PartitionBy {
        self.metadata.partition_by
    }

    fn column_index(&self, column_name: &str) -> Option<usize> {
        self.metadata.column_index(column_name)
    }

    fn add_column(&mut self, column_name: &str, spec: &ColumnSpec) -> Result<(), StorageError> {
        self.calls.record(WriterCall::AddColumn {
            name: column_name.to_string(),
            spec: *spec,
        });
        self.injected(WriterOp::AddColumn, column_name)?;
        if self.metadata.column_index(column_name).is_some() {
            return Err(StorageError::new(
                ERRNO_EXISTS,
                format!("duplicate column name: {column_name}"),
            ));
        }
        if spec.indexed && !spec.column_type.is_symbol() {
            return Err(StorageError::new(
                ERRNO_INVALID,
                format!("only symbol columns can be indexed: {column_name}"),
            ));
        }
        self.metadata
            .columns
            .push(ColumnMeta::new(column_name, spec));
        Ok(())
    }

    fn add_index(
        &mut self,
        column_name: &str,
        index_value_block_size: i32,
    ) -> Result<(), StorageError> {
        self.calls.record(WriterCall::AddIndex {
            name: column_name.to_string(),
            index_value_block_size,
        });
        self.injected(WriterOp::AddIndex, column_name)?;
        let idx = self.require_column(column_name)?;
        let column = &mut self.metadata.columns[idx];
        if !column.column_type.is_symbol() {
            return Err(StorageError::new(
                ERRNO_INVALID,
                format!("column '{column_name}' is not a symbol column"),
            ));
        }
        if column.indexed {
            return Err(StorageError::new(
                ERRNO_EXISTS,
                format!("column '{column_name}' is already indexed"),
            ));
        }
        column.indexed = true;
        column.index_value_block_capacity = index_value_block_size;
        Ok(())
    }

    fn attach_partition(&mut self, timestamp_micros: i64) -> Result<AttachStatus, StorageError> {
        self.calls
            .record(WriterCall::AttachPartition(timestamp_micros));
        self.injected(WriterOp::AttachPartition, &timestamp_micros.to_string())?;
        if let Some(status) = self.forced_status.remove(&timestamp_micros) {
            return Ok(status);
        }
        if self.metadata.has_symbol_columns() {
            return Ok(AttachStatus::TableHasSymbols);
        }
        if self.attached.contains(&timestamp_micros) {
            return Ok(AttachStatus::AlreadyAttached);
        }
        match self.detached.get(&timestamp_micros) {
            None => Ok(AttachStatus::MissingPartition),
            Some(0) => Ok(AttachStatus::PartitionEmpty),
            Some(_) => {
                self.detached.remove(&timestamp_micros);
                self.attached.insert(timestamp_micros);
                Ok(AttachStatus::Ok)
            }
        }
    }

    fn remove_partition(&mut self, timestamp_micros: i64) -> Result<bool, StorageError> {
        self.calls
            .record(WriterCall::RemovePartition(timestamp_micros));
        self.injected(WriterOp::RemovePartition, &timestamp_micros.to_string())?;
        Ok(self.attached.remove(&timestamp_micros))
    }

    fn remove_column(&mut self, column_name: &str) -> Result<(), StorageError> {
        self.calls
            .record(WriterCall::RemoveColumn(column_name.to_string()));
        self.injected(WriterOp::RemoveColumn, column_name)?;
        let idx = self.require_column(column_name)?;
        self.metadata.columns.remove(idx);
        Ok(())
    }

    fn rename_column(&mut self, column_name: &str, new_name: &str) -> Result<(), StorageError> {
        self.calls.record(WriterCall::RenameColumn {
            from: column_name.to_string(),
            to: new_name.to_string(),
        });
        self.injected(WriterOp::RenameColumn, column_name)?;
        let idx = self.require_column(column_name)?;
        if let Some(existing) = self.metadata.column_index(new_name)
            && existing != idx
        {
            return Err(StorageError::new(
                ERRNO_EXISTS,
                format!("column '{new_name}' already exists"),
            ));
        }
        self.metadata.columns[idx].name = new_name.to_string();
        Ok(())
    }

    fn set_cache_flag(&mut self, column_index: usize, cached: bool) {
        self.calls.record(WriterCall::SetCacheFlag {
            column_index,
            cached,
        });
        if let Some(column) = self.metadata.columns.get_mut(column_index) {
            column.symbol_cache = cached;
        }
    }

    fn set_commit_lag(&mut self, commit_lag_micros: i64) {
        self.calls.record(WriterCall::SetCommitLag(commit_lag_micros));
        self.metadata.commit_lag_micros = commit_lag_micros;
    }

    fn set_max_uncommitted_rows(&mut self, max_uncommitted_rows: i32) {
        self.calls
            .record(WriterCall::SetMaxUncommittedRows(max_uncommitted_rows));
        self.metadata.max_uncommitted_rows = max_uncommitted_rows;
    }
}
