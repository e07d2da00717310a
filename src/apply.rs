use crate::catalog::partition::partition_name;
use crate::command::args::TextRef;
use crate::command::{AddColumnEntries, AlterAction, AlterCommand, RenamePairs};
use crate::error::{AlterError, PartitionFailure, StorageError};
use crate::writer::{AttachStatus, TableWriter};
use tracing::{debug, error};

/// Reusable buffers that buffer-backed text arguments are decoded into before
/// they are handed to the writer. Rename reads its old name into the primary
/// slot and its new name into the secondary slot.
#[derive(Debug, Default)]
pub struct NameScratch {
    primary: String,
    secondary: String,
}

impl NameScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            primary: String::with_capacity(capacity),
            secondary: String::with_capacity(capacity),
        }
    }

    pub fn primary(&mut self) -> &mut String {
        &mut self.primary
    }

    pub fn pair(&mut self) -> (&mut String, &mut String) {
        (&mut self.primary, &mut self.secondary)
    }
}

impl AlterCommand<'_> {
    /// Executes the command against `writer`, which must be owned by the
    /// calling thread.
    ///
    /// Drop and rename are refused with [`AlterError::StructureChangeRejected`]
    /// before the writer is touched unless `accept_structure_change` is set.
    /// Entries are applied in order and a failure stops the command; entries
    /// already applied stay applied.
    pub fn apply<W: TableWriter + ?Sized>(
        &self,
        writer: &mut W,
        accept_structure_change: bool,
    ) -> Result<(), AlterError> {
        self.apply_with(writer, accept_structure_change, &mut NameScratch::new())
    }

    /// [`AlterCommand::apply`] with caller-owned name buffers, so a consumer
    /// loop allocates nothing per command.
    pub fn apply_with<W: TableWriter + ?Sized>(
        &self,
        writer: &mut W,
        accept_structure_change: bool,
        scratch: &mut NameScratch,
    ) -> Result<(), AlterError> {
        if self.op().is_structural() && !accept_structure_change {
            return Err(AlterError::StructureChangeRejected);
        }
        let action = self.action()?;
        debug!(
            table = writer.table_name(),
            op = self.op().as_str(),
            position = self.position(),
            "alter: dispatch"
        );
        let position = self.position();
        match action {
            AlterAction::DoNothing => Ok(()),
            AlterAction::AddColumns(entries) => add_columns(writer, position, entries, scratch),
            AlterAction::AddIndex {
                column,
                index_value_block_size,
            } => add_index(writer, position, column, index_value_block_size, scratch),
            AlterAction::AttachPartitions(timestamps) => {
                attach_partitions(writer, position, timestamps)
            }
            AlterAction::DropPartitions(timestamps) => {
                drop_partitions(writer, position, timestamps)
            }
            AlterAction::SetSymbolCache { column, cached } => {
                set_symbol_cache(writer, position, column, cached, scratch)
            }
            AlterAction::DropColumns(names) => drop_columns(writer, position, names, scratch),
            AlterAction::RenameColumns(pairs) => rename_columns(writer, position, pairs, scratch),
            AlterAction::SetMaxUncommittedRows(rows) => {
                writer.set_max_uncommitted_rows(rows);
                Ok(())
            }
            AlterAction::SetCommitLag(micros) => {
                writer.set_commit_lag(micros);
                Ok(())
            }
        }
    }
}

fn add_columns<W: TableWriter + ?Sized>(
    writer: &mut W,
    position: i32,
    entries: AddColumnEntries<'_>,
    scratch: &mut NameScratch,
) -> Result<(), AlterError> {
    for entry in entries {
        let name = entry.name.resolve(scratch.primary());
        let Some(spec) = entry.spec() else {
            return Err(AlterError::InvalidColumnType {
                position,
                column: name.to_string(),
                code: entry.column_type_code,
            });
        };
        if let Err(e) = writer.add_column(name, &spec) {
            error!(
                table = writer.table_name(),
                column = name,
                errno = e.errno,
                error = %e.message,
                "could not add column"
            );
            return Err(AlterError::AddColumn {
                position,
                column: name.to_string(),
                errno: e.errno,
                message: e.message,
            });
        }
    }
    Ok(())
}

fn add_index<W: TableWriter + ?Sized>(
    writer: &mut W,
    position: i32,
    column: TextRef<'_>,
    index_value_block_size: i32,
    scratch: &mut NameScratch,
) -> Result<(), AlterError> {
    let name = column.resolve(scratch.primary());
    writer
        .add_index(name, index_value_block_size)
        .map_err(|e| {
            error!(
                table = writer.table_name(),
                column = name,
                errno = e.errno,
                error = %e.message,
                "could not add index"
            );
            AlterError::AddIndex {
                position,
                column: name.to_string(),
                errno: e.errno,
                message: e.message,
            }
        })
}

fn attach_partitions<W: TableWriter + ?Sized>(
    writer: &mut W,
    position: i32,
    timestamps: &[i64],
) -> Result<(), AlterError> {
    for &ts in timestamps {
        let status = writer
            .attach_partition(ts)
            .map_err(|e| table_alter_error(&*writer, position, ts, e))?;
        if status == AttachStatus::Ok {
            continue;
        }
        let partition = partition_name(writer.partition_by(), ts);
        let failure = match status {
            AttachStatus::Ok => continue,
            AttachStatus::MissingPartition => PartitionFailure::Missing { partition },
            AttachStatus::TableHasSymbols => PartitionFailure::TableHasSymbols,
            AttachStatus::PartitionEmpty => PartitionFailure::Empty { partition },
            AttachStatus::AlreadyAttached => PartitionFailure::AlreadyAttached { partition },
            AttachStatus::Other(status) => PartitionFailure::AttachFailed { partition, status },
        };
        return Err(AlterError::Partition { position, failure });
    }
    Ok(())
}

fn drop_partitions<W: TableWriter + ?Sized>(
    writer: &mut W,
    position: i32,
    timestamps: &[i64],
) -> Result<(), AlterError> {
    for &ts in timestamps {
        let removed = writer
            .remove_partition(ts)
            .map_err(|e| table_alter_error(&*writer, position, ts, e))?;
        if !removed {
            return Err(AlterError::Partition {
                position,
                failure: PartitionFailure::RemoveFailed {
                    partition: partition_name(writer.partition_by(), ts),
                },
            });
        }
    }
    Ok(())
}

fn table_alter_error<W: TableWriter + ?Sized>(
    writer: &W,
    position: i32,
    timestamp_micros: i64,
    e: StorageError,
) -> AlterError {
    error!(
        table = writer.table_name(),
        partition_ts = timestamp_micros,
        errno = e.errno,
        error = %e.message,
        "table '{}' could not be altered",
        writer.table_name()
    );
    AlterError::TableAlter {
        position,
        table: writer.table_name().to_string(),
        errno: e.errno,
        message: e.message,
    }
}

fn set_symbol_cache<W: TableWriter + ?Sized>(
    writer: &mut W,
    position: i32,
    column: TextRef<'_>,
    cached: bool,
    scratch: &mut NameScratch,
) -> Result<(), AlterError> {
    let name = column.resolve(scratch.primary());
    let Some(idx) = writer.column_index(name) else {
        return Err(AlterError::InvalidColumn {
            position,
            column: name.to_string(),
        });
    };
    writer.set_cache_flag(idx, cached);
    Ok(())
}

fn drop_columns<'c, W: TableWriter + ?Sized>(
    writer: &mut W,
    position: i32,
    names: impl Iterator<Item = TextRef<'c>>,
    scratch: &mut NameScratch,
) -> Result<(), AlterError> {
    for column in names {
        let name = column.resolve(scratch.primary());
        if writer.column_index(name).is_none() {
            return Err(AlterError::InvalidColumn {
                position,
                column: name.to_string(),
            });
        }
        if let Err(e) = writer.remove_column(name) {
            error!(
                table = writer.table_name(),
                column = name,
                errno = e.errno,
                error = %e.message,
                "cannot drop column"
            );
            return Err(AlterError::DropColumn {
                position,
                column: name.to_string(),
                errno: e.errno,
            });
        }
    }
    Ok(())
}

fn rename_columns<W: TableWriter + ?Sized>(
    writer: &mut W,
    position: i32,
    pairs: RenamePairs<'_>,
    scratch: &mut NameScratch,
) -> Result<(), AlterError> {
    for (old, new) in pairs {
        let (old_slot, new_slot) = scratch.pair();
        let old_name = old.resolve(old_slot);
        let new_name = new.resolve(new_slot);
        if let Err(e) = writer.rename_column(old_name, new_name) {
            error!(
                table = writer.table_name(),
                column = old_name,
                errno = e.errno,
                error = %e.message,
                "cannot rename column"
            );
            return Err(AlterError::RenameColumn {
                position,
                column: old_name.to_string(),
                errno: e.errno,
                message: e.message,
            });
        }
    }
    Ok(())
}
