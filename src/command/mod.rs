pub mod args;
pub mod codec;

use crate::catalog::types::{ColumnSpec, ColumnType};
use crate::command::args::{TextArgs, TextIter, TextRef};
use crate::error::AlterError;
use serde::{Deserialize, Serialize};
use std::slice::ChunksExact;

/// Number of numeric arguments one ADD_COLUMN entry occupies.
pub const ADD_COLUMN_NUMERIC_ARITY: usize = 5;

/// Opcode selecting which structural mutation a command performs. The
/// discriminant is the 16-bit code written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum AlterOp {
    DoNothing = 1,
    AddColumn = 2,
    DropPartition = 3,
    AttachPartition = 4,
    AddIndex = 5,
    AddSymbolCache = 6,
    RemoveSymbolCache = 7,
    DropColumn = 8,
    RenameColumn = 9,
    SetMaxUncommittedRows = 10,
    SetCommitLag = 11,
}

impl AlterOp {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            1 => AlterOp::DoNothing,
            2 => AlterOp::AddColumn,
            3 => AlterOp::DropPartition,
            4 => AlterOp::AttachPartition,
            5 => AlterOp::AddIndex,
            6 => AlterOp::AddSymbolCache,
            7 => AlterOp::RemoveSymbolCache,
            8 => AlterOp::DropColumn,
            9 => AlterOp::RenameColumn,
            10 => AlterOp::SetMaxUncommittedRows,
            11 => AlterOp::SetCommitLag,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlterOp::DoNothing => "do_nothing",
            AlterOp::AddColumn => "add_column",
            AlterOp::DropPartition => "drop_partition",
            AlterOp::AttachPartition => "attach_partition",
            AlterOp::AddIndex => "add_index",
            AlterOp::AddSymbolCache => "add_symbol_cache",
            AlterOp::RemoveSymbolCache => "remove_symbol_cache",
            AlterOp::DropColumn => "drop_column",
            AlterOp::RenameColumn => "rename_column",
            AlterOp::SetMaxUncommittedRows => "set_max_uncommitted_rows",
            AlterOp::SetCommitLag => "set_commit_lag",
        }
    }

    /// Ops that change the column set or column names.
    pub fn is_structural(self) -> bool {
        matches!(self, AlterOp::DropColumn | AlterOp::RenameColumn)
    }

    /// (numeric, text) arguments consumed per entry.
    pub fn arity(self) -> (usize, usize) {
        match self {
            AlterOp::DoNothing => (0, 0),
            AlterOp::AddColumn => (ADD_COLUMN_NUMERIC_ARITY, 1),
            AlterOp::DropPartition | AlterOp::AttachPartition => (1, 0),
            AlterOp::AddIndex => (1, 1),
            AlterOp::AddSymbolCache | AlterOp::RemoveSymbolCache => (0, 1),
            AlterOp::DropColumn => (0, 1),
            AlterOp::RenameColumn => (0, 2),
            AlterOp::SetMaxUncommittedRows | AlterOp::SetCommitLag => (1, 0),
        }
    }

    fn single_entry(self) -> bool {
        matches!(
            self,
            AlterOp::AddIndex
                | AlterOp::AddSymbolCache
                | AlterOp::RemoveSymbolCache
                | AlterOp::SetMaxUncommittedRows
                | AlterOp::SetCommitLag
        )
    }
}

impl std::fmt::Display for AlterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reusable alter-table command.
///
/// Built on the producer side through one of the `of_*` methods, flattened
/// with [`AlterCommand::encode`], and rebuilt on the writer thread with
/// [`AlterCommand::decode_from`], where text arguments become views into the
/// decoded buffer (hence the `'a`).
#[derive(Debug, Clone)]
pub struct AlterCommand<'a> {
    op: AlterOp,
    table_name: String,
    table_id: i32,
    position: i32,
    longs: Vec<i64>,
    texts: TextArgs<'a>,
}

impl Default for AlterCommand<'_> {
    fn default() -> Self {
        Self {
            op: AlterOp::DoNothing,
            table_name: String::new(),
            table_id: 0,
            position: 0,
            longs: Vec::new(),
            texts: TextArgs::default(),
        }
    }
}

impl<'a> AlterCommand<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the opcode to DO_NOTHING and empties both argument lists. The
    /// table identity is left in place.
    pub fn clear(&mut self) {
        self.op = AlterOp::DoNothing;
        self.position = 0;
        self.longs.clear();
        self.texts.clear();
    }

    pub fn op(&self) -> AlterOp {
        self.op
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn table_id(&self) -> i32 {
        self.table_id
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn numeric_args(&self) -> &[i64] {
        &self.longs
    }

    pub fn text_args(&self) -> &TextArgs<'a> {
        &self.texts
    }

    pub fn set_table(&mut self, table_name: &str, table_id: i32) {
        self.table_name.clear();
        self.table_name.push_str(table_name);
        self.table_id = table_id;
    }

    pub(crate) fn table_name_mut(&mut self) -> &mut String {
        &mut self.table_name
    }

    pub(crate) fn set_table_id(&mut self, table_id: i32) {
        self.table_id = table_id;
    }

    fn begin(&mut self, op: AlterOp, position: i32, table_name: &str, table_id: i32) {
        self.clear();
        self.op = op;
        self.position = position;
        self.set_table(table_name, table_id);
    }

    pub fn of_do_nothing(&mut self) -> &mut Self {
        self.clear();
        self.table_name.clear();
        self
    }

    pub fn of_add_column(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
    ) -> AddColumnBuilder<'_, 'a> {
        self.begin(AlterOp::AddColumn, position, table_name, table_id);
        AddColumnBuilder { cmd: self }
    }

    pub fn of_add_index(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
        column_name: &str,
        index_value_block_size: i32,
    ) -> &mut Self {
        self.begin(AlterOp::AddIndex, position, table_name, table_id);
        self.texts.push(column_name);
        self.longs.push(i64::from(index_value_block_size));
        self
    }

    pub fn of_attach_partition(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
    ) -> PartitionBuilder<'_, 'a> {
        self.begin(AlterOp::AttachPartition, position, table_name, table_id);
        PartitionBuilder { cmd: self }
    }

    pub fn of_drop_partition(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
    ) -> PartitionBuilder<'_, 'a> {
        self.begin(AlterOp::DropPartition, position, table_name, table_id);
        PartitionBuilder { cmd: self }
    }

    pub fn of_cache_symbol(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
        column_name: &str,
    ) -> &mut Self {
        self.begin(AlterOp::AddSymbolCache, position, table_name, table_id);
        self.texts.push(column_name);
        self
    }

    pub fn of_remove_cache_symbol(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
        column_name: &str,
    ) -> &mut Self {
        self.begin(AlterOp::RemoveSymbolCache, position, table_name, table_id);
        self.texts.push(column_name);
        self
    }

    pub fn of_drop_column(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
    ) -> DropColumnBuilder<'_, 'a> {
        self.begin(AlterOp::DropColumn, position, table_name, table_id);
        DropColumnBuilder { cmd: self }
    }

    pub fn of_rename_column(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
    ) -> RenameColumnBuilder<'_, 'a> {
        self.begin(AlterOp::RenameColumn, position, table_name, table_id);
        RenameColumnBuilder { cmd: self }
    }

    pub fn of_set_max_uncommitted_rows(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
        max_uncommitted_rows: i32,
    ) -> &mut Self {
        self.begin(AlterOp::SetMaxUncommittedRows, position, table_name, table_id);
        self.longs.push(i64::from(max_uncommitted_rows));
        self
    }

    pub fn of_set_commit_lag(
        &mut self,
        position: i32,
        table_name: &str,
        table_id: i32,
        commit_lag_micros: i64,
    ) -> &mut Self {
        self.begin(AlterOp::SetCommitLag, position, table_name, table_id);
        self.longs.push(commit_lag_micros);
        self
    }

    /// Checks both argument lists hold whole entries for the active opcode.
    pub fn check_arity(&self) -> Result<(), AlterError> {
        let (numeric_arity, text_arity) = self.op.arity();
        let numeric = self.longs.len();
        let text = self.texts.len();
        let entries = if numeric_arity > 0 {
            numeric / numeric_arity
        } else if text_arity > 0 {
            text / text_arity
        } else {
            0
        };
        let whole = numeric == entries * numeric_arity && text == entries * text_arity;
        if !whole || (self.op.single_entry() && entries != 1) {
            return Err(AlterError::Decode(format!(
                "{} expects {numeric_arity} numeric and {text_arity} text args per entry, got {numeric} and {text}",
                self.op
            )));
        }
        self.check_int_args()
    }

    /// Numeric slots that the writer takes as 32-bit values must fit in one.
    fn check_int_args(&self) -> Result<(), AlterError> {
        let int_slots: &[usize] = match self.op {
            AlterOp::AddColumn => &[1, 4],
            AlterOp::AddIndex | AlterOp::SetMaxUncommittedRows => &[0],
            _ => return Ok(()),
        };
        let stride = self.op.arity().0;
        for (entry, params) in self.longs.chunks_exact(stride).enumerate() {
            for &slot in int_slots {
                let value = params[slot];
                if i32::try_from(value).is_err() {
                    return Err(AlterError::Decode(format!(
                        "{} entry {entry} arg {slot} out of 32-bit range: {value}",
                        self.op
                    )));
                }
            }
        }
        Ok(())
    }

    /// Typed view of the arguments for the active opcode.
    pub fn action(&self) -> Result<AlterAction<'_>, AlterError> {
        self.check_arity()?;
        let first_text = || self.texts.get(0).unwrap_or(TextRef::Str(""));
        let first_long = self.longs.first().copied().unwrap_or_default();
        Ok(match self.op {
            AlterOp::DoNothing => AlterAction::DoNothing,
            AlterOp::AddColumn => AlterAction::AddColumns(AddColumnEntries {
                longs: self.longs.chunks_exact(ADD_COLUMN_NUMERIC_ARITY),
                names: self.texts.iter(),
            }),
            AlterOp::AddIndex => AlterAction::AddIndex {
                column: first_text(),
                index_value_block_size: narrow(first_long),
            },
            AlterOp::AttachPartition => AlterAction::AttachPartitions(&self.longs),
            AlterOp::DropPartition => AlterAction::DropPartitions(&self.longs),
            AlterOp::AddSymbolCache => AlterAction::SetSymbolCache {
                column: first_text(),
                cached: true,
            },
            AlterOp::RemoveSymbolCache => AlterAction::SetSymbolCache {
                column: first_text(),
                cached: false,
            },
            AlterOp::DropColumn => AlterAction::DropColumns(self.texts.iter()),
            AlterOp::RenameColumn => AlterAction::RenameColumns(RenamePairs {
                names: self.texts.iter(),
            }),
            AlterOp::SetMaxUncommittedRows => {
                AlterAction::SetMaxUncommittedRows(narrow(first_long))
            }
            AlterOp::SetCommitLag => AlterAction::SetCommitLag(first_long),
        })
    }
}

/// Range already checked by `check_int_args`.
fn narrow(value: i64) -> i32 {
    i32::try_from(value).unwrap_or_default()
}

/// Builder view exposed while an ADD_COLUMN command is being built.
pub struct AddColumnBuilder<'c, 'a> {
    cmd: &'c mut AlterCommand<'a>,
}

impl<'a> AddColumnBuilder<'_, 'a> {
    pub fn add_column(&mut self, column_name: &str, spec: &ColumnSpec) -> &mut Self {
        let cmd = &mut *self.cmd;
        cmd.texts.push(column_name);
        cmd.longs.push(i64::from(spec.column_type.code()));
        cmd.longs.push(i64::from(spec.symbol_capacity));
        cmd.longs.push(if spec.symbol_cache { 1 } else { -1 });
        cmd.longs.push(if spec.indexed { 1 } else { -1 });
        cmd.longs.push(i64::from(spec.index_value_block_capacity));
        self
    }

    pub fn command(&self) -> &AlterCommand<'a> {
        &*self.cmd
    }
}

/// Builder view for ATTACH_PARTITION and DROP_PARTITION.
pub struct PartitionBuilder<'c, 'a> {
    cmd: &'c mut AlterCommand<'a>,
}

impl<'a> PartitionBuilder<'_, 'a> {
    pub fn partition(&mut self, timestamp_micros: i64) -> &mut Self {
        self.cmd.longs.push(timestamp_micros);
        self
    }

    pub fn command(&self) -> &AlterCommand<'a> {
        &*self.cmd
    }
}

pub struct DropColumnBuilder<'c, 'a> {
    cmd: &'c mut AlterCommand<'a>,
}

impl<'a> DropColumnBuilder<'_, 'a> {
    pub fn column(&mut self, column_name: &str) -> &mut Self {
        self.cmd.texts.push(column_name);
        self
    }

    pub fn command(&self) -> &AlterCommand<'a> {
        &*self.cmd
    }
}

/// Each rename occupies two consecutive text slots: old name, then new name.
pub struct RenameColumnBuilder<'c, 'a> {
    cmd: &'c mut AlterCommand<'a>,
}

impl<'a> RenameColumnBuilder<'_, 'a> {
    pub fn rename(&mut self, column_name: &str, new_name: &str) -> &mut Self {
        self.cmd.texts.push(column_name);
        self.cmd.texts.push(new_name);
        self
    }

    pub fn command(&self) -> &AlterCommand<'a> {
        &*self.cmd
    }
}

/// Arguments of one command, grouped per opcode.
#[derive(Debug, Clone)]
pub enum AlterAction<'c> {
    DoNothing,
    AddColumns(AddColumnEntries<'c>),
    AddIndex {
        column: TextRef<'c>,
        index_value_block_size: i32,
    },
    AttachPartitions(&'c [i64]),
    DropPartitions(&'c [i64]),
    SetSymbolCache {
        column: TextRef<'c>,
        cached: bool,
    },
    DropColumns(TextIter<'c>),
    RenameColumns(RenamePairs<'c>),
    SetMaxUncommittedRows(i32),
    SetCommitLag(i64),
}

#[derive(Debug, Clone, Copy)]
pub struct AddColumnEntry<'c> {
    pub name: TextRef<'c>,
    pub column_type_code: i64,
    pub symbol_capacity: i32,
    pub symbol_cache: bool,
    pub indexed: bool,
    pub index_value_block_capacity: i32,
}

impl AddColumnEntry<'_> {
    /// `None` when the type code is not a known [`ColumnType`].
    pub fn spec(&self) -> Option<ColumnSpec> {
        Some(ColumnSpec {
            column_type: ColumnType::from_code(self.column_type_code)?,
            symbol_capacity: self.symbol_capacity,
            symbol_cache: self.symbol_cache,
            indexed: self.indexed,
            index_value_block_capacity: self.index_value_block_capacity,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AddColumnEntries<'c> {
    longs: ChunksExact<'c, i64>,
    names: TextIter<'c>,
}

impl<'c> Iterator for AddColumnEntries<'c> {
    type Item = AddColumnEntry<'c>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names.next()?;
        let params = self.longs.next()?;
        Some(AddColumnEntry {
            name,
            column_type_code: params[0],
            symbol_capacity: narrow(params[1]),
            symbol_cache: params[2] > 0,
            indexed: params[3] > 0,
            index_value_block_capacity: narrow(params[4]),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RenamePairs<'c> {
    names: TextIter<'c>,
}

impl<'c> Iterator for RenamePairs<'c> {
    type Item = (TextRef<'c>, TextRef<'c>);

    fn next(&mut self) -> Option<Self::Item> {
        let old = self.names.next()?;
        let new = self.names.next()?;
        Some((old, new))
    }
}
