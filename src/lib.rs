pub mod apply;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod offline;
pub mod recovery;
pub mod task;
pub mod wal;
pub mod writer;

pub use crate::apply::NameScratch;
pub use crate::catalog::TableMetadata;
pub use crate::catalog::partition::{PartitionBy, partition_name};
pub use crate::catalog::types::{ColumnSpec, ColumnType};
pub use crate::command::args::{TextArgs, TextRef, Utf16Str};
pub use crate::command::{AlterAction, AlterCommand, AlterOp};
pub use crate::config::{AlterConfig, DecodeLimits, RecoveryMode};
pub use crate::error::{AlterError, AlterErrorCode, PartitionFailure, StorageError};
pub use crate::task::{TASK_ALTER_TABLE, WriterTask, encode_alter_task};
pub use crate::writer::memory::MemoryTableWriter;
pub use crate::writer::{AttachStatus, TableWriter};
