use thiserror::Error;

/// Failure raised by a [`crate::writer::TableWriter`] operation.
///
/// `errno` is the storage layer's numeric error code (OS errno or an engine
/// specific code); it is carried through to the statement that issued the
/// command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("[{errno}] {message}")]
pub struct StorageError {
    pub errno: i32,
    pub message: String,
}

impl StorageError {
    pub fn new(errno: i32, message: impl Into<String>) -> Self {
        Self {
            errno,
            message: message.into(),
        }
    }
}

/// Why a partition could not be attached or removed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PartitionFailure {
    #[error("attach partition failed, folder '{partition}' does not exist")]
    Missing { partition: String },
    #[error("attaching partitions to tables with symbol columns not supported")]
    TableHasSymbols,
    #[error(
        "failed to attach partition '{partition}', data does not correspond to the partition folder or partition is empty"
    )]
    Empty { partition: String },
    #[error("failed to attach partition '{partition}', partition already attached to the table")]
    AlreadyAttached { partition: String },
    #[error("attach partition '{partition}' failed [status={status}]")]
    AttachFailed { partition: String, status: i32 },
    #[error("could not remove partition '{partition}'")]
    RemoveFailed { partition: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterErrorCode {
    InvalidCommand,
    Validation,
    StructureChangeRejected,
    Storage,
    PartitionStatus,
    Decode,
    Io,
}

impl AlterErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            AlterErrorCode::InvalidCommand => "invalid_command",
            AlterErrorCode::Validation => "validation",
            AlterErrorCode::StructureChangeRejected => "structure_change_rejected",
            AlterErrorCode::Storage => "storage",
            AlterErrorCode::PartitionStatus => "partition_status",
            AlterErrorCode::Decode => "decode",
            AlterErrorCode::Io => "io",
        }
    }
}

/// Error surfaced to the statement that issued an alter command.
///
/// Positioned variants carry the offset into the statement text the command
/// was compiled from.
#[derive(Debug, Error)]
pub enum AlterError {
    #[error("invalid alter table command [code={code}]")]
    InvalidCommand { code: u16 },
    #[error("[{position}] invalid column: {column}")]
    InvalidColumn { position: i32, column: String },
    #[error("[{position}] invalid column type [column={column}, code={code}]")]
    InvalidColumnType {
        position: i32,
        column: String,
        code: i64,
    },
    #[error("table structure change not accepted, retry later")]
    StructureChangeRejected,
    #[error("[{position}] could not add column [error={message}, errno={errno}]")]
    AddColumn {
        position: i32,
        column: String,
        errno: i32,
        message: String,
    },
    #[error("[{position}] {message}[errno={errno}]")]
    AddIndex {
        position: i32,
        column: String,
        errno: i32,
        message: String,
    },
    #[error("[{position}] cannot drop column. Try again later [errno={errno}]")]
    DropColumn {
        position: i32,
        column: String,
        errno: i32,
    },
    #[error("[{position}] cannot rename column \"{column}\"; {message}")]
    RenameColumn {
        position: i32,
        column: String,
        errno: i32,
        message: String,
    },
    #[error("[{position}] table '{table}' could not be altered: [{errno}] {message}")]
    TableAlter {
        position: i32,
        table: String,
        errno: i32,
        message: String,
    },
    #[error("[{position}] {failure}")]
    Partition {
        position: i32,
        failure: PartitionFailure,
    },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AlterError {
    pub fn code(&self) -> AlterErrorCode {
        match self {
            AlterError::InvalidCommand { .. } => AlterErrorCode::InvalidCommand,
            AlterError::InvalidColumn { .. } | AlterError::InvalidColumnType { .. } => {
                AlterErrorCode::Validation
            }
            AlterError::StructureChangeRejected => AlterErrorCode::StructureChangeRejected,
            AlterError::AddColumn { .. }
            | AlterError::AddIndex { .. }
            | AlterError::DropColumn { .. }
            | AlterError::RenameColumn { .. }
            | AlterError::TableAlter { .. } => AlterErrorCode::Storage,
            AlterError::Partition { .. } => AlterErrorCode::PartitionStatus,
            AlterError::Decode(_) => AlterErrorCode::Decode,
            AlterError::Io(_) => AlterErrorCode::Io,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }

    /// Offset into the statement text, when the error is tied to one.
    pub fn position(&self) -> Option<i32> {
        match self {
            AlterError::InvalidColumn { position, .. }
            | AlterError::InvalidColumnType { position, .. }
            | AlterError::AddColumn { position, .. }
            | AlterError::AddIndex { position, .. }
            | AlterError::DropColumn { position, .. }
            | AlterError::RenameColumn { position, .. }
            | AlterError::TableAlter { position, .. }
            | AlterError::Partition { position, .. } => Some(*position),
            AlterError::InvalidCommand { .. }
            | AlterError::StructureChangeRejected
            | AlterError::Decode(_)
            | AlterError::Io(_) => None,
        }
    }

    /// Underlying storage error code, for errors raised by the writer.
    pub fn errno(&self) -> Option<i32> {
        match self {
            AlterError::AddColumn { errno, .. }
            | AlterError::AddIndex { errno, .. }
            | AlterError::DropColumn { errno, .. }
            | AlterError::RenameColumn { errno, .. }
            | AlterError::TableAlter { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// True when the caller should resubmit the whole command later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AlterError::StructureChangeRejected | AlterError::DropColumn { .. }
        )
    }
}
