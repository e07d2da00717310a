use crate::command::AlterCommand;
use crate::command::args::{TextRef, Utf16Str};
use crate::command::codec::ByteCursor;
use crate::config::DecodeLimits;
use crate::error::AlterError;

pub const TASK_ALTER_TABLE: i32 = 1;

/// Parsed envelope; the table name and payload stay in the source buffer.
///
/// ```text
/// i32 task_type | i32 table_id | i32 L | L x u16 table_name | command
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WriterTask<'a> {
    pub task_type: i32,
    pub table_id: i32,
    pub table_name: Utf16Str<'a>,
    pub payload: &'a [u8],
}

impl<'a> WriterTask<'a> {
    pub fn parse(buf: &'a [u8], limits: &DecodeLimits) -> Result<Self, AlterError> {
        let mut cursor = ByteCursor::new(buf);
        let task_type = cursor.read_i32()?;
        let table_id = cursor.read_i32()?;
        let table_name = cursor.read_utf16(limits.max_table_name_units)?;
        Ok(Self {
            task_type,
            table_id,
            table_name,
            payload: cursor.rest(),
        })
    }

    /// Bytes taken by the envelope before the payload starts.
    pub fn header_len(&self) -> usize {
        3 * 4 + self.table_name.as_bytes().len()
    }
}

/// Writes an ALTER TABLE envelope for `cmd`'s table followed by the command.
pub fn encode_alter_task(cmd: &AlterCommand<'_>, out: &mut Vec<u8>) {
    let name = TextRef::Str(cmd.table_name());
    out.reserve(3 * 4 + name.len_units() * 2 + cmd.encoded_len());
    out.extend_from_slice(&TASK_ALTER_TABLE.to_le_bytes());
    out.extend_from_slice(&cmd.table_id().to_le_bytes());
    out.extend_from_slice(&(name.len_units() as i32).to_le_bytes());
    name.write_utf16_le(out);
    cmd.encode(out);
}

impl<'a> AlterCommand<'a> {
    /// Rebuilds this command from a parsed envelope. Returns the number of
    /// payload bytes consumed.
    pub fn decode_task(
        &mut self,
        task: &WriterTask<'a>,
        limits: &DecodeLimits,
    ) -> Result<usize, AlterError> {
        if task.task_type != TASK_ALTER_TABLE {
            self.clear();
            return Err(AlterError::Decode(format!(
                "unexpected task type {}, expected alter table",
                task.task_type
            )));
        }
        let consumed = self.decode_from(task.payload, limits)?;
        task.table_name.write_into(self.table_name_mut());
        self.set_table_id(task.table_id);
        Ok(consumed)
    }
}
