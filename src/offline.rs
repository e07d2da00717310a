use crate::command::{AlterCommand, AlterOp};
use crate::config::AlterConfig;
use crate::error::AlterError;
use crate::task::WriterTask;
use crate::wal::frame::{FRAME_KIND_ALTER_TASK, Frame, FrameError, FrameReader};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One decoded command log frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub seq: u64,
    pub timestamp_micros: u64,
    pub table_id: i32,
    pub table_name: String,
    pub op: AlterOp,
    pub position: i32,
    pub numeric_args: Vec<i64>,
    pub text_args: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogCheckReport {
    pub ok: bool,
    pub frames: u64,
    pub commands: u64,
    pub last_seq: u64,
    pub truncated_tail: bool,
    pub violations: Vec<String>,
}

/// Decodes every frame of the log at `path`. Stops at the first frame that
/// does not decode.
pub fn dump_log(path: &Path, config: &AlterConfig) -> Result<Vec<LogEntry>, AlterError> {
    let mut reader = open_log(path, config)?;
    let mut entries = Vec::new();
    loop {
        match reader.next_frame() {
            Ok(Some(frame)) => entries.push(decode_entry(&frame, config)?),
            Ok(None) | Err(FrameError::Truncation) => break,
            Err(e) => return Err(frame_error(e)),
        }
    }
    Ok(entries)
}

/// Validates framing, sequence order and command decoding of the log at
/// `path`. Strict mode reports the first violation only; permissive mode
/// keeps going past undecodable commands.
pub fn check_log(path: &Path, config: &AlterConfig) -> Result<LogCheckReport, AlterError> {
    let mut reader = open_log(path, config)?;
    let mut report = LogCheckReport::default();
    loop {
        let frame = match reader.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(FrameError::Truncation) => {
                report.truncated_tail = true;
                break;
            }
            Err(FrameError::Corruption(reason)) => {
                report
                    .violations
                    .push(format!("corrupt frame after seq {}: {reason}", report.last_seq));
                break;
            }
            Err(FrameError::Io(e)) => return Err(AlterError::Io(std::io::Error::other(e))),
        };
        report.frames += 1;
        if frame.seq <= report.last_seq && report.frames > 1 {
            report.violations.push(format!(
                "seq {} does not follow {}",
                frame.seq, report.last_seq
            ));
        }
        report.last_seq = frame.seq;
        match decode_entry(&frame, config) {
            Ok(_) => report.commands += 1,
            Err(e) => report.violations.push(format!("seq {}: {e}", frame.seq)),
        }
        if config.strict_recovery() && !report.violations.is_empty() {
            break;
        }
    }
    report.ok = report.violations.is_empty();
    Ok(report)
}

fn open_log(path: &Path, config: &AlterConfig) -> Result<FrameReader<impl Read>, AlterError> {
    let file = File::open(path)?;
    Ok(FrameReader::with_max_body(
        BufReader::with_capacity(64 * 1024, file),
        config.max_frame_body_bytes,
    ))
}

fn decode_entry(frame: &Frame, config: &AlterConfig) -> Result<LogEntry, AlterError> {
    if frame.kind != FRAME_KIND_ALTER_TASK {
        return Err(AlterError::Decode(format!(
            "unknown frame kind {} at seq {}",
            frame.kind, frame.seq
        )));
    }
    let limits = config.decode_limits();
    let task = WriterTask::parse(&frame.payload, &limits)?;
    let mut cmd = AlterCommand::new();
    let consumed = cmd.decode_task(&task, &limits)?;
    if consumed != task.payload.len() {
        return Err(AlterError::Decode(format!(
            "{} trailing bytes after command",
            task.payload.len() - consumed
        )));
    }
    Ok(LogEntry {
        seq: frame.seq,
        timestamp_micros: frame.timestamp_micros,
        table_id: cmd.table_id(),
        table_name: cmd.table_name().to_string(),
        op: cmd.op(),
        position: cmd.position(),
        numeric_args: cmd.numeric_args().to_vec(),
        text_args: cmd.text_args().iter().map(|t| t.to_string()).collect(),
    })
}

fn frame_error(e: FrameError) -> AlterError {
    match e {
        FrameError::Io(msg) => AlterError::Io(std::io::Error::other(msg)),
        other => AlterError::Decode(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{check_log, dump_log};
    use crate::catalog::types::{ColumnSpec, ColumnType};
    use crate::command::{AlterCommand, AlterOp};
    use crate::config::AlterConfig;
    use crate::wal::frame::FrameWriter;
    use std::fs;
    use tempfile::tempdir;

    fn write_log(path: &std::path::Path) {
        let mut frames = FrameWriter::new(Vec::new());
        let mut cmd = AlterCommand::new();
        cmd.of_add_column(7, "quotes", 3)
            .add_column("bid", &ColumnSpec::new(ColumnType::Double));
        frames.append_command(1, 100, &cmd).expect("append");
        cmd.of_rename_column(9, "quotes", 3).rename("bid", "best_bid");
        frames.append_command(2, 200, &cmd).expect("append");
        fs::write(path, frames.into_inner()).expect("write log");
    }

    #[test]
    fn dump_decodes_every_frame() {
        let dir = tempdir().expect("temp");
        let path = dir.path().join("alter.log");
        write_log(&path);
        let entries = dump_log(&path, &AlterConfig::default()).expect("dump");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].op, AlterOp::AddColumn);
        assert_eq!(entries[0].table_name, "quotes");
        assert_eq!(entries[0].numeric_args, vec![10, 0, -1, -1, 0]);
        assert_eq!(entries[1].text_args, vec!["bid", "best_bid"]);
        let json = serde_json::to_string(&entries[1]).expect("json");
        assert!(json.contains("\"op\":\"RenameColumn\""), "{json}");
    }

    #[test]
    fn check_flags_truncated_tail_without_violation() {
        let dir = tempdir().expect("temp");
        let path = dir.path().join("alter.log");
        write_log(&path);
        let mut bytes = fs::read(&path).expect("read");
        bytes.truncate(bytes.len() - 3);
        fs::write(&path, bytes).expect("rewrite");

        let report = check_log(&path, &AlterConfig::default()).expect("check");
        assert!(report.ok);
        assert!(report.truncated_tail);
        assert_eq!(report.commands, 1);
    }

    #[test]
    fn check_reports_corruption() {
        let dir = tempdir().expect("temp");
        let path = dir.path().join("alter.log");
        write_log(&path);
        let mut bytes = fs::read(&path).expect("read");
        bytes[25] ^= 0x01;
        fs::write(&path, bytes).expect("rewrite");

        let report = check_log(&path, &AlterConfig::development()).expect("check");
        assert!(!report.ok);
        assert_eq!(report.frames, 0);
        assert!(report.violations[0].contains("corrupt frame"));
    }
}
