use crate::apply::NameScratch;
use crate::command::AlterCommand;
use crate::config::{AlterConfig, DecodeLimits};
use crate::error::AlterError;
use crate::task::WriterTask;
use crate::wal::frame::{FRAME_KIND_ALTER_TASK, Frame, FrameError, FrameReader};
use crate::writer::TableWriter;
use serde::Serialize;
use std::io::Read;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub applied: u64,
    /// Frames addressed to another incarnation of the table.
    pub stale: u64,
    /// Frames skipped or failed in permissive mode.
    pub skipped: u64,
    pub last_seq: u64,
    /// Replay stopped at a corrupt frame instead of the end of the log.
    pub stopped_at_corruption: bool,
}

/// Applies every alter frame after `from_seq_exclusive` to `writer`.
///
/// Frames whose table id differs from the writer's are counted as stale and
/// skipped. A truncated tail ends replay. In strict mode a corrupt frame,
/// an undecodable command or a failed apply is an error; in permissive mode
/// corruption stops replay and bad commands are skipped.
pub fn replay_commands<R: Read, W: TableWriter + ?Sized>(
    reader: &mut FrameReader<R>,
    writer: &mut W,
    from_seq_exclusive: u64,
    config: &AlterConfig,
) -> Result<ReplayReport, AlterError> {
    let strict = config.strict_recovery();
    let limits = config.decode_limits();
    let mut report = ReplayReport {
        last_seq: from_seq_exclusive,
        ..ReplayReport::default()
    };
    let mut scratch = NameScratch::with_capacity(64);
    loop {
        let frame = match reader.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(FrameError::Truncation) => break,
            Err(FrameError::Corruption(reason)) => {
                if strict {
                    return Err(AlterError::Decode(format!(
                        "command log corruption after seq {}: {reason}",
                        report.last_seq
                    )));
                }
                warn!(
                    last_seq = report.last_seq,
                    reason, "command log corruption, replay stopped"
                );
                report.stopped_at_corruption = true;
                break;
            }
            Err(FrameError::Io(e)) => return Err(AlterError::Io(std::io::Error::other(e))),
        };
        if frame.seq <= from_seq_exclusive {
            continue;
        }
        if frame.seq <= report.last_seq {
            return Err(AlterError::Decode(format!(
                "non-monotonic command log seq {} after {}",
                frame.seq, report.last_seq
            )));
        }
        report.last_seq = frame.seq;
        match replay_frame(&frame, writer, &limits, &mut scratch) {
            Ok(FrameOutcome::Applied) => report.applied += 1,
            Ok(FrameOutcome::Stale) => report.stale += 1,
            Err(e) if !strict => {
                warn!(seq = frame.seq, error = %e, "skipping command log frame");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}

enum FrameOutcome {
    Applied,
    Stale,
}

fn replay_frame<W: TableWriter + ?Sized>(
    frame: &Frame,
    writer: &mut W,
    limits: &DecodeLimits,
    scratch: &mut NameScratch,
) -> Result<FrameOutcome, AlterError> {
    if frame.kind != FRAME_KIND_ALTER_TASK {
        return Err(AlterError::Decode(format!(
            "unknown command log frame kind: {}",
            frame.kind
        )));
    }
    let task = WriterTask::parse(&frame.payload, limits)?;
    if task.table_id != writer.table_id() {
        return Ok(FrameOutcome::Stale);
    }
    let mut cmd = AlterCommand::new();
    cmd.decode_task(&task, limits)?;
    cmd.apply_with(writer, true, scratch)?;
    Ok(FrameOutcome::Applied)
}
