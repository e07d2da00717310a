pub mod replay;

use crate::config::AlterConfig;
use crate::error::AlterError;
use crate::recovery::replay::{ReplayReport, replay_commands};
use crate::wal::frame::FrameReader;
use crate::writer::TableWriter;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Replays the command log at `path` into `writer`; see [`replay_commands`].
pub fn replay_log_file<W: TableWriter + ?Sized>(
    path: &Path,
    writer: &mut W,
    from_seq_exclusive: u64,
    config: &AlterConfig,
) -> Result<ReplayReport, AlterError> {
    info!(path = %path.display(), table = writer.table_name(), "recovery: replay command log");
    let file = File::open(path)?;
    let mut reader = FrameReader::with_max_body(
        BufReader::with_capacity(64 * 1024, file),
        config.max_frame_body_bytes,
    );
    let report = replay_commands(&mut reader, writer, from_seq_exclusive, config)?;
    info!(
        applied = report.applied,
        stale = report.stale,
        skipped = report.skipped,
        last_seq = report.last_seq,
        "recovery: command log replayed"
    );
    Ok(report)
}
