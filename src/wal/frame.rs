use crate::command::AlterCommand;
use crate::task::encode_alter_task;
use crc32c::{crc32c, crc32c_append};
use std::io::{self, Read, Write};
use thiserror::Error;

pub const MAX_FRAME_BODY_BYTES: usize = 64 * 1024 * 1024;

pub const FRAME_KIND_ALTER_TASK: u8 = 0x01;

const FRAME_OVERHEAD: usize = 8 + 8 + 1 + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub seq: u64,
    pub timestamp_micros: u64,
    pub kind: u8,
    pub payload: Vec<u8>,
    pub crc32c: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("truncated frame")]
    Truncation,
    #[error("corrupt frame: {0}")]
    Corruption(&'static str),
    #[error("io error: {0}")]
    Io(String),
}

impl From<io::Error> for FrameError {
    fn from(value: io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

/// Appends command log frames, each laid out as
///
/// ```text
/// u32 body_len | u64 seq | u64 timestamp_micros | u8 kind | payload | u32 crc32c
/// ```
///
/// `body_len` covers everything after itself. The checksum covers everything
/// before it, including `body_len`.
pub struct FrameWriter<W: Write> {
    inner: W,
    scratch: Vec<u8>,
    max_body_bytes: usize,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_max_body(inner, MAX_FRAME_BODY_BYTES)
    }

    /// Refuses frames a [`FrameReader`] with the same cap would reject.
    pub fn with_max_body(inner: W, max_body_bytes: usize) -> Self {
        Self {
            inner,
            scratch: Vec::new(),
            max_body_bytes,
        }
    }

    pub fn append(
        &mut self,
        seq: u64,
        timestamp_micros: u64,
        kind: u8,
        payload: &[u8],
    ) -> Result<(), FrameError> {
        let body_len = FRAME_OVERHEAD + payload.len();
        if body_len > self.max_body_bytes {
            return Err(FrameError::Corruption("frame length exceeds limit"));
        }
        let body_len =
            u32::try_from(body_len).map_err(|_| FrameError::Corruption("payload too large"))?;
        let mut header = [0u8; 4 + 8 + 8 + 1];
        header[0..4].copy_from_slice(&body_len.to_le_bytes());
        header[4..12].copy_from_slice(&seq.to_le_bytes());
        header[12..20].copy_from_slice(&timestamp_micros.to_le_bytes());
        header[20] = kind;
        let crc = crc32c_append(crc32c(&header), payload);

        self.inner.write_all(&header)?;
        self.inner.write_all(payload)?;
        self.inner.write_all(&crc.to_le_bytes())?;
        Ok(())
    }

    /// Encodes `cmd` inside an alter-table envelope and appends it.
    pub fn append_command(
        &mut self,
        seq: u64,
        timestamp_micros: u64,
        cmd: &AlterCommand<'_>,
    ) -> Result<(), FrameError> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        encode_alter_task(cmd, &mut scratch);
        let result = self.append(seq, timestamp_micros, FRAME_KIND_ALTER_TASK, &scratch);
        self.scratch = scratch;
        result
    }

    pub fn flush(&mut self) -> Result<(), FrameError> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

pub struct FrameReader<R: Read> {
    inner: R,
    max_body_bytes: usize,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_body(inner, MAX_FRAME_BODY_BYTES)
    }

    pub fn with_max_body(inner: R, max_body_bytes: usize) -> Self {
        Self {
            inner,
            max_body_bytes,
        }
    }

    /// `Ok(None)` at a clean end of input.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        let mut len_buf = [0u8; 4];
        let first = self.inner.read(&mut len_buf[0..1])?;
        if first == 0 {
            return Ok(None);
        }
        read_exact_or_truncated(&mut self.inner, &mut len_buf[1..4])?;
        let body_len = u32::from_le_bytes(len_buf) as usize;
        if body_len < FRAME_OVERHEAD {
            return Err(FrameError::Corruption("frame shorter than its header"));
        }
        if body_len > self.max_body_bytes {
            return Err(FrameError::Corruption("frame length exceeds limit"));
        }

        let mut body = vec![0u8; body_len];
        read_exact_or_truncated(&mut self.inner, &mut body)?;

        let crc_offset = body_len - 4;
        let stored_crc = u32::from_le_bytes(
            body[crc_offset..]
                .try_into()
                .map_err(|_| FrameError::Corruption("checksum"))?,
        );
        let computed_crc = crc32c_append(crc32c(&len_buf), &body[..crc_offset]);
        if stored_crc != computed_crc {
            return Err(FrameError::Corruption("checksum mismatch"));
        }

        let seq = u64::from_le_bytes(
            body[0..8]
                .try_into()
                .map_err(|_| FrameError::Corruption("seq"))?,
        );
        let timestamp_micros = u64::from_le_bytes(
            body[8..16]
                .try_into()
                .map_err(|_| FrameError::Corruption("timestamp"))?,
        );
        let kind = body[16];
        body.truncate(crc_offset);
        body.drain(..17);

        Ok(Some(Frame {
            seq,
            timestamp_micros,
            kind,
            payload: body,
            crc32c: stored_crc,
        }))
    }
}

fn read_exact_or_truncated<R: Read>(inner: &mut R, buf: &mut [u8]) -> Result<(), FrameError> {
    match inner.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FrameError::Truncation),
        Err(e) => Err(FrameError::Io(e.to_string())),
    }
}
