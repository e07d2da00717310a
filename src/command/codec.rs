use crate::command::args::{DirectTextList, TextArgs, Utf16Str};
use crate::command::{AlterCommand, AlterOp};
use crate::config::DecodeLimits;
use crate::error::AlterError;

const OPCODE_BYTES: usize = 2;
const INT_BYTES: usize = 4;
const LONG_BYTES: usize = 8;
const UNIT_BYTES: usize = 2;

/// Bytes of a command with no arguments.
pub const MIN_COMMAND_BYTES: usize = OPCODE_BYTES + 3 * INT_BYTES;

impl AlterCommand<'_> {
    /// Appends the command to `out`, little-endian:
    ///
    /// ```text
    /// u16 opcode | i32 position | i32 N | N x i64 | i32 M | M x (i32 C | C x u16)
    /// ```
    ///
    /// Table name and id belong to the envelope in front of it.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        out.extend_from_slice(&self.op().code().to_le_bytes());
        out.extend_from_slice(&self.position().to_le_bytes());
        put_count(out, self.numeric_args().len());
        for value in self.numeric_args() {
            out.extend_from_slice(&value.to_le_bytes());
        }
        put_count(out, self.text_args().len());
        for text in self.text_args().iter() {
            put_count(out, text.len_units());
            text.write_utf16_le(out);
        }
    }

    pub fn encoded_len(&self) -> usize {
        let texts: usize = self
            .text_args()
            .iter()
            .map(|t| INT_BYTES + t.len_units() * UNIT_BYTES)
            .sum();
        MIN_COMMAND_BYTES + self.numeric_args().len() * LONG_BYTES + texts
    }
}

impl<'a> AlterCommand<'a> {
    /// Rebuilds this command in place from `buf`, which must start at the
    /// opcode. Text arguments are recorded as ranges of `buf`, nothing is
    /// copied. Returns the number of bytes consumed; table name and id are
    /// left for the caller to set from the envelope.
    ///
    /// On error the command is left cleared.
    pub fn decode_from(&mut self, buf: &'a [u8], limits: &DecodeLimits) -> Result<usize, AlterError> {
        self.clear();
        match self.decode_payload(buf, limits) {
            Ok(consumed) => Ok(consumed),
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    /// Decodes a standalone command; see [`AlterCommand::decode_from`].
    pub fn decode(buf: &'a [u8], limits: &DecodeLimits) -> Result<(Self, usize), AlterError> {
        let mut cmd = AlterCommand::new();
        let consumed = cmd.decode_from(buf, limits)?;
        Ok((cmd, consumed))
    }

    fn decode_payload(&mut self, buf: &'a [u8], limits: &DecodeLimits) -> Result<usize, AlterError> {
        let mut cursor = ByteCursor::new(buf);
        let code = cursor.read_u16()?;
        let op = AlterOp::from_code(code).ok_or(AlterError::InvalidCommand { code })?;
        let position = cursor.read_i32()?;

        let numeric = cursor.read_count("numeric arg", limits.max_numeric_args, LONG_BYTES)?;
        self.longs.reserve(numeric);
        for _ in 0..numeric {
            self.longs.push(cursor.read_i64()?);
        }

        let text = cursor.read_count("text arg", limits.max_text_args, INT_BYTES)?;
        let mut direct = DirectTextList::with_capacity(buf, text);
        for _ in 0..text {
            let view = cursor.read_utf16(limits.max_text_units)?;
            let lo = cursor.pos() - view.as_bytes().len();
            direct.push_range(lo, cursor.pos());
        }

        self.op = op;
        self.position = position;
        self.texts = TextArgs::Direct(direct);
        self.check_arity()?;
        Ok(cursor.pos())
    }
}

fn put_count(out: &mut Vec<u8>, count: usize) {
    out.extend_from_slice(&(count as i32).to_le_bytes());
}

/// Bounds-checked little-endian reader over a borrowed buffer.
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], AlterError> {
        let bytes = self.take_slice(N)?;
        bytes
            .try_into()
            .map_err(|_| AlterError::Decode("slice length mismatch".into()))
    }

    pub(crate) fn take_slice(&mut self, len: usize) -> Result<&'a [u8], AlterError> {
        if len > self.remaining() {
            return Err(AlterError::Decode(format!(
                "truncated command: need {len} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, AlterError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, AlterError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64, AlterError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    /// Reads an i32 count and checks it against `max` and against the bytes
    /// left, assuming each element needs at least `min_width` bytes.
    pub(crate) fn read_count(
        &mut self,
        what: &str,
        max: usize,
        min_width: usize,
    ) -> Result<usize, AlterError> {
        let raw = self.read_i32()?;
        let count = usize::try_from(raw)
            .map_err(|_| AlterError::Decode(format!("negative {what} count: {raw}")))?;
        if count > max {
            return Err(AlterError::Decode(format!(
                "{what} count {count} exceeds limit {max}"
            )));
        }
        if count.saturating_mul(min_width) > self.remaining() {
            return Err(AlterError::Decode(format!(
                "truncated command: {count} x {what} do not fit in {} bytes",
                self.remaining()
            )));
        }
        Ok(count)
    }

    /// Reads a length-prefixed run of UTF-16 code units as a view.
    pub(crate) fn read_utf16(&mut self, max_units: usize) -> Result<Utf16Str<'a>, AlterError> {
        let units = self.read_count("utf-16 unit", max_units, UNIT_BYTES)?;
        Ok(Utf16Str::new(self.take_slice(units * UNIT_BYTES)?))
    }
}
