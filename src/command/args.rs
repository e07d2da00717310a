use compact_str::CompactString;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;

/// Borrowed run of little-endian UTF-16 code units.
///
/// This is what text arguments look like after decoding: the bytes stay in
/// the transport buffer and are only interpreted when read.
#[derive(Clone, Copy)]
pub struct Utf16Str<'a> {
    bytes: &'a [u8],
}

impl<'a> Utf16Str<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        debug_assert!(bytes.len() % 2 == 0, "odd utf-16 byte length");
        Self { bytes }
    }

    pub fn len_units(&self) -> usize {
        self.bytes.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn units(&self) -> impl Iterator<Item = u16> + 'a {
        self.bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }

    /// Unpaired surrogates decode as U+FFFD.
    pub fn chars(&self) -> impl Iterator<Item = char> + 'a {
        char::decode_utf16(self.units()).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Replaces the contents of `out`, reusing its allocation.
    pub fn write_into(&self, out: &mut String) {
        out.clear();
        out.extend(self.chars());
    }
}

impl fmt::Display for Utf16Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for c in self.chars() {
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Utf16Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

impl PartialEq<str> for Utf16Str<'_> {
    fn eq(&self, other: &str) -> bool {
        self.units().eq(other.encode_utf16())
    }
}

/// One text argument, either owned by the descriptor or viewed in a buffer.
#[derive(Clone, Copy, Debug)]
pub enum TextRef<'a> {
    Str(&'a str),
    Utf16(Utf16Str<'a>),
}

impl<'a> TextRef<'a> {
    /// Length in UTF-16 code units, the unit the wire format counts in.
    pub fn len_units(&self) -> usize {
        match self {
            TextRef::Str(s) => s.encode_utf16().count(),
            TextRef::Utf16(u) => u.len_units(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TextRef::Str(s) => s.is_empty(),
            TextRef::Utf16(u) => u.is_empty(),
        }
    }

    pub(crate) fn write_utf16_le(&self, out: &mut Vec<u8>) {
        match self {
            TextRef::Str(s) => {
                for unit in s.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
            TextRef::Utf16(u) => out.extend_from_slice(u.as_bytes()),
        }
    }

    /// Borrows owned text directly; decodes buffer text into `scratch`.
    pub fn resolve<'s>(self, scratch: &'s mut String) -> &'s str
    where
        'a: 's,
    {
        match self {
            TextRef::Str(s) => s,
            TextRef::Utf16(u) => {
                u.write_into(scratch);
                scratch.as_str()
            }
        }
    }

    pub fn to_cow(self) -> Cow<'a, str> {
        match self {
            TextRef::Str(s) => Cow::Borrowed(s),
            TextRef::Utf16(u) => Cow::Owned(u.to_string()),
        }
    }
}

impl fmt::Display for TextRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextRef::Str(s) => f.write_str(s),
            TextRef::Utf16(u) => fmt::Display::fmt(u, f),
        }
    }
}

impl PartialEq<str> for TextRef<'_> {
    fn eq(&self, other: &str) -> bool {
        match self {
            TextRef::Str(s) => *s == other,
            TextRef::Utf16(u) => u == other,
        }
    }
}

impl PartialEq<&str> for TextRef<'_> {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq for TextRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TextRef::Str(a), b) | (b, TextRef::Str(a)) => b == *a,
            (TextRef::Utf16(a), TextRef::Utf16(b)) => a.as_bytes() == b.as_bytes(),
        }
    }
}

/// Text entries recorded as byte ranges into a decoded buffer.
#[derive(Debug, Clone)]
pub struct DirectTextList<'a> {
    buf: &'a [u8],
    ranges: SmallVec<[(usize, usize); 8]>,
}

impl<'a> DirectTextList<'a> {
    pub(crate) fn with_capacity(buf: &'a [u8], capacity: usize) -> Self {
        Self {
            buf,
            ranges: SmallVec::with_capacity(capacity),
        }
    }

    pub(crate) fn push_range(&mut self, lo: usize, hi: usize) {
        debug_assert!(lo <= hi && hi <= self.buf.len());
        self.ranges.push((lo, hi));
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<Utf16Str<'a>> {
        let (lo, hi) = *self.ranges.get(idx)?;
        Some(Utf16Str::new(&self.buf[lo..hi]))
    }
}

/// The textual half of the argument store.
///
/// Commands built on the producer side own their strings; commands decoded
/// on the consumer side view the transport buffer they were decoded from and
/// cannot outlive it.
#[derive(Debug, Clone)]
pub enum TextArgs<'a> {
    Owned(Vec<CompactString>),
    Direct(DirectTextList<'a>),
}

impl Default for TextArgs<'_> {
    fn default() -> Self {
        TextArgs::Owned(Vec::new())
    }
}

impl<'a> TextArgs<'a> {
    /// Empties the list and switches back to owned storage.
    pub fn clear(&mut self) {
        match self {
            TextArgs::Owned(strings) => strings.clear(),
            TextArgs::Direct(_) => *self = TextArgs::Owned(Vec::new()),
        }
    }

    pub(crate) fn push(&mut self, text: &str) {
        if let TextArgs::Direct(direct) = self {
            let owned = (0..direct.len())
                .filter_map(|idx| direct.get(idx))
                .map(|u| CompactString::from(u.to_string()))
                .collect();
            *self = TextArgs::Owned(owned);
        }
        if let TextArgs::Owned(strings) = self {
            strings.push(CompactString::from(text));
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TextArgs::Owned(strings) => strings.len(),
            TextArgs::Direct(direct) => direct.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, TextArgs::Direct(_))
    }

    pub fn get(&self, idx: usize) -> Option<TextRef<'_>> {
        match self {
            TextArgs::Owned(strings) => strings.get(idx).map(|s| TextRef::Str(s.as_str())),
            TextArgs::Direct(direct) => direct.get(idx).map(TextRef::Utf16),
        }
    }

    pub fn iter(&self) -> TextIter<'_> {
        TextIter {
            args: self,
            next: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextIter<'c> {
    args: &'c TextArgs<'c>,
    next: usize,
}

impl<'c> Iterator for TextIter<'c> {
    type Item = TextRef<'c>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.args.get(self.next)?;
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.args.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for TextIter<'_> {}
