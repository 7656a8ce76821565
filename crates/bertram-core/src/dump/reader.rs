//! Bounds-checked little-endian cursor over an untrusted dump buffer.

use crate::error::DecodeError;

/// Sequential reader that refuses to step past the end of the buffer.
///
/// Every read names the dump section it belongs to so a failure can report
/// exactly which declared size was bogus.
pub(crate) struct ByteReader<'a>
{
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a>
{
    pub(crate) fn new(buf: &'a [u8]) -> Self
    {
        Self { buf, pos: 0 }
    }

    pub(crate) fn at(buf: &'a [u8], pos: usize) -> Self
    {
        Self { buf, pos }
    }

    pub(crate) fn position(&self) -> usize
    {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize
    {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Borrow the next `size` bytes and advance past them.
    pub(crate) fn take(&mut self, section: &'static str, size: usize) -> Result<&'a [u8], DecodeError>
    {
        let end = self
            .pos
            .checked_add(size)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::TruncatedBuffer {
                section,
                offset: self.pos,
                size,
                available: self.remaining(),
            })?;

        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn read_u32(&mut self, section: &'static str) -> Result<u32, DecodeError>
    {
        let bytes = self.take(section, 4)?;
        Ok(le_word(bytes))
    }
}

/// Decode a little-endian word from the first four bytes of `bytes`.
///
/// Callers guarantee at least four bytes (`chunks_exact(4)` or `take(_, 4)`).
pub(crate) fn le_word(bytes: &[u8]) -> u32
{
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Word at `offset`, or `None` if it would run off the end.
pub(crate) fn word_at(buf: &[u8], offset: usize) -> Option<u32>
{
    let end = offset.checked_add(4)?;
    buf.get(offset..end).map(le_word)
}
