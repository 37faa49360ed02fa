use crate::error::{Result, SomError};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::{self, Read};

/// Byte order of the multi-byte fields a [`ByteCursor`] reads.
///
/// SOM and its LST archives are big-endian only; the little-endian arm
/// exists so the cursor stays a general-purpose utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Position-tracking reader over an in-memory byte buffer.
///
/// Every fixed-width read advances the position by the width that was read;
/// reading past the end is a `TruncatedData` error, never a panic.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self {
            buf,
            pos: 0,
            endian,
        }
    }

    pub fn big_endian(buf: &'a [u8]) -> Self {
        Self::new(buf, Endian::Big)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(SomError::TruncatedData(format!(
                "read of {n} bytes at offset {} past end of {}-byte buffer",
                self.pos,
                self.buf.len()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(match self.endian {
            Endian::Big => BigEndian::read_u16(b),
            Endian::Little => LittleEndian::read_u16(b),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(match self.endian {
            Endian::Big => BigEndian::read_u32(b),
            Endian::Little => LittleEndian::read_u32(b),
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n)?;
        Ok(())
    }
}

/// Stateful cursor over a byte stream of fixed-size records.
///
/// Symbol tables interleave base records with data-dependent numbers of
/// extension and descriptor records, so the record boundary is never a
/// fixed stride. This cursor owns the running position: `read_record`
/// consumes one record it returns, `advance_records` consumes records it
/// discards. A short read or short skip is always `TruncatedData`.
pub struct RecordCursor<'a, R> {
    inner: &'a mut R,
}

impl<'a, R: Read> RecordCursor<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        Self { inner }
    }

    pub fn read_record<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut record = [0u8; N];
        self.inner.read_exact(&mut record).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                SomError::TruncatedData(format!("{N}-byte record past end of table"))
            } else {
                SomError::Io(e)
            }
        })?;
        Ok(record)
    }

    pub fn advance_fixed(&mut self, n: u64) -> Result<()> {
        let skipped = io::copy(&mut self.inner.by_ref().take(n), &mut io::sink())?;
        if skipped < n {
            return Err(SomError::TruncatedData(format!(
                "skip of {n} bytes ended after {skipped}"
            )));
        }
        Ok(())
    }

    pub fn advance_records(&mut self, count: u64, record_size: u64) -> Result<()> {
        self.advance_fixed(count * record_size)
    }
}

/// Reads as many bytes as the source can supply, up to `buf.len()`.
///
/// Unlike `read_exact` this reports how far it got, which the header
/// decoders need for their truncation diagnostics.
pub(crate) fn read_at_most<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
