use crate::error::{Result, SomError};
use crate::header::SomFileHeader;
use byteorder::{BigEndian, ByteOrder};
use std::io::{self, Read, Seek, SeekFrom};

/// Immutable symbol-name string blob.
///
/// Entries are length-prefixed: the name at offset `o` is preceded by a
/// 4-byte big-endian length at `o - 4`. Offsets come from untrusted input,
/// so every lookup is bounds-checked and resolves to `None` rather than
/// failing the caller.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    bytes: Vec<u8>,
}

impl StringTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Reads the blob named by `symbol_strings_location`/`size`, relative
    /// to `base` (the SOM's byte offset within its container).
    pub fn read<R: Read + Seek>(source: &mut R, base: u64, header: &SomFileHeader) -> Result<Self> {
        let size = header.symbol_strings_size as usize;
        if size == 0 {
            return Ok(Self::empty());
        }
        source.seek(SeekFrom::Start(
            base + u64::from(header.symbol_strings_location),
        ))?;
        let mut bytes = vec![0u8; size];
        source.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                SomError::TruncatedData(format!("{size}-byte symbol string table past end of file"))
            } else {
                SomError::Io(e)
            }
        })?;
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Resolves the length-prefixed name starting at `offset`.
    pub fn name_at(&self, offset: u32) -> Option<String> {
        let off = offset as usize;
        if off < 4 || off > self.bytes.len() {
            return None;
        }
        let len = BigEndian::read_u32(&self.bytes[off - 4..off]) as usize;
        let end = off.checked_add(len)?;
        if end > self.bytes.len() {
            return None;
        }
        Some(String::from_utf8_lossy(&self.bytes[off..end]).into_owned())
    }
}
