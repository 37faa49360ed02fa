//! SOM symbol table decoding.
//!
//! A logical symbol is one fixed 20-byte base record plus, depending on
//! `check_level`, an extension record and a run of argument-descriptor
//! records. Record boundaries are therefore data-dependent; the decode
//! loop walks a [`RecordCursor`] instead of assuming a fixed stride.

use crate::cursor::{ByteCursor, RecordCursor};
use crate::error::Result;
use crate::header::SomFileHeader;
use crate::strings::StringTable;
use std::io::{Read, Seek, SeekFrom};

pub const SYMBOL_RECORD_SIZE: usize = 20;

// symbol_type values
pub const ST_NULL: u32 = 0;
pub const ST_ABSOLUTE: u32 = 1;
pub const ST_DATA: u32 = 2;
pub const ST_CODE: u32 = 3;
pub const ST_PRI_PROG: u32 = 4;
pub const ST_SEC_PROG: u32 = 5;
pub const ST_ENTRY: u32 = 6;
pub const ST_STORAGE: u32 = 7;
pub const ST_STUB: u32 = 8;
pub const ST_MODULE: u32 = 9;
pub const ST_SYM_EXT: u32 = 10;
pub const ST_ARG_EXT: u32 = 11;
pub const ST_MILLICODE: u32 = 12;
pub const ST_MILLI_EXT: u32 = 13;

// symbol_scope values
pub const SS_UNSAT: u32 = 0;
pub const SS_EXTERNAL: u32 = 1;
pub const SS_LOCAL: u32 = 2;
pub const SS_GLOBAL: u32 = 3;
pub const SS_UNIVERSAL: u32 = 4;

// Bit layout of the first word of a base record, MSB first:
// hidden(1) secondary_def(1) symbol_type(6) symbol_scope(4) check_level(3)
// must_qualify(1) initially_frozen(1) memory_resident(1) is_common(1)
// dup_common(1) xleast(2) arg_reloc(10).
fn hidden(w: u32) -> bool {
    w & 0x8000_0000 != 0
}
fn secondary_def(w: u32) -> bool {
    w & 0x4000_0000 != 0
}
fn symbol_type(w: u32) -> u32 {
    (w >> 24) & 0x3f
}
fn symbol_scope(w: u32) -> u32 {
    (w >> 20) & 0x0f
}
fn check_level(w: u32) -> u32 {
    (w >> 17) & 0x07
}
fn must_qualify(w: u32) -> bool {
    w & 0x0001_0000 != 0
}
fn initially_frozen(w: u32) -> bool {
    w & 0x8000 != 0
}
fn memory_resident(w: u32) -> bool {
    w & 0x4000 != 0
}
fn is_common(w: u32) -> bool {
    w & 0x2000 != 0
}
fn dup_common(w: u32) -> bool {
    w & 0x1000 != 0
}
fn xleast(w: u32) -> u32 {
    (w >> 10) & 0x03
}
fn arg_reloc(w: u32) -> u32 {
    w & 0x03ff
}

// Fourth word: has_long_return(1) no_relocation(1) reserved(6) symbol_info(24).
fn has_long_return(w: u32) -> bool {
    w & 0x8000_0000 != 0
}
fn no_relocation(w: u32) -> bool {
    w & 0x4000_0000 != 0
}
fn symbol_info(w: u32) -> u32 {
    w & 0x00ff_ffff
}

#[derive(Debug, Clone)]
pub struct SomSymbol {
    pub hidden: bool,
    pub secondary_def: bool,
    pub symbol_type: u32,
    pub symbol_scope: u32,
    pub check_level: u32,
    pub must_qualify: bool,
    pub initially_frozen: bool,
    pub memory_resident: bool,
    pub is_common: bool,
    pub dup_common: bool,
    pub xleast: u32,
    pub arg_reloc: u32,
    pub name_offset: u32,
    pub qualifier_name_offset: u32,
    pub has_long_return: bool,
    pub no_relocation: bool,
    pub symbol_info: u32,
    pub symbol_value: u32,
}

impl SomSymbol {
    pub fn decode(record: &[u8; SYMBOL_RECORD_SIZE]) -> Result<Self> {
        let mut cur = ByteCursor::big_endian(record);
        let flags = cur.read_u32()?;
        let name_offset = cur.read_u32()?;
        let qualifier_name_offset = cur.read_u32()?;
        let info = cur.read_u32()?;
        let symbol_value = cur.read_u32()?;
        Ok(Self {
            hidden: hidden(flags),
            secondary_def: secondary_def(flags),
            symbol_type: symbol_type(flags),
            symbol_scope: symbol_scope(flags),
            check_level: check_level(flags),
            must_qualify: must_qualify(flags),
            initially_frozen: initially_frozen(flags),
            memory_resident: memory_resident(flags),
            is_common: is_common(flags),
            dup_common: dup_common(flags),
            xleast: xleast(flags),
            arg_reloc: arg_reloc(flags),
            name_offset,
            qualifier_name_offset,
            has_long_return: has_long_return(info),
            no_relocation: no_relocation(info),
            symbol_info: symbol_info(info),
            symbol_value,
        })
    }

    /// The qualified name wins whenever both offsets are present.
    pub fn resolve_name(&self, strings: &StringTable) -> String {
        if self.qualifier_name_offset != 0 {
            strings
                .name_at(self.qualifier_name_offset)
                .unwrap_or_default()
        } else if self.name_offset != 0 {
            strings.name_at(self.name_offset).unwrap_or_default()
        } else {
            String::new()
        }
    }

    pub fn is_function(&self) -> bool {
        self.symbol_type == ST_PRI_PROG
            || (self.symbol_type == ST_ENTRY && self.symbol_scope != SS_LOCAL)
    }

    pub fn is_variable(&self) -> bool {
        (self.symbol_type == ST_DATA && self.symbol_scope != SS_LOCAL)
            || self.symbol_type == ST_STORAGE
    }
}

/// Decodes exactly `symbol_total` logical symbols starting at
/// `symbol_location` (relative to `base`).
///
/// Any short read, including one inside an extension or descriptor skip,
/// aborts the whole decode; there is no partial symbol list.
pub fn decode_symbols<R: Read + Seek>(
    source: &mut R,
    base: u64,
    header: &SomFileHeader,
) -> Result<Vec<SomSymbol>> {
    let count = header.symbol_total as usize;
    let mut symbols = Vec::with_capacity(count);
    if count == 0 {
        return Ok(symbols);
    }
    source.seek(SeekFrom::Start(base + u64::from(header.symbol_location)))?;
    let mut records = RecordCursor::new(source);
    for _ in 0..count {
        let raw: [u8; SYMBOL_RECORD_SIZE] = records.read_record()?;
        let symbol = SomSymbol::decode(&raw)?;
        if (1..=3).contains(&symbol.check_level) {
            let extension: [u8; SYMBOL_RECORD_SIZE] = records.read_record()?;
            let num_args = u32::from(extension[0]);
            if symbol.check_level == 3 && num_args > 3 {
                // one descriptor record covers four argument descriptors
                let descriptors = (num_args - 3).div_ceil(4);
                records.advance_records(u64::from(descriptors), SYMBOL_RECORD_SIZE as u64)?;
            }
        }
        symbols.push(symbol);
    }
    log::debug!("decoded {} of {} symbols", symbols.len(), count);
    Ok(symbols)
}
