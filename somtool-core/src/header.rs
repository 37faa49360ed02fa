//! The fixed 128-byte SOM file header.
//!
//! Layout per the HP-UX `<som.h>` convention: `system_id` and `a_magic`
//! are 16-bit, every following field is a 32-bit big-endian word, ending
//! in `checksum`. SOM has no little-endian variant.

use crate::cursor::{read_at_most, ByteCursor};
use crate::error::{Result, SomError};
use std::io::Read;

pub const SOM_HEADER_SIZE: usize = 128;

// system_id values (PA-RISC hardware revisions)
pub const SID_PA_RISC_1_0: u16 = 0x020b;
pub const SID_PA_RISC_1_1: u16 = 0x0210;
pub const SID_PA_RISC_2_0: u16 = 0x0214;

// a_magic values
pub const MAGIC_EXEC_SOM_LIB: u16 = 0x0104;
pub const MAGIC_PRIV_EXEC: u16 = 0x0107;
pub const MAGIC_SHARE_EXEC: u16 = 0x0108;
pub const MAGIC_SHARE_DEMAND_LOAD_EXEC: u16 = 0x010b;
pub const MAGIC_DYN_LOAD_LIB: u16 = 0x010d;
pub const MAGIC_SHARED_LIB: u16 = 0x010e;

/// Cheap signature probe: `0x02` followed by a known PA-RISC revision byte.
pub fn is_som_header(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x02 && matches!(bytes[1], 0x0b | 0x10 | 0x14)
}

#[derive(Debug, Clone, Copy)]
pub struct SomFileHeader {
    pub system_id: u16,
    pub a_magic: u16,
    pub version_id: u32,
    pub file_time_secs: u32,
    pub file_time_nanos: u32,
    pub entry_space: u32,
    pub entry_subspace: u32,
    pub entry_offset: u32,
    pub aux_header_location: u32,
    pub aux_header_size: u32,
    pub som_length: u32,
    pub presumed_dp: u32,
    pub space_location: u32,
    pub space_total: u32,
    pub subspace_location: u32,
    pub subspace_total: u32,
    pub loader_fixup_location: u32,
    pub loader_fixup_total: u32,
    pub space_strings_location: u32,
    pub space_strings_size: u32,
    pub init_array_location: u32,
    pub init_array_total: u32,
    pub compiler_location: u32,
    pub compiler_total: u32,
    pub symbol_location: u32,
    pub symbol_total: u32,
    pub fixup_request_location: u32,
    pub fixup_request_total: u32,
    pub symbol_strings_location: u32,
    pub symbol_strings_size: u32,
    pub unloadable_sp_location: u32,
    pub unloadable_sp_size: u32,
    pub checksum: u32,
}

impl SomFileHeader {
    /// Decodes the header from the first 128 bytes of a SOM region.
    ///
    /// The signature check runs before any field decode, so a non-SOM
    /// input never yields a partially valid header.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SOM_HEADER_SIZE {
            return Err(SomError::TruncatedHeader {
                what: "SOM file header",
                expected: SOM_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        if !is_som_header(bytes) {
            let id = u16::from(bytes[0]) << 8 | u16::from(bytes[1]);
            return Err(SomError::NotSom(id));
        }
        let mut cur = ByteCursor::big_endian(bytes);
        Ok(Self {
            system_id: cur.read_u16()?,
            a_magic: cur.read_u16()?,
            version_id: cur.read_u32()?,
            file_time_secs: cur.read_u32()?,
            file_time_nanos: cur.read_u32()?,
            entry_space: cur.read_u32()?,
            entry_subspace: cur.read_u32()?,
            entry_offset: cur.read_u32()?,
            aux_header_location: cur.read_u32()?,
            aux_header_size: cur.read_u32()?,
            som_length: cur.read_u32()?,
            presumed_dp: cur.read_u32()?,
            space_location: cur.read_u32()?,
            space_total: cur.read_u32()?,
            subspace_location: cur.read_u32()?,
            subspace_total: cur.read_u32()?,
            loader_fixup_location: cur.read_u32()?,
            loader_fixup_total: cur.read_u32()?,
            space_strings_location: cur.read_u32()?,
            space_strings_size: cur.read_u32()?,
            init_array_location: cur.read_u32()?,
            init_array_total: cur.read_u32()?,
            compiler_location: cur.read_u32()?,
            compiler_total: cur.read_u32()?,
            symbol_location: cur.read_u32()?,
            symbol_total: cur.read_u32()?,
            fixup_request_location: cur.read_u32()?,
            fixup_request_total: cur.read_u32()?,
            symbol_strings_location: cur.read_u32()?,
            symbol_strings_size: cur.read_u32()?,
            unloadable_sp_location: cur.read_u32()?,
            unloadable_sp_size: cur.read_u32()?,
            checksum: cur.read_u32()?,
        })
    }

    pub fn from_reader<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = [0u8; SOM_HEADER_SIZE];
        let filled = read_at_most(r, &mut buf)?;
        Self::decode(&buf[..filled])
    }
}
