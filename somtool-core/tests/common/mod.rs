//! Builders for synthetic SOM images and ar/LST archives.
#![allow(dead_code)] // each test binary uses its own subset

use byteorder::{BigEndian, ByteOrder};
use std::path::PathBuf;

pub const MEMBER_HEADER_SIZE: usize = 60;
pub const LST_HEADER_SIZE: usize = 76;

// byte offsets of SOM header fields the tests care about
pub const SYMBOL_LOCATION: usize = 92;
pub const SYMBOL_TOTAL: usize = 96;
pub const SYMBOL_STRINGS_LOCATION: usize = 108;
pub const SYMBOL_STRINGS_SIZE: usize = 112;

pub fn som_header_bytes(system_id: u16, a_magic: u16, fields: &[(usize, u32)]) -> [u8; 128] {
    let mut header = [0u8; 128];
    BigEndian::write_u16(&mut header[0..2], system_id);
    BigEndian::write_u16(&mut header[2..4], a_magic);
    for &(offset, value) in fields {
        BigEndian::write_u32(&mut header[offset..offset + 4], value);
    }
    header
}

/// Base symbol record with the given bit-packed first word fields.
pub fn symbol_record(
    symbol_type: u32,
    scope: u32,
    check_level: u32,
    name_offset: u32,
    qualifier_offset: u32,
    value: u32,
) -> [u8; 20] {
    let flags = (symbol_type & 0x3f) << 24 | (scope & 0x0f) << 20 | (check_level & 0x07) << 17;
    let mut record = [0u8; 20];
    BigEndian::write_u32(&mut record[0..4], flags);
    BigEndian::write_u32(&mut record[4..8], name_offset);
    BigEndian::write_u32(&mut record[8..12], qualifier_offset);
    BigEndian::write_u32(&mut record[16..20], value);
    record
}

/// Extension record; only the leading `num_args` byte is meaningful.
pub fn extension_record(num_args: u8) -> [u8; 20] {
    let mut record = [0u8; 20];
    record[0] = num_args;
    record
}

/// Length-prefixed string blob: each name is preceded by a 4-byte
/// big-endian length. Returns the blob and each name's offset.
pub fn string_blob(names: &[&str]) -> (Vec<u8>, Vec<u32>) {
    let mut blob = Vec::new();
    let mut offsets = Vec::new();
    for name in names {
        let mut len = [0u8; 4];
        BigEndian::write_u32(&mut len, name.len() as u32);
        blob.extend_from_slice(&len);
        offsets.push(blob.len() as u32);
        blob.extend_from_slice(name.as_bytes());
    }
    (blob, offsets)
}

pub fn member_header_bytes(name: &str, size: usize) -> [u8; MEMBER_HEADER_SIZE] {
    let mut header = [b' '; MEMBER_HEADER_SIZE];
    let named = format!("{name}/");
    header[..named.len()].copy_from_slice(named.as_bytes());
    let put = |header: &mut [u8; MEMBER_HEADER_SIZE], at: usize, text: &str| {
        header[at..at + text.len()].copy_from_slice(text.as_bytes());
    };
    put(&mut header, 16, "1234567890");
    put(&mut header, 28, "0");
    put(&mut header, 34, "0");
    put(&mut header, 40, "100644");
    put(&mut header, 48, &size.to_string());
    header[58] = b'`';
    header[59] = b'\n';
    header
}

/// Assembles a complete archive: magic, LST member header, LST header at
/// offset 68, SOM directory at 144, then each member header + payload.
pub fn build_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let count = members.len() as u32;
    let mut buf = b"!<arch>\n".to_vec();
    buf.extend_from_slice(&member_header_bytes("", LST_HEADER_SIZE));

    let mut lst = [0u8; LST_HEADER_SIZE];
    BigEndian::write_u16(&mut lst[0..2], 0x0619);
    BigEndian::write_u16(&mut lst[2..4], 0x0619);
    BigEndian::write_u32(&mut lst[24..28], count); // module_count
    BigEndian::write_u32(&mut lst[28..32], count); // module_limit
    BigEndian::write_u32(&mut lst[32..36], LST_HEADER_SIZE as u32); // dir_loc
    buf.extend_from_slice(&lst);

    let dir_start = buf.len(); // 144
    let mut data_pos = dir_start + members.len() * 8;
    let mut directory = Vec::new();
    for (_, data) in members {
        let som_offset = data_pos + MEMBER_HEADER_SIZE;
        let mut entry = [0u8; 8];
        BigEndian::write_u32(&mut entry[0..4], som_offset as u32);
        BigEndian::write_u32(&mut entry[4..8], data.len() as u32);
        directory.extend_from_slice(&entry);
        data_pos = som_offset + data.len();
    }
    buf.extend_from_slice(&directory);

    for (name, data) in members {
        buf.extend_from_slice(&member_header_bytes(name, data.len()));
        buf.extend_from_slice(data);
    }
    buf
}

/// Per-test scratch directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("somtool-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
