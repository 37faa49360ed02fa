//! ar-style SOM archive container with its Library Symbol Table index.
//!
//! Layout: 8-byte `!<arch>\n` magic, the LST member's 60-byte header, the
//! 76-byte LST header at fixed offset 68, a SOM directory of
//! `(som_offset, som_size)` word pairs at `dir_loc + 68`, and each
//! member's 60-byte header sitting immediately before its SOM data.

use crate::cursor::{read_at_most, ByteCursor};
use crate::error::{Result, SomError};
use crate::som::SomFile;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub const AR_MAGIC: [u8; 8] = *b"!<arch>\n";
pub const LST_HEADER_OFFSET: u64 = 68;
pub const LST_HEADER_SIZE: usize = 76;
pub const MEMBER_HEADER_SIZE: usize = 60;
pub const DIRECTORY_ENTRY_SIZE: u64 = 8;

pub fn is_archive_magic(bytes: &[u8]) -> bool {
    bytes.len() >= AR_MAGIC.len() && bytes[..AR_MAGIC.len()] == AR_MAGIC
}

/// The Library Symbol Table header, 76 big-endian bytes at offset 68.
///
/// All fields are offsets or counts, so they are kept unsigned.
#[derive(Debug, Clone, Copy)]
pub struct LstHeader {
    pub system_id: u16,
    pub a_magic: u16,
    pub version_id: u32,
    pub file_time_secs: u32,
    pub file_time_nanos: u32,
    pub hash_loc: u32,
    pub hash_size: u32,
    pub module_count: u32,
    pub module_limit: u32,
    pub dir_loc: u32,
    pub export_loc: u32,
    pub export_count: u32,
    pub import_loc: u32,
    pub aux_loc: u32,
    pub aux_size: u32,
    pub string_loc: u32,
    pub string_size: u32,
    pub free_list: u32,
    pub file_end: u32,
    pub checksum: u32,
}

impl LstHeader {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < LST_HEADER_SIZE {
            return Err(SomError::TruncatedHeader {
                what: "LST header",
                expected: LST_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let mut cur = ByteCursor::big_endian(bytes);
        Ok(Self {
            system_id: cur.read_u16()?,
            a_magic: cur.read_u16()?,
            version_id: cur.read_u32()?,
            file_time_secs: cur.read_u32()?,
            file_time_nanos: cur.read_u32()?,
            hash_loc: cur.read_u32()?,
            hash_size: cur.read_u32()?,
            module_count: cur.read_u32()?,
            module_limit: cur.read_u32()?,
            dir_loc: cur.read_u32()?,
            export_loc: cur.read_u32()?,
            export_count: cur.read_u32()?,
            import_loc: cur.read_u32()?,
            aux_loc: cur.read_u32()?,
            aux_size: cur.read_u32()?,
            string_loc: cur.read_u32()?,
            string_size: cur.read_u32()?,
            free_list: cur.read_u32()?,
            file_end: cur.read_u32()?,
            checksum: cur.read_u32()?,
        })
    }
}

/// One archive member: the classic ar text header plus the SOM location
/// the directory entry that produced it points at.
///
/// The date/uid/gid/mode/size fields stay as the decimal/octal text the
/// header carries; nothing downstream needs them parsed.
#[derive(Debug, Clone)]
pub struct MemberHeader {
    pub name: String,
    pub date: String,
    pub uid: String,
    pub gid: String,
    pub mode: String,
    pub size: String,
    pub som_offset: u64,
    pub som_size: u64,
}

impl MemberHeader {
    fn decode(bytes: &[u8], som_offset: u64, som_size: u64) -> Result<Self> {
        if bytes.len() < MEMBER_HEADER_SIZE {
            return Err(SomError::TruncatedHeader {
                what: "archive member header",
                expected: MEMBER_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        // name[16] runs to the first '/'
        let name_end = bytes[..16]
            .iter()
            .position(|&b| b == b'/')
            .unwrap_or(16);
        let text = |range: std::ops::Range<usize>| {
            String::from_utf8_lossy(&bytes[range]).trim().to_string()
        };
        Ok(Self {
            name: String::from_utf8_lossy(&bytes[..name_end]).to_string(),
            date: text(16..28),
            uid: text(28..34),
            gid: text(34..40),
            mode: text(40..48),
            size: text(48..58),
            som_offset,
            som_size,
        })
    }
}

/// Archive reader with lazily cached LST header and member list.
///
/// Owns the one underlying file handle. `dispose` closes it; `reopen`
/// brings it back. Accessors that need I/O reopen a disposed handle
/// themselves, and cached decode results survive a dispose.
pub struct Archive {
    path: PathBuf,
    file: Option<File>,
    lst: Option<LstHeader>,
    members: Option<Vec<MemberHeader>>,
    warnings: Vec<String>,
}

impl Archive {
    /// Validates the 8-byte magic and constructs the reader. A mismatch
    /// is `BadMagic` and the handle is released; no partially valid
    /// archive is ever returned.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(&path)?;
        let mut magic = [0u8; AR_MAGIC.len()];
        let filled = read_at_most(&mut file, &mut magic)?;
        if !is_archive_magic(&magic[..filled]) {
            return Err(SomError::BadMagic);
        }
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            file: Some(file),
            lst: None,
            members: None,
            warnings: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Closes the underlying handle. Cached headers stay valid.
    pub fn dispose(&mut self) {
        self.file = None;
    }

    /// Reopens the handle if a prior `dispose` closed it.
    pub fn reopen(&mut self) -> Result<()> {
        if self.file.is_none() {
            log::debug!("reopening {}", self.path.display());
            self.file = Some(File::open(&self.path)?);
        }
        Ok(())
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.reopen()?;
        self.file
            .as_mut()
            .ok_or_else(|| SomError::Io(io::Error::other("archive handle unavailable")))
    }

    /// Messages for directory entries dropped during enumeration.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn lst_header(&mut self) -> Result<&LstHeader> {
        if self.lst.is_none() {
            let file = self.file_mut()?;
            file.seek(SeekFrom::Start(LST_HEADER_OFFSET))?;
            let mut buf = [0u8; LST_HEADER_SIZE];
            let filled = read_at_most(file, &mut buf)?;
            let lst = LstHeader::decode(&buf[..filled])?;
            self.lst = Some(lst);
        }
        self.lst
            .as_ref()
            .ok_or_else(|| SomError::Io(io::Error::other("LST header unavailable")))
    }

    /// Walks the SOM directory and decodes one member header per entry,
    /// in directory order.
    ///
    /// Enumeration is best-effort: an entry whose header cannot be read
    /// is dropped from the result, logged, and recorded in
    /// [`Archive::warnings`]. The list may therefore be shorter than
    /// `module_limit` without the call failing.
    pub fn member_headers(&mut self) -> Result<&[MemberHeader]> {
        if self.members.is_none() {
            let lst = *self.lst_header()?;
            let file = self.file_mut()?;
            let file_len = file.seek(SeekFrom::End(0))?;

            let dir_start = LST_HEADER_OFFSET + u64::from(lst.dir_loc);
            let dir_len = u64::from(lst.module_limit) * DIRECTORY_ENTRY_SIZE;
            if dir_start + dir_len > file_len {
                return Err(SomError::TruncatedData(format!(
                    "SOM directory of {} entries at offset {dir_start} past end of \
                     {file_len}-byte archive",
                    lst.module_limit
                )));
            }
            file.seek(SeekFrom::Start(dir_start))?;
            let mut dir = vec![0u8; dir_len as usize];
            file.read_exact(&mut dir)?;

            let mut members = Vec::with_capacity(lst.module_limit as usize);
            let mut warnings = Vec::new();
            let mut cur = ByteCursor::big_endian(&dir);
            for index in 0..lst.module_limit {
                let som_offset = u64::from(cur.read_u32()?);
                let som_size = u64::from(cur.read_u32()?);
                match Self::read_member_header(file, som_offset, som_size) {
                    Ok(member) => members.push(member),
                    Err(err) => {
                        log::warn!("dropping archive member {index}: {err}");
                        warnings.push(format!("member {index}: {err}"));
                    }
                }
            }
            self.warnings.extend(warnings);
            self.members = Some(members);
        }
        Ok(self.members.get_or_insert_with(Vec::new).as_slice())
    }

    fn read_member_header(file: &mut File, som_offset: u64, som_size: u64) -> Result<MemberHeader> {
        let header_pos = som_offset.checked_sub(MEMBER_HEADER_SIZE as u64).ok_or_else(|| {
            SomError::TruncatedData(format!(
                "member header would start before offset 0 (som_offset {som_offset})"
            ))
        })?;
        file.seek(SeekFrom::Start(header_pos))?;
        let mut buf = [0u8; MEMBER_HEADER_SIZE];
        let filled = read_at_most(file, &mut buf)?;
        MemberHeader::decode(&buf[..filled], som_offset, som_size)
    }

    /// Writes each selected member's SOM bytes to
    /// `out_dir/"<index>_<name>"`, `index` counting the members actually
    /// written, and returns those file names in order.
    pub fn extract_members<P: AsRef<Path>>(
        &mut self,
        out_dir: P,
        name_filter: Option<&str>,
    ) -> Result<Vec<String>> {
        let members = self.member_headers()?.to_vec();
        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)?;

        let file = self.file_mut()?;
        let mut written = Vec::new();
        for member in &members {
            if name_filter.is_some_and(|want| want != member.name) {
                continue;
            }
            file.seek(SeekFrom::Start(member.som_offset))?;
            let mut data = vec![0u8; member.som_size as usize];
            file.read_exact(&mut data).map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    SomError::TruncatedData(format!(
                        "member {} claims {} bytes at offset {}",
                        member.name, member.som_size, member.som_offset
                    ))
                } else {
                    SomError::Io(e)
                }
            })?;
            let file_name = format!("{}_{}", written.len(), member.name);
            std::fs::write(out_dir.join(&file_name), &data)?;
            log::info!("extracted {file_name} ({} bytes)", member.som_size);
            written.push(file_name);
        }
        Ok(written)
    }

    /// Opens a member's SOM region with its own handle.
    pub fn som_file(&self, member: &MemberHeader) -> Result<SomFile<File>> {
        SomFile::open_at(&self.path, member.som_offset)
    }
}
