use crate::attributes::Attribute;
use crate::error::Result;
use crate::header::SomFileHeader;
use crate::strings::StringTable;
use crate::symbols::{self, SomSymbol};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// One SOM object/executable region and its lazily decoded tables.
///
/// `base` is the byte offset of the SOM within its container — zero for a
/// standalone file, a directory entry's `som_offset` inside an archive.
/// The symbol and string tables are decoded at most once; repeated
/// accessor calls answer from the cache without touching the source.
///
/// Not internally synchronized; an instance belongs to one thread.
#[derive(Debug)]
pub struct SomFile<R> {
    source: R,
    base: u64,
    header: SomFileHeader,
    symbols: Option<Vec<SomSymbol>>,
    strings: Option<StringTable>,
}

impl SomFile<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_at(path, 0)
    }

    pub fn open_at<P: AsRef<Path>>(path: P, base: u64) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, base)
    }
}

impl<R: Read + Seek> SomFile<R> {
    /// Decodes the 128-byte header at `base` and keeps the source for the
    /// lazy table reads. Construction fails outright on a bad signature.
    pub fn from_reader(mut source: R, base: u64) -> Result<Self> {
        source.seek(SeekFrom::Start(base))?;
        let header = SomFileHeader::from_reader(&mut source)?;
        log::debug!(
            "SOM at offset {base}: system_id {:#06x}, a_magic {:#06x}",
            header.system_id,
            header.a_magic
        );
        Ok(Self {
            source,
            base,
            header,
            symbols: None,
            strings: None,
        })
    }

    pub fn header(&self) -> &SomFileHeader {
        &self.header
    }

    pub fn attributes(&self) -> Attribute {
        Attribute::classify(&self.header)
    }

    pub fn symbols(&mut self) -> Result<&[SomSymbol]> {
        if self.symbols.is_none() {
            let decoded = symbols::decode_symbols(&mut self.source, self.base, &self.header)?;
            self.symbols = Some(decoded);
        }
        Ok(self.symbols.get_or_insert_with(Vec::new).as_slice())
    }

    pub fn string_table(&mut self) -> Result<&StringTable> {
        if self.strings.is_none() {
            let table = StringTable::read(&mut self.source, self.base, &self.header)?;
            self.strings = Some(table);
        }
        Ok(self.strings.get_or_insert_with(StringTable::empty))
    }

    /// Symbol names in table order, resolved through the string table.
    pub fn symbol_names(&mut self) -> Result<Vec<String>> {
        self.symbols()?;
        self.string_table()?;
        let empty = StringTable::empty();
        let table = self.strings.as_ref().unwrap_or(&empty);
        let symbols = self.symbols.as_deref().unwrap_or_default();
        Ok(symbols.iter().map(|s| s.resolve_name(table)).collect())
    }
}
