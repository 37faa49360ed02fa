use crate::error::Result;
use crate::header::{self, SomFileHeader};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// What kind of module the `a_magic` word declares.
///
/// `Core` never comes out of [`Attribute::classify`]; it exists so the
/// enum covers the full family of module kinds the tooling talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Exe,
    SharedLib,
    Obj,
    Core,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Exe => "executable",
            ObjectKind::SharedLib => "shared library",
            ObjectKind::Obj => "object",
            ObjectKind::Core => "core",
        };
        write!(f, "{}", name)
    }
}

/// Semantic summary derived from a decoded SOM header.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub cpu: &'static str,
    pub kind: ObjectKind,
    pub debug: bool,
    pub little_endian: bool,
}

impl Attribute {
    pub fn classify(header: &SomFileHeader) -> Self {
        let cpu = match header.system_id {
            header::SID_PA_RISC_1_0 => "pa-risc_1.0",
            header::SID_PA_RISC_1_1 => "pa-risc_1.1",
            header::SID_PA_RISC_2_0 => "pa-risc_2.0",
            _ => "unknown",
        };
        let kind = match header.a_magic {
            header::MAGIC_EXEC_SOM_LIB
            | header::MAGIC_PRIV_EXEC
            | header::MAGIC_SHARE_EXEC
            | header::MAGIC_SHARE_DEMAND_LOAD_EXEC => ObjectKind::Exe,
            header::MAGIC_DYN_LOAD_LIB | header::MAGIC_SHARED_LIB => ObjectKind::SharedLib,
            _ => ObjectKind::Obj,
        };
        let debug = header.symbol_location != 0 || header.symbol_total != 0;
        Attribute {
            cpu,
            kind,
            debug,
            // PA-RISC has no little-endian variant
            little_endian: false,
        }
    }

    /// Classifies a header image without keeping any state around.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::classify(&SomFileHeader::decode(bytes)?))
    }

    /// Opens `path` just long enough to decode and classify its header.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let header = SomFileHeader::from_reader(&mut file)?;
        Ok(Self::classify(&header))
    }
}
