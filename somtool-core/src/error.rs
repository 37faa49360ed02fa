//! Error taxonomy for SOM and archive decoding.
//!
//! `thiserror` generates the `Error` impls; the variants map directly onto
//! the three failure classes a decode can hit: format violations, short
//! reads, and plain I/O failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SomError {
    /// The file does not start with the `!<arch>\n` archive magic.
    #[error("not an archive: missing `!<arch>` magic")]
    BadMagic,

    /// The first two header bytes are not a recognized SOM system id.
    #[error("not a SOM object: unrecognized system id {0:#06x}")]
    NotSom(u16),

    /// A fixed-size header was shorter than its format requires.
    #[error("truncated {what}: need {expected} bytes, have {actual}")]
    TruncatedHeader {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A read or skip ran past the end of the available data.
    #[error("truncated data: {0}")]
    TruncatedData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SomError>;
