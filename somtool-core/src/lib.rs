pub mod archive;
pub mod attributes;
pub mod cursor;
pub mod error;
pub mod header;
pub mod som;
pub mod strings;
pub mod symbols;

pub use archive::*;
pub use attributes::*;
pub use cursor::{ByteCursor, Endian, RecordCursor};
pub use error::{Result, SomError};
pub use header::*;
pub use som::*;
pub use strings::*;
pub use symbols::*;
