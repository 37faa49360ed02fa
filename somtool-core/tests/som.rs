mod common;

use byteorder::{BigEndian, ByteOrder};
use common::*;
use somtool_core::symbols::{SS_GLOBAL, SS_UNSAT, ST_DATA, ST_PRI_PROG};
use somtool_core::{ObjectKind, SomError, SomFile};
use std::cell::Cell;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

/// `Read + Seek` wrapper that counts read calls, for cache verification.
struct CountingSource {
    inner: Cursor<Vec<u8>>,
    reads: Rc<Cell<usize>>,
}

impl CountingSource {
    fn new(bytes: Vec<u8>) -> (Self, Rc<Cell<usize>>) {
        let reads = Rc::new(Cell::new(0));
        (
            Self {
                inner: Cursor::new(bytes),
                reads: Rc::clone(&reads),
            },
            reads,
        )
    }
}

impl Read for CountingSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reads.set(self.reads.get() + 1);
        self.inner.read(buf)
    }
}

impl Seek for CountingSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// SOM image whose symbol table immediately follows the 128-byte header
/// and whose string blob follows the symbol table.
fn som_image(symbol_records: &[[u8; 20]], strings: &[u8]) -> Vec<u8> {
    let table_len: usize = symbol_records.len() * 20;
    let header = som_header_bytes(
        0x0210,
        0x0108,
        &[
            (SYMBOL_LOCATION, 128),
            (SYMBOL_TOTAL, 0), // patched by callers that know the logical count
            (SYMBOL_STRINGS_LOCATION, (128 + table_len) as u32),
            (SYMBOL_STRINGS_SIZE, strings.len() as u32),
        ],
    );
    let mut image = header.to_vec();
    for record in symbol_records {
        image.extend_from_slice(record);
    }
    image.extend_from_slice(strings);
    image
}

fn set_symbol_total(image: &mut [u8], total: u32) {
    BigEndian::write_u32(&mut image[SYMBOL_TOTAL..SYMBOL_TOTAL + 4], total);
}

#[test]
fn level3_symbol_consumes_base_extension_and_descriptors() {
    // 7 args at check level 3: 1 base + 1 extension + ceil((7-3)/4) = 1
    // descriptor record, 60 bytes before the next symbol starts.
    let records = [
        symbol_record(ST_PRI_PROG, SS_GLOBAL, 3, 0, 0, 0x1000),
        extension_record(7),
        [0xee; 20], // descriptor array, skipped undecoded
        symbol_record(ST_DATA, SS_GLOBAL, 0, 0, 0, 0xbeef),
    ];
    let mut image = som_image(&records, &[]);
    set_symbol_total(&mut image, 2);

    let mut som = SomFile::from_reader(Cursor::new(image), 0).unwrap();
    let symbols = som.symbols().unwrap();
    assert_eq!(symbols.len(), 2);
    assert_eq!(symbols[0].symbol_value, 0x1000);
    assert!(symbols[0].is_function());
    // only correct skip arithmetic lands the cursor on the second base record
    assert_eq!(symbols[1].symbol_value, 0xbeef);
    assert_eq!(symbols[1].symbol_type, ST_DATA);
}

#[test]
fn level1_symbol_consumes_base_and_extension_only() {
    let records = [
        symbol_record(ST_PRI_PROG, SS_GLOBAL, 1, 0, 0, 0x2000),
        extension_record(2),
        symbol_record(ST_DATA, SS_GLOBAL, 0, 0, 0, 0xcafe),
    ];
    let mut image = som_image(&records, &[]);
    set_symbol_total(&mut image, 2);

    let mut som = SomFile::from_reader(Cursor::new(image), 0).unwrap();
    let symbols = som.symbols().unwrap();
    assert_eq!(symbols.len(), 2);
    assert_eq!(symbols[1].symbol_value, 0xcafe);
}

#[test]
fn level3_with_three_args_has_no_descriptor_records() {
    let records = [
        symbol_record(ST_PRI_PROG, SS_GLOBAL, 3, 0, 0, 0x3000),
        extension_record(3),
        symbol_record(ST_DATA, SS_GLOBAL, 0, 0, 0, 0xf00d),
    ];
    let mut image = som_image(&records, &[]);
    set_symbol_total(&mut image, 2);

    let mut som = SomFile::from_reader(Cursor::new(image), 0).unwrap();
    let symbols = som.symbols().unwrap();
    assert_eq!(symbols[1].symbol_value, 0xf00d);
}

#[test]
fn truncated_table_aborts_whole_decode() {
    let records = [symbol_record(ST_DATA, SS_GLOBAL, 0, 0, 0, 1)];
    let mut image = som_image(&records, &[]);
    set_symbol_total(&mut image, 3); // claims more records than exist

    let mut som = SomFile::from_reader(Cursor::new(image), 0).unwrap();
    assert!(matches!(som.symbols(), Err(SomError::TruncatedData(_))));
}

#[test]
fn truncated_descriptor_skip_aborts_decode() {
    // extension promises descriptor records the image does not contain
    let records = [
        symbol_record(ST_PRI_PROG, SS_GLOBAL, 3, 0, 0, 0),
        extension_record(9),
    ];
    let mut image = som_image(&records, &[]);
    set_symbol_total(&mut image, 1);

    let mut som = SomFile::from_reader(Cursor::new(image), 0).unwrap();
    assert!(matches!(som.symbols(), Err(SomError::TruncatedData(_))));
}

#[test]
fn symbol_and_string_caches_skip_repeat_io() {
    let (blob, offsets) = string_blob(&["main", "globals"]);
    let records = [
        symbol_record(ST_PRI_PROG, SS_GLOBAL, 0, offsets[0], 0, 0x100),
        symbol_record(ST_DATA, SS_GLOBAL, 0, offsets[1], 0, 0x200),
    ];
    let mut image = som_image(&records, &blob);
    set_symbol_total(&mut image, 2);

    let (source, reads) = CountingSource::new(image);
    let mut som = SomFile::from_reader(source, 0).unwrap();

    som.symbols().unwrap();
    som.string_table().unwrap();
    let after_first = reads.get();
    assert!(after_first > 0);

    let symbols = som.symbols().unwrap().to_vec();
    let table_len = som.string_table().unwrap().len();
    assert_eq!(reads.get(), after_first, "cached accessors re-read the source");
    assert_eq!(symbols.len(), 2);
    assert_eq!(table_len, blob.len());
}

#[test]
fn names_resolve_through_string_table() {
    let (blob, offsets) = string_blob(&["main", "counter"]);
    let records = [
        symbol_record(ST_PRI_PROG, SS_GLOBAL, 0, offsets[0], 0, 0),
        symbol_record(ST_DATA, SS_GLOBAL, 0, offsets[1], 0, 0),
        symbol_record(ST_DATA, SS_UNSAT, 0, 0, 0, 0),
    ];
    let mut image = som_image(&records, &blob);
    set_symbol_total(&mut image, 3);

    let mut som = SomFile::from_reader(Cursor::new(image), 0).unwrap();
    let names = som.symbol_names().unwrap();
    assert_eq!(names, ["main", "counter", ""]);
}

#[test]
fn decodes_at_nonzero_base_offset() {
    // SOM region embedded mid-file, as inside an archive member
    let records = [symbol_record(ST_DATA, SS_GLOBAL, 0, 0, 0, 0x42)];
    let mut region = som_image(&records, &[]);
    set_symbol_total(&mut region, 1);

    let mut file = vec![0xaa; 500];
    file.extend_from_slice(&region);

    let mut som = SomFile::from_reader(Cursor::new(file), 500).unwrap();
    assert_eq!(som.attributes().kind, ObjectKind::Exe);
    let symbols = som.symbols().unwrap();
    assert_eq!(symbols[0].symbol_value, 0x42);
}

#[test]
fn truncated_header_reports_counts() {
    let image = som_header_bytes(0x0210, 0x0107, &[]);
    let mut short = image[..100].to_vec();
    short[0] = 0x02;
    match SomFile::from_reader(Cursor::new(short), 0).unwrap_err() {
        SomError::TruncatedHeader {
            expected, actual, ..
        } => {
            assert_eq!(expected, 128);
            assert_eq!(actual, 100);
        }
        other => panic!("expected TruncatedHeader, got {other:?}"),
    }
}

#[test]
fn non_som_signature_fails_construction() {
    let mut image = som_header_bytes(0x0210, 0x0107, &[]).to_vec();
    image[0] = 0x7f;
    image[1] = b'E';
    assert!(matches!(
        SomFile::from_reader(Cursor::new(image), 0),
        Err(SomError::NotSom(_))
    ));
}
