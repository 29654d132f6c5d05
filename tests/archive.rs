use std::path::Path;

use spage::spage::storage::segment_path;
use spage::{
    Handle, InnerHeader, Mode, Page, PageReader, PageType, Record, RollSize, Spage, SpageError,
    SpageWriter, Value, WriterOptions, keys,
};
use tempfile::TempDir;

fn batch(id: &str) -> InnerHeader {
    let mut header = InnerHeader::new();
    header.insert(keys::BATCH_ID.into(), Value::from(id));
    header
}

fn write_records(base: &Path, options: WriterOptions, range: std::ops::Range<usize>) {
    let mut writer = SpageWriter::open(base, options).unwrap();
    for idx in range {
        let url = format!("http://www.test.com/{}", idx);
        let body = format!("payload number {}", idx);
        writer
            .write(&url, Some(&batch("archive")), None, Some(body.as_bytes()), true)
            .unwrap();
    }
    writer.close().unwrap();
}

fn read_records(base: &Path) -> Vec<Record> {
    let mut reader = PageReader::<Spage>::open(base).unwrap();
    let records = reader.read().collect::<Result<Vec<_>, _>>().unwrap();
    assert!(!reader.decoder().is_truncated());
    reader.close();
    records
}

fn check_records(records: &[Record], count: usize) {
    assert_eq!(records.len(), count);
    for (idx, record) in records.iter().enumerate() {
        assert_eq!(record.url, format!("http://www.test.com/{}", idx));
        assert_eq!(record.inner_str(keys::BATCH_ID), Some("archive"));
        let body = record.decompressed_data().unwrap().unwrap();
        assert_eq!(body, format!("payload number {}", idx).into_bytes());
    }
}

#[test]
fn test_write_and_read_archive() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("pages");

    write_records(&base, WriterOptions::default(), 0..5);

    assert!(segment_path(&base, 0).exists());
    assert!(!segment_path(&base, 1).exists());
    check_records(&read_records(&base), 5);
}

#[test]
fn test_archive_rolls_over() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("pages");
    let options = WriterOptions {
        roll_size: RollSize::from(100),
        ..WriterOptions::default()
    };

    write_records(&base, options, 0..4);

    for idx in 0..4 {
        assert!(segment_path(&base, idx).exists(), "missing file {}", idx);
    }
    assert!(!segment_path(&base, 4).exists());
    check_records(&read_records(&base), 4);
}

#[test]
fn test_reopened_archive_is_appended() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("pages");
    let options = WriterOptions {
        roll_size: RollSize::from(100),
        ..WriterOptions::default()
    };

    write_records(&base, options.clone(), 0..2);
    write_records(&base, options, 2..3);

    assert!(segment_path(&base, 2).exists());
    check_records(&read_records(&base), 3);
}

#[test]
fn test_rejected_record_leaves_archive_untouched() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("pages");

    let mut writer = SpageWriter::open(&base, WriterOptions::default()).unwrap();
    let err = writer.write("not a url", None, None, Some(b"data"), true).unwrap_err();
    assert!(matches!(err, SpageError::Validation { .. }));
    writer.close().unwrap();

    assert_eq!(std::fs::metadata(segment_path(&base, 0)).unwrap().len(), 0);
}

#[test]
fn test_open_file_modes() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("pages");

    match spage::open_file(&base, Mode::Write(WriterOptions::default())).unwrap() {
        Handle::Writer(mut writer) => {
            writer
                .write("http://www.test.com/0", None, None, Some(b"hello"), false)
                .unwrap();
            writer.close().unwrap();
        }
        Handle::Reader(_) => panic!("expected a writer"),
    }

    match spage::open_file(&base, Mode::Read(PageType::Spage)).unwrap() {
        Handle::Reader(mut reader) => {
            assert_eq!(reader.page_type(), PageType::Spage);
            let pages: Vec<Page> = reader.read().map(Result::unwrap).collect();
            assert_eq!(pages.len(), 1);
            match &pages[0] {
                Page::Spage(record) => {
                    assert_eq!(record.decompressed_data().unwrap().as_deref(), Some(&b"hello"[..]))
                }
                other => panic!("unexpected page {:?}", other),
            }
            reader.close();
        }
        Handle::Writer(_) => panic!("expected a reader"),
    }
}

#[test]
fn test_missing_archive_fails_to_open() {
    let dir = TempDir::new().unwrap();
    let err = PageReader::<Spage>::open(dir.path().join("absent")).err().unwrap();
    assert!(matches!(err, SpageError::Io(_)));
}

#[test]
fn test_roll_size_parsing() {
    assert_eq!("1G".parse::<RollSize>().unwrap().bytes(), 1 << 30);
    assert_eq!("10m".parse::<RollSize>().unwrap().bytes(), 10 << 20);
    assert_eq!("512K".parse::<RollSize>().unwrap().bytes(), 512 << 10);
    assert_eq!("4096".parse::<RollSize>().unwrap().bytes(), 4096);
    assert_eq!(RollSize::default().bytes(), 1 << 30);

    for bad in ["", "0", "G", "abc", "-1M", "1T"] {
        assert!(
            matches!(bad.parse::<RollSize>(), Err(SpageError::InvalidRollSize(_))),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_page_type_parsing() {
    assert_eq!("spage".parse::<PageType>().unwrap(), PageType::Spage);
    assert_eq!("offpage".parse::<PageType>().unwrap(), PageType::Offpage);
    assert_eq!("s2o".parse::<PageType>().unwrap(), PageType::SpageToOffpage);
    assert_eq!(PageType::SpageToOffpage.to_string(), "s2o");
    assert!(matches!(
        "html".parse::<PageType>(),
        Err(SpageError::UnsupportedPageType(_))
    ));
}
