use std::io::Cursor;
use std::sync::Arc;

use spage::spage::codec::compression;
use spage::spage::format::convert::SNAPSHOT;
use spage::{
    HttpHeader, OffpageDecoder, OffpageRecord, Page, PageType, RecordWriter,
    SpageToOffpageConverter, Validator,
};

fn convert(raw: &[u8]) -> Vec<Vec<u8>> {
    SpageToOffpageConverter::new(raw).map(Result::unwrap).collect()
}

fn decode_offpage(bytes: &[u8]) -> Vec<OffpageRecord> {
    OffpageDecoder::new(bytes).map(Result::unwrap).collect()
}

fn snapshot_of(record: &OffpageRecord) -> Vec<u8> {
    let stored = record.data.get(SNAPSHOT).expect("snapshot segment");
    compression::decompress(stored).unwrap()
}

#[test]
fn test_compressed_record_is_converted() {
    let mut http = HttpHeader::new();
    http.insert("Server".into(), "nginx".into());
    let mut raw = Vec::new();
    spage::write(&mut raw, "http://www.example.com/", None, Some(&http), Some(b"hello world"))
        .unwrap();

    let converted = convert(&raw);
    assert_eq!(converted.len(), 1);

    let records = decode_offpage(&converted[0]);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.url, "http://www.example.com/");
    assert_eq!(record.header.get("batchID").map(String::as_str), Some("__CHANGE_ME__"));
    assert!(!record.header.contains_key("Store-Size"));

    let snapshot = snapshot_of(record);
    assert_eq!(snapshot, b"Server: nginx\r\n\r\nhello world");
    assert_eq!(record.original_sizes[0].name, SNAPSHOT);
    assert_eq!(record.original_sizes[0].size, snapshot.len() as i64);
    assert_eq!(record.segments[0].size, record.data[SNAPSHOT].len() as i64);
}

#[test]
fn test_records_without_payload_are_still_converted() {
    let raw = b"http://www.example.com/a\n\
        batchID: a\n\
        \n\
        http://www.example.com/b\n\
        batchID: b\n\
        \n\
        \r\n";

    let converted = convert(raw);
    assert_eq!(converted.len(), 2);

    let empty = compression::compress(b"").unwrap();
    let mut expected = format!(
        "http://www.example.com/a\nbatchID: a\nContent-Type: snapshot, {};\nOriginal-Size: snapshot, 0;\n\n",
        empty.len()
    )
    .into_bytes();
    expected.extend_from_slice(&empty);
    expected.push(b'\n');
    assert_eq!(converted[0], expected);

    let second = decode_offpage(&converted[1]);
    assert_eq!(second[0].url, "http://www.example.com/b");
    assert_eq!(snapshot_of(&second[0]), b"\r\n");
}

#[test]
fn test_flat_payload_is_carried_verbatim() {
    let writer = RecordWriter::new(Arc::new(Validator::default()), false);
    let mut raw = Vec::new();
    writer
        .write(&mut raw, "http://www.example.com/flat", None, None, Some(b"plain text"))
        .unwrap();

    let converted = convert(&raw);
    let records = decode_offpage(&converted[0]);
    assert_eq!(snapshot_of(&records[0]), b"\r\nplain text");
}

#[test]
fn test_legacy_leading_crlf_is_shifted_before_conversion() {
    let raw = b"http://www.example.com/legacy\n\
        Store-Size: 6\n\
        \n\
        \r\n\
        \r\nabcdef\r\n";

    let converted = convert(raw);
    assert_eq!(converted.len(), 1);
    let records = decode_offpage(&converted[0]);
    assert_eq!(snapshot_of(&records[0]), b"\r\nabcdef");
}

#[test]
fn test_converted_stream_is_readable_as_offpage() {
    let mut raw = Vec::new();
    for idx in 0..3 {
        let url = format!("http://www.example.com/{}", idx);
        let body = format!("body {}", idx);
        spage::write(&mut raw, &url, None, None, Some(body.as_bytes())).unwrap();
    }

    let mut offpage = Vec::new();
    for page in spage::read(Cursor::new(raw), PageType::SpageToOffpage) {
        match page.unwrap() {
            Page::Converted(bytes) => offpage.extend_from_slice(&bytes),
            other => panic!("unexpected page {:?}", other),
        }
    }

    let records = decode_offpage(&offpage);
    assert_eq!(records.len(), 3);
    for (idx, record) in records.iter().enumerate() {
        assert_eq!(record.url, format!("http://www.example.com/{}", idx));
        assert_eq!(snapshot_of(record), format!("\r\nbody {}", idx).into_bytes());
    }
}

#[test]
fn test_truncated_payload_ends_conversion() {
    let raw = b"http://www.example.com/\nStore-Size: 20\n\n\r\n";
    let mut converter = SpageToOffpageConverter::new(&raw[..]);
    assert!(converter.next().is_none());
    assert!(converter.is_truncated());
}
