use std::io::Cursor;

use spage::{OffpageDecoder, OffpageRecord, Page, PageType, Segment};

const URL: &str = "http://www.google.com/";

fn offpage_bytes(url: &str, content_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut raw = format!("\n{}\nKey1: Value1\nContent-Type: {}\n\n", url, content_type).into_bytes();
    raw.extend_from_slice(payload);
    raw.extend_from_slice(b"\n    ");
    raw
}

#[test]
fn test_segments_are_sliced_in_order() {
    let data1 = "a".repeat(10);
    let data2 = "b".repeat(11);
    let data3 = "c".repeat(12);
    let payload = format!("{}{}{}", data1, data2, data3);
    let raw = offpage_bytes(URL, "A, 10;B, 11;C, 12;", payload.as_bytes());

    let records: Vec<OffpageRecord> = OffpageDecoder::new(&raw[..]).map(Result::unwrap).collect();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.url, URL);
    assert_eq!(record.header.get("Key1").map(String::as_str), Some("Value1"));
    assert_eq!(
        record.segments,
        vec![
            Segment { name: "A".into(), size: 10 },
            Segment { name: "B".into(), size: 11 },
            Segment { name: "C".into(), size: 12 },
        ]
    );
    assert_eq!(record.data.get("A").map(Vec::as_slice), Some(data1.as_bytes()));
    assert_eq!(record.data.get("B").map(Vec::as_slice), Some(data2.as_bytes()));
    assert_eq!(record.data.get("C").map(Vec::as_slice), Some(data3.as_bytes()));
    let names: Vec<&str> = record.data.keys().map(String::as_str).collect();
    assert_eq!(names, ["A", "B", "C"]);
}

#[test]
fn test_runtime_reader_yields_offpage_pages() {
    let raw = offpage_bytes(URL, "A, 3;", b"xyz");
    let pages: Vec<Page> = spage::read(Cursor::new(raw), PageType::Offpage)
        .map(Result::unwrap)
        .collect();
    match pages.as_slice() {
        [Page::Offpage(record)] => {
            assert_eq!(record.data.get("A").map(Vec::as_slice), Some(&b"xyz"[..]))
        }
        other => panic!("unexpected pages {:?}", other),
    }
}

#[test]
fn test_negative_size_means_no_payload() {
    let raw = b"http://www.example.com/1\nContent-Type: A, -1;\n\n\
        http://www.example.com/2\nContent-Type: A, 2;\n\nok\n";

    let records: Vec<OffpageRecord> = OffpageDecoder::new(&raw[..]).map(Result::unwrap).collect();
    assert_eq!(records.len(), 2);
    assert!(records[0].data.is_empty());
    assert_eq!(records[1].url, "http://www.example.com/2");
    assert_eq!(records[1].data.get("A").map(Vec::as_slice), Some(&b"ok"[..]));
}

#[test]
fn test_original_size_series_is_parsed() {
    let raw = b"http://www.example.com/\n\
        Content-Type: snapshot, 3;\n\
        Original-Size: snapshot, 42;\n\
        \n\
        abc\n";

    let record = OffpageDecoder::new(&raw[..]).next().unwrap().unwrap();
    assert_eq!(record.original_sizes, vec![Segment { name: "snapshot".into(), size: 42 }]);
    assert_eq!(
        record.header.get("Original-Size").map(String::as_str),
        Some("snapshot, 42;")
    );
}

#[test]
fn test_parse_series_edge_cases() {
    assert!(OffpageRecord::parse_series("").is_empty());
    assert_eq!(
        OffpageRecord::parse_series("A,1;junk;B, x;"),
        vec![
            Segment { name: "A".into(), size: 1 },
            Segment { name: "B".into(), size: -1 },
        ]
    );
}

#[test]
fn test_truncated_segment_ends_sequence() {
    let raw = b"http://www.example.com/\nContent-Type: A, 2;B, 5;\n\nok";
    let mut decoder = OffpageDecoder::new(&raw[..]);
    assert!(decoder.next().is_none());
    assert!(decoder.is_truncated());
}

#[test]
fn test_url_inside_header_starts_next_record() {
    let raw = b"http://www.example.com/1\nKey1: Value1\n\
        http://www.example.com/2\nContent-Type: A, 1;\n\nz\n";

    let records: Vec<OffpageRecord> = OffpageDecoder::new(&raw[..]).map(Result::unwrap).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].url, "http://www.example.com/1");
    assert!(records[0].data.is_empty());
    assert_eq!(records[1].data.get("A").map(Vec::as_slice), Some(&b"z"[..]));
}
