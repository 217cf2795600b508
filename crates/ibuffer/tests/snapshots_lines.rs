#![expect(missing_docs)]

mod common;

use std::fmt::Write;

use ibuffer::{InputStream, MemoryBackend, ThresholdStatus};
use rstest::rstest;

use crate::common::{MESSAGE, init_logging};

/// One line per item: the offset after it and the line itself.
fn render_lines(chunk_size: usize) -> String {
    let stream = InputStream::new(MemoryBackend::chunked(MESSAGE, chunk_size), 0, 0);
    let mut out = String::new();
    for line in stream.lines() {
        let line = line.expect("memory backend failed");
        writeln!(out, "{} {line:?}", stream.v_offset()).unwrap();
    }
    out
}

/// One line per `read_with_threshold` call: the offset it started at, the
/// status and how many bytes it exposed. Everything exposed gets skipped.
fn render_thresholds(chunk_size: usize, threshold: usize) -> String {
    let stream = InputStream::new(MemoryBackend::chunked(MESSAGE, chunk_size), 0, 0);
    let mut out = String::new();
    loop {
        let offset = stream.v_offset();
        let (data, status) = stream.read_with_threshold(threshold);
        let size = data.len();
        drop(data);
        writeln!(out, "{offset} {status:?} {size}").unwrap();
        if status == ThresholdStatus::Exhausted {
            return out;
        }
        stream.skip(size as u64).unwrap();
    }
}

#[rstest]
#[case(3)]
#[case(16)]
#[case(0)]
fn chunk_size_does_not_change_lines(#[case] chunk_size: usize) {
    init_logging();
    assert_eq!(render_lines(chunk_size), render_lines(1));
}

#[test]
fn snapshot_lines() {
    init_logging();
    insta::assert_snapshot!(render_lines(1), @r#"
    24 "From: alice@example.org"
    45 "To: bob@example.org"
    62 "Subject: status"
    63 ""
    75 "first line"
    87 "second line"
    104 "no newline at end"
    "#);
}

#[test]
fn snapshot_thresholds() {
    init_logging();
    insta::assert_snapshot!(render_thresholds(16, 20), @r"
    0 Enough 32
    32 Enough 32
    64 Enough 32
    96 Partial 8
    104 Exhausted 0
    ");
}
