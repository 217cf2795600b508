#![no_main]

use arbitrary::Arbitrary;
use ibuffer::{InputStream, MemoryBackend, StreamError};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Read,
    Line,
    Skip(u16),
    Seek(u16),
    Threshold(u8),
    Limit(u16),
}

#[derive(Debug, Arbitrary)]
struct Input {
    data: Vec<u8>,
    chunk: u8,
    ops: Vec<Op>,
}

/// Lines terminated by CR, LF or CRLF, with the unterminated tail last.
fn split_lines(data: &[u8]) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut bytes = data.iter().copied().peekable();
    while let Some(byte) = bytes.next() {
        match byte {
            b'\r' => {
                lines.push(std::mem::take(&mut current));
                bytes.next_if_eq(&b'\n');
            }
            b'\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(byte),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn check_lines(input: &Input) {
    let stream = InputStream::new(
        MemoryBackend::chunked(input.data.as_slice(), usize::from(input.chunk)),
        0,
        0,
    );
    let lines: Vec<Vec<u8>> = stream
        .lines()
        .map(|line| line.expect("memory backend failed").into())
        .collect();
    assert_eq!(lines, split_lines(&input.data));
}

fn run_ops(input: &Input) {
    let size = input.data.len() as u64;
    let stream = InputStream::new(
        MemoryBackend::chunked(input.data.as_slice(), usize::from(input.chunk)),
        0,
        size,
    );
    for op in &input.ops {
        let v_offset = stream.v_offset();
        let limit = if stream.v_limit() == 0 { size } else { stream.v_limit() };
        match *op {
            Op::Read => match stream.read() {
                Ok(_) | Err(StreamError::EndOfStream) => {}
                Err(e) => panic!("unexpected read error {e}"),
            },
            Op::Line => {
                let _ = stream.next_line();
            }
            Op::Skip(n) => stream.skip(u64::from(n) % (limit - v_offset + 1)).unwrap(),
            Op::Seek(n) => stream.seek(u64::from(n) % (limit + 1)).unwrap(),
            Op::Threshold(t) => {
                let _ = stream.read_with_threshold(usize::from(t));
            }
            Op::Limit(n) => stream.set_read_limit(v_offset + u64::from(n) % (size - v_offset + 1)),
        }

        let window = stream.window();
        assert!(window.v_offset() <= window.v_limit() || window.v_limit() == 0);
        let data = stream.get_data();
        let offset = usize::try_from(stream.v_offset()).unwrap();
        assert!(input.data[offset..].starts_with(&data));
    }
}

fuzz_target!(|input: Input| {
    check_lines(&input);
    run_ops(&input);
});
