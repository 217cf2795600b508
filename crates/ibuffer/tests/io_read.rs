#![expect(missing_docs)]

mod common;

use std::io::{self, BufRead, BufReader, Read};

use ibuffer::{Backend, BufferState, InputStream, MemoryBackend, StreamError};

use crate::common::{MESSAGE, init_logging};

#[test]
fn read_to_end_returns_every_byte() {
    init_logging();
    let mut stream = InputStream::new(MemoryBackend::chunked(MESSAGE, 7), 0, 0);
    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    assert_eq!(out, MESSAGE);
    assert_eq!(stream.v_offset(), MESSAGE.len() as u64);
}

#[test]
fn reads_continue_after_line_reads() {
    let stream = InputStream::new(MemoryBackend::new(MESSAGE), 0, 0);
    stream.read().unwrap();
    assert_eq!(stream.next_line().as_deref(), Some("From: alice@example.org".into()));

    let mut rest = String::new();
    (&stream).read_to_string(&mut rest).unwrap();
    assert!(rest.starts_with("To: bob@example.org\r\n"));
    assert!(rest.ends_with("at end"));
}

#[test]
fn std_buf_reader_sees_the_window() {
    let stream = InputStream::new(MemoryBackend::new(MESSAGE), 25, 19);
    let lines: Vec<String> = BufReader::new(stream).lines().map(Result::unwrap).collect();
    assert_eq!(lines, ["To: bob@example.org"]);
}

/// Backend with nothing to deliver yet.
struct Idle;

impl Backend for Idle {
    fn read(&mut self, _state: &mut BufferState) -> Result<usize, StreamError> {
        Ok(0)
    }

    fn skip_count(&mut self, state: &mut BufferState, count: u64) -> Result<(), StreamError> {
        state.advance(count);
        Ok(())
    }

    fn seek(&mut self, state: &mut BufferState, v_offset: u64) -> Result<(), StreamError> {
        state.reposition(v_offset);
        Ok(())
    }
}

#[test]
fn pending_backend_maps_to_would_block() {
    let mut stream = InputStream::new(Idle, 0, 0);
    let mut buf = [0; 8];
    let err = Read::read(&mut stream, &mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
}

#[test]
fn full_buffer_maps_to_other_error() {
    let mut stream = InputStream::new(MemoryBackend::new(MESSAGE), 0, 0);
    stream.set_max_size(Some(0));
    let err = Read::read(&mut stream, &mut [0; 8]).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Other);
    assert_eq!(err.into_inner().unwrap().to_string(), "input buffer is full");
}
