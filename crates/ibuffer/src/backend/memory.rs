//! Backend over an in-memory byte block.

use alloc::vec::Vec;

use super::Backend;
use crate::{BufferState, StreamError, StreamOptions};

/// Backend serving an in-memory block of bytes.
///
/// Reads hand out at most `chunk_size` bytes at a time, which makes it easy
/// to reproduce the partial reads of a real descriptor.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Vec<u8>,
    chunk_size: usize,
    max_size: Option<usize>,
    closed: bool,
}

impl MemoryBackend {
    /// Backend over `data`, delivering as much as fits per read.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Backend over `data`, delivering at most `chunk_size` bytes per read.
    pub fn chunked(data: impl Into<Vec<u8>>, chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::new(data)
        }
    }

    /// Whether the stream owning this backend was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Backend for MemoryBackend {
    fn read(&mut self, state: &mut BufferState) -> Result<usize, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        let offset = usize::try_from(state.source_offset()).unwrap_or(usize::MAX);
        let available = self.data.len().saturating_sub(offset);
        let budget = state
            .read_budget()
            .map_or(usize::MAX, |budget| usize::try_from(budget).unwrap_or(usize::MAX));
        if available == 0 || budget == 0 {
            log::trace!("memory backend: end of stream at source offset {offset}");
            return Err(StreamError::EndOfStream);
        }

        let chunk = if self.chunk_size == 0 { usize::MAX } else { self.chunk_size };
        let spare = state.spare_capacity_mut(self.max_size)?;
        let count = spare.len().min(available).min(budget).min(chunk);
        spare[..count].copy_from_slice(&self.data[offset..offset + count]);
        state.commit(count);
        log::trace!("memory backend: read {count} bytes at source offset {offset}");
        Ok(count)
    }

    fn skip_count(&mut self, state: &mut BufferState, count: u64) -> Result<(), StreamError> {
        state.advance(count);
        Ok(())
    }

    fn seek(&mut self, state: &mut BufferState, v_offset: u64) -> Result<(), StreamError> {
        state.reposition(v_offset);
        Ok(())
    }

    fn init(&mut self, state: &mut BufferState, options: &StreamOptions) {
        if self.chunk_size == 0 {
            self.chunk_size = options.read_chunk_size;
        }
        state.reserve(options.max_buffer_size.map_or(options.initial_capacity, |max| {
            options.initial_capacity.min(max)
        }));
        self.max_size = options.max_buffer_size;
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn set_max_size(&mut self, max_size: Option<usize>) {
        self.max_size = max_size;
    }
}
