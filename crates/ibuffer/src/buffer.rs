use alloc::vec::Vec;
use core::ops::Range;

use bstr::ByteSlice;

use crate::{StreamError, Window};

/// Smallest size the buffer grows to when it has to grow at all.
const MIN_CAPACITY: usize = 256;

/// Physical buffer of a stream together with its logical window.
///
/// `buffer[skip..pos]` holds the unconsumed bytes; they correspond to the
/// logical range `v_offset..v_offset + (pos - skip)`. Backends append at
/// `pos` through [`spare_capacity_mut`](Self::spare_capacity_mut) and
/// [`commit`](Self::commit), and reposition through
/// [`advance`](Self::advance) and [`reposition`](Self::reposition).
#[derive(Debug)]
pub struct BufferState {
    buffer: Vec<u8>,
    skip: usize,
    pos: usize,
    /// Everything in `skip..cr_lookup_pos` is known to hold no CR or LF.
    cr_lookup_pos: usize,
    last_cr: bool,
    window: Window,
}

impl BufferState {
    pub(crate) fn new(window: Window) -> Self {
        Self {
            buffer: Vec::new(),
            skip: 0,
            pos: 0,
            cr_lookup_pos: 0,
            last_cr: false,
            window,
        }
    }

    /// Logical window of the stream.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Number of buffered, unconsumed bytes.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.pos - self.skip
    }

    /// Physical size of the buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Source offset of the next byte a backend read must deliver.
    #[must_use]
    pub fn source_offset(&self) -> u64 {
        self.window.physical_offset() + self.buffered() as u64
    }

    /// How many more bytes may be appended before the read limit, `None`
    /// when the stream has no limit.
    #[must_use]
    pub fn read_budget(&self) -> Option<u64> {
        self.window
            .remaining()
            .map(|remaining| remaining.saturating_sub(self.buffered() as u64))
    }

    /// Makes sure the buffer can hold at least `capacity` bytes without
    /// growing.
    pub fn reserve(&mut self, capacity: usize) {
        if self.buffer.len() < capacity {
            self.buffer.resize(capacity, 0);
        }
    }

    /// Free space at the end of the buffer, compacting or growing it first
    /// when it is full. At most `max_size` bytes are ever kept buffered.
    ///
    /// # Errors
    ///
    /// [`StreamError::BufferFull`] when `max_size` bytes are already
    /// buffered.
    pub fn spare_capacity_mut(&mut self, max_size: Option<usize>) -> Result<&mut [u8], StreamError> {
        let room = max_size.map_or(usize::MAX, |max| max.saturating_sub(self.buffered()));
        if room == 0 {
            return Err(StreamError::BufferFull);
        }
        if self.pos == self.buffer.len() && self.skip > 0 {
            self.compact();
        }
        if self.pos == self.buffer.len() {
            let grown = self
                .buffer
                .len()
                .saturating_mul(2)
                .max(MIN_CAPACITY)
                .min(self.pos.saturating_add(room));
            self.buffer.resize(grown, 0);
        }
        let end = self.buffer.len().min(self.pos.saturating_add(room));
        Ok(&mut self.buffer[self.pos..end])
    }

    /// Marks `count` bytes written into the spare capacity as valid.
    pub fn commit(&mut self, count: usize) {
        debug_assert!(self.pos + count <= self.buffer.len());
        self.pos += count;
    }

    /// Moves the read position `count` bytes forward without buffering them.
    /// Only valid once the buffer has been drained.
    pub fn advance(&mut self, count: u64) {
        debug_assert_eq!(self.buffered(), 0, "advance with buffered data");
        if count > 0 {
            // Bytes behind `skip` no longer precede the read position.
            self.discard();
        }
        self.window.advance(count);
    }

    /// Moves the read position to `v_offset`. Bytes still held in the
    /// buffer are reused when the target falls inside them; otherwise the
    /// buffer is emptied.
    pub fn reposition(&mut self, v_offset: u64) {
        let current = self.window.v_offset();
        let behind = current - v_offset.min(current);
        let ahead = v_offset.saturating_sub(current);

        if v_offset < current && behind <= self.skip as u64 {
            self.skip -= usize::try_from(behind).unwrap_or(self.skip);
            self.cr_lookup_pos = self.skip;
        } else if v_offset >= current && ahead <= self.buffered() as u64 {
            self.skip += usize::try_from(ahead).unwrap_or(0);
            self.cr_lookup_pos = self.cr_lookup_pos.max(self.skip);
        } else {
            self.discard();
        }
        self.last_cr = false;
        self.window.set_v_offset(v_offset);
    }

    /// Forgets every buffered byte. The logical position is unchanged.
    pub fn discard(&mut self) {
        self.skip = 0;
        self.pos = 0;
        self.cr_lookup_pos = 0;
        self.last_cr = false;
    }

    fn compact(&mut self) {
        self.buffer.copy_within(self.skip..self.pos, 0);
        self.pos -= self.skip;
        self.cr_lookup_pos = self.cr_lookup_pos.saturating_sub(self.skip);
        self.skip = 0;
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.buffer[self.skip..self.pos]
    }

    pub(crate) fn bytes(&self, range: Range<usize>) -> &[u8] {
        &self.buffer[range]
    }

    /// Consumes `count` buffered bytes.
    pub(crate) fn consume(&mut self, count: usize) {
        debug_assert!(count <= self.buffered());
        self.skip += count;
        self.cr_lookup_pos = self.cr_lookup_pos.max(self.skip);
        self.window.advance(count as u64);
    }

    /// Consumes everything buffered and returns how much that was.
    pub(crate) fn consume_all(&mut self) -> usize {
        let count = self.buffered();
        self.consume(count);
        count
    }

    pub(crate) fn rebase(&mut self, offset: u64) {
        if self.window.rebase(offset) {
            self.discard();
        }
    }

    pub(crate) fn set_read_limit(&mut self, limit: u64) {
        self.window.set_limit(limit);
        if let Some(remaining) = self.window.remaining() {
            let visible = usize::try_from(remaining).unwrap_or(usize::MAX);
            let end = self.skip.saturating_add(visible);
            if self.pos > end {
                self.pos = end;
                self.cr_lookup_pos = self.cr_lookup_pos.min(end);
            }
        }
    }

    /// Swallows the LF of a CRLF pair whose CR ended the previous line.
    pub(crate) fn skip_pending_lf(&mut self) {
        if !self.last_cr || self.skip >= self.pos {
            return;
        }
        if self.buffer[self.skip] == b'\n' {
            if self.skip == self.cr_lookup_pos {
                self.cr_lookup_pos += 1;
            }
            self.skip += 1;
            self.window.advance(1);
        }
        self.last_cr = false;
    }

    /// Finds the next CR- or LF-terminated line and consumes it together with
    /// its terminator. Returns the buffer range of the line's contents.
    pub(crate) fn next_line_range(&mut self) -> Option<Range<usize>> {
        self.skip_pending_lf();
        if self.skip >= self.pos {
            return None;
        }

        let from = self.cr_lookup_pos.max(self.skip);
        let Some(found) = self.buffer[from..self.pos].find_byteset(b"\r\n") else {
            self.cr_lookup_pos = self.pos;
            return None;
        };

        let end = from + found;
        self.last_cr = self.buffer[end] == b'\r';
        let line = self.skip..end;
        let consumed = end + 1 - self.skip;
        self.skip = end + 1;
        self.cr_lookup_pos = self.skip;
        self.window.advance(consumed as u64);
        Some(line)
    }

    #[cfg(test)]
    pub(crate) fn cursors(&self) -> (usize, usize, usize, bool) {
        (self.skip, self.pos, self.cr_lookup_pos, self.last_cr)
    }

    pub(crate) fn debug_check(&self) {
        debug_assert!(self.skip <= self.pos && self.pos <= self.buffer.len());
        debug_assert!(self.skip <= self.cr_lookup_pos && self.cr_lookup_pos <= self.pos);
        debug_assert!(
            self.window
                .limit()
                .is_none_or(|limit| self.window.v_offset() + self.buffered() as u64 <= limit),
            "buffered bytes cross the read limit"
        );
    }
}
