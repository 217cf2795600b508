//! The reader handle.
//!
//! Overview
//! - An [`InputStream`] is a reference to a shared record holding the
//!   physical buffer, its cursors, the logical [`Window`], the closed flag and
//!   the [`Backend`]. Cloning the handle (or calling
//!   [`retain`](InputStream::retain)) adds a reference; dropping it (or
//!   calling [`release`](InputStream::release)) removes one. The backend is
//!   torn down when the last reference goes away.
//! - Every operation keeps the physical cursors and the logical offsets in
//!   step: the unconsumed bytes `buffer[skip..pos]` always stand for the
//!   logical bytes `v_offset..v_offset + (pos - skip)`, clipped to the read
//!   limit.
//! - The backend is only consulted when the buffer cannot satisfy a request.
//!   Nothing here loops on a backend that has no data yet; that is the
//!   caller's (or the backend's blocking mode's) business.
//!
//! Views
//! - [`get_data`](InputStream::get_data), [`next_line`](InputStream::next_line)
//!   and [`read_with_threshold`](InputStream::read_with_threshold) hand out
//!   `Ref` guards into the buffer. They must be dropped before the next
//!   mutating call on any handle of the same stream.


use alloc::rc::Rc;
use core::{
    cell::{Ref, RefCell},
    fmt,
};

use bstr::{BStr, BString, ByteSlice};

use crate::{
    BlockingMode, BufferState, StreamError, StreamOptions, ThresholdStatus, Window,
    backend::{Backend, Descriptor},
    lines::Lines,
};

struct Inner<B: Backend> {
    state: BufferState,
    backend: B,
    closed: bool,
}

impl<B: Backend> Drop for Inner<B> {
    fn drop(&mut self) {
        log::debug!(
            "tearing down stream at v_offset {}",
            self.state.window().v_offset()
        );
        if !self.closed {
            self.closed = true;
            self.backend.close();
        }
    }
}

/// Buffered input stream over a [`Backend`].
///
/// # Examples
///
/// ```rust
/// use ibuffer::{InputStream, MemoryBackend};
///
/// let stream = InputStream::new(MemoryBackend::new(b"one\r\ntwo\n"), 0, 0);
/// stream.read().unwrap();
/// assert_eq!(stream.next_line().as_deref(), Some("one".into()));
/// assert_eq!(stream.next_line().as_deref(), Some("two".into()));
/// assert!(stream.next_line().is_none());
/// ```
pub struct InputStream<B: Backend> {
    inner: Rc<RefCell<Inner<B>>>,
}

impl<B: Backend> InputStream<B> {
    /// Stream over `backend` whose logical byte 0 is `start_offset` bytes into
    /// the source. A `v_size` of `0` means the size is unknown.
    pub fn new(backend: B, start_offset: u64, v_size: u64) -> Self {
        Self::with_options(
            backend,
            &StreamOptions {
                start_offset,
                size: (v_size != 0).then_some(v_size),
                ..StreamOptions::default()
            },
        )
    }

    /// Stream over `backend` configured by `options`.
    pub fn with_options(mut backend: B, options: &StreamOptions) -> Self {
        let window = Window::new(options.start_offset, options.size.unwrap_or(0));
        let mut state = BufferState::new(window);
        backend.init(&mut state, options);
        log::debug!(
            "created stream at start offset {} (size {:?})",
            options.start_offset,
            options.size
        );
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state,
                backend,
                closed: false,
            })),
        }
    }

    /// Adds a reference to the stream.
    #[must_use]
    pub fn retain(&self) -> Self {
        self.clone()
    }

    /// Drops this reference. The last release tears the backend down.
    pub fn release(self) {
        drop(self);
    }

    /// Number of live references to the stream.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Closes the stream. Bytes already buffered can still be consumed, but
    /// nothing new is read. Closing twice has no further effect.
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            return;
        }
        inner.closed = true;
        inner.backend.close();
        log::debug!(
            "closed stream at v_offset {} with {} bytes buffered",
            inner.state.window().v_offset(),
            inner.state.buffered()
        );
    }

    /// Whether [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Descriptor of the underlying source.
    #[must_use]
    pub fn descriptor(&self) -> Option<Descriptor> {
        self.inner.borrow().backend.descriptor()
    }

    /// Caps the buffer size; passed through to the backend.
    pub fn set_max_size(&self, max_size: Option<usize>) {
        self.inner.borrow_mut().backend.set_max_size(max_size);
    }

    /// Sets blocking behavior; passed through to the backend.
    pub fn set_blocking(&self, mode: Option<BlockingMode>) {
        self.inner.borrow_mut().backend.set_blocking(mode);
    }

    /// Runs `f` with the backend.
    pub fn with_backend<T>(&self, f: impl FnOnce(&B) -> T) -> T {
        f(&self.inner.borrow().backend)
    }

    /// Copy of the logical window.
    #[must_use]
    pub fn window(&self) -> Window {
        *self.inner.borrow().state.window()
    }

    /// Current logical read position.
    #[must_use]
    pub fn v_offset(&self) -> u64 {
        self.inner.borrow().state.window().v_offset()
    }

    /// Source offset of logical byte 0.
    #[must_use]
    pub fn start_offset(&self) -> u64 {
        self.inner.borrow().state.window().start_offset()
    }

    /// Logical size, `0` when unknown. See [`size`](Self::size) for a stream
    /// rebased onto its end.
    #[must_use]
    pub fn v_size(&self) -> u64 {
        self.inner.borrow().state.window().v_size()
    }

    /// Read limit, `0` when there is none. See [`limit`](Self::limit) for a
    /// limit left at offset 0 by a rebase.
    #[must_use]
    pub fn v_limit(&self) -> u64 {
        self.inner.borrow().state.window().v_limit()
    }

    /// Logical size, `None` when unknown.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.inner.borrow().state.window().size()
    }

    /// Read limit, `None` when there is none.
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        self.inner.borrow().state.window().limit()
    }

    /// Number of buffered, unconsumed bytes.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.inner.borrow().state.buffered()
    }

    /// Moves logical offset 0 to source offset `offset`, shifting the read
    /// position, size and limit so they keep pointing at the same source
    /// bytes. Everything buffered is dropped.
    ///
    /// # Panics
    ///
    /// If the stream is bounded and `offset` lies past its end.
    pub fn set_start_offset(&self, offset: u64) {
        let mut inner = self.inner.borrow_mut();
        inner.state.rebase(offset);
        log::debug!(
            "rebased stream to start offset {offset}, v_offset now {}",
            inner.state.window().v_offset()
        );
        inner.state.debug_check();
    }

    /// Caps reads at logical offset `v_offset`; `0` restores the cap to the
    /// stream size. Buffered bytes past the cap are dropped.
    ///
    /// # Panics
    ///
    /// If `v_offset` exceeds the size of a bounded stream or lies behind the
    /// current read position.
    pub fn set_read_limit(&self, v_offset: u64) {
        let mut inner = self.inner.borrow_mut();
        inner.state.set_read_limit(v_offset);
        log::debug!("read limit set to {:?}", inner.state.window().limit());
        inner.state.debug_check();
    }

    /// Asks the backend for more bytes once.
    ///
    /// Returns the number of bytes added; `Ok(0)` means nothing is available
    /// yet.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after [`close`](Self::close); otherwise
    /// whatever the backend reports.
    pub fn read(&self) -> Result<usize, StreamError> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        if inner.closed {
            return Err(StreamError::Closed);
        }
        let result = inner.backend.read(&mut inner.state);
        log::trace!("read: {result:?}");
        inner.state.debug_check();
        result
    }

    /// Skips `count` bytes, consuming buffered bytes first and leaving the
    /// rest to the backend.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] if the stream is closed and `count` exceeds
    /// the buffered bytes; otherwise whatever the backend reports.
    ///
    /// # Panics
    ///
    /// If the skip would pass the stream size or the read limit, or the
    /// resulting offset does not fit in a `u64`.
    pub fn skip(&self, count: u64) -> Result<(), StreamError> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let state = &mut inner.state;
        state.window().skip_target(count);

        if let Some(count) = usize::try_from(count).ok().filter(|&n| n <= state.buffered()) {
            state.consume(count);
            return Ok(());
        }
        if inner.closed {
            return Err(StreamError::Closed);
        }

        let drained = state.consume_all();
        let rest = count - drained as u64;
        log::trace!("skip: {drained} buffered bytes dropped, {rest} left to the backend");
        let result = inner.backend.skip_count(state, rest);
        state.debug_check();
        result
    }

    /// Moves the read position to `v_offset`.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after [`close`](Self::close); otherwise
    /// whatever the backend reports.
    ///
    /// # Panics
    ///
    /// If `v_offset` is past the stream size or the read limit.
    pub fn seek(&self, v_offset: u64) -> Result<(), StreamError> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        inner.state.window().check_target(v_offset);
        if inner.closed {
            return Err(StreamError::Closed);
        }
        log::trace!("seek to {v_offset}");
        let result = inner.backend.seek(&mut inner.state, v_offset);
        inner.state.debug_check();
        result
    }

    /// Next buffered line, without its CR, LF or CRLF terminator.
    ///
    /// Returns `None` when no complete line is buffered; call
    /// [`read`](Self::read) and try again. The search resumes where the last
    /// unsuccessful one stopped.
    pub fn next_line(&self) -> Option<Ref<'_, BStr>> {
        let range = self.inner.borrow_mut().state.next_line_range()?;
        Some(Ref::map(self.inner.borrow(), |inner| {
            inner.state.bytes(range).as_bstr()
        }))
    }

    /// The buffered, unconsumed bytes. Never calls the backend.
    pub fn get_data(&self) -> Ref<'_, [u8]> {
        self.inner.borrow_mut().state.skip_pending_lf();
        Ref::map(self.inner.borrow(), |inner| inner.state.data())
    }

    /// Reads until more than `threshold` bytes are buffered or the backend
    /// stops producing, then returns the buffered bytes.
    pub fn read_with_threshold(&self, threshold: usize) -> (Ref<'_, [u8]>, ThresholdStatus) {
        let status = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let mut last = Ok(0);
            loop {
                inner.state.skip_pending_lf();
                if inner.state.buffered() > threshold {
                    break;
                }
                last = if inner.closed {
                    Err(StreamError::Closed)
                } else {
                    inner.backend.read(&mut inner.state)
                };
                if !matches!(last, Ok(count) if count > 0) {
                    break;
                }
            }
            inner.state.skip_pending_lf();
            inner.state.debug_check();

            let size = inner.state.buffered();
            if size > threshold {
                ThresholdStatus::Enough
            } else if last == Err(StreamError::BufferFull) {
                ThresholdStatus::BufferFull
            } else if size > 0 {
                ThresholdStatus::Partial
            } else if last == Ok(0) {
                ThresholdStatus::Pending
            } else {
                ThresholdStatus::Exhausted
            }
        };
        log::trace!("read_with_threshold({threshold}): {status:?}");
        (Ref::map(self.inner.borrow(), |inner| inner.state.data()), status)
    }

    /// Iterator over the remaining lines, reading as needed.
    pub fn lines(&self) -> Lines<'_, B> {
        Lines::new(self)
    }

    /// Consumes `count` buffered bytes.
    pub(crate) fn consume(&self, count: usize) {
        self.inner.borrow_mut().state.consume(count);
    }

    /// Takes whatever is buffered as an owned string.
    pub(crate) fn take_buffered(&self) -> Option<BString> {
        let mut inner = self.inner.borrow_mut();
        inner.state.skip_pending_lf();
        if inner.state.buffered() == 0 {
            return None;
        }
        let tail = BString::from(inner.state.data());
        inner.state.consume_all();
        Some(tail)
    }
}

impl<B: Backend> Clone for InputStream<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> fmt::Debug for InputStream<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("InputStream")
            .field("window", inner.state.window())
            .field("buffered", &inner.state.buffered())
            .field("closed", &inner.closed)
            .field("refs", &Rc::strong_count(&self.inner))
            .finish()
    }
}
