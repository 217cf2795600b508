//! Sources that fill an [`InputStream`](crate::InputStream).
//!
//! The stream never touches the source itself. Whenever its buffer cannot
//! satisfy a request it calls into a [`Backend`], handing over the
//! [`BufferState`] so that the backend can append bytes, drop them, or move
//! the read position.

#[cfg(feature = "std")]
pub mod file;
pub mod memory;

#[cfg(feature = "std")]
pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::{BlockingMode, BufferState, StreamError, StreamOptions};

/// OS-level descriptor a backend may expose.
pub type Descriptor = i32;

/// Operations a concrete source supplies to a stream.
///
/// All offsets are logical: the source offset of logical byte `n` is
/// `state.window().start_offset() + n`.
pub trait Backend {
    /// Appends whatever bytes are available to the buffer.
    ///
    /// Returns the number of bytes appended; `Ok(0)` means nothing is
    /// available yet. Implementations must not append past
    /// [`BufferState::read_budget`].
    ///
    /// # Errors
    ///
    /// [`StreamError::EndOfStream`] at the end of the source or the read
    /// window, [`StreamError::BufferFull`] when the buffer cannot take more
    /// bytes, [`StreamError::Backend`] on I/O failure.
    fn read(&mut self, state: &mut BufferState) -> Result<usize, StreamError>;

    /// Moves the read position `count` bytes forward. The buffer has already
    /// been drained.
    ///
    /// # Errors
    ///
    /// Backend-defined; the bundled backends never fail here.
    fn skip_count(&mut self, state: &mut BufferState, count: u64) -> Result<(), StreamError>;

    /// Moves the read position to `v_offset`.
    ///
    /// # Errors
    ///
    /// Backend-defined; the bundled backends never fail here.
    fn seek(&mut self, state: &mut BufferState, v_offset: u64) -> Result<(), StreamError>;

    /// Prepares the buffer when the stream is created.
    fn init(&mut self, state: &mut BufferState, options: &StreamOptions) {
        state.reserve(options.max_buffer_size.map_or(options.initial_capacity, |max| {
            options.initial_capacity.min(max)
        }));
        self.set_max_size(options.max_buffer_size);
    }

    /// Releases the underlying source. Called at most once.
    fn close(&mut self) {}

    /// Caps how many unconsumed bytes the buffer may hold.
    fn set_max_size(&mut self, _max_size: Option<usize>) {}

    /// Switches between blocking (`Some`) and non-blocking (`None`) reads.
    fn set_blocking(&mut self, _mode: Option<BlockingMode>) {}

    /// Descriptor of the source, if it has one.
    fn descriptor(&self) -> Option<Descriptor> {
        None
    }
}
