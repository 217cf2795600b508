use alloc::boxed::Box;
use core::{fmt, time::Duration};

/// Construction-time configuration of an [`InputStream`](crate::InputStream).
///
/// # Examples
///
/// ```rust
/// use ibuffer::{InputStream, MemoryBackend, StreamOptions};
///
/// let options = StreamOptions {
///     size: Some(5),
///     read_chunk_size: 2,
///     ..Default::default()
/// };
/// let stream = InputStream::with_options(MemoryBackend::new(b"hello world"), &options);
/// assert_eq!(stream.v_size(), 5);
/// ```
///
/// # Default
///
/// An unbounded stream starting at source offset 0 with a 4 KiB initial
/// buffer, no buffer ceiling and unlimited read chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamOptions {
    /// Offset within the source that becomes logical offset 0.
    ///
    /// # Default
    ///
    /// `0`
    pub start_offset: u64,

    /// Logical size of the stream, or `None` when it is unknown.
    ///
    /// A bounded stream never reads past `start_offset + size`, and the read
    /// limit starts out equal to the size.
    ///
    /// # Default
    ///
    /// `None`
    pub size: Option<u64>,

    /// Number of bytes reserved for the buffer when the stream is created.
    ///
    /// # Default
    ///
    /// `4096`
    pub initial_capacity: usize,

    /// Upper bound on the buffer size. Once the unconsumed bytes fill it,
    /// reads report [`StreamError::BufferFull`](crate::StreamError::BufferFull).
    ///
    /// # Default
    ///
    /// `None`
    pub max_buffer_size: Option<usize>,

    /// Maximum number of bytes a single backend read appends. `0` lets the
    /// backend fill all spare buffer space.
    ///
    /// # Default
    ///
    /// `0`
    pub read_chunk_size: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            start_offset: 0,
            size: None,
            initial_capacity: 4096,
            max_buffer_size: None,
            read_chunk_size: 0,
        }
    }
}

/// Callback run by a blocking backend when a read times out.
pub type TimeoutCallback = Box<dyn FnMut()>;

/// Blocking behavior handed through to the backend by
/// [`InputStream::set_blocking`](crate::InputStream::set_blocking).
///
/// Passing `None` instead of a `BlockingMode` makes the backend non-blocking:
/// a source with no data ready yields `Ok(0)` from `read`.
#[derive(Default)]
pub struct BlockingMode {
    /// How long one read may wait for data. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Invoked once each time `timeout` elapses without data.
    pub on_timeout: Option<TimeoutCallback>,
}

impl BlockingMode {
    /// Blocking mode with a timeout and a callback.
    #[must_use]
    pub fn with_timeout(timeout: Duration, on_timeout: impl FnMut() + 'static) -> Self {
        Self {
            timeout: Some(timeout),
            on_timeout: Some(Box::new(on_timeout)),
        }
    }

    #[cfg_attr(not(feature = "std"), allow(dead_code))]
    pub(crate) fn timed_out(&mut self) {
        if let Some(callback) = self.on_timeout.as_mut() {
            callback();
        }
    }
}

impl fmt::Debug for BlockingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingMode")
            .field("timeout", &self.timeout)
            .field("on_timeout", &self.on_timeout.is_some())
            .finish()
    }
}
