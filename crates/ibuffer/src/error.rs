use thiserror::Error;

/// Failure reported by a stream operation or threaded through from the
/// backend.
///
/// The classic integer protocol (`-1` for end of stream or failure, `-2` for a
/// full buffer) is available through [`StreamError::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The stream was closed; buffered bytes can still be drained.
    #[error("stream closed")]
    Closed,
    /// The source has no more bytes, or the read window is exhausted.
    #[error("end of stream")]
    EndOfStream,
    /// The backend cannot grow its buffer any further without the caller
    /// consuming data first.
    #[error("input buffer is full")]
    BufferFull,
    /// The backend hit an unrecoverable I/O failure.
    #[error("backend I/O failure")]
    Backend,
}

impl StreamError {
    /// Negative status code of this error in the classic protocol.
    #[must_use]
    pub fn code(self) -> isize {
        match self {
            Self::BufferFull => -2,
            Self::Closed | Self::EndOfStream | Self::Backend => -1,
        }
    }
}

/// Outcome of [`InputStream::read_with_threshold`](crate::InputStream::read_with_threshold).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdStatus {
    /// More than `threshold` bytes are buffered.
    Enough,
    /// Some bytes are buffered, but no more than `threshold`; the stream
    /// ended or stopped producing.
    Partial,
    /// The backend reported a full buffer before the threshold was passed.
    BufferFull,
    /// Nothing is buffered and the stream has ended.
    Exhausted,
    /// Nothing is buffered yet and the backend would block.
    Pending,
}

impl ThresholdStatus {
    /// Integer status in the classic protocol: `1`, `0`, `-2` or `-1`.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Enough => 1,
            Self::Partial | Self::Pending => 0,
            Self::BufferFull => -2,
            Self::Exhausted => -1,
        }
    }

    /// Whether more than `threshold` bytes are available.
    #[must_use]
    pub fn is_enough(self) -> bool {
        matches!(self, Self::Enough)
    }
}
