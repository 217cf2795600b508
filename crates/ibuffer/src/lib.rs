//! Buffered, virtual-offset-aware sequential input streams.
//!
//! An [`InputStream`] sits between a raw byte source (a [`Backend`]) and the
//! code consuming it. It keeps a logical read position that survives
//! rebasing and read limits, buffers whatever the backend delivers, and hands
//! out lines ([`InputStream::next_line`]), raw views
//! ([`InputStream::get_data`]) or "at least N bytes" views
//! ([`InputStream::read_with_threshold`]).
//!
//! ```rust
//! use ibuffer::{InputStream, MemoryBackend, ThresholdStatus};
//!
//! let stream = InputStream::new(MemoryBackend::chunked(b"HEAD 12\r\npayload", 4), 0, 0);
//! let header: Vec<_> = stream.lines().take(1).collect::<Result<_, _>>().unwrap();
//! assert_eq!(header, ["HEAD 12"]);
//!
//! let (data, status) = stream.read_with_threshold(6);
//! assert_eq!(status, ThresholdStatus::Enough);
//! assert_eq!(&data[..7], b"payload");
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod backend;
mod buffer;
mod error;
#[cfg(feature = "std")]
mod io;
mod lines;
mod options;
mod stream;
mod window;

#[cfg(test)]
mod tests;

#[cfg(feature = "std")]
pub use backend::FileBackend;
pub use backend::{Backend, Descriptor, MemoryBackend};
pub use buffer::BufferState;
pub use error::{StreamError, ThresholdStatus};
pub use lines::Lines;
pub use options::{BlockingMode, StreamOptions, TimeoutCallback};
pub use stream::InputStream;
pub use window::Window;
