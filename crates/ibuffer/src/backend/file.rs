//! Backend over a seekable reader such as a [`File`].

use std::{
    fs::File,
    io::{self, ErrorKind, Read, Seek, SeekFrom},
    path::Path,
    time::Instant,
};

use super::{Backend, Descriptor};
use crate::{BlockingMode, BufferState, StreamError};

/// Backend reading from a seekable source, usually a [`File`].
///
/// The backend remembers where the source is positioned and only seeks when
/// the stream's logical position moved away from it (after a skip, a seek, a
/// rebase or a truncating read limit).
#[derive(Debug)]
pub struct FileBackend<R> {
    source: Option<R>,
    source_pos: Option<u64>,
    fd: Option<Descriptor>,
    max_size: Option<usize>,
    blocking: Option<BlockingMode>,
}

impl FileBackend<File> {
    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// Whatever [`File::open`] reports.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        File::open(path).map(Self::from_file)
    }

    /// Wraps an open file, recording its descriptor.
    #[must_use]
    pub fn from_file(file: File) -> Self {
        #[cfg(unix)]
        let fd = {
            use std::os::fd::AsRawFd;
            Some(file.as_raw_fd())
        };
        #[cfg(not(unix))]
        let fd = None;

        Self {
            fd,
            ..Self::new(file)
        }
    }
}

impl<R: Read + Seek> FileBackend<R> {
    /// Wraps any seekable reader.
    pub fn new(source: R) -> Self {
        Self {
            source: Some(source),
            source_pos: None,
            fd: None,
            max_size: None,
            blocking: None,
        }
    }

    /// The wrapped reader, `None` once the stream was closed.
    pub fn get_ref(&self) -> Option<&R> {
        self.source.as_ref()
    }

    fn position_source(&mut self, expected: u64) -> Result<(), StreamError> {
        let source = self.source.as_mut().ok_or(StreamError::Closed)?;
        if self.source_pos != Some(expected) {
            log::trace!("file backend: seeking source to {expected}");
            source.seek(SeekFrom::Start(expected)).map_err(|e| {
                log::error!("file backend: seek to {expected} failed: {e}");
                StreamError::Backend
            })?;
            self.source_pos = Some(expected);
        }
        Ok(())
    }
}

/// One read from `source`, retrying interrupted calls and, in blocking mode,
/// calls that would block. `None` means no data is ready yet.
fn read_once<R: Read>(
    source: &mut R,
    buf: &mut [u8],
    mut blocking: Option<&mut BlockingMode>,
) -> io::Result<Option<usize>> {
    let started = Instant::now();
    loop {
        match source.read(buf) {
            Ok(count) => return Ok(Some(count)),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                let Some(mode) = blocking.as_deref_mut() else {
                    return Ok(None);
                };
                if mode.timeout.is_some_and(|timeout| started.elapsed() >= timeout) {
                    log::warn!("file backend: read timed out after {:?}", mode.timeout);
                    mode.timed_out();
                    return Ok(None);
                }
                std::thread::yield_now();
            }
            Err(e) => return Err(e),
        }
    }
}

impl<R: Read + Seek> Backend for FileBackend<R> {
    fn read(&mut self, state: &mut BufferState) -> Result<usize, StreamError> {
        let expected = state.source_offset();
        let budget = state
            .read_budget()
            .map_or(usize::MAX, |budget| usize::try_from(budget).unwrap_or(usize::MAX));
        if budget == 0 {
            return Err(StreamError::EndOfStream);
        }

        self.position_source(expected)?;
        let Some(source) = self.source.as_mut() else {
            return Err(StreamError::Closed);
        };
        let spare = state.spare_capacity_mut(self.max_size)?;
        let len = spare.len().min(budget);

        match read_once(source, &mut spare[..len], self.blocking.as_mut()) {
            Ok(None) => Ok(0),
            Ok(Some(0)) => {
                log::trace!("file backend: end of file at {expected}");
                Err(StreamError::EndOfStream)
            }
            Ok(Some(count)) => {
                state.commit(count);
                self.source_pos = Some(expected + count as u64);
                log::trace!("file backend: read {count} bytes at {expected}");
                Ok(count)
            }
            Err(e) => {
                log::error!("file backend: read at {expected} failed: {e}");
                self.source_pos = None;
                Err(StreamError::Backend)
            }
        }
    }

    fn skip_count(&mut self, state: &mut BufferState, count: u64) -> Result<(), StreamError> {
        state.advance(count);
        Ok(())
    }

    fn seek(&mut self, state: &mut BufferState, v_offset: u64) -> Result<(), StreamError> {
        state.reposition(v_offset);
        Ok(())
    }

    fn close(&mut self) {
        log::debug!("file backend: closing descriptor {:?}", self.fd);
        self.source = None;
        self.source_pos = None;
    }

    fn set_max_size(&mut self, max_size: Option<usize>) {
        self.max_size = max_size;
    }

    fn set_blocking(&mut self, mode: Option<BlockingMode>) {
        self.blocking = mode;
    }

    fn descriptor(&self) -> Option<Descriptor> {
        self.fd
    }
}
