use alloc::borrow::ToOwned;

use bstr::BString;

use crate::{InputStream, StreamError, backend::Backend};

/// Iterator over the lines of an [`InputStream`], reading from the backend
/// whenever no complete line is buffered.
///
/// At end of stream (or once the stream is closed) any unterminated tail is
/// returned as a final line. When the backend has nothing to offer yet the
/// iterator returns `None`; calling `next` again later resumes where it
/// stopped.
#[derive(Debug)]
pub struct Lines<'a, B: Backend> {
    stream: &'a InputStream<B>,
    done: bool,
}

impl<'a, B: Backend> Lines<'a, B> {
    pub(crate) fn new(stream: &'a InputStream<B>) -> Self {
        Self {
            stream,
            done: false,
        }
    }
}

impl<B: Backend> Iterator for Lines<'_, B> {
    type Item = Result<BString, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(line) = self.stream.next_line() {
                return Some(Ok((*line).to_owned()));
            }
            match self.stream.read() {
                Ok(0) => return None,
                Ok(_) => {}
                Err(StreamError::EndOfStream | StreamError::Closed) => {
                    self.done = true;
                    return self.stream.take_buffered().map(Ok);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
