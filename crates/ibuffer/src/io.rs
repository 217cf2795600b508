//! [`std::io::Read`] on top of an [`InputStream`].

use std::io;

use crate::{InputStream, StreamError, backend::Backend};

impl<B: Backend> io::Read for &InputStream<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let stream: &InputStream<B> = *self;
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let copied = {
                let data = stream.get_data();
                let count = data.len().min(buf.len());
                buf[..count].copy_from_slice(&data[..count]);
                count
            };
            if copied > 0 {
                stream.consume(copied);
                return Ok(copied);
            }
            match InputStream::read(stream) {
                Ok(0) => return Err(io::ErrorKind::WouldBlock.into()),
                Ok(_) => {}
                Err(StreamError::EndOfStream | StreamError::Closed) => return Ok(0),
                Err(e) => return Err(io::Error::other(e)),
            }
        }
    }
}

impl<B: Backend> io::Read for InputStream<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream: &InputStream<B> = self;
        io::Read::read(&mut stream, buf)
    }
}
