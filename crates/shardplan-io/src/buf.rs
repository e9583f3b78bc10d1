//! Bounded buffered reading of source files.
//!
//! Readers never hold more than `capacity` bytes of a file in flight beyond
//! the line currently being assembled.

use std::io::{self, BufRead, BufReader, Read};

/// A thin wrapper over `BufReader` with a fixed capacity to bound in-flight bytes.
pub struct BoundedBufReader<R: Read> {
    inner: BufReader<R>,
    capacity: usize,
}

impl<R: Read> BoundedBufReader<R> {
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity, reader),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently buffered.
    pub fn buffer_len(&self) -> usize {
        self.inner.buffer().len()
    }

    /// Read the next line without its terminator (`\n` or `\r\n`).
    /// `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        if self.inner.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

impl<R: Read> Read for BoundedBufReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> BufRead for BoundedBufReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }
    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_lose_their_terminators() {
        let mut r = BoundedBufReader::with_capacity(4, &b"ab\r\ncd\nlast"[..]);
        assert_eq!(r.next_line().unwrap(), Some(b"ab".to_vec()));
        assert_eq!(r.next_line().unwrap(), Some(b"cd".to_vec()));
        assert_eq!(r.next_line().unwrap(), Some(b"last".to_vec()));
        assert_eq!(r.next_line().unwrap(), None);
        assert_eq!(r.capacity(), 4);
    }
}
