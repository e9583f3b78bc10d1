use std::io::Read;

use super::LineSource;
use crate::buf::BoundedBufReader;
use crate::error::Result;

/// Newline-delimited JSON; lines are passed on byte for byte.
pub struct JsonLines<R: Read> {
    reader: BoundedBufReader<R>,
}

impl<R: Read> JsonLines<R> {
    pub fn new(reader: BoundedBufReader<R>) -> Self {
        Self { reader }
    }
}

impl<R: Read> LineSource for JsonLines<R> {
    fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        while let Some(line) = self.reader.next_line()? {
            if !line.iter().all(u8::is_ascii_whitespace) {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}
