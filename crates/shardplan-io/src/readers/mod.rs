//! Per-format line sources.
//!
//! Every source yields the lines of one file as JSON object bytes; blank
//! lines never reach the caller.

pub mod csv;
pub mod json;

use crate::error::Result;

pub use self::csv::CsvLines;
pub use self::json::JsonLines;

pub trait LineSource {
    /// Next non-blank line, or `None` when the file is exhausted.
    fn next_line(&mut self) -> Result<Option<Vec<u8>>>;
}
