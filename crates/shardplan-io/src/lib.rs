#![forbid(unsafe_code)]
//! shardplan-io: the row-producing collaborator for file sources.
//!
//! Given source URIs, a list of line expressions, an optional compression
//! hint and an optional input format, `FileReadingIterator` yields one row
//! of `Scalar`s per non-blank input line.
//!
//! - JSON files are read line by line; each line is one JSON object.
//! - CSV files use their first line as the header; every record is turned
//!   into a compact JSON object (string values, header order) so both
//!   formats look alike to the expressions.
//! - Without a declared format it is inferred from the file extension,
//!   falling back to JSON.

pub mod buf;
pub mod compression;
pub mod error;
pub mod format;
pub mod input;
pub mod iterator;
pub mod readers;

pub use compression::Compression;
pub use error::{Error, Result};
pub use format::InputFormat;
pub use input::{parse_uri, FileInput, FileInputs, LocalFsFileInput};
pub use iterator::{FileReadingIterator, FileReadingOptions, LineExpression};
