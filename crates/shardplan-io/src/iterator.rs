//! Rows from a set of source URIs.

use std::collections::VecDeque;

use serde_json::Value;
use shardplan_core::config::PlannerConfig;
use shardplan_core::hash::hash_str;
use shardplan_core::types::Scalar;
use url::Url;

use crate::buf::BoundedBufReader;
use crate::compression::Compression;
use crate::error::{Error, Result};
use crate::format::InputFormat;
use crate::input::{parse_uri, FileInputs};
use crate::readers::{CsvLines, JsonLines, LineSource};

/// Name of the expression that yields the whole line.
pub const RAW: &str = "_raw";

/// What a row column is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineExpression {
    /// The exact bytes of the (JSON object) line.
    Raw,
    /// A top-level field of the line's JSON object; `Null` when absent.
    Column(String),
}

impl LineExpression {
    pub fn from_name(name: &str) -> Self {
        if name == RAW {
            LineExpression::Raw
        } else {
            LineExpression::Column(name.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReadingOptions {
    pub compression: Compression,
    /// `None` infers the format per file from its extension.
    pub format: Option<InputFormat>,
    /// Whether all readers see the same files. Each file is then read by
    /// exactly one reader, chosen by a stable hash of its URI.
    pub shared: bool,
    pub num_readers: usize,
    pub reader_number: usize,
    pub buffer_bytes: usize,
}

impl Default for FileReadingOptions {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            format: None,
            shared: false,
            num_readers: 1,
            reader_number: 0,
            buffer_bytes: 64 * 1024,
        }
    }
}

impl FileReadingOptions {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            buffer_bytes: config.reader_buffer_bytes,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_readers == 0 {
            return Err(Error::Config("num_readers must be at least 1".into()));
        }
        if self.reader_number >= self.num_readers {
            return Err(Error::Config(format!(
                "reader_number {} out of range for {} readers",
                self.reader_number, self.num_readers
            )));
        }
        if self.buffer_bytes == 0 {
            return Err(Error::Config("buffer_bytes must be > 0".into()));
        }
        Ok(())
    }

    fn is_assigned(&self, file: &Url) -> bool {
        !self.shared
            || hash_str(file.as_str()).prefix_u64() % self.num_readers as u64
                == self.reader_number as u64
    }
}

/// Streams one row per non-blank line across all files of the given URIs,
/// file by file in listing order.
///
/// An error ends the current file; iteration continues with the next one.
pub struct FileReadingIterator {
    inputs: FileInputs,
    expressions: Vec<LineExpression>,
    options: FileReadingOptions,
    pending: VecDeque<Url>,
    current: Option<Box<dyn LineSource>>,
}

impl FileReadingIterator {
    pub fn new<S: AsRef<str>>(
        uris: impl IntoIterator<Item = S>,
        expressions: Vec<LineExpression>,
        inputs: FileInputs,
        options: FileReadingOptions,
    ) -> Result<Self> {
        options.validate()?;
        let mut pending = VecDeque::new();
        for uri in uris {
            let url = parse_uri(uri.as_ref())?;
            for file in inputs.get(&url)?.list_files(&url)? {
                if options.is_assigned(&file) {
                    pending.push_back(file);
                } else {
                    tracing::trace!(uri = %file, "file assigned to another reader");
                }
            }
        }
        Ok(Self {
            inputs,
            expressions,
            options,
            pending,
            current: None,
        })
    }

    fn open(&self, file: &Url) -> Result<Box<dyn LineSource>> {
        let raw = self.inputs.get(file)?.open(file)?;
        let decoded = self.options.compression.decoder(raw)?;
        let format = InputFormat::resolve(self.options.format, file.path());
        tracing::debug!(uri = %file, ?format, compression = ?self.options.compression, "opening source file");
        Ok(match format {
            InputFormat::Json => Box::new(JsonLines::new(BoundedBufReader::with_capacity(
                self.options.buffer_bytes,
                decoded,
            ))),
            InputFormat::Csv => Box::new(CsvLines::new(BoundedBufReader::with_capacity(
                self.options.buffer_bytes,
                decoded,
            ))),
        })
    }

    fn row(&self, line: Vec<u8>) -> Result<Vec<Scalar>> {
        let mut parsed: Option<Value> = None;
        let mut row = Vec::with_capacity(self.expressions.len());
        for expr in &self.expressions {
            match expr {
                LineExpression::Raw => row.push(Scalar::Bin(line.clone())),
                LineExpression::Column(name) => {
                    if parsed.is_none() {
                        parsed = Some(serde_json::from_slice(&line)?);
                    }
                    let value = parsed.as_ref().and_then(|v| v.get(name));
                    row.push(value.map(Scalar::from_json).unwrap_or(Scalar::Null));
                }
            }
        }
        Ok(row)
    }
}

impl Iterator for FileReadingIterator {
    type Item = Result<Vec<Scalar>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(source) = self.current.as_mut() {
                match source.next_line() {
                    Ok(Some(line)) => return Some(self.row(line)),
                    Ok(None) => self.current = None,
                    Err(e) => {
                        self.current = None;
                        return Some(Err(e));
                    }
                }
                continue;
            }
            let file = self.pending.pop_front()?;
            match self.open(&file) {
                Ok(source) => self.current = Some(source),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shardplan-io-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn column_expressions_read_json_fields() {
        let dir = temp_dir();
        let path = dir.join("rows.json");
        fs::write(&path, "{\"id\": 1, \"name\": \"a\"}\n{\"id\": 2}\n").unwrap();
        let rows: Vec<_> = FileReadingIterator::new(
            [path.display().to_string()],
            vec![LineExpression::from_name("id"), LineExpression::from_name("name")],
            FileInputs::local(),
            FileReadingOptions::default(),
        )
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Scalar::I64(1), Scalar::Str("a".into())],
                vec![Scalar::I64(2), Scalar::Null],
            ]
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn shared_files_are_split_between_readers() {
        let dir = temp_dir();
        for i in 0..8 {
            fs::write(dir.join(format!("part-{i}.json")), "{\"n\":1}\n").unwrap();
        }
        let glob = format!("{}/part-*.json", dir.display());
        let mut total = 0;
        for reader_number in 0..3 {
            let options = FileReadingOptions {
                shared: true,
                num_readers: 3,
                reader_number,
                ..FileReadingOptions::default()
            };
            let it = FileReadingIterator::new([&glob], vec![LineExpression::Raw], FileInputs::local(), options)
                .unwrap();
            total += it.count();
        }
        assert_eq!(total, 8);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn invalid_reader_numbers_are_rejected() {
        let options = FileReadingOptions {
            num_readers: 2,
            reader_number: 2,
            ..FileReadingOptions::default()
        };
        let err = FileReadingIterator::new(Vec::<String>::new(), vec![], FileInputs::local(), options)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_reported_and_iteration_continues() {
        let dir = temp_dir();
        let present = dir.join("b.json");
        fs::write(&present, "{}\n").unwrap();
        let mut it = FileReadingIterator::new(
            [dir.join("a.json").display().to_string(), present.display().to_string()],
            vec![LineExpression::Raw],
            FileInputs::local(),
            FileReadingOptions::default(),
        )
        .unwrap();
        assert!(matches!(it.next(), Some(Err(Error::Io(_)))));
        assert_eq!(it.next().unwrap().unwrap(), vec![Scalar::Bin(b"{}".to_vec())]);
        assert!(it.next().is_none());
        fs::remove_dir_all(&dir).unwrap();
    }
}
