use std::io::Read;

use serde_json::{Map, Value};

use super::LineSource;
use crate::error::Result;

/// CSV with a header line. Each record becomes a compact JSON object whose
/// keys follow the header order and whose values are strings.
pub struct CsvLines<R: Read> {
    reader: csv::Reader<R>,
    headers: Option<Vec<String>>,
    record: csv::StringRecord,
}

impl<R: Read> CsvLines<R> {
    pub fn new(reader: R) -> Self {
        // flexible: a blank line must reach the skip check below instead of
        // failing on its field count
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Self {
            reader,
            headers: None,
            record: csv::StringRecord::new(),
        }
    }

    fn headers(&mut self) -> Result<&[String]> {
        if self.headers.is_none() {
            let headers = self.reader.headers()?.iter().map(str::to_string).collect();
            self.headers = Some(headers);
        }
        Ok(self.headers.as_deref().unwrap_or_default())
    }
}

impl<R: Read> LineSource for CsvLines<R> {
    fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        self.headers()?;
        loop {
            if !self.reader.read_record(&mut self.record)? {
                return Ok(None);
            }
            if self.record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let headers = self.headers.as_deref().unwrap_or_default();
            let object: Map<String, Value> = headers
                .iter()
                .zip(self.record.iter())
                .map(|(h, v)| (h.clone(), Value::String(v.to_string())))
                .collect();
            return Ok(Some(serde_json::to_vec(&Value::Object(object))?));
        }
    }
}
