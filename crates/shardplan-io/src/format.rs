//! Input format of a source file.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    /// One JSON object per line.
    Json,
    /// Header line followed by records.
    Csv,
}

impl InputFormat {
    /// Infer the format from the extension of `path`; anything that is not
    /// `.csv` or `.json` is read as JSON.
    pub fn detect(path: &str) -> InputFormat {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => InputFormat::Csv,
            Some("json") => InputFormat::Json,
            _ => InputFormat::Json,
        }
    }

    /// A declared format wins over the extension.
    pub fn resolve(declared: Option<InputFormat>, path: &str) -> InputFormat {
        declared.unwrap_or_else(|| Self::detect(path))
    }
}
