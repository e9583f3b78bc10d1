//! Access to source files by URI scheme.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use url::Url;

use crate::error::{Error, Result};

/// Storage backend for one URI scheme.
pub trait FileInput {
    /// Concrete files denoted by `uri`. A `*` in the last path segment is
    /// expanded; the result is sorted.
    fn list_files(&self, uri: &Url) -> Result<Vec<Url>>;

    fn open(&self, uri: &Url) -> Result<Box<dyn Read>>;
}

/// `file://` URIs on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFsFileInput;

impl FileInput for LocalFsFileInput {
    fn list_files(&self, uri: &Url) -> Result<Vec<Url>> {
        let path = uri
            .to_file_path()
            .map_err(|_| Error::Uri(uri.to_string()))?;
        let Some(pattern) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(vec![uri.clone()]);
        };
        if !pattern.contains('*') {
            return Ok(vec![uri.clone()]);
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("/"));
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if entry.file_type()?.is_file() && matches_wildcard(pattern, name) {
                let url = Url::from_file_path(entry.path())
                    .map_err(|_| Error::Uri(entry.path().display().to_string()))?;
                files.push(url);
            }
        }
        files.sort();
        tracing::trace!(pattern, matched = files.len(), "expanded file glob");
        Ok(files)
    }

    fn open(&self, uri: &Url) -> Result<Box<dyn Read>> {
        let path = uri
            .to_file_path()
            .map_err(|_| Error::Uri(uri.to_string()))?;
        Ok(Box::new(File::open(path)?))
    }
}

/// File inputs keyed by URI scheme.
#[derive(Default)]
pub struct FileInputs {
    by_scheme: HashMap<String, Box<dyn FileInput>>,
}

impl FileInputs {
    /// Only the local file system (`file`).
    pub fn local() -> Self {
        Self::default().with("file", LocalFsFileInput)
    }

    pub fn with(mut self, scheme: impl Into<String>, input: impl FileInput + 'static) -> Self {
        self.by_scheme.insert(scheme.into(), Box::new(input));
        self
    }

    pub fn get(&self, uri: &Url) -> Result<&dyn FileInput> {
        self.by_scheme
            .get(uri.scheme())
            .map(|b| b.as_ref())
            .ok_or_else(|| Error::UnsupportedScheme(uri.scheme().to_string()))
    }
}

/// Parse `uri`, treating anything without a scheme as a local path
/// (relative paths are resolved against the working directory).
pub fn parse_uri(uri: &str) -> Result<Url> {
    match Url::parse(uri) {
        // single-letter schemes are Windows drive letters
        Ok(url) if url.scheme().len() > 1 => Ok(url),
        _ => {
            let path = Path::new(uri);
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()?.join(path)
            };
            Url::from_file_path(&absolute).map_err(|_| Error::Uri(uri.to_string()))
        }
    }
}

/// Glob match where `*` matches any run of characters.
fn matches_wildcard(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return pattern == name,
    };
    let Some(mut remaining) = name.strip_prefix(first) else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return remaining.is_empty();
    };
    for part in middle {
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matching() {
        assert!(matches_wildcard("*.json", "a.json"));
        assert!(matches_wildcard("part-*.csv", "part-0001.csv"));
        assert!(matches_wildcard("*", "anything"));
        assert!(matches_wildcard("a*b*c", "axxbyyc"));
        assert!(!matches_wildcard("*.json", "a.csv"));
        assert!(!matches_wildcard("a*a", "a"));
    }

    #[test]
    fn bare_paths_become_file_urls() {
        let url = parse_uri("/tmp/data.json").unwrap();
        assert_eq!(url.scheme(), "file");
        assert_eq!(url.path(), "/tmp/data.json");
        assert_eq!(parse_uri("file:///tmp/x.csv").unwrap().path(), "/tmp/x.csv");
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let inputs = FileInputs::local();
        let url = parse_uri("s3://bucket/key.json").unwrap();
        assert!(matches!(inputs.get(&url), Err(Error::UnsupportedScheme(s)) if s == "s3"));
    }

    #[test]
    fn glob_in_last_segment_is_expanded() {
        let dir = std::env::temp_dir().join(format!("shardplan-io-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["b.json", "a.json", "c.csv"] {
            fs::write(dir.join(name), "{}\n").unwrap();
        }
        let pattern = parse_uri(&format!("{}/*.json", dir.display())).unwrap();
        let files = LocalFsFileInput.list_files(&pattern).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|u| u.path_segments().and_then(|s| s.last()).unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
