//! Planner configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Expected row count for a relation that has no statistics.
    pub default_row_count: u64,

    /// Per-value width estimate for text columns.
    pub utf8_width_bytes: u64,

    /// Per-value width estimate for binary and object columns.
    pub binary_width_bytes: u64,

    /// Capacity of the bounded read buffer used by file ingestion.
    pub reader_buffer_bytes: usize,

    /// Rows a merge phase fetches from each upstream per request.
    pub merge_batch_hint: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_row_count: 10_000,
            utf8_width_bytes: 32,
            binary_width_bytes: 64,
            reader_buffer_bytes: 64 * 1024,
            merge_batch_hint: 500,
        }
    }
}

impl PlannerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SHARDPLAN_DEFAULT_ROW_COUNT`: expected rows for relations without stats
    /// - `SHARDPLAN_UTF8_WIDTH_BYTES`: width estimate for text values
    /// - `SHARDPLAN_BINARY_WIDTH_BYTES`: width estimate for binary values
    /// - `SHARDPLAN_READER_BUFFER_BYTES`: file reader buffer capacity
    /// - `SHARDPLAN_MERGE_BATCH_HINT`: rows per merge fetch
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_parse::<u64>("SHARDPLAN_DEFAULT_ROW_COUNT") {
            cfg.default_row_count = v;
        }
        if let Some(v) = env_parse::<u64>("SHARDPLAN_UTF8_WIDTH_BYTES") {
            cfg.utf8_width_bytes = v;
        }
        if let Some(v) = env_parse::<u64>("SHARDPLAN_BINARY_WIDTH_BYTES") {
            cfg.binary_width_bytes = v;
        }
        if let Some(v) = env_parse::<usize>("SHARDPLAN_READER_BUFFER_BYTES") {
            cfg.reader_buffer_bytes = v;
        }
        if let Some(v) = env_parse::<usize>("SHARDPLAN_MERGE_BATCH_HINT") {
            cfg.merge_batch_hint = v;
        }

        cfg
    }

    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml_str(src: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reader_buffer_bytes == 0 {
            return Err(Error::Config("reader_buffer_bytes must be > 0".into()));
        }
        if self.merge_batch_hint == 0 {
            return Err(Error::Config("merge_batch_hint must be > 0".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}
