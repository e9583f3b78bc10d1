//! Logical data types. Pure data; no Arrow dependency here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::PlannerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    Undefined,
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
    Date64,
    Decimal128,
    /// Nested object (e.g. a JSON document read from a file).
    Object,
}

impl DataType {
    /// Rough per-value width used by row-size estimates.
    ///
    /// Variable-width types take their estimate from the config.
    pub fn estimated_width(&self, cfg: &PlannerConfig) -> u64 {
        match self {
            DataType::Undefined => 0,
            DataType::Boolean => 1,
            DataType::Int32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::Float64 | DataType::Date64 => 8,
            DataType::Decimal128 => 16,
            DataType::Utf8 => cfg.utf8_width_bytes,
            DataType::Binary | DataType::Object => cfg.binary_width_bytes,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Undefined => "undefined",
            DataType::Boolean => "boolean",
            DataType::Int32 => "integer",
            DataType::Int64 => "long",
            DataType::Float32 => "float",
            DataType::Float64 => "double",
            DataType::Utf8 => "text",
            DataType::Binary => "binary",
            DataType::Date64 => "timestamp",
            DataType::Decimal128 => "decimal",
            DataType::Object => "object",
        };
        f.write_str(s)
    }
}
