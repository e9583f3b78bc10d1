//! Lightweight logical value placeholders to avoid bringing Arrow into core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::schema::DataType;

/// A single value. Used for symbol literals and for rows produced by readers.
///
/// Equality and hashing are structural; floats compare by bit pattern so that
/// `Scalar` can key hash maps of symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

impl Scalar {
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::Null => DataType::Undefined,
            Scalar::Bool(_) => DataType::Boolean,
            Scalar::I32(_) => DataType::Int32,
            Scalar::I64(_) => DataType::Int64,
            Scalar::F32(_) => DataType::Float32,
            Scalar::F64(_) => DataType::Float64,
            Scalar::Str(_) => DataType::Utf8,
            Scalar::Bin(_) => DataType::Binary,
        }
    }

    /// Convert a parsed JSON value. Nested arrays/objects keep their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::I64(i),
                None => Scalar::F64(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Scalar::Str(s.clone()),
            Value::Array(_) | Value::Object(_) => Scalar::Str(value.to_string()),
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::I32(_) => 2,
            Scalar::I64(_) => 3,
            Scalar::F32(_) => 4,
            Scalar::F64(_) => 5,
            Scalar::Str(_) => 6,
            Scalar::Bin(_) => 7,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        use Scalar::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (F32(a), F32(b)) => a.to_bits() == b.to_bits(),
            (F64(a), F64(b)) => a.to_bits() == b.to_bits(),
            (Str(a), Str(b)) => a == b,
            (Bin(a), Bin(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use Scalar::*;
        state.write_u8(self.discriminant());
        match self {
            Null => {}
            Bool(b) => b.hash(state),
            I32(i) => i.hash(state),
            I64(i) => i.hash(state),
            F32(f) => f.to_bits().hash(state),
            F64(f) => f.to_bits().hash(state),
            Str(s) => s.hash(state),
            Bin(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Scalar::*;
        match self {
            Null => f.write_str("NULL"),
            Bool(b) => write!(f, "{b}"),
            I32(i) => write!(f, "{i}"),
            I64(i) => write!(f, "{i}"),
            F32(x) => write!(f, "{x}"),
            F64(x) => write!(f, "{x}"),
            Str(s) => write!(f, "'{s}'"),
            Bin(b) => write!(f, "[binary {} bytes]", b.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn float_scalars_hash_by_bits() {
        let mut set = HashSet::new();
        set.insert(Scalar::F64(1.5));
        assert!(set.contains(&Scalar::F64(1.5)));
        assert!(!set.contains(&Scalar::F64(2.5)));
        assert_eq!(Scalar::F64(f64::NAN), Scalar::F64(f64::NAN));
    }

    #[test]
    fn json_numbers_prefer_integers() {
        let v: serde_json::Value = serde_json::from_str(r#"{"a": 4, "b": 1.5, "c": {"x": 1}}"#).unwrap();
        assert_eq!(Scalar::from_json(&v["a"]), Scalar::I64(4));
        assert_eq!(Scalar::from_json(&v["b"]), Scalar::F64(1.5));
        assert_eq!(Scalar::from_json(&v["c"]), Scalar::Str(r#"{"x":1}"#.into()));
        assert_eq!(Scalar::from_json(&v["missing"]), Scalar::Null);
    }
}
