//! DDL request objects. Plain serializable values with field validation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdent {
    pub schema: String,
    pub name: String,
}

impl TableIdent {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn fqn(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqn())
    }
}

/// Rename a table (or all partitions of a partitioned table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameTableRequest {
    source: Option<TableIdent>,
    target: Option<TableIdent>,
    is_partitioned: bool,
}

impl RenameTableRequest {
    pub fn new(source: TableIdent, target: TableIdent, is_partitioned: bool) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            is_partitioned,
        }
    }

    pub fn source_table_ident(&self) -> Option<&TableIdent> {
        self.source.as_ref()
    }

    pub fn target_table_ident(&self) -> Option<&TableIdent> {
        self.target.as_ref()
    }

    pub fn is_partitioned(&self) -> bool {
        self.is_partitioned
    }

    /// Check every field and report all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        for (field, ident) in [("source", &self.source), ("target", &self.target)] {
            match ident {
                None => errors.push(format!("{field} table ident must not be null")),
                Some(t) => {
                    if t.schema.trim().is_empty() {
                        errors.push(format!("{field} schema name must not be empty"));
                    }
                    if t.name.trim().is_empty() {
                        errors.push(format!("{field} table name must not be empty"));
                    }
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
