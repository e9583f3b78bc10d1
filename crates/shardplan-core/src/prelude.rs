//! Convenient re-exports for downstream crates.

pub use crate::config::PlannerConfig;
pub use crate::ddl::{RenameTableRequest, TableIdent};
pub use crate::error::{Error, Result};
pub use crate::id::{ColumnId, NodeId, PhaseId, RelationId, SubQueryId};
pub use crate::order_by::OrderBy;
pub use crate::schema::DataType;
pub use crate::symbol::{ColumnRef, Function, InputColumn, SelectSymbol, Symbol};
pub use crate::types::Scalar;
