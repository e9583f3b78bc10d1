//! What a (sub-)plan hands to its consumer: where the rows are, how they are
//! ordered, and which limit/offset is still outstanding.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shardplan_core::error::{Error, Result};
use shardplan_core::id::NodeId;
use shardplan_core::order_by::OrderBy;
use shardplan_core::schema::DataType;
use shardplan_core::symbol::Symbol;

/// Ordering expressed as positions into a row layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalOrderBy {
    pub indices: Vec<usize>,
    pub reverse_flags: Vec<bool>,
    pub nulls_first: Vec<Option<bool>>,
}

impl PositionalOrderBy {
    /// Locate each ordering symbol in `outputs`.
    pub fn of(order_by: &OrderBy, outputs: &[Symbol]) -> Result<Self> {
        let indices = order_by
            .order_by_symbols()
            .iter()
            .map(|s| {
                outputs.iter().position(|o| o == s).ok_or_else(|| {
                    Error::invariant(format!("ordering symbol {s} is not part of the outputs"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            indices,
            reverse_flags: order_by.reverse_flags().to_vec(),
            nulls_first: order_by.nulls_first().to_vec(),
        })
    }

    /// Translate positions from layout `from` into layout `to`; `None` if a
    /// sort key does not survive.
    pub fn remap(&self, from: &[Symbol], to: &[Symbol]) -> Option<Self> {
        let indices = self
            .indices
            .iter()
            .map(|&i| from.get(i).and_then(|s| to.iter().position(|o| o == s)))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            indices,
            reverse_flags: self.reverse_flags.clone(),
            nulls_first: self.nulls_first.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDescription {
    pub node_ids: BTreeSet<NodeId>,
    pub order_by: Option<PositionalOrderBy>,
    /// `None` means no limit is outstanding.
    pub limit: Option<u64>,
    pub offset: u64,
    pub num_outputs: usize,
    pub stream_output_types: Vec<DataType>,
}

impl ResultDescription {
    pub fn has_remaining_limit_or_offset(&self) -> bool {
        self.limit.is_some() || self.offset > 0
    }
}
