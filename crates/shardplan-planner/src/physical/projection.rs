//! Row transformations attached to phases.
//!
//! All symbols inside a projection are positional (`InputColumn`s against the
//! phase's input layout), except for literals and sub-query placeholders.

use serde::{Deserialize, Serialize};
use shardplan_core::schema::DataType;
use shardplan_core::symbol::{type_view, Symbol};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Evaluate `outputs` for every row.
    Eval { outputs: Vec<Symbol> },

    /// Skip `offset` rows, then pass at most `limit` rows through unchanged.
    TopN {
        limit: Option<u64>,
        offset: u64,
        output_types: Vec<DataType>,
    },

    /// Sort by `order_by`, apply limit/offset, then evaluate `outputs`.
    OrderedTopN {
        limit: Option<u64>,
        offset: u64,
        outputs: Vec<Symbol>,
        order_by: Vec<Symbol>,
        reverse_flags: Vec<bool>,
        nulls_first: Vec<Option<bool>>,
    },
}

impl Projection {
    /// A `TopN` for a pending limit/offset, or nothing if there is none.
    pub fn top_n_if_needed(
        limit: Option<u64>,
        offset: u64,
        output_types: &[DataType],
    ) -> Option<Projection> {
        if limit.is_none() && offset == 0 {
            return None;
        }
        Some(Projection::TopN {
            limit,
            offset,
            output_types: output_types.to_vec(),
        })
    }

    pub fn output_types(&self) -> Vec<DataType> {
        match self {
            Projection::Eval { outputs } | Projection::OrderedTopN { outputs, .. } => {
                type_view(outputs)
            }
            Projection::TopN { output_types, .. } => output_types.clone(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Projection::Eval { .. } => "eval",
            Projection::TopN { .. } => "topN",
            Projection::OrderedTopN { .. } => "orderedTopN",
        }
    }

    /// Every symbol the projection evaluates, in declaration order.
    pub fn symbols(&self) -> Vec<&Symbol> {
        match self {
            Projection::Eval { outputs } => outputs.iter().collect(),
            Projection::TopN { .. } => Vec::new(),
            Projection::OrderedTopN {
                outputs, order_by, ..
            } => outputs.iter().chain(order_by.iter()).collect(),
        }
    }
}
