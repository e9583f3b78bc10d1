//! Execution phases: the units the execution layer dispatches to nodes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shardplan_core::id::{NodeId, PhaseId};
use shardplan_core::order_by::OrderBy;
use shardplan_core::schema::DataType;
use shardplan_core::symbol::Symbol;

use super::projection::Projection;
use super::result::PositionalOrderBy;

/// How a phase ships its results downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionType {
    /// Every downstream node receives all rows.
    Broadcast,
    /// Rows are consumed on the node that produced them.
    SameNode,
    /// Final phase; results go to the client.
    None,
}

/// Reads rows of a base relation on the nodes holding its shards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectPhase {
    pub id: PhaseId,
    pub name: String,
    pub relation: String,
    pub routing: BTreeSet<NodeId>,
    pub to_collect: Vec<Symbol>,
    pub where_clause: Option<Symbol>,
    /// Ordering applied while collecting, on `to_collect` symbols.
    pub order_by: Option<OrderBy>,
    /// Rows each node has to produce at most (limit + offset).
    pub node_limit: Option<u64>,
    pub projections: Vec<Projection>,
    pub distribution: DistributionType,
}

/// Gathers upstream results onto `node_ids`, merge-sorting when an ordering
/// is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePhase {
    pub id: PhaseId,
    pub name: String,
    pub num_upstreams: usize,
    pub batch_hint: usize,
    pub node_ids: BTreeSet<NodeId>,
    pub input_types: Vec<DataType>,
    pub projections: Vec<Projection>,
    pub distribution: DistributionType,
    pub positional_order_by: Option<PositionalOrderBy>,
}

/// Hash join of two upstream results.
///
/// The right input is the build side (materialized into the hash table),
/// the left input is streamed against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashJoinPhase {
    pub id: PhaseId,
    pub name: String,
    pub projections: Vec<Projection>,
    pub left_merge: Option<MergePhase>,
    pub right_merge: Option<MergePhase>,
    pub num_left_outputs: usize,
    pub num_right_outputs: usize,
    pub node_ids: BTreeSet<NodeId>,
    /// Positional against left outputs followed by right outputs.
    pub join_condition: Symbol,
    pub left_hash_keys: Vec<Symbol>,
    pub right_hash_keys: Vec<Symbol>,
    pub left_output_types: Vec<DataType>,
    pub right_output_types: Vec<DataType>,
    pub estimated_build_row_size: u64,
    pub build_num_rows: u64,
    pub distribution: DistributionType,
}

/// Borrowed view over any phase of a plan tree.
#[derive(Debug, Clone, Copy)]
pub enum PhaseRef<'a> {
    Collect(&'a CollectPhase),
    Merge(&'a MergePhase),
    HashJoin(&'a HashJoinPhase),
}

impl PhaseRef<'_> {
    pub fn id(&self) -> PhaseId {
        match self {
            PhaseRef::Collect(p) => p.id,
            PhaseRef::Merge(p) => p.id,
            PhaseRef::HashJoin(p) => p.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PhaseRef::Collect(p) => &p.name,
            PhaseRef::Merge(p) => &p.name,
            PhaseRef::HashJoin(p) => &p.name,
        }
    }

    pub fn projections(&self) -> &[Projection] {
        match self {
            PhaseRef::Collect(p) => &p.projections,
            PhaseRef::Merge(p) => &p.projections,
            PhaseRef::HashJoin(p) => &p.projections,
        }
    }
}
