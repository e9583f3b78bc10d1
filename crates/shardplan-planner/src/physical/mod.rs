//! Physical execution plan: a tree of phases annotated with the nodes they
//! run on and how their results are distributed.
//!
//! A plan is produced by `LogicalPlan::build` and only ever extended by the
//! enclosing operator (extra projections, a different distribution), never
//! rewritten.

pub mod merge;
pub mod phases;
pub mod projection;
pub mod result;

use serde::{Deserialize, Serialize};
use shardplan_core::error::Result;
use shardplan_core::hash::{hash_serde, Hash256};
use shardplan_core::schema::DataType;

pub use phases::{CollectPhase, DistributionType, HashJoinPhase, MergePhase, PhaseRef};
pub use projection::Projection;
pub use result::{PositionalOrderBy, ResultDescription};

/// Result properties not carried by the phases themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unfinished {
    pub limit: Option<u64>,
    pub offset: u64,
    pub num_outputs: usize,
    pub output_types: Vec<DataType>,
    pub order_by: Option<PositionalOrderBy>,
}

impl Unfinished {
    pub fn new(output_types: Vec<DataType>) -> Self {
        Self {
            limit: None,
            offset: 0,
            num_outputs: output_types.len(),
            output_types,
            order_by: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectPlan {
    pub phase: CollectPhase,
    pub unfinished: Unfinished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePlan {
    pub sub_plan: Box<ExecutionPlan>,
    pub phase: MergePhase,
    pub unfinished: Unfinished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinPlan {
    pub phase: HashJoinPhase,
    pub left: Box<ExecutionPlan>,
    pub right: Box<ExecutionPlan>,
    pub unfinished: Unfinished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionPlan {
    pub left: Box<ExecutionPlan>,
    pub right: Box<ExecutionPlan>,
    pub phase: MergePhase,
    pub unfinished: Unfinished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionPlan {
    Collect(CollectPlan),
    Merge(MergePlan),
    Join(JoinPlan),
    Union(UnionPlan),
}

impl ExecutionPlan {
    fn unfinished(&self) -> &Unfinished {
        match self {
            ExecutionPlan::Collect(p) => &p.unfinished,
            ExecutionPlan::Merge(p) => &p.unfinished,
            ExecutionPlan::Join(p) => &p.unfinished,
            ExecutionPlan::Union(p) => &p.unfinished,
        }
    }

    fn unfinished_mut(&mut self) -> &mut Unfinished {
        match self {
            ExecutionPlan::Collect(p) => &mut p.unfinished,
            ExecutionPlan::Merge(p) => &mut p.unfinished,
            ExecutionPlan::Join(p) => &mut p.unfinished,
            ExecutionPlan::Union(p) => &mut p.unfinished,
        }
    }

    /// Projections of the phase that produces this plan's result.
    fn projections_mut(&mut self) -> &mut Vec<Projection> {
        match self {
            ExecutionPlan::Collect(p) => &mut p.phase.projections,
            ExecutionPlan::Merge(p) => &mut p.phase.projections,
            ExecutionPlan::Join(p) => &mut p.phase.projections,
            ExecutionPlan::Union(p) => &mut p.phase.projections,
        }
    }

    pub fn result_description(&self) -> ResultDescription {
        let node_ids = match self {
            ExecutionPlan::Collect(p) => p.phase.routing.clone(),
            ExecutionPlan::Merge(p) => p.phase.node_ids.clone(),
            ExecutionPlan::Join(p) => p.phase.node_ids.clone(),
            ExecutionPlan::Union(p) => p.phase.node_ids.clone(),
        };
        let u = self.unfinished();
        ResultDescription {
            node_ids,
            order_by: u.order_by.clone(),
            limit: u.limit,
            offset: u.offset,
            num_outputs: u.num_outputs,
            stream_output_types: u.output_types.clone(),
        }
    }

    /// Append `projection` to the result-producing phase and record what is
    /// still outstanding afterwards.
    pub fn add_projection(
        &mut self,
        projection: Projection,
        unfinished_limit: Option<u64>,
        unfinished_offset: u64,
        unfinished_order_by: Option<PositionalOrderBy>,
    ) {
        let output_types = projection.output_types();
        self.projections_mut().push(projection);
        let u = self.unfinished_mut();
        u.limit = unfinished_limit;
        u.offset = unfinished_offset;
        u.num_outputs = output_types.len();
        u.output_types = output_types;
        u.order_by = unfinished_order_by;
    }

    pub fn set_distribution_info(&mut self, distribution: DistributionType) {
        match self {
            ExecutionPlan::Collect(p) => p.phase.distribution = distribution,
            ExecutionPlan::Merge(p) => p.phase.distribution = distribution,
            ExecutionPlan::Join(p) => p.phase.distribution = distribution,
            ExecutionPlan::Union(p) => p.phase.distribution = distribution,
        }
    }

    pub fn distribution(&self) -> DistributionType {
        match self {
            ExecutionPlan::Collect(p) => p.phase.distribution,
            ExecutionPlan::Merge(p) => p.phase.distribution,
            ExecutionPlan::Join(p) => p.phase.distribution,
            ExecutionPlan::Union(p) => p.phase.distribution,
        }
    }

    /// All phases, depth first, upstream phases before their consumers.
    pub fn phases(&self) -> Vec<PhaseRef<'_>> {
        let mut out = Vec::new();
        self.collect_phases(&mut out);
        out
    }

    fn collect_phases<'a>(&'a self, out: &mut Vec<PhaseRef<'a>>) {
        match self {
            ExecutionPlan::Collect(p) => out.push(PhaseRef::Collect(&p.phase)),
            ExecutionPlan::Merge(p) => {
                p.sub_plan.collect_phases(out);
                out.push(PhaseRef::Merge(&p.phase));
            }
            ExecutionPlan::Join(p) => {
                p.left.collect_phases(out);
                p.right.collect_phases(out);
                if let Some(m) = &p.phase.left_merge {
                    out.push(PhaseRef::Merge(m));
                }
                if let Some(m) = &p.phase.right_merge {
                    out.push(PhaseRef::Merge(m));
                }
                out.push(PhaseRef::HashJoin(&p.phase));
            }
            ExecutionPlan::Union(p) => {
                p.left.collect_phases(out);
                p.right.collect_phases(out);
                out.push(PhaseRef::Merge(&p.phase));
            }
        }
    }

    /// Stable content hash; equal plans hash equal across compilations.
    pub fn fingerprint(&self) -> Result<Hash256> {
        hash_serde(self)
    }
}
