//! Logical operator tree.
//!
//! `LogicalPlan` is a closed sum over the operators; adding one is a
//! compile-time change in every `match` (dispatch here, the visitor, the
//! optimizer). Nodes are immutable: `update_source(s)` and `try_optimize`
//! return new nodes and leave the receiver untouched.

mod builder;
mod collect;
mod eval;
mod join;
mod limit;
mod order;
mod union;
mod visitor;

use std::collections::{BTreeMap, BTreeSet};

use shardplan_core::error::Result;
use shardplan_core::id::RelationId;
use shardplan_core::order_by::OrderBy;
use shardplan_core::symbol::{SelectSymbol, Symbol};

use crate::context::PlannerContext;
use crate::physical::ExecutionPlan;

pub use builder::Builder;
pub use collect::{Collect, TableRelation};
pub use eval::Eval;
pub use join::HashJoin;
pub use limit::Limit;
pub use order::Order;
pub use union::Union;
pub use visitor::{LogicalPlanVisitor, RelationCollector};

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    Collect(Collect),
    Eval(Eval),
    Order(Order),
    Limit(Limit),
    HashJoin(HashJoin),
    Union(Union),
}

impl LogicalPlan {
    /// Symbols exposed to the consumer; their order is the row layout.
    pub fn outputs(&self) -> &[Symbol] {
        match self {
            LogicalPlan::Collect(p) => p.outputs(),
            LogicalPlan::Eval(p) => p.outputs(),
            LogicalPlan::Order(p) => p.outputs(),
            LogicalPlan::Limit(p) => p.outputs(),
            LogicalPlan::HashJoin(p) => p.outputs(),
            LogicalPlan::Union(p) => p.outputs(),
        }
    }

    /// Sub-query placeholders used in this subtree and the plans computing them.
    pub fn dependencies(&self) -> BTreeMap<SelectSymbol, &LogicalPlan> {
        match self {
            LogicalPlan::Collect(p) => p.dependencies(),
            LogicalPlan::Eval(p) => p.source().dependencies(),
            LogicalPlan::Order(p) => p.source().dependencies(),
            LogicalPlan::Limit(p) => p.source().dependencies(),
            LogicalPlan::HashJoin(p) => merge_dependencies(p.lhs(), p.rhs()),
            LogicalPlan::Union(p) => merge_dependencies(p.lhs(), p.rhs()),
        }
    }

    pub fn num_expected_rows(&self) -> u64 {
        match self {
            LogicalPlan::Collect(p) => p.num_expected_rows(),
            LogicalPlan::Eval(p) => p.source().num_expected_rows(),
            LogicalPlan::Order(p) => p.source().num_expected_rows(),
            LogicalPlan::Limit(p) => p.num_expected_rows(),
            LogicalPlan::HashJoin(p) => p.num_expected_rows(),
            LogicalPlan::Union(p) => p.num_expected_rows(),
        }
    }

    pub fn estimated_row_size(&self) -> u64 {
        match self {
            LogicalPlan::Collect(p) => p.estimated_row_size(),
            LogicalPlan::Eval(p) => p.source().estimated_row_size(),
            LogicalPlan::Order(p) => p.source().estimated_row_size(),
            LogicalPlan::Limit(p) => p.source().estimated_row_size(),
            LogicalPlan::HashJoin(p) => p.estimated_row_size(),
            LogicalPlan::Union(p) => p.estimated_row_size(),
        }
    }

    /// Base relations at the leaves of this subtree.
    pub fn relation_ids(&self) -> BTreeSet<RelationId> {
        let mut collector = RelationCollector::default();
        self.accept(&mut collector, ());
        collector.into_relations()
    }

    /// Compile this subtree into an execution plan.
    ///
    /// `limit`/`offset`/`order` are requests from the consumer; an operator
    /// may honour them early (e.g. a collect sorting while reading) and
    /// reports what is still outstanding in the result description.
    pub fn build(
        &self,
        ctx: &mut PlannerContext<'_>,
        limit: Option<u64>,
        offset: u64,
        order: Option<&OrderBy>,
    ) -> Result<ExecutionPlan> {
        match self {
            LogicalPlan::Collect(p) => p.build(ctx, limit, offset, order),
            LogicalPlan::Eval(p) => p.build(ctx, limit, offset, order),
            LogicalPlan::Order(p) => p.build(ctx, limit, offset, order),
            LogicalPlan::Limit(p) => p.build(ctx),
            LogicalPlan::HashJoin(p) => p.build(ctx),
            LogicalPlan::Union(p) => p.build(ctx, limit, offset, order),
        }
    }

    /// One step of the pushdown protocol.
    ///
    /// `push_down` is a node offered for relocation towards the leaves.
    /// `Ok(None)` leaves the subtree as it is and, if a node was offered,
    /// declines it. `Ok(Some(plan))` replaces the subtree; an offered node is
    /// then part of (or subsumed by) the replacement.
    pub fn try_optimize(&self, push_down: Option<&LogicalPlan>) -> Result<Option<LogicalPlan>> {
        match self {
            LogicalPlan::Collect(_) => Ok(None),
            LogicalPlan::Eval(p) => p.try_optimize(push_down),
            LogicalPlan::Order(p) => p.try_optimize(push_down),
            LogicalPlan::Limit(p) => p.try_optimize(push_down),
            LogicalPlan::HashJoin(p) => p.try_optimize(push_down),
            LogicalPlan::Union(p) => p.try_optimize(push_down),
        }
    }

    pub fn accept<C, R>(&self, visitor: &mut impl LogicalPlanVisitor<C, R>, ctx: C) -> R {
        match self {
            LogicalPlan::Collect(p) => visitor.visit_collect(p, ctx),
            LogicalPlan::Eval(p) => visitor.visit_eval(p, ctx),
            LogicalPlan::Order(p) => visitor.visit_order(p, ctx),
            LogicalPlan::Limit(p) => visitor.visit_limit(p, ctx),
            LogicalPlan::HashJoin(p) => visitor.visit_hash_join(p, ctx),
            LogicalPlan::Union(p) => visitor.visit_union(p, ctx),
        }
    }
}

fn merge_dependencies<'a>(
    lhs: &'a LogicalPlan,
    rhs: &'a LogicalPlan,
) -> BTreeMap<SelectSymbol, &'a LogicalPlan> {
    let mut deps = lhs.dependencies();
    deps.extend(rhs.dependencies());
    deps
}

/// Optimize both inputs of a binary node without offering anything.
/// `None` if neither input changed.
fn optimize_inputs(
    lhs: &LogicalPlan,
    rhs: &LogicalPlan,
) -> Result<Option<(LogicalPlan, LogicalPlan)>> {
    let new_lhs = lhs.try_optimize(None)?;
    let new_rhs = rhs.try_optimize(None)?;
    if new_lhs.is_none() && new_rhs.is_none() {
        return Ok(None);
    }
    Ok(Some((
        new_lhs.unwrap_or_else(|| lhs.clone()),
        new_rhs.unwrap_or_else(|| rhs.clone()),
    )))
}
