//! Merge-phase synthesis shared by the operators.

use std::collections::BTreeSet;

use shardplan_core::id::NodeId;

use super::phases::{DistributionType, MergePhase};
use super::projection::Projection;
use super::result::ResultDescription;
use super::{ExecutionPlan, MergePlan, Unfinished};
use crate::context::PlannerContext;

/// Results on no node at all (e.g. an empty routing) count as local.
pub fn executes_on_handler(handler: NodeId, node_ids: &BTreeSet<NodeId>) -> bool {
    node_ids.is_empty() || (node_ids.len() == 1 && node_ids.contains(&handler))
}

/// Make sure the result of `plan` ends up on the handler node, with any
/// outstanding limit/offset applied.
///
/// If the plan already runs on the handler only a top-n is appended;
/// otherwise a merge phase is synthesized that merge-sorts by the
/// positional ordering of the result (if any).
pub fn ensure_on_handler(mut plan: ExecutionPlan, ctx: &mut PlannerContext<'_>) -> ExecutionPlan {
    let desc = plan.result_description();
    let top_n = Projection::top_n_if_needed(desc.limit, desc.offset, &desc.stream_output_types);
    let handler = ctx.handler_node();

    if executes_on_handler(handler, &desc.node_ids) {
        if let Some(p) = top_n {
            plan.add_projection(p, None, 0, desc.order_by.clone());
        }
        return plan;
    }

    tracing::debug!(
        upstreams = desc.node_ids.len(),
        ordered = desc.order_by.is_some(),
        "adding merge phase on handler"
    );
    let phase = MergePhase {
        id: ctx.next_execution_phase_id(),
        name: "mergeOnHandler".into(),
        num_upstreams: desc.node_ids.len(),
        batch_hint: ctx.config().merge_batch_hint,
        node_ids: BTreeSet::from([handler]),
        input_types: desc.stream_output_types.clone(),
        projections: top_n.into_iter().collect(),
        distribution: DistributionType::SameNode,
        positional_order_by: desc.order_by.clone(),
    };
    let mut unfinished = Unfinished::new(desc.stream_output_types);
    unfinished.order_by = desc.order_by;
    ExecutionPlan::Merge(MergePlan {
        sub_plan: Box::new(plan),
        phase,
        unfinished,
    })
}

/// Merge phase that gathers one join input onto the join's execution nodes.
pub fn build_merge_phase_for_join(
    ctx: &mut PlannerContext<'_>,
    result: &ResultDescription,
    execution_nodes: &BTreeSet<NodeId>,
) -> MergePhase {
    let projections = Projection::top_n_if_needed(result.limit, result.offset, &result.stream_output_types)
        .into_iter()
        .collect();
    MergePhase {
        id: ctx.next_execution_phase_id(),
        name: "join-merge".into(),
        num_upstreams: result.node_ids.len(),
        batch_hint: ctx.config().merge_batch_hint,
        node_ids: execution_nodes.clone(),
        input_types: result.stream_output_types.clone(),
        projections,
        distribution: DistributionType::SameNode,
        positional_order_by: result.order_by.clone(),
    }
}
