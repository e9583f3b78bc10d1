use std::collections::BTreeSet;

use shardplan_core::error::{Error, Result};
use shardplan_core::id::{NodeId, RelationId};
use shardplan_core::symbol::{concat_unique, type_view, Symbol};

use super::{optimize_inputs, Builder, LogicalPlan};
use crate::context::PlannerContext;
use crate::input_columns::{create, create_all, SourceSymbols};
use crate::join_condition::partition;
use crate::physical::merge::build_merge_phase_for_join;
use crate::physical::{
    DistributionType, ExecutionPlan, HashJoinPhase, JoinPlan, MergePhase, Projection,
    ResultDescription, Unfinished,
};

/// Equi-join of a (possibly composite) left tree with a right input that
/// contains the concrete relation of the condition.
#[derive(Debug, Clone, PartialEq)]
pub struct HashJoin {
    lhs: Box<LogicalPlan>,
    rhs: Box<LogicalPlan>,
    join_condition: Symbol,
    concrete_relation: RelationId,
    outputs: Vec<Symbol>,
}

impl HashJoin {
    /// `outputs` must be drawn from the outputs of `lhs` followed by `rhs`.
    pub fn new(
        lhs: LogicalPlan,
        rhs: LogicalPlan,
        join_condition: Symbol,
        concrete_relation: RelationId,
        outputs: Vec<Symbol>,
    ) -> Self {
        Self {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            join_condition,
            concrete_relation,
            outputs,
        }
    }

    /// Both inputs are asked for the required symbols plus the columns of
    /// the join condition; the join itself only exposes what the consumer
    /// references.
    pub fn create(
        lhs: Builder,
        rhs: Builder,
        join_condition: Symbol,
        concrete_relation: RelationId,
    ) -> Builder {
        Builder::new(move |stats, used| {
            let condition_columns: Vec<Symbol> = join_condition
                .columns()
                .into_iter()
                .map(|c| Symbol::Column(c.clone()))
                .collect();
            let needed = concat_unique(used, &condition_columns);
            let lhs = lhs.build(stats, &needed)?;
            let rhs = rhs.build(stats, &needed)?;
            let outputs = concat_unique(lhs.outputs(), rhs.outputs())
                .into_iter()
                .filter(|s| is_referenced(s, used))
                .collect();
            Ok(LogicalPlan::HashJoin(HashJoin::new(
                lhs,
                rhs,
                join_condition,
                concrete_relation,
                outputs,
            )))
        })
    }

    pub fn lhs(&self) -> &LogicalPlan {
        &self.lhs
    }

    pub fn rhs(&self) -> &LogicalPlan {
        &self.rhs
    }

    pub fn join_condition(&self) -> &Symbol {
        &self.join_condition
    }

    pub fn concrete_relation(&self) -> RelationId {
        self.concrete_relation
    }

    pub fn outputs(&self) -> &[Symbol] {
        &self.outputs
    }

    /// No cardinality model: the larger input is the estimate.
    pub fn num_expected_rows(&self) -> u64 {
        self.lhs.num_expected_rows().max(self.rhs.num_expected_rows())
    }

    pub fn estimated_row_size(&self) -> u64 {
        self.lhs.estimated_row_size().saturating_add(self.rhs.estimated_row_size())
    }

    pub(super) fn build(&self, ctx: &mut PlannerContext<'_>) -> Result<ExecutionPlan> {
        let lhs_plan = self.lhs.build(ctx, None, 0, None)?;
        let rhs_plan = self.rhs.build(ctx, None, 0, None)?;

        // The smaller input is materialized into the hash table; ties keep
        // the written order.
        let switched = self.lhs.num_expected_rows() < self.rhs.num_expected_rows();
        let (probe, build, mut probe_plan, mut build_plan) = if switched {
            (&self.rhs, &self.lhs, rhs_plan, lhs_plan)
        } else {
            (&self.lhs, &self.rhs, lhs_plan, rhs_plan)
        };
        tracing::debug!(
            switched,
            probe_rows = probe.num_expected_rows(),
            build_rows = build.num_expected_rows(),
            "selected hash join build side"
        );

        let execution_nodes = BTreeSet::from([ctx.handler_node()]);
        let probe_desc = probe_plan.result_description();
        let build_desc = build_plan.result_description();

        let left_merge = if probe_desc.node_ids == execution_nodes
            && !probe_desc.has_remaining_limit_or_offset()
        {
            tracing::trace!("probe side consumed on the same node");
            probe_plan.set_distribution_info(DistributionType::SameNode);
            None
        } else {
            probe_plan.set_distribution_info(DistributionType::Broadcast);
            merge_if_needed(ctx, &probe_desc, &execution_nodes)
        };
        build_plan.set_distribution_info(DistributionType::Broadcast);
        let right_merge = merge_if_needed(ctx, &build_desc, &execution_nodes);

        let (left_hash_keys, right_hash_keys) = self.hash_keys(switched)?;

        let physical_outputs: Vec<Symbol> = probe
            .outputs()
            .iter()
            .chain(build.outputs())
            .cloned()
            .collect();
        let sources = SourceSymbols::new(&physical_outputs);
        let join_condition = create(&self.join_condition, &sources)?;
        let projection = Projection::Eval {
            outputs: create_all(&self.outputs, &sources)?,
        };

        let phase = HashJoinPhase {
            id: ctx.next_execution_phase_id(),
            name: "join".into(),
            projections: vec![projection],
            left_merge,
            right_merge,
            num_left_outputs: probe.outputs().len(),
            num_right_outputs: build.outputs().len(),
            node_ids: execution_nodes,
            join_condition,
            left_hash_keys,
            right_hash_keys,
            left_output_types: probe_desc.stream_output_types,
            right_output_types: build_desc.stream_output_types,
            estimated_build_row_size: build.estimated_row_size(),
            build_num_rows: build.num_expected_rows(),
            distribution: DistributionType::Broadcast,
        };
        Ok(ExecutionPlan::Join(JoinPlan {
            phase,
            left: Box::new(probe_plan),
            right: Box::new(build_plan),
            unfinished: Unfinished::new(type_view(&self.outputs)),
        }))
    }

    /// Positional hash keys for the (left, right) slots of the join phase.
    fn hash_keys(&self, switched: bool) -> Result<(Vec<Symbol>, Vec<Symbol>)> {
        let rhs_relations = self.rhs.relation_ids();
        if !rhs_relations.contains(&self.concrete_relation) {
            return Err(Error::invariant(format!(
                "concrete relation {} is not a leaf of the right input",
                self.concrete_relation
            )));
        }
        let keys = partition(&self.join_condition, self.concrete_relation)?;
        let lhs_relations = self.lhs.relation_ids();
        if let Some(missing) = keys.tree_relations().difference(&lhs_relations).next() {
            return Err(Error::invariant(format!(
                "join keys reference {missing} which is not a leaf of the left input"
            )));
        }

        let concrete = create_all(&keys.concrete, &SourceSymbols::new(self.rhs.outputs()))?;
        let tree = create_all(&keys.tree, &SourceSymbols::new(self.lhs.outputs()))?;
        Ok(if switched { (concrete, tree) } else { (tree, concrete) })
    }

    /// Fails if an output is no longer supplied by the new inputs.
    pub fn update_sources(&self, lhs: LogicalPlan, rhs: LogicalPlan) -> Result<HashJoin> {
        let available = concat_unique(lhs.outputs(), rhs.outputs());
        create_all(&self.outputs, &SourceSymbols::new(&available))?;
        Ok(HashJoin::new(
            lhs,
            rhs,
            self.join_condition.clone(),
            self.concrete_relation,
            self.outputs.clone(),
        ))
    }

    pub(super) fn try_optimize(&self, push_down: Option<&LogicalPlan>) -> Result<Option<LogicalPlan>> {
        if push_down.is_some() {
            return Ok(None);
        }
        match optimize_inputs(&self.lhs, &self.rhs)? {
            Some((lhs, rhs)) => Ok(Some(LogicalPlan::HashJoin(self.update_sources(lhs, rhs)?))),
            None => Ok(None),
        }
    }
}

fn merge_if_needed(
    ctx: &mut PlannerContext<'_>,
    result: &ResultDescription,
    execution_nodes: &BTreeSet<NodeId>,
) -> Option<MergePhase> {
    if ctx.oracle().is_merge_phase_needed(execution_nodes, result, false) {
        Some(build_merge_phase_for_join(ctx, result, execution_nodes))
    } else {
        None
    }
}

/// Whether some symbol in `used` is `symbol` or, for a column, reads it.
fn is_referenced(symbol: &Symbol, used: &[Symbol]) -> bool {
    used.iter().any(|u| match symbol {
        Symbol::Column(c) => u == symbol || u.columns().contains(&c),
        _ => u == symbol,
    })
}
