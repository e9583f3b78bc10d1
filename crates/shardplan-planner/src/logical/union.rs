use std::collections::BTreeSet;

use shardplan_core::error::{Error, Result};
use shardplan_core::order_by::OrderBy;
use shardplan_core::symbol::Symbol;

use super::{optimize_inputs, Builder, LogicalPlan};
use crate::context::PlannerContext;
use crate::physical::merge::ensure_on_handler;
use crate::physical::{DistributionType, ExecutionPlan, MergePhase, UnionPlan, Unfinished};

/// Concatenation of two inputs with the same row layout.
///
/// The outputs are those of the left input; the right input's symbols
/// correspond positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    lhs: Box<LogicalPlan>,
    rhs: Box<LogicalPlan>,
    outputs: Vec<Symbol>,
}

impl Union {
    pub fn new(lhs: LogicalPlan, rhs: LogicalPlan) -> Result<Self> {
        if lhs.outputs().len() != rhs.outputs().len() {
            return Err(Error::Plan(format!(
                "union inputs differ in arity: {} vs {}",
                lhs.outputs().len(),
                rhs.outputs().len()
            )));
        }
        let outputs = lhs.outputs().to_vec();
        Ok(Self {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            outputs,
        })
    }

    /// `lhs_outputs[i]` and `rhs_outputs[i]` form column `i` of the union;
    /// only the positions the consumer references are built.
    pub fn create(
        lhs: Builder,
        lhs_outputs: Vec<Symbol>,
        rhs: Builder,
        rhs_outputs: Vec<Symbol>,
    ) -> Builder {
        Builder::new(move |stats, used| {
            if lhs_outputs.len() != rhs_outputs.len() {
                return Err(Error::Plan(format!(
                    "union inputs differ in arity: {} vs {}",
                    lhs_outputs.len(),
                    rhs_outputs.len()
                )));
            }
            let (lhs_used, rhs_used): (Vec<Symbol>, Vec<Symbol>) = lhs_outputs
                .into_iter()
                .zip(rhs_outputs)
                .filter(|(l, _)| used.contains(l))
                .unzip();
            let lhs = lhs.build(stats, &lhs_used)?;
            let rhs = rhs.build(stats, &rhs_used)?;
            Ok(LogicalPlan::Union(Union::new(lhs, rhs)?))
        })
    }

    pub fn lhs(&self) -> &LogicalPlan {
        &self.lhs
    }

    pub fn rhs(&self) -> &LogicalPlan {
        &self.rhs
    }

    pub fn outputs(&self) -> &[Symbol] {
        &self.outputs
    }

    pub fn num_expected_rows(&self) -> u64 {
        self.lhs
            .num_expected_rows()
            .saturating_add(self.rhs.num_expected_rows())
    }

    pub fn estimated_row_size(&self) -> u64 {
        self.lhs.estimated_row_size().max(self.rhs.estimated_row_size())
    }

    pub(super) fn build(
        &self,
        ctx: &mut PlannerContext<'_>,
        limit: Option<u64>,
        offset: u64,
        order: Option<&OrderBy>,
    ) -> Result<ExecutionPlan> {
        // Without an ordering each branch needs at most limit + offset rows.
        let branch_limit = match order {
            None => limit.map(|l| l.saturating_add(offset)),
            Some(_) => None,
        };
        let mut left = self.lhs.build(ctx, branch_limit, 0, None)?;
        let mut right = self.rhs.build(ctx, branch_limit, 0, None)?;
        if left.result_description().has_remaining_limit_or_offset() {
            left = ensure_on_handler(left, ctx);
        }
        if right.result_description().has_remaining_limit_or_offset() {
            right = ensure_on_handler(right, ctx);
        }

        let left_desc = left.result_description();
        let right_desc = right.result_description();
        if left_desc.stream_output_types != right_desc.stream_output_types {
            return Err(Error::invariant(format!(
                "union inputs stream different types: {:?} vs {:?}",
                left_desc.stream_output_types, right_desc.stream_output_types
            )));
        }
        left.set_distribution_info(DistributionType::Broadcast);
        right.set_distribution_info(DistributionType::Broadcast);

        let phase = MergePhase {
            id: ctx.next_execution_phase_id(),
            name: "union".into(),
            num_upstreams: left_desc.node_ids.len() + right_desc.node_ids.len(),
            batch_hint: ctx.config().merge_batch_hint,
            node_ids: BTreeSet::from([ctx.handler_node()]),
            input_types: left_desc.stream_output_types.clone(),
            projections: Vec::new(),
            distribution: DistributionType::Broadcast,
            positional_order_by: None,
        };
        let mut unfinished = Unfinished::new(left_desc.stream_output_types);
        if order.is_none() {
            unfinished.limit = limit;
            unfinished.offset = offset;
        }
        Ok(ExecutionPlan::Union(UnionPlan {
            left: Box::new(left),
            right: Box::new(right),
            phase,
            unfinished,
        }))
    }

    pub fn update_sources(&self, lhs: LogicalPlan, rhs: LogicalPlan) -> Result<Union> {
        Union::new(lhs, rhs)
    }

    pub(super) fn try_optimize(&self, push_down: Option<&LogicalPlan>) -> Result<Option<LogicalPlan>> {
        if push_down.is_some() {
            return Ok(None);
        }
        match optimize_inputs(&self.lhs, &self.rhs)? {
            Some((lhs, rhs)) => Ok(Some(LogicalPlan::Union(self.update_sources(lhs, rhs)?))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::TableStats;
    use crate::logical::{Collect, TableRelation};
    use crate::oracle::StaticCluster;
    use shardplan_core::config::PlannerConfig;
    use shardplan_core::id::{ColumnId, NodeId, RelationId};
    use shardplan_core::schema::DataType;
    use std::collections::BTreeMap;

    fn relation(rel: u64, ty: DataType) -> TableRelation {
        let cols = vec![
            Symbol::column(RelationId::new(rel), ColumnId::new(1), "k", ty),
            Symbol::column(RelationId::new(rel), ColumnId::new(2), "v", DataType::Utf8),
        ];
        TableRelation::new(RelationId::new(rel), format!("t{rel}"), cols)
    }

    fn cluster() -> StaticCluster {
        StaticCluster::new(NodeId::new(0))
            .with_relation(RelationId::new(1), [NodeId::new(1)])
            .with_relation(RelationId::new(2), [NodeId::new(2)])
    }

    #[test]
    fn builder_prunes_both_branches_positionally() {
        let l = relation(1, DataType::Int64);
        let r = relation(2, DataType::Int64);
        let builder = Union::create(
            Collect::create(l.clone(), None, BTreeMap::new()),
            l.columns.clone(),
            Collect::create(r.clone(), None, BTreeMap::new()),
            r.columns.clone(),
        );
        let stats = TableStats::default();
        let plan = builder.build(&stats, &[l.columns[1].clone()]).unwrap();
        let LogicalPlan::Union(u) = &plan else {
            panic!("expected a union node");
        };
        assert_eq!(u.rhs().outputs(), &[r.columns[1].clone()]);
        assert_eq!(plan.num_expected_rows(), 20_000);
    }

    #[test]
    fn limit_is_left_for_the_consumer() {
        let l = relation(1, DataType::Int64);
        let r = relation(2, DataType::Int64);
        let union = Union::create(
            Collect::create(l.clone(), None, BTreeMap::new()),
            l.columns.clone(),
            Collect::create(r.clone(), None, BTreeMap::new()),
            r.columns.clone(),
        )
        .build(&TableStats::default(), &l.columns)
        .unwrap();
        let cluster = cluster();
        let config = PlannerConfig::default();
        let mut ctx = PlannerContext::new(&cluster, &config);
        let plan = union.build(&mut ctx, Some(3), 2, None).unwrap();
        let desc = plan.result_description();
        assert_eq!(desc.limit, Some(3));
        assert_eq!(desc.offset, 2);
        assert_eq!(desc.node_ids, BTreeSet::from([NodeId::new(0)]));
        // both branches were merged onto the handler to cut at 5 rows
        let names: Vec<_> = plan.phases().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(
            names,
            ["collect", "mergeOnHandler", "collect", "mergeOnHandler", "union"]
        );
    }

    #[test]
    fn mismatched_types_are_an_invariant_violation() {
        let l = relation(1, DataType::Int64);
        let r = relation(2, DataType::Utf8);
        let union = Union::new(
            LogicalPlan::Collect(Collect::new(l.clone(), l.columns.clone(), None, BTreeMap::new(), 1, 1)),
            LogicalPlan::Collect(Collect::new(r.clone(), r.columns.clone(), None, BTreeMap::new(), 1, 1)),
        )
        .unwrap();
        let cluster = cluster();
        let config = PlannerConfig::default();
        let mut ctx = PlannerContext::new(&cluster, &config);
        assert!(union.build(&mut ctx, None, 0, None).unwrap_err().is_invariant());
    }
}
