use shardplan_core::error::Result;
use shardplan_core::order_by::OrderBy;
use shardplan_core::symbol::Symbol;

use super::{Builder, LogicalPlan};
use crate::context::PlannerContext;
use crate::input_columns::{create_all, SourceSymbols};
use crate::physical::merge::ensure_on_handler;
use crate::physical::{ExecutionPlan, Projection};

/// Evaluates a projection list over its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Eval {
    source: Box<LogicalPlan>,
    outputs: Vec<Symbol>,
}

impl Eval {
    pub fn new(source: LogicalPlan, outputs: Vec<Symbol>) -> Self {
        Self {
            source: Box::new(source),
            outputs,
        }
    }

    /// Keeps the projections the consumer asks for (in the order it asks)
    /// and requires exactly those from the source.
    pub fn create(source: Builder, projections: Vec<Symbol>) -> Builder {
        Builder::new(move |stats, used| {
            let mut outputs: Vec<Symbol> = Vec::with_capacity(projections.len());
            for sym in used {
                if projections.contains(sym) && !outputs.contains(sym) {
                    outputs.push(sym.clone());
                }
            }
            let source = source.build(stats, &outputs)?;
            Ok(LogicalPlan::Eval(Eval::new(source, outputs)))
        })
    }

    pub fn source(&self) -> &LogicalPlan {
        &self.source
    }

    pub fn outputs(&self) -> &[Symbol] {
        &self.outputs
    }

    pub(super) fn build(
        &self,
        ctx: &mut PlannerContext<'_>,
        limit: Option<u64>,
        offset: u64,
        order: Option<&OrderBy>,
    ) -> Result<ExecutionPlan> {
        // with an ordering requested the consumer sorts, so the limit cannot
        // be applied below it
        let mut plan = match order {
            Some(_) => self.source.build(ctx, None, 0, None)?,
            None => self.source.build(ctx, limit, offset, None)?,
        };
        if self.outputs.as_slice() == self.source.outputs() {
            return Ok(plan);
        }

        let desc = plan.result_description();
        let (limit, offset, order_by) = match &desc.order_by {
            None => (desc.limit, desc.offset, None),
            Some(o) => match o.remap(self.source.outputs(), &self.outputs) {
                Some(remapped) => (desc.limit, desc.offset, Some(remapped)),
                None => {
                    // sort keys are projected away; finish the ordering first
                    plan = ensure_on_handler(plan, ctx);
                    (None, 0, None)
                }
            },
        };
        let outputs = create_all(&self.outputs, &SourceSymbols::new(self.source.outputs()))?;
        plan.add_projection(Projection::Eval { outputs }, limit, offset, order_by);
        Ok(plan)
    }

    /// Fails if a projected column is no longer supplied by `new_source`.
    pub fn update_source(&self, new_source: LogicalPlan) -> Result<Eval> {
        create_all(&self.outputs, &SourceSymbols::new(new_source.outputs()))?;
        Ok(Eval::new(new_source, self.outputs.clone()))
    }

    pub(super) fn try_optimize(&self, push_down: Option<&LogicalPlan>) -> Result<Option<LogicalPlan>> {
        if push_down.is_some() {
            return Ok(None);
        }
        match self.source.try_optimize(None)? {
            Some(source) => Ok(Some(LogicalPlan::Eval(self.update_source(source)?))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::TableStats;
    use crate::logical::{Collect, Order, TableRelation};
    use shardplan_core::id::{ColumnId, RelationId};
    use shardplan_core::schema::DataType;
    use std::collections::BTreeMap;

    fn col(id: u64, name: &str) -> Symbol {
        Symbol::column(RelationId::new(1), ColumnId::new(id), name, DataType::Int64)
    }

    fn relation() -> TableRelation {
        TableRelation::new(RelationId::new(1), "t", vec![col(1, "a"), col(2, "b"), col(3, "c")])
    }

    #[test]
    fn unused_projections_are_not_built() {
        let sum = Symbol::function("add", vec![col(1, "a"), col(2, "b")], DataType::Int64);
        let builder = Eval::create(
            Collect::create(relation(), None, BTreeMap::new()),
            vec![sum.clone(), col(3, "c")],
        );
        let plan = builder.build(&TableStats::default(), &[sum.clone()]).unwrap();
        assert_eq!(plan.outputs(), &[sum]);
        let LogicalPlan::Eval(eval) = &plan else {
            panic!("expected an eval node");
        };
        assert_eq!(eval.source().outputs(), &[col(1, "a"), col(2, "b")]);
    }

    #[test]
    fn pushdown_offers_are_declined() {
        let source = LogicalPlan::Collect(Collect::new(relation(), vec![col(1, "a")], None, BTreeMap::new(), 1, 1));
        let eval = Eval::new(source.clone(), vec![col(1, "a")]);
        let order = LogicalPlan::Order(Order::new(source, OrderBy::ascending(vec![col(1, "a")])));
        assert_eq!(eval.try_optimize(Some(&order)).unwrap(), None);
    }

    #[test]
    fn update_source_checks_columns() {
        let source = LogicalPlan::Collect(Collect::new(relation(), vec![col(1, "a")], None, BTreeMap::new(), 1, 1));
        let eval = Eval::new(source, vec![col(1, "a")]);
        let other = LogicalPlan::Collect(Collect::new(relation(), vec![col(2, "b")], None, BTreeMap::new(), 1, 1));
        assert!(eval.update_source(other).unwrap_err().is_invariant());
    }
}
