use shardplan_core::error::{Error, Result};
use shardplan_core::order_by::OrderBy;
use shardplan_core::symbol::{concat_unique, Symbol};

use super::{Builder, LogicalPlan};
use crate::context::PlannerContext;
use crate::input_columns::{create_all, SourceSymbols};
use crate::physical::merge::ensure_on_handler;
use crate::physical::{ExecutionPlan, PositionalOrderBy, Projection};

/// Sorts the rows of its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    source: Box<LogicalPlan>,
    order_by: OrderBy,
    outputs: Vec<Symbol>,
}

impl Order {
    pub fn new(source: LogicalPlan, order_by: OrderBy) -> Self {
        let outputs = concat_unique(source.outputs(), order_by.order_by_symbols());
        Self {
            source: Box::new(source),
            order_by,
            outputs,
        }
    }

    /// The ordering symbols are required from the source in addition to
    /// whatever the consumer needs.
    pub fn create(source: Builder, order_by: OrderBy) -> Builder {
        Builder::new(move |stats, used| {
            let needed = concat_unique(used, order_by.order_by_symbols());
            let source = source.build(stats, &needed)?;
            Ok(LogicalPlan::Order(Order::new(source, order_by)))
        })
    }

    pub fn source(&self) -> &LogicalPlan {
        &self.source
    }

    pub fn order_by(&self) -> &OrderBy {
        &self.order_by
    }

    pub fn outputs(&self) -> &[Symbol] {
        &self.outputs
    }

    pub(super) fn build(
        &self,
        ctx: &mut PlannerContext<'_>,
        limit: Option<u64>,
        offset: u64,
        requested: Option<&OrderBy>,
    ) -> Result<ExecutionPlan> {
        // A consumer asking for a different ordering re-sorts anyway, so a
        // limit under our ordering would cut the wrong rows.
        let (limit, offset) = match requested {
            Some(o) if o != &self.order_by => (None, 0),
            _ => (limit, offset),
        };

        let mut plan = self.source.build(ctx, limit, offset, Some(&self.order_by))?;
        let desc = plan.result_description();
        let expected = PositionalOrderBy::of(&self.order_by, self.source.outputs()).ok();
        let honoured = desc.order_by.is_some() && desc.order_by == expected;

        if honoured {
            // A scan sorted while reading and already carries limit, offset
            // and ordering; anything else was sorted per partition only.
            if matches!(self.source.as_ref(), LogicalPlan::Collect(_)) {
                return Ok(plan);
            }
            tracing::debug!(order = %self.order_by, "ordering honoured upstream, merge-sorting on handler");
            return Ok(ensure_on_handler(plan, ctx));
        }
        if !honoured && desc.has_remaining_limit_or_offset() {
            plan = ensure_on_handler(plan, ctx);
        }

        let sources = SourceSymbols::new(self.source.outputs());
        let outputs = create_all(&self.outputs, &sources)?;
        let order_symbols = create_all(self.order_by.order_by_symbols(), &sources)?;
        let result_order = PositionalOrderBy::of(&self.order_by, &self.outputs)?;

        // Sorted per node; several nodes keep limit + offset each and leave
        // the final cut to the merge.
        let single_node = plan.result_description().node_ids.len() <= 1;
        let (node_limit, node_offset, unfinished_limit, unfinished_offset) = if single_node {
            (limit, offset, None, 0)
        } else {
            (limit.map(|l| l.saturating_add(offset)), 0, limit, offset)
        };
        plan.add_projection(
            Projection::OrderedTopN {
                limit: node_limit,
                offset: node_offset,
                outputs,
                order_by: order_symbols,
                reverse_flags: self.order_by.reverse_flags().to_vec(),
                nulls_first: self.order_by.nulls_first().to_vec(),
            },
            unfinished_limit,
            unfinished_offset,
            Some(result_order),
        );
        Ok(plan)
    }

    /// Re-anchor the ordering on `new_source`.
    ///
    /// Ordering symbols that were outputs of the old source are looked up by
    /// position; anything else is resolved by identity. A column that is
    /// neither is lost and cannot be recovered.
    pub fn update_source(&self, new_source: LogicalPlan) -> Result<Order> {
        let old = self.source.outputs();
        let new = new_source.outputs();
        let order_by = self.order_by.copy_and_replace(|sym| {
            sym.try_replace(&mut |s| {
                if let Some(replacement) = old.iter().position(|o| o == s).and_then(|idx| new.get(idx)) {
                    return Ok(Some(replacement.clone()));
                }
                match s {
                    Symbol::Column(c) if !new.contains(s) => Err(Error::invariant(format!(
                        "ordering column {} vanished from the new source",
                        c.name
                    ))),
                    _ => Ok(None),
                }
            })
        })?;
        Ok(Order::new(new_source, order_by))
    }

    pub(super) fn try_optimize(&self, push_down: Option<&LogicalPlan>) -> Result<Option<LogicalPlan>> {
        match push_down {
            Some(LogicalPlan::Order(pushed)) => {
                // Only the outermost ordering survives; the pushed one takes
                // our place directly above our source.
                tracing::debug!(dropped = %self.order_by, kept = %pushed.order_by, "order subsumed");
                let candidate = Order::new(self.source.as_ref().clone(), pushed.order_by.clone());
                Ok(Some(
                    Self::settle(&candidate)?.unwrap_or(LogicalPlan::Order(candidate)),
                ))
            }
            Some(_) => Ok(None),
            None => Self::settle(self),
        }
    }

    /// Offer `candidate` to its source; failing that, optimize the source
    /// on its own. `None` if nothing changed.
    fn settle(candidate: &Order) -> Result<Option<LogicalPlan>> {
        let offered = LogicalPlan::Order(candidate.clone());
        if let Some(replaced) = candidate.source.try_optimize(Some(&offered))? {
            return Ok(Some(replaced));
        }
        match candidate.source.try_optimize(None)? {
            Some(source) => Ok(Some(LogicalPlan::Order(candidate.update_source(source)?))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::{Collect, Eval, TableRelation};
    use crate::oracle::StaticCluster;
    use shardplan_core::config::PlannerConfig;
    use shardplan_core::id::{ColumnId, NodeId, RelationId};
    use shardplan_core::schema::DataType;
    use std::collections::BTreeMap;

    fn col(id: u64, name: &str) -> Symbol {
        Symbol::column(RelationId::new(1), ColumnId::new(id), name, DataType::Int64)
    }

    fn collect() -> LogicalPlan {
        let rel = TableRelation::new(RelationId::new(1), "t", vec![col(1, "x"), col(2, "y")]);
        LogicalPlan::Collect(Collect::new(
            rel,
            vec![col(1, "x"), col(2, "y")],
            None,
            BTreeMap::new(),
            100,
            16,
        ))
    }

    #[test]
    fn outer_order_replaces_inner_order() {
        let inner = Order::new(collect(), OrderBy::ascending(vec![col(2, "y")]));
        let outer = Order::new(LogicalPlan::Order(inner), OrderBy::ascending(vec![col(1, "x")]));
        let optimized = outer.try_optimize(None).unwrap().unwrap();
        let LogicalPlan::Order(o) = &optimized else {
            panic!("expected an order node");
        };
        assert_eq!(o.order_by().order_by_symbols(), &[col(1, "x")]);
        assert!(matches!(o.source(), LogicalPlan::Collect(_)));
        assert_eq!(optimized.try_optimize(None).unwrap(), None);
    }

    #[test]
    fn order_over_scan_is_already_optimal() {
        let order = Order::new(collect(), OrderBy::ascending(vec![col(1, "x")]));
        assert_eq!(order.try_optimize(None).unwrap(), None);
    }

    #[test]
    fn update_source_fails_when_ordering_column_vanishes() {
        let order = Order::new(collect(), OrderBy::ascending(vec![col(2, "y")]));
        let rel = TableRelation::new(RelationId::new(1), "t", vec![col(1, "x")]);
        let narrower = LogicalPlan::Collect(Collect::new(rel, vec![col(1, "x")], None, BTreeMap::new(), 1, 1));
        let err = order.update_source(narrower).unwrap_err();
        assert!(err.is_invariant());
    }

    #[test]
    fn update_source_maps_positions() {
        let order = Order::new(collect(), OrderBy::ascending(vec![col(2, "y")]));
        let rel = TableRelation::new(RelationId::new(2), "u", vec![]);
        let other = vec![
            Symbol::column(RelationId::new(2), ColumnId::new(1), "a", DataType::Int64),
            Symbol::column(RelationId::new(2), ColumnId::new(2), "b", DataType::Int64),
        ];
        let replaced = LogicalPlan::Collect(Collect::new(rel, other.clone(), None, BTreeMap::new(), 1, 1));
        let updated = order.update_source(replaced).unwrap();
        assert_eq!(updated.order_by().order_by_symbols(), &other[1..]);
    }

    fn two_nodes() -> StaticCluster {
        StaticCluster::new(NodeId::new(0)).with_relation(RelationId::new(1), [NodeId::new(1), NodeId::new(2)])
    }

    #[test]
    fn sorted_scan_is_not_sorted_again() {
        let order = Order::new(collect(), OrderBy::ascending(vec![col(1, "x")]));
        let cluster = two_nodes();
        let config = PlannerConfig::default();
        let mut ctx = PlannerContext::new(&cluster, &config);
        let plan = order.build(&mut ctx, Some(5), 2, None).unwrap();

        let ExecutionPlan::Collect(c) = &plan else {
            panic!("expected the scan itself");
        };
        assert!(c.phase.projections.is_empty());
        assert_eq!(c.phase.order_by, Some(OrderBy::ascending(vec![col(1, "x")])));
        assert_eq!(c.phase.node_limit, Some(7));
        let desc = plan.result_description();
        assert_eq!((desc.limit, desc.offset), (Some(5), 2));
        assert_eq!(desc.order_by.map(|o| o.indices), Some(vec![0]));
    }

    #[test]
    fn ordering_honoured_below_a_non_scan_is_merge_sorted_on_handler() {
        let x = OrderBy::ascending(vec![col(1, "x")]);
        let inner = LogicalPlan::Order(Order::new(collect(), x.clone()));
        let order = Order::new(inner, x);
        let cluster = two_nodes();
        let config = PlannerConfig::default();
        let mut ctx = PlannerContext::new(&cluster, &config);
        let plan = order.build(&mut ctx, Some(5), 2, None).unwrap();

        let ExecutionPlan::Merge(merge) = &plan else {
            panic!("expected a merge on the handler");
        };
        assert_eq!(merge.phase.name, "mergeOnHandler");
        assert_eq!(merge.phase.node_ids, std::collections::BTreeSet::from([NodeId::new(0)]));
        assert_eq!(merge.phase.num_upstreams, 2);
        assert_eq!(merge.phase.positional_order_by.as_ref().map(|o| o.indices.clone()), Some(vec![0]));
        assert!(matches!(
            merge.phase.projections.as_slice(),
            [Projection::TopN { limit: Some(5), offset: 2, .. }]
        ));
        let desc = plan.result_description();
        assert!(!desc.has_remaining_limit_or_offset());
        assert!(desc.order_by.is_some());
    }

    #[test]
    fn ordering_passes_through_a_projection_unchanged() {
        let x = OrderBy::ascending(vec![col(1, "x")]);
        let inner = LogicalPlan::Order(Order::new(collect(), x.clone()));
        let eval = LogicalPlan::Eval(Eval::new(inner, vec![col(1, "x"), col(2, "y")]));
        let order = Order::new(eval, x);
        let cluster = two_nodes();
        let config = PlannerConfig::default();
        let mut ctx = PlannerContext::new(&cluster, &config);
        let plan = order.build(&mut ctx, None, 0, None).unwrap();

        let ExecutionPlan::Merge(merge) = &plan else {
            panic!("expected a merge on the handler");
        };
        assert!(merge.phase.positional_order_by.is_some());
        assert!(merge.phase.projections.is_empty());
        assert!(matches!(merge.sub_plan.as_ref(), ExecutionPlan::Collect(_)));
    }
}
