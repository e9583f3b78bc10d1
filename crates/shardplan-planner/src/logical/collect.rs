use std::collections::BTreeMap;

use shardplan_core::error::Result;
use shardplan_core::id::RelationId;
use shardplan_core::order_by::OrderBy;
use shardplan_core::symbol::{type_view, SelectSymbol, Symbol};

use super::{Builder, LogicalPlan};
use crate::context::PlannerContext;
use crate::physical::{
    CollectPhase, CollectPlan, DistributionType, ExecutionPlan, PositionalOrderBy, Unfinished,
};

/// A base relation as resolved by analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRelation {
    pub id: RelationId,
    pub name: String,
    /// Every column of the relation, as column-reference symbols.
    pub columns: Vec<Symbol>,
}

impl TableRelation {
    pub fn new(id: RelationId, name: impl Into<String>, columns: Vec<Symbol>) -> Self {
        Self {
            id,
            name: name.into(),
            columns,
        }
    }
}

/// Scan of a base relation, optionally filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct Collect {
    relation: TableRelation,
    outputs: Vec<Symbol>,
    where_clause: Option<Symbol>,
    dependencies: BTreeMap<SelectSymbol, LogicalPlan>,
    num_expected_rows: u64,
    estimated_row_size: u64,
}

impl Collect {
    pub fn new(
        relation: TableRelation,
        outputs: Vec<Symbol>,
        where_clause: Option<Symbol>,
        dependencies: BTreeMap<SelectSymbol, LogicalPlan>,
        num_expected_rows: u64,
        estimated_row_size: u64,
    ) -> Self {
        Self {
            relation,
            outputs,
            where_clause,
            dependencies,
            num_expected_rows,
            estimated_row_size,
        }
    }

    /// Builder that collects only the columns of `relation` referenced by
    /// the required symbols.
    pub fn create(
        relation: TableRelation,
        where_clause: Option<Symbol>,
        dependencies: BTreeMap<SelectSymbol, LogicalPlan>,
    ) -> Builder {
        Builder::new(move |stats, used| {
            let outputs = columns_to_collect(&relation, used);
            let num_expected_rows = stats.num_docs(relation.id);
            let estimated_row_size = stats.estimated_size_per_row(relation.id, &outputs);
            Ok(LogicalPlan::Collect(Collect::new(
                relation,
                outputs,
                where_clause,
                dependencies,
                num_expected_rows,
                estimated_row_size,
            )))
        })
    }

    pub fn relation(&self) -> &TableRelation {
        &self.relation
    }

    pub fn outputs(&self) -> &[Symbol] {
        &self.outputs
    }

    pub fn where_clause(&self) -> Option<&Symbol> {
        self.where_clause.as_ref()
    }

    pub fn dependencies(&self) -> BTreeMap<SelectSymbol, &LogicalPlan> {
        self.dependencies.iter().map(|(k, v)| (*k, v)).collect()
    }

    pub fn num_expected_rows(&self) -> u64 {
        self.num_expected_rows
    }

    pub fn estimated_row_size(&self) -> u64 {
        self.estimated_row_size
    }

    /// A pushed-down ordering is applied while reading only when all its
    /// symbols are collected; otherwise neither the ordering nor the limit
    /// can be applied per node and both are left to the consumer.
    pub(super) fn build(
        &self,
        ctx: &mut PlannerContext<'_>,
        limit: Option<u64>,
        offset: u64,
        order: Option<&OrderBy>,
    ) -> Result<ExecutionPlan> {
        let routing = ctx.oracle().routing(self.relation.id)?;
        let (order_by, limit, offset) = match order {
            Some(o) if o.order_by_symbols().iter().all(|s| self.outputs.contains(s)) => {
                (Some(o.clone()), limit, offset)
            }
            Some(o) => {
                tracing::trace!(relation = %self.relation.name, order = %o, "ordering not collectable");
                (None, None, 0)
            }
            None => (None, limit, offset),
        };
        let positional_order = order_by
            .as_ref()
            .map(|o| PositionalOrderBy::of(o, &self.outputs))
            .transpose()?;

        let phase = CollectPhase {
            id: ctx.next_execution_phase_id(),
            name: "collect".into(),
            relation: self.relation.name.clone(),
            routing,
            to_collect: self.outputs.clone(),
            where_clause: self.where_clause.clone(),
            order_by,
            node_limit: limit.map(|l| l.saturating_add(offset)),
            projections: Vec::new(),
            distribution: DistributionType::Broadcast,
        };
        let mut unfinished = Unfinished::new(type_view(&self.outputs));
        unfinished.limit = limit;
        unfinished.offset = offset;
        unfinished.order_by = positional_order;
        Ok(ExecutionPlan::Collect(CollectPlan { phase, unfinished }))
    }
}

/// Columns of `relation` referenced anywhere in `used`, first use first.
fn columns_to_collect(relation: &TableRelation, used: &[Symbol]) -> Vec<Symbol> {
    let mut outputs: Vec<Symbol> = Vec::new();
    for sym in used {
        for col in sym.columns() {
            if col.relation != relation.id {
                continue;
            }
            let col = Symbol::Column(col.clone());
            if relation.columns.contains(&col) && !outputs.contains(&col) {
                outputs.push(col);
            }
        }
    }
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{Stats, TableStats};
    use crate::oracle::StaticCluster;
    use shardplan_core::config::PlannerConfig;
    use shardplan_core::id::{ColumnId, NodeId};
    use shardplan_core::schema::DataType;

    fn relation() -> TableRelation {
        let cols = ["id", "name", "score"]
            .iter()
            .enumerate()
            .map(|(i, n)| Symbol::column(RelationId::new(1), ColumnId::new(i as u64), *n, DataType::Int64))
            .collect();
        TableRelation::new(RelationId::new(1), "users", cols)
    }

    #[test]
    fn builder_prunes_unused_columns() {
        let rel = relation();
        let score = rel.columns[2].clone();
        let id = rel.columns[0].clone();
        let used = vec![score.clone(), Symbol::function("abs", vec![id.clone()], DataType::Int64)];
        let stats = TableStats::default().with_stats(RelationId::new(1), Stats::new(5, 50));
        let plan = Collect::create(rel, None, BTreeMap::new()).build(&stats, &used).unwrap();
        assert_eq!(plan.outputs(), &[score, id]);
        assert_eq!(plan.num_expected_rows(), 5);
        assert_eq!(plan.estimated_row_size(), 10);
    }

    #[test]
    fn uncollectable_order_drops_limit() {
        let rel = relation();
        let id = rel.columns[0].clone();
        let name = rel.columns[1].clone();
        let plan = Collect::create(rel, None, BTreeMap::new())
            .build(&TableStats::default(), &[id])
            .unwrap();
        let cluster = StaticCluster::new(NodeId::new(0)).with_relation(RelationId::new(1), [NodeId::new(1)]);
        let config = PlannerConfig::default();
        let mut ctx = PlannerContext::new(&cluster, &config);
        let order = OrderBy::ascending(vec![name]);
        let built = plan.build(&mut ctx, Some(10), 0, Some(&order)).unwrap();
        let desc = built.result_description();
        assert_eq!(desc.limit, None);
        assert!(desc.order_by.is_none());
    }

    #[test]
    fn collectable_order_limits_each_node() {
        let rel = relation();
        let id = rel.columns[0].clone();
        let plan = Collect::create(rel, None, BTreeMap::new())
            .build(&TableStats::default(), &[id.clone()])
            .unwrap();
        let cluster = StaticCluster::new(NodeId::new(0))
            .with_relation(RelationId::new(1), [NodeId::new(1), NodeId::new(2)]);
        let config = PlannerConfig::default();
        let mut ctx = PlannerContext::new(&cluster, &config);
        let order = OrderBy::ascending(vec![id]);
        let built = plan.build(&mut ctx, Some(10), 5, Some(&order)).unwrap();
        let ExecutionPlan::Collect(c) = &built else {
            panic!("expected a collect plan");
        };
        assert_eq!(c.phase.node_limit, Some(15));
        let desc = built.result_description();
        assert_eq!(desc.limit, Some(10));
        assert_eq!(desc.offset, 5);
        assert_eq!(desc.order_by.map(|o| o.indices), Some(vec![0]));
    }
}
