use std::collections::BTreeSet;

use shardplan_core::id::RelationId;

use super::{Collect, Eval, HashJoin, Limit, Order, Union};

/// Exhaustive per-operator dispatch for `LogicalPlan::accept`.
///
/// No default methods; every visitor handles every operator.
pub trait LogicalPlanVisitor<C, R> {
    fn visit_collect(&mut self, plan: &Collect, ctx: C) -> R;
    fn visit_eval(&mut self, plan: &Eval, ctx: C) -> R;
    fn visit_order(&mut self, plan: &Order, ctx: C) -> R;
    fn visit_limit(&mut self, plan: &Limit, ctx: C) -> R;
    fn visit_hash_join(&mut self, plan: &HashJoin, ctx: C) -> R;
    fn visit_union(&mut self, plan: &Union, ctx: C) -> R;
}

/// Gathers the base relations at the leaves of a plan.
#[derive(Debug, Default)]
pub struct RelationCollector {
    relations: BTreeSet<RelationId>,
}

impl RelationCollector {
    pub fn into_relations(self) -> BTreeSet<RelationId> {
        self.relations
    }
}

impl LogicalPlanVisitor<(), ()> for RelationCollector {
    fn visit_collect(&mut self, plan: &Collect, _: ()) {
        self.relations.insert(plan.relation().id);
    }

    fn visit_eval(&mut self, plan: &Eval, _: ()) {
        plan.source().accept(self, ());
    }

    fn visit_order(&mut self, plan: &Order, _: ()) {
        plan.source().accept(self, ());
    }

    fn visit_limit(&mut self, plan: &Limit, _: ()) {
        plan.source().accept(self, ());
    }

    fn visit_hash_join(&mut self, plan: &HashJoin, _: ()) {
        plan.lhs().accept(self, ());
        plan.rhs().accept(self, ());
    }

    fn visit_union(&mut self, plan: &Union, _: ()) {
        plan.lhs().accept(self, ());
        plan.rhs().accept(self, ());
    }
}
