//! Indented text rendering of logical plans.

use std::fmt::Write;

use shardplan_core::symbol::Symbol;

use crate::logical::{Collect, Eval, HashJoin, Limit, LogicalPlan, LogicalPlanVisitor, Order, Union};

/// Render `plan` one operator per line, children indented by two spaces.
///
/// ```text
/// Order[x DESC]
///   Collect[users | x, y]
/// ```
pub fn explain(plan: &LogicalPlan) -> String {
    let mut printer = Explain { out: String::new() };
    plan.accept(&mut printer, 0);
    printer.out
}

struct Explain {
    out: String,
}

impl Explain {
    fn line(&mut self, depth: usize, text: impl std::fmt::Display) {
        // writing into a String cannot fail
        let _ = writeln!(self.out, "{:indent$}{}", "", text, indent = depth * 2);
    }
}

fn list(symbols: &[Symbol]) -> String {
    symbols.iter().map(Symbol::to_string).collect::<Vec<_>>().join(", ")
}

impl LogicalPlanVisitor<usize, ()> for Explain {
    fn visit_collect(&mut self, plan: &Collect, depth: usize) {
        match plan.where_clause() {
            Some(w) => self.line(
                depth,
                format!("Collect[{} | {} | {}]", plan.relation().name, list(plan.outputs()), w),
            ),
            None => self.line(
                depth,
                format!("Collect[{} | {}]", plan.relation().name, list(plan.outputs())),
            ),
        }
    }

    fn visit_eval(&mut self, plan: &Eval, depth: usize) {
        self.line(depth, format!("Eval[{}]", list(plan.outputs())));
        plan.source().accept(self, depth + 1);
    }

    fn visit_order(&mut self, plan: &Order, depth: usize) {
        self.line(depth, format!("Order[{}]", plan.order_by()));
        plan.source().accept(self, depth + 1);
    }

    fn visit_limit(&mut self, plan: &Limit, depth: usize) {
        self.line(depth, format!("Limit[{}, {}]", plan.limit(), plan.offset()));
        plan.source().accept(self, depth + 1);
    }

    fn visit_hash_join(&mut self, plan: &HashJoin, depth: usize) {
        self.line(depth, format!("HashJoin[{}]", plan.join_condition()));
        plan.lhs().accept(self, depth + 1);
        plan.rhs().accept(self, depth + 1);
    }

    fn visit_union(&mut self, plan: &Union, depth: usize) {
        self.line(depth, format!("Union[{}]", list(plan.outputs())));
        plan.lhs().accept(self, depth + 1);
        plan.rhs().accept(self, depth + 1);
    }
}
