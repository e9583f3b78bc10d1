//! Optimizer pass over logical plans.

use shardplan_core::error::Result;

use crate::logical::LogicalPlan;

/// Apply the pushdown rewrites from the root.
///
/// Best effort: the result is never worse than the input, but not
/// necessarily optimal. Running it on its own output changes nothing.
pub fn optimize(plan: LogicalPlan) -> Result<LogicalPlan> {
    match plan.try_optimize(None)? {
        Some(rewritten) => {
            tracing::debug!("logical plan rewritten by pushdown");
            Ok(rewritten)
        }
        None => Ok(plan),
    }
}
