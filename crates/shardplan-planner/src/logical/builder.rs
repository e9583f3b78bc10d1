use std::fmt;

use shardplan_core::error::Result;
use shardplan_core::symbol::Symbol;

use super::LogicalPlan;
use crate::cost::TableStats;

type BuildFn = Box<dyn FnOnce(&TableStats, &[Symbol]) -> Result<LogicalPlan>>;

/// Deferred plan fragment.
///
/// A builder is invoked once with the columns its consumer needs and yields a
/// node whose outputs are trimmed to that set. Operator builders wrap the
/// builder of their source and widen the required set with whatever they
/// need themselves before delegating.
pub struct Builder {
    build: BuildFn,
}

impl Builder {
    pub fn new(f: impl FnOnce(&TableStats, &[Symbol]) -> Result<LogicalPlan> + 'static) -> Self {
        Self { build: Box::new(f) }
    }

    /// Wraps an already materialized plan; `used` is ignored.
    pub fn from_plan(plan: LogicalPlan) -> Self {
        Self::new(move |_, _| Ok(plan))
    }

    pub fn build(self, stats: &TableStats, used: &[Symbol]) -> Result<LogicalPlan> {
        (self.build)(stats, used)
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Builder")
    }
}
