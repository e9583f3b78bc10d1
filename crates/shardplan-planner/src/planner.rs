//! Top-level entry: builder chain → optimized logical plan → execution plan.

use serde::Serialize;
use shardplan_core::config::PlannerConfig;
use shardplan_core::error::Result;
use shardplan_core::hash::Hash256;
use shardplan_core::symbol::Symbol;
use uuid::Uuid;

use crate::context::PlannerContext;
use crate::cost::TableStats;
use crate::logical::{Builder, Eval, LogicalPlan};
use crate::oracle::ClusterOracle;
use crate::physical::merge::ensure_on_handler;
use crate::physical::{DistributionType, ExecutionPlan};
use crate::rules::optimize;

/// Result of one compilation.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledQuery {
    pub job_id: Uuid,
    pub plan: ExecutionPlan,
}

impl CompiledQuery {
    /// Content hash of the execution plan; independent of the job id.
    pub fn fingerprint(&self) -> Result<Hash256> {
        self.plan.fingerprint()
    }
}

pub struct LogicalPlanner<'a> {
    oracle: &'a dyn ClusterOracle,
    stats: &'a TableStats,
    config: &'a PlannerConfig,
}

impl<'a> LogicalPlanner<'a> {
    pub fn new(oracle: &'a dyn ClusterOracle, stats: &'a TableStats, config: &'a PlannerConfig) -> Self {
        Self {
            oracle,
            stats,
            config,
        }
    }

    /// Materialize `builder` for `required` and run the optimizer.
    ///
    /// The root exposes exactly `required`; symbols some operator kept only
    /// for itself (e.g. sort keys) are projected away.
    pub fn build_logical(&self, builder: Builder, required: &[Symbol]) -> Result<LogicalPlan> {
        let mut plan = builder.build(self.stats, required)?;
        if plan.outputs() != required {
            plan = LogicalPlan::Eval(Eval::new(plan, required.to_vec()));
        }
        optimize(plan)
    }

    /// Compile a query whose result consists of `required`, delivered to the
    /// handler node with every limit and offset applied.
    pub fn plan(&self, builder: Builder, required: &[Symbol]) -> Result<CompiledQuery> {
        let logical = self.build_logical(builder, required)?;
        let mut ctx = PlannerContext::new(self.oracle, self.config);
        let plan = logical.build(&mut ctx, None, 0, None)?;
        let mut plan = ensure_on_handler(plan, &mut ctx);
        plan.set_distribution_info(DistributionType::None);
        tracing::debug!(
            job_id = %ctx.job_id(),
            phases = plan.phases().len(),
            "compiled execution plan"
        );
        Ok(CompiledQuery {
            job_id: ctx.job_id(),
            plan,
        })
    }
}
