use shardplan_core::error::Result;
use shardplan_core::symbol::Symbol;

use super::{Builder, LogicalPlan};
use crate::context::PlannerContext;
use crate::physical::merge::{ensure_on_handler, executes_on_handler};
use crate::physical::{ExecutionPlan, Projection};

/// Skips `offset` rows and returns at most `limit` rows of its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    source: Box<LogicalPlan>,
    limit: u64,
    offset: u64,
}

impl Limit {
    pub fn new(source: LogicalPlan, limit: u64, offset: u64) -> Self {
        Self {
            source: Box::new(source),
            limit,
            offset,
        }
    }

    pub fn create(source: Builder, limit: u64, offset: u64) -> Builder {
        Builder::new(move |stats, used| {
            let source = source.build(stats, used)?;
            Ok(LogicalPlan::Limit(Limit::new(source, limit, offset)))
        })
    }

    pub fn source(&self) -> &LogicalPlan {
        &self.source
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn outputs(&self) -> &[Symbol] {
        self.source.outputs()
    }

    pub fn num_expected_rows(&self) -> u64 {
        self.limit.min(self.source.num_expected_rows())
    }

    /// Requests from the consumer are ignored: whatever remains of our own
    /// limit is reported as unfinished and the consumer finishes it.
    pub(super) fn build(&self, ctx: &mut PlannerContext<'_>) -> Result<ExecutionPlan> {
        let mut plan = self.source.build(ctx, Some(self.limit), self.offset, None)?;
        let desc = plan.result_description();
        let ours = desc.limit == Some(self.limit) && desc.offset == self.offset;
        if desc.has_remaining_limit_or_offset() && !ours {
            plan = ensure_on_handler(plan, ctx);
        }

        let desc = plan.result_description();
        if executes_on_handler(ctx.handler_node(), &desc.node_ids) {
            plan.add_projection(
                Projection::TopN {
                    limit: Some(self.limit),
                    offset: self.offset,
                    output_types: desc.stream_output_types,
                },
                None,
                0,
                desc.order_by,
            );
        } else if !ours {
            plan.add_projection(
                Projection::TopN {
                    limit: Some(self.limit.saturating_add(self.offset)),
                    offset: 0,
                    output_types: desc.stream_output_types,
                },
                Some(self.limit),
                self.offset,
                desc.order_by,
            );
        }
        Ok(plan)
    }

    pub fn update_source(&self, new_source: LogicalPlan) -> Limit {
        Limit::new(new_source, self.limit, self.offset)
    }

    pub(super) fn try_optimize(&self, push_down: Option<&LogicalPlan>) -> Result<Option<LogicalPlan>> {
        if push_down.is_some() {
            return Ok(None);
        }
        Ok(self
            .source
            .try_optimize(None)?
            .map(|source| LogicalPlan::Limit(self.update_source(source))))
    }
}
