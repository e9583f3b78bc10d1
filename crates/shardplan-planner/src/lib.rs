#![forbid(unsafe_code)]
//! shardplan-planner: analyzed symbols → logical operator tree → pushdown
//! rewrites → distributed execution plan.
//!
//! Design:
//! - Logical operators form a closed `LogicalPlan` enum; every rewrite
//!   produces new nodes, nothing is mutated in place.
//! - Plans are assembled through `Builder`s so that every operator only
//!   materializes the columns some ancestor needs.
//! - `build()` compiles a tree into an `ExecutionPlan` of collect, merge and
//!   join phases, consulting the `ClusterOracle` for data placement and the
//!   cost estimates for join side selection.
//!
//! NOTE: Nothing here executes phases; we only describe what runs where.

pub mod context;
pub mod cost;
pub mod explain;
pub mod input_columns;
pub mod join_condition;
pub mod logical;
pub mod oracle;
pub mod physical;
pub mod planner;
pub mod rules;

pub use context::PlannerContext;
pub use cost::{Stats, TableStats};
pub use explain::explain;
pub use logical::{
    Builder, Collect, Eval, HashJoin, Limit, LogicalPlan, LogicalPlanVisitor, Order,
    TableRelation, Union,
};
pub use oracle::{ClusterOracle, StaticCluster};
pub use physical::{DistributionType, ExecutionPlan, Projection, ResultDescription};
pub use planner::{CompiledQuery, LogicalPlanner};
