#![forbid(unsafe_code)]
//! shardplan: logical query plans compiled into distributed execution plans.
//!
//! Facade over the workspace crates:
//! - [`core`]: ids, symbols, scalars, config, errors, DDL requests.
//! - [`planner`]: logical operators, pushdown optimizer, execution-plan synthesis.
//! - [`io`]: file ingestion producing rows from CSV/JSON sources.

pub use shardplan_core as core;
pub use shardplan_io as io;
pub use shardplan_planner as planner;
