#![forbid(unsafe_code)]
//! shardplan-core: shared kernel for the shardplan query planner.
//!
//! This crate contains only *pure* types and small helpers that the other
//! crates build on. There is **no I/O** and **no planning logic** here.
//!
//! Crates that use this:
//! - shardplan-planner: builds logical plans over `Symbol` trees and compiles
//!   them into distributed execution plans.
//! - shardplan-io: produces rows of `Scalar` values from file URIs.

pub mod config;
pub mod ddl;
pub mod error;
pub mod hash;
pub mod id;
pub mod order_by;
pub mod prelude;
pub mod schema;
pub mod symbol;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
