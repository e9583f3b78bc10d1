//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use shardplan_core::id::{ColumnId, NodeId, RelationId};
use shardplan_core::schema::DataType;
use shardplan_core::symbol::Symbol;
use shardplan_planner::{Builder, Collect, StaticCluster, TableRelation};

pub const HANDLER: NodeId = NodeId::new(0);

pub fn col(rel: u64, id: u64, name: &str) -> Symbol {
    Symbol::column(RelationId::new(rel), ColumnId::new(id), name, DataType::Int64)
}

/// Relation `rel` with columns numbered 1.. in the given order.
pub fn relation(rel: u64, name: &str, columns: &[&str]) -> TableRelation {
    let cols = columns
        .iter()
        .enumerate()
        .map(|(i, c)| col(rel, i as u64 + 1, &format!("{name}.{c}")))
        .collect();
    TableRelation::new(RelationId::new(rel), name, cols)
}

pub fn scan(relation: &TableRelation) -> Builder {
    Collect::create(relation.clone(), None, BTreeMap::new())
}

/// Every relation in `rels` lives on data nodes 1 and 2.
pub fn two_node_cluster(rels: &[u64]) -> StaticCluster {
    rels.iter().fold(StaticCluster::new(HANDLER), |c, r| {
        c.with_relation(RelationId::new(*r), [NodeId::new(1), NodeId::new(2)])
    })
}

/// Fresh directory under the system temp dir.
pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("shardplan-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
