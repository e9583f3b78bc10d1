//! Cluster placement oracle.
//!
//! The planner never inspects cluster state directly; it asks the oracle
//! where a relation's data lives and which node coordinates the query.

use std::collections::{BTreeSet, HashMap};

use shardplan_core::error::{Error, Result};
use shardplan_core::id::{NodeId, RelationId};

use crate::physical::ResultDescription;

pub trait ClusterOracle {
    /// Node that coordinates the query and receives the final result.
    fn handler_node(&self) -> NodeId;

    /// Nodes holding shards of `relation`.
    fn routing(&self, relation: RelationId) -> Result<BTreeSet<NodeId>>;

    /// Whether results described by `result` must be merged before they can
    /// be consumed on `execution_nodes`.
    fn is_merge_phase_needed(
        &self,
        execution_nodes: &BTreeSet<NodeId>,
        result: &ResultDescription,
        is_distributed: bool,
    ) -> bool {
        is_distributed
            || result.has_remaining_limit_or_offset()
            || &result.node_ids != execution_nodes
    }
}

/// Fixed placement table; useful for tests and offline plan inspection.
#[derive(Debug, Clone)]
pub struct StaticCluster {
    handler: NodeId,
    routing: HashMap<RelationId, BTreeSet<NodeId>>,
}

impl StaticCluster {
    pub fn new(handler: NodeId) -> Self {
        Self {
            handler,
            routing: HashMap::new(),
        }
    }

    pub fn with_relation(
        mut self,
        relation: RelationId,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        self.routing.insert(relation, nodes.into_iter().collect());
        self
    }
}

impl ClusterOracle for StaticCluster {
    fn handler_node(&self) -> NodeId {
        self.handler
    }

    fn routing(&self, relation: RelationId) -> Result<BTreeSet<NodeId>> {
        self.routing
            .get(&relation)
            .cloned()
            .ok_or_else(|| Error::Plan(format!("no shard routing known for {relation}")))
    }
}
