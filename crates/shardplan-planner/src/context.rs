//! Per-compilation context threaded explicitly through `build()`.

use shardplan_core::config::PlannerConfig;
use shardplan_core::id::{NodeId, PhaseId};
use uuid::Uuid;

use crate::oracle::ClusterOracle;

pub struct PlannerContext<'a> {
    job_id: Uuid,
    oracle: &'a dyn ClusterOracle,
    config: &'a PlannerConfig,
    next_phase_id: u64,
}

impl<'a> PlannerContext<'a> {
    pub fn new(oracle: &'a dyn ClusterOracle, config: &'a PlannerConfig) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            oracle,
            config,
            next_phase_id: 0,
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn handler_node(&self) -> NodeId {
        self.oracle.handler_node()
    }

    pub fn oracle(&self) -> &'a dyn ClusterOracle {
        self.oracle
    }

    pub fn config(&self) -> &'a PlannerConfig {
        self.config
    }

    /// Phase ids are dense and start at 0 for every compilation.
    pub fn next_execution_phase_id(&mut self) -> PhaseId {
        let id = PhaseId::new(self.next_phase_id);
        self.next_phase_id += 1;
        id
    }
}
