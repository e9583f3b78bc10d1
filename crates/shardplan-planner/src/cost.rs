//! Coarse cost estimates for logical operators.
//!
//! Estimates are heuristics for join side selection only. They can be
//! arbitrarily wrong and must never influence correctness.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shardplan_core::config::PlannerConfig;
use shardplan_core::id::RelationId;
use shardplan_core::symbol::Symbol;

/// Statistics for a single relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub num_docs: u64,
    pub size_in_bytes: u64,
}

impl Stats {
    pub fn new(num_docs: u64, size_in_bytes: u64) -> Self {
        Self {
            num_docs,
            size_in_bytes,
        }
    }

    pub fn average_size_per_row(&self) -> Option<u64> {
        if self.num_docs == 0 {
            None
        } else {
            Some(self.size_in_bytes / self.num_docs)
        }
    }
}

/// Relation statistics known at planning time, plus config-driven fallbacks.
#[derive(Debug, Clone, Default)]
pub struct TableStats {
    stats: HashMap<RelationId, Stats>,
    config: PlannerConfig,
}

impl TableStats {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            stats: HashMap::new(),
            config,
        }
    }

    pub fn with_stats(mut self, relation: RelationId, stats: Stats) -> Self {
        self.stats.insert(relation, stats);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Expected row count; the configured default when nothing is known.
    pub fn num_docs(&self, relation: RelationId) -> u64 {
        self.stats
            .get(&relation)
            .map(|s| s.num_docs)
            .unwrap_or(self.config.default_row_count)
    }

    /// Average stored row size, or a type-based estimate of `columns`.
    pub fn estimated_size_per_row(&self, relation: RelationId, columns: &[Symbol]) -> u64 {
        self.stats
            .get(&relation)
            .and_then(Stats::average_size_per_row)
            .unwrap_or_else(|| estimate_row_size(columns, &self.config))
    }
}

/// Sum of per-value width estimates (minimum 1 byte per row).
pub fn estimate_row_size(symbols: &[Symbol], config: &PlannerConfig) -> u64 {
    symbols
        .iter()
        .map(|s| s.value_type().estimated_width(config))
        .sum::<u64>()
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardplan_core::id::ColumnId;
    use shardplan_core::schema::DataType;

    #[test]
    fn unknown_relations_fall_back_to_config() {
        let stats = TableStats::new(PlannerConfig::default());
        let cols = vec![
            Symbol::column(RelationId::new(1), ColumnId::new(1), "id", DataType::Int64),
            Symbol::column(RelationId::new(1), ColumnId::new(2), "name", DataType::Utf8),
        ];
        assert_eq!(stats.num_docs(RelationId::new(1)), 10_000);
        assert_eq!(stats.estimated_size_per_row(RelationId::new(1), &cols), 8 + 32);
    }

    #[test]
    fn known_stats_win() {
        let stats = TableStats::default().with_stats(RelationId::new(7), Stats::new(100, 2_000));
        assert_eq!(stats.num_docs(RelationId::new(7)), 100);
        assert_eq!(stats.estimated_size_per_row(RelationId::new(7), &[]), 20);
    }
}
