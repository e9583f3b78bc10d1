//! Equi-join condition analysis.
//!
//! A hash join needs its condition as a conjunction of equalities, each
//! comparing the join's concrete relation with the rest of the tree. The
//! partition below pairs the two sides per equality so key `i` on one side
//! always matches key `i` on the other.

use std::collections::BTreeSet;

use shardplan_core::error::{Error, Result};
use shardplan_core::id::RelationId;
use shardplan_core::symbol::{Symbol, EQ};

/// Hash keys of a join condition split by side, aligned pairwise.
#[derive(Debug, Clone, PartialEq)]
pub struct HashKeyPartition {
    /// Keys referencing only the concrete relation.
    pub concrete: Vec<Symbol>,
    /// Keys referencing the remaining relations of the tree.
    pub tree: Vec<Symbol>,
}

impl HashKeyPartition {
    /// Relations referenced by the tree-side keys.
    pub fn tree_relations(&self) -> BTreeSet<RelationId> {
        self.tree.iter().flat_map(Symbol::relations).collect()
    }
}

/// Split `condition` into its equalities.
pub fn equalities(condition: &Symbol) -> Result<Vec<(&Symbol, &Symbol)>> {
    condition
        .conjuncts()
        .into_iter()
        .map(|c| match c.as_function(EQ).map(|f| f.args.as_slice()) {
            Some([lhs, rhs]) => Ok((lhs, rhs)),
            _ => Err(Error::Plan(format!(
                "join condition must be a conjunction of equalities, found {c}"
            ))),
        })
        .collect()
}

/// Assign each side of every equality to the concrete relation or to the
/// rest of the tree.
pub fn partition(condition: &Symbol, concrete: RelationId) -> Result<HashKeyPartition> {
    let mut out = HashKeyPartition {
        concrete: Vec::new(),
        tree: Vec::new(),
    };
    let only_concrete = BTreeSet::from([concrete]);
    for (lhs, rhs) in equalities(condition)? {
        let (l, r) = (lhs.relations(), rhs.relations());
        let is_tree = |rels: &BTreeSet<RelationId>| !rels.is_empty() && !rels.contains(&concrete);
        let (c, t) = if l == only_concrete && is_tree(&r) {
            (lhs, rhs)
        } else if r == only_concrete && is_tree(&l) {
            (rhs, lhs)
        } else {
            return Err(Error::invariant(format!(
                "equality ({lhs} = {rhs}) does not compare {concrete} with the rest of the join tree"
            )));
        };
        out.concrete.push(c.clone());
        out.tree.push(t.clone());
    }
    Ok(out)
}
