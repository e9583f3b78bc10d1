//! Symbolic expression trees consumed by the planner.
//!
//! Symbols arrive already resolved by analysis: column references carry a
//! stable relation/column identity, functions carry their return type.
//! Equality and hashing are structural so plans can deduplicate and rewrite
//! symbols freely.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::id::{ColumnId, RelationId, SubQueryId};
use crate::schema::DataType;
use crate::types::Scalar;

pub const EQ: &str = "op_=";
pub const AND: &str = "op_and";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Column(ColumnRef),
    Literal(Scalar),
    Function(Function),
    SelectSymbol(SelectSymbol),
    /// Positional reference into an upstream row; only produced by
    /// input-column translation.
    InputColumn(InputColumn),
}

/// Reference to a column of a relation.
///
/// Identity is `(relation, column)`; the name is for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRef {
    pub relation: RelationId,
    pub column: ColumnId,
    pub name: String,
    pub data_type: DataType,
}

impl PartialEq for ColumnRef {
    fn eq(&self, other: &Self) -> bool {
        self.relation == other.relation && self.column == other.column
    }
}

impl Eq for ColumnRef {}

impl Hash for ColumnRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relation.hash(state);
        self.column.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub args: Vec<Symbol>,
    pub return_type: DataType,
}

/// Placeholder for the single-value result of a sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectSymbol {
    pub id: SubQueryId,
    pub data_type: DataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputColumn {
    pub index: usize,
    pub data_type: DataType,
}

impl Symbol {
    pub fn column(
        relation: RelationId,
        column: ColumnId,
        name: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Symbol::Column(ColumnRef {
            relation,
            column,
            name: name.into(),
            data_type,
        })
    }

    pub fn literal(value: Scalar) -> Self {
        Symbol::Literal(value)
    }

    pub fn function(name: impl Into<String>, args: Vec<Symbol>, return_type: DataType) -> Self {
        Symbol::Function(Function {
            name: name.into(),
            args,
            return_type,
        })
    }

    pub fn eq(lhs: Symbol, rhs: Symbol) -> Self {
        Symbol::function(EQ, vec![lhs, rhs], DataType::Boolean)
    }

    pub fn and(lhs: Symbol, rhs: Symbol) -> Self {
        Symbol::function(AND, vec![lhs, rhs], DataType::Boolean)
    }

    /// Fold a list of predicates into a left-deep conjunction.
    pub fn and_all(mut predicates: Vec<Symbol>) -> Option<Self> {
        if predicates.is_empty() {
            return None;
        }
        let first = predicates.remove(0);
        Some(predicates.into_iter().fold(first, Symbol::and))
    }

    pub fn input_column(index: usize, data_type: DataType) -> Self {
        Symbol::InputColumn(InputColumn { index, data_type })
    }

    pub fn value_type(&self) -> DataType {
        match self {
            Symbol::Column(c) => c.data_type,
            Symbol::Literal(v) => v.data_type(),
            Symbol::Function(f) => f.return_type,
            Symbol::SelectSymbol(s) => s.data_type,
            Symbol::InputColumn(i) => i.data_type,
        }
    }

    pub fn as_function(&self, name: &str) -> Option<&Function> {
        match self {
            Symbol::Function(f) if f.name == name => Some(f),
            _ => None,
        }
    }

    /// Pre-order walk over this symbol and all its arguments.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Symbol)) {
        f(self);
        if let Symbol::Function(func) = self {
            for arg in &func.args {
                arg.visit(f);
            }
        }
    }

    /// Column references in order of first appearance (duplicates kept out).
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out: Vec<&ColumnRef> = Vec::new();
        self.visit(&mut |s| {
            if let Symbol::Column(c) = s {
                if !out.contains(&c) {
                    out.push(c);
                }
            }
        });
        out
    }

    pub fn relations(&self) -> BTreeSet<RelationId> {
        self.columns().into_iter().map(|c| c.relation).collect()
    }

    /// Split an `AND` tree into its conjuncts, left to right.
    pub fn conjuncts(&self) -> Vec<&Symbol> {
        match self.as_function(AND) {
            Some(f) => f.args.iter().flat_map(|a| a.conjuncts()).collect(),
            None => vec![self],
        }
    }

    /// Top-down substitution. When `f` returns a replacement the subtree is
    /// not descended into further.
    pub fn try_replace<E>(
        &self,
        f: &mut impl FnMut(&Symbol) -> Result<Option<Symbol>, E>,
    ) -> Result<Symbol, E> {
        if let Some(replacement) = f(self)? {
            return Ok(replacement);
        }
        match self {
            Symbol::Function(func) => {
                let args = func
                    .args
                    .iter()
                    .map(|a| a.try_replace(f))
                    .collect::<Result<Vec<_>, E>>()?;
                Ok(Symbol::Function(Function {
                    name: func.name.clone(),
                    args,
                    return_type: func.return_type,
                }))
            }
            other => Ok(other.clone()),
        }
    }

    pub fn replace(&self, f: &mut impl FnMut(&Symbol) -> Option<Symbol>) -> Symbol {
        let res: Result<Symbol, Infallible> = self.try_replace(&mut |s| Ok(f(s)));
        match res {
            Ok(s) => s,
            Err(never) => match never {},
        }
    }
}

/// Append `extra` to `base`, skipping symbols already present. Order is kept.
pub fn concat_unique(base: &[Symbol], extra: &[Symbol]) -> Vec<Symbol> {
    let mut out = base.to_vec();
    for s in extra {
        if !out.contains(s) {
            out.push(s.clone());
        }
    }
    out
}

pub fn type_view(symbols: &[Symbol]) -> Vec<DataType> {
    symbols.iter().map(Symbol::value_type).collect()
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Column(c) => f.write_str(&c.name),
            Symbol::Literal(v) => write!(f, "{v}"),
            Symbol::Function(func) => {
                if let (Some(op), [lhs, rhs]) = (func.name.strip_prefix("op_"), func.args.as_slice()) {
                    return write!(f, "({lhs} {} {rhs})", op.to_uppercase());
                }
                write!(f, "{}(", func.name)?;
                for (i, arg) in func.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Symbol::SelectSymbol(s) => write!(f, "SubQuery({})", s.id.get()),
            Symbol::InputColumn(i) => write!(f, "INPUT({})", i.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(rel: u64, id: u64, name: &str) -> Symbol {
        Symbol::column(RelationId::new(rel), ColumnId::new(id), name, DataType::Int64)
    }

    #[test]
    fn column_identity_ignores_name() {
        assert_eq!(col(1, 1, "a"), col(1, 1, "renamed"));
        assert_ne!(col(1, 1, "a"), col(2, 1, "a"));
    }

    #[test]
    fn conjuncts_flatten_nested_and() {
        let cond = Symbol::and(
            Symbol::eq(col(1, 1, "a"), col(2, 1, "b")),
            Symbol::and(
                Symbol::eq(col(1, 2, "c"), col(2, 2, "d")),
                Symbol::eq(col(1, 3, "e"), col(2, 3, "f")),
            ),
        );
        assert_eq!(cond.conjuncts().len(), 3);
        assert_eq!(cond.relations().len(), 2);
    }

    #[test]
    fn replace_stops_at_replaced_subtree() {
        let sum = Symbol::function("add", vec![col(1, 1, "a"), col(1, 2, "b")], DataType::Int64);
        let replaced = sum.replace(&mut |s| match s {
            Symbol::Column(c) if c.name == "a" => Some(Symbol::input_column(0, DataType::Int64)),
            _ => None,
        });
        assert_eq!(replaced.to_string(), "add(INPUT(0), b)");
    }

    #[test]
    fn display_renders_operators_infix() {
        let cond = Symbol::eq(col(1, 1, "a"), Symbol::literal(Scalar::I64(3)));
        assert_eq!(cond.to_string(), "(a = 3)");
    }
}
