//! Translation of symbols into positional `InputColumn`s.
//!
//! A phase receives rows whose layout is the `outputs` of the operator
//! beneath it. Before a projection or join condition can be shipped, every
//! symbol it uses has to be rewritten into an index into that layout.

use std::collections::HashMap;

use shardplan_core::error::{Error, Result};
use shardplan_core::symbol::Symbol;

/// Upstream row layout with O(1) symbol lookup.
#[derive(Debug)]
pub struct SourceSymbols {
    positions: HashMap<Symbol, usize>,
}

impl SourceSymbols {
    pub fn new(sources: &[Symbol]) -> Self {
        let mut positions = HashMap::with_capacity(sources.len());
        for (idx, sym) in sources.iter().enumerate() {
            // first occurrence wins
            positions.entry(sym.clone()).or_insert(idx);
        }
        Self { positions }
    }

    pub fn position(&self, symbol: &Symbol) -> Option<usize> {
        self.positions.get(symbol).copied()
    }
}

/// Rewrite `symbol` so that every sub-expression available in `sources` is
/// replaced by its position.
///
/// Literals, sub-query placeholders and existing input columns are kept.
/// A column reference that cannot be found means a builder handed the wrong
/// layout to a phase and is reported as an invariant violation.
pub fn create(symbol: &Symbol, sources: &SourceSymbols) -> Result<Symbol> {
    symbol.try_replace(&mut |s| {
        if let Some(idx) = sources.position(s) {
            return Ok(Some(Symbol::input_column(idx, s.value_type())));
        }
        match s {
            Symbol::Column(c) => Err(Error::invariant(format!(
                "column {} ({}/{}) is not part of the source outputs",
                c.name, c.relation, c.column
            ))),
            _ => Ok(None),
        }
    })
}

pub fn create_all(symbols: &[Symbol], sources: &SourceSymbols) -> Result<Vec<Symbol>> {
    symbols.iter().map(|s| create(s, sources)).collect()
}

/// Inverse of [`create`]: substitute every input column with the symbol at
/// that position of `sources`.
pub fn resolve(symbol: &Symbol, sources: &[Symbol]) -> Result<Symbol> {
    symbol.try_replace(&mut |s| match s {
        Symbol::InputColumn(ic) => sources.get(ic.index).cloned().map(Some).ok_or_else(|| {
            Error::invariant(format!(
                "input column {} out of range for {} sources",
                ic.index,
                sources.len()
            ))
        }),
        _ => Ok(None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardplan_core::id::{ColumnId, RelationId, SubQueryId};
    use shardplan_core::schema::DataType;
    use shardplan_core::symbol::SelectSymbol;
    use shardplan_core::types::Scalar;

    fn col(id: u64, name: &str) -> Symbol {
        Symbol::column(RelationId::new(1), ColumnId::new(id), name, DataType::Int64)
    }

    #[test]
    fn columns_become_positions() {
        let sources = vec![col(1, "a"), col(2, "b")];
        let ctx = SourceSymbols::new(&sources);
        let out = create(&col(2, "b"), &ctx).unwrap();
        assert_eq!(out, Symbol::input_column(1, DataType::Int64));
    }

    #[test]
    fn whole_function_match_wins_over_arguments() {
        let sum = Symbol::function("add", vec![col(1, "a"), col(2, "b")], DataType::Int64);
        let sources = vec![col(1, "a"), sum.clone()];
        let out = create(&sum, &SourceSymbols::new(&sources)).unwrap();
        assert_eq!(out, Symbol::input_column(1, DataType::Int64));
    }

    #[test]
    fn function_arguments_are_translated() {
        let sum = Symbol::function(
            "add",
            vec![col(2, "b"), Symbol::literal(Scalar::I64(1))],
            DataType::Int64,
        );
        let sources = vec![col(1, "a"), col(2, "b")];
        let out = create(&sum, &SourceSymbols::new(&sources)).unwrap();
        assert_eq!(out.to_string(), "add(INPUT(1), 1)");
    }

    #[test]
    fn missing_column_is_an_invariant_violation() {
        let sources = vec![col(1, "a")];
        let err = create(&col(9, "z"), &SourceSymbols::new(&sources)).unwrap_err();
        assert!(err.is_invariant());
    }

    #[test]
    fn unresolved_select_symbols_are_kept() {
        let sub = Symbol::SelectSymbol(SelectSymbol {
            id: SubQueryId::new(3),
            data_type: DataType::Int64,
        });
        let out = create(&sub, &SourceSymbols::new(&[])).unwrap();
        assert_eq!(out, sub);
    }

    #[test]
    fn resolving_positions_restores_columns() {
        let sources = vec![col(1, "a"), col(2, "b"), col(3, "c")];
        let ctx = SourceSymbols::new(&sources);
        for s in &sources {
            let positional = create(s, &ctx).unwrap();
            assert_eq!(&resolve(&positional, &sources).unwrap(), s);
        }
    }
}
