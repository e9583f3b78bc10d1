//! Symbolic ORDER BY clauses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    symbols: Vec<Symbol>,
    reverse_flags: Vec<bool>,
    /// `None` means the default null placement for the direction.
    nulls_first: Vec<Option<bool>>,
}

impl OrderBy {
    pub fn new(
        symbols: Vec<Symbol>,
        reverse_flags: Vec<bool>,
        nulls_first: Vec<Option<bool>>,
    ) -> Result<Self> {
        if symbols.len() != reverse_flags.len() || symbols.len() != nulls_first.len() {
            return Err(Error::Plan(format!(
                "order by needs one direction and null placement per symbol, got {}/{}/{}",
                symbols.len(),
                reverse_flags.len(),
                nulls_first.len()
            )));
        }
        Ok(Self {
            symbols,
            reverse_flags,
            nulls_first,
        })
    }

    /// Ascending ordering with default null placement.
    pub fn ascending(symbols: Vec<Symbol>) -> Self {
        let n = symbols.len();
        Self {
            symbols,
            reverse_flags: vec![false; n],
            nulls_first: vec![None; n],
        }
    }

    pub fn order_by_symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn reverse_flags(&self) -> &[bool] {
        &self.reverse_flags
    }

    pub fn nulls_first(&self) -> &[Option<bool>] {
        &self.nulls_first
    }

    /// Rewrite every ordering symbol, keeping directions and null placement.
    pub fn copy_and_replace(&self, mut f: impl FnMut(&Symbol) -> Result<Symbol>) -> Result<Self> {
        let symbols = self.symbols.iter().map(&mut f).collect::<Result<Vec<_>>>()?;
        Ok(Self {
            symbols,
            reverse_flags: self.reverse_flags.clone(),
            nulls_first: self.nulls_first.clone(),
        })
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sym) in self.symbols.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{sym}")?;
            if self.reverse_flags[i] {
                f.write_str(" DESC")?;
            }
            match self.nulls_first[i] {
                Some(true) => f.write_str(" NULLS FIRST")?,
                Some(false) => f.write_str(" NULLS LAST")?,
                None => {}
            }
        }
        Ok(())
    }
}
