//! Symbol to input-column translation against upstream layouts.

mod common;

use common::col;
use shardplan_core::error::Error;
use shardplan_core::id::SubQueryId;
use shardplan_core::schema::DataType;
use shardplan_core::symbol::{SelectSymbol, Symbol};
use shardplan_core::types::Scalar;
use shardplan_planner::input_columns::{create, create_all, resolve, SourceSymbols};

#[test]
fn translated_symbols_resolve_back_to_originals() {
    let sources = vec![col(1, 1, "a"), col(1, 2, "b"), col(2, 1, "c")];
    let layout = SourceSymbols::new(&sources);
    let symbols = vec![
        Symbol::function("add", vec![col(1, 1, "a"), col(2, 1, "c")], DataType::Int64),
        Symbol::eq(col(1, 2, "b"), Symbol::literal(Scalar::I64(7))),
        col(2, 1, "c"),
    ];

    let positional = create_all(&symbols, &layout).unwrap();
    assert_eq!(positional[2], Symbol::input_column(2, DataType::Int64));
    for (original, translated) in symbols.iter().zip(&positional) {
        assert!(translated.columns().is_empty(), "{translated}");
        assert_eq!(&resolve(translated, &sources).unwrap(), original);
    }
}

#[test]
fn whole_expressions_available_upstream_become_one_input() {
    let sum = Symbol::function("add", vec![col(1, 1, "a"), col(1, 2, "b")], DataType::Int64);
    let sources = vec![col(1, 1, "a"), sum.clone()];
    let translated = create(
        &Symbol::function("abs", vec![sum], DataType::Int64),
        &SourceSymbols::new(&sources),
    )
    .unwrap();
    assert_eq!(
        translated,
        Symbol::function("abs", vec![Symbol::input_column(1, DataType::Int64)], DataType::Int64)
    );
}

#[test]
fn placeholders_and_literals_pass_through() {
    let sub = Symbol::SelectSymbol(SelectSymbol {
        id: SubQueryId::new(3),
        data_type: DataType::Int64,
    });
    let lit = Symbol::literal(Scalar::Str("x".into()));
    let layout = SourceSymbols::new(&[col(1, 1, "a")]);
    assert_eq!(create(&sub, &layout).unwrap(), sub);
    assert_eq!(create(&lit, &layout).unwrap(), lit);
}

#[test]
fn missing_column_is_an_invariant_violation() {
    let layout = SourceSymbols::new(&[col(1, 1, "a")]);
    let err = create(&col(1, 2, "b"), &layout).unwrap_err();
    assert!(err.is_invariant(), "{err}");

    let err = resolve(&Symbol::input_column(4, DataType::Int64), &[col(1, 1, "a")]).unwrap_err();
    assert!(matches!(err, Error::Invariant(_)));
}
