//! A grammar built from parameterized rules.

use racc_analysis::{analyze, DiagnosticKind, Namespace, Occurrence, Position, Range, SymbolKind};

const LISTS: &str = include_str!("grammars/lists.y");

fn range(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn templates() {
    let table = analyze(LISTS).symbol_table;

    let pair = table.lookup_parameterized("pair").unwrap();
    assert_eq!(pair.kind, SymbolKind::ParameterizedRule);
    assert_eq!(pair.parameters, Some(strings(&["X", "Y"])));
    assert_eq!(pair.definition.unwrap().name_range, range(13, 6, 10));
    assert_eq!(pair.parameterized_calls.len(), 1);
    assert_eq!(
        pair.parameterized_calls[0].argument_names,
        strings(&["NUMBER", "value"])
    );
    assert_eq!(pair.parameterized_calls[0].range, range(25, 22, 41));

    let bracketed = table.lookup_parameterized("bracketed").unwrap();
    assert_eq!(bracketed.type_tag.as_deref(), Some("l"));
    assert_eq!(bracketed.parameterized_calls[0].argument_names, strings(&["pair"]));
    assert_eq!(bracketed.parameterized_calls[0].range, range(25, 12, 42));

    let separated = table.lookup_parameterized("separated_list").unwrap();
    assert!(!separated.is_defined());
    assert_eq!(
        separated.parameterized_calls[0].argument_names,
        strings(&["tCOMMA", "statement"])
    );

    // Without parameters, %rule defines a plain rule.
    let opt_comma = table.lookup_in(Namespace::Plain, "opt_comma").unwrap();
    assert_eq!(opt_comma.kind, SymbolKind::Rule);
    assert!(opt_comma.is_inline);
    assert!(!opt_comma.is_parameterized);
    assert!(table.lookup_parameterized("opt_comma").is_none());
}

#[test]
fn references() {
    let table = analyze(LISTS).symbol_table;
    let refs = |name: &str| {
        table
            .lookup_in(Namespace::Plain, name)
            .map_or(0, |s| s.references.len())
    };

    assert_eq!(refs("tCOMMA"), 3);
    assert_eq!(refs("NUMBER"), 3);
    assert_eq!(refs("value"), 2);
    assert_eq!(refs("statement"), 1);
    assert_eq!(refs("statements"), 1);
    assert_eq!(refs("'['"), 1);

    // Parameters and named references are not symbols.
    for name in &["X", "Y", "stmts", "v"] {
        assert!(table.lookup_by_name(name).is_none(), "{}", name);
    }
    // Neither is anything inside %union.
    assert!(table.lookup_by_name("list").is_none());
}

#[test]
fn diagnostics() {
    let analysis = analyze(LISTS);
    let found: Vec<(DiagnosticKind, Range)> = analysis
        .diagnostics
        .iter()
        .map(|d| (d.kind, d.range))
        .collect();
    assert_eq!(
        found,
        vec![
            (DiagnosticKind::UnusedRule, range(22, 0, 7)),
            (DiagnosticKind::UndefinedSymbol, range(31, 10, 23)),
        ]
    );
}

#[test]
fn nested_calls_resolve_to_innermost() {
    let table = analyze(LISTS).symbol_table;

    let m = table.lookup_at(Position::new(25, 13)).unwrap();
    assert_eq!(m.occurrence, Occurrence::Call);
    assert_eq!(m.symbol.name, "bracketed");

    let m = table.lookup_at(Position::new(25, 23)).unwrap();
    assert_eq!(m.symbol.name, "pair");

    // Inside a call, the call wins over the arguments.
    let m = table.lookup_at(Position::new(25, 36)).unwrap();
    assert_eq!(m.occurrence, Occurrence::Call);
    assert_eq!(m.symbol.name, "pair");

    // The template's own name.
    let m = table.lookup_at(Position::new(13, 7)).unwrap();
    assert_eq!(m.occurrence, Occurrence::Definition);
    assert!(m.symbol.is_parameterized);
}
