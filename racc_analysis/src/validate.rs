//! Finds undefined symbols and unused rules in a completed symbol table.
//!
//! Whether a name "should" be defined in the file is a guess.  Grammars use library templates
//! they never define, tokens that come from a lexer header, and placeholder names inside
//! templates.  The guesses are kept as data in `ValidationPolicy` so hosts can see and change
//! them; they are heuristics, and the defaults are tuned to avoid noise rather than to be
//! complete.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::symbols::{Namespace, Symbol, SymbolKind, SymbolTable};
use log::debug;
use regex::Regex;

/// Templates from the standard library of parameterized rules.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "option",
    "list",
    "nonempty_list",
    "separated_list",
    "separated_nonempty_list",
    "preceded",
    "terminated",
    "delimited",
    "ioption",
];

/// Names commonly used for template parameters.
pub const PLACEHOLDER_NAMES: &[&str] = &[
    "X",
    "Y",
    "Z",
    "T",
    "A",
    "B",
    "C",
    "item",
    "elem",
    "element",
    "separator",
    "sep",
    "opening",
    "closing",
];

/// Names that look like tokens: `NUM`, `END_OF_INPUT`, `tIDENTIFIER`, `kCLASS`, `TOKEN_x`.
pub const TOKEN_NAME_PATTERN: &str = r"^(?:[A-Z_][A-Z0-9_]*|[tk][A-Z].*|TOKEN.*)$";

/// Decides which undefined names are worth a warning.
#[derive(Clone, Debug)]
pub struct ValidationPolicy {
    pub builtin_functions: Vec<String>,
    pub placeholder_names: Vec<String>,
    pub token_name_pattern: Regex,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            builtin_functions: BUILTIN_FUNCTIONS.iter().map(|s| s.to_string()).collect(),
            placeholder_names: PLACEHOLDER_NAMES.iter().map(|s| s.to_string()).collect(),
            token_name_pattern: Regex::new(TOKEN_NAME_PATTERN)
                .expect("TOKEN_NAME_PATTERN is a valid regex"),
        }
    }
}

impl ValidationPolicy {
    /// The default policy, with a different pattern for token-like names.
    pub fn with_token_name_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            token_name_pattern: Regex::new(pattern)?,
            ..Self::default()
        })
    }

    /// Compares base names, so `option(X)` is the built-in `option`.
    pub fn is_builtin_function(&self, name: &str) -> bool {
        let base = match name.find('(') {
            Some(i) => &name[..i],
            None => name,
        };
        let base = base.trim_end();
        self.builtin_functions.iter().any(|b| b == base)
    }

    pub fn looks_like_token(&self, name: &str) -> bool {
        self.token_name_pattern.is_match(name)
    }

    pub fn is_placeholder(&self, name: &str) -> bool {
        self.placeholder_names.iter().any(|p| p == name)
    }

    /// True if an undefined `name` should not be reported.
    pub fn is_excused(&self, name: &str, table: &SymbolTable) -> bool {
        self.is_builtin_function(name)
            || self.looks_like_token(name)
            || name.starts_with('\'')
            || table.is_declared_parameter(name)
            || self.is_placeholder(name)
    }
}

/// A rule nobody uses: defined by a rule, with no references and no calls.  A rule that was
/// first declared with `%type` or `%nterm` counts; the start symbol and character literals are
/// never reported.
fn is_unused_rule(table: &SymbolTable, symbol: &Symbol) -> bool {
    symbol.has_rule
        && symbol.kind != SymbolKind::StartSymbol
        && symbol.is_defined()
        && symbol.references.is_empty()
        && symbol.parameterized_calls.is_empty()
        && table.call_count(&symbol.name) == 0
        && !symbol.is_char_literal()
}

/// Checks a completed symbol table.  Diagnostics are ordered by position.
pub fn validate(table: &SymbolTable, policy: &ValidationPolicy) -> Vec<Diagnostic> {
    let mut diagnostics = Diagnostics::default();

    for (_, symbol) in table.symbols(Namespace::Plain) {
        if !symbol.is_defined()
            && !symbol.references.is_empty()
            && !policy.is_excused(&symbol.name, table)
        {
            for &range in symbol.references.iter() {
                diagnostics.push(Diagnostic::undefined_symbol(&symbol.name, range));
            }
        }

        if is_unused_rule(table, symbol) {
            if let Some(definition) = &symbol.definition {
                diagnostics.push(Diagnostic::unused_rule(
                    &symbol.name,
                    definition.name_range,
                ));
            }
        }
    }

    for (_, template) in table.symbols(Namespace::Parameterized) {
        if !template.is_defined()
            && !template.parameterized_calls.is_empty()
            && !policy.is_excused(&template.name, table)
        {
            for call in template.parameterized_calls.iter() {
                diagnostics.push(Diagnostic::undefined_template(&template.name, call.range));
            }
        }
    }

    debug!("validate: {} diagnostics", diagnostics.len());
    diagnostics.into_sorted_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::symbols::Definition;
    use crate::token::{Position, Range};

    // These check the shape of the heuristics, not whether they are right.

    #[test]
    fn builtin_functions_match_by_base_name() {
        let policy = ValidationPolicy::default();
        assert!(policy.is_builtin_function("option"));
        assert!(policy.is_builtin_function("separated_list(X)"));
        assert!(policy.is_builtin_function("list (X)"));
        assert!(!policy.is_builtin_function("lists"));
        assert!(!policy.is_builtin_function("my_option"));
    }

    #[test]
    fn token_shaped_names() {
        let policy = ValidationPolicy::default();
        for name in &["NUM", "END_OF_INPUT", "_X1", "tIDENTIFIER", "kCLASS", "TOKEN_plus"] {
            assert!(policy.looks_like_token(name), "{}", name);
        }
        for name in &["expr", "Expr", "tokens", "keyword_class", "k_class", "t"] {
            assert!(!policy.looks_like_token(name), "{}", name);
        }
    }

    #[test]
    fn custom_token_pattern() {
        let policy = ValidationPolicy::with_token_name_pattern("^tok_").unwrap();
        assert!(policy.looks_like_token("tok_plus"));
        assert!(!policy.looks_like_token("NUM"));
        assert!(policy.is_builtin_function("option"));
        assert!(ValidationPolicy::with_token_name_pattern("(").is_err());
    }

    #[test]
    fn excused_names() {
        let tokens = crate::scanner::tokenize("%rule pair(lhs, rhs): lhs rhs ;\n%%");
        let table = crate::reader::parse(&tokens);
        let policy = ValidationPolicy::default();
        assert!(policy.is_excused("rhs", &table));
        assert!(policy.is_excused("'x'", &table));
        assert!(policy.is_excused("elem", &table));
        assert!(policy.is_excused("delimited", &table));
        assert!(!policy.is_excused("other", &table));
    }

    fn unused_rules(table: &SymbolTable) -> Vec<String> {
        validate(table, &ValidationPolicy::default())
            .into_iter()
            .filter(|d| d.kind == DiagnosticKind::UnusedRule)
            .map(|d| d.message)
            .collect()
    }

    fn def(line: u32) -> Definition {
        let range = Range::new(Position::new(line, 0), Position::new(line, 3));
        Definition {
            full_range: range,
            name_range: range,
        }
    }

    #[test]
    fn rules_declared_before_their_definition_can_be_unused() {
        let mut table = SymbolTable::new();
        table.define("dead", SymbolKind::TypeDeclaration, def(0));
        table.define("expr", SymbolKind::Nonterminal, def(1));
        table.define("dead", SymbolKind::Rule, def(3));
        table.define("expr", SymbolKind::Rule, def(4));
        table.define("NUM", SymbolKind::Token, def(2));
        assert_eq!(
            unused_rules(&table),
            vec![
                "rule 'dead' is defined but never used".to_string(),
                "rule 'expr' is defined but never used".to_string(),
            ]
        );
    }

    #[test]
    fn start_symbol_and_char_literal_rules_are_never_unused() {
        let mut table = SymbolTable::new();
        table.define("prog", SymbolKind::StartSymbol, def(0));
        table.define("prog", SymbolKind::Rule, def(2));
        table.define("'x'", SymbolKind::Rule, def(3));
        assert!(table.lookup_by_name("'x'").unwrap().has_rule);
        assert!(unused_rules(&table).is_empty());
    }

    #[test]
    fn placeholders() {
        let policy = ValidationPolicy::default();
        assert!(policy.is_placeholder("separator"));
        assert!(!policy.is_placeholder("stmt"));
    }
}
