//! The symbol table: every named entity of a grammar, with its definition and all of its uses.
//!
//! There are two namespaces.  Plain symbols (tokens, rules, nonterminals, `%type` names, the
//! start symbol) live in one.  Parameterized rule templates (`%rule name(X, Y)`) live in the
//! other, keyed by their base name, because a template and a plain rule may share a name.
//!
//! Each namespace stores its symbols in creation order and keeps a name index into that
//! storage, the same way the grammar reader has always kept `symbols` and `symbol_table`.
//!
//! All operations are total.  Using a name before it is defined creates the symbol with no
//! definition; the definition is attached in place when it shows up, so no use is ever lost.

use crate::token::{Position, Range};
use crate::tvec::TVec;
use crate::SymbolId;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum SymbolKind {
    /// `%token`, precedence declarations, character literals
    Token,
    /// `%type`
    TypeDeclaration,
    /// `name: ... ;`, or `%rule name: ... ;` without parameters
    Rule,
    /// `%nterm`, and any name other than a character literal used before (or without) being
    /// defined
    Nonterminal,
    /// `%rule name(X): ... ;`
    ParameterizedRule,
    Union,
    /// `%start`
    StartSymbol,
}

impl SymbolKind {
    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Token => "token",
            SymbolKind::TypeDeclaration => "type declaration",
            SymbolKind::Rule => "rule",
            SymbolKind::Nonterminal => "nonterminal",
            SymbolKind::ParameterizedRule => "parameterized rule",
            SymbolKind::Union => "union",
            SymbolKind::StartSymbol => "start symbol",
        }
    }
}

/// Where a symbol is defined.  `full_range` covers the whole declaration or rule; `name_range`
/// covers just the name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Definition {
    pub full_range: Range,
    pub name_range: Range,
}

/// One use of a parameterized rule, e.g. `separated_list(',', expr)`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ParameterizedCall {
    /// From the start of the name through the closing paren.
    pub range: Range,
    pub argument_names: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Associativity {
    Left,
    Right,
    NonAssoc,
    /// `%precedence`: a level with no associativity
    Precedence,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Precedence {
    pub associativity: Associativity,
    /// 1 for the first precedence directive in the file, 2 for the next, and so on.
    pub level: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// The first defining occurrence.  Never replaced once set.
    pub definition: Option<Definition>,
    /// Defining occurrences after the first, e.g. the rule that follows a `%type` declaration.
    pub redefinitions: Vec<Definition>,
    pub references: Vec<Range>,
    pub parameterized_calls: Vec<ParameterizedCall>,
    /// Formal parameters; only set for parameterized rule definitions.
    pub parameters: Option<Vec<String>>,
    pub type_tag: Option<String>,
    pub precedence: Option<Precedence>,
    pub is_parameterized: bool,
    pub is_inline: bool,
    /// Some defining occurrence is a rule, even if an earlier `%type` or `%nterm` decided the
    /// kind.
    pub has_rule: bool,
}

impl Symbol {
    fn new(name: &str, kind: SymbolKind, is_parameterized: bool) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind,
            definition: None,
            redefinitions: Vec::new(),
            references: Vec::new(),
            parameterized_calls: Vec::new(),
            parameters: None,
            type_tag: None,
            precedence: None,
            is_parameterized,
            is_inline: false,
            has_rule: false,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.definition.is_some()
    }

    /// The definition followed by any redefinitions.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> + '_ {
        self.definition.iter().chain(self.redefinitions.iter())
    }

    /// Anonymous tokens such as `'+'` are named by their literal text.
    pub fn is_char_literal(&self) -> bool {
        self.name.starts_with('\'')
    }

    /// Attaches a defining occurrence.  The first one becomes the definition and decides the
    /// kind; later ones are kept as redefinitions.
    fn attach_definition(&mut self, kind: SymbolKind, definition: Definition) {
        if kind == SymbolKind::Rule {
            self.has_rule = true;
        }
        if self.definition.is_none() {
            self.definition = Some(definition);
            self.kind = kind;
        } else {
            self.redefinitions.push(definition);
        }
    }
}

/// Which namespace a symbol lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Namespace {
    Plain,
    Parameterized,
}

/// Which kind of occurrence matched a position query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Occurrence {
    Definition,
    Call,
    Reference,
}

/// The result of `SymbolTable::lookup_at`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SymbolMatch<'a> {
    pub symbol: &'a Symbol,
    pub occurrence: Occurrence,
    /// The range that contained the queried position.
    pub range: Range,
}

#[derive(Clone, Debug, Default)]
struct SymbolStore {
    /// All symbols, in the order they were first encountered.
    symbols: TVec<SymbolId, Symbol>,
    /// Gives the index into `symbols` for a name.
    symbol_table: HashMap<String, SymbolId>,
}

impl SymbolStore {
    /// Looks up a symbol by name, adding it (with the given kind and no definition) if it is
    /// not present yet.
    fn lookup(&mut self, name: &str, kind: SymbolKind, is_parameterized: bool) -> SymbolId {
        if let Some(&id) = self.symbol_table.get(name) {
            return id;
        }
        let id = self
            .symbols
            .push(Symbol::new(name, kind, is_parameterized));
        self.symbol_table.insert(name.to_string(), id);
        id
    }

    fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbol_table.get(name).map(|&id| &self.symbols[id])
    }

    /// Finds the most specific range among all symbols that contains `pos`.  Ranges are
    /// produced by `ranges`; when several contain `pos`, the one that starts last (and then
    /// ends first) wins, so a nested occurrence beats the one enclosing it.
    fn find<'a, F, I>(
        &'a self,
        pos: Position,
        occurrence: Occurrence,
        ranges: F,
    ) -> Option<SymbolMatch<'a>>
    where
        F: Fn(&'a Symbol) -> I,
        I: Iterator<Item = Range> + 'a,
    {
        let mut best: Option<SymbolMatch<'a>> = None;
        for symbol in self.symbols.iter() {
            for range in ranges(symbol).filter(|r| r.contains(pos)) {
                let better = match &best {
                    None => true,
                    Some(b) => {
                        range.start > b.range.start
                            || (range.start == b.range.start && range.end < b.range.end)
                    }
                };
                if better {
                    best = Some(SymbolMatch {
                        symbol,
                        occurrence,
                        range,
                    });
                }
            }
        }
        best
    }
}

fn definition_names(symbol: &Symbol) -> impl Iterator<Item = Range> + '_ {
    symbol.definitions().map(|d| d.name_range)
}

fn call_ranges(symbol: &Symbol) -> impl Iterator<Item = Range> + '_ {
    symbol.parameterized_calls.iter().map(|c| c.range)
}

fn reference_ranges(symbol: &Symbol) -> impl Iterator<Item = Range> + '_ {
    symbol.references.iter().copied()
}

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    plain: SymbolStore,
    parameterized: SymbolStore,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self, namespace: Namespace) -> &SymbolStore {
        match namespace {
            Namespace::Plain => &self.plain,
            Namespace::Parameterized => &self.parameterized,
        }
    }

    fn store_mut(&mut self, namespace: Namespace) -> &mut SymbolStore {
        match namespace {
            Namespace::Plain => &mut self.plain,
            Namespace::Parameterized => &mut self.parameterized,
        }
    }

    /// Records a defining occurrence of a plain symbol.
    pub fn define(&mut self, name: &str, kind: SymbolKind, definition: Definition) -> SymbolId {
        let id = self.plain.lookup(name, kind, false);
        self.plain.symbols[id].attach_definition(kind, definition);
        id
    }

    /// Records the definition of a parameterized rule template.  The parameter list of the
    /// first definition is the one that is kept.
    pub fn define_parameterized(
        &mut self,
        base_name: &str,
        definition: Definition,
        parameters: Vec<String>,
    ) -> SymbolId {
        let id = self
            .parameterized
            .lookup(base_name, SymbolKind::ParameterizedRule, true);
        let symbol = &mut self.parameterized.symbols[id];
        if symbol.parameters.is_none() {
            symbol.parameters = Some(parameters);
        }
        symbol.attach_definition(SymbolKind::ParameterizedRule, definition);
        id
    }

    /// Records an ordinary use of `name`.  A name seen for the first time is a nonterminal,
    /// unless it is a character literal, which is always a token.
    pub fn reference(&mut self, name: &str, range: Range) -> SymbolId {
        let kind = if name.starts_with('\'') {
            SymbolKind::Token
        } else {
            SymbolKind::Nonterminal
        };
        let id = self.plain.lookup(name, kind, false);
        self.plain.symbols[id].references.push(range);
        id
    }

    /// Records a use of the template `base_name` with the given arguments.
    pub fn parameterized_call(
        &mut self,
        base_name: &str,
        range: Range,
        argument_names: Vec<String>,
    ) -> SymbolId {
        let id = self
            .parameterized
            .lookup(base_name, SymbolKind::ParameterizedRule, true);
        self.parameterized.symbols[id]
            .parameterized_calls
            .push(ParameterizedCall {
                range,
                argument_names,
            });
        id
    }

    /// Sets the semantic value type of a symbol, unless it already has one.
    pub fn set_type_tag(&mut self, namespace: Namespace, name: &str, tag: &str) {
        let store = self.store_mut(namespace);
        if let Some(&id) = store.symbol_table.get(name) {
            let symbol = &mut store.symbols[id];
            if symbol.type_tag.is_none() {
                symbol.type_tag = Some(tag.to_string());
            }
        }
    }

    /// Sets the precedence of a plain symbol.  The first declaration wins.
    pub fn set_precedence(&mut self, name: &str, precedence: Precedence) {
        if let Some(&id) = self.plain.symbol_table.get(name) {
            let symbol = &mut self.plain.symbols[id];
            if symbol.precedence.is_none() {
                symbol.precedence = Some(precedence);
            }
        }
    }

    pub fn mark_inline(&mut self, namespace: Namespace, name: &str) {
        let store = self.store_mut(namespace);
        if let Some(&id) = store.symbol_table.get(name) {
            store.symbols[id].is_inline = true;
        }
    }

    /// Finds the symbol occurrence at `pos`.  Candidates are tried in this order, and the
    /// first tier with a match wins:
    ///
    /// 1. the name of a parameterized rule definition
    /// 2. a parameterized rule call (name through closing paren)
    /// 3. the name of a plain definition (including redefinitions)
    /// 4. a plain reference
    pub fn lookup_at(&self, pos: Position) -> Option<SymbolMatch<'_>> {
        self.parameterized
            .find(pos, Occurrence::Definition, definition_names)
            .or_else(|| self.parameterized.find(pos, Occurrence::Call, call_ranges))
            .or_else(|| self.plain.find(pos, Occurrence::Definition, definition_names))
            .or_else(|| self.plain.find(pos, Occurrence::Reference, reference_ranges))
    }

    /// Looks up a name, preferring the plain namespace.
    pub fn lookup_by_name(&self, name: &str) -> Option<&Symbol> {
        self.plain
            .get(name)
            .or_else(|| self.parameterized.get(name))
    }

    pub fn lookup_in(&self, namespace: Namespace, name: &str) -> Option<&Symbol> {
        self.store(namespace).get(name)
    }

    pub fn lookup_parameterized(&self, name: &str) -> Option<&Symbol> {
        self.parameterized.get(name)
    }

    /// All symbols: plain ones first, then parameterized ones, each in creation order.
    pub fn all_entities(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.plain.symbols.iter().chain(self.parameterized.symbols.iter())
    }

    pub fn symbols(&self, namespace: Namespace) -> impl Iterator<Item = (SymbolId, &Symbol)> + '_ {
        self.store(namespace).symbols.iter_enumerated()
    }

    /// True if `name` is a formal parameter of any parameterized rule.
    pub fn is_declared_parameter(&self, name: &str) -> bool {
        self.parameterized.symbols.iter().any(|s| {
            s.parameters
                .as_ref()
                .map_or(false, |params| params.iter().any(|p| p == name))
        })
    }

    /// Number of calls recorded against the template named `name`.
    pub fn call_count(&self, name: &str) -> usize {
        self.parameterized
            .get(name)
            .map_or(0, |s| s.parameterized_calls.len())
    }

    pub fn len(&self) -> usize {
        self.plain.symbols.len() + self.parameterized.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
