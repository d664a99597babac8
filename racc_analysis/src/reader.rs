//! Reads the token sequence of a grammar file and builds its symbol table.
//!
//! Our grammar for a grammar:
//!
//! ```ignore
//! <declarations>
//! %%
//! <rules>
//! %%
//! <epilogue>
//!
//! declaration:  %token <tag>? (<ident> | <string> | <char>)*     also %type, %nterm
//!               %left <tag>? (<ident> | <char>)*                 also %right, %nonassoc, %precedence
//!               %start <ident>
//!               %union <ident>? { ... }
//!               %destructor ... { ... }                          also %printer
//!               %rule ...                                        see below
//!               %{ ... %}
//!
//! rule:         <ident> [<alias>]? : <body> ;
//! template:     %rule %inline? <ident> ( <ident>, ... )? <tag>? : <body> ;
//! body:         alternatives separated by |, each a sequence of
//!                   <ident> [<alias>]? (? | * | +)?
//!                   <ident> ( <arg>, ... )                       a parameterized call
//!                   <char>
//!                   { ... } <tag>?                               an action
//!                   %prec (<ident> | <char>)
//!                   %empty
//! ```
//!
//! The reader is a state machine over the three sections.  It moves forward each time it sees
//! a `%%` and never goes back.  Nothing in the epilogue is read.
//!
//! Malformed input never stops the reader.  Unknown directives are skipped to the end of their
//! line, unknown tokens are skipped one at a time, and an unmatched `{` or `[` swallows the rest
//! of the input.  A call that is never closed ends with its alternative.  Every step of every
//! loop consumes at least one token or leaves the loop, so a pass always terminates.
//!
//! The reader only records names and where they occur.  Deciding what is wrong with them is
//! the validator's job, after the whole file has been read.

use crate::symbols::{Associativity, Definition, Namespace, Precedence, SymbolKind, SymbolTable};
use crate::token::{Range, Token, TokenKind};
use log::debug;

/// The three regions of a grammar file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Section {
    Declarations,
    Rules,
    Epilogue,
}

impl Section {
    fn next(self) -> Section {
        match self {
            Section::Declarations => Section::Rules,
            Section::Rules | Section::Epilogue => Section::Epilogue,
        }
    }
}

/// A read position within a token sequence.
#[derive(Copy, Clone, Debug)]
pub struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Index of the next token to be read.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&'t Token> {
        self.tokens.get(self.pos + n)
    }

    /// Consumes and returns the next token.
    pub fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// The most recently consumed token.
    pub fn previous(&self) -> Option<&'t Token> {
        if self.pos == 0 {
            None
        } else {
            self.tokens.get(self.pos - 1)
        }
    }

    pub fn peek_special(&self, c: char) -> bool {
        self.peek().map_or(false, |t| t.is_special(c))
    }

    pub fn peek_kind(&self, kind: TokenKind) -> bool {
        self.peek().map_or(false, |t| t.kind == kind)
    }

    /// Consumes the next token if it is the punctuation `c`.
    pub fn eat_special(&mut self, c: char) -> Option<&'t Token> {
        if self.peek_special(c) {
            self.next()
        } else {
            None
        }
    }

    /// Skips a bracketed region, starting at its opening token, through the matching close.
    /// Nesting is counted.  If the region is never closed, everything up to the end of input
    /// is consumed.  At least one token is always consumed.
    pub fn skip_balanced(&mut self, open: char, close: char) {
        let mut depth: usize = 0;
        while let Some(token) = self.next() {
            if token.is_special(open) {
                depth += 1;
            } else if token.is_special(close) {
                if depth <= 1 {
                    return;
                }
                depth -= 1;
            }
        }
    }

    /// True if the next tokens are `<ident> [<alias>]? :`, i.e. the start of a rule.
    pub fn at_rule_start(&self) -> bool {
        if !self.peek_kind(TokenKind::Identifier) {
            return false;
        }
        let mut n = 1;
        if self.peek_nth(n).map_or(false, |t| t.is_special('[')) {
            let mut depth = 0usize;
            loop {
                match self.peek_nth(n) {
                    None => return false,
                    Some(t) if t.is_special('[') => depth += 1,
                    Some(t) if t.is_special(']') => {
                        depth -= 1;
                        if depth == 0 {
                            n += 1;
                            break;
                        }
                    }
                    Some(_) => {}
                }
                n += 1;
            }
        }
        self.peek_nth(n).map_or(false, |t| t.is_special(':'))
    }

    /// The range from the start of `first` to the end of the last consumed token.
    fn range_from(&self, first: &Token) -> Range {
        match self.previous() {
            Some(last) => first.range().cover(last.range()),
            None => first.range(),
        }
    }
}

/// Builds the symbol table for a token sequence.
pub fn parse(tokens: &[Token]) -> SymbolTable {
    Reader::new(tokens).read()
}

/// Contains state used while reading one grammar.
struct Reader<'t> {
    cursor: Cursor<'t>,
    section: Section,
    table: SymbolTable,
    /// The level given to the next precedence directive.
    next_precedence: u32,
    /// The template whose body is being read, if any.
    template: Option<&'t str>,
}

impl<'t> Reader<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            cursor: Cursor::new(tokens),
            section: Section::Declarations,
            table: SymbolTable::new(),
            next_precedence: 1,
            template: None,
        }
    }

    fn read(mut self) -> SymbolTable {
        while let Some(token) = self.cursor.peek() {
            let before = self.cursor.position();

            if token.kind == TokenKind::Separator {
                self.cursor.next();
                self.section = self.section.next();
                debug!("line {}: entering {:?} section", token.line, self.section);
                continue;
            }

            match self.section {
                Section::Declarations => self.read_declaration(),
                Section::Rules => self.read_rules_item(),
                Section::Epilogue => break,
            }

            debug_assert!(self.cursor.position() > before, "reader did not advance");
        }

        debug!("read: {} symbols", self.table.len());
        self.table
    }

    fn read_declaration(&mut self) {
        let token = match self.cursor.peek() {
            Some(t) => t,
            None => return,
        };
        match token.kind {
            TokenKind::PrologueStart => self.skip_prologue(),
            TokenKind::Directive => {
                self.cursor.next();
                self.read_directive(token);
            }
            // %expect, %code, %parse-param, %initial-action and friends.
            TokenKind::UnknownDirective => {
                self.cursor.next();
                debug!("line {}: skipping {}", token.line, token.text);
                self.skip_line(token.line);
            }
            // A code block left over from a directive whose arguments spanned lines.
            TokenKind::Special if token.is_special('{') => self.cursor.skip_balanced('{', '}'),
            _ => {
                self.cursor.next();
            }
        }
    }

    /// Dispatches on a directive that has just been consumed.
    fn read_directive(&mut self, directive: &'t Token) {
        match directive.directive_name().unwrap_or("") {
            "token" => self.read_symbol_list(directive, SymbolKind::Token),
            "type" => self.read_symbol_list(directive, SymbolKind::TypeDeclaration),
            "nterm" => self.read_symbol_list(directive, SymbolKind::Nonterminal),
            "start" => self.read_start(directive),
            "union" => self.read_union(),
            "left" => self.read_precedence(directive, Associativity::Left),
            "right" => self.read_precedence(directive, Associativity::Right),
            "nonassoc" => self.read_precedence(directive, Associativity::NonAssoc),
            "precedence" => self.read_precedence(directive, Associativity::Precedence),
            "destructor" | "printer" => self.skip_code_directive(),
            "rule" => self.read_parameterized_rule(directive),
            _ => self.skip_line(directive.line),
        }
    }

    fn skip_prologue(&mut self) {
        self.cursor.next();
        while let Some(token) = self.cursor.next() {
            if token.kind == TokenKind::PrologueEnd {
                break;
            }
        }
    }

    /// Skips the arguments of a directive we do not interpret: everything on its line, up to
    /// the next directive or section separator.  A `{` starts a code block that may continue
    /// on later lines, and is skipped as a whole.
    fn skip_line(&mut self, line: u32) {
        while let Some(token) = self.cursor.peek() {
            if token.line != line
                || matches!(
                    token.kind,
                    TokenKind::Directive | TokenKind::UnknownDirective | TokenKind::Separator
                )
            {
                break;
            }
            if token.is_special('{') {
                self.cursor.skip_balanced('{', '}');
            } else {
                self.cursor.next();
            }
        }
    }

    /// `%token`, `%type`, `%nterm`: an optional tag, then names.  A tag in the middle of the
    /// list applies to the names after it.  Literal aliases are skipped.
    fn read_symbol_list(&mut self, directive: &'t Token, kind: SymbolKind) {
        let mut tag: Option<&'t str> = None;
        let mut names: Vec<(&'t Token, Option<&'t str>)> = Vec::new();
        while let Some(token) = self.cursor.peek() {
            match token.kind {
                TokenKind::TypeTag => tag = token.tag_value(),
                TokenKind::Identifier => names.push((token, tag)),
                TokenKind::StringLiteral | TokenKind::CharLiteral => {}
                _ => break,
            }
            self.cursor.next();
        }

        let full_range = self.cursor.range_from(directive);
        for (name, tag) in names {
            self.table.define(
                &name.text,
                kind,
                Definition {
                    full_range,
                    name_range: name.range(),
                },
            );
            if let Some(tag) = tag {
                self.table.set_type_tag(Namespace::Plain, &name.text, tag);
            }
        }
    }

    fn read_start(&mut self, directive: &'t Token) {
        if !self.cursor.peek_kind(TokenKind::Identifier) {
            return;
        }
        if let Some(name) = self.cursor.next() {
            debug!("start symbol: {}", name.text);
            self.table.define(
                &name.text,
                SymbolKind::StartSymbol,
                Definition {
                    full_range: self.cursor.range_from(directive),
                    name_range: name.range(),
                },
            );
        }
    }

    /// `%union name? { ... }`.  The body is C code; no symbols come out of it.
    fn read_union(&mut self) {
        if self.cursor.peek_kind(TokenKind::Identifier) {
            self.cursor.next();
        }
        if self.cursor.peek_special('{') {
            self.cursor.skip_balanced('{', '}');
        }
    }

    /// `%left`, `%right`, `%nonassoc`, `%precedence`.  Each listed name or character literal
    /// is a token.  Each directive opens a new, higher precedence level.
    fn read_precedence(&mut self, directive: &'t Token, associativity: Associativity) {
        let precedence = Precedence {
            associativity,
            level: self.next_precedence,
        };
        self.next_precedence += 1;

        let mut tag: Option<&'t str> = None;
        let mut names: Vec<&'t Token> = Vec::new();
        while let Some(token) = self.cursor.peek() {
            match token.kind {
                TokenKind::TypeTag => tag = token.tag_value(),
                TokenKind::Identifier | TokenKind::CharLiteral => names.push(token),
                TokenKind::StringLiteral => {}
                _ => break,
            }
            self.cursor.next();
        }

        let full_range = self.cursor.range_from(directive);
        for name in names {
            self.table.define(
                &name.text,
                SymbolKind::Token,
                Definition {
                    full_range,
                    name_range: name.range(),
                },
            );
            self.table.set_precedence(&name.text, precedence);
            if let Some(tag) = tag {
                self.table.set_type_tag(Namespace::Plain, &name.text, tag);
            }
        }
    }

    /// `%destructor { ... } symbols` and `%printer { ... } symbols`.  Skips to the code block
    /// and over it.  The symbol list that follows is left to the declaration loop, which
    /// ignores bare names.
    fn skip_code_directive(&mut self) {
        while let Some(token) = self.cursor.peek() {
            if token.is_special('{') {
                self.cursor.skip_balanced('{', '}');
                return;
            }
            if matches!(
                token.kind,
                TokenKind::Directive
                    | TokenKind::UnknownDirective
                    | TokenKind::Separator
                    | TokenKind::PrologueStart
            ) {
                return;
            }
            self.cursor.next();
        }
    }

    fn read_rules_item(&mut self) {
        let token = match self.cursor.peek() {
            Some(t) => t,
            None => return,
        };
        if token.is_directive("rule") {
            self.cursor.next();
            self.read_parameterized_rule(token);
        } else if token.kind == TokenKind::Identifier && self.cursor.at_rule_start() {
            self.read_rule();
        } else if token.is_special('{') {
            self.cursor.skip_balanced('{', '}');
        } else {
            self.cursor.next();
        }
    }

    /// `name [alias]? : body ;`.  The cursor is on `name`.
    fn read_rule(&mut self) {
        let name = match self.cursor.next() {
            Some(t) => t,
            None => return,
        };
        if self.cursor.peek_special('[') {
            self.cursor.skip_balanced('[', ']');
        }
        self.cursor.eat_special(':');

        self.read_rule_body(&[]);

        let definition = Definition {
            full_range: self.cursor.range_from(name),
            name_range: name.range(),
        };
        self.table.define(&name.text, SymbolKind::Rule, definition);
    }

    /// `%rule %inline? name (X, Y)? <tag>? : body ;`.  The `%rule` has been consumed.
    ///
    /// With a parameter list this defines a template in the parameterized namespace; without
    /// one it is an ordinary rule.  An incomplete header (no name, no colon) is dropped.
    fn read_parameterized_rule(&mut self, directive: &'t Token) {
        let mut is_inline = false;
        if self.cursor.peek().map_or(false, |t| t.is_directive("inline")) {
            self.cursor.next();
            is_inline = true;
        }

        if !self.cursor.peek_kind(TokenKind::Identifier) {
            return;
        }
        let name = match self.cursor.next() {
            Some(t) => t,
            None => return,
        };

        let parameters = if self.cursor.peek_special('(') {
            Some(self.read_parameter_list())
        } else {
            None
        };

        let mut tag: Option<&'t str> = None;
        if self.cursor.peek_kind(TokenKind::TypeTag) {
            tag = self.cursor.next().and_then(|t| t.tag_value());
        }

        if self.cursor.eat_special(':').is_none() {
            debug!("line {}: %rule {} has no ':', ignored", name.line, name.text);
            return;
        }

        if parameters.is_some() {
            self.template = Some(name.text.as_str());
        }
        let in_scope: &[String] = parameters.as_deref().unwrap_or(&[]);
        self.read_rule_body(in_scope);
        self.template = None;

        let definition = Definition {
            full_range: self.cursor.range_from(directive),
            name_range: name.range(),
        };
        let namespace = match parameters {
            Some(parameters) => {
                debug!("template {}({})", name.text, parameters.join(", "));
                self.table
                    .define_parameterized(&name.text, definition, parameters);
                Namespace::Parameterized
            }
            None => {
                self.table.define(&name.text, SymbolKind::Rule, definition);
                Namespace::Plain
            }
        };
        if let Some(tag) = tag {
            self.table.set_type_tag(namespace, &name.text, tag);
        }
        if is_inline {
            self.table.mark_inline(namespace, &name.text);
        }
    }

    /// `( X, Y, ... )`.  The cursor is on `(`.  Stops without consuming at anything that
    /// cannot be part of the list, so a missing `)` does not eat the rule body.
    fn read_parameter_list(&mut self) -> Vec<String> {
        self.cursor.next();
        let mut parameters = Vec::new();
        while let Some(token) = self.cursor.peek() {
            if token.is_special(')') {
                self.cursor.next();
                break;
            }
            if token.kind == TokenKind::Identifier {
                parameters.push(token.text.clone());
            } else if !token.is_special(',') {
                break;
            }
            self.cursor.next();
        }
        parameters
    }

    /// Reads the alternatives of a rule through the terminating `;`.  `parameters` are the
    /// formal parameters in scope; uses of them are placeholders, not symbol references.
    ///
    /// A `%%`, a `%rule`, or the start of another rule also ends the body, without being
    /// consumed, since the final `;` of a rule is optional.
    fn read_rule_body(&mut self, parameters: &[String]) {
        while let Some(token) = self.cursor.peek() {
            match token.kind {
                TokenKind::Separator => return,
                TokenKind::Special => {
                    if token.is_special(';') {
                        self.cursor.next();
                        return;
                    }
                    if token.is_special('{') {
                        // An action, with an optional tag after it.
                        self.cursor.skip_balanced('{', '}');
                        if self.cursor.peek_kind(TokenKind::TypeTag) {
                            self.cursor.next();
                        }
                    } else {
                        // `|` starts another alternative of the same rule.  Other punctuation
                        // is out of place and ignored.
                        self.cursor.next();
                    }
                }
                TokenKind::Directive => match token.directive_name().unwrap_or("") {
                    "rule" => return,
                    "prec" => {
                        self.cursor.next();
                        if let Some(symbol) = self.cursor.peek() {
                            if matches!(symbol.kind, TokenKind::Identifier | TokenKind::CharLiteral)
                            {
                                self.cursor.next();
                                self.table.reference(&symbol.text, symbol.range());
                            }
                        }
                    }
                    _ => {
                        // %empty, or a directive that does not belong here.
                        self.cursor.next();
                    }
                },
                TokenKind::Identifier => {
                    if self.cursor.at_rule_start() {
                        return;
                    }
                    self.read_symbol_occurrence(parameters);
                }
                TokenKind::CharLiteral => {
                    self.cursor.next();
                    self.table.reference(&token.text, token.range());
                    self.skip_occurrence_suffix();
                }
                _ => {
                    self.cursor.next();
                }
            }
        }
    }

    /// One symbol on the right-hand side of a rule.  The cursor is on its name.
    fn read_symbol_occurrence(&mut self, parameters: &[String]) {
        let name = match self.cursor.next() {
            Some(t) => t,
            None => return,
        };
        if self.cursor.peek_special('(') {
            self.read_call(name, parameters);
        } else if !parameters.contains(&name.text) {
            self.table.reference(&name.text, name.range());
        }
        self.skip_occurrence_suffix();
    }

    /// Skips what may follow a symbol occurrence: a named alias `[name]`, which is local to
    /// the rule and not a symbol, and the operators `?`, `*` and `+`.
    fn skip_occurrence_suffix(&mut self) {
        loop {
            if self.cursor.peek_special('[') {
                self.cursor.skip_balanced('[', ']');
            } else if self.cursor.peek().map_or(false, |t| t.is_suffix_operator()) {
                self.cursor.next();
            } else {
                return;
            }
        }
    }

    /// `name(arg, ...)`.  The cursor is on `(`; `name` has been consumed.
    ///
    /// Each argument that names a grammar symbol is also a reference to that symbol.  An
    /// argument that is itself a call is recorded as a call, and contributes its base name.
    /// Nested calls are kept on an explicit stack, so nesting depth is limited only by memory.
    fn read_call(&mut self, name: &'t Token, parameters: &[String]) {
        self.cursor.next();
        let mut open: Vec<OpenCall<'t>> = vec![OpenCall::new(name)];
        while let Some(token) = self.cursor.peek() {
            if token.is_special(')') {
                self.cursor.next();
                if let Some(call) = open.pop() {
                    let base = call.name;
                    self.record_call(call);
                    match open.last_mut() {
                        Some(outer) => outer.arguments.push(base.text.clone()),
                        None => return,
                    }
                    self.skip_occurrence_suffix();
                }
                continue;
            }
            // An unclosed call ends with its alternative.
            if token.is_special(';') || token.is_special('|') || token.kind == TokenKind::Separator
            {
                break;
            }
            match token.kind {
                TokenKind::Identifier => {
                    self.cursor.next();
                    if self.cursor.peek_special('(') {
                        self.cursor.next();
                        open.push(OpenCall::new(token));
                        continue;
                    }
                    if !parameters.contains(&token.text) {
                        self.table.reference(&token.text, token.range());
                    }
                    if let Some(call) = open.last_mut() {
                        call.arguments.push(token.text.clone());
                    }
                    self.skip_occurrence_suffix();
                }
                TokenKind::CharLiteral => {
                    self.cursor.next();
                    self.table.reference(&token.text, token.range());
                    if let Some(call) = open.last_mut() {
                        call.arguments.push(token.text.clone());
                    }
                }
                TokenKind::Special if token.is_special('(') => {
                    self.cursor.skip_balanced('(', ')');
                }
                _ => {
                    // `,` and anything else.
                    self.cursor.next();
                }
            }
        }

        // Whatever is still open ends here, innermost first.
        while let Some(call) = open.pop() {
            let base = call.name;
            self.record_call(call);
            if let Some(outer) = open.last_mut() {
                outer.arguments.push(base.text.clone());
            }
        }
    }

    fn record_call(&mut self, call: OpenCall<'t>) {
        // A template calling itself is not a use of it.
        if self.template == Some(call.name.text.as_str()) {
            return;
        }
        let range = self.cursor.range_from(call.name);
        self.table
            .parameterized_call(&call.name.text, range, call.arguments);
    }
}

/// A call whose `(` has been read but not its `)`.
struct OpenCall<'t> {
    name: &'t Token,
    arguments: Vec<String>,
}

impl<'t> OpenCall<'t> {
    fn new(name: &'t Token) -> Self {
        Self {
            name,
            arguments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::tokenize;
    use crate::token::Position;

    fn read(text: &str) -> SymbolTable {
        parse(&tokenize(text))
    }

    fn refs(table: &SymbolTable, name: &str) -> usize {
        table
            .lookup_in(Namespace::Plain, name)
            .map_or(0, |s| s.references.len())
    }

    #[test]
    fn cursor_skip_balanced_counts_nesting() {
        let tokens = tokenize("{ a { b } c } d");
        let mut cursor = Cursor::new(&tokens);
        cursor.skip_balanced('{', '}');
        assert_eq!(cursor.peek().map(|t| t.text.as_str()), Some("d"));
    }

    #[test]
    fn cursor_skip_balanced_unclosed_consumes_everything() {
        let tokens = tokenize("{ a { b } c");
        let mut cursor = Cursor::new(&tokens);
        cursor.skip_balanced('{', '}');
        assert!(cursor.is_eof());
    }

    #[test]
    fn cursor_rule_start() {
        let tokens = tokenize("expr[e] : x");
        assert!(Cursor::new(&tokens).at_rule_start());
        let tokens = tokenize("expr x :");
        assert!(!Cursor::new(&tokens).at_rule_start());
        let tokens = tokenize("expr[e");
        assert!(!Cursor::new(&tokens).at_rule_start());
    }

    #[test]
    fn sections_only_move_forward() {
        let table = read("%token A\n%%\nr: A ;\n%%\nx: B ;\n%%\ny: C ;");
        assert!(table.lookup_by_name("r").is_some());
        assert!(table.lookup_by_name("x").is_none());
        assert!(table.lookup_by_name("B").is_none());
        assert!(table.lookup_by_name("y").is_none());
    }

    #[test]
    fn token_list_with_tags_and_aliases() {
        let table = read("%token <ival> NUM \"number\" <sval> STR '+' PLUS 258\n%%");
        let num = table.lookup_by_name("NUM").unwrap();
        assert_eq!(num.kind, SymbolKind::Token);
        assert_eq!(num.type_tag.as_deref(), Some("ival"));
        assert_eq!(
            table.lookup_by_name("STR").unwrap().type_tag.as_deref(),
            Some("sval")
        );
        assert_eq!(
            table.lookup_by_name("PLUS").unwrap().type_tag.as_deref(),
            Some("sval")
        );
        assert!(table.lookup_by_name("\"number\"").is_none());
        assert!(table.lookup_by_name("'+'").is_none());
        assert_eq!(table.len(), 3);

        // The declaration covers the whole list.
        let def = num.definition.unwrap();
        assert_eq!(def.full_range.start, Position::new(0, 0));
        assert_eq!(def.full_range.end, Position::new(0, 46));
        assert_eq!(def.name_range.start, Position::new(0, 14));
    }

    #[test]
    fn type_and_nterm_declarations() {
        let table = read("%type <node> expr\n%nterm <node> stmt\n%%\nexpr: stmt ;");
        let expr = table.lookup_by_name("expr").unwrap();
        assert_eq!(expr.kind, SymbolKind::TypeDeclaration);
        assert_eq!(expr.redefinitions.len(), 1);
        assert_eq!(expr.type_tag.as_deref(), Some("node"));
        let stmt = table.lookup_by_name("stmt").unwrap();
        assert_eq!(stmt.kind, SymbolKind::Nonterminal);
        assert!(stmt.is_defined());
        assert_eq!(stmt.references.len(), 1);
    }

    #[test]
    fn precedence_levels() {
        let table = read("%left '+' '-'\n%left '*'\n%right UMINUS\n%precedence NEG\n%%");
        let plus = table.lookup_by_name("'+'").unwrap();
        assert_eq!(plus.kind, SymbolKind::Token);
        assert_eq!(
            plus.precedence,
            Some(Precedence {
                associativity: Associativity::Left,
                level: 1
            })
        );
        assert_eq!(table.lookup_by_name("'-'").unwrap().precedence.unwrap().level, 1);
        assert_eq!(table.lookup_by_name("'*'").unwrap().precedence.unwrap().level, 2);
        let uminus = table.lookup_by_name("UMINUS").unwrap().precedence.unwrap();
        assert_eq!(uminus.associativity, Associativity::Right);
        assert_eq!(uminus.level, 3);
        let neg = table.lookup_by_name("NEG").unwrap().precedence.unwrap();
        assert_eq!(neg.associativity, Associativity::Precedence);
    }

    #[test]
    fn opaque_blocks_produce_no_symbols() {
        let text = "%{\n#include <stdio.h>\nint yylex(void);\n%}\n\
                    %union {\n  int ival;\n  struct node *n;\n}\n\
                    %destructor { free($$); } <n>\n\
                    %printer { fprintf(yyo, \"%d\", $$); } NUM\n\
                    %code requires { typedef int foo; }\n\
                    %define api.pure full\n\
                    %token NUM\n%%";
        let table = read(text);
        let names: Vec<&str> = table.all_entities().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["NUM"]);
    }

    #[test]
    fn unknown_directive_skips_its_line_only() {
        let table = read("%define parse.error verbose\n%token A\n%%");
        assert!(table.lookup_by_name("A").is_some());
        assert!(table.lookup_by_name("parse").is_none());
    }

    #[test]
    fn unknown_directives_end_declaration_lists() {
        let table = read(
            "%token NUM\n%expect 0\n%code requires { int x; }\n\
             %left '+'\n%require \"3.2\"\n%type <v> s\n%parse-param {int *count}\n\
             %%\ns: NUM ;\n",
        );
        let names: Vec<&str> = table.all_entities().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["NUM", "'+'", "s"]);
        let num = table.lookup_by_name("NUM").unwrap();
        assert_eq!(num.definition.unwrap().full_range.end, Position::new(0, 10));
    }

    #[test]
    fn start_symbol() {
        let table = read("%start prog\n%%\nprog: ;");
        let prog = table.lookup_by_name("prog").unwrap();
        assert_eq!(prog.kind, SymbolKind::StartSymbol);
        assert_eq!(prog.redefinitions.len(), 1);
    }

    #[test]
    fn rule_body_occurrences() {
        let table = read(
            "%%\nexpr[result]: expr[left] '+' term[right] { $$ = $left + $right; } <ival>\n\
             | term* opt? many+ %prec UMINUS\n| %empty\n;",
        );
        assert_eq!(refs(&table, "expr"), 1);
        assert_eq!(refs(&table, "term"), 2);
        assert_eq!(refs(&table, "'+'"), 1);
        assert_eq!(refs(&table, "UMINUS"), 1);
        assert!(table.lookup_by_name("result").is_none());
        assert!(table.lookup_by_name("left").is_none());
        assert!(table.lookup_by_name("right").is_none());
        assert!(table.lookup_by_name("ival").is_none());

        let expr = table.lookup_by_name("expr").unwrap();
        let def = expr.definition.unwrap();
        assert_eq!(def.name_range.start, Position::new(1, 0));
        assert_eq!(def.full_range.end, Position::new(4, 1));
    }

    #[test]
    fn missing_semicolon_ends_rule_at_next_rule() {
        let table = read("%%\na: c\nb: 'x'\n");
        assert_eq!(table.lookup_by_name("a").unwrap().kind, SymbolKind::Rule);
        assert_eq!(refs(&table, "c"), 1);
        let b = table.lookup_by_name("b").unwrap();
        assert_eq!(b.kind, SymbolKind::Rule);
        assert!(b.references.is_empty());
        assert_eq!(refs(&table, "'x'"), 1);
    }

    #[test]
    fn template_definition_and_calls() {
        let table = read(
            "%rule %inline pair(X, Y) <node>: X ',' Y { $$ = cons($1, $3); } ;\n\
             %%\nitems: pair(NAME, value) | option(pair(A, B)) ;",
        );
        let pair = table.lookup_parameterized("pair").unwrap();
        assert_eq!(pair.kind, SymbolKind::ParameterizedRule);
        assert_eq!(
            pair.parameters,
            Some(vec!["X".to_string(), "Y".to_string()])
        );
        assert!(pair.is_inline);
        assert_eq!(pair.type_tag.as_deref(), Some("node"));
        assert_eq!(pair.parameterized_calls.len(), 2);
        assert_eq!(
            pair.parameterized_calls[0].argument_names,
            vec!["NAME".to_string(), "value".to_string()]
        );

        let option = table.lookup_parameterized("option").unwrap();
        assert!(!option.is_defined());
        assert_eq!(option.parameterized_calls[0].argument_names, vec!["pair".to_string()]);

        // Template parameters are placeholders; the actual arguments are references.
        assert!(table.lookup_in(Namespace::Plain, "X").is_none());
        assert_eq!(refs(&table, "NAME"), 1);
        assert_eq!(refs(&table, "value"), 1);
        assert_eq!(refs(&table, "A"), 1);
        assert_eq!(refs(&table, "','"), 1);
        assert!(table.lookup_in(Namespace::Plain, "pair").is_none());
    }

    #[test]
    fn rule_directive_without_parameters_is_plain() {
        let table = read("%%\n%rule sep: ',' | ';' ;\nlist: sep ;");
        let sep = table.lookup_in(Namespace::Plain, "sep").unwrap();
        assert_eq!(sep.kind, SymbolKind::Rule);
        assert!(!sep.is_parameterized);
        assert_eq!(sep.references.len(), 1);
        assert!(table.lookup_parameterized("sep").is_none());
    }

    #[test]
    fn incomplete_template_is_dropped() {
        let table = read("%rule foo(X)\n%token A\n%%");
        assert!(table.lookup_parameterized("foo").is_none());
        assert!(table.lookup_by_name("A").is_some());
    }

    #[test]
    fn call_with_char_literal_argument() {
        let table = read("%%\nargs: separated_list(',', arg) ;");
        let call = &table.lookup_parameterized("separated_list").unwrap().parameterized_calls[0];
        assert_eq!(call.argument_names, vec!["','".to_string(), "arg".to_string()]);
        assert_eq!(call.range.start, Position::new(1, 6));
        assert_eq!(call.range.end, Position::new(1, 30));
    }

    #[test]
    fn template_calls_in_template_bodies() {
        let table = read(
            "%rule seq(X): X | seq(X) X ;\n%rule opt_seq(X): %empty | seq(X) ;\n%%",
        );
        // opt_seq calls seq; seq's call to itself is not recorded.
        let seq = table.lookup_parameterized("seq").unwrap();
        assert_eq!(seq.parameterized_calls.len(), 1);
        assert_eq!(seq.parameterized_calls[0].range.start, Position::new(1, 27));
        assert!(table.lookup_parameterized("opt_seq").unwrap().parameterized_calls.is_empty());
        assert!(table.lookup_in(Namespace::Plain, "X").is_none());
    }

    #[test]
    fn unclosed_call_ends_with_its_alternative() {
        let table = read("%%\na: list(b ;\nc: a ;");
        let list = table.lookup_parameterized("list").unwrap();
        assert_eq!(list.parameterized_calls[0].argument_names, vec!["b".to_string()]);
        assert_eq!(table.lookup_by_name("c").unwrap().kind, SymbolKind::Rule);
        assert_eq!(refs(&table, "a"), 1);
    }

    #[test]
    fn unclosed_nested_calls_end_innermost_first() {
        let table = read("%%\na: outer(inner(b ;\nc: a ;");
        let inner = table.lookup_parameterized("inner").unwrap();
        assert_eq!(inner.parameterized_calls[0].argument_names, vec!["b".to_string()]);
        let outer = table.lookup_parameterized("outer").unwrap();
        assert_eq!(outer.parameterized_calls[0].argument_names, vec!["inner".to_string()]);
        assert_eq!(table.lookup_by_name("c").unwrap().kind, SymbolKind::Rule);
    }

    #[test]
    fn deeply_nested_calls() {
        let depth = 5000;
        let text = format!("%%\ns: {}x{} tail ;\n", "wrap(".repeat(depth), ")".repeat(depth));
        let table = read(&text);
        assert_eq!(table.call_count("wrap"), depth);
        let wrap = table.lookup_parameterized("wrap").unwrap();
        // Inner calls are recorded before the calls that contain them.
        assert_eq!(wrap.parameterized_calls[0].argument_names, vec!["x".to_string()]);
        assert_eq!(
            wrap.parameterized_calls[depth - 1].argument_names,
            vec!["wrap".to_string()]
        );
        assert_eq!(wrap.parameterized_calls[depth - 1].range.start, Position::new(1, 3));
        assert_eq!(refs(&table, "x"), 1);
        assert_eq!(refs(&table, "tail"), 1);
    }

    #[test]
    fn epilogue_is_ignored() {
        let table = read("%%\na: ;\n%%\nint main() { return yyparse(); }\nfoo: bar ;");
        assert_eq!(table.len(), 1);
    }
}
