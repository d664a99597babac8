//! Converts grammar source text into a flat sequence of positioned tokens.
//!
//! The scanner works one line at a time.  At each position the lexical classes are tried in a
//! fixed order and the first one that matches wins:
//!
//! ```text
//!     whitespace          skipped
//!     // ...              rest of line skipped
//!     /* ... */           skipped if closed on the same line, else rest of line skipped
//!     %%                  Separator
//!     %{  %}              PrologueStart, PrologueEnd
//!     %keyword            Directive (only the keywords in DIRECTIVES)
//!     %word               UnknownDirective (any other word)
//!     ident               Identifier  [A-Za-z_][A-Za-z0-9_-]*
//!     "..."  '...'        StringLiteral, CharLiteral (backslash escapes)
//!     <...>               TypeTag (closed on the same line)
//!     : ; | ( ) ...       Special
//!     anything else       skipped
//! ```
//!
//! The scanner never fails.  Anything it cannot classify is dropped one character at a time,
//! which also guarantees that every step advances.
//!
//! Block comments are not tracked across lines: a `/*` without a `*/` on the same line hides
//! only the rest of that line.

use crate::token::{Token, TokenKind};
use log::debug;

/// Directive keywords, without the leading `%`.
pub const DIRECTIVES: &[&str] = &[
    "token",
    "type",
    "nterm",
    "start",
    "union",
    "left",
    "right",
    "nonassoc",
    "precedence",
    "rule",
    "inline",
    "prec",
    "empty",
    "destructor",
    "printer",
    "locations",
    "no-stdlib",
    "define",
    "debug",
    "error-verbose",
    // shift/reduce hooks
    "after-shift",
    "before-reduce",
    "after-reduce",
    "after-shift-error-token",
    "after-pop-stack",
];

pub const SPECIAL_CHARS: &[char] = &[
    ':', ';', '|', '(', ')', '[', ']', '{', '}', ',', '.', '?', '*', '+',
];

pub fn is_directive_keyword(word: &str) -> bool {
    DIRECTIVES.contains(&word)
}

/// Scans `text` into tokens, in source order.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (line, source_line) in text.lines().enumerate() {
        let chars: Vec<char> = source_line.chars().collect();
        let scanner = LineScanner {
            chars: &chars,
            line: line as u32,
            pos: 0,
        };
        scanner.scan(&mut tokens);
    }
    debug!("tokenize: {} tokens", tokens.len());
    tokens
}

struct LineScanner<'a> {
    chars: &'a [char],
    line: u32,
    pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl<'a> LineScanner<'a> {
    fn at(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    fn starts_with(&self, i: usize, s: &str) -> bool {
        let mut j = i;
        for c in s.chars() {
            if self.at(j) != Some(c) {
                return false;
            }
            j += 1;
        }
        true
    }

    fn find(&self, from: usize, s: &str) -> Option<usize> {
        (from..self.chars.len()).find(|&i| self.starts_with(i, s))
    }

    fn scan(mut self, out: &mut Vec<Token>) {
        while let Some(c) = self.at(self.pos) {
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            if self.starts_with(self.pos, "//") {
                break;
            }
            if self.starts_with(self.pos, "/*") {
                match self.find(self.pos + 2, "*/") {
                    Some(close) => {
                        self.pos = close + 2;
                        continue;
                    }
                    None => break,
                }
            }

            match self.match_token(self.pos) {
                Some((kind, len)) => {
                    let text: String = self.chars[self.pos..self.pos + len].iter().collect();
                    analysis_log!(
                        "scan: {}:{} {:?} {:?}",
                        self.line,
                        self.pos,
                        kind,
                        text
                    );
                    out.push(Token {
                        kind,
                        text,
                        line: self.line,
                        column: self.pos as u32,
                        length: len as u32,
                    });
                    self.pos += len;
                }
                None => {
                    // Not part of the language; drop it.
                    self.pos += 1;
                }
            }
        }
    }

    /// Tries each token class at `start`, in priority order.  Returns the kind and the length
    /// in chars of the first match.
    fn match_token(&self, start: usize) -> Option<(TokenKind, usize)> {
        self.match_percent(start)
            .or_else(|| self.match_identifier(start))
            .or_else(|| {
                self.match_quoted(start, '"')
                    .map(|len| (TokenKind::StringLiteral, len))
            })
            .or_else(|| {
                self.match_quoted(start, '\'')
                    .map(|len| (TokenKind::CharLiteral, len))
            })
            .or_else(|| self.match_type_tag(start))
            .or_else(|| self.match_special(start))
    }

    fn match_percent(&self, start: usize) -> Option<(TokenKind, usize)> {
        if self.at(start) != Some('%') {
            return None;
        }
        match self.at(start + 1) {
            Some('%') => return Some((TokenKind::Separator, 2)),
            Some('{') => return Some((TokenKind::PrologueStart, 2)),
            Some('}') => return Some((TokenKind::PrologueEnd, 2)),
            _ => {}
        }
        let mut end = start + 1;
        while self.at(end).map_or(false, is_ident_continue) {
            end += 1;
        }
        if end == start + 1 {
            // A lone `%`.
            return None;
        }
        let word: String = self.chars[start + 1..end].iter().collect();
        if is_directive_keyword(&word) {
            Some((TokenKind::Directive, end - start))
        } else {
            Some((TokenKind::UnknownDirective, end - start))
        }
    }

    fn match_identifier(&self, start: usize) -> Option<(TokenKind, usize)> {
        if !self.at(start).map_or(false, is_ident_start) {
            return None;
        }
        let mut end = start + 1;
        while self.at(end).map_or(false, is_ident_continue) {
            end += 1;
        }
        Some((TokenKind::Identifier, end - start))
    }

    /// Matches a quoted literal.  A backslash escapes the character after it.  An unterminated
    /// literal does not match at all.
    fn match_quoted(&self, start: usize, quote: char) -> Option<usize> {
        if self.at(start) != Some(quote) {
            return None;
        }
        let mut i = start + 1;
        while let Some(c) = self.at(i) {
            if c == '\\' {
                i += 2;
                continue;
            }
            if c == quote {
                return Some(i + 1 - start);
            }
            i += 1;
        }
        None
    }

    /// Matches `<...>`, counting nested angle brackets.  A tag never contains a brace or a
    /// semicolon, so comparisons inside action code cannot swallow the braces that delimit it.
    fn match_type_tag(&self, start: usize) -> Option<(TokenKind, usize)> {
        if self.at(start) != Some('<') {
            return None;
        }
        let mut depth = 0usize;
        for i in start..self.chars.len() {
            match self.chars[i] {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((TokenKind::TypeTag, i + 1 - start));
                    }
                }
                '{' | '}' | ';' => return None,
                _ => {}
            }
        }
        None
    }

    fn match_special(&self, start: usize) -> Option<(TokenKind, usize)> {
        match self.at(start) {
            Some(c) if SPECIAL_CHARS.contains(&c) => Some((TokenKind::Special, 1)),
            _ => None,
        }
    }
}
