//! Positions, ranges and the tokens produced by the scanner.
//!
//! All coordinates are 0-based.  Columns count Unicode scalar values (`char`s), not bytes, and
//! ranges are half-open: `end` is the position just past the last character.  Editor hosts
//! translate these directly into their own coordinates, so they must stay exact.

use core::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::Serialize;

/// A 0-based (line, column) location in a document.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Position {
        Position { line, character }
    }
}

impl Display for Position {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> core::fmt::Result {
        // Humans count from 1.
        write!(fmt, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A half-open span of source text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Range {
        Range { start, end }
    }

    /// Returns the smallest range that covers both `self` and `other`.
    pub fn cover(self, other: Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Display for Range {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> core::fmt::Result {
        write!(fmt, "{}-{}", self.start, self.end)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum TokenKind {
    /// `%%`
    Separator,
    /// `%{`
    PrologueStart,
    /// `%}`
    PrologueEnd,
    /// `%token`, `%left`, `%rule`, ...  The text includes the leading `%`.
    Directive,
    /// A `%word` that is not one of `scanner::DIRECTIVES`, such as `%expect` or `%code`.  The
    /// text includes the leading `%`.
    UnknownDirective,
    Identifier,
    StringLiteral,
    CharLiteral,
    /// `<...>`; see `Token::tag_value`.
    TypeTag,
    /// A single punctuation character, see `scanner::SPECIAL_CHARS`.
    Special,
}

/// One scanned token.  `text` is exactly the source text that the token covers.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
    /// Length in chars.
    pub length: u32,
}

impl Token {
    pub fn start(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn end(&self) -> Position {
        Position::new(self.line, self.column + self.length)
    }

    pub fn range(&self) -> Range {
        Range::new(self.start(), self.end())
    }

    pub fn is_special(&self, c: char) -> bool {
        self.kind == TokenKind::Special && self.text.starts_with(c)
    }

    pub fn is_directive(&self, name: &str) -> bool {
        self.kind == TokenKind::Directive && self.text.get(1..) == Some(name)
    }

    /// The directive keyword without its `%`, if this is a directive.
    pub fn directive_name(&self) -> Option<&str> {
        if self.kind == TokenKind::Directive {
            self.text.get(1..)
        } else {
            None
        }
    }

    /// For a type tag, the text between the angle brackets.
    pub fn tag_value(&self) -> Option<&str> {
        if self.kind == TokenKind::TypeTag {
            self.text.get(1..self.text.len() - 1)
        } else {
            None
        }
    }

    pub fn is_suffix_operator(&self) -> bool {
        self.is_special('?') || self.is_special('*') || self.is_special('+')
    }
}
