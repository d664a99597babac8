//! # racc_analysis -- symbol analysis for Bison-style grammar files
//!
//! This crate reads grammar files written for Bison or Lrama and works out what every name in
//! them means: which names are tokens and which are rules, where each one is defined, every
//! place it is used, and which parameterized rule templates (`%rule list(X): ...`) are called
//! with which arguments.  From that it reports names that are used but never defined, and rules
//! that are defined but never used.
//!
//! It is meant for editors and linters, so it never gives up.  Any text, however broken,
//! produces a symbol table and a list of diagnostics.  It does not build parse tables and does
//! not check that the grammar is LALR(1).
//!
//! # Example
//!
//! ```rust
//! use racc_analysis::{analyze, Position};
//!
//! let text = "%token NUM\n%%\nexpr: expr '+' term | term ;\nterm: NUM ;\nfactor: NUM ;\n";
//! let analysis = analyze(text);
//!
//! let expr = analysis.symbol_table.lookup_by_name("expr").unwrap();
//! assert_eq!(expr.references.len(), 1);
//!
//! // `term` at line 2, column 15 (both counted from zero)
//! let m = analysis.symbol_table.lookup_at(Position::new(2, 15)).unwrap();
//! assert_eq!(m.symbol.name, "term");
//!
//! // `factor` is never used; that is worth mentioning, but is not a warning.
//! assert_eq!(analysis.diagnostics.len(), 1);
//! assert_eq!(analysis.diagnostics[0].severity, racc_analysis::Severity::Information);
//! ```
//!
//! # How it works
//!
//! Analysis runs in three passes, each of which is a plain function of the previous one's
//! output:
//!
//! * `scanner::tokenize` turns text into positioned tokens.
//! * `reader::parse` walks the tokens one section at a time (declarations, rules, epilogue) and
//!   builds a `SymbolTable`.
//! * `validate::validate` inspects the finished table and produces `Diagnostic`s.
//!
//! Positions are zero-based lines and zero-based character columns, and ranges are half-open.
//!
//! # Logging
//!
//! Progress is logged through the `log` crate.  The `analysis_log` feature (on by default)
//! also logs every token the scanner produces at `trace` level.

#![warn(rust_2018_idioms)]
#![allow(clippy::new_without_default)]

#[cfg(feature = "analysis_log")]
macro_rules! analysis_log {
    (
        $($t:tt)*
    ) => {
        ::log::trace!( $($t)* )
    }
}

#[cfg(not(feature = "analysis_log"))]
macro_rules! analysis_log {
    (
        $($t:tt)*
    ) => {
        // nothing
    };
}

macro_rules! int_alias {
    (type $name:ident = $int:ty;) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
        pub struct $name(pub $int);

        impl $name {
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, fmt)
            }
        }

        impl core::convert::From<$name> for usize {
            fn from(i: $name) -> usize {
                i.0 as usize
            }
        }

        impl core::convert::From<usize> for $name {
            fn from(i: usize) -> $name {
                $name(i as $int)
            }
        }
    };
}

pub mod diagnostics;
mod documents;
pub mod reader;
pub mod scanner;
pub mod symbols;
pub mod token;
mod tvec;
pub mod validate;


// Identifies a symbol within one namespace of a `SymbolTable`.
int_alias! {type SymbolId = u32;}

pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use documents::DocumentStore;
pub use symbols::{
    Associativity, Definition, Namespace, Occurrence, ParameterizedCall, Precedence, Symbol,
    SymbolKind, SymbolMatch, SymbolTable,
};
pub use token::{Position, Range, Token, TokenKind};
pub use validate::ValidationPolicy;

use log::debug;

/// The result of analyzing one grammar file.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    pub symbol_table: SymbolTable,
    /// Ordered by start position.
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// Number of diagnostics with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Analyzes grammar text using the default `ValidationPolicy`.
pub fn analyze(text: &str) -> Analysis {
    analyze_with_policy(text, &ValidationPolicy::default())
}

pub fn analyze_with_policy(text: &str, policy: &ValidationPolicy) -> Analysis {
    let tokens = scanner::tokenize(text);
    let symbol_table = reader::parse(&tokens);
    let diagnostics = validate::validate(&symbol_table, policy);
    debug!(
        "analyze: {} tokens, {} symbols, {} diagnostics",
        tokens.len(),
        symbol_table.len(),
        diagnostics.len()
    );
    Analysis {
        symbol_table,
        diagnostics,
    }
}
