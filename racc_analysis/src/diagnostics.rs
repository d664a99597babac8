use crate::token::Range;
use core::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Warning,
    Information,
}

impl Display for Severity {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> core::fmt::Result {
        fmt.write_str(match self {
            Severity::Warning => "warning",
            Severity::Information => "info",
        })
    }
}

/// The problems the analyzer reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum DiagnosticKind {
    /// A name is used but never defined.
    UndefinedSymbol,
    /// A rule is defined but never used.
    UnusedRule,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::UndefinedSymbol => Severity::Warning,
            DiagnosticKind::UnusedRule => Severity::Information,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, range: Range, message: String) -> Diagnostic {
        Diagnostic {
            range,
            message,
            severity: kind.severity(),
            kind,
        }
    }

    pub fn undefined_symbol(name: &str, range: Range) -> Diagnostic {
        Self::new(
            DiagnosticKind::UndefinedSymbol,
            range,
            format!("symbol '{}' is used but never defined", name),
        )
    }

    pub fn undefined_template(name: &str, range: Range) -> Diagnostic {
        Self::new(
            DiagnosticKind::UndefinedSymbol,
            range,
            format!("parameterized rule '{}' is used but never defined", name),
        )
    }

    pub fn unused_rule(name: &str, range: Range) -> Diagnostic {
        Self::new(
            DiagnosticKind::UnusedRule,
            range,
            format!("rule '{}' is defined but never used", name),
        )
    }
}

impl Display for Diagnostic {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> core::fmt::Result {
        write!(fmt, "{}: {}: {}", self.range.start, self.severity, self.message)
    }
}

/// Collects diagnostics during a pass.  Nothing in the analyzer fails; problems are pushed
/// here and handed back with the result.
#[derive(Default, Debug)]
pub(crate) struct Diagnostics {
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn push(&mut self, d: Diagnostic) {
        self.diagnostics.push(d);
    }

    pub(crate) fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns the diagnostics ordered by where they start.  The sort is stable, so
    /// diagnostics at the same position keep the order they were reported in.
    pub(crate) fn into_sorted_vec(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics;
        diagnostics.sort_by_key(|d| d.range.start);
        diagnostics
    }
}
