//! Checks Bison/Lrama grammar files and reports undefined symbols and unused rules.
//!
//! ```bash
//! racc_check parse.y
//! racc_check --format json --symbols parse.y
//! racc_check --at 12:7 parse.y        # what is at line 12, column 7?
//! racc_check --deny-warnings *.y      # exit status 1 on any warning
//! ```
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` to see what the analyzer is doing.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::debug;
use racc_analysis::{
    analyze, Analysis, Diagnostic, Occurrence, Position, Range, Severity, Symbol, SymbolKind,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "racc_check")]
#[command(version)]
#[command(about = "Reports undefined symbols and unused rules in Bison/Lrama grammar files")]
struct Cli {
    /// Grammar files to check
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "text", value_enum)]
    format: OutputFormat,

    /// Also list every symbol
    #[arg(long)]
    symbols: bool,

    /// Show the symbol at LINE:COL (both counted from 1)
    #[arg(long, value_name = "LINE:COL", value_parser = parse_position)]
    at: Option<Position>,

    /// Exit with status 1 if any warning is reported
    #[arg(long)]
    deny_warnings: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Parses `LINE:COL`, 1-based, into a 0-based position.
fn parse_position(s: &str) -> Result<Position, String> {
    let (line, col) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LINE:COL, found {:?}", s))?;
    let line: u32 = line
        .trim()
        .parse()
        .map_err(|e| format!("bad line number {:?}: {}", line, e))?;
    let col: u32 = col
        .trim()
        .parse()
        .map_err(|e| format!("bad column number {:?}: {}", col, e))?;
    if line == 0 || col == 0 {
        return Err("line and column are counted from 1".to_string());
    }
    Ok(Position::new(line - 1, col - 1))
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: String,
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    symbols: Option<Vec<&'a Symbol>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    at: Option<AtReport<'a>>,
}

#[derive(Serialize)]
struct AtReport<'a> {
    name: &'a str,
    kind: SymbolKind,
    occurrence: Occurrence,
    range: Range,
    parameterized: bool,
}

fn at_report(analysis: &Analysis, pos: Position) -> Option<AtReport<'_>> {
    analysis
        .symbol_table
        .lookup_at(pos)
        .map(|m| AtReport {
            name: &m.symbol.name,
            kind: m.symbol.kind,
            occurrence: m.occurrence,
            range: m.range,
            parameterized: m.symbol.is_parameterized,
        })
}

fn print_text(path: &Path, analysis: &Analysis, cli: &Cli) {
    for d in analysis.diagnostics.iter() {
        println!("{}:{}", path.display(), d);
    }

    if cli.symbols {
        println!("{}: {} symbols", path.display(), analysis.symbol_table.len());
        for symbol in analysis.symbol_table.all_entities() {
            let params = match &symbol.parameters {
                Some(p) => format!("({})", p.join(", ")),
                None => String::new(),
            };
            let defined = match &symbol.definition {
                Some(d) => format!("defined at {}", d.name_range.start),
                None => "not defined".to_string(),
            };
            println!(
                "    {:<24} {:<18} {}, {} references, {} calls",
                format!("{}{}", symbol.name, params),
                symbol.kind.describe(),
                defined,
                symbol.references.len(),
                symbol.parameterized_calls.len()
            );
        }
    }

    if let Some(pos) = cli.at {
        match at_report(analysis, pos) {
            Some(at) => println!(
                "{}:{}: {} '{}' ({:?} at {})",
                path.display(),
                pos,
                at.kind.describe(),
                at.name,
                at.occurrence,
                at.range
            ),
            None => println!("{}:{}: no symbol here", path.display(), pos),
        }
    }
}

fn check(path: &Path) -> Result<Analysis> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    debug!("{}: {} bytes", path.display(), text.len());
    Ok(analyze(&text))
}

fn run(cli: &Cli) -> Result<usize> {
    let mut warnings = 0;
    let mut analyses = Vec::with_capacity(cli.files.len());
    for path in cli.files.iter() {
        let analysis = check(path)?;
        warnings += analysis.count(Severity::Warning);
        analyses.push((path, analysis));
    }

    match cli.format {
        OutputFormat::Text => {
            for (path, analysis) in analyses.iter() {
                print_text(path, analysis, cli);
            }
        }
        OutputFormat::Json => {
            let reports: Vec<FileReport<'_>> = analyses
                .iter()
                .map(|(path, analysis)| FileReport {
                    path: path.display().to_string(),
                    diagnostics: &analysis.diagnostics,
                    symbols: if cli.symbols {
                        Some(analysis.symbol_table.all_entities().collect())
                    } else {
                        None
                    },
                    at: cli.at.and_then(|pos| at_report(analysis, pos)),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(warnings)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(warnings) if warnings > 0 && cli.deny_warnings => {
            eprintln!("{} warnings", warnings);
            ExitCode::from(1)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based_on_the_command_line() {
        assert_eq!(parse_position("12:7"), Ok(Position::new(11, 6)));
        assert_eq!(parse_position(" 1 : 1 "), Ok(Position::new(0, 0)));
        assert!(parse_position("0:1").is_err());
        assert!(parse_position("12").is_err());
        assert!(parse_position("a:b").is_err());
    }

    #[test]
    fn cli_arguments() {
        let cli = Cli::try_parse_from(["racc_check", "--format", "json", "--at", "3:4", "a.y"])
            .unwrap();
        assert!(cli.format == OutputFormat::Json);
        assert_eq!(cli.at, Some(Position::new(2, 3)));
        assert_eq!(cli.files, vec![PathBuf::from("a.y")]);
        assert!(Cli::try_parse_from(["racc_check"]).is_err());
    }

    #[test]
    fn at_report_names_the_symbol() {
        let analysis = analyze("%%\ns: list(t) ;\nt: ;\n");
        let at = at_report(&analysis, Position::new(1, 4)).unwrap();
        assert_eq!(at.name, "list");
        assert_eq!(at.occurrence, Occurrence::Call);
        assert!(at.parameterized);
        assert!(at_report(&analysis, Position::new(5, 0)).is_none());
    }
}
