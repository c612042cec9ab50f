#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Reading and writing the DIMACS CNF format.
//!
//! The format is line based:
//! - Comment lines start with `c`.
//! - The problem line `p cnf <num_variables> <num_clauses>` must precede every clause.
//! - Clauses are whitespace-separated signed integers, each clause terminated by `0`.
//!   A clause may span several lines, and a lone `0` is the empty clause.
//! - A line starting with `%` ends the data (some benchmark suites append one).
//!
//! Variables are created for every number declared in the header and named after it,
//! so variable `i` has DIMACS number `i + 1`.

use crate::sat::clause::Clause;
use crate::sat::cnf::{CnfFormula, VariableTable};
use crate::sat::literal::{Literal, Variable};
use itertools::Itertools;
use log::{debug, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DimacsError {
    #[error("failed to read DIMACS input: {0}")]
    Io(#[from] io::Error),
    #[error("missing `p cnf` header")]
    MissingHeader,
    #[error("line {line}: clause found before the `p cnf` header")]
    ClauseBeforeHeader { line: usize },
    #[error("line {line}: malformed header `{content}`")]
    MalformedHeader { line: usize, content: String },
    #[error("line {line}: second `p cnf` header")]
    DuplicateHeader { line: usize },
    #[error("line {line}: `{token}` is not a literal")]
    InvalidLiteral { line: usize, token: String },
    #[error("line {line}: literal {literal} is outside the {num_vars} declared variables")]
    VariableOutOfRange {
        line: usize,
        literal: i32,
        num_vars: usize,
    },
    #[error("last clause is not terminated by 0")]
    UnterminatedClause,
}

fn parse_header(line: &str, number: usize) -> Result<(usize, usize), DimacsError> {
    let malformed = || DimacsError::MalformedHeader {
        line: number,
        content: line.to_string(),
    };

    match line.split_whitespace().collect_vec().as_slice() {
        ["p", "cnf", vars, clauses] => {
            let vars = vars.parse().map_err(|_| malformed())?;
            let clauses = clauses.parse().map_err(|_| malformed())?;
            Ok((vars, clauses))
        }
        _ => Err(malformed()),
    }
}

/// Parses DIMACS data from `reader`.
///
/// A clause count differing from the header is logged, not rejected.
///
/// # Errors
///
/// I/O failures, a missing or malformed header, non-integer tokens, literals outside the
/// declared variables, and a final clause without its terminating `0`.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<CnfFormula, DimacsError> {
    let mut header = None;
    let mut clauses = Vec::new();
    let mut current: Vec<Literal> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let trimmed = line.trim();

        if trimmed.starts_with('%') {
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        if trimmed.starts_with('p') {
            if header.is_some() {
                return Err(DimacsError::DuplicateHeader { line: number });
            }
            header = Some(parse_header(trimmed, number)?);
            continue;
        }

        let Some((num_vars, _)) = header else {
            return Err(DimacsError::ClauseBeforeHeader { line: number });
        };

        for token in trimmed.split_whitespace() {
            let value: i32 = token.parse().map_err(|_| DimacsError::InvalidLiteral {
                line: number,
                token: token.to_string(),
            })?;

            if value == 0 {
                clauses.push(Clause::new(current.drain(..)));
            } else if value.unsigned_abs() as usize > num_vars {
                return Err(DimacsError::VariableOutOfRange {
                    line: number,
                    literal: value,
                    num_vars,
                });
            } else {
                current.push(Literal::from_dimacs(value));
            }
        }
    }

    if !current.is_empty() {
        return Err(DimacsError::UnterminatedClause);
    }
    let (num_vars, declared) = header.ok_or(DimacsError::MissingHeader)?;
    if declared != clauses.len() {
        warn!(
            "header declares {declared} clauses but {} were read",
            clauses.len()
        );
    }

    debug!("parsed {} clauses over {num_vars} variables", clauses.len());
    Ok(CnfFormula::from_parts(VariableTable::numbered(num_vars), clauses))
}

/// Opens and parses a DIMACS file.
///
/// # Errors
///
/// See `parse_dimacs`; opening the file may also fail.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<CnfFormula, DimacsError> {
    let file = File::open(path)?;
    parse_dimacs(BufReader::new(file))
}

/// Writes `cnf` as DIMACS, preceded by comments giving the number of every named
/// variable and, when known, of the root variable of an encoded formula.
///
/// # Errors
///
/// Any error of `writer`.
pub fn write_dimacs<W: Write>(writer: &mut W, cnf: &CnfFormula, root: Option<Variable>) -> io::Result<()> {
    let variables = cnf.variables();
    let named = variables
        .iter()
        .filter_map(|var| variables.name(var).map(|name| format!("{name}: {}", var.to_dimacs())))
        .join(", ");

    if !named.is_empty() {
        writeln!(writer, "c Encoding of original variables:")?;
        writeln!(writer, "c {named}")?;
    }
    if let Some(root) = root {
        writeln!(writer, "c Variable corresponding to the root node: {}", root.to_dimacs())?;
    }
    write!(writer, "{cnf}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<CnfFormula, DimacsError> {
        parse_dimacs(input.as_bytes())
    }

    fn clauses(cnf: &CnfFormula) -> Vec<Vec<i32>> {
        cnf.iter()
            .map(|c| c.iter().map(|l| l.to_dimacs()).collect())
            .collect()
    }

    #[test]
    fn test_parse_simple() {
        let cnf = parse("c example\np cnf 3 2\n1 -2 0\n2 3 0\n").unwrap();
        assert_eq!(cnf.num_vars(), 3);
        assert_eq!(clauses(&cnf), vec![vec![1, -2], vec![2, 3]]);
        assert_eq!(cnf.variables().name(Variable::new(2)), Some("3"));
    }

    #[test]
    fn test_declared_variables_exist_even_if_unused() {
        let cnf = parse("p cnf 5 1\n1 0\n").unwrap();
        assert_eq!(cnf.num_vars(), 5);
    }

    #[test]
    fn test_clause_spanning_lines() {
        let cnf = parse("p cnf 4 2\n1 2\n  3 0 -4\n0\n").unwrap();
        assert_eq!(clauses(&cnf), vec![vec![1, 2, 3], vec![-4]]);
    }

    #[test]
    fn test_lone_zero_is_empty_clause() {
        let cnf = parse("p cnf 1 2\n0\n1 0\n").unwrap();
        assert_eq!(clauses(&cnf), vec![vec![], vec![1]]);
    }

    #[test]
    fn test_percent_ends_input() {
        let cnf = parse("p cnf 2 1\n1 2 0\n%\n0\n").unwrap();
        assert_eq!(clauses(&cnf), vec![vec![1, 2]]);
    }

    #[test]
    fn test_count_mismatch_is_accepted() {
        let cnf = parse("p cnf 2 5\n1 0\n").unwrap();
        assert_eq!(cnf.len(), 1);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("1 2 0\n"), Err(DimacsError::ClauseBeforeHeader { line: 1 })));
        assert!(matches!(parse("c only comments\n"), Err(DimacsError::MissingHeader)));
        assert!(matches!(
            parse("p cnf x 1\n"),
            Err(DimacsError::MalformedHeader { line: 1, .. })
        ));
        assert!(matches!(
            parse("p cnf 1 1\np cnf 1 1\n"),
            Err(DimacsError::DuplicateHeader { line: 2 })
        ));
        assert!(matches!(
            parse("p cnf 2 1\n1 two 0\n"),
            Err(DimacsError::InvalidLiteral { line: 2, .. })
        ));
        assert!(matches!(
            parse("p cnf 2 1\n1 -3 0\n"),
            Err(DimacsError::VariableOutOfRange {
                line: 2,
                literal: -3,
                num_vars: 2
            })
        ));
        assert!(matches!(parse("p cnf 2 1\n1 2\n"), Err(DimacsError::UnterminatedClause)));
    }

    #[test]
    fn test_write_with_names_and_root() {
        let mut variables = VariableTable::new();
        let a = variables.new_variable(Some("a".into()));
        let b = variables.new_variable(Some("b".into()));
        let t = variables.new_variable(None);
        let cnf = CnfFormula::new(
            variables,
            vec![
                Clause::new([t.negative(), a.positive()]),
                Clause::new([t.negative(), b.negative()]),
                Clause::new([t.positive()]),
            ],
        )
        .unwrap();

        let mut out = Vec::new();
        write_dimacs(&mut out, &cnf, Some(t)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "c Encoding of original variables:\n\
             c a: 1, b: 2\n\
             c Variable corresponding to the root node: 3\n\
             p cnf 3 3\n\
             -3 1 0\n\
             -3 -2 0\n\
             3 0\n"
        );
    }

    #[test]
    fn test_written_output_parses_back() {
        let cnf = CnfFormula::from(vec![vec![1, -3], vec![], vec![2, 3, -1]]);
        let mut out = Vec::new();
        write_dimacs(&mut out, &cnf, None).unwrap();
        let parsed = parse_dimacs(out.as_slice()).unwrap();
        assert_eq!(parsed, cnf);
    }
}
