#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! DIMACS CNF parsing.
//!
//! The accepted format: comment lines starting with `c`, a mandatory
//! header `p cnf <vars> <clauses>` before the first clause, then clauses
//! as whitespace-separated nonzero integers terminated by `0`. Clauses may
//! span lines. A `%` line ends the input early (common in competition
//! benchmark files).
//!
//! The parser is strict about everything else: a missing or malformed
//! header, non-integer tokens, literals exceeding the declared variable
//! count and an unterminated final clause are all parse errors.

use crate::sat::cnf::Cnf;
use crate::sat::error::{Error, Result};
use std::io::{self, BufRead};
use std::path::Path;

/// Parses DIMACS CNF from a string.
///
/// # Errors
///
/// `Error::Parse` on malformed input.
pub fn parse_dimacs_text(dimacs_text: &str) -> Result<Cnf> {
    parse_dimacs(io::Cursor::new(dimacs_text))
}

/// Parses DIMACS CNF from a buffered reader.
///
/// # Errors
///
/// `Error::Parse` on malformed input, `Error::Io` if reading fails.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf> {
    let mut header: Option<(usize, usize)> = None;
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    let mut current: Vec<i32> = Vec::new();
    let mut line_no = 0;

    for line in reader.lines() {
        line_no += 1;
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        if line.starts_with('%') {
            break;
        }
        if let Some(rest) = line.strip_prefix('p') {
            if header.is_some() {
                return Err(parse_error(line_no, "duplicate header"));
            }
            header = Some(parse_header(rest, line_no)?);
            continue;
        }

        let Some((num_vars, _)) = header else {
            return Err(parse_error(line_no, "clause before 'p cnf' header"));
        };

        for token in line.split_whitespace() {
            let lit: i32 = token.parse().map_err(|_| {
                parse_error(line_no, &format!("expected a literal, got '{token}'"))
            })?;
            if lit == 0 {
                clauses.push(std::mem::take(&mut current));
            } else {
                if lit.unsigned_abs() as usize > num_vars {
                    return Err(parse_error(
                        line_no,
                        &format!("literal {lit} exceeds declared maximum variable {num_vars}"),
                    ));
                }
                current.push(lit);
            }
        }
    }

    let Some((num_vars, _)) = header else {
        return Err(parse_error(line_no, "missing 'p cnf' header"));
    };
    if !current.is_empty() {
        return Err(parse_error(line_no, "clause lacks terminating 0"));
    }

    let mut cnf = Cnf::new(clauses);
    cnf.num_vars = cnf.num_vars.max(num_vars);
    Ok(cnf)
}

/// Parses the DIMACS file at `path`.
///
/// # Errors
///
/// `Error::Io` if the file cannot be opened, otherwise as `parse_dimacs`.
pub fn parse_file(path: &Path) -> Result<Cnf> {
    let file = std::fs::File::open(path)?;
    parse_dimacs(io::BufReader::new(file))
}

fn parse_header(rest: &str, line_no: usize) -> Result<(usize, usize)> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    match fields.as_slice() {
        ["cnf", vars, others] => {
            let num_vars = vars
                .parse()
                .map_err(|_| parse_error(line_no, "bad variable count in header"))?;
            let num_clauses = others
                .parse()
                .map_err(|_| parse_error(line_no, "bad clause count in header"))?;
            Ok((num_vars, num_clauses))
        }
        _ => Err(parse_error(line_no, "expected 'p cnf <vars> <clauses>'")),
    }
}

fn parse_error(line: usize, message: &str) -> Error {
    Error::Parse {
        line,
        message: message.to_string(),
    }
}
