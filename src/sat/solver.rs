#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Solver-facing result types and the solver interface.

use crate::sat::cnf::Cnf;
use crate::sat::config::Options;
use crate::sat::error::Result;
use std::fmt;

/// The outcome of a solving run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A satisfying total assignment was found.
    Satisfiable,
    /// The formula has no satisfying assignment.
    Unsatisfiable,
    /// The run was interrupted before an answer was reached.
    Unknown,
}

impl Status {
    /// The conventional process exit code: 10 for SAT, 20 for UNSAT, 0
    /// otherwise.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Satisfiable => 10,
            Self::Unsatisfiable => 20,
            Self::Unknown => 0,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Satisfiable => "SATISFIABLE",
            Self::Unsatisfiable => "UNSATISFIABLE",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// A (partial or total) assignment as signed DIMACS variables, sorted by
/// variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solutions(Vec<i32>);

impl Solutions {
    /// Creates a solution set from signed DIMACS variables.
    #[must_use]
    pub fn new(values: &[i32]) -> Self {
        let mut values = values.to_vec();
        values.sort_unstable_by_key(|v| v.abs());
        Self(values)
    }

    /// `true` if the assignment makes the DIMACS literal `value` true.
    #[must_use]
    pub fn holds(&self, value: i32) -> bool {
        self.0
            .binary_search_by_key(&value.abs(), |v| v.abs())
            .map(|i| self.0[i] == value)
            .unwrap_or(false)
    }

    /// Iterates the assignment in variable order.
    pub fn iter(&self) -> impl Iterator<Item = &i32> {
        self.0.iter()
    }

    /// The number of assigned variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if no variable is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Solutions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Counters accumulated over a solving run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Conflicts analysed.
    pub conflicts: u64,
    /// Decisions made.
    pub decisions: u64,
    /// Literals propagated.
    pub propagations: u64,
    /// Restarts performed.
    pub restarts: u64,
    /// Restarts suppressed by the blocking heuristic.
    pub blocked_restarts: u64,
    /// Clause-database reductions.
    pub reductions: u64,
    /// Clauses learned.
    pub learned: u64,
    /// Root-level (fixed) assignments. Never decreases.
    pub fixed: u64,
    /// Approximate bytes held by clause storage.
    pub clause_bytes: usize,
}

/// The interface a complete solver exposes.
pub trait Solver {
    /// Builds a solver over a parsed formula.
    fn new(cnf: Cnf, options: Options) -> Self
    where
        Self: Sized;

    /// Runs the search to completion, interruption, or stream failure.
    ///
    /// # Errors
    ///
    /// Proof stream failures surface as `Error::Io`.
    fn solve(&mut self) -> Result<Status>;

    /// The current assignment.
    fn solutions(&self) -> Solutions;

    /// Counters accumulated so far.
    fn stats(&self) -> Stats;
}
