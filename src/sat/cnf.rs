#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The parsed formula.
//!
//! A `Cnf` is the solver's input: a list of clauses over `num_vars`
//! variables. Construction performs the only preprocessing the solver
//! does: tautological clauses are discarded and duplicate literals within
//! a clause are removed. Empty clauses are kept; ingestion turns them into
//! immediate unsatisfiability.

use crate::sat::clause::ClauseLits;
use crate::sat::literal::Literal;
use crate::sat::solver::Solutions;
use itertools::Itertools;
use rustc_hash::FxHashSet;

/// A formula in conjunctive normal form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    /// The clauses, tautology-free and duplicate-free.
    pub clauses: Vec<ClauseLits>,
    /// Number of variables; at least the highest variable mentioned.
    pub num_vars: usize,
}

impl Cnf {
    /// Builds a formula from DIMACS-style clauses.
    ///
    /// Tautologies are dropped, duplicate literals removed, and `num_vars`
    /// derived from the highest variable mentioned.
    pub fn new<J: IntoIterator<Item = i32>, I: IntoIterator<Item = J>>(clauses_iter: I) -> Self {
        let mut clauses = Vec::new();
        let mut num_vars = 0usize;

        for clause_dimacs in clauses_iter {
            let literals: ClauseLits = clause_dimacs
                .into_iter()
                .map(Literal::from_dimacs)
                .unique()
                .collect();

            if is_tautology(&literals) {
                continue;
            }

            for l in &literals {
                num_vars = num_vars.max(l.variable() as usize + 1);
            }
            clauses.push(literals);
        }

        Self { clauses, num_vars }
    }

    /// The number of clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// `true` if the formula has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Iterates over the clauses.
    pub fn iter(&self) -> impl Iterator<Item = &ClauseLits> {
        self.clauses.iter()
    }

    /// `true` if `solutions` satisfies every clause.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|l| solutions.holds(l.to_dimacs())))
    }
}

fn is_tautology(literals: &ClauseLits) -> bool {
    let mut set = FxHashSet::default();
    for &l in literals {
        if set.contains(&l.negated()) {
            return true;
        }
        set.insert(l);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tautology_dropped() {
        let cnf = Cnf::new(vec![vec![1, -1, 2], vec![2, 3]]);
        assert_eq!(cnf.len(), 1);
        assert_eq!(cnf.num_vars, 3);
    }

    #[test]
    fn test_duplicates_removed() {
        let cnf = Cnf::new(vec![vec![1, 1, 2]]);
        assert_eq!(cnf.clauses[0].len(), 2);
    }

    #[test]
    fn test_empty_clause_kept() {
        let cnf = Cnf::new(vec![Vec::<i32>::new(), vec![1]]);
        assert_eq!(cnf.len(), 2);
        assert!(cnf.clauses[0].is_empty());
    }

    #[test]
    fn test_verify() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, 3]]);
        assert!(cnf.verify(&Solutions::new(&[1, -2, 3])));
        assert!(cnf.verify(&Solutions::new(&[-1, 2, -3])));
        assert!(!cnf.verify(&Solutions::new(&[1, -2, -3])));
    }
}
