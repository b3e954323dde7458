#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clause representation.
//!
//! A clause owns an ordered sequence of literals plus the metadata the
//! solver needs to manage it: whether it is redundant (learned), its glue
//! (LBD at learning time, monotone non-increasing afterwards), a decaying
//! usage score, and the garbage and reason-protection flags consulted
//! during clause-database reduction.
//!
//! The first two literal slots are the watched positions; the propagator
//! keeps them normalized.

use crate::sat::literal::Literal;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

/// Inline capacity for clause literal storage; most clauses in practice are
/// short enough to avoid a heap allocation.
pub type ClauseLits = SmallVec<[Literal; 8]>;

/// A disjunction of literals plus solver metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Clause {
    /// The literals. Slots 0 and 1 are the watched positions.
    pub literals: ClauseLits,
    /// Number of distinct decision levels at learning time. 0 for original
    /// clauses. Only ever lowered afterwards.
    pub glue: u32,
    /// Decaying usage score; ties between equal-glue clauses during
    /// reduction break towards the more active clause.
    pub activity: OrderedFloat<f64>,
    /// Learned rather than part of the input.
    pub redundant: bool,
    /// Excluded from watch lists and awaiting reclamation.
    pub garbage: bool,
    /// Currently the antecedent of a trail literal; must not be collected.
    pub reason: bool,
}

impl Clause {
    /// Creates a clause over the given literals.
    #[must_use]
    pub fn new(literals: &[Literal], redundant: bool, glue: u32) -> Self {
        Self {
            literals: ClauseLits::from_slice(literals),
            glue,
            activity: OrderedFloat(0.0),
            redundant,
            garbage: false,
            reason: false,
        }
    }

    /// The number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// `true` if the clause has no literals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Iterates over the literals.
    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    /// Swaps two literal slots. Used by the propagator to keep the watched
    /// positions at slots 0 and 1.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.literals.swap(i, j);
    }

    /// Adds `inc` to the usage score.
    pub fn bump_activity(&mut self, inc: f64) {
        self.activity = OrderedFloat(self.activity.into_inner() + inc);
    }

    /// Multiplies the usage score by `factor`, for rescaling.
    pub fn scale_activity(&mut self, factor: f64) {
        self.activity = OrderedFloat(self.activity.into_inner() * factor);
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl IndexMut<usize> for Clause {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.literals[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(values: &[i32]) -> Vec<Literal> {
        values.iter().map(|&v| Literal::from_dimacs(v)).collect()
    }

    #[test]
    fn test_new_defaults() {
        let c = Clause::new(&lits(&[1, -2, 3]), false, 0);
        assert_eq!(c.len(), 3);
        assert!(!c.redundant);
        assert!(!c.garbage);
        assert!(!c.reason);
        assert_eq!(c.activity, OrderedFloat(0.0));
    }

    #[test]
    fn test_swap() {
        let mut c = Clause::new(&lits(&[1, 2, 3]), true, 2);
        c.swap(0, 2);
        assert_eq!(c[0], Literal::from_dimacs(3));
        assert_eq!(c[2], Literal::from_dimacs(1));
        assert_eq!(c.glue, 2);
    }

    #[test]
    fn test_activity() {
        let mut c = Clause::new(&lits(&[1, 2]), true, 1);
        c.bump_activity(1.5);
        c.bump_activity(0.5);
        assert_eq!(c.activity, OrderedFloat(2.0));
        c.scale_activity(0.5);
        assert_eq!(c.activity, OrderedFloat(1.0));
    }
}
