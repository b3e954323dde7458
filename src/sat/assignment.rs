#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The three-valued assignment table.
//!
//! Maps every variable to one of `{false, unassigned, true}`. Literal values
//! are derived by negating the variable value for negated literals. The
//! table knows nothing about decision levels or reasons; those live on the
//! trail.

use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::Solutions;
use itertools::Itertools;
use std::ops::{Index, IndexMut};

/// The assignment state of a single variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    /// The variable has not been assigned a truth value.
    #[default]
    Unassigned,
    /// The variable has been assigned the contained truth value.
    Assigned(bool),
}

impl VarState {
    /// `true` if the variable carries a truth value.
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    /// `true` if the variable carries no truth value.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }
}

impl From<VarState> for Option<bool> {
    fn from(s: VarState) -> Self {
        match s {
            VarState::Assigned(b) => Some(b),
            VarState::Unassigned => None,
        }
    }
}

/// Dense per-variable assignment table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    states: Vec<VarState>,
}

impl Index<usize> for Assignment {
    type Output = VarState;

    fn index(&self, index: usize) -> &Self::Output {
        &self.states[index]
    }
}

impl IndexMut<usize> for Assignment {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.states[index]
    }
}

impl Assignment {
    /// Creates a table for `n_vars` variables, all unassigned.
    #[must_use]
    pub fn new(n_vars: usize) -> Self {
        Self {
            states: vec![VarState::Unassigned; n_vars],
        }
    }

    /// The number of variables the table covers.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.states.len()
    }

    /// Assigns `var` the value `b`.
    pub fn set(&mut self, var: Variable, b: bool) {
        self[var as usize] = VarState::Assigned(b);
    }

    /// Clears the value of `var`.
    pub fn unassign(&mut self, var: Variable) {
        self[var as usize] = VarState::Unassigned;
    }

    /// The value of `var`, or `None` if unassigned.
    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        self[var as usize].into()
    }

    /// `true` if `var` carries a value.
    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self[var as usize].is_assigned()
    }

    /// The truth value of `l` under the current assignment, or `None` if its
    /// variable is unassigned.
    #[must_use]
    pub fn literal_value(&self, l: Literal) -> Option<bool> {
        self.var_value(l.variable()).map(|b| b == l.polarity())
    }

    /// The current assignment as DIMACS-signed variables.
    #[must_use]
    pub fn solutions(&self) -> Solutions {
        Solutions::new(
            &self
                .states
                .iter()
                .enumerate()
                .filter_map(|(i, s)| match s {
                    VarState::Assigned(b) => {
                        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
                        let var_id = i as i32 + 1;
                        Some(if *b { var_id } else { -var_id })
                    }
                    VarState::Unassigned => None,
                })
                .collect_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: i32) -> Literal {
        Literal::from_dimacs(value)
    }

    #[test]
    fn test_set_and_query() {
        let mut a = Assignment::new(4);
        a.set(0, true);
        a.set(1, false);

        assert!(a.is_assigned(0));
        assert!(a.is_assigned(1));
        assert!(!a.is_assigned(2));

        assert_eq!(a.var_value(0), Some(true));
        assert_eq!(a.var_value(1), Some(false));
        assert_eq!(a.var_value(2), None);

        assert_eq!(a.literal_value(lit(1)), Some(true));
        assert_eq!(a.literal_value(lit(-1)), Some(false));
        assert_eq!(a.literal_value(lit(2)), Some(false));
        assert_eq!(a.literal_value(lit(-2)), Some(true));
        assert_eq!(a.literal_value(lit(3)), None);
    }

    #[test]
    fn test_unassign() {
        let mut a = Assignment::new(2);
        a.set(0, true);
        a.unassign(0);
        assert_eq!(a.var_value(0), None);
        assert_eq!(a.literal_value(lit(1)), None);
    }

    #[test]
    fn test_solutions() {
        let mut a = Assignment::new(3);
        a.set(0, true);
        a.set(1, false);
        a.set(2, true);
        assert_eq!(a.solutions(), Solutions::new(&[1, -2, 3]));
    }
}
