#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The trail and control stack.
//!
//! The trail is the ordered record of assigned literals; `propagated` marks
//! the next literal whose watches still have to be scanned. The control
//! stack holds one entry per decision level with the trail height at which
//! the level began; entry 0 is the root level. Per-variable decision levels
//! and reason pointers live here as parallel arrays.

use crate::sat::assignment::Assignment;
use crate::sat::clause_storage::ClauseRef;
use crate::sat::literal::{Literal, Variable};
use crate::sat::phase_saving::SavedPhases;
use crate::sat::variable_selection::Vmtf;
use std::ops::Index;

/// Why a literal is on the trail.
///
/// `Decision` covers both decisions and root facts; neither has an
/// antecedent clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reason {
    /// A decision, or a root-level fact.
    #[default]
    Decision,
    /// Forced by unit propagation over the given clause.
    Clause(ClauseRef),
}

/// Trail, control stack and per-variable assignment metadata.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    trail: Vec<Literal>,
    /// Index of the next trail literal to propagate.
    pub propagated: usize,
    control: Vec<usize>,
    level_of: Vec<u32>,
    reason_of: Vec<Reason>,
    fixed: usize,
}

impl Index<usize> for Trail {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.trail[index]
    }
}

impl Trail {
    /// Creates an empty trail for `num_vars` variables, at the root level.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            trail: Vec::with_capacity(num_vars),
            propagated: 0,
            control: vec![0],
            level_of: vec![0; num_vars],
            reason_of: vec![Reason::Decision; num_vars],
            fixed: 0,
        }
    }

    /// The current decision level.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn level(&self) -> u32 {
        self.control.len() as u32 - 1
    }

    /// The number of assigned literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trail.len()
    }

    /// `true` if nothing is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// The decision level at which `var` was assigned. Meaningless for
    /// unassigned variables.
    #[must_use]
    pub fn var_level(&self, var: Variable) -> u32 {
        self.level_of[var as usize]
    }

    /// The reason `var` is on the trail. Meaningless for unassigned
    /// variables.
    #[must_use]
    pub fn reason(&self, var: Variable) -> Reason {
        self.reason_of[var as usize]
    }

    /// The number of root-level assignments. Never decreases.
    #[must_use]
    pub const fn num_fixed(&self) -> usize {
        self.fixed
    }

    /// Opens a new decision level at the current trail height.
    pub fn push_level(&mut self) {
        self.control.push(self.trail.len());
    }

    /// The trail height at which `level` began.
    #[must_use]
    pub fn level_start(&self, level: u32) -> usize {
        self.control[level as usize]
    }

    /// The decision literal that opened `level`. Requires `level >= 1`.
    #[must_use]
    pub fn decision_at_level(&self, level: u32) -> Literal {
        debug_assert!(level >= 1 && level <= self.level());
        self.trail[self.control[level as usize]]
    }

    /// Assigns `lit` at the current level and appends it to the trail.
    ///
    /// Records the value, level, reason and phase; root-level assignments
    /// bump the fixed counter.
    pub fn assign(
        &mut self,
        values: &mut Assignment,
        phases: &mut SavedPhases,
        lit: Literal,
        reason: Reason,
    ) {
        let var = lit.variable();
        debug_assert!(!values.is_assigned(var), "assigning an assigned variable");

        values.set(var, lit.polarity());
        phases.save(var, lit.polarity());
        self.level_of[var as usize] = self.level();
        self.reason_of[var as usize] = reason;
        if self.level() == 0 {
            self.fixed += 1;
        }
        self.trail.push(lit);
    }

    /// Undoes every assignment above `target`, keeping saved phases, and
    /// truncates the trail and control stack. Each unassigned variable is
    /// reported to the VMTF queue so its cursor can rewind. Resets
    /// `propagated` to the new trail end.
    pub fn backtrack(&mut self, values: &mut Assignment, vmtf: &mut Vmtf, target: u32) {
        if target >= self.level() {
            return;
        }

        let keep = self.control[target as usize + 1];
        for &lit in &self.trail[keep..] {
            let var = lit.variable();
            values.unassign(var);
            self.reason_of[var as usize] = Reason::Decision;
            vmtf.update_on_unassign(var);
        }

        self.trail.truncate(keep);
        self.control.truncate(target as usize + 1);
        self.propagated = self.trail.len();
    }

    /// Rewrites every clause reason through the handle map produced by a
    /// clause-store collection.
    ///
    /// # Panics
    ///
    /// Panics if a reason clause was reclaimed; the reducer's protection
    /// pass must prevent that.
    pub fn remap_reasons(&mut self, map: &[Option<ClauseRef>]) {
        for &lit in &self.trail {
            let var = lit.variable() as usize;
            if let Reason::Clause(r) = self.reason_of[var] {
                self.reason_of[var] =
                    Reason::Clause(map[r.idx()].expect("reason clause was collected"));
            }
        }
    }

    /// Iterates over the assigned literals in trail order.
    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.trail.iter()
    }
}
