#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! First-UIP conflict analysis.
//!
//! Starting from the conflicting clause, resolution steps walk the trail
//! backwards through reason clauses until exactly one literal of the
//! current decision level remains open; that literal is the first unique
//! implication point. The learned clause asserts its negation at the
//! backjump level, which is the highest level among the remaining
//! literals.
//!
//! The learned clause is then minimized: a literal is dropped if the
//! literals of its reason are all, transitively, either already in the
//! clause or fixed at the root level. A depth-limited DFS over reasons with
//! per-variable seen/removable/poison memoization implements this.
//!
//! Every variable touched during analysis is VMTF-bumped. Resolved
//! redundant clauses get a usage bump, and their glue is lowered to the new
//! clause's glue when that is smaller.

use crate::sat::assignment::Assignment;
use crate::sat::clause_storage::{ClauseDb, ClauseRef};
use crate::sat::literal::{Literal, Variable};
use crate::sat::trail::{Reason, Trail};
use crate::sat::variable_selection::Vmtf;
use bit_vec::BitVec;
use itertools::Itertools;

/// The outcome of analysing a conflict at a level above the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// A unit clause was learned; it becomes a root-level fact.
    Unit(Literal),
    /// A clause of two or more literals was learned.
    ///
    /// The first literal is the asserting one; the second is at the
    /// backjump level, so the first two slots are valid watches after the
    /// jump.
    Learned {
        /// The learned literals, asserting literal first.
        literals: Vec<Literal>,
        /// Distinct decision levels among the literals at learning time.
        glue: u32,
        /// The level to backtrack to.
        jump: u32,
    },
}

/// Reusable state for conflict analysis.
#[derive(Debug, Clone, Default)]
pub struct Analyser {
    seen: BitVec,
    removable: BitVec,
    poison: BitVec,
    to_clear: Vec<Variable>,
    min_to_clear: Vec<Variable>,
    resolved: Vec<ClauseRef>,
    minimize_depth: u32,
    /// Number of conflicts analysed.
    pub conflicts: u64,
}

impl Analyser {
    /// Creates an analyser for `num_vars` variables with the given
    /// minimization recursion limit.
    #[must_use]
    pub fn new(num_vars: usize, minimize_depth: u32) -> Self {
        Self {
            seen: BitVec::from_elem(num_vars, false),
            removable: BitVec::from_elem(num_vars, false),
            poison: BitVec::from_elem(num_vars, false),
            to_clear: Vec::new(),
            min_to_clear: Vec::new(),
            resolved: Vec::new(),
            minimize_depth,
            conflicts: 0,
        }
    }

    /// Derives the first-UIP clause for `conflict`.
    ///
    /// Must only be called at a decision level above the root. `clause_inc`
    /// is the current usage-score increment for resolved redundant clauses.
    pub fn analyse(
        &mut self,
        db: &mut ClauseDb,
        trail: &Trail,
        values: &Assignment,
        vmtf: &mut Vmtf,
        conflict: ClauseRef,
        clause_inc: f64,
    ) -> Conflict {
        debug_assert!(trail.level() > 0, "root conflicts are not analysed");
        self.conflicts += 1;

        let current_level = trail.level();
        let mut learnt: Vec<Literal> = Vec::new();
        let mut open = 0usize;
        let mut i = trail.len();
        let mut uip: Option<Literal> = None;
        let mut current = conflict;

        loop {
            self.resolved.push(current);
            for idx in 0..db[current].len() {
                let q = db[current][idx];
                let var = q.variable();
                if self.seen[var as usize] {
                    continue;
                }
                let level = trail.var_level(var);
                if level == 0 {
                    continue;
                }
                self.seen.set(var as usize, true);
                self.to_clear.push(var);
                vmtf.bump(var);
                if level == current_level {
                    open += 1;
                } else {
                    learnt.push(q);
                }
            }

            // Walk backwards to the next marked trail literal.
            let p = loop {
                i -= 1;
                let lit = trail[i];
                if self.seen[lit.variable() as usize] {
                    break lit;
                }
            };

            open -= 1;
            if open == 0 {
                uip = Some(p);
                break;
            }

            current = match trail.reason(p.variable()) {
                Reason::Clause(r) => r,
                Reason::Decision => {
                    debug_assert!(false, "open literals below a decision");
                    uip = Some(p);
                    break;
                }
            };
        }

        let uip = uip.expect("analysis always reaches a UIP");

        self.minimize(db, trail, &mut learnt);

        debug_assert!(
            learnt
                .iter()
                .all(|&l| values.literal_value(l) == Some(false)),
            "learned clause must be falsified by the current assignment"
        );

        let jump = learnt
            .iter()
            .map(|l| trail.var_level(l.variable()))
            .max()
            .unwrap_or(0);

        let glue = Self::glue_of(trail, current_level, &learnt);

        // Resolved redundant clauses contributed to this conflict; reward
        // them and tighten their glue.
        for &r in &self.resolved {
            let clause = &mut db[r];
            if clause.redundant {
                if clause.glue > glue {
                    clause.glue = glue;
                }
                clause.bump_activity(clause_inc);
            }
        }

        self.clear_marks();

        if learnt.is_empty() {
            Conflict::Unit(uip.negated())
        } else {
            // Put a backjump-level literal into the second watch slot.
            let snd = learnt
                .iter()
                .position(|l| trail.var_level(l.variable()) == jump)
                .expect("some literal sits at the backjump level");
            learnt.swap(0, snd);

            let mut literals = Vec::with_capacity(learnt.len() + 1);
            literals.push(uip.negated());
            literals.extend(learnt);
            Conflict::Learned {
                literals,
                glue,
                jump,
            }
        }
    }

    fn glue_of(trail: &Trail, current_level: u32, learnt: &[Literal]) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let glue = std::iter::once(current_level)
            .chain(learnt.iter().map(|l| trail.var_level(l.variable())))
            .unique()
            .count() as u32;
        glue
    }

    /// Drops every learned literal whose reasons resolve away against the
    /// rest of the clause and the root level.
    fn minimize(&mut self, db: &ClauseDb, trail: &Trail, learnt: &mut Vec<Literal>) {
        let mut kept = Vec::with_capacity(learnt.len());
        for &lit in learnt.iter() {
            if !self.redundant(db, trail, lit, 0) {
                kept.push(lit);
            }
        }
        *learnt = kept;
    }

    fn redundant(&mut self, db: &ClauseDb, trail: &Trail, lit: Literal, depth: u32) -> bool {
        let var = lit.variable();
        let idx = var as usize;

        if trail.var_level(var) == 0 {
            return true;
        }
        if self.removable[idx] {
            return true;
        }
        if self.poison[idx] {
            return false;
        }
        // A literal already in the clause terminates the search, but only
        // below the top level: the top-level call asks whether the clause
        // literal itself can go.
        if depth > 0 && self.seen[idx] {
            return true;
        }
        if depth >= self.minimize_depth {
            self.mark_poison(var, depth);
            return false;
        }

        let r = match trail.reason(var) {
            Reason::Clause(r) => r,
            Reason::Decision => {
                self.mark_poison(var, depth);
                return false;
            }
        };

        for k in 0..db[r].len() {
            let q = db[r][k];
            if q.variable() == var {
                continue;
            }
            if !self.redundant(db, trail, q, depth + 1) {
                self.mark_poison(var, depth);
                return false;
            }
        }

        if !self.removable[idx] {
            self.removable.set(idx, true);
            self.min_to_clear.push(var);
        }
        true
    }

    // Clause literals are their own cache (the seen guard), so a failed
    // top-level probe must not poison them.
    fn mark_poison(&mut self, var: Variable, depth: u32) {
        if depth > 0 && !self.poison[var as usize] {
            self.poison.set(var as usize, true);
            self.min_to_clear.push(var);
        }
    }

    fn clear_marks(&mut self) {
        for &var in &self.to_clear {
            self.seen.set(var as usize, false);
        }
        for &var in &self.min_to_clear {
            self.poison.set(var as usize, false);
            self.removable.set(var as usize, false);
        }
        self.to_clear.clear();
        self.min_to_clear.clear();
        self.resolved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::phase_saving::SavedPhases;

    fn lit(value: i32) -> Literal {
        Literal::from_dimacs(value)
    }

    struct Fixture {
        db: ClauseDb,
        trail: Trail,
        values: Assignment,
        phases: SavedPhases,
        vmtf: Vmtf,
        analyser: Analyser,
    }

    fn setup(num_vars: usize) -> Fixture {
        Fixture {
            db: ClauseDb::new(),
            trail: Trail::new(num_vars),
            values: Assignment::new(num_vars),
            phases: SavedPhases::new(num_vars, false),
            vmtf: Vmtf::new(num_vars),
            analyser: Analyser::new(num_vars, 1000),
        }
    }

    fn clause(f: &mut Fixture, values: &[i32]) -> ClauseRef {
        let literals: Vec<Literal> = values.iter().map(|&v| lit(v)).collect();
        f.db.allocate(&literals, false, 0)
    }

    fn decide(f: &mut Fixture, value: i32) {
        f.trail.push_level();
        f.trail
            .assign(&mut f.values, &mut f.phases, lit(value), Reason::Decision);
    }

    fn imply(f: &mut Fixture, value: i32, reason: ClauseRef) {
        f.trail
            .assign(&mut f.values, &mut f.phases, lit(value), Reason::Clause(reason));
    }

    #[test]
    fn test_unit_uip() {
        // conflict entirely at the current level collapses to a unit
        let mut f = setup(5);
        let c0 = clause(&mut f, &[-1, -2, 3]);
        let c1 = clause(&mut f, &[-3, 4]);
        let c2 = clause(&mut f, &[-3, 5]);
        let c3 = clause(&mut f, &[-4, -5]);

        decide(&mut f, 1);
        decide(&mut f, 2);
        imply(&mut f, 3, c0);
        imply(&mut f, 4, c1);
        imply(&mut f, 5, c2);

        let result = f.analyser.analyse(
            &mut f.db,
            &f.trail,
            &f.values,
            &mut f.vmtf,
            c3,
            1.0,
        );
        // 3 dominates every path from the conflict back to the decision,
        // and nothing below the current level was resolved in
        assert_eq!(result, Conflict::Unit(lit(-3)));
        assert_eq!(f.analyser.conflicts, 1);
    }

    #[test]
    fn test_first_uip_with_lower_level_literal() {
        let mut f = setup(4);
        let c0 = clause(&mut f, &[-2, 3]);
        let c1 = clause(&mut f, &[-1, -3, 4]);
        let c2 = clause(&mut f, &[-3, -4]);

        decide(&mut f, 1);
        decide(&mut f, 2);
        imply(&mut f, 3, c0);
        imply(&mut f, 4, c1);

        let result = f.analyser.analyse(
            &mut f.db,
            &f.trail,
            &f.values,
            &mut f.vmtf,
            c2,
            1.0,
        );
        match result {
            Conflict::Learned {
                literals,
                glue,
                jump,
            } => {
                assert_eq!(literals[0], lit(-3));
                assert_eq!(literals[1], lit(-1));
                assert_eq!(literals.len(), 2);
                assert_eq!(glue, 2);
                assert_eq!(jump, 1);
            }
            Conflict::Unit(_) => panic!("expected a binary learned clause"),
        }
    }

    #[test]
    fn test_minimization_drops_dominated_literal() {
        let mut f = setup(4);
        let c0 = clause(&mut f, &[-1, 2]);
        let c1 = clause(&mut f, &[-3, -2, 4]);
        let c2 = clause(&mut f, &[-4, -1, -2]);

        decide(&mut f, 1);
        imply(&mut f, 2, c0);
        decide(&mut f, 3);
        imply(&mut f, 4, c1);

        let result = f.analyser.analyse(
            &mut f.db,
            &f.trail,
            &f.values,
            &mut f.vmtf,
            c2,
            1.0,
        );
        match result {
            Conflict::Learned {
                literals,
                glue,
                jump,
            } => {
                // -2 is dominated: its reason (-1 2) resolves against -1,
                // which stays in the clause
                assert_eq!(literals, vec![lit(-4), lit(-1)]);
                assert_eq!(glue, 2);
                assert_eq!(jump, 1);
            }
            Conflict::Unit(_) => panic!("expected a binary learned clause"),
        }
    }

    #[test]
    fn test_depth_zero_disables_minimization() {
        let mut f = setup(4);
        let c0 = clause(&mut f, &[-1, 2]);
        let c1 = clause(&mut f, &[-3, -2, 4]);
        let c2 = clause(&mut f, &[-4, -1, -2]);

        decide(&mut f, 1);
        imply(&mut f, 2, c0);
        decide(&mut f, 3);
        imply(&mut f, 4, c1);

        f.analyser.minimize_depth = 0;
        let result = f.analyser.analyse(
            &mut f.db,
            &f.trail,
            &f.values,
            &mut f.vmtf,
            c2,
            1.0,
        );
        match result {
            Conflict::Learned { literals, .. } => {
                assert_eq!(literals.len(), 3);
            }
            Conflict::Unit(_) => panic!("expected a ternary learned clause"),
        }
    }

    #[test]
    fn test_resolved_redundant_clause_glue_lowered() {
        let mut f = setup(4);
        let c0 = clause(&mut f, &[-2, 3]);
        let c1 = clause(&mut f, &[-1, -3, 4]);
        let c2 = clause(&mut f, &[-3, -4]);
        f.db[c1].redundant = true;
        f.db[c1].glue = 7;

        decide(&mut f, 1);
        decide(&mut f, 2);
        imply(&mut f, 3, c0);
        imply(&mut f, 4, c1);

        let result = f.analyser.analyse(
            &mut f.db,
            &f.trail,
            &f.values,
            &mut f.vmtf,
            c2,
            1.0,
        );
        let Conflict::Learned { glue, .. } = result else {
            panic!("expected a learned clause");
        };
        assert_eq!(f.db[c1].glue, glue);
        assert!(f.db[c1].activity.into_inner() > 0.0);
    }
}
