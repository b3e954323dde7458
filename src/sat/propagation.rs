#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Unit propagation over watched literals.
//!
//! Every non-garbage clause of size two or more is watched by its first two
//! literal slots. When a literal is assigned, the watch lists of its
//! negation are scanned: a true blocking literal short-circuits the probe,
//! otherwise the clause body is inspected for a replacement watch, a forced
//! assignment, or a conflict.
//!
//! Propagation is restartable: backtracking resets `trail.propagated` and a
//! subsequent call picks up from there.

use crate::sat::assignment::Assignment;
use crate::sat::clause_storage::{ClauseDb, ClauseRef};
use crate::sat::phase_saving::SavedPhases;
use crate::sat::trail::{Reason, Trail};
use crate::sat::watch::Watches;

/// The two-watched-literal propagator. Owns the watch lists.
#[derive(Debug, Clone, Default)]
pub struct Propagator {
    watches: Watches,
    propagations: u64,
}

impl Propagator {
    /// Creates a propagator with empty watch lists for `num_vars`
    /// variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            watches: Watches::new(num_vars),
            propagations: 0,
        }
    }

    /// Total number of literals propagated so far.
    #[must_use]
    pub const fn num_propagations(&self) -> u64 {
        self.propagations
    }

    /// Installs watches on the first two literal slots of a clause. The
    /// blocking literal of each watch is the other watched literal.
    pub fn watch_clause(&mut self, db: &ClauseDb, r: ClauseRef) {
        let clause = &db[r];
        debug_assert!(clause.len() >= 2, "cannot watch a short clause");
        let a = clause[0];
        let b = clause[1];
        debug_assert_ne!(a.variable(), b.variable());
        self.watches.add(a, b, r);
        self.watches.add(b, a, r);
    }

    /// Drops every watch pointing at a garbage clause.
    pub fn flush_garbage(&mut self, db: &ClauseDb) {
        self.watches.flush_garbage(db);
    }

    /// Rebuilds all watch lists from scratch over the live clauses.
    ///
    /// Called from reduction, possibly away from the root level, so watch
    /// slots have to be re-chosen: two non-false literals where possible,
    /// otherwise the satisfying literal plus the highest-level false one.
    /// The latter keeps the watches sound across later backtracking, since
    /// the satisfying literal was forced no later than that false literal.
    pub fn setup_watches(&mut self, db: &mut ClauseDb, trail: &Trail, values: &Assignment) {
        self.watches.clear_all();
        for r in db.refs() {
            if db.is_garbage(r) || db[r].len() < 2 {
                continue;
            }

            let clause = &mut db[r];
            let mut found = 0;
            for k in 0..clause.len() {
                if values.literal_value(clause[k]) != Some(false) {
                    clause.swap(found, k);
                    found += 1;
                    if found == 2 {
                        break;
                    }
                }
            }
            debug_assert!(found >= 1, "a falsified clause survived propagation");
            if found == 1 {
                debug_assert_eq!(values.literal_value(clause[0]), Some(true));
                let mut best = 1;
                for k in 2..clause.len() {
                    if trail.var_level(clause[k].variable())
                        > trail.var_level(clause[best].variable())
                    {
                        best = k;
                    }
                }
                clause.swap(1, best);
            }

            self.watch_clause(db, r);
        }
    }

    /// Advances `trail.propagated` to the trail end, enqueueing forced
    /// assignments along the way.
    ///
    /// Returns the conflicting clause if one is found; the trail then still
    /// holds the assignments made so far and the offending watch is kept.
    pub fn propagate(
        &mut self,
        db: &mut ClauseDb,
        trail: &mut Trail,
        values: &mut Assignment,
        phases: &mut SavedPhases,
    ) -> Option<ClauseRef> {
        while trail.propagated < trail.len() {
            let lit = trail[trail.propagated];
            trail.propagated += 1;
            self.propagations += 1;

            if let Some(conflict) = self.propagate_literal(lit, db, trail, values, phases) {
                return Some(conflict);
            }
        }
        None
    }

    /// Scans the watches of `¬lit` after `lit` was assigned true.
    fn propagate_literal(
        &mut self,
        lit: crate::sat::literal::Literal,
        db: &mut ClauseDb,
        trail: &mut Trail,
        values: &mut Assignment,
        phases: &mut SavedPhases,
    ) -> Option<ClauseRef> {
        let falsified = lit.negated();
        let mut ws = self.watches.take(falsified);

        let mut conflict = None;
        let mut i = 0;
        let mut j = 0;

        'scan: while i < ws.len() {
            let mut w = ws[i];
            i += 1;

            // A true blocking literal satisfies the clause without touching
            // its body.
            if values.literal_value(w.blocker) == Some(true) {
                ws[j] = w;
                j += 1;
                continue;
            }

            if db.is_garbage(w.clause) {
                continue;
            }

            let r = w.clause;
            {
                let clause = &mut db[r];
                if clause[0] == falsified {
                    clause.swap(0, 1);
                }
                debug_assert_eq!(clause[1], falsified);
            }

            let other = db[r][0];
            if values.literal_value(other) == Some(true) {
                w.blocker = other;
                ws[j] = w;
                j += 1;
                continue;
            }

            // Look for a non-false replacement among the remaining slots.
            let len = db[r].len();
            let mut replacement = None;
            for k in 2..len {
                if values.literal_value(db[r][k]) != Some(false) {
                    replacement = Some(k);
                    break;
                }
            }

            if let Some(k) = replacement {
                let clause = &mut db[r];
                let new_watch = clause[k];
                clause.swap(1, k);
                self.watches.add(new_watch, other, r);
                continue;
            }

            match values.literal_value(other) {
                Some(false) => {
                    ws[j] = w;
                    j += 1;
                    conflict = Some(r);
                    break 'scan;
                }
                None => {
                    trail.assign(values, phases, other, Reason::Clause(r));
                    ws[j] = w;
                    j += 1;
                }
                Some(true) => {
                    ws[j] = w;
                    j += 1;
                }
            }
        }

        // On a conflict the unscanned suffix is preserved verbatim.
        while i < ws.len() {
            ws[j] = ws[i];
            j += 1;
            i += 1;
        }
        ws.truncate(j);
        self.watches.put(falsified, ws);

        conflict
    }

    #[cfg(test)]
    fn watch_list(&self, lit: crate::sat::literal::Literal) -> &[crate::sat::watch::Watch] {
        &self.watches[lit]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::Literal;
    use crate::sat::variable_selection::Vmtf;

    fn lit(value: i32) -> Literal {
        Literal::from_dimacs(value)
    }

    struct Fixture {
        db: ClauseDb,
        refs: Vec<ClauseRef>,
        trail: Trail,
        values: Assignment,
        phases: SavedPhases,
        propagator: Propagator,
    }

    fn setup(clauses: &[&[i32]], num_vars: usize) -> Fixture {
        let mut db = ClauseDb::new();
        let mut refs = Vec::new();
        let mut propagator = Propagator::new(num_vars);
        for c in clauses {
            let literals: Vec<Literal> = c.iter().map(|&v| lit(v)).collect();
            let r = db.allocate(&literals, false, 0);
            propagator.watch_clause(&db, r);
            refs.push(r);
        }
        Fixture {
            db,
            refs,
            trail: Trail::new(num_vars),
            values: Assignment::new(num_vars),
            phases: SavedPhases::new(num_vars, false),
            propagator,
        }
    }

    fn decide(f: &mut Fixture, value: i32) {
        f.trail.push_level();
        f.trail
            .assign(&mut f.values, &mut f.phases, lit(value), Reason::Decision);
    }

    #[test]
    fn test_simple_chain() {
        let mut f = setup(&[&[-1, 2], &[-2, 3]], 3);
        decide(&mut f, 1);

        let conflict =
            f.propagator
                .propagate(&mut f.db, &mut f.trail, &mut f.values, &mut f.phases);
        assert!(conflict.is_none());

        assert_eq!(f.trail.len(), 3);
        assert_eq!(f.values.literal_value(lit(2)), Some(true));
        assert_eq!(f.values.literal_value(lit(3)), Some(true));
        assert_eq!(f.propagator.num_propagations(), 3);
        assert_eq!(f.trail.propagated, f.trail.len());
    }

    #[test]
    fn test_conflict_detected() {
        let mut f = setup(&[&[-1, 2], &[-1, -2]], 2);
        decide(&mut f, 1);

        let conflict =
            f.propagator
                .propagate(&mut f.db, &mut f.trail, &mut f.values, &mut f.phases);
        assert!(conflict.is_some());
        let c = conflict.unwrap();
        // every literal of the conflicting clause is false
        assert!(f
            .db[c]
            .iter()
            .all(|&l| f.values.literal_value(l) == Some(false)));
    }

    #[test]
    fn test_replacement_watch_found() {
        let mut f = setup(&[&[-1, 2, 3, -4]], 4);
        decide(&mut f, 1);

        let conflict =
            f.propagator
                .propagate(&mut f.db, &mut f.trail, &mut f.values, &mut f.phases);
        assert!(conflict.is_none());
        // nothing was forced, the clause found a new watch
        assert_eq!(f.trail.len(), 1);

        // the falsified literal is no longer watched
        assert!(f.propagator.watch_list(lit(-1)).is_empty());
        let watched: Vec<_> = [lit(2), lit(3), lit(-4)]
            .into_iter()
            .filter(|&l| !f.propagator.watch_list(l).is_empty())
            .collect();
        assert_eq!(watched.len(), 2);
    }

    #[test]
    fn test_blocking_literal_short_circuit() {
        let mut f = setup(&[&[1, 2]], 2);
        decide(&mut f, 2);
        let conflict =
            f.propagator
                .propagate(&mut f.db, &mut f.trail, &mut f.values, &mut f.phases);
        assert!(conflict.is_none());

        // now falsify the other watch; the true blocker keeps the probe
        // from touching the clause
        decide(&mut f, -1);
        let conflict =
            f.propagator
                .propagate(&mut f.db, &mut f.trail, &mut f.values, &mut f.phases);
        assert!(conflict.is_none());
        assert_eq!(f.propagator.watch_list(lit(1)).len(), 1);
        assert_eq!(f.propagator.watch_list(lit(1))[0].blocker, lit(2));
    }

    #[test]
    fn test_restartable_after_backtrack() {
        let mut f = setup(&[&[-1, 2], &[-2, 3]], 3);
        let mut vmtf = Vmtf::new(3);

        decide(&mut f, 1);
        assert!(f
            .propagator
            .propagate(&mut f.db, &mut f.trail, &mut f.values, &mut f.phases)
            .is_none());
        let first: Vec<_> = f.trail.iter().copied().collect();

        f.trail.backtrack(&mut f.values, &mut vmtf, 0);
        assert_eq!(f.trail.propagated, 0);

        decide(&mut f, 1);
        assert!(f
            .propagator
            .propagate(&mut f.db, &mut f.trail, &mut f.values, &mut f.phases)
            .is_none());
        let second: Vec<_> = f.trail.iter().copied().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_garbage_watch_dropped() {
        let mut f = setup(&[&[-1, 2], &[-1, 3]], 3);
        let garbage = f.refs[1];
        f.db.mark_garbage(garbage);

        decide(&mut f, 1);
        let conflict =
            f.propagator
                .propagate(&mut f.db, &mut f.trail, &mut f.values, &mut f.phases);
        assert!(conflict.is_none());
        // only the live clause propagated
        assert_eq!(f.values.literal_value(lit(2)), Some(true));
        assert_eq!(f.values.literal_value(lit(3)), None);
        // the stale watch is gone
        assert!(f.propagator.watch_list(lit(-1)).iter().all(|w| w.clause != garbage));
    }
}
