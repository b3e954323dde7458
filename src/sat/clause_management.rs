#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clause-database reduction.
//!
//! Learned clauses accumulate without bound; periodically the worse half
//! is dropped. Reduction runs only from the search loop, never during
//! propagation or analysis, and is the single place where clause handles
//! are invalidated.
//!
//! The pipeline: protect clauses currently acting as reasons, flush
//! clauses satisfied at the root level and strip root-false literals,
//! rank the redundant candidates by glue then activity and mark the worse
//! half garbage, drop watches into garbage, compact the store rewriting
//! reasons through the old-to-new handle map, and finally rebuild the
//! watch lists.

use crate::sat::assignment::Assignment;
use crate::sat::clause::ClauseLits;
use crate::sat::clause_storage::{ClauseDb, ClauseRef};
use crate::sat::config::Options;
use crate::sat::literal::Literal;
use crate::sat::proof::Proof;
use crate::sat::propagation::Propagator;
use crate::sat::trail::{Reason, Trail};
use ordered_float::OrderedFloat;

/// Schedules and performs clause-database reductions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reducer {
    limit: u64,
    inc: u64,
    reduce_inc: u64,
    small_glue: u32,
    reductions: u64,
    last_fixed: usize,
}

impl Reducer {
    /// Creates a reducer configured from `opts`.
    #[must_use]
    pub fn new(opts: &Options) -> Self {
        #[allow(clippy::cast_sign_loss)]
        let inc = opts.reduce_interval.max(1) as u64;
        #[allow(clippy::cast_sign_loss)]
        let reduce_inc = opts.reduce_inc.max(0) as u64;
        Self {
            limit: inc,
            inc,
            reduce_inc,
            small_glue: opts.small_glue,
            reductions: 0,
            last_fixed: 0,
        }
    }

    /// `true` once enough conflicts have accumulated.
    #[must_use]
    pub const fn reducing(&self, conflicts: u64) -> bool {
        conflicts >= self.limit
    }

    /// Number of reductions performed.
    #[must_use]
    pub const fn num_reductions(&self) -> u64 {
        self.reductions
    }

    /// Runs one reduction cycle.
    ///
    /// Returns `false` if flushing derived the empty clause, which makes
    /// the formula unsatisfiable.
    pub fn reduce(
        &mut self,
        conflicts: u64,
        db: &mut ClauseDb,
        trail: &mut Trail,
        values: &Assignment,
        propagator: &mut Propagator,
        proof: &mut Proof,
    ) -> bool {
        self.protect_reasons(db, trail);

        if trail.num_fixed() > self.last_fixed {
            if !self.flush_fixed(db, trail, values, proof) {
                return false;
            }
            self.last_fixed = trail.num_fixed();
        }

        self.mark_weak_clauses(db, proof);

        propagator.flush_garbage(db);
        let map = db.collect();
        trail.remap_reasons(&map);
        propagator.setup_watches(db, trail, values);

        for r in db.refs() {
            db[r].reason = false;
        }

        self.reductions += 1;
        self.inc += self.reduce_inc;
        self.limit = conflicts + self.inc;
        true
    }

    /// Clauses referenced as reasons on the trail must survive collection,
    /// whatever their garbage mark says.
    fn protect_reasons(&self, db: &mut ClauseDb, trail: &Trail) {
        for i in 0..trail.len() {
            if let Reason::Clause(r) = trail.reason(trail[i].variable()) {
                db.unmark_garbage(r);
                db[r].reason = true;
            }
        }
    }

    /// Drops clauses satisfied at the root and strips root-false literals.
    fn flush_fixed(
        &self,
        db: &mut ClauseDb,
        trail: &Trail,
        values: &Assignment,
        proof: &mut Proof,
    ) -> bool {
        let root_value = |l: Literal| {
            (trail.var_level(l.variable()) == 0).then(|| values.literal_value(l)).flatten()
        };

        for r in db.live_refs().collect::<Vec<_>>() {
            if db[r].reason {
                continue;
            }

            if db[r].iter().any(|&l| root_value(l) == Some(true)) {
                let old: Vec<Literal> = db[r].iter().copied().collect();
                proof.delete(&old);
                db.mark_garbage(r);
                continue;
            }

            let num_false = db[r]
                .iter()
                .filter(|&&l| root_value(l) == Some(false))
                .count();
            if num_false == 0 {
                continue;
            }

            let old: Vec<Literal> = db[r].iter().copied().collect();
            let new: ClauseLits = old
                .iter()
                .copied()
                .filter(|&l| root_value(l) != Some(false))
                .collect();

            if new.is_empty() {
                proof.add(&[]);
                return false;
            }
            // A clause unit under the root assignment would already have
            // been propagated, so the remaining literal must be true and
            // the satisfied branch above must have caught it.
            debug_assert!(new.len() >= 2);

            proof.add(&new);
            proof.delete(&old);
            db[r].literals = new;
        }
        true
    }

    /// Ranks redundant candidates by (glue ascending, activity descending)
    /// and marks the worse half garbage. Small-glue clauses and reasons
    /// are exempt.
    fn mark_weak_clauses(&self, db: &mut ClauseDb, proof: &mut Proof) {
        let mut candidates: Vec<(u32, OrderedFloat<f64>, ClauseRef)> = db
            .live_refs()
            .filter(|&r| {
                let c = &db[r];
                c.redundant && !c.reason && c.glue > self.small_glue
            })
            .map(|r| (db[r].glue, db[r].activity, r))
            .collect();

        candidates.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let keep = candidates.len() - candidates.len() / 2;
        for &(_, _, r) in &candidates[keep..] {
            let lits: Vec<Literal> = db[r].iter().copied().collect();
            proof.delete(&lits);
            db.mark_garbage(r);
        }
    }
}
