#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The CDCL search loop.
//!
//! Glues the data plane and the heuristics together: propagate to a fixed
//! point; on a conflict run first-UIP analysis, backjump and install the
//! learned clause; otherwise restart, reduce the clause database, or make
//! the next decision. The loop ends when the trail is total (SAT), the
//! empty clause is derived (UNSAT), or termination is requested (UNKNOWN).

use crate::sat::assignment::Assignment;
use crate::sat::clause_management::Reducer;
use crate::sat::clause_storage::ClauseDb;
use crate::sat::cnf::Cnf;
use crate::sat::config::Options;
use crate::sat::conflict_analysis::{Analyser, Conflict};
use crate::sat::error::Result;
use crate::sat::literal::Literal;
use crate::sat::phase_saving::SavedPhases;
use crate::sat::proof::{Proof, ProofSink};
use crate::sat::propagation::Propagator;
use crate::sat::restarter::Restarter;
use crate::sat::solver::{Solutions, Solver, Stats, Status};
use crate::sat::trail::{Reason, Trail};
use crate::sat::variable_selection::Vmtf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Usage-score increment growth per conflict; the inverse decay of clause
/// activities.
const CLAUSE_DECAY: f64 = 0.999;

/// The solver.
#[derive(Debug)]
pub struct Cdcl {
    values: Assignment,
    phases: SavedPhases,
    trail: Trail,
    db: ClauseDb,
    propagator: Propagator,
    analyser: Analyser,
    vmtf: Vmtf,
    restarter: Restarter,
    reducer: Reducer,
    options: Options,
    proof: Proof,
    terminate: Arc<AtomicBool>,
    checked_input: Option<Cnf>,
    num_vars: usize,
    unsat: bool,
    iterating: bool,
    decisions: u64,
    learned: u64,
    clause_inc: f64,
}

impl Cdcl {
    /// Attaches a proof sink. Only takes effect while the `proof` option is
    /// on.
    pub fn set_proof(&mut self, sink: Box<dyn ProofSink>) {
        if self.options.proof {
            self.proof = Proof::new(sink);
        }
    }

    /// The flag an external collaborator (a signal handler, typically) may
    /// set to stop the search at the next safe point.
    #[must_use]
    pub fn terminate_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.terminate)
    }

    /// `true` once unsatisfiability has been established. Monotone.
    #[must_use]
    pub const fn is_unsat(&self) -> bool {
        self.unsat
    }

    fn ingest(&mut self, cnf: &Cnf) {
        for clause in &cnf.clauses {
            match clause.len() {
                0 => self.unsat = true,
                1 => {
                    let l = clause[0];
                    match self.values.literal_value(l) {
                        // a clashing unit: the input forces both polarities
                        Some(false) => self.unsat = true,
                        Some(true) => {}
                        None => {
                            self.trail
                                .assign(&mut self.values, &mut self.phases, l, Reason::Decision);
                        }
                    }
                }
                _ => {
                    let r = self.db.allocate(clause, false, 0);
                    self.propagator.watch_clause(&self.db, r);
                }
            }
        }
    }

    fn satisfied(&self) -> bool {
        self.trail.len() == self.num_vars
    }

    /// Handles a conflict found by propagation. Returns `false` once the
    /// conflict proves the formula unsatisfiable.
    fn handle_conflict(&mut self, conflict: crate::sat::clause_storage::ClauseRef) -> bool {
        self.restarter.on_conflict(self.trail.len());

        if self.trail.level() == 0 {
            return false;
        }

        self.clause_inc /= CLAUSE_DECAY;
        let outcome = self.analyser.analyse(
            &mut self.db,
            &self.trail,
            &self.values,
            &mut self.vmtf,
            conflict,
            self.clause_inc,
        );
        if self.clause_inc > 1e20 {
            for r in self.db.refs() {
                self.db[r].scale_activity(1e-20);
            }
            self.clause_inc *= 1e-20;
        }

        match outcome {
            Conflict::Unit(l) => {
                self.learned += 1;
                self.proof.add(&[l]);
                self.restarter.on_learned(1, 0);
                self.trail.backtrack(&mut self.values, &mut self.vmtf, 0);
                match self.values.literal_value(l) {
                    Some(false) => return false,
                    Some(true) => {}
                    None => {
                        self.trail
                            .assign(&mut self.values, &mut self.phases, l, Reason::Decision);
                    }
                }
                self.iterating = true;
            }
            Conflict::Learned {
                literals,
                glue,
                jump,
            } => {
                self.learned += 1;
                self.proof.add(&literals);
                self.restarter.on_learned(glue, jump);
                self.trail
                    .backtrack(&mut self.values, &mut self.vmtf, jump);

                let r = self.db.allocate(&literals, true, glue);
                self.db[r].bump_activity(self.clause_inc);
                self.propagator.watch_clause(&self.db, r);
                self.trail
                    .assign(&mut self.values, &mut self.phases, literals[0], Reason::Clause(r));
                if jump == 0 {
                    self.iterating = true;
                }
            }
        }
        true
    }

    fn decide(&mut self) {
        self.decisions += 1;
        let var = self
            .vmtf
            .next_unassigned(&self.values)
            .expect("decide requires an unassigned variable");
        let lit = Literal::new(var, !self.phases.next(var));
        self.trail.push_level();
        self.trail
            .assign(&mut self.values, &mut self.phases, lit, Reason::Decision);
    }

    fn restart(&mut self) {
        let target = if self.options.reuse_trail {
            self.reuse_trail()
        } else {
            0
        };
        self.trail
            .backtrack(&mut self.values, &mut self.vmtf, target);
        self.restarter.on_restart(self.analyser.conflicts);
    }

    /// The deepest level whose decisions are all preferred over the next
    /// decision candidate; those would be re-decided immediately, so they
    /// are kept across the restart.
    fn reuse_trail(&mut self) -> u32 {
        let Some(next) = self.vmtf.next_unassigned(&self.values) else {
            return self.trail.level();
        };
        let limit = self.vmtf.stamp_of(next);

        let mut level = 0;
        while level < self.trail.level() {
            let decision = self.trail.decision_at_level(level + 1);
            if self.vmtf.stamp_of(decision.variable()) < limit {
                break;
            }
            level += 1;
        }
        level
    }

    fn reduce(&mut self) -> bool {
        self.reducer.reduce(
            self.analyser.conflicts,
            &mut self.db,
            &mut self.trail,
            &self.values,
            &mut self.propagator,
            &mut self.proof,
        )
    }

    fn report(&mut self) {
        if self.iterating {
            self.iterating = false;
            if self.options.verbose > 0 {
                println!(
                    "c i {} conflicts, {} fixed of {} variables, {} clauses, {:.1} avg jump",
                    self.analyser.conflicts,
                    self.trail.num_fixed(),
                    self.num_vars,
                    self.db.len() - self.db.num_garbage(),
                    self.restarter.jump_avg(),
                );
            }
        }
    }

    fn finish(&mut self, status: Status) -> Result<Status> {
        if let Some(e) = self.proof.take_error() {
            return Err(e.into());
        }
        if status == Status::Satisfiable {
            if let Some(input) = &self.checked_input {
                assert!(
                    input.verify(&self.solutions()),
                    "model fails the original clauses"
                );
            }
        }
        Ok(status)
    }
}

impl Solver for Cdcl {
    fn new(cnf: Cnf, options: Options) -> Self {
        let num_vars = cnf.num_vars;
        let checked_input = options.check_model.then(|| cnf.clone());

        let mut solver = Self {
            values: Assignment::new(num_vars),
            phases: SavedPhases::new(num_vars, options.phase),
            trail: Trail::new(num_vars),
            db: ClauseDb::new(),
            propagator: Propagator::new(num_vars),
            analyser: Analyser::new(num_vars, options.minimize_depth),
            vmtf: Vmtf::new(num_vars),
            restarter: Restarter::new(&options),
            reducer: Reducer::new(&options),
            options,
            proof: Proof::disabled(),
            terminate: Arc::new(AtomicBool::new(false)),
            checked_input,
            num_vars,
            unsat: false,
            iterating: false,
            decisions: 0,
            learned: 0,
            clause_inc: 1.0,
        };
        solver.ingest(&cnf);
        solver
    }

    fn solve(&mut self) -> Result<Status> {
        if self.unsat {
            return self.finish(Status::Unsatisfiable);
        }

        loop {
            let conflict = self.propagator.propagate(
                &mut self.db,
                &mut self.trail,
                &mut self.values,
                &mut self.phases,
            );

            if let Some(c) = conflict {
                if !self.handle_conflict(c) {
                    self.unsat = true;
                    self.proof.add(&[]);
                    return self.finish(Status::Unsatisfiable);
                }
                continue;
            }

            self.report();

            if self.unsat {
                return self.finish(Status::Unsatisfiable);
            }
            if self.satisfied() {
                return self.finish(Status::Satisfiable);
            }
            if self.terminate.load(Ordering::Relaxed) {
                return self.finish(Status::Unknown);
            }
            if self
                .restarter
                .restarting(self.analyser.conflicts, self.trail.len())
            {
                self.restart();
            } else if self.reducer.reducing(self.analyser.conflicts) {
                if !self.reduce() {
                    self.unsat = true;
                    self.proof.add(&[]);
                    return self.finish(Status::Unsatisfiable);
                }
            } else {
                self.decide();
            }
        }
    }

    fn solutions(&self) -> Solutions {
        self.values.solutions()
    }

    fn stats(&self) -> Stats {
        Stats {
            conflicts: self.analyser.conflicts,
            decisions: self.decisions,
            propagations: self.propagator.num_propagations(),
            restarts: self.restarter.num_restarts(),
            blocked_restarts: self.restarter.num_blocked(),
            reductions: self.reducer.num_reductions(),
            learned: self.learned,
            fixed: self.trail.num_fixed() as u64,
            clause_bytes: self.db.bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::dimacs::parse_dimacs_text;
    use crate::sat::proof::MemoryProof;
    use std::fmt::Write;

    fn solve_text(text: &str) -> (Status, Cdcl) {
        let cnf = parse_dimacs_text(text).unwrap();
        let mut solver = Cdcl::new(cnf, Options::default());
        let status = solver.solve().unwrap();
        (status, solver)
    }

    /// Pigeonhole principle instance: `pigeons` pigeons into `holes` holes.
    fn php(pigeons: usize, holes: usize) -> String {
        let var = |p: usize, h: usize| (p - 1) * holes + h;
        let mut clauses = Vec::new();
        for p in 1..=pigeons {
            clauses.push((1..=holes).map(|h| format!("{}", var(p, h))).collect::<Vec<_>>().join(" "));
        }
        for h in 1..=holes {
            for p1 in 1..=pigeons {
                for p2 in p1 + 1..=pigeons {
                    clauses.push(format!("-{} -{}", var(p1, h), var(p2, h)));
                }
            }
        }
        let mut out = String::new();
        writeln!(out, "p cnf {} {}", pigeons * holes, clauses.len()).unwrap();
        for c in clauses {
            writeln!(out, "{c} 0").unwrap();
        }
        out
    }

    #[test]
    fn test_trivial_sat() {
        let (status, solver) = solve_text("p cnf 1 1\n1 0\n");
        assert_eq!(status, Status::Satisfiable);
        assert!(solver.solutions().holds(1));
    }

    #[test]
    fn test_clashing_unit_unsat() {
        let (status, solver) = solve_text("p cnf 1 2\n1 0\n-1 0\n");
        assert_eq!(status, Status::Unsatisfiable);
        assert!(solver.is_unsat());
    }

    #[test]
    fn test_learning_reaches_sat() {
        let text = "p cnf 4 4\n1 2 0\n-1 3 0\n-2 4 0\n-3 -4 0\n";
        let (status, solver) = solve_text(text);
        assert_eq!(status, Status::Satisfiable);

        let cnf = parse_dimacs_text(text).unwrap();
        let model = solver.solutions();
        assert_eq!(model.len(), 4);
        assert!(cnf.verify(&model));
    }

    #[test]
    fn test_pigeonhole_three_into_two_unsat() {
        let (status, solver) = solve_text(&php(3, 2));
        assert_eq!(status, Status::Unsatisfiable);
        assert!(solver.stats().conflicts > 0);
    }

    #[test]
    fn test_learned_units_reach_unsat() {
        let (status, solver) = solve_text("p cnf 3 4\n1 2 0\n1 -2 0\n-1 3 0\n-1 -3 0\n");
        assert_eq!(status, Status::Unsatisfiable);
        assert!(solver.stats().learned >= 1);
    }

    #[test]
    fn test_tautology_does_not_affect_result() {
        let (status, solver) = solve_text("p cnf 2 2\n1 -1 2 0\n-2 0\n");
        assert_eq!(status, Status::Satisfiable);
        assert!(solver.solutions().holds(-2));
    }

    #[test]
    fn test_empty_formula_sat() {
        let (status, solver) = solve_text("p cnf 0 0\n");
        assert_eq!(status, Status::Satisfiable);
        assert!(solver.solutions().is_empty());
    }

    #[test]
    fn test_empty_clause_unsat() {
        let (status, _) = solve_text("p cnf 1 1\n0\n");
        assert_eq!(status, Status::Unsatisfiable);
    }

    #[test]
    fn test_model_is_total() {
        let (status, solver) = solve_text("p cnf 5 2\n1 2 0\n-3 4 0\n");
        assert_eq!(status, Status::Satisfiable);
        // even variables mentioned in no clause are assigned
        assert_eq!(solver.solutions().len(), 5);
    }

    #[test]
    fn test_terminate_flag_gives_unknown() {
        let cnf = parse_dimacs_text("p cnf 2 1\n1 2 0\n").unwrap();
        let mut solver = Cdcl::new(cnf, Options::default());
        solver.terminate_flag().store(true, Ordering::Relaxed);
        assert_eq!(solver.solve().unwrap(), Status::Unknown);
    }

    #[test]
    fn test_check_model_passes() {
        let cnf = parse_dimacs_text("p cnf 4 4\n1 2 0\n-1 3 0\n-2 4 0\n-3 -4 0\n").unwrap();
        let mut options = Options::default();
        options.check_model = true;
        let mut solver = Cdcl::new(cnf, options);
        assert_eq!(solver.solve().unwrap(), Status::Satisfiable);
    }

    #[test]
    fn test_proof_events_on_unsat() {
        let cnf = parse_dimacs_text("p cnf 3 4\n1 2 0\n1 -2 0\n-1 3 0\n-1 -3 0\n").unwrap();
        let mut options = Options::default();
        options.proof = true;
        let mut solver = Cdcl::new(cnf, options);
        let sink = MemoryProof::new();
        solver.set_proof(Box::new(sink.clone()));

        assert_eq!(solver.solve().unwrap(), Status::Unsatisfiable);
        let additions = sink.additions();
        assert!(!additions.is_empty());
        // the trace ends with the empty clause
        assert_eq!(additions.last().unwrap().len(), 0);
    }

    #[test]
    fn test_stats_accumulate() {
        let (status, solver) = solve_text(&php(3, 2));
        assert_eq!(status, Status::Unsatisfiable);
        let stats = solver.stats();
        assert!(stats.decisions > 0);
        assert!(stats.propagations > 0);
        assert!(stats.conflicts > 0);
    }

    #[test]
    fn test_unsat_under_aggressive_restarts_and_reductions() {
        let cnf = parse_dimacs_text(&php(4, 3)).unwrap();
        let mut options = Options::default();
        options.set("restart_interval", "1").unwrap();
        options.set("restart_margin", "0.0001").unwrap();
        options.set("reduce_interval", "1").unwrap();
        options.set("reduce_inc", "0").unwrap();
        let mut solver = Cdcl::new(cnf, options);
        assert_eq!(solver.solve().unwrap(), Status::Unsatisfiable);
    }

    #[test]
    fn test_sat_under_aggressive_restarts_and_reductions() {
        let text = php(4, 4);
        let cnf = parse_dimacs_text(&text).unwrap();
        let mut options = Options::default();
        options.set("restart_interval", "1").unwrap();
        options.set("restart_margin", "0.0001").unwrap();
        options.set("reduce_interval", "1").unwrap();
        options.set("reduce_inc", "0").unwrap();
        options.set("check_model", "true").unwrap();
        let mut solver = Cdcl::new(cnf, options);
        assert_eq!(solver.solve().unwrap(), Status::Satisfiable);
        assert!(parse_dimacs_text(&text).unwrap().verify(&solver.solutions()));
    }

    #[test]
    fn test_reuse_trail_can_be_disabled() {
        let cnf = parse_dimacs_text(&php(4, 3)).unwrap();
        let mut options = Options::default();
        options.set("reuse_trail", "false").unwrap();
        options.set("restart_interval", "1").unwrap();
        options.set("restart_margin", "0.0001").unwrap();
        let mut solver = Cdcl::new(cnf, options);
        assert_eq!(solver.solve().unwrap(), Status::Unsatisfiable);
    }
}
