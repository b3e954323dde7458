//! A conflict-driven clause-learning (CDCL) SAT solver.
//!
//! Given a propositional formula in conjunctive normal form the solver either
//! produces a total satisfying assignment or reports unsatisfiability,
//! optionally emitting a DRAT proof trace.

pub mod sat;
