#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Watch lists with blocking literals.
//!
//! Each literal has a list of `(blocking literal, clause)` pairs, one per
//! clause watching it. The blocking literal lets most propagation probes
//! terminate without touching the clause body: if it is already true the
//! watch is left alone. Lists are indexed by `Literal::index`, so the two
//! polarities of a variable sit in adjacent slots.

use crate::sat::clause_storage::{ClauseDb, ClauseRef};
use crate::sat::literal::Literal;
use smallvec::SmallVec;
use std::mem;
use std::ops::{Index, IndexMut};

/// A single watch: a blocking literal and the clause it guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watch {
    /// Some other literal of the clause; if true, the clause is satisfied.
    pub blocker: Literal,
    /// The watched clause.
    pub clause: ClauseRef,
}

/// One watch list per literal.
#[derive(Debug, Clone, Default)]
pub struct Watches {
    lists: Vec<SmallVec<[Watch; 4]>>,
}

impl Watches {
    /// Creates empty watch lists for `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            lists: vec![SmallVec::new(); num_vars * 2],
        }
    }

    /// Adds a watch of `lit` guarding `clause` with the given blocker.
    pub fn add(&mut self, lit: Literal, blocker: Literal, clause: ClauseRef) {
        self[lit].push(Watch { blocker, clause });
    }

    /// Takes ownership of the watch list of `lit`, leaving it empty. The
    /// propagator edits the taken list in place and puts it back.
    pub fn take(&mut self, lit: Literal) -> SmallVec<[Watch; 4]> {
        mem::take(&mut self.lists[lit.index()])
    }

    /// Restores a previously taken watch list.
    pub fn put(&mut self, lit: Literal, list: SmallVec<[Watch; 4]>) {
        self.lists[lit.index()] = list;
    }

    /// Empties every list, keeping the allocations.
    pub fn clear_all(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
    }

    /// Drops every watch that points at a garbage clause.
    pub fn flush_garbage(&mut self, db: &ClauseDb) {
        for list in &mut self.lists {
            list.retain(|w| !db.is_garbage(w.clause));
        }
    }
}

impl Index<Literal> for Watches {
    type Output = SmallVec<[Watch; 4]>;

    fn index(&self, lit: Literal) -> &Self::Output {
        &self.lists[lit.index()]
    }
}

impl IndexMut<Literal> for Watches {
    fn index_mut(&mut self, lit: Literal) -> &mut Self::Output {
        &mut self.lists[lit.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: i32) -> Literal {
        Literal::from_dimacs(value)
    }

    #[test]
    fn test_add_and_index() {
        let mut db = ClauseDb::new();
        let c = db.allocate(&[lit(1), lit(2)], false, 0);

        let mut watches = Watches::new(2);
        watches.add(lit(1), lit(2), c);
        watches.add(lit(2), lit(1), c);

        assert_eq!(watches[lit(1)].len(), 1);
        assert_eq!(watches[lit(1)][0].blocker, lit(2));
        assert!(watches[lit(-1)].is_empty());
    }

    #[test]
    fn test_take_put_round_trip() {
        let mut db = ClauseDb::new();
        let c = db.allocate(&[lit(1), lit(2)], false, 0);

        let mut watches = Watches::new(2);
        watches.add(lit(1), lit(2), c);

        let list = watches.take(lit(1));
        assert_eq!(list.len(), 1);
        assert!(watches[lit(1)].is_empty());
        watches.put(lit(1), list);
        assert_eq!(watches[lit(1)].len(), 1);
    }

    #[test]
    fn test_flush_garbage() {
        let mut db = ClauseDb::new();
        let a = db.allocate(&[lit(1), lit(2)], false, 0);
        let b = db.allocate(&[lit(1), lit(3)], true, 1);

        let mut watches = Watches::new(3);
        watches.add(lit(1), lit(2), a);
        watches.add(lit(1), lit(3), b);

        db.mark_garbage(b);
        watches.flush_garbage(&db);

        assert_eq!(watches[lit(1)].len(), 1);
        assert_eq!(watches[lit(1)][0].clause, a);
    }
}
