#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The variable-move-to-front (VMTF) decision queue.
//!
//! A doubly-linked list over all variables, implemented as parallel
//! `prev`/`next` index arrays, ordered by bump recency. Every variable
//! carries a globally unique timestamp; bumping unlinks the variable and
//! relinks it at the head with a fresh stamp, in O(1).
//!
//! A cursor tracks the most recently stamped variable that may be
//! unassigned. Picking the next decision variable walks the cursor towards
//! older stamps past assigned variables; unassigning a variable during
//! backtrack moves the cursor back up if that variable is stamped more
//! recently.

use crate::sat::assignment::Assignment;
use crate::sat::literal::Variable;

const INVALID: u32 = u32::MAX;

/// The VMTF queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vmtf {
    stamp: Vec<u64>,
    /// Neighbor with the next-older stamp.
    prev: Vec<u32>,
    /// Neighbor with the next-newer stamp.
    next: Vec<u32>,
    /// Most recently stamped variable.
    head: u32,
    /// Oldest variable.
    tail: u32,
    /// Most recently stamped possibly-unassigned variable.
    search: u32,
    counter: u64,
}

impl Vmtf {
    /// Creates a queue over `num_vars` variables, ordered so that
    /// lower-indexed variables are tried first.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        if num_vars == 0 {
            return Self {
                head: INVALID,
                tail: INVALID,
                search: INVALID,
                ..Self::default()
            };
        }

        // Chain: var n-1 (oldest) .. var 1, var 0 (head). Stamps decrease
        // with the variable index so the initial order is deterministic.
        let mut prev = vec![INVALID; num_vars];
        let mut next = vec![INVALID; num_vars];
        let mut stamp = vec![0; num_vars];
        #[allow(clippy::cast_possible_truncation)]
        for i in 0..num_vars {
            prev[i] = if i + 1 < num_vars {
                (i + 1) as u32
            } else {
                INVALID
            };
            next[i] = if i > 0 { (i - 1) as u32 } else { INVALID };
            stamp[i] = (num_vars - i) as u64;
        }

        #[allow(clippy::cast_possible_truncation)]
        let tail = (num_vars - 1) as u32;
        Self {
            stamp,
            prev,
            next,
            head: 0,
            tail,
            search: 0,
            counter: num_vars as u64,
        }
    }

    /// The bump timestamp of `var`. Timestamps are globally unique.
    #[must_use]
    pub fn stamp_of(&self, var: Variable) -> u64 {
        self.stamp[var as usize]
    }

    /// Moves `var` to the front of the queue with a fresh timestamp.
    pub fn bump(&mut self, var: Variable) {
        self.counter += 1;
        self.stamp[var as usize] = self.counter;
        if var != self.head {
            self.dequeue(var);
            self.enqueue(var);
        }
    }

    /// Reports that `var` became unassigned. Moves the cursor to `var` if
    /// it is stamped more recently than the cursor's variable.
    pub fn update_on_unassign(&mut self, var: Variable) {
        if self.search == INVALID || self.stamp[var as usize] > self.stamp[self.search as usize] {
            self.search = var;
        }
    }

    /// Walks the cursor towards older stamps past assigned variables and
    /// returns the first unassigned one, or `None` if every variable is
    /// assigned.
    pub fn next_unassigned(&mut self, values: &Assignment) -> Option<Variable> {
        let mut idx = self.search;
        while idx != INVALID && values.is_assigned(idx) {
            idx = self.prev[idx as usize];
        }
        if idx == INVALID {
            return None;
        }
        self.search = idx;
        Some(idx)
    }

    fn dequeue(&mut self, var: Variable) {
        let p = self.prev[var as usize];
        let n = self.next[var as usize];
        if p == INVALID {
            self.tail = n;
        } else {
            self.next[p as usize] = n;
        }
        if n == INVALID {
            self.head = p;
        } else {
            self.prev[n as usize] = p;
        }
        // The cursor may not point at an unlinked variable.
        if self.search == var {
            self.search = if n != INVALID { n } else { self.head };
        }
    }

    fn enqueue(&mut self, var: Variable) {
        self.prev[var as usize] = self.head;
        self.next[var as usize] = INVALID;
        if self.head == INVALID {
            self.tail = var;
        } else {
            self.next[self.head as usize] = var;
        }
        self.head = var;
        if self.search == INVALID || self.stamp[var as usize] > self.stamp[self.search as usize] {
            self.search = var;
        }
    }
}
