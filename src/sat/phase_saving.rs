#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::Variable;

/// Last polarity each variable was assigned to.
///
/// Decisions re-pick the saved polarity; variables never assigned so far get
/// the configured initial phase.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SavedPhases {
    saved: Vec<Option<bool>>,
    initial: bool,
}

impl SavedPhases {
    pub(crate) fn new(n: usize, initial: bool) -> Self {
        Self {
            saved: vec![None; n],
            initial,
        }
    }

    pub(crate) fn save(&mut self, var: Variable, b: bool) {
        self.saved[var as usize] = Some(b);
    }

    pub(crate) fn next(&self, var: Variable) -> bool {
        self.saved[var as usize].unwrap_or(self.initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase() {
        let phases = SavedPhases::new(3, false);
        assert!(!phases.next(0));
        let phases = SavedPhases::new(3, true);
        assert!(phases.next(0));
    }

    #[test]
    fn test_saved_phase_wins() {
        let mut phases = SavedPhases::new(3, false);
        phases.save(1, true);
        assert!(phases.next(1));
        assert!(!phases.next(0));
        phases.save(1, false);
        assert!(!phases.next(1));
    }
}
