#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Proof emission.
//!
//! The solver reports two kinds of events: a clause was derived, or a
//! clause was deleted. Sinks turn those into textual or binary DRAT. The
//! `Proof` front end holds an optional sink so the emission points in the
//! solver stay unconditional; the first stream failure is latched and
//! further events are dropped.

use crate::sat::literal::Literal;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Consumer of derivation and deletion events.
pub trait ProofSink {
    /// A clause was derived (learned or strengthened).
    ///
    /// # Errors
    ///
    /// Propagates stream failures.
    fn add_derived(&mut self, literals: &[Literal]) -> io::Result<()>;

    /// A clause was deleted.
    ///
    /// # Errors
    ///
    /// Propagates stream failures.
    fn delete_clause(&mut self, literals: &[Literal]) -> io::Result<()>;
}

/// Optional proof front end held by the solver.
#[derive(Default)]
pub struct Proof {
    sink: Option<Box<dyn ProofSink>>,
    error: Option<io::Error>,
}

impl std::fmt::Debug for Proof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proof")
            .field("enabled", &self.sink.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl Proof {
    /// A disabled proof; events are ignored.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A proof forwarding events to `sink`.
    #[must_use]
    pub fn new(sink: Box<dyn ProofSink>) -> Self {
        Self {
            sink: Some(sink),
            error: None,
        }
    }

    /// Reports a derived clause.
    pub fn add(&mut self, literals: &[Literal]) {
        if let Some(sink) = &mut self.sink {
            if let Err(e) = sink.add_derived(literals) {
                self.error = Some(e);
                self.sink = None;
            }
        }
    }

    /// Reports a deleted clause.
    pub fn delete(&mut self, literals: &[Literal]) {
        if let Some(sink) = &mut self.sink {
            if let Err(e) = sink.delete_clause(literals) {
                self.error = Some(e);
                self.sink = None;
            }
        }
    }

    /// The first stream failure, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

/// DRAT writer over any byte stream, in textual or binary format.
#[derive(Debug)]
pub struct DratWriter<W: Write> {
    out: W,
    binary: bool,
}

impl<W: Write> DratWriter<W> {
    /// Creates a writer. `binary` selects the compact binary format.
    pub const fn new(out: W, binary: bool) -> Self {
        Self { out, binary }
    }

    fn write_clause(&mut self, prefix: Option<u8>, literals: &[Literal]) -> io::Result<()> {
        if self.binary {
            self.out.write_all(&[prefix.unwrap_or(b'a')])?;
            for &l in literals {
                let mut x = binary_encoding(l);
                loop {
                    let byte = (x & 0x7f) as u8;
                    x >>= 7;
                    if x == 0 {
                        self.out.write_all(&[byte])?;
                        break;
                    }
                    self.out.write_all(&[byte | 0x80])?;
                }
            }
            self.out.write_all(&[0])
        } else {
            if let Some(p) = prefix {
                self.out.write_all(&[p, b' '])?;
            }
            for &l in literals {
                write!(self.out, "{} ", l.to_dimacs())?;
            }
            writeln!(self.out, "0")
        }
    }
}

/// The unsigned literal mapping of the binary DRAT format.
fn binary_encoding(l: Literal) -> u64 {
    let var = u64::from(l.variable()) + 1;
    2 * var + u64::from(l.is_negated())
}

impl<W: Write> ProofSink for DratWriter<W> {
    fn add_derived(&mut self, literals: &[Literal]) -> io::Result<()> {
        let prefix = if self.binary { Some(b'a') } else { None };
        self.write_clause(prefix, literals)
    }

    fn delete_clause(&mut self, literals: &[Literal]) -> io::Result<()> {
        self.write_clause(Some(b'd'), literals)
    }
}

/// In-memory sink that records events; shareable, for inspection after the
/// solver is done with it.
#[derive(Debug, Clone, Default)]
pub struct MemoryProof {
    events: Arc<Mutex<MemoryEvents>>,
}

#[derive(Debug, Default)]
struct MemoryEvents {
    additions: Vec<Vec<i32>>,
    deletions: Vec<Vec<i32>>,
}

impl MemoryProof {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All derived clauses so far, in DIMACS form.
    #[must_use]
    pub fn additions(&self) -> Vec<Vec<i32>> {
        self.events.lock().unwrap().additions.clone()
    }

    /// All deleted clauses so far, in DIMACS form.
    #[must_use]
    pub fn deletions(&self) -> Vec<Vec<i32>> {
        self.events.lock().unwrap().deletions.clone()
    }
}

impl ProofSink for MemoryProof {
    fn add_derived(&mut self, literals: &[Literal]) -> io::Result<()> {
        self.events
            .lock()
            .unwrap()
            .additions
            .push(literals.iter().map(|l| l.to_dimacs()).collect());
        Ok(())
    }

    fn delete_clause(&mut self, literals: &[Literal]) -> io::Result<()> {
        self.events
            .lock()
            .unwrap()
            .deletions
            .push(literals.iter().map(|l| l.to_dimacs()).collect());
        Ok(())
    }
}
