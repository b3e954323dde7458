#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Error types surfaced to callers.
//!
//! SAT and UNSAT are ordinary results and never errors; these variants
//! cover malformed input, stream failures, bad configuration, exhausted
//! resources, and external interruption.

use thiserror::Error;

/// Everything that can go wrong outside of normal solving.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed DIMACS input.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending input.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// Input or proof stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown or out-of-range option.
    #[error("configuration error: {0}")]
    Config(String),

    /// Allocation failure or memory ceiling exceeded.
    #[error("resource exhausted: {0}")]
    Resource(String),

    /// The termination flag was observed.
    #[error("interrupted")]
    Interrupted,
}

/// Result alias for solver operations.
pub type Result<T> = std::result::Result<T, Error>;
