#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Solver options.
//!
//! A flat configuration with defaults mirroring the usual competition
//! settings. Options can be assigned by key with `set`; unknown keys and
//! out-of-range values are configuration errors.

use crate::sat::error::{Error, Result};
use std::str::FromStr;

/// All tunable solver parameters.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
    /// Conflicts before the first clause-database reduction.
    pub reduce_interval: i64,
    /// Arithmetic increment of the reduction interval.
    pub reduce_inc: i64,
    /// Conflicts between restart checks.
    pub restart_interval: i64,
    /// How much the fast glue average must exceed the slow one to restart.
    pub restart_margin: f64,
    /// How much the trail must exceed its moving average to block a
    /// restart.
    pub blocking_margin: f64,
    /// Smoothing factor of the fast glue average.
    pub fast_glue_alpha: f64,
    /// Smoothing factor of the slow glue average.
    pub slow_glue_alpha: f64,
    /// Recursion limit of learned-clause minimization.
    pub minimize_depth: u32,
    /// Learned clauses with glue at most this are never reduced away.
    pub small_glue: u32,
    /// Initial decision phase for never-assigned variables.
    pub phase: bool,
    /// Reuse the matching trail prefix on restart.
    pub reuse_trail: bool,
    /// Verbosity of progress reports (0 = quiet).
    pub verbose: u32,
    /// Emit proof events to the configured sink.
    pub proof: bool,
    /// Verify the model against the original clauses before reporting SAT.
    pub check_model: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reduce_interval: 2000,
            reduce_inc: 300,
            restart_interval: 50,
            restart_margin: 1.1,
            blocking_margin: 1.4,
            fast_glue_alpha: 1.0 / 32.0,
            slow_glue_alpha: 1e-5,
            minimize_depth: 1000,
            small_glue: 2,
            phase: false,
            reuse_trail: true,
            verbose: 0,
            proof: false,
            check_model: false,
        }
    }
}

impl Options {
    /// Assigns the option named `key` from its string representation.
    ///
    /// # Errors
    ///
    /// `Error::Config` for unknown keys, unparsable values, or values
    /// outside the option's range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "reduce_interval" => self.reduce_interval = parse_min(key, value, 1)?,
            "reduce_inc" => self.reduce_inc = parse_min(key, value, 0)?,
            "restart_interval" => self.restart_interval = parse_min(key, value, 1)?,
            "restart_margin" => self.restart_margin = parse_positive(key, value)?,
            "blocking_margin" => self.blocking_margin = parse_positive(key, value)?,
            "fast_glue_alpha" => self.fast_glue_alpha = parse_alpha(key, value)?,
            "slow_glue_alpha" => self.slow_glue_alpha = parse_alpha(key, value)?,
            "minimize_depth" => self.minimize_depth = parse(key, value)?,
            "small_glue" => self.small_glue = parse(key, value)?,
            "phase" => self.phase = parse(key, value)?,
            "reuse_trail" => self.reuse_trail = parse(key, value)?,
            "verbose" => self.verbose = parse(key, value)?,
            "proof" => self.proof = parse(key, value)?,
            "check_model" => self.check_model = parse(key, value)?,
            _ => return Err(Error::Config(format!("unknown option '{key}'"))),
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid value '{value}' for option '{key}'")))
}

fn parse_min(key: &str, value: &str, min: i64) -> Result<i64> {
    let parsed: i64 = parse(key, value)?;
    if parsed < min {
        return Err(Error::Config(format!(
            "option '{key}' must be at least {min}"
        )));
    }
    Ok(parsed)
}

fn parse_positive(key: &str, value: &str) -> Result<f64> {
    let parsed: f64 = parse(key, value)?;
    if !(parsed > 0.0) {
        return Err(Error::Config(format!("option '{key}' must be positive")));
    }
    Ok(parsed)
}

fn parse_alpha(key: &str, value: &str) -> Result<f64> {
    let parsed: f64 = parse(key, value)?;
    if !(parsed > 0.0 && parsed <= 1.0) {
        return Err(Error::Config(format!(
            "option '{key}' must lie in (0, 1]"
        )));
    }
    Ok(parsed)
}
