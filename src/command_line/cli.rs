#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The command-line interface.
//!
//! Output follows the SAT competition shape: an `s` line with the result,
//! `v` lines with the model on satisfiable instances, everything else as
//! `c` comment lines. Exit codes are 10 (SAT), 20 (UNSAT) and 0
//! (unknown).

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use corvid::sat::cdcl::Cdcl;
use corvid::sat::cnf::Cnf;
use corvid::sat::config::Options;
use corvid::sat::dimacs::{parse_dimacs_text, parse_file};
use corvid::sat::error::{Error, Result};
use corvid::sat::proof::DratWriter;
use corvid::sat::solver::{Solutions, Solver, Stats, Status};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Command-line definition.
#[derive(Parser, Debug)]
#[command(name = "corvid", version, about = "A conflict-driven clause-learning SAT solver")]
pub(crate) struct Cli {
    /// Path to a DIMACS .cnf file, or a directory of them.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        file: PathBuf,
    },

    /// Solve a CNF formula provided as plain text.
    Text {
        /// DIMACS input as a string, e.g. "p cnf 2 1\n1 -2 0".
        #[arg(short, long)]
        input: String,
    },

    /// Solve every .cnf file under a directory.
    Dir {
        /// The directory to scan.
        dir: PathBuf,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by all solving commands.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct CommonOptions {
    /// Print solver statistics after solving.
    #[arg(short, long, global = true)]
    pub(crate) stats: bool,

    /// Increase verbosity; repeat for more.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub(crate) verbose: u8,

    /// Write a DRAT proof trace to this file.
    #[arg(long, global = true)]
    pub(crate) proof: Option<PathBuf>,

    /// Use the binary DRAT format instead of the textual one.
    #[arg(long, global = true)]
    pub(crate) binary_proof: bool,

    /// Check the model against the original clauses before reporting SAT.
    #[arg(long, global = true)]
    pub(crate) check_model: bool,

    /// Suppress the model ('v') lines.
    #[arg(short = 'n', long, global = true)]
    pub(crate) no_model: bool,

    /// Set a solver option, e.g. --set restart_margin=1.2.
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    pub(crate) set: Vec<String>,
}

/// Dispatches the parsed command line. Returns the process exit code.
pub(crate) fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Some(Commands::File { file }) => solve_path(file, &cli.common),
        Some(Commands::Text { input }) => {
            let start = Instant::now();
            let cnf = parse_dimacs_text(input)?;
            solve_and_report(cnf, &cli.common, start.elapsed())
        }
        Some(Commands::Dir { dir }) => solve_dir(dir, &cli.common),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "corvid", &mut io::stdout());
            Ok(0)
        }
        None => match &cli.path {
            Some(path) if path.is_dir() => solve_dir(path, &cli.common),
            Some(path) => solve_path(path, &cli.common),
            None => Err(Error::Config(
                "no input given; pass a .cnf file or see --help".into(),
            )),
        },
    }
}

fn build_options(common: &CommonOptions) -> Result<Options> {
    let mut opts = Options::default();
    for entry in &common.set {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("expected KEY=VALUE, got '{entry}'")))?;
        opts.set(key, value)?;
    }
    if common.check_model {
        opts.check_model = true;
    }
    if common.proof.is_some() {
        opts.proof = true;
    }
    opts.verbose = opts.verbose.max(u32::from(common.verbose));
    Ok(opts)
}

fn solve_path(path: &Path, common: &CommonOptions) -> Result<i32> {
    let start = Instant::now();
    let cnf = parse_file(path)?;
    solve_and_report(cnf, common, start.elapsed())
}

fn solve_and_report(cnf: Cnf, common: &CommonOptions, parse_time: Duration) -> Result<i32> {
    let opts = build_options(common)?;
    let mut solver = Cdcl::new(cnf, opts);

    if let Some(proof_path) = &common.proof {
        let file = std::fs::File::create(proof_path)?;
        solver.set_proof(Box::new(DratWriter::new(
            BufWriter::new(file),
            common.binary_proof,
        )));
    }

    let start = Instant::now();
    let status = solver.solve()?;
    let elapsed = start.elapsed();

    println!("s {status}");
    if status == Status::Satisfiable && !common.no_model {
        print_model(&solver.solutions());
    }
    if common.stats {
        print_stats(&solver.stats(), parse_time, elapsed);
    }
    Ok(status.exit_code())
}

fn solve_dir(path: &Path, common: &CommonOptions) -> Result<i32> {
    for entry in walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() || file_path.extension().is_none_or(|ext| ext != "cnf") {
            continue;
        }
        println!("c solving {}", file_path.display());
        solve_path(file_path, common)?;
    }
    Ok(0)
}

/// Prints the model as `v` lines terminated by 0.
fn print_model(solutions: &Solutions) {
    let mut values: Vec<i32> = solutions.iter().copied().collect();
    values.push(0);
    for chunk in values.chunks(12) {
        let line = chunk
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        println!("v {line}");
    }
}

fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("c |  {label:<24} {value:>16}  |");
}

#[allow(clippy::cast_precision_loss)]
fn stat_line_with_rate(label: &str, value: u64, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("c |  {label:<16} {value:>12} ({rate:>9.0}/sec)  |");
}

#[allow(clippy::cast_precision_loss)]
fn print_stats(stats: &Stats, parse_time: Duration, elapsed: Duration) {
    let elapsed_secs = elapsed.as_secs_f64();

    println!("c ====================[ statistics ]====================");
    stat_line("parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line_with_rate("conflicts", stats.conflicts, elapsed_secs);
    stat_line_with_rate("decisions", stats.decisions, elapsed_secs);
    stat_line_with_rate("propagations", stats.propagations, elapsed_secs);
    stat_line_with_rate("restarts", stats.restarts, elapsed_secs);
    stat_line("blocked restarts", stats.blocked_restarts);
    stat_line("reductions", stats.reductions);
    stat_line("learned clauses", stats.learned);
    stat_line("fixed variables", stats.fixed);
    stat_line(
        "clause storage (MiB)",
        format!("{:.2}", stats.clause_bytes as f64 / (1024.0 * 1024.0)),
    );
    print_memory_stats();
    stat_line("solve time (s)", format!("{elapsed_secs:.3}"));
    println!("c ======================================================");
}

#[cfg(not(target_env = "msvc"))]
#[allow(clippy::cast_precision_loss)]
fn print_memory_stats() {
    use tikv_jemalloc_ctl::{epoch, stats as jstats};
    if epoch::advance().is_ok() {
        if let Ok(allocated) = jstats::allocated::read() {
            stat_line(
                "allocated (MiB)",
                format!("{:.2}", allocated as f64 / (1024.0 * 1024.0)),
            );
        }
        if let Ok(resident) = jstats::resident::read() {
            stat_line(
                "resident (MiB)",
                format!("{:.2}", resident as f64 / (1024.0 * 1024.0)),
            );
        }
    }
}

#[cfg(target_env = "msvc")]
fn print_memory_stats() {}
