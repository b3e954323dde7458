//! The `corvid` binary: parse DIMACS, solve, report.

use clap::Parser;

mod command_line;

use command_line::cli::{run, Cli};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("c error: {e}");
            std::process::exit(1);
        }
    }
}
