//! # dpll-sat
//!
//! Command-line front end of the `dpll_sat` library: a DPLL SAT solver over either an
//! adjacency-list or a two-watched-literals formula representation.
//!
//! ## Inputs
//!
//! -   DIMACS CNF files (`.cnf`).
//! -   Propositional formulas in negation normal form (`.sat` files or inline text),
//!     written in prefix notation such as `(and a (or (not a) b))`. They are translated
//!     to CNF with the Tseitin encoding before solving.
//!
//! ## Usage
//!
//! ```sh
//! dpll-sat [OPTIONS] [PATH]
//! dpll-sat file --path <FILE> [OPTIONS]
//! dpll-sat text [--input "<FORMULA>"] [OPTIONS]
//! dpll-sat dir --path <DIR> [OPTIONS]
//! dpll-sat convert [--input <FILE>] [--output <FILE>] [-e]
//! dpll-sat completions <SHELL>
//! ```
//!
//! `dir` solves every `.cnf` file of a directory and writes `results.csv` next to them.
//! `convert` prints the Tseitin encoding of a formula as DIMACS.
//!
//! ## Options
//!
//! -   `-w, --watched-literals`: use the two-watched-literals representation.
//! -   `-e, --equivalence`: encode Tseitin equivalences instead of implications.
//! -   `--heuristic <take-first|random|jeroslow-wang>` and `--seed <N>`.
//! -   `-d, --debug`: debug logging (`RUST_LOG` overrides).
//! -   `--verify <BOOL>`, `--stats <BOOL>`: model verification and the statistics table,
//!     both on by default.
//! -   `-p, --print-solution`: print the model of a satisfiable formula.

mod command_line {
    pub(crate) mod cli;
}

use crate::command_line::cli::{
    Cli, CliError, Commands, completions, convert, solve_dir, solve_file, solve_text,
};
use clap::{CommandFactory, Parser};
use env_logger::{Builder, Env};
use log::error;
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Some(Commands::File { path, common }) => solve_file(&path, &common),
        Some(Commands::Text { input, common }) => solve_text(input, &common),
        Some(Commands::Dir { path, common }) => solve_dir(&path, &common),
        Some(Commands::Convert {
            input,
            output,
            common,
        }) => convert(input.as_deref(), output.as_deref(), &common),
        Some(Commands::Completions { shell }) => {
            completions(shell);
            Ok(())
        }
        None => match cli.path {
            Some(path) if path.is_dir() => solve_dir(&path, &cli.common),
            Some(path) => solve_file(&path, &cli.common),
            None => {
                Cli::command().print_help()?;
                Ok(())
            }
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let debug = cli
        .command
        .as_ref()
        .and_then(Commands::common)
        .unwrap_or(&cli.common)
        .debug;
    Builder::from_env(Env::default().default_filter_or(if debug { "debug" } else { "info" }))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
