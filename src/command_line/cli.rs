#![allow(clippy::cast_precision_loss)]

use dpll_sat::encoding::nnf::NnfError;
use dpll_sat::encoding::tseitin::TseitinTranslator;
use dpll_sat::sat::assignment::Assignment;
use dpll_sat::sat::cnf::CnfFormula;
use dpll_sat::sat::dimacs::{DimacsError, parse_file, write_dimacs};
use dpll_sat::sat::formula::{BacktrackableFormula, FormulaImpls, Representation};
use dpll_sat::sat::heuristic::HeuristicType;
use dpll_sat::sat::literal::Literal;
use dpll_sat::sat::solver::{SolutionStats, Solver};
use clap::{Args, CommandFactory, Parser, Subcommand};
use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tikv_jemalloc_ctl::{epoch, stats};

/// Command-line interface of the solver.
#[derive(Parser, Debug)]
#[command(name = "dpll-sat", version, about = "A DPLL SAT solver")]
pub(crate) struct Cli {
    /// Input file to solve when no subcommand is given: `.cnf` (DIMACS) or `.sat` (NNF).
    /// A directory is solved in batch mode.
    pub path: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a `.cnf` (DIMACS) or `.sat` (NNF) file.
    File {
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve an NNF formula given inline, e.g. "(and a (or (not a) b))".
    /// Reads one line from stdin when `--input` is absent.
    Text {
        #[arg(short, long)]
        input: Option<String>,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.cnf` file of a directory and write `results.csv` into it.
    Dir {
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Translate an NNF formula to DIMACS with the Tseitin encoding.
    Convert {
        /// NNF input file; stdin when absent.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// DIMACS output file; stdout when absent.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    pub(crate) const fn common(&self) -> Option<&CommonOptions> {
        match self {
            Self::File { common, .. }
            | Self::Text { common, .. }
            | Self::Dir { common, .. }
            | Self::Convert { common, .. } => Some(common),
            Self::Completions { .. } => None,
        }
    }
}

/// Options shared by every solving subcommand.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Use the two-watched-literals representation instead of adjacency lists.
    #[arg(short, long, default_value_t = false)]
    pub(crate) watched_literals: bool,

    /// Emit both directions of every Tseitin equivalence, not just the implications.
    #[arg(short, long, default_value_t = false)]
    pub(crate) equivalence: bool,

    #[arg(long, default_value_t = HeuristicType::TakeFirst)]
    pub(crate) heuristic: HeuristicType,

    /// Seed of the random heuristic.
    #[arg(long, default_value_t = 0)]
    pub(crate) seed: u64,

    /// Log at debug level.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Check a found model against the formula.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) verify: bool,

    /// Print problem and search statistics after solving.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the model of a satisfiable formula.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,
}

impl CommonOptions {
    pub(crate) const fn representation(&self) -> Representation {
        Representation::from_watched_flag(self.watched_literals)
    }
}

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Dimacs(#[from] DimacsError),
    #[error("invalid formula: {0}")]
    Nnf(#[from] NnfError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write results: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported input {}: expected a .cnf or .sat file", .0.display())]
    UnsupportedExtension(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("the model does not satisfy the formula")]
    VerificationFailed,
}

/// How an input file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputFormat {
    Dimacs,
    Nnf,
}

impl InputFormat {
    pub(crate) fn from_path(path: &Path) -> Result<Self, CliError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("cnf") => Ok(Self::Dimacs),
            Some("sat") => Ok(Self::Nnf),
            _ => Err(CliError::UnsupportedExtension(path.to_path_buf())),
        }
    }
}

/// A formula ready to solve.
#[derive(Debug, Clone)]
pub(crate) struct Problem {
    pub(crate) cnf: CnfFormula,
    pub(crate) format: InputFormat,
}

impl Problem {
    fn from_nnf(input: &str, common: &CommonOptions) -> Result<Self, CliError> {
        let translation = TseitinTranslator::new(common.equivalence).translate_str(input)?;
        Ok(Self {
            cnf: translation.cnf,
            format: InputFormat::Nnf,
        })
    }

    pub(crate) fn load(path: &Path, common: &CommonOptions) -> Result<Self, CliError> {
        match InputFormat::from_path(path)? {
            InputFormat::Dimacs => Ok(Self {
                cnf: parse_file(path)?,
                format: InputFormat::Dimacs,
            }),
            InputFormat::Nnf => Self::from_nnf(&fs::read_to_string(path)?, common),
        }
    }
}

/// What a single solve produced.
#[derive(Debug, Clone)]
pub(crate) struct Outcome {
    pub(crate) satisfiable: bool,
    pub(crate) model: Vec<Literal>,
    pub(crate) elapsed: Duration,
    pub(crate) stats: SolutionStats,
    /// Clause visits of watch maintenance, only tracked by the watched representation.
    pub(crate) checked_clauses: Option<usize>,
}

impl Outcome {
    const fn verdict(&self) -> &'static str {
        if self.satisfiable { "SAT" } else { "UNSAT" }
    }
}

pub(crate) fn solve(cnf: &CnfFormula, common: &CommonOptions) -> Outcome {
    let mut solver = Solver::with_heuristic(common.heuristic.to_impl(common.seed));

    let time = Instant::now();
    let formula = solver.solve_with(cnf, common.representation());
    let elapsed = time.elapsed();

    let checked_clauses = match &formula {
        FormulaImpls::WatchedLiterals(watched) => Some(watched.checked_clauses()),
        FormulaImpls::AdjacencyList(_) => None,
    };
    debug!("solved in {elapsed:?}");

    Outcome {
        satisfiable: !formula.is_unsatisfiable(),
        model: formula.assignment().collect(),
        elapsed,
        stats: solver.stats(&formula),
        checked_clauses,
    }
}

/// Literals of the model over named variables, `-name` for false ones. DIMACS input
/// is listed by variable number, NNF input in assignment order.
pub(crate) fn format_model(cnf: &CnfFormula, model: &[Literal], format: InputFormat) -> String {
    let variables = cnf.variables();
    let mut named: Vec<(Literal, &str)> = model
        .iter()
        .filter_map(|&literal| variables.name(literal.variable()).map(|name| (literal, name)))
        .collect();

    if format == InputFormat::Dimacs {
        named.sort_by_key(|(_, name)| name.parse::<u64>().unwrap_or(u64::MAX));
    }

    named
        .into_iter()
        .map(|(literal, name)| {
            if literal.is_positive() {
                name.to_string()
            } else {
                format!("-{name}")
            }
        })
        .join(", ")
}

pub(crate) fn verify_solution(cnf: &CnfFormula, outcome: &Outcome) -> Result<(), CliError> {
    if !outcome.satisfiable {
        return Ok(());
    }

    let model = Assignment::from_literals(cnf.num_vars(), outcome.model.iter().copied());
    let ok = cnf.verify(&model);
    println!("Verified: {ok:?}");
    if ok { Ok(()) } else { Err(CliError::VerificationFailed) }
}

fn memory_usage() -> Option<(f64, f64)> {
    const MIB: f64 = 1024.0 * 1024.0;
    epoch::advance().ok()?;
    let allocated = stats::allocated::mib().ok()?.read().ok()?;
    let resident = stats::resident::mib().ok()?.read().ok()?;
    Some((allocated as f64 / MIB, resident as f64 / MIB))
}

/// Solves `problem` and prints the verdict, the model and the statistics as configured.
///
/// # Errors
///
/// `CliError::VerificationFailed` when verification is enabled and the model is wrong.
pub(crate) fn solve_and_report(
    problem: &Problem,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Result<Outcome, CliError> {
    if let Some(name) = label {
        info!("Solving: {}", name.display());
    }
    debug!(
        "{} variables, {} clauses, {} representation, {} heuristic",
        problem.cnf.num_vars(),
        problem.cnf.len(),
        common.representation(),
        common.heuristic
    );

    let outcome = solve(&problem.cnf, common);
    let memory = memory_usage();

    println!("{}", outcome.verdict());
    if outcome.satisfiable && common.print_solution {
        println!();
        println!("Model:");
        println!("{}", format_model(&problem.cnf, &outcome.model, problem.format));
    }

    if common.verify {
        verify_solution(&problem.cnf, &outcome)?;
    }

    if common.stats {
        print_stats(parse_time, &problem.cnf, &outcome, common, memory);
    } else {
        println!(
            "Solving time: {:?}, decisions: {}, unit propagation steps: {}",
            outcome.elapsed, outcome.stats.decisions, outcome.stats.unit_propagation_steps
        );
    }

    Ok(outcome)
}

pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

pub(crate) fn print_stats(
    parse_time: Duration,
    cnf: &CnfFormula,
    outcome: &Outcome,
    common: &CommonOptions,
    memory: Option<(f64, f64)>,
) {
    let elapsed_secs = outcome.elapsed.as_secs_f64();
    let literals: usize = cnf.iter().map(|clause| clause.len()).sum();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars());
    stat_line("Clauses", cnf.len());
    stat_line("Literals", literals);

    println!("========================[ Search Statistics ]========================");
    stat_line("Representation", common.representation());
    stat_line("Heuristic", common.heuristic);
    stat_line_with_rate("Decisions", outcome.stats.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", outcome.stats.unit_propagation_steps, elapsed_secs);
    if let Some(checked) = outcome.checked_clauses {
        stat_line_with_rate("Checked clauses", checked, elapsed_secs);
    }
    if let Some((allocated, resident)) = memory {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}

/// Loads and solves one file.
///
/// # Errors
///
/// Unreadable or malformed input, or a failed verification.
pub(crate) fn solve_file(path: &Path, common: &CommonOptions) -> Result<(), CliError> {
    let time = Instant::now();
    let problem = Problem::load(path, common)?;
    let parse_time = time.elapsed();

    solve_and_report(&problem, common, Some(path), parse_time)?;
    Ok(())
}

/// Solves an inline NNF formula, or one line read from stdin.
///
/// # Errors
///
/// A malformed formula, a failed stdin read or a failed verification.
pub(crate) fn solve_text(input: Option<String>, common: &CommonOptions) -> Result<(), CliError> {
    let input = match input {
        Some(input) => input,
        None => io::stdin().lines().next().transpose()?.unwrap_or_default(),
    };

    let time = Instant::now();
    let problem = Problem::from_nnf(&input, common)?;
    let parse_time = time.elapsed();

    solve_and_report(&problem, common, None, parse_time)?;
    Ok(())
}

/// One line of `results.csv`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ResultRow {
    file: String,
    result: &'static str,
    /// Solving time in seconds.
    time: f64,
    decisions: usize,
    #[serde(rename = "unit propagation steps")]
    unit_propagation_steps: usize,
}

impl ResultRow {
    pub(crate) fn new(file: String, outcome: &Outcome) -> Self {
        Self {
            file,
            result: outcome.verdict(),
            time: outcome.elapsed.as_secs_f64(),
            decisions: outcome.stats.decisions,
            unit_propagation_steps: outcome.stats.unit_propagation_steps,
        }
    }
}

/// Solves every `.cnf` file directly inside `path`, in file name order, and records
/// one row per file in `path/results.csv`.
///
/// # Errors
///
/// `path` is not a directory, a file cannot be parsed, or the report cannot be written.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<(), CliError> {
    if !path.is_dir() {
        return Err(CliError::NotADirectory(path.to_path_buf()));
    }

    let mut writer = csv::Writer::from_path(path.join("results.csv"))?;

    for entry in walkdir::WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !entry.file_type().is_file() || file_path.extension().is_none_or(|ext| ext != "cnf") {
            debug!("Skipping non-CNF entry: {}", file_path.display());
            continue;
        }

        let time = Instant::now();
        let problem = Problem {
            cnf: parse_file(file_path)?,
            format: InputFormat::Dimacs,
        };
        let parse_time = time.elapsed();

        let outcome = solve_and_report(&problem, common, Some(file_path), parse_time)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        writer.serialize(ResultRow::new(name, &outcome))?;
        writer.flush()?;
    }

    Ok(())
}

/// Writes the Tseitin encoding of an NNF formula as DIMACS.
///
/// # Errors
///
/// Unreadable input, a malformed formula or a failed write.
pub(crate) fn convert(
    input: Option<&Path>,
    output: Option<&Path>,
    common: &CommonOptions,
) -> Result<(), CliError> {
    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let translation = TseitinTranslator::new(common.equivalence).translate_str(&text)?;
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    write_dimacs(&mut writer, &translation.cnf, Some(translation.root))?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn completions(shell: clap_complete::Shell) {
    clap_complete::generate(shell, &mut Cli::command(), "dpll-sat", &mut io::stdout());
}
