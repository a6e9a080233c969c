//! Stone packing solver
//!
//! Reads a problem file, packs its stones onto the board and writes one
//! answer line per stone. Progress is logged to stderr (`RUST_LOG` adjusts the
//! level); the answer goes to `-o` or stdout.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use stonepack::geometry::Orientation;
use stonepack::solver::Solver;
use stonepack::visualization::{self, GvWriter};
use stonepack::{grid, persistence, Answer, SolverConfig};

/// Packs polyomino stones onto a 32x32 board.
#[derive(Parser, Debug)]
#[command(name = "stonepack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Problem file.
    #[arg(short = 'i', value_name = "PATH")]
    input: PathBuf,

    /// Answer file. The answer goes to stdout when omitted or not writable.
    #[arg(short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Solver overrides as `key value` pairs, e.g. `-ex w 5 b 200`.
    #[arg(long = "ex", num_args = 0.., value_name = "KEY VALUE", allow_hyphen_values = true)]
    extra: Vec<String>,

    /// Write a gv trace replaying the best board to this file.
    #[arg(long, value_name = "PATH")]
    trace: Option<PathBuf>,
}

/// Accepts the single-dash `-ex` spelling.
fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| if arg == "-ex" { OsString::from("--ex") } else { arg })
        .collect()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    if cli.extra.len() % 2 != 0 {
        Cli::command()
            .error(ErrorKind::WrongNumberOfValues, "-ex takes key value pairs")
            .exit();
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> stonepack::Result<()> {
    let problem = persistence::read_problem(&cli.input)?;
    log::info!("{}: {} stones", cli.input.display(), problem.stone_count());

    let mut config = SolverConfig::default();
    config.apply_extra(
        cli.extra
            .chunks_exact(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str())),
    )?;

    let started = Instant::now();
    let solver = Solver::new(&problem, config)?;
    let best = solver.solve()?;
    log::info!(
        "best: {} empty cells with {} stones in {:.2?}",
        best.empty_count(),
        best.used_count(),
        started.elapsed()
    );
    log::debug!(
        "final board:\n{}",
        grid::format_board(solver.rules().blocked(Orientation::IDENTITY), best.field())
    );

    if let Some(path) = &cli.trace {
        match GvWriter::create(path) {
            Ok(mut writer) => visualization::render_replay(&mut writer, solver.rules(), &best),
            Err(err) => log::warn!("{err}; no trace written"),
        }
    }

    write_output(cli.output.as_deref(), &best.to_answer(solver.rules()))
}

/// Writes the answer to `path`, falling back to stdout.
fn write_output(path: Option<&Path>, answer: &Answer) -> stonepack::Result<()> {
    if let Some(path) = path {
        match persistence::save_answer(path, answer) {
            Ok(()) => {
                log::info!("wrote {}", path.display());
                return Ok(());
            }
            Err(err) => log::warn!("{err}; writing the answer to stdout"),
        }
    }
    persistence::write_answer(&mut io::stdout().lock(), answer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_single_dash_ex() {
        let args = normalize_args(["stonepack", "-i", "p.txt", "-o", "a.txt", "-ex", "w", "3", "b", "-1"]);
        let cli = Cli::try_parse_from(args).expect("valid arguments");
        assert_eq!(cli.input, PathBuf::from("p.txt"));
        assert_eq!(cli.output, Some(PathBuf::from("a.txt")));
        assert_eq!(cli.extra, ["w", "3", "b", "-1"]);
    }

    #[test]
    fn test_input_is_required() {
        let err = Cli::try_parse_from(normalize_args(["stonepack", "-o", "a.txt"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let err = Cli::try_parse_from(normalize_args(["stonepack", "-i", "p.txt", "-z"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
