//! Error type shared by the problem parser, the configuration layer and the solver.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A problem, answer or trace file could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The problem text ended before all rows were read.
    #[error("problem input ended early: expected {expected}")]
    Truncated { expected: &'static str },

    #[error("line {line}: expected a row of {expected} cells, found {found}")]
    BadRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid stone count {token:?}")]
    BadStoneCount { line: usize, token: String },

    #[error("{count} stones exceed the limit of {max}")]
    TooManyStones { count: usize, max: usize },

    #[error("stone {0} has no occupied cells")]
    EmptyStone(usize),

    #[error("invalid value {value:?} for option {key:?}")]
    BadOption { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
