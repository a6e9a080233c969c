//! Stone packing solver library
//!
//! Packs polyomino stones onto a 32x32 board with blocked cells, leaving as
//! few empty cells as possible. Every stone after the first must touch an
//! earlier-ordered stone. The search is a bucketed beam search run from each
//! of the 8 board orientations.

pub mod answer;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod persistence;
pub mod pool;
pub mod rules;
pub mod solver;
pub mod state;
pub mod stones;
pub mod visualization;
pub mod zobrist;

pub use answer::{Answer, Placement};
pub use config::{PlacementOrder, SolverConfig};
pub use error::{Error, Result};
pub use stones::Problem;

/// Solves `problem` and returns the placements in board coordinates.
pub fn solve(problem: &Problem, config: SolverConfig) -> Result<Answer> {
    let solver = solver::Solver::new(problem, config)?;
    let best = solver.solve()?;
    Ok(best.to_answer(solver.rules()))
}
