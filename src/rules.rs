//! The immutable search context.
//!
//! Everything derived from the problem and the configuration lives here, built
//! once and then shared by reference with every [`GameState`](crate::state::GameState)
//! operation and every search run (including runs on other threads).

use crate::config::{PlacementOrder, SolverConfig};
use crate::error::Result;
use crate::geometry::{Orientation, Point, SymmetryTransform, BOARD_CELLS};
use crate::grid::BitBoard;
use crate::stones::{Problem, StonePatternTable};
use crate::zobrist::FieldHash;

pub struct Rules {
    pub patterns: StonePatternTable,
    pub symmetry: SymmetryTransform,
    pub field_hash: FieldHash,
    /// Blocked cells of the problem, one board per orientation.
    blocked: [BitBoard; Orientation::COUNT],
    default_empty_count: i16,
    pub weight_diff_id: i32,
    pub order: PlacementOrder,
}

impl Rules {
    pub fn new(problem: &Problem, config: &SolverConfig) -> Result<Self> {
        let patterns = StonePatternTable::build(&problem.stones)?;
        let symmetry = SymmetryTransform::new();
        let field_hash = FieldHash::new(config.hash_seed);

        let mut base = BitBoard::EMPTY;
        for (y, row) in problem.blocked.iter().enumerate() {
            for (x, &blocked) in row.iter().enumerate() {
                if blocked {
                    base.set(Point::new(x as i8, y as i8).index());
                }
            }
        }
        let blocked = Orientation::ALL.map(|o| base.transformed(&symmetry, Orientation::IDENTITY, o));
        let default_empty_count = (BOARD_CELLS - base.count()) as i16;

        Ok(Self {
            patterns,
            symmetry,
            field_hash,
            blocked,
            default_empty_count,
            weight_diff_id: config.weight_diff_id,
            order: config.order,
        })
    }

    /// Blocked cells as seen in `orientation`.
    #[inline(always)]
    pub fn blocked(&self, orientation: Orientation) -> &BitBoard {
        &self.blocked[orientation.index()]
    }

    /// Empty cells of a board with no stones placed.
    pub fn default_empty_count(&self) -> i16 {
        self.default_empty_count
    }

    pub fn stone_count(&self) -> usize {
        self.patterns.stone_count()
    }

    /// Hash key of a cell given in `orientation`, covered by a stone of `size` cells.
    #[inline(always)]
    pub fn cell_hash(&self, orientation: Orientation, cell: usize, size: usize) -> u32 {
        let base_cell = self
            .symmetry
            .transform_index(orientation, Orientation::IDENTITY, cell);
        self.field_hash.get(base_cell, size)
    }
}
