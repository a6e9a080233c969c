//! Zobrist-style board hashing.
//!
//! Every (cell, stone size) pair gets a random 32-bit key. A board hash is the
//! XOR of the keys of its occupied cells, always measured in orientation 0, so
//! placing and removing a stone update the hash with the same XORs and a
//! reoriented board keeps its hash.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::BOARD_CELLS;

/// Largest stone size the table has keys for (a full 8x8 box).
pub const MAX_STONE_CELLS: usize = 64;

pub struct FieldHash {
    /// `[cell][size - 1]`, flattened.
    table: Vec<u32>,
}

impl FieldHash {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let table = (0..BOARD_CELLS * MAX_STONE_CELLS)
            .map(|_| rng.random::<u32>())
            .collect();
        Self { table }
    }

    /// Key for `cell` (orientation-0 index) covered by a stone of `size` cells.
    #[inline(always)]
    pub fn get(&self, cell: usize, size: usize) -> u32 {
        debug_assert!(cell < BOARD_CELLS);
        debug_assert!((1..=MAX_STONE_CELLS).contains(&size), "stone size {size}");
        self.table[cell * MAX_STONE_CELLS + size - 1]
    }
}
