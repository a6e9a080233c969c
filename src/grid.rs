//! Fixed-size board layers.
//!
//! A board is stored as three independent layers so each can be copied and
//! reoriented cheaply:
//! - [`BitBoard`]: one bit per cell (occupancy, or the blocked cells of a problem)
//! - [`Field`]: per-cell stone label, `0` for empty and `id + 1` for stone `id`
//! - [`UsedMask`]: one bit per stone id

use crate::geometry::{on_board, Orientation, Point, SymmetryTransform, BOARD_CELLS, BOARD_DIM};

/// Index of a stone in the problem's stone list.
pub type StoneId = u8;

/// Largest number of stones a problem may carry (`StoneId` range).
pub const MAX_STONES: usize = 256;

const BOARD_WORDS: usize = BOARD_CELLS / 64;

/// A 1024-bit set over the cells of the board, row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitBoard([u64; BOARD_WORDS]);

impl BitBoard {
    pub const EMPTY: Self = Self([0; BOARD_WORDS]);

    #[inline(always)]
    pub fn get(&self, cell: usize) -> bool {
        self.0[cell >> 6] >> (cell & 63) & 1 != 0
    }

    #[inline(always)]
    pub fn set(&mut self, cell: usize) {
        self.0[cell >> 6] |= 1 << (cell & 63);
    }

    #[inline(always)]
    pub fn clear(&mut self, cell: usize) {
        self.0[cell >> 6] &= !(1 << (cell & 63));
    }

    pub fn count(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|&word| word != 0)
    }

    /// Iterates the indices of set cells in ascending (raster) order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(w * 64 + bit)
            })
        })
    }

    /// Returns a copy with every set cell moved from orientation `from` to `to`.
    pub fn transformed(&self, sym: &SymmetryTransform, from: Orientation, to: Orientation) -> Self {
        let mut result = Self::EMPTY;
        for cell in self.iter_ones() {
            result.set(sym.transform_index(from, to, cell));
        }
        result
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Per-cell stone labels.
///
/// Label `0` marks an empty cell; stone `id` is stored as `id + 1` so that
/// stone 0 is distinguishable from an empty cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Field([[u16; BOARD_DIM]; BOARD_DIM]);

impl Field {
    pub const EMPTY: Self = Self([[0; BOARD_DIM]; BOARD_DIM]);

    /// The stone at `(x, y)`, or `None` for empty and off-board cells.
    #[inline(always)]
    pub fn stone_at(&self, x: i32, y: i32) -> Option<StoneId> {
        if !on_board(x, y) {
            return None;
        }
        match self.0[y as usize][x as usize] {
            0 => None,
            label => Some((label - 1) as StoneId),
        }
    }

    #[inline(always)]
    pub fn label(&self, p: Point) -> u16 {
        self.0[p.y as usize][p.x as usize]
    }

    #[inline(always)]
    pub fn place(&mut self, p: Point, stone: StoneId) {
        self.0[p.y as usize][p.x as usize] = stone as u16 + 1;
    }

    #[inline(always)]
    pub fn remove(&mut self, p: Point) {
        self.0[p.y as usize][p.x as usize] = 0;
    }

    pub fn transformed(&self, sym: &SymmetryTransform, from: Orientation, to: Orientation) -> Self {
        let mut result = Self::EMPTY;
        for (y, row) in self.0.iter().enumerate() {
            for (x, &label) in row.iter().enumerate() {
                let q = sym.transform(from, to, Point::new(x as i8, y as i8));
                result.0[q.y as usize][q.x as usize] = label;
            }
        }
        result
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// The set of stone ids currently on the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct UsedMask([u64; MAX_STONES / 64]);

impl UsedMask {
    #[inline(always)]
    pub fn contains(&self, stone: StoneId) -> bool {
        self.0[stone as usize >> 6] >> (stone & 63) & 1 != 0
    }

    #[inline(always)]
    pub fn insert(&mut self, stone: StoneId) {
        self.0[stone as usize >> 6] |= 1 << (stone & 63);
    }

    #[inline(always)]
    pub fn remove(&mut self, stone: StoneId) {
        self.0[stone as usize >> 6] &= !(1 << (stone & 63));
    }

    pub fn count(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&word| word == 0)
    }
}

/// Digit used for a stone id when rendering a board (base 62, wrapping).
fn stone_char(stone: StoneId) -> char {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    DIGITS[stone as usize % DIGITS.len()] as char
}

/// Formats a board as 32 text rows.
///
/// Blocked cells show as `#`, empty cells as `.`, and placed cells as the
/// stone id in base 62 (ids wrap past 61).
pub fn format_board(blocked: &BitBoard, field: &Field) -> String {
    let mut output = String::with_capacity(BOARD_CELLS + BOARD_DIM);
    for y in 0..BOARD_DIM as i32 {
        for x in 0..BOARD_DIM as i32 {
            let cell = Point::from_i32(x, y).index();
            let display_char = match field.stone_at(x, y) {
                Some(stone) => stone_char(stone),
                None if blocked.get(cell) => '#',
                None => '.',
            };
            output.push(display_char);
        }
        output.push('\n');
    }
    output
}
