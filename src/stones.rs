//! Problem definition, placements, and the precomputed stone pattern table.
//!
//! Each stone is drawn in an 8x8 box. For every stone and every one of the 8
//! orientations the table stores the occupied cells as offsets from the
//! stone's anchor (its first occupied cell in raster order), so a placement is
//! fully described by `(stone, anchor cell, orientation)`.

use crate::error::{Error, Result};
use crate::geometry::{Orientation, Point, BOARD_DIM, STONE_DIM};
use crate::grid::{StoneId, MAX_STONES};

/// An 8x8 stone drawing, indexed `[y][x]`.
pub type StoneShape = [[bool; STONE_DIM]; STONE_DIM];

/// Largest horizontal offset of a cell from its anchor; offsets span `-7..=7`.
pub const MAX_OFFSET: i32 = STONE_DIM as i32 - 1;

/// Columns of the candidate window around an anchor (`-7..=7`).
const WINDOW_WIDTH: usize = 2 * STONE_DIM - 1;

/// An immutable packing problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    /// Permanently blocked cells, indexed `[y][x]`.
    pub blocked: [[bool; BOARD_DIM]; BOARD_DIM],
    /// Stones in id order.
    pub stones: Vec<StoneShape>,
}

impl Problem {
    pub fn new(blocked: [[bool; BOARD_DIM]; BOARD_DIM], stones: Vec<StoneShape>) -> Self {
        Self { blocked, stones }
    }

    pub fn stone_count(&self) -> usize {
        self.stones.len()
    }
}

/// A candidate or applied move: stone `stone` with orientation `orientation`,
/// its anchor on cell `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Put {
    pub stone: StoneId,
    pub x: i8,
    pub y: i8,
    pub orientation: Orientation,
}

impl Put {
    pub const fn new(stone: StoneId, x: i8, y: i8, orientation: Orientation) -> Self {
        Self {
            stone,
            x,
            y,
            orientation,
        }
    }

    #[inline]
    pub const fn anchor(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Packs the move into 32 bits: stone, y, x, orientation from low to high byte.
    pub const fn pack(self) -> u32 {
        self.stone as u32
            | (self.y as u8 as u32) << 8
            | (self.x as u8 as u32) << 16
            | (self.orientation.index() as u32) << 24
    }

    pub fn unpack(packed: u32) -> Self {
        let orientation = Orientation::ALL[(packed >> 24) as usize & 7];
        Self::new(
            packed as u8,
            (packed >> 16) as u8 as i8,
            (packed >> 8) as u8 as i8,
            orientation,
        )
    }
}

/// One orientation of one stone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StonePattern {
    /// Anchor position inside the reoriented 8x8 box.
    origin: Point,
    /// Occupied cells relative to the anchor, sorted; the first is always `(0, 0)`.
    offsets: Vec<Point>,
    /// Set when an earlier orientation of the same stone has identical offsets.
    duplicate: bool,
}

impl StonePattern {
    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn offsets(&self) -> &[Point] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate
    }
}

/// Draws a stone from text rows, `'1'` marking an occupied cell.
///
/// Rows and columns beyond 8 are ignored; missing ones stay empty.
pub fn stone_from_rows(rows: &[&str]) -> StoneShape {
    let mut result = [[false; STONE_DIM]; STONE_DIM];
    for (y, row) in rows.iter().take(STONE_DIM).enumerate() {
        for (x, c) in row.chars().take(STONE_DIM).enumerate() {
            result[y][x] = c == '1';
        }
    }
    result
}

/// Reorients an 8x8 drawing.
fn orient_shape(shape: &StoneShape, orientation: Orientation) -> StoneShape {
    let mut result = [[false; STONE_DIM]; STONE_DIM];
    for (y, row) in shape.iter().enumerate() {
        for (x, &filled) in row.iter().enumerate() {
            if filled {
                let (nx, ny) = orientation.apply(x as i32, y as i32, STONE_DIM as i32);
                result[ny as usize][nx as usize] = true;
            }
        }
    }
    result
}

/// Extracts `(anchor, offsets)` from a drawing, scanning in raster order.
fn extract_offsets(shape: &StoneShape) -> Option<(Point, Vec<Point>)> {
    let cells: Vec<Point> = (0..STONE_DIM)
        .flat_map(|y| (0..STONE_DIM).map(move |x| (x, y)))
        .filter(|&(x, y)| shape[y][x])
        .map(|(x, y)| Point::new(x as i8, y as i8))
        .collect();
    let origin = *cells.first()?;
    let offsets = cells.into_iter().map(|cell| cell - origin).collect();
    Some((origin, offsets))
}

/// Build-once lookup of every stone's orientations.
///
/// Alongside the patterns the table keeps, for each cell of the candidate
/// window (`dx in -7..=7`, `dy in 0..=7` around an anchor), a bitmask over
/// `stone * 8 + orientation` of the patterns that cover that cell. If a window
/// cell is unusable, OR-ing its mask rules out every pattern that needs it.
/// Duplicate orientations are set in every window mask, so any obstruction
/// near the anchor discards them too.
pub struct StonePatternTable {
    /// `[stone * 8 + orientation]`.
    patterns: Vec<StonePattern>,
    /// `[dy][dx + 7][word]`, flattened.
    masks: Vec<u64>,
    /// Words per mask.
    words: usize,
}

impl StonePatternTable {
    pub fn build(stones: &[StoneShape]) -> Result<Self> {
        if stones.len() > MAX_STONES {
            return Err(Error::TooManyStones {
                count: stones.len(),
                max: MAX_STONES,
            });
        }

        let words = (stones.len() * Orientation::COUNT).div_ceil(64);
        let mut masks = vec![0u64; STONE_DIM * WINDOW_WIDTH * words];
        let mut patterns = Vec::with_capacity(stones.len() * Orientation::COUNT);

        for (stone, shape) in stones.iter().enumerate() {
            let first = patterns.len();
            for orientation in Orientation::ALL {
                let (origin, offsets) = extract_offsets(&orient_shape(shape, orientation))
                    .ok_or(Error::EmptyStone(stone))?;
                let slot = stone * Orientation::COUNT + orientation.index();
                let (word, bit) = (slot / 64, 1u64 << (slot % 64));

                // identical shapes of different stones are tracked independently
                let duplicate = patterns[first..]
                    .iter()
                    .any(|earlier: &StonePattern| earlier.offsets == offsets);

                if duplicate {
                    for window_cell in 0..STONE_DIM * WINDOW_WIDTH {
                        masks[window_cell * words + word] |= bit;
                    }
                } else {
                    for offset in &offsets {
                        let window_cell = offset.y as usize * WINDOW_WIDTH
                            + (offset.x as i32 + MAX_OFFSET) as usize;
                        masks[window_cell * words + word] |= bit;
                    }
                }

                patterns.push(StonePattern {
                    origin,
                    offsets,
                    duplicate,
                });
            }
        }

        Ok(Self {
            patterns,
            masks,
            words,
        })
    }

    pub fn stone_count(&self) -> usize {
        self.patterns.len() / Orientation::COUNT
    }

    #[inline(always)]
    pub fn pattern(&self, stone: StoneId, orientation: Orientation) -> &StonePattern {
        &self.patterns[stone as usize * Orientation::COUNT + orientation.index()]
    }

    /// Number of cells of a stone (the same in every orientation).
    #[inline]
    pub fn cell_count(&self, stone: StoneId) -> usize {
        self.pattern(stone, Orientation::IDENTITY).len()
    }

    /// Words in each window mask.
    pub fn words(&self) -> usize {
        self.words
    }

    /// Mask of the patterns that cover window cell `(dx, dy)`.
    #[inline(always)]
    pub fn window_mask(&self, dx: i32, dy: i32) -> &[u64] {
        debug_assert!((-MAX_OFFSET..=MAX_OFFSET).contains(&dx));
        debug_assert!((0..STONE_DIM as i32).contains(&dy));
        let start = (dy as usize * WINDOW_WIDTH + (dx + MAX_OFFSET) as usize) * self.words;
        &self.masks[start..start + self.words]
    }

    /// The first non-duplicate orientation of `stone` whose offsets equal `offsets`.
    pub fn find_orientation(&self, stone: StoneId, offsets: &[Point]) -> Option<Orientation> {
        Orientation::ALL.into_iter().find(|&orientation| {
            let pattern = self.pattern(stone, orientation);
            !pattern.is_duplicate() && pattern.offsets() == offsets
        })
    }
}

/// Formats a pattern on its tight bounding box, `#` for covered cells and `.`
/// otherwise; the anchor is drawn as `@`.
pub fn format_pattern(pattern: &StonePattern) -> String {
    let offsets = pattern.offsets();
    let min_x = offsets.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = offsets.iter().map(|p| p.x).max().unwrap_or(0);
    let max_y = offsets.iter().map(|p| p.y).max().unwrap_or(0);

    let mut output = String::new();
    for y in 0..=max_y {
        for x in min_x..=max_x {
            let p = Point::new(x, y);
            let display_char = if p == Point::ORIGIN {
                '@'
            } else if offsets.contains(&p) {
                '#'
            } else {
                '.'
            };
            output.push(display_char);
        }
        output.push('\n');
    }
    output
}
