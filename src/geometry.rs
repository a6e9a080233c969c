//! Board coordinates and the symmetry group of the square.
//!
//! A square has 8 symmetries (the dihedral group of order 8): the four
//! clockwise quarter turns, and the same four applied after a horizontal
//! mirror. Orientation `o` decomposes as `(mirror, quarter turns) = (o / 4, o % 4)`,
//! which is also how placements are reported in the answer format.
//!
//! The same eight maps reorient an 8x8 stone box and the whole 32x32 board.

use std::cmp::Ordering;
use std::ops::{Add, Sub};

/// Width and height of the board.
pub const BOARD_DIM: usize = 32;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = BOARD_DIM * BOARD_DIM;

/// Width and height of the box a stone shape is drawn in.
pub const STONE_DIM: usize = 8;

/// The four edge neighbours of a cell.
pub const NEIGHBORS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Returns true if `(x, y)` lies on the 32x32 board.
#[inline(always)]
pub const fn on_board(x: i32, y: i32) -> bool {
    (x as u32) < BOARD_DIM as u32 && (y as u32) < BOARD_DIM as u32
}

/// A small signed coordinate.
///
/// Stone offsets range over `x in -7..=7`, `y in 0..=7`; anchored points lie
/// on the board. Points order by row first (`y`, then `x`), i.e. raster order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i8,
    pub y: i8,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// Builds a point from wide coordinates known to fit.
    #[inline]
    pub fn from_i32(x: i32, y: i32) -> Self {
        debug_assert!((-128..128).contains(&x) && (-128..128).contains(&y));
        Self::new(x as i8, y as i8)
    }

    #[inline]
    pub const fn is_on_board(self) -> bool {
        on_board(self.x as i32, self.y as i32)
    }

    /// Row-major cell index. Only meaningful for on-board points.
    #[inline(always)]
    pub fn index(self) -> usize {
        debug_assert!(self.is_on_board(), "{self:?} is off the board");
        (self.y as usize) << 5 | self.x as usize
    }

    #[inline(always)]
    pub fn from_index(index: usize) -> Self {
        debug_assert!(index < BOARD_CELLS);
        Self::new((index & 0x1f) as i8, (index >> 5) as i8)
    }

    /// Packs the point into 16 bits: `y` in the high byte, `x` in the low byte.
    #[inline]
    pub const fn pack(self) -> u16 {
        (self.y as u8 as u16) << 8 | self.x as u8 as u16
    }

    #[inline]
    pub const fn unpack(packed: u16) -> Self {
        Self::new(packed as u8 as i8, (packed >> 8) as u8 as i8)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The eight orientation maps over a square box whose largest coordinate is `m`.
///
/// Indices 0-3 are clockwise quarter turns (in screen coordinates, `y` down),
/// indices 4-7 apply a horizontal mirror `x -> m - x` first and then the same
/// turns. The index mapping is relied on by the answer format.
pub const ORIENTATIONS: [fn(i32, i32, i32) -> (i32, i32); 8] = [
    // plain
    |x, y, _| (x, y),        // 0 degrees
    |x, y, m| (m - y, x),    // 90 degrees
    |x, y, m| (m - x, m - y), // 180 degrees
    |x, y, m| (y, m - x),    // 270 degrees
    // mirrored, then turned
    |x, y, m| (m - x, y),
    |x, y, m| (m - y, m - x),
    |x, y, m| (x, m - y),
    |x, y, _| (y, x),
];

/// One element of the symmetry group of the square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Orientation(u8);

impl Orientation {
    pub const IDENTITY: Self = Self(0);

    pub const COUNT: usize = 8;

    pub const ALL: [Self; 8] = [
        Self(0),
        Self(1),
        Self(2),
        Self(3),
        Self(4),
        Self(5),
        Self(6),
        Self(7),
    ];

    /// Returns `None` for indices outside `0..8`.
    pub const fn new(index: u8) -> Option<Self> {
        if index < 8 {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn from_parts(mirrored: bool, quarter_turns: u8) -> Self {
        Self((mirrored as u8) * 4 + quarter_turns % 4)
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_mirrored(self) -> bool {
        self.0 >= 4
    }

    pub const fn quarter_turns(self) -> u8 {
        self.0 % 4
    }

    /// Adds clockwise quarter turns while keeping the mirror flag.
    pub const fn rotated(self, turns: u8) -> Self {
        Self::from_parts(self.is_mirrored(), (self.0 + turns) % 4)
    }

    /// The next orientation by index, wrapping after 7.
    pub const fn next(self) -> Self {
        Self((self.0 + 1) % 8)
    }

    /// Applies this orientation to `(x, y)` inside a `dim` x `dim` box.
    #[inline]
    pub fn apply(self, x: i32, y: i32, dim: i32) -> (i32, i32) {
        ORIENTATIONS[self.index()](x, y, dim - 1)
    }
}

/// Lookup tables mapping board cells between any two orientations.
///
/// `transform(from, to, p)` takes a point expressed in a board that has been
/// reoriented by `from` and returns where it sits once the board is reoriented
/// by `to` instead. Both are measured from orientation 0, so the tables compose:
/// `transform(b, c, transform(a, b, p)) == transform(a, c, p)`.
pub struct SymmetryTransform {
    /// `[from][to][cell]`, flattened.
    table: Vec<u16>,
}

impl SymmetryTransform {
    pub fn new() -> Self {
        let dim = BOARD_DIM as i32;
        let mut table = vec![0u16; Orientation::COUNT * Orientation::COUNT * BOARD_CELLS];

        for from in Orientation::ALL {
            for to in Orientation::ALL {
                let base = Self::slot(from, to);
                for cell in 0..BOARD_CELLS {
                    let p = Point::from_index(cell);
                    let (fx, fy) = from.apply(p.x as i32, p.y as i32, dim);
                    let (tx, ty) = to.apply(p.x as i32, p.y as i32, dim);
                    table[base + Point::from_i32(fx, fy).index()] =
                        Point::from_i32(tx, ty).index() as u16;
                }
            }
        }

        Self { table }
    }

    #[inline(always)]
    fn slot(from: Orientation, to: Orientation) -> usize {
        (from.index() * Orientation::COUNT + to.index()) * BOARD_CELLS
    }

    #[inline]
    pub fn transform_index(&self, from: Orientation, to: Orientation, cell: usize) -> usize {
        self.table[Self::slot(from, to) + cell] as usize
    }

    #[inline]
    pub fn transform(&self, from: Orientation, to: Orientation, p: Point) -> Point {
        Point::from_index(self.transform_index(from, to, p.index()))
    }
}

impl Default for SymmetryTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mirror then turn, spelled out step by step.
    fn compose_by_steps(o: Orientation, x: i32, y: i32, m: i32) -> (i32, i32) {
        let (mut x, mut y) = if o.is_mirrored() { (m - x, y) } else { (x, y) };
        for _ in 0..o.quarter_turns() {
            (x, y) = (m - y, x);
        }
        (x, y)
    }

    #[test]
    fn test_orientation_table_matches_mirror_then_turns() {
        for o in Orientation::ALL {
            for y in 0..8 {
                for x in 0..8 {
                    assert_eq!(
                        o.apply(x, y, 8),
                        compose_by_steps(o, x, y, 7),
                        "orientation {o:?} disagrees at ({x},{y})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_identity_transform_is_unchanged() {
        let sym = SymmetryTransform::new();
        for o in Orientation::ALL {
            for cell in 0..BOARD_CELLS {
                assert_eq!(sym.transform_index(o, o, cell), cell, "{o:?} moved cell {cell}");
            }
        }
    }

    #[test]
    fn test_transforms_are_permutations() {
        let sym = SymmetryTransform::new();
        for from in Orientation::ALL {
            for to in Orientation::ALL {
                let mut seen = vec![false; BOARD_CELLS];
                for cell in 0..BOARD_CELLS {
                    let dest = sym.transform_index(from, to, cell);
                    assert!(!seen[dest], "{from:?}->{to:?} maps two cells to {dest}");
                    seen[dest] = true;
                }
            }
        }
    }

    #[test]
    fn test_transforms_compose() {
        let sym = SymmetryTransform::new();
        for a in Orientation::ALL {
            for b in Orientation::ALL {
                for c in Orientation::ALL {
                    for cell in 0..BOARD_CELLS {
                        let p = Point::from_index(cell);
                        assert_eq!(
                            sym.transform(b, c, sym.transform(a, b, p)),
                            sym.transform(a, c, p),
                            "composition fails for {a:?}->{b:?}->{c:?} at {p:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_transform_from_identity_matches_orientation_map() {
        let sym = SymmetryTransform::new();
        let p = Point::new(3, 10);
        assert_eq!(sym.transform(Orientation::IDENTITY, Orientation::ALL[1], p), Point::new(21, 3));
        assert_eq!(sym.transform(Orientation::IDENTITY, Orientation::ALL[4], p), Point::new(28, 10));
    }

    #[test]
    fn test_point_pack_roundtrip_and_order() {
        for p in [Point::new(-7, 0), Point::new(7, 7), Point::new(31, 31), Point::ORIGIN] {
            assert_eq!(Point::unpack(p.pack()), p);
        }
        assert!(Point::new(5, 0) < Point::new(-3, 1), "rows order before columns");
        assert!(Point::new(-3, 1) < Point::new(0, 1));
    }

    #[test]
    fn test_on_board_bounds() {
        assert!(on_board(0, 0));
        assert!(on_board(31, 31));
        assert!(!on_board(-1, 0));
        assert!(!on_board(0, 32));
    }

    #[test]
    fn test_orientation_parts() {
        let o = Orientation::from_parts(true, 3);
        assert_eq!(o.index(), 7);
        assert!(o.is_mirrored());
        assert_eq!(o.rotated(2), Orientation::from_parts(true, 1));
        assert_eq!(Orientation::ALL[7].next(), Orientation::IDENTITY);
        assert_eq!(Orientation::new(8), None);
    }
}
