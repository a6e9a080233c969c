//! Final placements in answer-file terms.

use crate::geometry::{Orientation, Point};
use crate::grid::StoneId;
use crate::stones::{Put, StonePatternTable};

/// Where a stone ends up: the top-left corner of its reoriented 8x8 box.
///
/// `x` and `y` may be negative when the stone's drawing does not start in the
/// top-left corner of its box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub stone: StoneId,
    pub x: i32,
    pub y: i32,
    pub orientation: Orientation,
}

impl Placement {
    /// Converts an anchored move into box coordinates.
    pub fn from_put(put: Put, patterns: &StonePatternTable) -> Self {
        let origin = patterns.pattern(put.stone, put.orientation).origin();
        Self {
            stone: put.stone,
            x: put.x as i32 - origin.x as i32,
            y: put.y as i32 - origin.y as i32,
            orientation: put.orientation,
        }
    }

    /// Converts back into an anchored move.
    pub fn to_put(self, patterns: &StonePatternTable) -> Put {
        let origin = patterns.pattern(self.stone, self.orientation).origin();
        let anchor = Point::from_i32(self.x + origin.x as i32, self.y + origin.y as i32);
        Put::new(self.stone, anchor.x, anchor.y, self.orientation)
    }

    /// `'H'` for a plain stone, `'T'` for a mirrored one.
    pub fn flip_flag(self) -> char {
        if self.orientation.is_mirrored() {
            'T'
        } else {
            'H'
        }
    }

    /// Clockwise rotation in degrees.
    pub fn degrees(self) -> u32 {
        self.orientation.quarter_turns() as u32 * 90
    }
}

/// Placements of one result, kept sorted by stone id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Answer {
    stone_count: usize,
    placements: Vec<Placement>,
}

impl Answer {
    pub fn new(stone_count: usize) -> Self {
        Self {
            stone_count,
            placements: Vec::new(),
        }
    }

    /// Records a placement; each stone may be placed at most once.
    pub fn place(&mut self, placement: Placement) {
        debug_assert!((placement.stone as usize) < self.stone_count);
        match self
            .placements
            .binary_search_by_key(&placement.stone, |p| p.stone)
        {
            Ok(_) => debug_assert!(false, "stone {} placed twice", placement.stone),
            Err(position) => self.placements.insert(position, placement),
        }
    }

    pub fn placement(&self, stone: StoneId) -> Option<&Placement> {
        self.placements
            .binary_search_by_key(&stone, |p| p.stone)
            .ok()
            .map(|i| &self.placements[i])
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Number of stones in the problem, placed or not.
    pub fn stone_count(&self) -> usize {
        self.stone_count
    }

    /// Number of stones placed.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stones::stone_from_rows;

    #[test]
    fn test_placements_stay_sorted() {
        let mut answer = Answer::new(4);
        for stone in [3, 0, 2] {
            answer.place(Placement {
                stone,
                x: 0,
                y: 0,
                orientation: Orientation::IDENTITY,
            });
        }
        let order: Vec<StoneId> = answer.placements().iter().map(|p| p.stone).collect();
        assert_eq!(order, vec![0, 2, 3]);
        assert!(answer.placement(1).is_none());
        assert_eq!(answer.len(), 3);
    }

    #[test]
    fn test_put_conversion_uses_pattern_origin() {
        let patterns =
            StonePatternTable::build(&[stone_from_rows(&["00000", "00100", "00110"])]).expect("valid");
        let put = Put::new(0, 10, 4, Orientation::IDENTITY);
        let placement = Placement::from_put(put, &patterns);
        assert_eq!((placement.x, placement.y), (8, 3));
        assert_eq!(placement.to_put(&patterns), put);
        assert_eq!(placement.flip_flag(), 'H');
        assert_eq!(placement.degrees(), 0);

        let mirrored = Placement {
            orientation: Orientation::from_parts(true, 3),
            ..placement
        };
        assert_eq!((mirrored.flip_flag(), mirrored.degrees()), ('T', 270));
    }
}
