//! A single board configuration and its move rules.
//!
//! A `GameState` is a fixed-size value (no heap data), so cloning it is a
//! plain memory copy. It only remembers which stone covers each cell, not the
//! order or orientation stones were placed in; [`GameState::placements`]
//! recovers those from the board.

use crate::answer::{Answer, Placement};
use crate::config::PlacementOrder;
use crate::geometry::{on_board, Orientation, Point, BOARD_DIM, NEIGHBORS, STONE_DIM};
use crate::grid::{BitBoard, Field, StoneId, UsedMask};
use crate::rules::Rules;
use crate::stones::{Put, MAX_OFFSET};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    used: UsedMask,
    occupied: BitBoard,
    field: Field,
    /// XOR of the hash keys of every occupied cell, in orientation 0.
    hash: u32,
    score: i32,
    empty_count: i16,
    orientation: Orientation,
}

impl GameState {
    /// An empty board in orientation 0.
    pub fn new(rules: &Rules) -> Self {
        Self {
            used: UsedMask::default(),
            occupied: BitBoard::EMPTY,
            field: Field::EMPTY,
            hash: 0,
            score: 0,
            empty_count: rules.default_empty_count(),
            orientation: Orientation::IDENTITY,
        }
    }

    /// Resets to an empty board in orientation 0 without reallocating.
    pub fn reset(&mut self, rules: &Rules) {
        *self = Self::new(rules);
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn add_score(&mut self, delta: i32) {
        self.score = self.score.saturating_add(delta);
    }

    pub fn empty_count(&self) -> i16 {
        self.empty_count
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn used(&self) -> &UsedMask {
        &self.used
    }

    pub fn used_count(&self) -> usize {
        self.used.count()
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn occupied(&self) -> &BitBoard {
        &self.occupied
    }

    pub fn is_first_stone(&self) -> bool {
        self.used.is_empty()
    }

    pub fn is_used(&self, stone: StoneId) -> bool {
        self.used.contains(stone)
    }

    /// The stone covering `(x, y)`; `None` for empty, blocked and off-board cells.
    #[inline(always)]
    pub fn stone_at(&self, x: i32, y: i32) -> Option<StoneId> {
        self.field.stone_at(x, y)
    }

    #[inline(always)]
    pub fn is_stone(&self, x: i32, y: i32) -> bool {
        on_board(x, y) && self.occupied.get(Point::from_i32(x, y).index())
    }

    #[inline(always)]
    pub fn is_blocked(&self, rules: &Rules, x: i32, y: i32) -> bool {
        on_board(x, y) && rules.blocked(self.orientation).get(Point::from_i32(x, y).index())
    }

    /// True for on-board cells that are neither blocked nor covered.
    #[inline(always)]
    pub fn is_empty_cell(&self, rules: &Rules, x: i32, y: i32) -> bool {
        if !on_board(x, y) {
            return false;
        }
        let cell = Point::from_i32(x, y).index();
        !self.occupied.get(cell) && !rules.blocked(self.orientation).get(cell)
    }

    /// Checks whether `put` is a legal move.
    ///
    /// A move is legal when the stone exists and is unused, the orientation is
    /// not a duplicate of an earlier one, every covered cell is on the board and
    /// empty, and (unless the board has no stones yet) some covered cell has an
    /// edge neighbour whose stone precedes this one under `order`.
    pub fn available(&self, rules: &Rules, put: Put, order: PlacementOrder) -> bool {
        if put.stone as usize >= rules.stone_count() || self.is_used(put.stone) {
            return false;
        }
        let pattern = rules.patterns.pattern(put.stone, put.orientation);
        if pattern.is_duplicate() {
            return false;
        }

        let mut touches = self.is_first_stone();
        for offset in pattern.offsets() {
            let x = put.x as i32 + offset.x as i32;
            let y = put.y as i32 + offset.y as i32;
            if !self.is_empty_cell(rules, x, y) {
                return false;
            }
            if !touches {
                touches = NEIGHBORS.iter().any(|&(dx, dy)| {
                    self.stone_at(x + dx, y + dy)
                        .is_some_and(|neighbor| order.precedes(neighbor, put.stone))
                });
            }
        }
        touches
    }

    /// Applies a move. The caller must have checked it with [`Self::available`].
    pub fn put(&mut self, rules: &Rules, put: Put) {
        let pattern = rules.patterns.pattern(put.stone, put.orientation);
        let size = pattern.len();
        debug_assert!(size > 0);
        debug_assert!(!self.used.contains(put.stone), "stone {} already used", put.stone);

        for &offset in pattern.offsets() {
            let p = put.anchor() + offset;
            let cell = p.index();
            debug_assert_eq!(self.field.label(p), 0, "cell {p:?} already covered");
            debug_assert!(!self.occupied.get(cell));
            self.field.place(p, put.stone);
            self.occupied.set(cell);
            self.hash ^= rules.cell_hash(self.orientation, cell, size);
        }
        self.used.insert(put.stone);
        self.empty_count -= size as i16;
    }

    /// Exactly reverts a [`Self::put`] of the same move.
    pub fn undo(&mut self, rules: &Rules, put: Put) {
        let pattern = rules.patterns.pattern(put.stone, put.orientation);
        let size = pattern.len();
        debug_assert!(size > 0);
        debug_assert!(self.used.contains(put.stone), "stone {} not on the board", put.stone);

        for &offset in pattern.offsets() {
            let p = put.anchor() + offset;
            let cell = p.index();
            debug_assert_eq!(self.field.label(p), put.stone as u16 + 1, "cell {p:?} mismatch");
            debug_assert!(self.occupied.get(cell));
            self.field.remove(p);
            self.occupied.clear(cell);
            self.hash ^= rules.cell_hash(self.orientation, cell, size);
        }
        self.used.remove(put.stone);
        self.empty_count += size as i16;
    }

    /// The hash this state would have after `put`, without applying it.
    pub fn pre_hash(&self, rules: &Rules, put: Put) -> u32 {
        let pattern = rules.patterns.pattern(put.stone, put.orientation);
        let size = pattern.len();
        pattern.offsets().iter().fold(self.hash, |hash, &offset| {
            hash ^ rules.cell_hash(self.orientation, (put.anchor() + offset).index(), size)
        })
    }

    /// Every legal move whose anchor sits on `(x, y)`.
    ///
    /// Window cells around the anchor that are unusable contribute their
    /// pattern masks, which rules out whole groups of (stone, orientation)
    /// pairs before the per-move check.
    pub fn available_list(&self, rules: &Rules, x: i32, y: i32) -> Vec<Put> {
        debug_assert!(on_board(x, y));
        let patterns = &rules.patterns;
        let mut excluded = vec![0u64; patterns.words()];
        for dy in 0..STONE_DIM as i32 {
            for dx in -MAX_OFFSET..=MAX_OFFSET {
                if !self.is_empty_cell(rules, x + dx, y + dy) {
                    for (acc, &word) in excluded.iter_mut().zip(patterns.window_mask(dx, dy)) {
                        *acc |= word;
                    }
                }
            }
        }

        let slots = rules.stone_count() * Orientation::COUNT;
        let mut list = Vec::new();
        for (w, &word) in excluded.iter().enumerate() {
            let mut candidates = !word;
            while candidates != 0 {
                let slot = w * 64 + candidates.trailing_zeros() as usize;
                candidates &= candidates - 1;
                if slot >= slots {
                    break;
                }
                let stone = (slot / Orientation::COUNT) as StoneId;
                if self.is_used(stone) {
                    continue;
                }
                let orientation = Orientation::ALL[slot % Orientation::COUNT];
                let put = Put::new(stone, x as i8, y as i8, orientation);
                if self.available(rules, put, rules.order) {
                    list.push(put);
                }
            }
        }
        list
    }

    /// Heuristic value of a move: squared stone size minus an id penalty.
    ///
    /// The first stone pays its squared rank in the placement order, so small
    /// ids (or large ids when descending) go first. Later stones pay
    /// `weight_diff_id` times the widest id gap to a preceding neighbour.
    pub fn simple_score(&self, rules: &Rules, put: Put) -> i32 {
        let pattern = rules.patterns.pattern(put.stone, put.orientation);
        let size = pattern.len() as i32;
        let stone = put.stone as i32;
        let mut score = size * size;

        if self.is_first_stone() {
            let rank = match rules.order {
                PlacementOrder::Ascending => stone,
                PlacementOrder::Descending => rules.stone_count() as i32 - 1 - stone,
            };
            score -= rank * rank;
        } else {
            let mut widest_gap = None;
            for offset in pattern.offsets() {
                let x = put.x as i32 + offset.x as i32;
                let y = put.y as i32 + offset.y as i32;
                for (dx, dy) in NEIGHBORS {
                    if let Some(neighbor) = self.stone_at(x + dx, y + dy) {
                        if rules.order.precedes(neighbor, put.stone) {
                            let gap = (stone - neighbor as i32).abs();
                            widest_gap = widest_gap.max(Some(gap));
                        }
                    }
                }
            }
            if let Some(gap) = widest_gap {
                score = score.saturating_sub(rules.weight_diff_id.saturating_mul(gap));
            }
        }
        score
    }

    /// Reorients the whole board. The hash is orientation independent and
    /// stays as is.
    pub fn transform_to(&mut self, rules: &Rules, to: Orientation) {
        if self.orientation == to {
            return;
        }
        self.field = self.field.transformed(&rules.symmetry, self.orientation, to);
        self.occupied = self.occupied.transformed(&rules.symmetry, self.orientation, to);
        self.orientation = to;
    }

    /// Adds clockwise quarter turns to the current orientation.
    pub fn rotate(&mut self, rules: &Rules, turns: u8) {
        self.transform_to(rules, self.orientation.rotated(turns));
    }

    pub fn transform_to_default(&mut self, rules: &Rules) {
        self.transform_to(rules, Orientation::IDENTITY);
    }

    /// Recovers one move per stone on the board, in the current orientation,
    /// ordered by anchor in raster order.
    ///
    /// A stone's anchor is its first cell in raster order; its cells all lie in
    /// the `-7..=7` x `0..=7` window from there, and their offsets identify
    /// the orientation.
    pub fn placements(&self, rules: &Rules) -> Vec<Put> {
        let mut pending = self.used;
        let mut puts = Vec::with_capacity(self.used.count());

        for y in 0..BOARD_DIM as i32 {
            for x in 0..BOARD_DIM as i32 {
                let Some(stone) = self.stone_at(x, y) else {
                    continue;
                };
                if !pending.contains(stone) {
                    continue;
                }
                pending.remove(stone);

                let mut offsets = Vec::new();
                for sy in 0..STONE_DIM as i32 {
                    for sx in -MAX_OFFSET..=MAX_OFFSET {
                        if self.stone_at(x + sx, y + sy) == Some(stone) {
                            offsets.push(Point::from_i32(sx, sy));
                        }
                    }
                }
                offsets.sort();

                match rules.patterns.find_orientation(stone, &offsets) {
                    Some(orientation) => {
                        puts.push(Put::new(stone, x as i8, y as i8, orientation));
                    }
                    None => debug_assert!(false, "stone {stone} at ({x},{y}) matches no orientation"),
                }
            }
        }
        puts
    }

    /// Builds the answer for this board, measured in orientation 0.
    pub fn to_answer(&self, rules: &Rules) -> Answer {
        let mut state = self.clone();
        state.transform_to_default(rules);
        let mut answer = Answer::new(rules.stone_count());
        for put in state.placements(rules) {
            answer.place(Placement::from_put(put, &rules.patterns));
        }
        answer
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::stones::{stone_from_rows, Problem, StoneShape};

    pub(crate) fn rules_for(blocked_rows: &[(usize, usize)], stones: Vec<StoneShape>) -> Rules {
        rules_with(blocked_rows, stones, &SolverConfig::default())
    }

    pub(crate) fn rules_with(
        blocked_rows: &[(usize, usize)],
        stones: Vec<StoneShape>,
        config: &SolverConfig,
    ) -> Rules {
        let mut blocked = [[false; BOARD_DIM]; BOARD_DIM];
        for &(x, y) in blocked_rows {
            blocked[y][x] = true;
        }
        Rules::new(&Problem::new(blocked, stones), config).expect("valid problem")
    }

    fn tetromino_stones() -> Vec<StoneShape> {
        vec![
            stone_from_rows(&["11", "11"]),
            stone_from_rows(&["10", "10", "11"]),
            stone_from_rows(&["010", "111"]),
            stone_from_rows(&["1"]),
            stone_from_rows(&["1111"]),
        ]
    }

    fn tetromino_rules() -> Rules {
        rules_for(&[(5, 5), (6, 5)], tetromino_stones())
    }

    /// Plays the first legal move anchored at the first cell that has one,
    /// repeatedly, returning the moves applied.
    fn greedy_fill(rules: &Rules, state: &mut GameState, limit: usize) -> Vec<Put> {
        let mut played = Vec::new();
        'outer: while played.len() < limit {
            for cell in 0..BOARD_DIM * BOARD_DIM {
                let p = Point::from_index(cell);
                let moves = state.available_list(rules, p.x as i32, p.y as i32);
                if let Some(&put) = moves.first() {
                    state.put(rules, put);
                    played.push(put);
                    continue 'outer;
                }
            }
            break;
        }
        played
    }

    #[test]
    fn test_new_state_counts_blocked_cells() {
        let rules = tetromino_rules();
        let state = GameState::new(&rules);
        assert_eq!(state.empty_count(), 1022);
        assert!(state.is_first_stone());
        assert!(state.is_blocked(&rules, 5, 5));
        assert!(!state.is_empty_cell(&rules, 6, 5));
        assert!(!state.is_empty_cell(&rules, -1, 0));
    }

    #[test]
    fn test_put_then_undo_restores_state() {
        let rules = tetromino_rules();
        let mut state = GameState::new(&rules);
        let first = Put::new(1, 3, 3, Orientation::ALL[2]);
        assert!(state.available(&rules, first, PlacementOrder::Ascending));
        state.put(&rules, first);

        let before = state.clone();
        let moves: Vec<Put> = state
            .available_list(&rules, 5, 3)
            .into_iter()
            .chain(state.available_list(&rules, 3, 4))
            .collect();
        assert!(!moves.is_empty());
        for put in moves {
            state.put(&rules, put);
            assert_ne!(state, before);
            state.undo(&rules, put);
            assert_eq!(state, before, "undo of {put:?} did not restore the board");
        }
    }

    #[test]
    fn test_put_decreases_empty_count_by_stone_size() {
        let rules = tetromino_rules();
        let mut state = GameState::new(&rules);
        let played = greedy_fill(&rules, &mut state, 5);
        assert!(!played.is_empty());

        let mut replay = GameState::new(&rules);
        for put in played {
            let before = replay.empty_count();
            replay.put(&rules, put);
            let size = rules.patterns.cell_count(put.stone) as i16;
            assert_eq!(replay.empty_count(), before - size);
            assert!(replay.empty_count() >= 0);
        }
        assert_eq!(replay, state);
    }

    #[test]
    fn test_pre_hash_matches_put() {
        let rules = tetromino_rules();
        let mut state = GameState::new(&rules);
        let put = Put::new(4, 0, 0, Orientation::IDENTITY);
        let predicted = state.pre_hash(&rules, put);
        state.put(&rules, put);
        assert_eq!(state.hash(), predicted);
        assert_ne!(predicted, 0);
    }

    #[test]
    fn test_hash_is_orientation_independent() {
        let rules = tetromino_rules();
        let mut state = GameState::new(&rules);
        greedy_fill(&rules, &mut state, 3);
        let hash = state.hash();
        for o in Orientation::ALL {
            state.transform_to(&rules, o);
            assert_eq!(state.hash(), hash);
        }
    }

    #[test]
    fn test_available_rejects_illegal_moves() {
        let rules = tetromino_rules();
        let mut state = GameState::new(&rules);
        let order = PlacementOrder::Ascending;

        // off the board, over a blocked cell, unknown stone
        assert!(!state.available(&rules, Put::new(4, 29, 0, Orientation::IDENTITY), order));
        assert!(!state.available(&rules, Put::new(3, 5, 5, Orientation::IDENTITY), order));
        assert!(!state.available(&rules, Put::new(9, 0, 0, Orientation::IDENTITY), order));

        state.put(&rules, Put::new(2, 10, 10, Orientation::IDENTITY));
        // reuse, overlap
        assert!(!state.available(&rules, Put::new(2, 20, 20, Orientation::IDENTITY), order));
        assert!(!state.available(&rules, Put::new(3, 10, 10, Orientation::IDENTITY), order));
        // detached from every stone
        assert!(!state.available(&rules, Put::new(3, 20, 20, Orientation::IDENTITY), order));
        // touching, but the neighbour id is larger
        assert!(!state.available(&rules, Put::new(0, 12, 10, Orientation::IDENTITY), order));
        assert!(state.available(&rules, Put::new(0, 12, 10, Orientation::IDENTITY), PlacementOrder::Descending));
        // touching a smaller id
        assert!(state.available(&rules, Put::new(3, 10, 9, Orientation::IDENTITY), order));
        // duplicate orientation of a symmetric stone
        assert!(!state.available(&rules, Put::new(3, 10, 9, Orientation::ALL[1]), order));
    }

    #[test]
    fn test_available_list_is_exactly_the_legal_moves() {
        let rules = tetromino_rules();
        let mut state = GameState::new(&rules);
        state.put(&rules, Put::new(0, 4, 3, Orientation::IDENTITY));

        for (x, y) in [(6, 3), (4, 5), (3, 4), (0, 0)] {
            let listed = state.available_list(&rules, x, y);
            let mut brute = Vec::new();
            for stone in 0..rules.stone_count() as StoneId {
                for o in Orientation::ALL {
                    let put = Put::new(stone, x as i8, y as i8, o);
                    if state.available(&rules, put, rules.order) {
                        brute.push(put);
                    }
                }
            }
            assert_eq!(listed, brute, "candidate list at ({x},{y})");
        }
    }

    #[test]
    fn test_simple_score() {
        let rules = tetromino_rules();
        let mut state = GameState::new(&rules);
        let square = Put::new(0, 0, 0, Orientation::IDENTITY);
        assert_eq!(state.simple_score(&rules, square), 16);
        assert_eq!(state.simple_score(&rules, Put::new(2, 0, 0, Orientation::IDENTITY)), 16 - 4);
        state.put(&rules, square);

        // straight tetromino below the square: gap 4 to stone 0
        let bar = Put::new(4, 0, 2, Orientation::IDENTITY);
        assert!(state.available(&rules, bar, rules.order));
        assert_eq!(state.simple_score(&rules, bar), 16 - 5 * 4);
    }

    #[test]
    fn test_simple_score_descending() {
        let config = SolverConfig {
            order: PlacementOrder::Descending,
            ..SolverConfig::default()
        };
        let rules = rules_with(&[(5, 5), (6, 5)], tetromino_stones(), &config);
        let mut state = GameState::new(&rules);

        // first stone pays (n - 1 - id)^2
        let bar = Put::new(4, 0, 0, Orientation::IDENTITY);
        assert_eq!(state.simple_score(&rules, bar), 16);
        assert_eq!(state.simple_score(&rules, Put::new(2, 0, 0, Orientation::IDENTITY)), 16 - 4);
        assert_eq!(state.simple_score(&rules, Put::new(0, 0, 0, Orientation::IDENTITY)), 0);
        state.put(&rules, bar);

        // T under the bar: one larger neighbour, gap 2
        let tee = Put::new(2, 1, 1, Orientation::IDENTITY);
        assert!(state.available(&rules, tee, rules.order));
        assert_eq!(state.simple_score(&rules, tee), 16 - 5 * 2);
        state.put(&rules, tee);

        // square touching the bar (gap 4) and the T (gap 2): the widest gap counts
        let square = Put::new(0, 3, 1, Orientation::IDENTITY);
        assert!(state.available(&rules, square, rules.order));
        assert!(!state.available(&rules, square, PlacementOrder::Ascending));
        assert_eq!(state.simple_score(&rules, square), 16 - 5 * 4);
    }

    #[test]
    fn test_large_weight_saturates() {
        let config = SolverConfig {
            weight_diff_id: i32::MAX,
            ..SolverConfig::default()
        };
        let rules = rules_with(&[], tetromino_stones(), &config);
        let mut state = GameState::new(&rules);
        state.put(&rules, Put::new(0, 0, 0, Orientation::IDENTITY));

        let bar = Put::new(4, 0, 2, Orientation::IDENTITY);
        let score = state.simple_score(&rules, bar);
        assert_eq!(score, 16i32.saturating_sub(i32::MAX.saturating_mul(4)));

        state.add_score(i32::MIN);
        state.add_score(score);
        assert_eq!(state.score(), i32::MIN);
    }

    #[test]
    fn test_placements_recover_moves_after_reorientation() {
        let rules = tetromino_rules();
        let mut state = GameState::new(&rules);
        state.transform_to(&rules, Orientation::ALL[6]);
        let played = greedy_fill(&rules, &mut state, 5);
        assert_eq!(played.len(), 5);

        let answer = state.to_answer(&rules);
        assert_eq!(answer.len(), 5);

        let mut default_view = state.clone();
        default_view.transform_to_default(&rules);
        let mut replay = GameState::new(&rules);
        for placement in answer.placements() {
            replay.put(&rules, placement.to_put(&rules.patterns));
        }
        assert_eq!(replay.field(), default_view.field());
        assert_eq!(replay.occupied(), default_view.occupied());
        assert_eq!(replay.hash(), default_view.hash());
        assert_eq!(replay.empty_count(), default_view.empty_count());
    }

    #[test]
    fn test_rotate_keeps_mirror_flag() {
        let rules = tetromino_rules();
        let mut state = GameState::new(&rules);
        state.transform_to(&rules, Orientation::ALL[5]);
        state.rotate(&rules, 3);
        assert_eq!(state.orientation(), Orientation::ALL[4]);
        assert!(state.is_blocked(&rules, 31 - 5, 5) || state.is_blocked(&rules, 31 - 6, 5));
    }
}
