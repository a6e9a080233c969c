//! Bucketed beam search.
//!
//! Every move lowers a state's empty-cell count by the size of the stone, so
//! the frontier is kept in 1024 buckets indexed by empty count and processed
//! from the emptiest board down. Each bucket is cut to the beam width by score
//! before its states are expanded, which gives a best-first sweep without a
//! priority queue.
//!
//! Key pieces:
//! - One move anchor per state: the smallest empty region touching a stone,
//!   so thin gaps get filled before they become unreachable
//! - A hash -> best score map prunes moves leading to a board already reached
//!   with an equal or better score (hash collisions can drop a branch)
//! - States live in a [`StatePool`], so clones reuse slots

use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::config::SolverConfig;
use crate::error::Result;
use crate::geometry::{Orientation, Point, BOARD_CELLS, NEIGHBORS};
use crate::persistence;
use crate::pool::{StateId, StatePool};
use crate::rules::Rules;
use crate::state::GameState;
use crate::stones::{Problem, Put};

/// Counters for one search run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// States whose moves were generated.
    pub expanded: usize,
    /// Child states created.
    pub generated: usize,
    /// Moves dropped by the transposition map.
    pub pruned: usize,
    /// Child states with no empty cells left.
    pub completed: usize,
    /// The run stopped at the deadline.
    pub timed_out: bool,
}

/// Returns true if `candidate` should replace `incumbent` as the best result:
/// fewer empty cells, or as many with fewer stones.
pub fn is_better(candidate: &GameState, incumbent: &GameState) -> bool {
    candidate.empty_count() < incumbent.empty_count()
        || (candidate.empty_count() == incumbent.empty_count()
            && candidate.used_count() < incumbent.used_count())
}

/// Picks the anchor cell for a state's next move.
///
/// Flood-fills the empty cells into regions and takes the smallest region
/// that touches a placed stone (earliest in raster order on ties); within it,
/// the first cell in raster order with a stone neighbour. Regions touching no
/// stone can never be reached under the adjacency rule and are skipped.
pub fn target_cell(rules: &Rules, state: &GameState) -> Option<Point> {
    let mut region = [0u16; BOARD_CELLS];
    let mut stack = Vec::new();
    let mut label = 0u16;
    // (size, first touching cell)
    let mut best: Option<(usize, usize)> = None;

    for start in 0..BOARD_CELLS {
        let p = Point::from_index(start);
        if region[start] != 0 || !state.is_empty_cell(rules, p.x as i32, p.y as i32) {
            continue;
        }

        label += 1;
        region[start] = label;
        stack.push(start);
        let mut size = 0;
        let mut first_touch: Option<usize> = None;

        while let Some(cell) = stack.pop() {
            size += 1;
            let p = Point::from_index(cell);
            for (dx, dy) in NEIGHBORS {
                let (nx, ny) = (p.x as i32 + dx, p.y as i32 + dy);
                if state.is_stone(nx, ny) {
                    first_touch = Some(first_touch.map_or(cell, |touch| touch.min(cell)));
                } else if state.is_empty_cell(rules, nx, ny) {
                    let next = Point::from_i32(nx, ny).index();
                    if region[next] == 0 {
                        region[next] = label;
                        stack.push(next);
                    }
                }
            }
        }

        if let Some(touch) = first_touch {
            if best.map_or(true, |(best_size, _)| size < best_size) {
                best = Some((size, touch));
            }
        }
    }

    best.map(|(_, cell)| Point::from_index(cell))
}

/// One beam search, reusable across starting orientations.
pub struct BeamSearch<'r> {
    rules: &'r Rules,
    beam_width: usize,
    deadline: Option<Instant>,
    pool: StatePool,
    /// Board hash -> best score seen; cleared after every run.
    transpositions: FxHashMap<u32, i32>,
    /// Frontier, indexed by empty count.
    buckets: Vec<Vec<StateId>>,
    best: StateId,
    stats: SearchStats,
}

impl<'r> BeamSearch<'r> {
    pub fn new(rules: &'r Rules, beam_width: usize) -> Self {
        let mut pool = StatePool::default();
        let best = pool.alloc(rules);
        Self {
            rules,
            beam_width: beam_width.max(1),
            deadline: None,
            pool,
            transpositions: FxHashMap::default(),
            buckets: vec![Vec::new(); BOARD_CELLS],
            best,
            stats: SearchStats::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Counters of the last run.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// States currently held in the pool (the best-state slot included).
    pub fn live_states(&self) -> usize {
        self.pool.live_count()
    }

    /// Searches from an empty board reoriented to `orientation` and returns
    /// the best state found, in that orientation.
    pub fn run(&mut self, orientation: Orientation) -> GameState {
        self.stats = SearchStats::default();
        self.pool.get_mut(self.best).reset(self.rules);
        self.seed(orientation);

        for empty in (0..BOARD_CELLS).rev() {
            if self.buckets[empty].is_empty() {
                continue;
            }
            if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                self.stats.timed_out = true;
                self.release_frontier();
                break;
            }

            let mut bucket = std::mem::take(&mut self.buckets[empty]);
            log::debug!("bucket {empty}: {} states", bucket.len());

            if bucket.len() > self.beam_width {
                let pool = &self.pool;
                bucket.select_nth_unstable_by_key(self.beam_width, |&id| Reverse(pool.get(id).score()));
                for id in bucket.drain(self.beam_width..) {
                    self.pool.free(id);
                }
            }

            for id in bucket {
                self.expand(id);
                self.pool.free(id);
            }
        }

        self.transpositions.clear();
        debug_assert_eq!(self.pool.live_count(), 1, "states leaked during the run");

        self.pool.get(self.best).clone()
    }

    /// Seeds the frontier with every legal first move at the first cell, in
    /// raster order, that has one.
    fn seed(&mut self, orientation: Orientation) {
        let rules = self.rules;
        let root = self.pool.alloc(rules);
        self.pool.get_mut(root).transform_to(rules, orientation);

        let state = self.pool.get(root);
        let first_moves = (0..BOARD_CELLS).map(Point::from_index).find_map(|p| {
            let moves = state.available_list(rules, p.x as i32, p.y as i32);
            (!moves.is_empty()).then_some(moves)
        });

        if let Some(moves) = first_moves {
            for put in moves {
                let delta = self.pool.get(root).simple_score(rules, put);
                self.push_child(root, put, delta);
            }
        }
        self.pool.free(root);
    }

    fn expand(&mut self, id: StateId) {
        let rules = self.rules;
        let state = self.pool.get(id);
        let Some(target) = target_cell(rules, state) else {
            return;
        };
        self.stats.expanded += 1;

        let parent_score = state.score();
        let mut accepted = Vec::new();
        for put in state.available_list(rules, target.x as i32, target.y as i32) {
            let delta = state.simple_score(rules, put);
            let score = parent_score.saturating_add(delta);
            match self.transpositions.entry(state.pre_hash(rules, put)) {
                Entry::Occupied(mut seen) => {
                    if *seen.get() >= score {
                        self.stats.pruned += 1;
                        continue;
                    }
                    seen.insert(score);
                }
                Entry::Vacant(slot) => {
                    slot.insert(score);
                }
            }
            accepted.push((put, delta));
        }

        for (put, delta) in accepted {
            self.push_child(id, put, delta);
        }
    }

    fn push_child(&mut self, parent: StateId, put: Put, delta: i32) {
        let child = self.pool.clone_state(parent);
        let state = self.pool.get_mut(child);
        state.add_score(delta);
        state.put(self.rules, put);
        let empty = state.empty_count() as usize;

        self.stats.generated += 1;
        if empty == 0 {
            self.stats.completed += 1;
        }
        self.offer_best(child);
        self.buckets[empty].push(child);
    }

    fn offer_best(&mut self, candidate: StateId) {
        if is_better(self.pool.get(candidate), self.pool.get(self.best)) {
            let replacement = self.pool.clone_state(candidate);
            let previous = std::mem::replace(&mut self.best, replacement);
            self.pool.free(previous);
        }
    }

    fn release_frontier(&mut self) {
        for bucket in &mut self.buckets {
            for id in bucket.drain(..) {
                self.pool.free(id);
            }
        }
    }
}

/// Result of one starting orientation.
#[derive(Clone, Debug)]
pub struct RunResult {
    pub orientation: Orientation,
    pub state: GameState,
    pub stats: SearchStats,
}

/// Runs the beam search from each configured orientation and keeps the best.
pub struct Solver {
    rules: Rules,
    config: SolverConfig,
}

impl Solver {
    pub fn new(problem: &Problem, config: SolverConfig) -> Result<Self> {
        let rules = Rules::new(problem, &config)?;
        Ok(Self { rules, config })
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Returns the best board over all orientations, in orientation 0.
    ///
    /// Runs are compared in configuration order, so an earlier orientation
    /// keeps ties regardless of whether runs happen in parallel.
    pub fn solve(&self) -> Result<GameState> {
        let deadline = self.config.time_limit.map(|limit| Instant::now() + limit);
        let mut best = GameState::new(&self.rules);

        for run in self.run_all(deadline) {
            let stats = run.stats;
            log::info!(
                "orientation {}: {} empty, {} stones; expanded {}, generated {}, pruned {}, completed {}{}",
                run.orientation.index(),
                run.state.empty_count(),
                run.state.used_count(),
                stats.expanded,
                stats.generated,
                stats.pruned,
                stats.completed,
                if stats.timed_out { " (timed out)" } else { "" },
            );
            if !is_better(&run.state, &best) {
                continue;
            }
            best = run.state;
            best.transform_to_default(&self.rules);
            log::info!(
                "new best from orientation {}: {} empty, {} stones",
                run.orientation.index(),
                best.empty_count(),
                best.used_count()
            );
            if let Some(dir) = &self.config.snapshot_dir {
                let answer = best.to_answer(&self.rules);
                let path = persistence::save_snapshot(dir, best.empty_count(), &answer)?;
                log::info!("wrote {}", path.display());
            }
        }

        Ok(best)
    }

    fn run_sequential(&self, deadline: Option<Instant>) -> Vec<RunResult> {
        let mut search = BeamSearch::new(&self.rules, self.config.beam_width).with_deadline(deadline);
        self.config
            .orientations
            .iter()
            .map(|&orientation| {
                let state = search.run(orientation);
                RunResult {
                    orientation,
                    state,
                    stats: search.stats(),
                }
            })
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn run_all(&self, deadline: Option<Instant>) -> Vec<RunResult> {
        use rayon::prelude::*;

        if !self.config.parallel {
            return self.run_sequential(deadline);
        }
        self.config
            .orientations
            .par_iter()
            .map(|&orientation| {
                let mut search =
                    BeamSearch::new(&self.rules, self.config.beam_width).with_deadline(deadline);
                let state = search.run(orientation);
                RunResult {
                    orientation,
                    state,
                    stats: search.stats(),
                }
            })
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn run_all(&self, deadline: Option<Instant>) -> Vec<RunResult> {
        if self.config.parallel {
            log::warn!("built without rayon; running orientations sequentially");
        }
        self.run_sequential(deadline)
    }
}
