//! Arena of reusable game states.
//!
//! States are addressed by [`StateId`] and recycled through a free list, so a
//! clone costs one slot copy and never touches the allocator once the arena
//! has grown to its working size. The arena grows a batch at a time.

use crate::rules::Rules;
use crate::state::GameState;

/// Handle to a state slot in a [`StatePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateId(u32);

pub struct StatePool {
    slots: Vec<GameState>,
    /// Parallel to `slots`; tracks handles currently handed out.
    live: Vec<bool>,
    free: Vec<StateId>,
    batch: usize,
    allocated: usize,
    released: usize,
}

impl StatePool {
    pub const DEFAULT_BATCH: usize = 4096;

    pub fn new(batch: usize) -> Self {
        Self {
            slots: Vec::new(),
            live: Vec::new(),
            free: Vec::new(),
            batch: batch.max(1),
            allocated: 0,
            released: 0,
        }
    }

    /// Adds a batch of slots and returns the first of them; the rest go to
    /// the free list.
    fn grow(&mut self, template: &GameState) -> StateId {
        let start = self.slots.len();
        self.slots.resize(start + self.batch, template.clone());
        self.live.resize(start + self.batch, false);
        // hand out low indices first
        self.free
            .extend((start + 1..start + self.batch).rev().map(|i| StateId(i as u32)));
        StateId(start as u32)
    }

    fn take_slot(&mut self, template: &GameState) -> StateId {
        let id = match self.free.pop() {
            Some(id) => id,
            None => self.grow(template),
        };
        debug_assert!(!self.live[id.0 as usize]);
        self.live[id.0 as usize] = true;
        self.allocated += 1;
        id
    }

    /// Allocates an empty board in orientation 0.
    pub fn alloc(&mut self, rules: &Rules) -> StateId {
        let blank = GameState::new(rules);
        let id = self.take_slot(&blank);
        self.slots[id.0 as usize] = blank;
        id
    }

    /// Allocates a copy of an existing state.
    pub fn clone_state(&mut self, source: StateId) -> StateId {
        debug_assert!(self.live[source.0 as usize], "cloning a freed state");
        let template = self.slots[source.0 as usize].clone();
        let id = self.take_slot(&template);
        self.slots[id.0 as usize] = template;
        id
    }

    pub fn free(&mut self, id: StateId) {
        debug_assert!(self.live[id.0 as usize], "double free of {id:?}");
        self.live[id.0 as usize] = false;
        self.free.push(id);
        self.released += 1;
    }

    #[inline]
    pub fn get(&self, id: StateId) -> &GameState {
        debug_assert!(self.live[id.0 as usize], "use of freed {id:?}");
        &self.slots[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: StateId) -> &mut GameState {
        debug_assert!(self.live[id.0 as usize], "use of freed {id:?}");
        &mut self.slots[id.0 as usize]
    }

    /// States handed out and not yet freed.
    pub fn live_count(&self) -> usize {
        self.allocated - self.released
    }

    /// Total allocations and frees since the pool was created.
    pub fn counters(&self) -> (usize, usize) {
        (self.allocated, self.released)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Default for StatePool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BATCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Orientation;
    use crate::state::tests::rules_for;
    use crate::stones::{stone_from_rows, Put};

    #[test]
    fn test_free_slots_are_reused() {
        let rules = rules_for(&[], vec![stone_from_rows(&["1"])]);
        let mut pool = StatePool::new(2);
        let a = pool.alloc(&rules);
        let b = pool.alloc(&rules);
        assert_eq!(pool.capacity(), 2);
        pool.free(a);
        let c = pool.alloc(&rules);
        assert_eq!(c, a, "freed slot should be handed out again");
        assert_eq!(pool.capacity(), 2);

        let d = pool.alloc(&rules);
        assert_eq!(pool.capacity(), 4, "exhaustion grows by a batch");
        for id in [b, c, d] {
            pool.free(id);
        }
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.counters(), (4, 4));
    }

    #[test]
    fn test_clone_is_an_independent_copy() {
        let rules = rules_for(&[], vec![stone_from_rows(&["11"])]);
        let mut pool = StatePool::new(8);
        let parent = pool.alloc(&rules);
        let child = pool.clone_state(parent);
        pool.get_mut(child).put(&rules, Put::new(0, 0, 0, Orientation::IDENTITY));
        pool.get_mut(child).add_score(3);

        assert!(pool.get(parent).is_first_stone());
        assert_eq!(pool.get(child).used_count(), 1);
        assert_eq!(pool.get(child).score(), 3);
        assert_eq!(pool.get(parent).empty_count() - 2, pool.get(child).empty_count());
    }

    #[test]
    fn test_reused_slot_is_reset() {
        let rules = rules_for(&[], vec![stone_from_rows(&["1"])]);
        let mut pool = StatePool::new(1);
        let a = pool.alloc(&rules);
        pool.get_mut(a).put(&rules, Put::new(0, 4, 4, Orientation::IDENTITY));
        pool.free(a);
        let b = pool.alloc(&rules);
        assert_eq!(pool.get(b), &GameState::new(&rules));
    }
}
