//! Game list selection state

use crate::catalog::{CatalogStore, GameRecord};

/// Held menu direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    Down,
    #[default]
    Idle,
}

/// Frames between repeated moves while a direction is held
pub const REPEAT_FRAMES: u32 = 6;

/// Selected entry in the game list
#[derive(Debug, Clone, Default)]
pub struct MenuSelection {
    index: usize,
    len: usize,
    held: Direction,
    held_frames: u32,
}

impl MenuSelection {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            ..Default::default()
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn shift_up(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn shift_down(&mut self) {
        if self.index + 1 < self.len {
            self.index += 1;
        }
    }

    pub fn hold(&mut self, direction: Direction) {
        if direction != self.held {
            self.held = direction;
            self.held_frames = 0;
        }
    }

    /// Applies the held direction for one frame: a move on the first frame,
    /// then one every [`REPEAT_FRAMES`].
    pub fn tick(&mut self) {
        if self.held_frames % REPEAT_FRAMES == 0 {
            match self.held {
                Direction::Up => self.shift_up(),
                Direction::Down => self.shift_down(),
                Direction::Idle => {}
            }
        }
        self.held_frames = self.held_frames.wrapping_add(1);
    }

    pub fn selected<'a>(&self, store: &'a CatalogStore) -> Option<&'a GameRecord> {
        store.record_at(self.index)
    }
}
