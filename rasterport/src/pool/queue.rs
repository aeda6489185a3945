//! The shared queue of pending tiles.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::tile::Tile;

/// Outcome of a bounded take from the queue.
#[derive(Debug)]
pub enum Dequeue {
    /// A tile, now owned exclusively by the caller.
    Tile(Tile),
    /// The queue is drained.
    Empty,
    /// The lock was not acquired within the wait; try again.
    Contended,
}

/// Thread-safe queue of tiles waiting for a worker.
///
/// Discovery fills it before the pool starts; workers only take from it.
/// A tile moves out of the queue on `try_take`, so no two workers can ever
/// hold the same tile.
#[derive(Debug, Default)]
pub struct WorkQueue {
    tiles: Mutex<VecDeque<Tile>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, tile: Tile) {
        self.tiles.lock().push_back(tile);
    }

    /// Number of tiles still waiting.
    pub fn len(&self) -> usize {
        self.tiles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.lock().is_empty()
    }

    /// Take the next tile, waiting at most `wait` for the lock.
    pub fn try_take(&self, wait: Duration) -> Dequeue {
        match self.tiles.try_lock_for(wait) {
            Some(mut tiles) => match tiles.pop_front() {
                Some(tile) => Dequeue::Tile(tile),
                None => Dequeue::Empty,
            },
            None => Dequeue::Contended,
        }
    }

    /// Remove every waiting tile.
    pub fn drain(&self) -> impl Iterator<Item = Tile> {
        std::mem::take(&mut *self.tiles.lock()).into_iter()
    }
}
