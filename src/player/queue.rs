// ==========================================
// CASSETTE SHELF
// ==========================================
// The shelf is the small, ordered row of cassettes the transport moves over.
// It handles:
// - Adding tracks in insertion order
// - Evicting the oldest inserted track once the shelf is full
// - Looking up a track's position and its neighbours (for previous/next)
//
// Key Concept: VecDeque
// - Adding goes to the back, eviction pops the front
// - Both ends are O(1), which is exactly the FIFO shape we need
//
// The shelf never checks for duplicates. Whoever adds a track decides whether
// "already on the shelf" should mean "just select it" instead.

use std::collections::VecDeque;

use super::track::Track;

/// Number of cassettes the shelf holds.
pub const SHELF_CAPACITY: usize = 6;

/// Which way to look from a track on the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Default)]
pub struct Shelf {
    tracks: VecDeque<Track>,
}

impl Shelf {
    pub fn new() -> Self {
        Shelf {
            tracks: VecDeque::with_capacity(SHELF_CAPACITY),
        }
    }

    // ==========================================
    // ADDING TRACKS: add()
    // ==========================================
    // Appends a track. If the shelf is already full, the element at index 0
    // (the oldest *inserted*, not the oldest played) is evicted first.
    //
    // Example:
    // - Shelf: [A, B, C, D, E, F]
    // - add(G)
    // - Shelf: [B, C, D, E, F, G], returns Some(A)
    //
    // Returns the evicted track, if any.
    pub fn add(&mut self, track: Track) -> Option<Track> {
        let evicted = if self.tracks.len() >= SHELF_CAPACITY {
            self.tracks.pop_front()
        } else {
            None
        };
        self.tracks.push_back(track);
        evicted
    }

    // Position of the first track with this id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|track| track.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn find(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    // ==========================================
    // NAVIGATION: neighbor()
    // ==========================================
    // The track right before (Previous) or right after (Next) the given id.
    // None when the id is absent or already sits at that end of the shelf.
    pub fn neighbor(&self, id: &str, direction: Direction) -> Option<&Track> {
        let index = self.index_of(id)?;
        let target = match direction {
            Direction::Previous => index.checked_sub(1)?,
            Direction::Next => index + 1,
        };
        self.tracks.get(target)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
