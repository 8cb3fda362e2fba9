// ==========================================
// SAVED TRACKS (the playlist)
// ==========================================
// An unbounded set of tracks keyed by id, completely independent from the
// shelf: a track can be saved while shelved, after being evicted, or without
// ever having been shelved.
//
// Insertion order is kept only so the playlist panel lists tracks in the
// order they were saved. Membership is what matters.

use serde::{Deserialize, Serialize};

use super::track::Track;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedTracks {
    tracks: Vec<Track>,
}

impl SavedTracks {
    pub fn new() -> Self {
        SavedTracks { tracks: Vec::new() }
    }

    /// Builds the set from stored tracks, keeping the first copy of each id.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let mut saved = SavedTracks::new();
        for track in tracks {
            if !saved.is_saved(&track.id) {
                saved.tracks.push(track);
            }
        }
        saved
    }

    // Flips membership. Returns true if the track is saved afterwards.
    pub fn toggle(&mut self, track: &Track) -> bool {
        if let Some(index) = self.position(&track.id) {
            self.tracks.remove(index);
            false
        } else {
            self.tracks.push(track.clone());
            true
        }
    }

    pub fn is_saved(&self, id: &str) -> bool {
        self.position(id).is_some()
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

    fn position(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_once_then_removes() {
        let mut saved = SavedTracks::new();
        let track = Track::new("7", "Unholy", "Sam Smith & Kim Petras");

        assert!(!saved.is_saved("7"));
        assert!(saved.toggle(&track));
        assert!(saved.is_saved("7"));
        assert_eq!(saved.len(), 1);

        assert!(!saved.toggle(&track));
        assert!(!saved.is_saved("7"));
        assert!(saved.is_empty());
    }

    #[test]
    fn from_tracks_drops_duplicate_ids() {
        let a = Track::new("a", "One", "X");
        let b = Track::new("b", "Two", "Y");
        let saved = SavedTracks::from_tracks(vec![a.clone(), b, a]);
        assert_eq!(saved.len(), 2);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut saved = SavedTracks::new();
        saved.toggle(&Track::new("a", "One", "X"));
        let json = serde_json::to_value(&saved).unwrap();
        assert!(json.is_array());
    }
}
