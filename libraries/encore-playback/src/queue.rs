//! Playback queue
//!
//! Ordered list of tracks plus a selection pointer. The pointer marks the
//! selected track, which is not necessarily the one sounding: during a
//! crossfade it flips to the incoming track as soon as that track starts
//! mixing in.
//!
//! ```text
//!   index:   0        1        2        3
//!          [ A ]    [ B ]    [ C ]    [ B ]     duplicates allowed
//!                     ^
//!                  current
//! ```

use crate::error::{PlaybackError, Result};
use crate::types::Track;

/// Ordered track list with a selection pointer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    tracks: Vec<Track>,

    /// Selected position. `None` when empty or unset; otherwise always a
    /// valid index into `tracks`.
    current: Option<usize>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track. Always succeeds, duplicates included.
    pub fn add(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Remove the track at `index`
    ///
    /// The selected track is locked: removing it fails and leaves the queue
    /// untouched. Removing a track before the selection shifts the pointer
    /// back so it stays on the same logical track.
    pub fn remove(&mut self, index: usize) -> Result<Track> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }
        if self.current == Some(index) {
            return Err(PlaybackError::SelectedTrackLocked(index));
        }

        let removed = self.tracks.remove(index);
        if let Some(current) = self.current {
            if index < current {
                self.current = Some(current - 1);
            }
        }
        Ok(removed)
    }

    /// Remove the first track with the given id
    pub fn remove_by_id(&mut self, id: &str) -> Result<Track> {
        let index = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| PlaybackError::InvalidOperation(format!("track {id} not in queue")))?;
        self.remove(index)
    }

    /// Insert a track at any position in `0..=len`
    pub fn insert_at(&mut self, track: Track, index: usize) -> Result<()> {
        if index > self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }

        self.tracks.insert(index, track);
        if let Some(current) = self.current {
            if index <= current {
                self.current = Some(current + 1);
            }
        }
        Ok(())
    }

    /// Move a track from `from` to `to`
    ///
    /// Moving the selected track carries the pointer with it; moving another
    /// track across the selection shifts the pointer to keep it on the same
    /// logical track.
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.tracks.len();
        if from >= len {
            return Err(PlaybackError::IndexOutOfBounds(from));
        }
        if to >= len {
            return Err(PlaybackError::IndexOutOfBounds(to));
        }
        if from == to {
            return Err(PlaybackError::InvalidOperation(format!(
                "cannot move track {from} onto itself"
            )));
        }

        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);

        if let Some(current) = self.current {
            self.current = Some(if current == from {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }
        Ok(())
    }

    /// Remove all tracks and reset the selection
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
    }

    /// Select the track at `index`
    ///
    /// Returns `None` without touching the selection when out of range.
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.current = Some(index);
        self.tracks.get(index)
    }

    /// Move the selection forward, wrapping to the first track
    pub fn advance(&mut self) -> Option<&Track> {
        let next = self.peek_next_index()?;
        self.current = Some(next);
        self.tracks.get(next)
    }

    /// Move the selection back, wrapping to the last track
    pub fn retreat(&mut self) -> Option<&Track> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        let prev = match self.current {
            Some(current) if current > 0 => current - 1,
            _ => len - 1,
        };
        self.current = Some(prev);
        self.tracks.get(prev)
    }

    /// Index `advance()` would select, without mutating
    pub fn peek_next_index(&self) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        Some(match self.current {
            Some(current) if current + 1 < len => current + 1,
            _ => 0,
        })
    }

    /// Track `advance()` would select, without mutating
    pub fn peek_next(&self) -> Option<&Track> {
        self.peek_next_index().and_then(|i| self.tracks.get(i))
    }

    /// Currently selected track
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Currently selected index
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Whether the selected track has this id
    pub fn is_track_selected(&self, id: &str) -> bool {
        self.current_track().is_some_and(|t| t.id == id)
    }

    /// Get track at index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// All tracks in order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn track(id: &str) -> Track {
        Track::new(
            id,
            format!("/api/songs/{id}/stream"),
            format!("Track {id}"),
            "Artist",
            Duration::from_secs(180),
        )
    }

    fn ids(queue: &Queue) -> Vec<&str> {
        queue.tracks().iter().map(|t| t.id.as_str()).collect()
    }

    fn abc(current: Option<usize>) -> Queue {
        let mut queue = Queue::new();
        queue.add(track("a"));
        queue.add(track("b"));
        queue.add(track("c"));
        if let Some(i) = current {
            queue.select(i);
        }
        queue
    }

    #[test]
    fn create_empty_queue() {
        let queue = Queue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
        assert!(queue.current_track().is_none());
    }

    #[test]
    fn add_allows_duplicates() {
        let mut queue = Queue::new();
        queue.add(track("a"));
        queue.add(track("a"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn remove_before_current_shifts_pointer() {
        let mut queue = abc(Some(1));
        let removed = queue.remove(0).unwrap();

        assert_eq!(removed.id, "a");
        assert_eq!(ids(&queue), vec!["b", "c"]);
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current_track().unwrap().id, "b");
    }

    #[test]
    fn remove_current_is_rejected() {
        let mut queue = abc(Some(1));
        let before = queue.clone();

        assert_eq!(queue.remove(1), Err(PlaybackError::SelectedTrackLocked(1)));
        assert_eq!(queue, before);
    }

    #[test]
    fn remove_after_current_keeps_pointer() {
        let mut queue = abc(Some(1));
        queue.remove(2).unwrap();
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn remove_out_of_bounds() {
        let mut queue = abc(None);
        assert_eq!(queue.remove(3), Err(PlaybackError::IndexOutOfBounds(3)));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn remove_by_id_respects_lock() {
        let mut queue = abc(Some(0));
        assert!(queue.remove_by_id("a").is_err());
        assert_eq!(queue.remove_by_id("c").unwrap().id, "c");
        assert!(queue.remove_by_id("zzz").is_err());
    }

    #[test]
    fn insert_at_or_before_current_shifts_pointer() {
        let mut queue = abc(Some(1));
        queue.insert_at(track("x"), 1).unwrap();
        assert_eq!(ids(&queue), vec!["a", "x", "b", "c"]);
        assert_eq!(queue.current_track().unwrap().id, "b");

        queue.insert_at(track("y"), 4).unwrap();
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn insert_into_unselected_queue_keeps_none() {
        let mut queue = abc(None);
        queue.insert_at(track("x"), 0).unwrap();
        assert_eq!(queue.current_index(), None);
        assert!(queue.insert_at(track("y"), 9).is_err());
    }

    #[test]
    fn move_selected_track_follows_it() {
        let mut queue = abc(Some(0));
        queue.move_track(0, 2).unwrap();
        assert_eq!(ids(&queue), vec!["b", "c", "a"]);
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn move_across_current_adjusts_pointer() {
        let mut queue = abc(Some(1));
        queue.move_track(0, 2).unwrap();
        assert_eq!(queue.current_track().unwrap().id, "b");
        assert_eq!(queue.current_index(), Some(0));

        let mut queue = abc(Some(1));
        queue.move_track(2, 0).unwrap();
        assert_eq!(queue.current_track().unwrap().id, "b");
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn move_rejects_bad_indices() {
        let mut queue = abc(Some(1));
        let before = queue.clone();
        assert!(queue.move_track(0, 3).is_err());
        assert!(queue.move_track(5, 0).is_err());
        assert!(queue.move_track(1, 1).is_err());
        assert_eq!(queue, before);
    }

    #[test]
    fn clear_resets_selection() {
        let mut queue = abc(Some(2));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn select_out_of_range_is_noop() {
        let mut queue = abc(Some(1));
        assert!(queue.select(3).is_none());
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.select(2).unwrap().id, "c");
    }

    #[test]
    fn advance_wraps_to_start() {
        let mut queue = Queue::new();
        queue.add(track("a"));
        queue.add(track("b"));
        queue.select(1);

        assert_eq!(queue.advance().unwrap().id, "a");
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn advance_from_unset_selects_first() {
        let mut queue = abc(None);
        assert_eq!(queue.advance().unwrap().id, "a");
    }

    #[test]
    fn retreat_wraps_to_end() {
        let mut queue = abc(Some(0));
        assert_eq!(queue.retreat().unwrap().id, "c");

        let mut queue = abc(None);
        assert_eq!(queue.retreat().unwrap().id, "c");
    }

    #[test]
    fn navigation_on_empty_queue() {
        let mut queue = Queue::new();
        assert!(queue.advance().is_none());
        assert!(queue.retreat().is_none());
        assert!(queue.peek_next().is_none());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn peek_does_not_mutate() {
        let queue = abc(Some(2));
        assert_eq!(queue.peek_next_index(), Some(0));
        assert_eq!(queue.peek_next().unwrap().id, "a");
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn is_track_selected() {
        let queue = abc(Some(1));
        assert!(queue.is_track_selected("b"));
        assert!(!queue.is_track_selected("a"));
        assert!(!Queue::new().is_track_selected("a"));
    }
}
