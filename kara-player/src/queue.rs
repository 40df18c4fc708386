//! Playback queue
//!
//! Ordered list of pending song requests. The queue is plain data; the
//! supervisor wraps it in a lock and is the only component that pulls
//! entries off the front for playback.
//!
//! Invariant: no two entries reference the same source file.

use crate::error::{Error, Result};
use kara_common::naming;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Requester name used for random fill entries
pub const RANDOMIZER: &str = "Randomizer";

/// One pending song request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    /// Stable id for UI references
    pub queue_entry_id: Uuid,
    /// Who asked for the song
    pub requester: String,
    /// Song file (accompaniment rendering)
    pub source: PathBuf,
    /// Display title derived from `source`
    pub title: String,
}

impl QueueEntry {
    pub fn new(source: PathBuf, requester: impl Into<String>) -> Self {
        let title = naming::display_title(&source);
        Self {
            queue_entry_id: Uuid::new_v4(),
            requester: requester.into(),
            source,
            title,
        }
    }
}

/// Queue edit action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueEdit {
    /// Swap with the previous entry
    Up,
    /// Swap with the next entry
    Down,
    /// Remove from the queue
    Delete,
}

impl std::str::FromStr for QueueEdit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(QueueEdit::Up),
            "down" => Ok(QueueEdit::Down),
            "delete" => Ok(QueueEdit::Delete),
            other => Err(Error::InvalidRequest(format!("Unrecognized direction: {}", other))),
        }
    }
}

/// Pending requests in play order
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    entries: VecDeque<QueueEntry>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry already references `source`
    pub fn contains(&self, source: &Path) -> bool {
        self.entries.iter().any(|e| e.source == source)
    }

    /// Entries in play order
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Append an entry, rejecting a source already queued
    pub fn enqueue(&mut self, entry: QueueEntry) -> Result<()> {
        if self.contains(&entry.source) {
            warn!(
                "Song is already in queue, will not add: {}",
                entry.source.display()
            );
            return Err(Error::DuplicateEntry(entry.source.display().to_string()));
        }

        info!(
            requester = %entry.requester,
            "'{}' is adding song to queue: {}",
            entry.requester,
            entry.title
        );
        self.entries.push_back(entry);
        Ok(())
    }

    /// Remove and return the head entry
    pub fn dequeue_front(&mut self) -> Result<QueueEntry> {
        self.entries.pop_front().ok_or(Error::QueueEmpty)
    }

    /// Move or delete the first entry whose source contains `fragment`
    ///
    /// An empty fragment matches the head of the queue.
    pub fn reorder(&mut self, fragment: &str, edit: QueueEdit) -> Result<()> {
        let index = self
            .entries
            .iter()
            .position(|e| e.source.to_string_lossy().contains(fragment))
            .ok_or_else(|| {
                warn!("Song not found in queue: {}", fragment);
                Error::EntryNotFound(fragment.to_string())
            })?;
        let title = self.entries[index].title.clone();

        match edit {
            QueueEdit::Up => {
                if index == 0 {
                    warn!("Song is up next, can't bump up in queue: {}", title);
                    return Err(Error::InvalidEdit(format!("{} is already first", title)));
                }
                info!("Bumping song up in queue: {}", title);
                self.entries.swap(index, index - 1);
            }
            QueueEdit::Down => {
                if index + 1 == self.entries.len() {
                    warn!("Song is already last, can't bump down in queue: {}", title);
                    return Err(Error::InvalidEdit(format!("{} is already last", title)));
                }
                info!("Bumping song down in queue: {}", title);
                self.entries.swap(index, index + 1);
            }
            QueueEdit::Delete => {
                info!("Deleting song from queue: {}", title);
                self.entries.remove(index);
            }
        }
        Ok(())
    }

    /// Append `count` distinct random songs from `library`
    ///
    /// Songs already queued are not candidates. Nothing is appended on error.
    pub fn fill_random<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        library: &[PathBuf],
        rng: &mut R,
    ) -> Result<usize> {
        info!("Adding {} random songs to queue", count);
        if library.is_empty() {
            warn!("No available songs!");
            return Err(Error::LibraryEmpty);
        }

        let mut seen = HashSet::new();
        let candidates: Vec<&PathBuf> = library
            .iter()
            .filter(|song| !self.contains(song) && seen.insert(song.as_path()))
            .collect();

        if count > candidates.len() {
            return Err(Error::InsufficientLibrary {
                requested: count,
                available: candidates.len(),
            });
        }

        let picked: Vec<PathBuf> = candidates
            .choose_multiple(rng, count)
            .map(|song| (*song).clone())
            .collect();
        for song in picked {
            self.entries.push_back(QueueEntry::new(song, RANDOMIZER));
        }
        Ok(count)
    }

    /// Remove every entry, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entry(name: &str, requester: &str) -> QueueEntry {
        QueueEntry::new(
            PathBuf::from(format!("/songs/{}---id_accompaniment.mp4", name)),
            requester,
        )
    }

    fn titles(queue: &PlaybackQueue) -> Vec<String> {
        queue.snapshot().into_iter().map(|e| e.title).collect()
    }

    #[test]
    fn test_entry_title_from_source() {
        let e = entry("Take On Me", "alice");
        assert_eq!(e.title, "Take On Me");
        assert_eq!(e.requester, "alice");
    }

    #[test]
    fn test_arrival_order_preserved() {
        let mut queue = PlaybackQueue::new();
        for name in ["a", "b", "c", "d"] {
            queue.enqueue(entry(name, "u")).unwrap();
        }

        let mut order = Vec::new();
        while let Ok(e) = queue.dequeue_front() {
            order.push(e.title);
        }
        assert_eq!(order, vec!["a", "b", "c", "d"]);
        assert!(matches!(queue.dequeue_front(), Err(Error::QueueEmpty)));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(entry("a", "alice")).unwrap();

        let result = queue.enqueue(entry("a", "bob"));
        assert!(matches!(result, Err(Error::DuplicateEntry(_))));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.snapshot()[0].requester, "alice");
    }

    #[test]
    fn test_up_on_first_entry_fails_unchanged() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(entry("a", "u")).unwrap();
        queue.enqueue(entry("b", "u")).unwrap();

        assert!(matches!(
            queue.reorder("/a---", QueueEdit::Up),
            Err(Error::InvalidEdit(_))
        ));
        assert_eq!(titles(&queue), vec!["a", "b"]);
    }

    #[test]
    fn test_up_swaps_with_predecessor() {
        let mut queue = PlaybackQueue::new();
        for name in ["a", "b", "c"] {
            queue.enqueue(entry(name, "u")).unwrap();
        }

        queue.reorder("/c---", QueueEdit::Up).unwrap();
        assert_eq!(titles(&queue), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_down_and_delete() {
        let mut queue = PlaybackQueue::new();
        for name in ["a", "b", "c"] {
            queue.enqueue(entry(name, "u")).unwrap();
        }

        queue.reorder("/a---", QueueEdit::Down).unwrap();
        assert_eq!(titles(&queue), vec!["b", "a", "c"]);

        assert!(matches!(
            queue.reorder("/c---", QueueEdit::Down),
            Err(Error::InvalidEdit(_))
        ));

        queue.reorder("/a---", QueueEdit::Delete).unwrap();
        assert_eq!(titles(&queue), vec!["b", "c"]);
    }

    #[test]
    fn test_first_match_wins_and_missing_fragment() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(entry("love song", "u")).unwrap();
        queue.enqueue(entry("another love song", "u")).unwrap();

        queue.reorder("love song", QueueEdit::Delete).unwrap();
        assert_eq!(titles(&queue), vec!["another love song"]);

        assert!(matches!(
            queue.reorder("nothing like this", QueueEdit::Delete),
            Err(Error::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_empty_fragment_matches_head() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(entry("a", "u")).unwrap();
        queue.enqueue(entry("b", "u")).unwrap();

        assert!(matches!(
            queue.reorder("", QueueEdit::Up),
            Err(Error::InvalidEdit(_))
        ));
        queue.reorder("", QueueEdit::Down).unwrap();
        assert_eq!(titles(&queue), vec!["b", "a"]);
        queue.reorder("", QueueEdit::Delete).unwrap();
        assert_eq!(titles(&queue), vec!["a"]);
    }

    #[test]
    fn test_edit_parse() {
        assert_eq!("up".parse::<QueueEdit>().unwrap(), QueueEdit::Up);
        assert_eq!("delete".parse::<QueueEdit>().unwrap(), QueueEdit::Delete);
        assert!(matches!(
            "sideways".parse::<QueueEdit>(),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_fill_random_more_than_library_fails() {
        let mut queue = PlaybackQueue::new();
        let library = vec![PathBuf::from("/s/a.mp4"), PathBuf::from("/s/b.mp4")];
        let mut rng = StdRng::seed_from_u64(7);

        let result = queue.fill_random(3, &library, &mut rng);
        assert!(matches!(
            result,
            Err(Error::InsufficientLibrary {
                requested: 3,
                available: 2
            })
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fill_random_empty_library() {
        let mut queue = PlaybackQueue::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            queue.fill_random(1, &[], &mut rng),
            Err(Error::LibraryEmpty)
        ));
    }

    #[test]
    fn test_fill_random_distinct_and_tagged() {
        let mut queue = PlaybackQueue::new();
        let library: Vec<PathBuf> = (0..10)
            .map(|i| PathBuf::from(format!("/s/song{}_accompaniment.mp4", i)))
            .collect();
        queue.enqueue(QueueEntry::new(library[0].clone(), "alice")).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        assert_eq!(queue.fill_random(9, &library, &mut rng).unwrap(), 9);
        assert_eq!(queue.len(), 10);

        let snapshot = queue.snapshot();
        let distinct: HashSet<_> = snapshot.iter().map(|e| e.source.clone()).collect();
        assert_eq!(distinct.len(), 10);
        assert!(snapshot[1..].iter().all(|e| e.requester == RANDOMIZER));

        // every song is queued now
        assert!(matches!(
            queue.fill_random(1, &library, &mut rng),
            Err(Error::InsufficientLibrary { available: 0, .. })
        ));
    }

    #[test]
    fn test_clear() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(entry("a", "u")).unwrap();
        queue.enqueue(entry("b", "u")).unwrap();
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }
}
