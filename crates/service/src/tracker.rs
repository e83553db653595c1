// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Source Tracking
//!
//! The host tells the tracker whenever the source behind an anchor changes. Each change
//! stamps the anchor with a fresh generation; consumers remember the generation they
//! observed and compare it later to find out whether their view is stale.
//!
//! ## Overview
//!
//! - `touch(anchor)`: the source range of `anchor` was edited
//! - `touch_file(path)`: every anchor of a file was edited
//! - `discard(anchor)`: the anchor no longer exists
//!
//! Generations come from one counter shared by all anchors and never go back. Discarding
//! forgets the anchor entirely, so whoever memoized something under it must drop that
//! too; [`QueryCache::on_anchor_discarded`](crate::cache::QueryCache::on_anchor_discarded)
//! does.
//!
//! The tracker also records which file an anchor lives in, and the database override a
//! user set for a whole file.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Generation of an anchor that was never touched
pub const INITIAL_GENERATION: u64 = 0;

#[derive(Debug)]
struct TrackerState<S> {
    generations: HashMap<S, u64>,
    files: HashMap<S, String>,
    database_overrides: HashMap<String, String>,
}

impl<S> Default for TrackerState<S> {
    fn default() -> Self {
        Self {
            generations: HashMap::new(),
            files: HashMap::new(),
            database_overrides: HashMap::new(),
        }
    }
}

/// Per-anchor generation counters, file membership and file-level database overrides
#[derive(Debug)]
pub struct SourceTracker<S> {
    clock: AtomicU64,
    state: RwLock<TrackerState<S>>,
}

impl<S> Default for SourceTracker<S> {
    fn default() -> Self {
        Self {
            clock: AtomicU64::new(INITIAL_GENERATION),
            state: RwLock::new(TrackerState::default()),
        }
    }
}

impl<S: Copy + Eq + Hash> SourceTracker<S> {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current generation of `anchor`
    pub fn generation(&self, anchor: S) -> u64 {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .generations
            .get(&anchor)
            .copied()
            .unwrap_or(INITIAL_GENERATION)
    }

    /// Record an edit of `anchor`, returning its new generation
    pub fn touch(&self, anchor: S) -> u64 {
        let generation = self.tick();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.generations.insert(anchor, generation);
        tracing::debug!(generation, "Anchor touched");
        generation
    }

    /// Record an edit of every anchor in `path`, returning how many were touched
    pub fn touch_file(&self, path: &str) -> usize {
        let generation = self.tick();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let anchors: Vec<S> = state
            .files
            .iter()
            .filter(|(_, file)| file.as_str() == path)
            .map(|(anchor, _)| *anchor)
            .collect();
        for anchor in &anchors {
            state.generations.insert(*anchor, generation);
        }
        tracing::debug!(path, touched = anchors.len(), "File touched");
        anchors.len()
    }

    /// Forget `anchor` and the file it lived in
    pub fn discard(&self, anchor: S) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.generations.remove(&anchor);
        state.files.remove(&anchor);
    }

    /// Whether anything is recorded for `anchor`
    pub fn is_tracked(&self, anchor: S) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.generations.contains_key(&anchor) || state.files.contains_key(&anchor)
    }

    /// Record that `anchor` lives in the file at `path`
    pub fn assign_file(&self, anchor: S, path: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.files.insert(anchor, path.into());
    }

    pub fn file_of(&self, anchor: S) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.files.get(&anchor).cloned()
    }

    /// Set the database of every query in the file at `path`
    ///
    /// Every anchor of the file is touched, since their decorated queries change.
    pub fn set_database_override(&self, path: impl Into<String>, database: impl Into<String>) {
        let path = path.into();
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.database_overrides.insert(path.clone(), database.into());
        }
        self.touch_file(&path);
    }

    pub fn clear_database_override(&self, path: &str) {
        let removed = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.database_overrides.remove(path).is_some()
        };
        if removed {
            self.touch_file(path);
        }
    }

    /// Database override of the file `anchor` lives in
    pub fn database_override(&self, anchor: S) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let path = state.files.get(&anchor)?;
        state.database_overrides.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_bumps_generation() {
        let tracker = SourceTracker::new();
        assert_eq!(tracker.generation(1u32), INITIAL_GENERATION);

        let first = tracker.touch(1);
        let second = tracker.touch(1);
        assert!(second > first);
        assert_eq!(tracker.generation(1), second);
        assert_eq!(tracker.generation(2), INITIAL_GENERATION);
    }

    #[test]
    fn test_discard_forgets_the_anchor() {
        let tracker = SourceTracker::new();
        tracker.assign_file(1u32, "A.java");
        let touched = tracker.touch(1);
        assert!(tracker.is_tracked(1));

        tracker.discard(1);
        assert!(!tracker.is_tracked(1));
        assert_eq!(tracker.generation(1), INITIAL_GENERATION);
        assert_eq!(tracker.file_of(1), None);

        // The clock keeps running for an anchor that shows up again
        assert!(tracker.touch(1) > touched);
    }

    #[test]
    fn test_touch_file() {
        let tracker = SourceTracker::new();
        tracker.assign_file(1u32, "A.java");
        tracker.assign_file(2, "A.java");
        tracker.assign_file(3, "B.java");

        assert_eq!(tracker.touch_file("A.java"), 2);
        assert_eq!(tracker.generation(1), tracker.generation(2));
        assert_eq!(tracker.generation(3), INITIAL_GENERATION);
    }

    #[test]
    fn test_database_override() {
        let tracker = SourceTracker::new();
        tracker.assign_file(1u32, "A.java");
        tracker.assign_file(2, "B.java");

        tracker.set_database_override("A.java", "shop");
        assert_eq!(tracker.database_override(1).as_deref(), Some("shop"));
        assert_eq!(tracker.database_override(2), None);
        let overridden = tracker.generation(1);
        assert_ne!(overridden, INITIAL_GENERATION);

        tracker.clear_database_override("A.java");
        assert_eq!(tracker.database_override(1), None);
        assert!(tracker.generation(1) > overridden);
    }
}
