// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query Cache
//!
//! Memoizes the parsed query of every anchor and indexes queries by namespace for
//! cross-query lookups.
//!
//! ## Overview
//!
//! - **Memo**: anchor → parsed query, stamped with the [`SourceTracker`] generation seen
//!   at parse time. A lookup whose generation still matches returns the very same
//!   `Arc<Node>`; otherwise the anchor is parsed again.
//! - **Namespace index**: namespace → `(anchor, generation, Weak<Node>)`. The index never
//!   keeps a query alive. Every write sweeps entries that are dead, stale or replaced.
//!
//! ## Concurrency
//!
//! Parsing happens outside of any lock. The memo sits behind a mutex held only for
//! lookups and inserts; the index sits behind a read/write lock so that concurrent
//! [`QueryCache::all_siblings_of`] calls never wait on each other.
//!
//! ## Example
//!
//! ```rust,ignore
//! let cache = QueryCache::new(tracker.clone());
//! let query = cache.query_at(anchor, &parser);
//! let again = cache.query_at(anchor, &parser);
//! assert!(Arc::ptr_eq(&query.unwrap(), &again.unwrap()));
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use mql_analyzer_ir::{Namespace, Node};

use crate::tracker::SourceTracker;

/// Parses the query owning an anchor
pub trait QueryParser<S> {
    /// `None` when `anchor` is not the anchor of a query
    fn parse(&self, anchor: S) -> Option<Node<S>>;
}

impl<S, F: Fn(S) -> Option<Node<S>>> QueryParser<S> for F {
    fn parse(&self, anchor: S) -> Option<Node<S>> {
        self(anchor)
    }
}

#[derive(Debug)]
struct MemoEntry<S> {
    generation: u64,
    query: Option<Arc<Node<S>>>,
}

#[derive(Debug)]
struct IndexEntry<S> {
    anchor: S,
    generation: u64,
    query: Weak<Node<S>>,
}

/// Memoized queries keyed by anchor, with a weak namespace index
#[derive(Debug)]
pub struct QueryCache<S> {
    tracker: Arc<SourceTracker<S>>,
    memo: Mutex<HashMap<S, MemoEntry<S>>>,
    index: RwLock<HashMap<Namespace, Vec<IndexEntry<S>>>>,
}

impl<S: Copy + Eq + Hash> QueryCache<S> {
    pub fn new(tracker: Arc<SourceTracker<S>>) -> Self {
        Self {
            tracker,
            memo: Mutex::new(HashMap::new()),
            index: RwLock::new(HashMap::new()),
        }
    }

    pub fn tracker(&self) -> &Arc<SourceTracker<S>> {
        &self.tracker
    }

    fn memo(&self) -> MutexGuard<'_, HashMap<S, MemoEntry<S>>> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn memoized(&self, anchor: S, generation: u64) -> Option<Option<Arc<Node<S>>>> {
        let memo = self.memo();
        memo.get(&anchor)
            .filter(|entry| entry.generation == generation)
            .map(|entry| entry.query.clone())
    }

    /// The query at `anchor`, parsed at most once per generation
    ///
    /// Anchors that are not queries are memoized too, as `None`.
    pub fn query_at(&self, anchor: S, parser: &impl QueryParser<S>) -> Option<Arc<Node<S>>> {
        let generation = self.tracker.generation(anchor);
        if let Some(query) = self.memoized(anchor, generation) {
            tracing::debug!(generation, hit = query.is_some(), "Query cache hit");
            return query;
        }

        tracing::debug!(generation, "Query cache miss, parsing");
        let parsed = parser.parse(anchor).map(Arc::new);

        let query = {
            let mut memo = self.memo();
            match memo.get(&anchor) {
                // Parsed concurrently for the same generation; keep the first result
                Some(entry) if entry.generation == generation => return entry.query.clone(),
                _ => {
                    memo.insert(
                        anchor,
                        MemoEntry {
                            generation,
                            query: parsed.clone(),
                        },
                    );
                    parsed
                }
            }
        };

        if let Some(query) = &query
            && let Some(namespace) = query.namespace()
        {
            self.register(namespace.clone(), anchor, generation, query);
        }
        query
    }

    fn register(&self, namespace: Namespace, anchor: S, generation: u64, query: &Arc<Node<S>>) {
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        self.sweep(&mut index, Some(anchor));
        index.entry(namespace).or_default().push(IndexEntry {
            anchor,
            generation,
            query: Arc::downgrade(query),
        });
    }

    /// Drop dead and stale index entries, plus every entry of `replaced`
    fn sweep(&self, index: &mut HashMap<Namespace, Vec<IndexEntry<S>>>, replaced: Option<S>) {
        let mut swept = 0;
        for entries in index.values_mut() {
            let before = entries.len();
            entries.retain(|entry| {
                Some(entry.anchor) != replaced
                    && entry.query.strong_count() > 0
                    && entry.generation == self.tracker.generation(entry.anchor)
            });
            swept += before - entries.len();
        }
        index.retain(|_, entries| !entries.is_empty());
        if swept > 0 {
            tracing::debug!(swept, "Swept namespace index");
        }
    }

    /// Every other live, up-to-date query targeting the namespace of `query`
    ///
    /// Queries without a `Known` namespace have no siblings.
    pub fn all_siblings_of(&self, query: &Node<S>) -> Vec<Arc<Node<S>>> {
        let Some(namespace) = query.namespace() else {
            return Vec::new();
        };

        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = index.get(namespace) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|entry| {
                entry.anchor != query.source
                    && entry.generation == self.tracker.generation(entry.anchor)
            })
            .filter_map(|entry| entry.query.upgrade())
            .filter(|sibling| !std::ptr::eq(sibling.as_ref(), query))
            .collect()
    }

    /// Force the next [`QueryCache::query_at`] of `anchor` to parse again
    pub fn invalidate(&self, anchor: S) {
        self.tracker.touch(anchor);
        self.memo().remove(&anchor);
    }

    /// Forget `anchor` after the host discarded it
    pub fn on_anchor_discarded(&self, anchor: S) {
        self.tracker.discard(anchor);
        self.memo().remove(&anchor);
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        self.sweep(&mut index, Some(anchor));
    }

    /// Number of memoized queries
    pub fn len(&self) -> usize {
        self.memo()
            .values()
            .filter(|entry| entry.query.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries in the namespace index, live or not
    pub fn indexed_len(&self) -> usize {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mql_analyzer_ir::{CollectionReference, HasCollectionReference};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn query(anchor: u32, collection: &str) -> Node<u32> {
        Node::new(
            anchor,
            [HasCollectionReference::new(CollectionReference::known(
                None,
                anchor,
                Namespace::new("shop", collection),
            ))
            .into()],
        )
    }

    /// Anchors below 100 are queries on `shop.users`, the rest are not queries
    struct CountingParser {
        parses: AtomicUsize,
    }

    impl CountingParser {
        fn new() -> Self {
            Self {
                parses: AtomicUsize::new(0),
            }
        }

        fn parses(&self) -> usize {
            self.parses.load(Ordering::SeqCst)
        }
    }

    impl QueryParser<u32> for CountingParser {
        fn parse(&self, anchor: u32) -> Option<Node<u32>> {
            self.parses.fetch_add(1, Ordering::SeqCst);
            (anchor < 100).then(|| query(anchor, "users"))
        }
    }

    fn cache() -> QueryCache<u32> {
        QueryCache::new(Arc::new(SourceTracker::new()))
    }

    #[test]
    fn test_query_at_is_reference_stable() {
        let cache = cache();
        let parser = CountingParser::new();

        let first = cache.query_at(1, &parser).unwrap();
        let second = cache.query_at(1, &parser).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(parser.parses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_non_queries_are_memoized() {
        let cache = cache();
        let parser = CountingParser::new();

        assert!(cache.query_at(100, &parser).is_none());
        assert!(cache.query_at(100, &parser).is_none());
        assert_eq!(parser.parses(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_touch_and_invalidate_reparse() {
        let cache = cache();
        let parser = CountingParser::new();

        let first = cache.query_at(1, &parser).unwrap();
        cache.tracker().touch(1);
        let second = cache.query_at(1, &parser).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        cache.invalidate(1);
        let third = cache.query_at(1, &parser).unwrap();
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(parser.parses(), 3);
    }

    #[test]
    fn test_siblings_exclude_the_query_itself() {
        let cache = cache();
        let parser = CountingParser::new();

        let one = cache.query_at(1, &parser).unwrap();
        let two = cache.query_at(2, &parser).unwrap();
        let three = cache.query_at(3, &parser).unwrap();

        let siblings = cache.all_siblings_of(&one);
        assert_eq!(siblings.len(), 2);
        assert!(siblings.iter().all(|s| !Arc::ptr_eq(s, &one)));
        assert!(siblings.iter().any(|s| Arc::ptr_eq(s, &two)));
        assert!(siblings.iter().any(|s| Arc::ptr_eq(s, &three)));
    }

    #[test]
    fn test_siblings_of_a_copy_exclude_its_anchor() {
        let cache = cache();
        let parser = CountingParser::new();

        let one = cache.query_at(1, &parser).unwrap();
        cache.query_at(2, &parser).unwrap();

        let copy = (*one).clone().with_target_cluster("7.0.0");
        let siblings = cache.all_siblings_of(&copy);
        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].source, 2);
    }

    #[test]
    fn test_siblings_by_namespace() {
        let cache = cache();
        let one = cache.query_at(1, &|a: u32| Some(query(a, "users"))).unwrap();
        cache.query_at(2, &|a: u32| Some(query(a, "orders")));

        assert!(cache.all_siblings_of(&one).is_empty());
        assert!(cache.all_siblings_of(&Node::new(9u32, [])).is_empty());
    }

    #[test]
    fn test_discarded_anchor_parses_again() {
        let cache = cache();
        let parser = CountingParser::new();

        let before = cache.query_at(1, &parser).unwrap();
        cache.on_anchor_discarded(1);
        assert!(!cache.tracker().is_tracked(1));

        let after = cache.query_at(1, &parser).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(parser.parses(), 2);
    }

    #[test]
    fn test_discarded_anchor_is_not_a_sibling() {
        let cache = cache();
        let parser = CountingParser::new();

        let one = cache.query_at(1, &parser).unwrap();
        let two = cache.query_at(2, &parser).unwrap();

        cache.on_anchor_discarded(2);
        assert!(cache.all_siblings_of(&one).is_empty());
        assert_eq!(cache.indexed_len(), 1);

        // The index holds no strong reference
        let weak = Arc::downgrade(&two);
        drop(two);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_stale_sibling_is_excluded_and_swept() {
        let cache = cache();
        let parser = CountingParser::new();

        let one = cache.query_at(1, &parser).unwrap();
        let _two = cache.query_at(2, &parser).unwrap();
        cache.tracker().touch(2);

        // Still indexed, but out of date
        assert!(cache.all_siblings_of(&one).is_empty());
        assert_eq!(cache.indexed_len(), 2);

        cache.query_at(3, &parser);
        assert_eq!(cache.indexed_len(), 2);
        assert_eq!(cache.all_siblings_of(&one).len(), 1);
    }

    #[test]
    fn test_concurrent_readers() {
        let cache = cache();
        let parser = CountingParser::new();
        let queries: Vec<_> = (0..8).filter_map(|a| cache.query_at(a, &parser)).collect();

        std::thread::scope(|scope| {
            for query in &queries {
                let cache = &cache;
                scope.spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(cache.all_siblings_of(query).len(), 7);
                    }
                });
            }
        });
        assert_eq!(parser.parses(), 8);
    }
}
