//! In-memory results keyed by query, shared by every view showing the same data.
//!
//! Each key tracks the generation of its newest request. A fetch that finishes
//! after a newer fetch (or an invalidation) for the same key started is
//! discarded instead of written, so the cache only ever holds the result of the
//! latest request. Views follow a key through [`QueryCache::subscribe`].
//!
//! The number of keys is bounded. Once full, the least recently used keys that
//! nobody is waiting on are evicted.

use agora_common::compose::view::ViewStatus;
use dashmap::{DashMap, mapref::one::RefMut};
use std::{
    fmt::{Debug, Display},
    future::Future,
    hash::Hash,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::sync::watch;
use tracing::debug;

pub const DEFAULT_MAX_ENTRIES: usize = 1024;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum QueryState<V> {
    /// Never fetched, invalidated, or its only request was cancelled.
    Idle,
    Loading,
    Ready(V),
    Failed(String),
}

impl<V: Clone> QueryState<V> {
    #[must_use]
    pub fn to_view(&self) -> ViewStatus<V> {
        match self {
            QueryState::Idle | QueryState::Loading => ViewStatus::Loading,
            QueryState::Ready(value) => ViewStatus::Ready {
                data: value.clone(),
            },
            QueryState::Failed(message) => ViewStatus::Error {
                message: message.clone(),
            },
        }
    }
}

struct Slot<V> {
    generation: u64,
    last_used: AtomicU64,
    state: watch::Sender<QueryState<V>>,
}

impl<V> Slot<V> {
    fn new(now: u64) -> Self {
        Self {
            generation: 0,
            last_used: AtomicU64::new(now),
            state: watch::Sender::new(QueryState::Idle),
        }
    }

    /// Neither loading nor followed by any receiver.
    fn is_evictable(&self) -> bool {
        self.state.receiver_count() == 0 && !matches!(*self.state.borrow(), QueryState::Loading)
    }
}

pub struct QueryCache<K, V> {
    slots: DashMap<K, Slot<V>>,
    max_entries: usize,
    last_generation: AtomicU64,
    clock: AtomicU64,
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_ENTRIES)
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
{
    #[must_use]
    pub fn with_limits(max_entries: usize) -> Self {
        Self {
            slots: DashMap::new(),
            max_entries: max_entries.max(1),
            last_generation: AtomicU64::new(0),
            clock: AtomicU64::new(0),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_generation(&self) -> u64 {
        self.last_generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slot for `key`, created if missing. Makes room first when the cache is full.
    fn slot(&self, key: &K) -> RefMut<'_, K, Slot<V>> {
        if !self.slots.contains_key(key) {
            self.enforce_limits();
        }
        let slot = self
            .slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(self.tick()));
        slot.last_used.store(self.tick(), Ordering::Relaxed);
        slot
    }

    /// Evicts a tenth of the entries, least recently used first, once the limit is reached.
    ///
    /// Slots that are loading or followed by a receiver are kept.
    fn enforce_limits(&self) {
        if self.slots.len() < self.max_entries {
            return;
        }

        let evict_count = (self.max_entries / 10).max(1);
        let mut candidates: Vec<_> = self
            .slots
            .iter()
            .filter(|slot| slot.is_evictable())
            .map(|slot| (slot.last_used.load(Ordering::Relaxed), slot.key().clone()))
            .collect();
        candidates.sort_unstable_by_key(|(last_used, _)| *last_used);

        let mut evicted = 0;
        for (_, key) in candidates.into_iter().take(evict_count) {
            if self
                .slots
                .remove_if(&key, |_, slot| slot.is_evictable())
                .is_some()
            {
                evicted += 1;
            }
        }
        debug!(evicted, entries = self.slots.len(), "Query cache limit reached");
    }

    /// Receiver that always holds the latest applied state for `key`.
    pub fn subscribe(&self, key: &K) -> watch::Receiver<QueryState<V>> {
        self.slot(key).state.subscribe()
    }

    #[must_use]
    pub fn state(&self, key: &K) -> QueryState<V> {
        self.slots
            .get(key)
            .map_or(QueryState::Idle, |slot| slot.state.borrow().clone())
    }

    #[must_use]
    pub fn status(&self, key: &K) -> ViewStatus<V> {
        self.state(key).to_view()
    }

    fn begin(&self, key: &K) -> (u64, QueryState<V>) {
        let generation = self.next_generation();
        let mut slot = self.slot(key);
        slot.generation = generation;
        let previous = slot.state.send_replace(QueryState::Loading);
        (generation, previous)
    }

    /// Takes the cached value, joins the request in flight, or starts a new one,
    /// all under the slot's lock.
    fn claim(&self, key: &K) -> Claim<V> {
        let mut slot = self.slot(key);
        let current = slot.state.borrow().clone();
        match current {
            QueryState::Ready(value) => Claim::Cached(value),
            QueryState::Loading => Claim::InFlight(slot.state.subscribe()),
            QueryState::Idle | QueryState::Failed(_) => {
                let generation = self.next_generation();
                slot.generation = generation;
                let previous = slot.state.send_replace(QueryState::Loading);
                Claim::Begun {
                    generation,
                    previous,
                }
            }
        }
    }

    async fn run<F, Fut, E>(
        &self,
        key: &K,
        generation: u64,
        previous: QueryState<V>,
        fetcher: F,
    ) -> Option<ViewStatus<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let in_flight = InFlight {
            cache: self,
            key,
            generation,
            previous: Some(previous),
        };

        let result = fetcher().await;
        in_flight.finish(result)
    }

    /// Runs `fetcher` as the newest request for `key`.
    ///
    /// Returns the applied status, or `None` when a newer request or an
    /// invalidation superseded this one while it was in flight. Dropping the
    /// returned future abandons the request.
    pub async fn fetch<F, Fut, E>(&self, key: &K, fetcher: F) -> Option<ViewStatus<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let (generation, previous) = self.begin(key);
        self.run(key, generation, previous, fetcher).await
    }

    /// Returns the cached value for `key`, fetching it when there is none.
    ///
    /// A request already in flight for `key` is joined rather than superseded.
    /// Failed states are fetched again.
    pub async fn read_or_fetch<F, Fut, E>(&self, key: &K, fetcher: F) -> ViewStatus<V>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        loop {
            let mut receiver = match self.claim(key) {
                Claim::Cached(data) => {
                    debug!(?key, "Query cache hit");
                    return ViewStatus::Ready { data };
                }
                Claim::InFlight(receiver) => {
                    debug!(?key, "Joining query in flight");
                    receiver
                }
                Claim::Begun {
                    generation,
                    previous,
                } => {
                    debug!(?key, "Query cache miss");
                    if let Some(status) = self.run(key, generation, previous, &fetcher).await {
                        return status;
                    }
                    self.subscribe(key)
                }
            };

            match settled(&mut receiver).await {
                state @ (QueryState::Ready(_) | QueryState::Failed(_)) => return state.to_view(),
                QueryState::Idle | QueryState::Loading => {
                    debug!(?key, "Awaited request went away, reading again");
                }
            }
        }
    }

    /// Fetches `key` regardless of what is cached.
    ///
    /// If this request is superseded, the result of the newer request is
    /// returned once it settles.
    pub async fn refresh<F, Fut, E>(&self, key: &K, fetcher: F) -> ViewStatus<V>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        loop {
            if let Some(status) = self.fetch(key, &fetcher).await {
                return status;
            }

            let mut receiver = self.subscribe(key);
            match settled(&mut receiver).await {
                state @ (QueryState::Ready(_) | QueryState::Failed(_)) => return state.to_view(),
                QueryState::Idle | QueryState::Loading => {
                    debug!(?key, "Superseding request went away, fetching again");
                }
            }
        }
    }

    /// Forgets `key`'s value and discards any request in flight for it.
    pub fn invalidate(&self, key: &K) {
        if self
            .slots
            .remove_if(key, |_, slot| slot.state.receiver_count() == 0)
            .is_some()
        {
            debug!(?key, "Query cache entry removed");
            return;
        }
        if let Some(mut slot) = self.slots.get_mut(key) {
            slot.generation = self.next_generation();
            slot.state.send_replace(QueryState::Idle);
            debug!(?key, "Query cache invalidated");
        }
    }

    pub fn invalidate_all(&self) {
        let before = self.slots.len();
        let mut invalidated = 0;
        self.slots.retain(|_, slot| {
            if slot.state.receiver_count() == 0 {
                return false;
            }
            slot.generation = self.next_generation();
            slot.state.send_replace(QueryState::Idle);
            invalidated += 1;
            true
        });
        debug!(
            invalidated,
            removed = before.saturating_sub(invalidated),
            "Query cache invalidated"
        );
    }
}

enum Claim<V> {
    Cached(V),
    InFlight(watch::Receiver<QueryState<V>>),
    Begun {
        generation: u64,
        previous: QueryState<V>,
    },
}

/// Waits until `receiver` leaves `Loading`. A closed channel counts as `Idle`.
async fn settled<V: Clone>(receiver: &mut watch::Receiver<QueryState<V>>) -> QueryState<V> {
    match receiver
        .wait_for(|state| !matches!(state, QueryState::Loading))
        .await
    {
        Ok(state) => state.clone(),
        Err(_) => QueryState::Idle,
    }
}

/// Applies or discards the outcome of one fetch.
///
/// Dropped without finishing, it puts back the state that was current before the
/// fetch began, provided no newer request has taken over since. A slot left idle
/// with nobody following it is removed.
struct InFlight<'a, K, V>
where
    K: Eq + Hash,
{
    cache: &'a QueryCache<K, V>,
    key: &'a K,
    generation: u64,
    previous: Option<QueryState<V>>,
}

impl<K, V> InFlight<'_, K, V>
where
    K: Eq + Hash + Debug,
{
    fn finish<E: Display>(mut self, result: Result<V, E>) -> Option<ViewStatus<V>>
    where
        V: Clone,
    {
        self.previous = None;

        let slot = self.cache.slots.get(self.key)?;
        if slot.generation != self.generation {
            debug!(key = ?self.key, "Discarding superseded query result");
            return None;
        }

        let state = match result {
            Ok(value) => QueryState::Ready(value),
            Err(err) => QueryState::Failed(err.to_string()),
        };
        let status = state.to_view();
        slot.state.send_replace(state);
        Some(status)
    }
}

impl<K, V> Drop for InFlight<'_, K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        let restored = match previous {
            QueryState::Loading => QueryState::Idle,
            settled => settled,
        };

        let generation = self.generation;
        if matches!(restored, QueryState::Idle)
            && self
                .cache
                .slots
                .remove_if(self.key, |_, slot| {
                    slot.generation == generation && slot.state.receiver_count() == 0
                })
                .is_some()
        {
            return;
        }

        let Some(slot) = self.cache.slots.get(self.key) else {
            return;
        };
        if slot.generation != generation {
            return;
        }
        slot.state.send_replace(restored);
    }
}
