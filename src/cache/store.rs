//! In-memory entity cache with request de-duplication.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::entry::{Entry, Status};
use super::traits::{Cacheable, QueryKey, WriteEffect};
use crate::api::ApiError;

/// Handle on a spawned fetch that any number of callers can await
type InFlight = Shared<BoxFuture<'static, ()>>;

/// Bookkeeping around one cache entry
struct Slot<V> {
  entry: Entry<V>,
  /// Bumped on every fetch and invalidation; completions from an older
  /// generation are dropped
  generation: u64,
  in_flight: Option<InFlight>,
  fetched_at: Option<Instant>,
  invalidated: bool,
}

impl<V> Default for Slot<V> {
  fn default() -> Self {
    Self {
      entry: Entry::default(),
      generation: 0,
      in_flight: None,
      fetched_at: None,
      invalidated: false,
    }
  }
}

impl<V> Slot<V> {
  fn needs_fetch(&self, stale_time: Duration) -> bool {
    if self.invalidated {
      return true;
    }
    match self.entry.status() {
      Status::Idle | Status::Error => true,
      Status::Loading => false,
      Status::Success => self
        .fetched_at
        .map(|t| t.elapsed() >= stale_time)
        .unwrap_or(true),
    }
  }

  fn invalidate(&mut self) {
    self.generation += 1;
    self.in_flight = None;
    self.invalidated = true;
    self.entry.settle();
  }

  fn reset(&mut self) {
    self.generation += 1;
    self.in_flight = None;
    self.invalidated = false;
    self.fetched_at = None;
    self.entry = Entry::default();
  }
}

struct CacheState<T> {
  list: Slot<Vec<T>>,
  items: HashMap<u64, Slot<T>>,
  /// Last ticket handed out to a write
  next_write: u64,
  /// Highest ticket whose effect has been applied
  last_applied_write: u64,
}

impl<T> Default for CacheState<T> {
  fn default() -> Self {
    Self {
      list: Slot::default(),
      items: HashMap::new(),
      next_write: 0,
      last_applied_write: 0,
    }
  }
}

impl<T> CacheState<T> {
  /// Record that `ticket` completed; true if a later-issued write got there first.
  fn record_write(&mut self, ticket: WriteTicket) -> bool {
    let superseded = ticket.0 < self.last_applied_write;
    self.last_applied_write = self.last_applied_write.max(ticket.0);
    superseded
  }

  /// Invalidate the list and every cached item.
  fn invalidate_entity(&mut self) {
    self.list.invalidate();
    self.items.values_mut().for_each(Slot::invalidate);
  }
}

/// Picks the slot a query operates on
trait Select<T>: Copy + Send + 'static {
  type Value: Clone + Send + 'static;

  fn slot(self, state: &mut CacheState<T>) -> &mut Slot<Self::Value>;
}

#[derive(Clone, Copy)]
struct ListSlot;

#[derive(Clone, Copy)]
struct ItemSlot(u64);

impl<T: Cacheable> Select<T> for ListSlot {
  type Value = Vec<T>;

  fn slot(self, state: &mut CacheState<T>) -> &mut Slot<Vec<T>> {
    &mut state.list
  }
}

impl<T: Cacheable> Select<T> for ItemSlot {
  type Value = T;

  fn slot(self, state: &mut CacheState<T>) -> &mut Slot<T> {
    state.items.entry(self.0).or_default()
  }
}

/// Sequence number taken when a write is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WriteTicket(u64);

fn lock<T>(state: &Mutex<CacheState<T>>) -> MutexGuard<'_, CacheState<T>> {
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cache for one entity type, keyed by list or id.
///
/// Cheap to clone; clones share the same entries. Fetches run as spawned
/// tasks, so they land in the cache even if every caller stops waiting.
pub struct EntityCache<T> {
  state: Arc<Mutex<CacheState<T>>>,
  /// How long a successful fetch is served without refetching
  stale_time: Duration,
}

impl<T> Clone for EntityCache<T> {
  fn clone(&self) -> Self {
    Self {
      state: Arc::clone(&self.state),
      stale_time: self.stale_time,
    }
  }
}

impl<T: Cacheable> Default for EntityCache<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Cacheable> EntityCache<T> {
  pub fn new() -> Self {
    Self {
      state: Arc::new(Mutex::new(CacheState::default())),
      stale_time: Duration::from_secs(60),
    }
  }

  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
    lock(&self.state)
  }

  /// Current list entry, without fetching.
  pub fn list_entry(&self) -> Entry<Vec<T>> {
    self.lock().list.entry.clone()
  }

  /// Current entry for `id`, without fetching.
  pub fn item_entry(&self, id: u64) -> Entry<T> {
    self
      .lock()
      .items
      .get(&id)
      .map(|slot| slot.entry.clone())
      .unwrap_or_default()
  }

  /// Return the list entry, fetching it first if it is missing, stale or
  /// invalidated. Concurrent callers share a single fetch.
  pub async fn query_list<F, Fut>(&self, fetcher: F) -> Entry<Vec<T>>
  where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>> + Send + 'static,
  {
    self.run(ListSlot, QueryKey::list::<T>(), fetcher).await
  }

  /// Like [`query_list`](Self::query_list) for a single entity. Disabled
  /// for a missing or zero id: the entry stays idle and nothing is fetched.
  pub async fn query_item<F, Fut>(&self, id: Option<u64>, fetcher: F) -> Entry<T>
  where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    match id {
      Some(id) if id != 0 => {
        self
          .run(ItemSlot(id), QueryKey::item::<T>(id), || fetcher(id))
          .await
      }
      _ => Entry::default(),
    }
  }

  async fn run<S, F, Fut>(&self, select: S, key: QueryKey, fetcher: F) -> Entry<S::Value>
  where
    S: Select<T>,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<S::Value, ApiError>> + Send + 'static,
  {
    loop {
      let pending = {
        let mut state = self.lock();
        let slot = select.slot(&mut state);
        match slot.in_flight.clone() {
          Some(in_flight) => in_flight,
          None if !slot.needs_fetch(self.stale_time) => return slot.entry.clone(),
          None => self.start_fetch(slot, select, key, fetcher()),
        }
      };

      pending.await;

      let mut state = self.lock();
      let slot = select.slot(&mut state);
      // Our fetch was invalidated while we waited: join or start the next one
      if slot.in_flight.is_some() || slot.invalidated {
        continue;
      }
      return slot.entry.clone();
    }
  }

  fn start_fetch<S, Fut>(
    &self,
    slot: &mut Slot<S::Value>,
    select: S,
    key: QueryKey,
    fetch: Fut,
  ) -> InFlight
  where
    S: Select<T>,
    Fut: Future<Output = Result<S::Value, ApiError>> + Send + 'static,
  {
    slot.generation += 1;
    slot.entry.begin_loading();
    let generation = slot.generation;
    debug!(%key, generation, "fetching");

    let state = Arc::clone(&self.state);
    let completion = Arc::clone(&self.state);
    let handle = tokio::spawn(async move {
      let result = fetch.await;

      let mut state = lock(&state);
      let slot = select.slot(&mut state);
      if slot.generation != generation {
        debug!(%key, generation, "dropping stale response");
        return;
      }

      slot.in_flight = None;
      slot.invalidated = false;
      match result {
        Ok(data) => {
          slot.entry.succeed(data);
          slot.fetched_at = Some(Instant::now());
        }
        Err(e) => {
          warn!(%key, error = %e, "fetch failed");
          slot.entry.fail(e.to_string());
        }
      }
    });

    // A task that panicked or was cancelled never ran its completion
    let in_flight = async move {
      if let Err(e) = handle.await {
        let mut state = lock(&completion);
        let slot = select.slot(&mut state);
        if slot.generation == generation {
          warn!(%key, error = %e, "fetch task died");
          slot.in_flight = None;
          slot.invalidated = false;
          slot.entry.fail(format!("Fetch task failed: {}", e));
        }
      }
    }
    .boxed()
    .shared();
    slot.in_flight = Some(in_flight.clone());
    in_flight
  }

  /// Mark the list stale; the next list query refetches it.
  pub fn invalidate_list(&self) {
    self.lock().list.invalidate();
  }

  /// Mark one item stale, if it is cached.
  pub fn invalidate_item(&self, id: u64) {
    if let Some(slot) = self.lock().items.get_mut(&id) {
      slot.invalidate();
    }
  }

  /// Mark every entry of this entity type stale.
  pub fn invalidate_all(&self) {
    self.lock().invalidate_entity();
  }

  /// Take a ticket before sending a write, so completions can be ordered
  /// by issue time.
  pub fn begin_write(&self) -> WriteTicket {
    let mut state = self.lock();
    state.next_write += 1;
    WriteTicket(state.next_write)
  }

  /// Apply a successful create. `Invalidate` marks the list and every
  /// cached item stale, as does any other effect that was superseded.
  pub fn apply_created(&self, ticket: WriteTicket, effect: WriteEffect, created: &T) {
    let mut state = self.lock();
    let superseded = state.record_write(ticket);

    match effect {
      WriteEffect::SpliceToFront | WriteEffect::ReplaceInPlace if !superseded => {
        splice_list(&mut state.list, created, effect)
      }
      _ => state.invalidate_entity(),
    }
  }

  /// Apply a successful update.
  pub fn apply_updated(&self, ticket: WriteTicket, effect: WriteEffect, updated: &T) {
    let mut state = self.lock();
    let superseded = state.record_write(ticket);
    let id = updated.id();

    match effect {
      WriteEffect::SpliceToFront | WriteEffect::ReplaceInPlace if !superseded => {
        splice_list(&mut state.list, updated, effect);
        if let Some(slot) = state.items.get_mut(&id) {
          if slot.in_flight.is_some() {
            slot.invalidate();
          } else if slot.entry.data().is_some() {
            slot.entry.succeed(updated.clone());
          }
        }
      }
      _ => state.invalidate_entity(),
    }
  }

  /// Apply a successful delete. The item entry is always dropped.
  pub fn apply_deleted(&self, ticket: WriteTicket, effect: WriteEffect, id: u64) {
    let mut state = self.lock();
    let superseded = state.record_write(ticket);

    if let Some(slot) = state.items.get_mut(&id) {
      slot.reset();
    }

    match effect {
      WriteEffect::SpliceToFront | WriteEffect::ReplaceInPlace if !superseded => {
        let list = &mut state.list;
        if list.in_flight.is_some() {
          list.invalidate();
        } else if let Some(mut entities) = list.entry.data().cloned() {
          entities.retain(|e| e.id() != id);
          list.entry.succeed(entities);
        }
      }
      _ => state.invalidate_entity(),
    }
  }
}

/// Put `entity` at the head of the cached list. A list that was never
/// fetched stays absent; a fetch in flight predates the write and is
/// invalidated instead.
fn splice_list<T: Cacheable>(list: &mut Slot<Vec<T>>, entity: &T, effect: WriteEffect) {
  if list.in_flight.is_some() {
    list.invalidate();
    return;
  }
  let Some(mut entities) = list.entry.data().cloned() else {
    return;
  };
  if effect == WriteEffect::ReplaceInPlace {
    entities.retain(|e| e.id() != entity.id());
  }
  entities.insert(0, entity.clone());
  list.entry.succeed(entities);
}
