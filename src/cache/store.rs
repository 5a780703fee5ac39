//! Restaurant data cache.
//!
//! Holds the snapshot of every collection for the selected restaurant and
//! guarantees at most one batch load in flight. Loads are tagged with a
//! generation; a restaurant switch or a clear bumps it, and a batch that
//! finishes under an older generation is discarded instead of committed.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use lru::LruCache;
use metrics::{counter, histogram};
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::repos::{ListParams, RestaurantDataSource, SourceError};
use crate::domain::RestaurantId;
use crate::domain::session::SessionContext;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};
use super::snapshot::RestaurantSnapshot;
use super::trigger::{self, TriggerDecision};

const SOURCE: &str = "cache::store";

/// Message shown when the last batch load failed.
pub const LOAD_ERROR_MESSAGE: &str = "Error loading data, please refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Empty,
    Loading,
    Ready,
    /// The last load failed; previously loaded data, if any, is still served.
    ReadyWithError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Committed {
        restaurant_id: RestaurantId,
        generation: u64,
    },
    Failed {
        restaurant_id: RestaurantId,
        message: String,
    },
    /// The batch finished after the selection changed and was dropped.
    Discarded { restaurant_id: RestaurantId },
    SkippedInFlight,
    SkippedNoRestaurant,
}

struct CacheState {
    context: SessionContext,
    last_triggered: Option<RestaurantId>,
    slots: LruCache<RestaurantId, Arc<RestaurantSnapshot>>,
    current: Option<Arc<RestaurantSnapshot>>,
    loading: Option<RestaurantId>,
    error: Option<String>,
    version: u64,
}

enum AfterFetch {
    Done(LoadOutcome),
    Reload,
}

pub struct RestaurantDataCache {
    source: Arc<dyn RestaurantDataSource>,
    config: CacheConfig,
    state: RwLock<CacheState>,
    in_flight: AtomicBool,
    generation: AtomicU64,
    changes: watch::Sender<u64>,
}

impl RestaurantDataCache {
    pub fn new(source: Arc<dyn RestaurantDataSource>, config: CacheConfig) -> Self {
        let (changes, _) = watch::channel(0);
        let state = CacheState {
            context: SessionContext::default(),
            last_triggered: None,
            slots: LruCache::new(config.restaurant_slots_non_zero()),
            current: None,
            loading: None,
            error: None,
            version: 0,
        };
        Self {
            source,
            config,
            state: RwLock::new(state),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            changes,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // ========================================================================
    // Readers
    // ========================================================================

    /// Currently served snapshot. While a load is in flight this is the
    /// previous snapshot.
    pub fn snapshot(&self) -> Option<Arc<RestaurantSnapshot>> {
        rw_read(&self.state, SOURCE, "snapshot").current.clone()
    }

    pub fn status(&self) -> CacheStatus {
        let state = rw_read(&self.state, SOURCE, "status");
        if state.loading.is_some() {
            CacheStatus::Loading
        } else if state.error.is_some() {
            CacheStatus::ReadyWithError
        } else if state.current.is_some() {
            CacheStatus::Ready
        } else {
            CacheStatus::Empty
        }
    }

    pub fn is_loading(&self) -> bool {
        rw_read(&self.state, SOURCE, "is_loading").loading.is_some()
    }

    pub fn error(&self) -> Option<String> {
        rw_read(&self.state, SOURCE, "error").error.clone()
    }

    pub fn last_updated(&self) -> Option<OffsetDateTime> {
        rw_read(&self.state, SOURCE, "last_updated")
            .current
            .as_ref()
            .map(|snapshot| snapshot.last_updated)
    }

    pub fn context(&self) -> SessionContext {
        rw_read(&self.state, SOURCE, "context").context.clone()
    }

    /// Whether the blocking loading indicator should be shown: a load is in
    /// flight for an active session.
    pub fn shows_loading_indicator(&self) -> bool {
        let state = rw_read(&self.state, SOURCE, "shows_loading_indicator");
        state.loading.is_some() && state.context.is_active()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    // ========================================================================
    // Context and loading
    // ========================================================================

    /// Apply a new session context and load when the trigger policy asks for
    /// it. Returns `None` when no load was attempted.
    pub async fn sync_context(&self, context: SessionContext) -> Option<LoadOutcome> {
        let decision = {
            let mut state = rw_write(&self.state, SOURCE, "sync_context");
            let previous_restaurant = state.context.restaurant_id().cloned();
            let logged_out = state.context.has_user() && !context.has_user();
            state.context = context;

            if logged_out {
                info!(target = "brigade::cache", "session ended, clearing cache");
                self.reset(&mut state);
            } else if previous_restaurant.as_ref() != state.context.restaurant_id() {
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(
                    target = "brigade::cache",
                    generation,
                    restaurant_id = ?state.context.restaurant_id(),
                    "restaurant selection changed"
                );
            }

            let decision = {
                let CacheState {
                    context,
                    last_triggered,
                    slots,
                    ..
                } = &*state;
                trigger::evaluate(context, last_triggered.as_ref(), |id| slots.contains(id))
            };

            match &decision {
                TriggerDecision::Load(restaurant_id) => {
                    state.last_triggered = Some(restaurant_id.clone());
                }
                TriggerDecision::CacheHit(restaurant_id) => {
                    counter!("brigade_cache_hit_total").increment(1);
                    let cached = state.slots.get(restaurant_id).cloned();
                    let switched = match (&cached, &state.current) {
                        (Some(cached), Some(current)) => !Arc::ptr_eq(cached, current),
                        (Some(_), None) => true,
                        _ => false,
                    };
                    if switched {
                        state.current = cached;
                        state.error = None;
                        self.publish(&mut state);
                    }
                }
                _ => {}
            }
            if logged_out {
                self.publish(&mut state);
            }
            decision
        };

        match decision {
            TriggerDecision::Load(restaurant_id) => {
                debug!(
                    target = "brigade::cache",
                    restaurant_id = %restaurant_id,
                    "trigger policy requested a load"
                );
                Some(self.load_all_data().await)
            }
            _ => None,
        }
    }

    /// Fetch all seven collections for the selected restaurant and commit
    /// them atomically.
    ///
    /// A call while another load is in flight, or with no restaurant
    /// selected, does nothing. Failures never propagate: the previous data is
    /// kept and the message is stored in [`error`](Self::error).
    pub async fn load_all_data(&self) -> LoadOutcome {
        let Some(_guard) = LoadGuard::acquire(self) else {
            debug!(target = "brigade::cache", "load skipped: already in flight");
            return LoadOutcome::SkippedInFlight;
        };

        loop {
            let (restaurant_id, generation) = {
                let mut state = rw_write(&self.state, SOURCE, "load_all_data.begin");
                let Some(restaurant_id) = state.context.restaurant_id().cloned() else {
                    debug!(target = "brigade::cache", "load skipped: no restaurant selected");
                    return LoadOutcome::SkippedNoRestaurant;
                };
                state.loading = Some(restaurant_id.clone());
                self.publish(&mut state);
                (restaurant_id, self.generation.load(Ordering::Acquire))
            };

            info!(
                target = "brigade::cache",
                restaurant_id = %restaurant_id,
                generation,
                "loading restaurant data"
            );
            counter!("brigade_cache_load_total").increment(1);
            let started = Instant::now();
            let result = self.fetch_batch(&restaurant_id).await;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            histogram!("brigade_cache_load_ms").record(elapsed_ms);

            match self.finish(restaurant_id, generation, result, elapsed_ms) {
                AfterFetch::Done(outcome) => return outcome,
                AfterFetch::Reload => continue,
            }
        }
    }

    /// Force a resync of the selected restaurant, typically after a write.
    pub async fn refresh_data(&self) -> LoadOutcome {
        self.load_all_data().await
    }

    /// Drop every cached snapshot, the error and the trigger memory.
    pub fn clear_cache(&self) {
        let mut state = rw_write(&self.state, SOURCE, "clear_cache");
        self.reset(&mut state);
        self.publish(&mut state);
        info!(target = "brigade::cache", "cache cleared");
    }

    async fn fetch_batch(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<RestaurantSnapshot, SourceError> {
        let scoped = ListParams::for_restaurant(restaurant_id, self.config.fetch_limit);
        let global = ListParams::global(self.config.fetch_limit);
        let source = self.source.as_ref();

        let (menu_items, ingredients, allergies, recipes, equipment, menu_sections, menus) = tokio::try_join!(
            source.list_menu_items(&scoped),
            source.list_ingredients(&scoped),
            source.list_allergies(&global),
            source.list_recipes(&scoped),
            source.list_equipment(&global),
            source.list_menu_sections(&scoped),
            source.list_menus(&scoped),
        )?;

        Ok(RestaurantSnapshot {
            restaurant_id: restaurant_id.clone(),
            menu_items,
            ingredients,
            allergies,
            recipes,
            equipment,
            menu_sections,
            menus,
            last_updated: OffsetDateTime::now_utc(),
        })
    }

    fn finish(
        &self,
        restaurant_id: RestaurantId,
        generation: u64,
        result: Result<RestaurantSnapshot, SourceError>,
        elapsed_ms: f64,
    ) -> AfterFetch {
        let mut state = rw_write(&self.state, SOURCE, "load_all_data.finish");
        state.loading = None;

        if self.generation.load(Ordering::Acquire) != generation {
            counter!("brigade_cache_stale_discard_total").increment(1);
            warn!(
                target = "brigade::cache",
                restaurant_id = %restaurant_id,
                generation,
                "discarding batch for a superseded selection"
            );
            // A trigger for the new selection was dropped while this batch
            // held the guard; honour it now.
            let pending = state.last_triggered.clone().filter(|pending| {
                state.context.is_active()
                    && state.context.restaurant_id() == Some(pending)
                    && !state.slots.contains(pending)
            });
            self.publish(&mut state);
            return match pending {
                Some(_) => AfterFetch::Reload,
                None => AfterFetch::Done(LoadOutcome::Discarded { restaurant_id }),
            };
        }

        let outcome = match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                if let Some((evicted, _)) = state.slots.push(restaurant_id.clone(), snapshot.clone())
                {
                    if evicted != restaurant_id {
                        debug!(
                            target = "brigade::cache",
                            evicted = %evicted,
                            "evicted restaurant snapshot"
                        );
                    }
                }
                let counts = snapshot.counts();
                state.current = Some(snapshot);
                state.error = None;
                info!(
                    target = "brigade::cache",
                    restaurant_id = %restaurant_id,
                    generation,
                    elapsed_ms,
                    menu_items = counts.menu_items,
                    ingredients = counts.ingredients,
                    recipes = counts.recipes,
                    "restaurant data loaded"
                );
                LoadOutcome::Committed {
                    restaurant_id,
                    generation,
                }
            }
            Err(err) => {
                counter!("brigade_cache_load_failed_total").increment(1);
                let message = err.to_string();
                warn!(
                    target = "brigade::cache",
                    restaurant_id = %restaurant_id,
                    error = %message,
                    "restaurant data load failed; keeping previous data"
                );
                state.error = Some(message.clone());
                LoadOutcome::Failed {
                    restaurant_id,
                    message,
                }
            }
        };
        self.publish(&mut state);
        AfterFetch::Done(outcome)
    }

    fn reset(&self, state: &mut CacheState) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        state.slots.clear();
        state.current = None;
        state.error = None;
        state.last_triggered = None;
    }

    fn publish(&self, state: &mut CacheState) {
        state.version += 1;
        self.changes.send_replace(state.version);
    }
}

/// In-flight guard. Released on drop so that a load future dropped mid-fetch
/// does not leave the cache marked as loading forever.
struct LoadGuard<'a> {
    cache: &'a RestaurantDataCache,
}

impl<'a> LoadGuard<'a> {
    fn acquire(cache: &'a RestaurantDataCache) -> Option<Self> {
        cache
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { cache })
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        let mut state = rw_write(&self.cache.state, SOURCE, "load_guard.drop");
        if state.loading.take().is_some() {
            self.cache.publish(&mut state);
        }
        drop(state);
        self.cache.in_flight.store(false, Ordering::Release);
    }
}
