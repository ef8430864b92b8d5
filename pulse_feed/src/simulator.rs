//! Simulated live market feed.
//!
//! `FeedSimulator` keeps a registry keyed by token id. The first subscription to an id
//! creates its entry: a fresh random `Baseline` and a `TickTimer` whose period is drawn
//! once and kept for the entry's lifetime. Every tick advances the baseline and fans the
//! formatted update out to the id's subscribers in registration order. When the last
//! subscriber leaves, the timer is cancelled and the baseline discarded, so a later
//! subscription starts a new walk.
//!
//! Concurrency:
//! - Timer threads and callers share the registry behind one `Mutex`. Baseline mutation
//!   and update construction happen under the lock; callbacks run after it is released,
//!   so a callback may subscribe or unsubscribe without deadlocking.
//! - Each subscriber has an `active` flag cleared on unsubscribe and checked right before
//!   every invocation. Once `unsubscribe` returns, no new delivery starts.
//! - Entries carry a generation number. A timer whose entry was removed or replaced
//!   exits on its next tick without touching the replacement.
//! - Timer threads only hold a `Weak` reference, so dropping every simulator handle
//!   tears the registry down and the timers with it.

use crate::baseline::{Baseline, WindowChanges, monotonic_timestamp, saturating_i64};
use crate::config::FeedConfig;
use crate::random::{self, Draw, RandomSource};
use crate::timer::{TickControl, TickTimer};
use log::{debug, info, trace};
use pulse_common::TokenUpdate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

type Callback = Arc<dyn Fn(&TokenUpdate) + Send + Sync>;
type BatchCallback = Arc<dyn Fn(&[TokenUpdate]) + Send + Sync>;

struct Subscriber {
    key: u64,
    active: Arc<AtomicBool>,
    callback: Callback,
}

struct Entry {
    generation: u64,
    baseline: Baseline,
    subscribers: Vec<Subscriber>,
    timer: TickTimer,
}

struct Registry {
    entries: HashMap<String, Entry>,
    batches: HashMap<u64, TickTimer>,
    source: Box<dyn RandomSource>,
    next_generation: u64,
    next_key: u64,
}

impl Registry {
    fn next_key(&mut self) -> u64 {
        self.next_key += 1;
        self.next_key
    }
}

struct Shared {
    config: FeedConfig,
    registry: Mutex<Registry>,
    running: Arc<AtomicUsize>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance `id` one step and deliver the update. `false` once the entry is gone.
    fn tick(&self, id: &str, generation: Option<u64>) -> bool {
        let (update, targets) = {
            let mut registry = self.lock();
            let Registry {
                entries, source, ..
            } = &mut *registry;
            let Some(entry) = entries.get_mut(id) else {
                return false;
            };
            if generation.is_some_and(|generation| generation != entry.generation) {
                return false;
            }
            let update = advance(&self.config, id, &mut entry.baseline, source.as_mut());
            let targets: Vec<(Arc<AtomicBool>, Callback)> = entry
                .subscribers
                .iter()
                .map(|s| (Arc::clone(&s.active), Arc::clone(&s.callback)))
                .collect();
            (update, targets)
        };

        trace!(
            "Tick {}: price={} mc={} vol={} holders={} -> {} subscribers",
            update.id,
            update.price,
            update.market_cap,
            update.volume,
            update.holders,
            targets.len()
        );
        for (active, callback) in targets {
            if active.load(Ordering::Acquire) {
                callback(&update);
            }
        }
        true
    }

    /// Advance every registered id once, in subscription order, and hand the batch over.
    fn tick_all(&self, callback: &BatchCallback) {
        let updates: Vec<TokenUpdate> = {
            let mut registry = self.lock();
            let Registry {
                entries, source, ..
            } = &mut *registry;
            let mut ordered: Vec<(&String, &mut Entry)> = entries.iter_mut().collect();
            ordered.sort_by_key(|(_, entry)| entry.generation);
            ordered
                .into_iter()
                .map(|(id, entry)| advance(&self.config, id, &mut entry.baseline, source.as_mut()))
                .collect()
        };
        if updates.is_empty() {
            return;
        }
        debug!("Batch of {} updates", updates.len());
        callback(&updates);
    }

    fn unsubscribe(&self, id: &str, key: u64) {
        let (removed, emptied) = {
            let mut registry = self.lock();
            let Some(entry) = registry.entries.get_mut(id) else {
                return;
            };
            let Some(position) = entry.subscribers.iter().position(|s| s.key == key) else {
                return;
            };
            let removed = entry.subscribers.remove(position);
            let emptied = if entry.subscribers.is_empty() {
                registry.entries.remove(id)
            } else {
                None
            };
            (removed, emptied)
        };
        info!("Unsubscribed from token: {}", id);
        if emptied.is_some() {
            info!("Cleared timer for token: {}", id);
        }
        // callbacks may own subscriptions; drop them outside the lock
        drop((removed, emptied));
    }

    fn cancel_batch(&self, key: u64) {
        if self.lock().batches.remove(&key).is_some() {
            debug!("Batch subscription {} cancelled", key);
        }
    }
}

fn advance(
    config: &FeedConfig,
    id: &str,
    baseline: &mut Baseline,
    source: &mut dyn RandomSource,
) -> TokenUpdate {
    let step = baseline.step(config, source);
    trace!(
        "Tick {}: price {:+.3}%, volume {:+.3}%, holders {:+}",
        id, step.price_pct, step.volume_pct, step.holder_delta
    );
    let changes = WindowChanges::random(config, source);
    baseline.to_update(id, changes, monotonic_timestamp())
}

/// In-memory market feed producing per-token updates on independent random cadences.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct FeedSimulator {
    shared: Arc<Shared>,
}

impl FeedSimulator {
    /// Create a simulator drawing from an OS-seeded generator.
    pub fn new(config: FeedConfig) -> Self {
        Self::with_source(config, random::entropy())
    }

    /// Create a simulator whose walks are reproducible for a given `seed`.
    pub fn with_seed(config: FeedConfig, seed: u64) -> Self {
        Self::with_source(config, random::seeded(seed))
    }

    /// Create a simulator drawing from `source`.
    pub fn with_source<S: RandomSource + 'static>(config: FeedConfig, source: S) -> Self {
        let registry = Registry {
            entries: HashMap::new(),
            batches: HashMap::new(),
            source: Box::new(source),
            next_generation: 0,
            next_key: 0,
        };
        Self {
            shared: Arc::new(Shared {
                config,
                registry: Mutex::new(registry),
                running: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Configuration this simulator runs with.
    pub fn config(&self) -> &FeedConfig {
        &self.shared.config
    }

    /// Register `callback` for updates of `id`.
    ///
    /// The first subscriber of an id starts its walk and timer; later ones join them.
    /// The returned handle unsubscribes when dropped.
    pub fn subscribe<F>(&self, id: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&TokenUpdate) + Send + Sync + 'static,
    {
        let id = id.into();
        let active = Arc::new(AtomicBool::new(true));
        let mut registry = self.shared.lock();
        let key = registry.next_key();
        info!("New subscription for token: {}", id);

        if !registry.entries.contains_key(&id) {
            let entry = self.start_entry(&mut registry, &id);
            registry.entries.insert(id.clone(), entry);
        } else {
            debug!("Timer already exists for token: {}", id);
        }
        if let Some(entry) = registry.entries.get_mut(&id) {
            entry.subscribers.push(Subscriber {
                key,
                active: Arc::clone(&active),
                callback: Arc::new(callback),
            });
        }

        Subscription {
            shared: Arc::downgrade(&self.shared),
            id,
            key,
            active,
        }
    }

    fn start_entry(&self, registry: &mut Registry, id: &str) -> Entry {
        let config = &self.shared.config;
        let baseline = Baseline::random(config, registry.source.as_mut());
        let period_ms = registry
            .source
            .uniform_int(
                saturating_i64(config.tick_interval_ms.min),
                saturating_i64(config.tick_interval_ms.max),
            )
            .unsigned_abs();
        registry.next_generation += 1;
        let generation = registry.next_generation;

        let weak = Arc::downgrade(&self.shared);
        let tick_id = id.to_string();
        let timer = TickTimer::start(
            Duration::from_millis(period_ms),
            Arc::clone(&self.shared.running),
            move || match weak.upgrade() {
                Some(shared) if shared.tick(&tick_id, Some(generation)) => TickControl::Continue,
                _ => TickControl::Stop,
            },
        );
        debug!("Starting timer for token: {} every {:?}", id, timer.period());

        Entry {
            generation,
            baseline,
            subscribers: Vec::new(),
            timer,
        }
    }

    /// Receive one batch with an update for every subscribed id, every batch interval.
    ///
    /// Each batch advances the walks exactly like regular ticks do. Empty batches are
    /// skipped. The returned handle cancels when dropped.
    pub fn subscribe_batch<F>(&self, callback: F) -> BatchSubscription
    where
        F: Fn(&[TokenUpdate]) + Send + Sync + 'static,
    {
        let callback: BatchCallback = Arc::new(callback);
        let weak = Arc::downgrade(&self.shared);
        let timer = TickTimer::start(
            self.shared.config.batch_interval(),
            Arc::clone(&self.shared.running),
            move || match weak.upgrade() {
                Some(shared) => {
                    shared.tick_all(&callback);
                    TickControl::Continue
                }
                None => TickControl::Stop,
            },
        );

        let mut registry = self.shared.lock();
        let key = registry.next_key();
        registry.batches.insert(key, timer);
        info!("Batch subscription {} started", key);
        BatchSubscription {
            shared: Arc::downgrade(&self.shared),
            key,
        }
    }

    /// Run one tick for `id` right now, outside its timer cadence.
    ///
    /// Returns `false` when nobody is subscribed to `id`.
    pub fn tick_now(&self, id: &str) -> bool {
        self.shared.tick(id, None)
    }

    /// Cancel every timer and forget all registry state.
    ///
    /// Outstanding `Subscription` handles become inert. The simulator stays usable: a new
    /// subscription starts from scratch.
    pub fn stop(&self) {
        let (entries, batches) = {
            let mut registry = self.shared.lock();
            for entry in registry.entries.values() {
                for subscriber in &entry.subscribers {
                    subscriber.active.store(false, Ordering::Release);
                }
            }
            (
                std::mem::take(&mut registry.entries),
                std::mem::take(&mut registry.batches),
            )
        };
        info!(
            "Feed stopped: {} token timers and {} batch timers cancelled",
            entries.len(),
            batches.len()
        );
    }

    /// Number of ids with a live walk, which is also the number of per-id timers.
    pub fn active_timers(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Number of timer threads still running, per-id and batch alike.
    ///
    /// Lags `active_timers` briefly after a cancellation while threads wind down.
    pub fn running_timers(&self) -> usize {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Number of subscribers currently registered for `id`.
    pub fn subscriber_count(&self, id: &str) -> usize {
        self.shared
            .lock()
            .entries
            .get(id)
            .map(|entry| entry.subscribers.len())
            .unwrap_or(0)
    }

    /// True when `id` has at least one subscriber.
    pub fn is_subscribed(&self, id: &str) -> bool {
        self.subscriber_count(id) > 0
    }

    /// Tick period of `id`'s timer, if it has one.
    pub fn tick_period(&self, id: &str) -> Option<Duration> {
        self.shared
            .lock()
            .entries
            .get(id)
            .map(|entry| entry.timer.period())
    }
}

/// Handle of one subscription. Unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    shared: Weak<Shared>,
    id: String,
    key: u64,
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Token id this subscription listens to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stop receiving updates. The last subscriber of an id also cancels its timer.
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn release(&mut self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared.unsubscribe(&self.id, self.key);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Handle of a batch subscription. Cancels when dropped.
#[must_use = "dropping a BatchSubscription cancels it immediately"]
pub struct BatchSubscription {
    shared: Weak<Shared>,
    key: u64,
}

impl BatchSubscription {
    /// Stop receiving batches.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for BatchSubscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.cancel_batch(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;
    use crate::random::ScriptedSource;

    /// Timers slow enough that only `tick_now` drives the walk during a test.
    fn manual_config() -> FeedConfig {
        FeedConfig {
            tick_interval_ms: Bounds::new(60_000, 60_000),
            batch_interval_ms: 60_000,
            ..FeedConfig::default()
        }
    }

    fn collector() -> (Arc<Mutex<Vec<TokenUpdate>>>, impl Fn(&TokenUpdate) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |update: &TokenUpdate| sink.lock().unwrap().push(update.clone()))
    }

    #[test]
    fn one_timer_per_id_regardless_of_subscribers() {
        let feed = FeedSimulator::with_seed(manual_config(), 1);
        let subs: Vec<Subscription> = (0..5).map(|_| feed.subscribe("pcc1", |_| {})).collect();
        let other = feed.subscribe("nvidia", |_| {});

        assert_eq!(feed.active_timers(), 2);
        assert_eq!(feed.subscriber_count("pcc1"), 5);
        assert_eq!(feed.running_timers(), 2);

        drop(subs);
        assert!(!feed.is_subscribed("pcc1"));
        assert_eq!(feed.active_timers(), 1);
        other.unsubscribe();
        assert_eq!(feed.active_timers(), 0);
    }

    #[test]
    fn fan_out_in_registration_order() {
        let feed = FeedSimulator::with_seed(manual_config(), 2);
        let order = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Subscription> = (0..3)
            .map(|n| {
                let order = Arc::clone(&order);
                feed.subscribe("spirit", move |update: &TokenUpdate| {
                    order.lock().unwrap().push((n, update.timestamp));
                })
            })
            .collect();

        assert!(feed.tick_now("spirit"));
        let seen = order.lock().unwrap().clone();
        assert_eq!(seen.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(seen.windows(2).all(|pair| pair[0].1 == pair[1].1));
        drop(subs);
    }

    #[test]
    fn price_and_market_cap_move_by_the_same_percentage() {
        let feed = FeedSimulator::with_seed(manual_config(), 3);
        let (seen, sink) = collector();
        let _sub = feed.subscribe("wojak", sink);

        for _ in 0..20 {
            feed.tick_now("wojak");
        }
        let updates = seen.lock().unwrap().clone();
        assert_eq!(updates.len(), 20);
        for pair in updates.windows(2) {
            let (prev, next) = (pair[0].snapshot, pair[1].snapshot);
            let price_ratio = next.price / prev.price;
            let cap_ratio = next.market_cap / prev.market_cap;
            assert!((price_ratio - cap_ratio).abs() < 1e-9);
            assert!((price_ratio - 1.0).abs() <= 0.025 + 1e-9);
            assert!(next.holders >= 1);
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
    }

    #[test]
    fn scripted_source_gives_exact_values() {
        // baseline draws: price, market cap, volume, holders, then the tick period
        // tick draws: price move, volume move, holder chance, 1h, 6h, 24h
        let script = vec![0.1, 0.5, 0.0, 0.0, 0.0, 1.0, 0.7, 0.9, 0.75, 0.25, 0.5];
        let feed = FeedSimulator::with_source(manual_config(), ScriptedSource::new(script));
        let (seen, sink) = collector();
        let _sub = feed.subscribe("based", sink);
        feed.tick_now("based");

        let update = seen.lock().unwrap()[0].clone();
        // price and market cap +2.5% (unit clamped just under 1.0), volume +2%
        assert_eq!(update.market_cap, "307.50K");
        assert_eq!(update.volume, "5.10K");
        assert_eq!(update.price, "0.000205");
        assert_eq!(update.holders, 50);
        assert_eq!(update.change_1h, 5.0);
        assert_eq!(update.change_6h, -10.0);
        assert_eq!(update.change_24h, 0.0);
    }

    #[test]
    fn resubscribing_starts_a_new_walk() {
        let config = FeedConfig {
            price_range: Bounds::new(0.0001, 1_000.0),
            ..manual_config()
        };
        // only the very first draw is 0.0: the first walk starts at the bottom of the
        // price range, every later baseline lands mid-range
        let mut script = vec![0.5; 11];
        script[0] = 0.0;
        let feed = FeedSimulator::with_source(config, ScriptedSource::new(script));

        let (seen, sink) = collector();
        let sub = feed.subscribe("catnip", sink);
        feed.tick_now("catnip");
        feed.tick_now("catnip");
        sub.unsubscribe();
        assert!(!feed.tick_now("catnip"));
        assert_eq!(feed.active_timers(), 0);

        let (fresh, sink) = collector();
        let _sub = feed.subscribe("catnip", sink);
        feed.tick_now("catnip");

        let old_last = seen.lock().unwrap().last().cloned().unwrap().snapshot;
        let new_first = fresh.lock().unwrap()[0].snapshot;
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(old_last.price < 0.001);
        assert!(new_first.price > 1.0);
    }

    #[test]
    fn unsubscribed_callback_is_never_called_again() {
        let feed = FeedSimulator::with_seed(manual_config(), 4);
        let (kept, keep_sink) = collector();
        let (dropped, drop_sink) = collector();
        let _keep = feed.subscribe("lumen", keep_sink);
        let gone = feed.subscribe("lumen", drop_sink);

        feed.tick_now("lumen");
        gone.unsubscribe();
        feed.tick_now("lumen");

        assert_eq!(kept.lock().unwrap().len(), 2);
        assert_eq!(dropped.lock().unwrap().len(), 1);
        assert_eq!(feed.active_timers(), 1);
    }

    #[test]
    fn callback_may_unsubscribe_itself() {
        let feed = FeedSimulator::with_seed(manual_config(), 5);
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let inner_slot = Arc::clone(&slot);
        let inner_calls = Arc::clone(&calls);
        let sub = feed.subscribe("rugged", move |_| {
            inner_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = inner_slot.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        assert!(feed.tick_now("rugged"));
        assert!(!feed.tick_now("rugged"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(feed.active_timers(), 0);
    }

    #[test]
    fn stop_clears_everything_and_old_handles_are_inert() {
        let feed = FeedSimulator::with_seed(manual_config(), 6);
        let (seen, sink) = collector();
        let old = feed.subscribe("pepe2", sink);
        let _batch = feed.subscribe_batch(|_| {});
        feed.stop();

        assert_eq!(feed.active_timers(), 0);
        assert!(!feed.tick_now("pepe2"));

        let _fresh = feed.subscribe("pepe2", |_| {});
        drop(old);
        // the stale handle must not remove the new subscriber
        assert_eq!(feed.subscriber_count("pepe2"), 1);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn tick_period_is_drawn_from_the_configured_range() {
        let config = FeedConfig {
            tick_interval_ms: Bounds::new(40_000, 50_000),
            ..manual_config()
        };
        let feed = FeedSimulator::with_seed(config, 7);
        let subs: Vec<Subscription> = (0..10)
            .map(|n| feed.subscribe(format!("token-{n}"), |_| {}))
            .collect();
        for sub in &subs {
            let period = feed.tick_period(sub.id()).unwrap();
            assert!(period >= Duration::from_millis(40_000));
            assert!(period <= Duration::from_millis(50_000));
        }
        assert_eq!(feed.tick_period("unknown"), None);
    }

    #[test]
    fn unknown_ids_are_opaque_strings() {
        let feed = FeedSimulator::with_seed(manual_config(), 8);
        let (seen, sink) = collector();
        let _sub = feed.subscribe("", sink);
        assert!(feed.tick_now(""));
        assert_eq!(seen.lock().unwrap()[0].id, "");
        assert!(!feed.tick_now("never-subscribed"));
    }
}
