//! End-to-end checks of the feed running on its own timers.
use crossbeam_channel::{Receiver, unbounded};
use pulse_common::TokenUpdate;
use pulse_feed::{Bounds, FeedConfig, FeedSimulator};
use std::thread;
use std::time::{Duration, Instant};

fn fast_config() -> FeedConfig {
    FeedConfig {
        tick_interval_ms: Bounds::new(10, 30),
        batch_interval_ms: 20,
        ..FeedConfig::default()
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn channel_sink() -> (
    Receiver<TokenUpdate>,
    impl Fn(&TokenUpdate) + Send + Sync + 'static,
) {
    let (tx, rx) = unbounded();
    (rx, move |update: &TokenUpdate| {
        let _ = tx.send(update.clone());
    })
}

#[test]
fn timers_deliver_updates_until_unsubscribed() {
    let feed = FeedSimulator::with_seed(fast_config(), 21);
    let (rx, sink) = channel_sink();
    let sub = feed.subscribe("pcc1", sink);

    for _ in 0..3 {
        let update = rx.recv_timeout(Duration::from_secs(2)).expect("tick");
        assert_eq!(update.id, "pcc1");
        assert!(update.snapshot.price > 0.0);
    }

    sub.unsubscribe();
    assert_eq!(feed.active_timers(), 0);
    assert!(wait_until(|| feed.running_timers() == 0));

    // drain anything in flight, then nothing else may arrive
    while rx.try_recv().is_ok() {}
    thread::sleep(Duration::from_millis(100));
    assert!(rx.try_recv().is_err());
}

#[test]
fn ids_tick_independently() {
    let feed = FeedSimulator::with_seed(fast_config(), 22);
    let (rx_a, sink_a) = channel_sink();
    let (rx_b, sink_b) = channel_sink();
    let _a = feed.subscribe("nvidia", sink_a);
    let _b = feed.subscribe("spirit", sink_b);

    let a = rx_a.recv_timeout(Duration::from_secs(2)).expect("nvidia tick");
    let b = rx_b.recv_timeout(Duration::from_secs(2)).expect("spirit tick");
    assert_eq!(a.id, "nvidia");
    assert_eq!(b.id, "spirit");
    assert_eq!(feed.running_timers(), 2);
}

#[test]
fn walk_moves_price_and_market_cap_together() {
    let feed = FeedSimulator::with_seed(fast_config(), 23);
    let (rx, sink) = channel_sink();
    let _sub = feed.subscribe("wojak", sink);

    let updates: Vec<TokenUpdate> = (0..6)
        .map(|_| rx.recv_timeout(Duration::from_secs(2)).expect("tick"))
        .collect();
    for pair in updates.windows(2) {
        let price_ratio = pair[1].snapshot.price / pair[0].snapshot.price;
        let cap_ratio = pair[1].snapshot.market_cap / pair[0].snapshot.market_cap;
        assert!((price_ratio - cap_ratio).abs() < 1e-9);
        assert!(pair[1].timestamp >= pair[0].timestamp);
    }
}

#[test]
fn batch_subscription_covers_every_id() {
    let config = FeedConfig {
        tick_interval_ms: Bounds::new(60_000, 60_000),
        ..fast_config()
    };
    let feed = FeedSimulator::with_seed(config, 24);
    let _a = feed.subscribe("a", |_| {});
    let _b = feed.subscribe("b", |_| {});
    let _c = feed.subscribe("c", |_| {});

    let (tx, rx) = unbounded();
    let batch = feed.subscribe_batch(move |updates: &[TokenUpdate]| {
        let ids: Vec<String> = updates.iter().map(|u| u.id.clone()).collect();
        let _ = tx.send(ids);
    });

    let ids = rx.recv_timeout(Duration::from_secs(2)).expect("batch");
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(feed.running_timers(), 4);

    batch.cancel();
    assert!(wait_until(|| feed.running_timers() == 3));
}

#[test]
fn empty_batches_are_skipped() {
    let feed = FeedSimulator::with_seed(fast_config(), 25);
    let (tx, rx) = unbounded::<usize>();
    let _batch = feed.subscribe_batch(move |updates: &[TokenUpdate]| {
        let _ = tx.send(updates.len());
    });
    assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
}

#[test]
fn stop_cancels_all_timers() {
    let feed = FeedSimulator::with_seed(fast_config(), 26);
    let (rx, sink) = channel_sink();
    let _subs: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|id| feed.subscribe(*id, |_| {}))
        .collect();
    let _watched = feed.subscribe("d", sink);
    let _batch = feed.subscribe_batch(|_| {});
    assert_eq!(feed.running_timers(), 5);

    feed.stop();
    assert_eq!(feed.active_timers(), 0);
    assert!(wait_until(|| feed.running_timers() == 0));

    while rx.try_recv().is_ok() {}
    thread::sleep(Duration::from_millis(100));
    assert!(rx.try_recv().is_err());
}

#[test]
fn clones_share_one_registry() {
    let feed = FeedSimulator::with_seed(fast_config(), 27);
    let probe = feed.clone();
    let _sub = feed.subscribe("pepe2", |_| {});
    assert_eq!(probe.running_timers(), 1);
    drop(feed);
    // the clone keeps the registry alive
    assert_eq!(probe.running_timers(), 1);
    probe.stop();
    assert!(wait_until(|| probe.running_timers() == 0));
}
