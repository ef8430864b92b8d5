//! Recurring background timers.
//!
//! A `TickTimer` owns one thread that calls a closure at a fixed period until it is
//! cancelled. Cancellation is dropping the timer: the stop channel disconnects and the
//! thread leaves its `select!` at once instead of sleeping out the current period.
use crossbeam_channel::{Sender, bounded, select, tick};
use log::trace;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// What the tick closure wants the timer to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    /// Keep ticking.
    Continue,
    /// The work this timer drives is gone; exit the thread.
    Stop,
}

/// Handle to a running timer thread. Dropping it cancels the timer.
pub(crate) struct TickTimer {
    _stop_tx: Sender<()>,
    period: Duration,
}

/// Decrements the running-timer gauge when a timer thread exits, however it exits.
struct RunningGuard(Arc<AtomicUsize>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl TickTimer {
    /// Spawn a thread calling `on_tick` every `period` until dropped or told to stop.
    ///
    /// `running` counts live timer threads across the owning simulator.
    pub(crate) fn start<F>(period: Duration, running: Arc<AtomicUsize>, mut on_tick: F) -> Self
    where
        F: FnMut() -> TickControl + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        running.fetch_add(1, Ordering::AcqRel);
        let guard = RunningGuard(running);

        thread::spawn(move || {
            let _guard = guard;
            let ticker = tick(period);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => {
                        if on_tick() == TickControl::Stop {
                            break;
                        }
                    },
                }
            }
            trace!("Timer thread {:?} exiting", thread::current().id());
        });

        Self {
            _stop_tx: stop_tx,
            period,
        }
    }

    /// Period this timer fires at.
    pub(crate) fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn fires_until_dropped() {
        let running = Arc::new(AtomicUsize::new(0));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let timer = TickTimer::start(Duration::from_millis(5), Arc::clone(&running), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        });
        assert_eq!(timer.period(), Duration::from_millis(5));
        assert!(wait_until(|| ticks.load(Ordering::SeqCst) >= 3));
        assert_eq!(running.load(Ordering::SeqCst), 1);

        drop(timer);
        assert!(wait_until(|| running.load(Ordering::SeqCst) == 0));
        let after_stop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn closure_can_stop_its_own_timer() {
        let running = Arc::new(AtomicUsize::new(0));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let _timer = TickTimer::start(Duration::from_millis(5), Arc::clone(&running), move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        });
        assert!(wait_until(|| running.load(Ordering::SeqCst) == 0));
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
