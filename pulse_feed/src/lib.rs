//! Simulated real-time market feed for the pulse dashboard.
//!
//! The crate fabricates plausible live updates for tokens nobody actually trades:
//!
//! - `FeedSimulator` — registry of subscribed token ids, one random walk and one timer
//!   per id, fan-out of every tick to that id's subscribers.
//! - `FeedConfig` — cadence bounds, baseline ranges and perturbation sizes.
//! - `RandomSource` — the injectable randomness behind every draw.
//! - `Baseline` — the raw per-token figures a walk is at, and how one tick moves them.
//!
//! ```no_run
//! use pulse_feed::{FeedConfig, FeedSimulator};
//!
//! let feed = FeedSimulator::new(FeedConfig::default());
//! let subscription = feed.subscribe("pcc1", |update| {
//!     println!("{} mc={} vol={}", update.id, update.market_cap, update.volume);
//! });
//! std::thread::sleep(std::time::Duration::from_secs(5));
//! subscription.unsubscribe();
//! feed.stop();
//! ```
#![warn(missing_docs)]
pub mod baseline;
pub mod config;
pub mod random;
pub mod simulator;
mod timer;

pub use baseline::{Baseline, Step, WindowChanges};
pub use config::{Bounds, FeedConfig};
pub use random::{RandomSource, ScriptedSource};
pub use simulator::{BatchSubscription, FeedSimulator, Subscription};
