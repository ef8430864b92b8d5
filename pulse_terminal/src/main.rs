//! Pulse Terminal — a text dashboard over the simulated token feed.
//!
//! It loads a board of three token columns (new pairs, final stretch, migrated),
//! subscribes every token to the `FeedSimulator`, applies live updates as they arrive,
//! and periodically logs each column sorted by the chosen key.
//!
//! Usage example (CLI):
//! ```bash
//! pulse_terminal --sort market-cap --direction desc --refresh-ms 1000 --duration-secs 30
//! pulse_terminal --board ./board.json --config ./feed.json --column migrated --seed 7
//! ```
//!
//! Shutdown happens on Ctrl+C or when `--duration-secs` elapses; all subscriptions are
//! dropped and the feed is stopped before exit.
#![warn(missing_docs)]
mod args;
mod render;

use crate::args::Args;
use crate::render::render_column;
use clap::Parser;
use crossbeam_channel::{Receiver, select, tick, unbounded};
use log::{debug, info, warn};
use pulse_common::{Board, BoardParser, Column, PriceDirection, PulseError, Result, SortState, TokenUpdate};
use pulse_feed::{FeedConfig, FeedSimulator, Subscription};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// How often the main loop re-checks the shutdown flag when idle.
const POLL_MS: u64 = 200;

fn main() -> Result<(), PulseError> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down dashboard...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| PulseError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;
    }

    let config = match &args.config {
        Some(path) => FeedConfig::load_from_file(&normalize_path(path))?,
        None => FeedConfig::default(),
    };
    let mut board = match &args.board {
        Some(path) => load_board(&normalize_path(path))?,
        None => Board::demo(),
    };
    if board.is_empty() {
        warn!("Board has no tokens; nothing will update");
    }

    let feed = match args.seed {
        Some(seed) => FeedSimulator::with_seed(config, seed),
        None => FeedSimulator::new(config),
    };
    let (update_tx, update_rx) = unbounded::<TokenUpdate>();
    let subscriptions: Vec<Subscription> = board
        .ids()
        .into_iter()
        .map(|id| {
            let tx = update_tx.clone();
            feed.subscribe(id, move |update| {
                if let Err(e) = tx.send(update.clone()) {
                    debug!("Dashboard gone, dropping update: {}", e);
                }
            })
        })
        .collect();
    drop(update_tx);
    info!(
        "Subscribed {} tokens, {} timers running",
        subscriptions.len(),
        feed.active_timers()
    );

    let dashboard = Dashboard {
        state: SortState::new(args.sort, args.direction),
        columns: args.columns(),
        refresh: Duration::from_millis(args.refresh_ms.max(1)),
        deadline: args
            .duration_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs)),
    };
    dashboard.run(&mut board, &update_rx, &shutdown);

    drop(subscriptions);
    feed.stop();
    info!("Dashboard stopped");
    Ok(())
}

/// Render loop settings.
struct Dashboard {
    state: SortState,
    columns: Vec<Column>,
    refresh: Duration,
    deadline: Option<Instant>,
}

impl Dashboard {
    /// Apply updates and render on every refresh until shutdown or the deadline.
    fn run(&self, board: &mut Board, updates: &Receiver<TokenUpdate>, shutdown: &AtomicBool) {
        let refresher = tick(self.refresh);
        self.render(board);

        while !shutdown.load(Ordering::Relaxed) && !self.expired() {
            select! {
                recv(updates) -> msg => match msg {
                    Ok(update) => apply(board, &update),
                    Err(_) => {
                        warn!("Feed channel closed");
                        break;
                    }
                },
                recv(refresher) -> _ => self.render(board),
                default(Duration::from_millis(POLL_MS)) => {},
            }
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn render(&self, board: &Board) {
        for column in &self.columns {
            info!("\n{}", render_column(*column, board.column(*column), self.state));
        }
    }
}

fn apply(board: &mut Board, update: &TokenUpdate) {
    match board.apply_update(update) {
        Some((column, PriceDirection::Up)) => {
            debug!("{} [{}] price UP -> {}", update.id, column, update.price)
        }
        Some((column, PriceDirection::Down)) => {
            debug!("{} [{}] price DOWN -> {}", update.id, column, update.price)
        }
        Some(_) => {}
        None => debug!("Update for unknown token {}", update.id),
    }
}

fn load_board(path: &Path) -> Result<Board> {
    let file = File::open(path)?;
    let board = Board::parse_from_reader(BufReader::new(file))?;
    info!("Board loaded from {}: {} tokens", path.display(), board.len());
    Ok(board)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}
