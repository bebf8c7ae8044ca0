//! Service loop for `tally`.
//!
//! Owns the dashboard data and wires together all background tasks:
//! - Producer commands (Unix socket and/or stdin)
//! - Periodic flush of today's counters
//! - Daily rollover check (new counter day, pie reset)
//! - Config file watcher (live reload on change)

pub mod dashboard;

pub use dashboard::{Dashboard, DashboardSnapshot, Handled};
pub use tally_config::default_path;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tally_config::{load as load_config, ConfigWatcher};
use tally_core::{LocalClock, Message, Result};
use tally_ingest::{spawn_stdin_listener, ProducerEvent, ProducerSocket};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Run the dashboard service until Ctrl-C.
pub async fn run(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let mut dashboard = Dashboard::from_config(config.clone(), Arc::new(LocalClock))?;
    if let Some(dir) = dashboard.counters().log_dir() {
        info!("Counter history in {}", dir.display());
    }

    // ── Producers ─────────────────────────────────────────────────────────────
    let (tx, mut producers) = tally_ingest::channel();
    let _socket = match &config.ingest.socket {
        Some(path) => Some(ProducerSocket::bind(path, tx.clone())?),
        None => None,
    };
    if config.ingest.stdin {
        spawn_stdin_listener(tx.clone());
    }
    drop(tx);

    // ── Timers ────────────────────────────────────────────────────────────────
    let mut flush = ticker(config.counters.flush_interval_secs);
    let mut rollover = ticker(config.runtime.rollover_check_secs);

    // ── Config ────────────────────────────────────────────────────────────────
    let (_watcher, mut reloads) = ConfigWatcher::spawn(&config_path);

    loop {
        let message = tokio::select! {
            Some(event) = producers.recv() => match convert_event(event) {
                Some(message) => message,
                None => continue,
            },
            _ = flush.tick() => Message::FlushTick,
            _ = rollover.tick() => Message::RolloverTick,
            Some(config) = reloads.recv() => {
                if let Err(e) = dashboard.apply_config(config) {
                    warn!("Config reload failed: {e}");
                }
                continue;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                Message::Shutdown
            }
        };

        match dashboard.handle(message) {
            Ok(Handled::Continue) => {}
            Ok(Handled::Exported(path)) => info!("Export written to {}", path.display()),
            Ok(Handled::Stop) => break,
            // In-memory state stays valid; the next flush retries persistence.
            Err(e) => warn!("{e}"),
        }
    }

    info!("tally stopped");
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ticker(secs: u64) -> tokio::time::Interval {
    let mut ticker = interval(Duration::from_secs(secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Map a producer event to a bus message, logging and dropping the rest.
fn convert_event(event: ProducerEvent) -> Option<Message> {
    match event {
        ProducerEvent::Command(message) => Some(message),
        ProducerEvent::Malformed { command, reason } => {
            warn!("Ignoring malformed '{command}' command: {reason}");
            None
        }
        ProducerEvent::Unknown(line) => {
            debug!("Ignoring unknown producer line: {line}");
            None
        }
    }
}

/// Load `path` and report whether it parses, for `--check`.
pub fn check_config(path: &Path) -> Result<()> {
    match load_config(path) {
        Ok(config) => {
            info!(
                "Config OK: {} axes, {} counter labels, {} gauges",
                config.series.axes.len(),
                config.counters.labels.len(),
                config.gauges.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("Config invalid: {e}");
            Err(e)
        }
    }
}
