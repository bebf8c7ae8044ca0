use crate::schema::TallyConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Watches the config file and sends the re-parsed configuration after
/// every write. Writes that fail to parse are logged and dropped, so the
/// service keeps running on the last good configuration.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// let (_, mut rx) = tally_config::ConfigWatcher::spawn("/home/user/.config/tally/tally.toml");
/// while let Some(config) = rx.recv().await {
///     println!("capacity is now {}", config.series.capacity);
/// }
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path`.
    /// Returns the watcher handle and a receiver of reloaded configurations.
    pub fn spawn(path: impl AsRef<Path>) -> (Self, mpsc::Receiver<TallyConfig>) {
        let (tx, rx) = mpsc::channel(1);
        let path = path.as_ref().to_path_buf();
        let watcher = Self { path: path.clone() };

        tokio::spawn(watch_loop(path, tx));

        (watcher, rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<TallyConfig>) {
    use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

    let (sync_tx, mut sync_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = sync_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
        error!("Failed to watch '{}': {e}", path.display());
        return;
    }

    info!("Watching config file: {}", path.display());

    while let Some(event) = sync_rx.recv().await {
        match event {
            Ok(e) => {
                use notify::EventKind::*;
                if !matches!(e.kind, Modify(_) | Create(_)) {
                    continue;
                }
                match crate::load(&path) {
                    Ok(config) => {
                        if tx.send(config).await.is_err() {
                            break; // receiver dropped
                        }
                    }
                    Err(e) => warn!("Ignoring config change: {e}"),
                }
            }
            Err(e) => warn!("Watcher error: {e}"),
        }
    }
}
