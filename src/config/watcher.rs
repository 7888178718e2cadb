//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::UpcheckConfig;

/// Watches the config file and emits every version that loads cleanly.
///
/// A change that fails to load is logged and dropped, so the engine
/// keeps checking with the configuration it already has.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<UpcheckConfig>,
}

impl ConfigWatcher {
    /// Create a watcher and the receiver its reloads arrive on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<UpcheckConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Another handle on the update channel, for reloads forced by
    /// signal rather than by file change.
    pub fn sender(&self) -> mpsc::UnboundedSender<UpcheckConfig> {
        self.update_tx.clone()
    }

    /// Start watching. The returned watcher must be kept alive for
    /// notifications to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    // Editors replace rather than rewrite, so create
                    // counts as a change too.
                    if !event.kind.is_modify() && !event.kind.is_create() {
                        return;
                    }
                    tracing::info!(path = %path.display(), "config file changed, reloading");
                    match load_config(&path) {
                        Ok(config) => {
                            let _ = tx.send(config);
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                "config reload failed, keeping current configuration"
                            );
                        }
                    }
                }
                Err(e) => tracing::error!(error = %e, "config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "config watcher started");
        Ok(watcher)
    }
}
