//! Live reload of the mapping table
//!
//! The compiled table is never mutated in place. A reload builds a fresh
//! [`Keymap`] and publishes it through [`SharedKeymap::replace`]; readers
//! hold an `Arc` snapshot for the duration of one key event.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};

use super::defaults::{load_mappings, mappings_watch_paths, MappingsResult, MappingsSource};
use super::keymap::Keymap;

/// Atomically swappable handle to the current table
#[derive(Debug, Clone, Default)]
pub struct SharedKeymap {
    inner: Arc<RwLock<Arc<Keymap>>>,
}

impl SharedKeymap {
    pub fn new(keymap: Keymap) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(keymap))),
        }
    }

    /// The table currently in effect
    pub fn snapshot(&self) -> Arc<Keymap> {
        // A poisoned lock still holds a complete table
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a new table, returning the previous one
    pub fn replace(&self, keymap: Keymap) -> Arc<Keymap> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(keymap))
    }

    /// Rebuild from defaults plus `source` and publish the result
    ///
    /// A directory source is searched again, so the file loaded may differ
    /// from the one loaded at startup.
    pub fn reload(&self, source: Option<&MappingsSource>, strict: bool) -> MappingsResult {
        let result = match source {
            Some(source) => source.load(strict),
            None => load_mappings(None, strict),
        };
        self.replace(result.keymap.clone());
        tracing::info!(
            "Reloaded mappings ({} groups, {} errors)",
            result.keymap.len(),
            result.errors.len()
        );
        result
    }
}

type DebounceResult = Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>;

/// Debounced watcher for the user mapping files
///
/// Watches the parent directories non-recursively, since editors commonly
/// replace files by rename, and filters events down to the watched paths.
pub struct MappingsWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    rx: Receiver<DebounceResult>,
    paths: Vec<PathBuf>,
}

impl MappingsWatcher {
    /// Events are debounced with a 300ms delay to coalesce save bursts
    pub fn new(source: &MappingsSource) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let mut debouncer = new_debouncer(Duration::from_millis(300), tx)?;

        let paths = mappings_watch_paths(source);
        let mut dirs: Vec<&Path> = paths.iter().filter_map(|p| p.parent()).collect();
        dirs.dedup();
        for dir in dirs {
            debouncer
                .watcher()
                .watch(dir, notify::RecursiveMode::NonRecursive)?;
            tracing::info!("Watching {} for mapping changes", dir.display());
        }

        Ok(Self {
            _debouncer: debouncer,
            rx,
            paths,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Drain pending events without blocking
    ///
    /// Returns `true` when any watched file changed since the last poll.
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(events) => {
                    changed |= events.iter().any(|event| {
                        event.kind != DebouncedEventKind::AnyContinuous
                            && self.is_watched(&event.path)
                    });
                }
                Err(e) => tracing::warn!("Mappings watcher error: {:?}", e),
            }
        }
        if changed {
            tracing::debug!("Mapping file changed");
        }
        changed
    }

    fn is_watched(&self, path: &Path) -> bool {
        // Only the parent directories are watched, so the name is enough
        self.paths.iter().any(|p| p.file_name() == path.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::action::Action;
    use crate::keymap::config::{RawBindingGroup, RawMappings};

    fn keymap(action: &str) -> Keymap {
        Keymap::from_raw(&RawMappings {
            schema: None,
            bindings: vec![RawBindingGroup::global([("cmd-w", Action::simple(action))])],
        })
        .unwrap()
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let shared = SharedKeymap::new(keymap("scratch::close"));
        let before = shared.snapshot();

        let previous = shared.replace(keymap("app::quit"));
        assert!(Arc::ptr_eq(&before, &previous));

        let none: Vec<&str> = Vec::new();
        assert_eq!(
            before.resolve("cmd-w", &none).unwrap().action_id,
            "scratch::close"
        );
        assert_eq!(
            shared.snapshot().resolve("cmd-w", &none).unwrap().action_id,
            "app::quit"
        );
    }

    #[test]
    fn test_clones_share_state() {
        let shared = SharedKeymap::default();
        let other = shared.clone();
        other.replace(keymap("app::quit"));
        assert_eq!(shared.snapshot().len(), 1);
    }

    #[test]
    fn test_reload_publishes_result() {
        let shared = SharedKeymap::default();
        let result = shared.reload(None, false);
        assert!(result.is_ok());
        assert_eq!(*shared.snapshot(), result.keymap);
    }

    #[test]
    fn test_reload_from_dir_picks_up_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = MappingsSource::Dir(dir.path().to_path_buf());
        let shared = SharedKeymap::default();
        let none: Vec<&str> = Vec::new();

        shared.reload(Some(&source), false);
        assert!(shared.snapshot().resolve("cmd-alt-z", &none).is_none());

        std::fs::write(
            dir.path().join("mappings.jsonc"),
            "{\"bindings\": [{\"bindings\": {\"cmd-alt-z\": \"app::quit\"}}]} // added",
        )
        .unwrap();
        let result = shared.reload(Some(&source), false);
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(
            shared.snapshot().resolve("cmd-alt-z", &none).unwrap().action_id,
            "app::quit"
        );
    }

    #[test]
    fn test_watcher_starts_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = MappingsWatcher::new(&MappingsSource::Dir(dir.path().to_path_buf())).unwrap();
        assert_eq!(watcher.paths().len(), 3);
        assert!(!watcher.poll_changed());

        let file = MappingsSource::File(dir.path().join("custom.yaml"));
        let watcher = MappingsWatcher::new(&file).unwrap();
        assert_eq!(watcher.paths(), [dir.path().join("custom.yaml")]);
    }
}
