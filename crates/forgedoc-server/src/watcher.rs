//! File watching for rebuilds.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A Svelte, mdsvex or Markdown file was created or changed
    ContentModified(PathBuf),

    /// API data or the route manifest changed
    DataModified(PathBuf),

    /// File was deleted
    Deleted(PathBuf),

    /// Any other change
    Modified(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::ContentModified(p) | Self::DataModified(p) | Self::Deleted(p) | Self::Modified(p) => p,
        }
    }
}

/// Watches directories and forwards classified events.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch `paths` recursively. Paths that do not exist are skipped.
    ///
    /// Returns the watcher, which must be kept alive, and the event channel.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            } else {
                tracing::debug!("Not watching missing path {}", path.display());
            }
        }

        std::thread::spawn(move || {
            let debounce = Duration::from_millis(100);
            let mut last: Option<(PathBuf, Instant)> = None;

            while let Ok(event) = sync_rx.recv() {
                for path in event.paths {
                    let Some(watch_event) = classify_event(&path, &event.kind) else {
                        continue;
                    };

                    // Editors write the same file several times per save.
                    let now = Instant::now();
                    if let Some((last_path, at)) = &last {
                        if *last_path == path && now.duration_since(*at) < debounce {
                            continue;
                        }
                    }
                    last = Some((path, now));

                    if async_tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match kind {
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path.to_path_buf())),
        EventKind::Create(_) | EventKind::Modify(_) => Some(match ext {
            "svelte" | "svx" | "md" => WatchEvent::ContentModified(path.to_path_buf()),
            "json" | "toml" => WatchEvent::DataModified(path.to_path_buf()),
            _ => WatchEvent::Modified(path.to_path_buf()),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use notify::EventKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classifies_events() {
        let modify = EventKind::Modify(ModifyKind::Any);

        assert_eq!(
            classify_event(Path::new("a/+page.svx"), &modify),
            Some(WatchEvent::ContentModified(PathBuf::from("a/+page.svx")))
        );
        assert_eq!(
            classify_event(Path::new("api-data/rust/cli.json"), &EventKind::Create(CreateKind::File)),
            Some(WatchEvent::DataModified(PathBuf::from("api-data/rust/cli.json")))
        );
        assert_eq!(
            classify_event(Path::new("a.md"), &EventKind::Remove(RemoveKind::File)),
            Some(WatchEvent::Deleted(PathBuf::from("a.md")))
        );
        assert_eq!(classify_event(Path::new("a.md"), &EventKind::Any), None);
    }

    #[tokio::test]
    async fn watches_file_changes() {
        let temp = tempdir().unwrap();
        let test_file = temp.path().join("test.md");

        let (watcher, mut rx) = FileWatcher::new(&[temp.path().to_path_buf()]).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&test_file, "# Created").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;
        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        assert!(event.unwrap().is_some(), "channel should not be closed");
    }
}
