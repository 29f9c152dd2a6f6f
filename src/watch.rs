use std::path::Path;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::debug;

use crate::commands::{CommandContext, CommandRegistry, UPDATE_BUILD_MANIFESTS};
use crate::project::{SourceFilter, WATCHED_DIRS};

/// Sync once, then again every time source files come or go in a watched
/// directory. Only returns if the watcher goes away or fails to start.
pub fn run(
    registry: &CommandRegistry,
    ctx: &CommandContext<'_>,
    root: &Path,
    sources: &SourceFilter,
    debounce: Duration,
) -> Result<()> {
    sync_pass(registry, ctx);

    let (tx, rx) = channel::<()>();
    let filter = sources.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(ev) = res {
            if is_source_change(&ev, &filter) {
                let _ = tx.send(());
            }
        }
    })
    .context("starting file watcher")?;

    let mut watched = 0;
    for dir in WATCHED_DIRS {
        let path = root.join(dir);
        if path.is_dir() {
            watcher
                .watch(&path, RecursiveMode::NonRecursive)
                .with_context(|| format!("watching {}", path.display()))?;
            watched += 1;
        }
    }
    ctx.host.info(&format!(
        "Watching {watched} source folder(s) under {} (Ctrl-C to stop)",
        root.display()
    ));

    while rx.recv().is_ok() {
        drain_with_debounce(&rx, debounce);
        debug!("source change detected");
        sync_pass(registry, ctx);
    }
    Ok(())
}

/// A failed pass is reported and the next change gets a fresh attempt.
fn sync_pass(registry: &CommandRegistry, ctx: &CommandContext<'_>) {
    if let Err(e) = registry.dispatch(UPDATE_BUILD_MANIFESTS, ctx) {
        ctx.host.error(&format!("{e:#}"));
    }
}

fn is_source_change(ev: &Event, sources: &SourceFilter) -> bool {
    let relevant = matches!(
        ev.kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    );
    relevant
        && ev.paths.iter().any(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| sources.matches(name))
        })
}

/// Swallow follow-up signals until the channel has been quiet for `debounce`.
fn drain_with_debounce(rx: &Receiver<()>, debounce: Duration) {
    while rx.recv_timeout(debounce).is_ok() {}
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::thread;
    use std::time::Instant;

    use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};

    use super::*;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn source_creation_and_removal_trigger() {
        let filter = SourceFilter::default();
        assert!(is_source_change(
            &event(EventKind::Create(CreateKind::File), "/p/lib/a.cpp"),
            &filter
        ));
        assert!(is_source_change(
            &event(EventKind::Remove(RemoveKind::Any), "/p/lib/a.cpp"),
            &filter
        ));
        assert!(is_source_change(
            &event(
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                "/p/bin/b.cpp"
            ),
            &filter
        ));
    }

    #[test]
    fn manifest_writes_and_content_edits_are_ignored() {
        let filter = SourceFilter::default();
        assert!(!is_source_change(
            &event(EventKind::Create(CreateKind::File), "/p/lib/CMakeLists.txt"),
            &filter
        ));
        assert!(!is_source_change(
            &event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                "/p/lib/a.cpp"
            ),
            &filter
        ));
    }

    #[test]
    fn debounce_waits_for_quiet_channel() {
        let (tx, rx) = channel::<()>();
        // a live sender keeps recv_timeout from returning early on disconnect
        let watcher_side = tx.clone();
        let sender = thread::spawn(move || {
            for _ in 0..3 {
                tx.send(()).expect("send");
                thread::sleep(Duration::from_millis(10));
            }
        });

        let started = Instant::now();
        drain_with_debounce(&rx, Duration::from_millis(100));
        sender.join().expect("sender thread");

        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(rx.try_recv().is_err());
        drop(watcher_side);
    }
}
