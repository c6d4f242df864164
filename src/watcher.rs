use crate::queue::{Scheduler, UiTask};
use crate::Result;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
}

/// A change to a single entry of the wallpaper directory, identified by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsChange {
    pub kind: ChangeKind,
    pub file_name: String,
}

impl FsChange {
    pub fn new(kind: ChangeKind, file_name: impl Into<String>) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
        }
    }

    fn from_path(kind: ChangeKind, path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        Some(Self::new(kind, file_name))
    }
}

/// Translates a raw notify event into directory changes.
///
/// Renames become a delete of the old name and a create of the new one;
/// access and metadata-only events are dropped.
pub fn changes_from_event(event: &Event) -> Vec<FsChange> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Deleted,
        EventKind::Modify(ModifyKind::Name(mode)) => return rename_changes(mode, event),
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => ChangeKind::Changed,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter_map(|path| FsChange::from_path(kind, path))
        .collect()
}

fn rename_changes(mode: RenameMode, event: &Event) -> Vec<FsChange> {
    match (mode, event.paths.as_slice()) {
        (RenameMode::Both, [from, to]) => FsChange::from_path(ChangeKind::Deleted, from)
            .into_iter()
            .chain(FsChange::from_path(ChangeKind::Created, to))
            .collect(),
        (RenameMode::From, paths) => paths
            .iter()
            .filter_map(|p| FsChange::from_path(ChangeKind::Deleted, p))
            .collect(),
        (RenameMode::To, paths) => paths
            .iter()
            .filter_map(|p| FsChange::from_path(ChangeKind::Created, p))
            .collect(),
        // Direction unknown: decide by whether the path is still there.
        (_, paths) => paths
            .iter()
            .filter_map(|p| {
                let kind = if p.exists() { ChangeKind::Created } else { ChangeKind::Deleted };
                FsChange::from_path(kind, p)
            })
            .collect(),
    }
}

/// Watches the wallpaper directory and forwards changes to the UI thread.
/// Dropping it unsubscribes.
pub struct DirectoryWatcher {
    _watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    pub fn start(dir: &Path, scheduler: Scheduler) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in changes_from_event(&event) {
                    scheduler.schedule(UiTask::FileSystem(change));
                }
            }
            Err(e) => log::error!("Wallpaper directory watch error: {}", e),
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        log::info!("Started wallpaper directory watcher for: {}", dir.display());
        Ok(Self { _watcher: watcher })
    }
}
