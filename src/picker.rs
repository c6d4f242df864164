use crate::activation::Activation;
use crate::cache::ThumbnailCache;
use crate::navigation::Direction;
use crate::pool::{LoadSummary, WorkPool};
use crate::presenter::{GridPresenter, ThumbnailRecord};
use crate::queue::{PendingQueue, PendingThumbnail, Scheduler, UiTask};
use crate::scheme::Scheme;
use crate::watcher::{ChangeKind, DirectoryWatcher, FsChange};
use crate::{is_image_file, Result, WallpaperPickerError};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct PickerConfig {
    pub source_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub thumbnail_size: u32,
    pub workers: usize,
    pub batch_size: usize,
    pub item_width: f32,
    pub command: String,
    pub scheme: Scheme,
    pub selected_image_file: Option<PathBuf>,
    pub watch: bool,
}

impl PickerConfig {
    pub fn new(source_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            cache_dir: cache_dir.into(),
            thumbnail_size: crate::DEFAULT_THUMBNAIL_SIZE,
            workers: crate::DEFAULT_WORKER_COUNT,
            batch_size: crate::DEFAULT_BATCH_SIZE,
            item_width: crate::DEFAULT_ITEM_WIDTH,
            command: crate::DEFAULT_COMMAND.to_owned(),
            scheme: Scheme::default(),
            selected_image_file: None,
            watch: true,
        }
    }
}

/// Keys the picker reacts to while the search field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    KeypadEnter,
    Other,
}

impl Key {
    fn direction(self) -> Option<Direction> {
        match self {
            Key::Up => Some(Direction::Up),
            Key::Down => Some(Direction::Down),
            Key::Left => Some(Direction::Left),
            Key::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Side effects requested by input handling, carried out by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Activate(Activation),
    SchemeChanged(Scheme),
    OpenSchemeMenu,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    pub handled: bool,
    pub effects: Vec<Effect>,
}

impl KeyOutcome {
    fn handled(effects: impl IntoIterator<Item = Effect>) -> Self {
        Self {
            handled: true,
            effects: effects.into_iter().collect(),
        }
    }

    fn ignored() -> Self {
        Self::default()
    }
}

/// Lists the recognised images directly inside `dir`, sorted by name.
pub fn scan_directory(dir: &Path) -> Result<Vec<String>> {
    std::fs::metadata(dir).map_err(|source| WallpaperPickerError::SourceDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    // Symlinked wallpapers count; dangling links surface as errors and are skipped.
    let mut files: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image_file(e.path()))
        .filter_map(|e| e.file_name().to_str().map(str::to_owned))
        .collect();
    files.sort();

    Ok(files)
}

/// The wallpaper picker component.
///
/// Owns the worker pool, the directory watcher, the known file names and the
/// grid state. Everything except the pool jobs and the watcher callback runs on
/// the thread that calls [`WallpaperPicker::run_pending`].
pub struct WallpaperPicker {
    config: PickerConfig,
    known: Vec<String>,
    presenter: GridPresenter,
    queue: Arc<PendingQueue>,
    scheduler: Scheduler,
    tasks: Receiver<UiTask>,
    pool: WorkPool,
    scheme: Scheme,
    watcher: Option<DirectoryWatcher>,
    loader: Option<JoinHandle<LoadSummary>>,
}

impl WallpaperPicker {
    pub fn new(config: PickerConfig) -> Result<Self> {
        let (scheduler, tasks) = Scheduler::new();
        Self::build(config, scheduler, tasks)
    }

    /// Like [`WallpaperPicker::new`], calling `waker` whenever UI work is posted.
    pub fn with_waker(config: PickerConfig, waker: impl Fn() + Send + Sync + 'static) -> Result<Self> {
        let (scheduler, tasks) = Scheduler::new();
        Self::build(config, scheduler.with_waker(waker), tasks)
    }

    fn build(config: PickerConfig, scheduler: Scheduler, tasks: Receiver<UiTask>) -> Result<Self> {
        let cache = ThumbnailCache::open(&config.cache_dir)?;
        log::debug!("Using thumbnail cache directory: {:?}", cache.dir());

        let queue = Arc::new(PendingQueue::new());
        let pool = WorkPool::new(
            config.workers,
            &config.source_dir,
            cache,
            config.thumbnail_size,
            Arc::clone(&queue),
            scheduler.clone(),
        )?;

        let known = match scan_directory(&config.source_dir) {
            Ok(files) => files,
            Err(e) => {
                log::error!("{}", e);
                Vec::new()
            }
        };
        log::debug!("Found {} wallpapers in {:?}", known.len(), config.source_dir);

        Ok(Self {
            scheme: config.scheme,
            config,
            known,
            presenter: GridPresenter::new(),
            queue,
            scheduler,
            tasks,
            pool,
            watcher: None,
            loader: None,
        })
    }

    /// Starts the initial thumbnail load and, if enabled, the directory watcher.
    pub fn start(&mut self) {
        match self.pool.spawn_initial_load(self.known.clone()) {
            Ok(handle) => self.loader = Some(handle),
            Err(e) => log::error!("Failed to start thumbnail loader: {}", e),
        }

        if self.config.watch && self.watcher.is_none() {
            match DirectoryWatcher::start(&self.config.source_dir, self.scheduler.clone()) {
                Ok(watcher) => self.watcher = Some(watcher),
                Err(e) => log::error!("{}", e),
            }
        }
    }

    /// Blocks until the initial load started by [`WallpaperPicker::start`] is done.
    pub fn wait_for_initial_load(&mut self) -> Option<LoadSummary> {
        self.loader.take()?.join().ok()
    }

    /// Generates every missing thumbnail, blocking the caller.
    pub fn pregenerate(&self) -> LoadSummary {
        self.pool.process_all(&self.known)
    }

    /// Runs the UI tasks posted so far. Tasks posted while running, such as a
    /// follow-up publish pass, wait for the next call.
    pub fn run_pending(&mut self) -> usize {
        let tasks: Vec<UiTask> = self.tasks.try_iter().collect();
        let count = tasks.len();

        for task in tasks {
            match task {
                UiTask::PublishBatch => {
                    self.publish_batch();
                }
                UiTask::FileSystem(change) => self.handle_fs_change(change),
            }
        }
        count
    }

    /// Moves up to one batch of finished thumbnails into the grid. Requeues
    /// itself while items remain. Returns how many thumbnails were added.
    pub fn publish_batch(&mut self) -> usize {
        // Clear the flag before draining so a job finishing mid-drain queues a fresh pass.
        self.scheduler.publish_started();

        let batch = match self.queue.drain_batch(self.config.batch_size) {
            Ok(batch) => batch,
            Err(e) => {
                log::error!("Failed to take thumbnails from queue: {}", e);
                return 0;
            }
        };

        let mut published = 0;
        for PendingThumbnail { cache_path, file_name } in batch {
            // The file may have been deleted while its job was still running.
            if !self.is_known(&file_name) {
                log::debug!("Skipping thumbnail for removed file {}", file_name);
                continue;
            }
            match image::open(&cache_path) {
                Ok(img) => {
                    self.presenter.upsert(ThumbnailRecord {
                        file_name,
                        image: img.to_rgba8(),
                    });
                    published += 1;
                }
                Err(e) => log::warn!("Error loading thumbnail {:?}: {}", cache_path, e),
            }
        }

        if published > 0 {
            self.presenter.refresh();
        }
        // Anything left over goes to a follow-up pass.
        if !self.queue.is_empty() {
            self.scheduler.schedule_publish();
        }
        published
    }

    pub fn handle_fs_change(&mut self, change: FsChange) {
        let FsChange { kind, file_name } = change;

        match kind {
            ChangeKind::Deleted => {
                let Ok(pos) = self.known.binary_search(&file_name) else {
                    return;
                };
                self.known.remove(pos);
                self.invalidate_cache(&file_name);
                self.presenter.remove(&file_name);
                self.presenter.refresh();
                log::debug!("Removed wallpaper {}", file_name);
            }
            ChangeKind::Created => {
                if !is_image_file(Path::new(&file_name)) {
                    return;
                }
                match self.known.binary_search(&file_name) {
                    Err(pos) => {
                        self.known.insert(pos, file_name.clone());
                        log::debug!("New wallpaper {}", file_name);
                    }
                    // Moved over an existing name (e.g. an atomic save): the old
                    // thumbnail is stale.
                    Ok(_) => {
                        self.invalidate_cache(&file_name);
                        log::debug!("Wallpaper {} replaced, regenerating thumbnail", file_name);
                    }
                }
                self.pool.submit(file_name);
            }
            ChangeKind::Changed => {
                if !is_image_file(Path::new(&file_name)) || !self.is_known(&file_name) {
                    return;
                }
                self.invalidate_cache(&file_name);
                log::debug!("Wallpaper {} changed, regenerating thumbnail", file_name);
                self.pool.submit(file_name);
            }
        }
    }

    fn invalidate_cache(&self, file_name: &str) {
        // Failure only logs; the next change for this file retries.
        if let Err(e) = self.pool.cache().remove(file_name) {
            log::warn!("{}", e);
        }
    }

    pub fn set_query(&mut self, query: &str) {
        self.presenter.set_query(query);
    }

    pub fn handle_key(&mut self, key: Key, shift: bool, columns: usize) -> KeyOutcome {
        if shift {
            match key {
                Key::Up => return KeyOutcome::handled([Effect::SchemeChanged(self.cycle_scheme(false))]),
                Key::Down => return KeyOutcome::handled([Effect::SchemeChanged(self.cycle_scheme(true))]),
                Key::Right => return KeyOutcome::handled([Effect::OpenSchemeMenu]),
                _ => {}
            }
        }

        if let Some(direction) = key.direction() {
            self.presenter.move_cursor(direction, columns);
            return KeyOutcome::handled(None);
        }

        match key {
            Key::Enter | Key::KeypadEnter => KeyOutcome::handled(self.selected_activation().map(Effect::Activate)),
            _ => KeyOutcome::ignored(),
        }
    }

    /// The activation for the item under the cursor, if any.
    pub fn selected_activation(&self) -> Option<Activation> {
        let name = self.presenter.selected()?;
        Some(Activation::new(self.config.source_dir.join(name), self.scheme))
    }

    /// Selects the displayed item at `index` (e.g. on click) and returns its activation.
    pub fn activate_index(&mut self, index: usize) -> Option<Activation> {
        self.presenter.select(index)?;
        self.selected_activation()
    }

    /// Runs the theming command for `activation` in the background.
    pub fn dispatch(&self, activation: Activation) {
        let result = activation.dispatch(self.config.command.clone(), self.config.selected_image_file.clone());
        if let Err(e) = result {
            log::error!("Failed to start theme command: {}", e);
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn set_scheme(&mut self, scheme: Scheme) {
        if scheme != self.scheme {
            self.scheme = scheme;
            log::info!("Color scheme selected: {}", scheme.id());
        }
    }

    fn cycle_scheme(&mut self, forward: bool) -> Scheme {
        let next = if forward { self.scheme.next() } else { self.scheme.previous() };
        self.set_scheme(next);
        next
    }

    fn is_known(&self, file_name: &str) -> bool {
        self.known.binary_search_by(|n| n.as_str().cmp(file_name)).is_ok()
    }

    pub fn known_files(&self) -> &[String] {
        &self.known
    }

    pub fn presenter(&self) -> &GridPresenter {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut GridPresenter {
        &mut self.presenter
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn cache(&self) -> &ThumbnailCache {
        self.pool.cache()
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}

impl Drop for WallpaperPicker {
    fn drop(&mut self) {
        if self.watcher.take().is_some() {
            log::debug!("Stopped wallpaper directory watcher");
        }
    }
}
