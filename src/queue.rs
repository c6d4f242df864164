use crate::watcher::FsChange;
use crate::{Result, WallpaperPickerError};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// A thumbnail that is on disk and waiting to be shown in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingThumbnail {
    pub cache_path: PathBuf,
    pub file_name: String,
}

/// FIFO shared between the workers (push) and the UI thread (drain).
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: Mutex<VecDeque<PendingThumbnail>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: PendingThumbnail) -> Result<()> {
        self.items
            .lock()
            .map_err(|_| WallpaperPickerError::LockAcquisition)?
            .push_back(item);
        Ok(())
    }

    /// Takes up to `max` items from the front.
    pub fn drain_batch(&self, max: usize) -> Result<Vec<PendingThumbnail>> {
        let mut items = self.items.lock().map_err(|_| WallpaperPickerError::LockAcquisition)?;
        let take = max.min(items.len());
        Ok(items.drain(..take).collect())
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Work marshaled onto the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiTask {
    PublishBatch,
    FileSystem(FsChange),
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Thread-safe handle for posting [`UiTask`]s to the UI run loop.
///
/// Publish requests are coalesced: while one `PublishBatch` is queued, further
/// requests are dropped.
#[derive(Clone)]
pub struct Scheduler {
    sender: Sender<UiTask>,
    publish_queued: Arc<AtomicBool>,
    waker: Option<Waker>,
}

impl Scheduler {
    pub fn new() -> (Self, Receiver<UiTask>) {
        let (sender, receiver) = mpsc::channel();
        let scheduler = Self {
            sender,
            publish_queued: Arc::new(AtomicBool::new(false)),
            waker: None,
        };
        (scheduler, receiver)
    }

    /// Called after every post so an idle UI loop can wake up and run the task.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    pub fn schedule_publish(&self) {
        // At most one publish task in flight; later requests ride along with it.
        if self.publish_queued.swap(true, Ordering::AcqRel) {
            return;
        }
        self.post(UiTask::PublishBatch);
    }

    pub fn schedule(&self, task: UiTask) {
        match task {
            UiTask::PublishBatch => self.schedule_publish(),
            other => self.post(other),
        }
    }

    /// Marks the queued publish task as taken. Must be called by the UI thread
    /// before it runs a `PublishBatch`.
    pub fn publish_started(&self) {
        self.publish_queued.store(false, Ordering::Release);
    }

    fn post(&self, task: UiTask) {
        if self.sender.send(task).is_err() {
            log::debug!("UI run loop is gone, dropping task");
            return;
        }
        if let Some(waker) = &self.waker {
            waker();
        }
    }
}
