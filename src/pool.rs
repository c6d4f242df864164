use crate::cache::ThumbnailCache;
use crate::processor::{self, ProcessOutcome};
use crate::queue::{PendingQueue, PendingThumbnail, Scheduler};
use crate::Result;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub generated: usize,
    pub cached: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.generated + self.cached + self.failed
    }
}

struct Shared {
    source_dir: PathBuf,
    cache: ThumbnailCache,
    thumbnail_size: u32,
    queue: Arc<PendingQueue>,
    scheduler: Scheduler,
}

impl Shared {
    /// Runs one job and, on success, hands the thumbnail to the UI.
    fn run(&self, file_name: &str) -> Option<ProcessOutcome> {
        self.run_job(file_name, || {
            processor::process(&self.source_dir, &self.cache, file_name, self.thumbnail_size)
        })
    }

    /// A panicking job (e.g. inside a decoder) counts as a failed one and
    /// leaves the worker alive.
    fn run_job<F>(&self, file_name: &str, job: F) -> Option<ProcessOutcome>
    where
        F: FnOnce() -> Result<ProcessOutcome>,
    {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                log::warn!("Error processing {}: {}", file_name, e);
                return None;
            }
            Err(payload) => {
                log::error!("Thumbnail job for {} panicked: {}", file_name, panic_message(&*payload));
                return None;
            }
        };

        let item = PendingThumbnail {
            cache_path: self.cache.path_for(file_name),
            file_name: file_name.to_owned(),
        };
        if let Err(e) = self.queue.push(item) {
            log::error!("Failed to queue thumbnail for {}: {}", file_name, e);
            return None;
        }
        self.scheduler.schedule_publish();
        Some(outcome)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Fixed-size thread pool that turns source images into cached thumbnails.
#[derive(Clone)]
pub struct WorkPool {
    pool: Arc<rayon::ThreadPool>,
    shared: Arc<Shared>,
}

impl WorkPool {
    pub fn new(
        workers: usize,
        source_dir: &Path,
        cache: ThumbnailCache,
        thumbnail_size: u32,
        queue: Arc<PendingQueue>,
        scheduler: Scheduler,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("thumbnail-worker-{}", i))
            // Without a handler rayon aborts the process on a panicking spawn.
            .panic_handler(|payload| log::error!("Thumbnail worker panicked: {}", panic_message(&*payload)))
            .build()?;

        Ok(Self {
            pool: Arc::new(pool),
            shared: Arc::new(Shared {
                source_dir: source_dir.to_path_buf(),
                cache,
                thumbnail_size,
                queue,
                scheduler,
            }),
        })
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.shared.cache
    }

    /// Queues a single job. Completion order between jobs is unspecified.
    pub fn submit(&self, file_name: String) {
        let shared = Arc::clone(&self.shared);
        self.pool.spawn(move || {
            shared.run(&file_name);
        });
    }

    /// Processes all `file_names` in parallel and blocks until every job is done.
    pub fn process_all(&self, file_names: &[String]) -> LoadSummary {
        let start = Instant::now();
        let shared = &self.shared;

        let outcomes: Vec<Option<ProcessOutcome>> = self
            .pool
            .install(|| file_names.par_iter().map(|name| shared.run(name)).collect());

        let mut summary = LoadSummary::default();
        for outcome in outcomes {
            match outcome {
                Some(ProcessOutcome::Generated) => summary.generated += 1,
                Some(ProcessOutcome::AlreadyCached) => summary.cached += 1,
                None => summary.failed += 1,
            }
        }
        summary.elapsed = start.elapsed();
        summary
    }

    /// Starts the initial bulk load on a dedicated loader thread so the caller
    /// never blocks. A final publish is scheduled once every job has finished.
    pub fn spawn_initial_load(&self, file_names: Vec<String>) -> std::io::Result<JoinHandle<LoadSummary>> {
        let pool = self.clone();
        std::thread::Builder::new()
            .name("thumbnail-loader".to_owned())
            .spawn(move || {
                let summary = pool.process_all(&file_names);
                log::info!(
                    "Initial thumbnail load: {} generated, {} cached, {} failed in {:.2}s",
                    summary.generated,
                    summary.cached,
                    summary.failed,
                    summary.elapsed.as_secs_f64()
                );
                pool.shared.scheduler.schedule_publish();
                summary
            })
    }
}
