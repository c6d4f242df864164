use clap::Parser;
use std::path::{Path, PathBuf};

pub mod activation;
pub mod app;
pub mod cache;
pub mod navigation;
pub mod picker;
pub mod pool;
pub mod presenter;
pub mod processor;
pub mod queue;
pub mod scheme;
pub mod watcher;

pub use activation::Activation;
pub use app::PickerApp;
pub use cache::ThumbnailCache;
pub use navigation::Direction;
pub use picker::{Effect, Key, KeyOutcome, PickerConfig, WallpaperPicker};
pub use pool::{LoadSummary, WorkPool};
pub use presenter::{GridPresenter, ThumbnailRecord};
pub use processor::ProcessOutcome;
pub use queue::{PendingQueue, PendingThumbnail, Scheduler, UiTask};
pub use scheme::Scheme;
pub use watcher::{ChangeKind, DirectoryWatcher, FsChange};

#[derive(Debug, thiserror::Error)]
pub enum WallpaperPickerError {
    #[error("Failed to create thread pool: {0}")]
    ThreadPoolCreation(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to create thumbnail cache directory: {0}")]
    CacheDirectoryCreation(std::io::Error),

    #[error("Failed to read wallpaper directory {path}: {source}")]
    SourceDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to encode thumbnail for {path}: {source}")]
    ImageEncode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to write thumbnail cache file {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove thumbnail cache file {path}: {source}")]
    CacheRemove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to watch wallpaper directory: {0}")]
    Watcher(#[from] notify::Error),

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("Failed to save selected image path: {0}")]
    SaveSelectedImage(std::io::Error),

    #[error("Lock acquisition failed")]
    LockAcquisition,
}

pub type Result<T> = std::result::Result<T, WallpaperPickerError>;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 96;
pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_ITEM_WIDTH: f32 = 108.0;
pub const DEFAULT_COMMAND: &str = "matugen";
const APP_NAME: &str = "wallpaper-picker";

#[derive(Parser, Clone, Debug)]
#[command(name = "wallpaper-picker")]
#[command(about = "Pick a wallpaper from a thumbnail grid and theme the desktop from it")]
pub struct Args {
    #[arg(short, long, default_value_os_t = default_wallpaper_dir())]
    pub directory: PathBuf,

    #[arg(long, help = "Thumbnail cache directory [default: <user cache>/wallpaper-picker/thumbnails]")]
    pub cache_dir: Option<PathBuf>,

    #[arg(short, long, default_value_t = DEFAULT_THUMBNAIL_SIZE)]
    pub thumbnail_size: u32,

    #[arg(short, long, default_value = DEFAULT_COMMAND)]
    pub command: String,

    #[arg(long, value_enum, default_value_t = Scheme::default())]
    pub scheme: Scheme,

    #[arg(short, long, default_value_t = DEFAULT_WORKER_COUNT, help = "Thumbnail worker threads (0 = one per CPU)")]
    pub workers: usize,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_ITEM_WIDTH)]
    pub item_width: f32,

    #[arg(short, long, help = "Write the path of the applied wallpaper to this file")]
    pub selected_image_file: Option<PathBuf>,

    #[arg(long, help = "Do not watch the wallpaper directory for changes")]
    pub no_watch: bool,

    #[arg(long, help = "Enable debug output")]
    pub debug: bool,

    #[arg(long, help = "Pre-generate all thumbnails and exit (don't show GUI)")]
    pub pregenerate: bool,
}

impl Args {
    pub fn picker_config(&self) -> PickerConfig {
        let workers = if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        };

        PickerConfig {
            source_dir: self.directory.clone(),
            cache_dir: self.cache_dir.clone().unwrap_or_else(default_cache_dir),
            thumbnail_size: self.thumbnail_size.max(1),
            workers,
            batch_size: self.batch_size.max(1),
            item_width: self.item_width,
            command: self.command.clone(),
            scheme: self.scheme,
            selected_image_file: self.selected_image_file.clone(),
            watch: !self.no_watch,
        }
    }
}

pub fn default_wallpaper_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
        .map(|p| p.join("Wallpapers"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_cache_dir() -> PathBuf {
    let cache_home = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"));

    cache_home.join(APP_NAME).join("thumbnails")
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext_str| IMAGE_EXTENSIONS.iter().any(|&valid_ext| valid_ext.eq_ignore_ascii_case(ext_str)))
        .unwrap_or(false)
}

pub fn validate_command(command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(WallpaperPickerError::CommandExecution("Empty command".to_owned()));
    }
    Ok(())
}
