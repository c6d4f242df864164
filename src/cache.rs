use crate::{Result, WallpaperPickerError};
use sha1::{Digest, Sha1};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Thumbnail cache directory. Entries are keyed by the source file name only,
/// so the same name always maps to the same cache file.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
}

impl ThumbnailCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Opens the cache, creating the directory if it doesn't exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let cache = Self::new(dir);
        fs::create_dir_all(&cache.dir).map_err(WallpaperPickerError::CacheDirectoryCreation)?;
        Ok(cache)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn hash_name(file_name: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(file_name.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", Self::hash_name(file_name)))
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.path_for(file_name).exists()
    }

    /// Writes `bytes` as the cache entry for `file_name`.
    ///
    /// The data goes to a temporary file in the cache directory first and is then
    /// renamed into place, so readers never observe a partially written entry.
    /// Concurrent writers for the same name end with the last rename winning.
    pub fn store(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.path_for(file_name);
        let write_err = |source: io::Error| WallpaperPickerError::CacheWrite {
            path: target.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.persist(&target).map_err(|e| write_err(e.error))?;

        Ok(target)
    }

    /// Removes the cache entry for `file_name`. Returns whether a file was removed.
    pub fn remove(&self, file_name: &str) -> Result<bool> {
        let path = self.path_for(file_name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(WallpaperPickerError::CacheRemove { path, source }),
        }
    }
}
