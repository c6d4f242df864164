use crate::scheme::Scheme;
use crate::{Result, WallpaperPickerError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread::JoinHandle;

/// A wallpaper the user confirmed, together with the scheme to theme it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub path: PathBuf,
    pub scheme: Scheme,
}

impl Activation {
    pub fn new(path: PathBuf, scheme: Scheme) -> Self {
        Self { path, scheme }
    }

    /// Builds `<tool...> image <path> -t <scheme-id>`. `tool` may carry leading
    /// arguments of its own.
    pub fn command(&self, tool: &str) -> Result<Command> {
        let mut parts = tool.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| WallpaperPickerError::CommandExecution("Empty command".to_owned()))?;

        let mut cmd = Command::new(program);
        cmd.args(parts)
            .arg("image")
            .arg(&self.path)
            .arg("-t")
            .arg(self.scheme.id());
        Ok(cmd)
    }

    /// Runs the theming command to completion.
    pub fn run(&self, tool: &str) -> Result<()> {
        let output = self
            .command(tool)?
            .output()
            .map_err(|e| WallpaperPickerError::CommandExecution(e.to_string()))?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            return Err(WallpaperPickerError::CommandExecution(error_msg.into_owned()));
        }

        Ok(())
    }

    /// Runs the theming command on a background thread. Failures are logged; on
    /// success the chosen path is recorded in `selected_image_file` if given.
    pub fn dispatch(self, tool: String, selected_image_file: Option<PathBuf>) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new().name("theme-command".to_owned()).spawn(move || {
            log::info!("Applying {:?} with {}", self.path, self.scheme.id());
            if let Err(e) = self.run(&tool) {
                log::error!("Failed to apply wallpaper {:?}: {}", self.path, e);
                return;
            }
            if let Some(file) = selected_image_file {
                if let Err(e) = save_selected_image(&file, &self.path) {
                    log::warn!("{}", e);
                }
            }
        })
    }
}

pub fn save_selected_image(file: &Path, path: &Path) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(WallpaperPickerError::SaveSelectedImage)?;
    }

    let path_str = path.to_string_lossy();
    fs::write(file, path_str.as_bytes()).map_err(WallpaperPickerError::SaveSelectedImage)?;

    Ok(())
}
