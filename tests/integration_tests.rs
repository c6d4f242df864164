use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wallpaper_picker::picker::scan_directory;
use wallpaper_picker::{Activation, ChangeKind, Effect, FsChange, Key, PickerConfig, Scheme, WallpaperPicker};

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn write_image(path: &Path, width: u32, height: u32, shade: u8) {
        let is_gif = path.extension().map(|e| e == "gif").unwrap_or(false);
        if is_gif {
            image::RgbaImage::from_pixel(width, height, image::Rgba([shade, 64, 200, 255]))
                .save(path)
                .unwrap();
        } else {
            image::RgbImage::from_pixel(width, height, image::Rgb([shade, 64, 200]))
                .save(path)
                .unwrap();
        }
    }

    fn create_wallpaper_dir(temp_dir: &TempDir) -> PathBuf {
        let source = temp_dir.path().join("walls");
        fs::create_dir_all(&source).unwrap();

        write_image(&source.join("a.png"), 400, 300, 10);
        write_image(&source.join("b.jpg"), 300, 400, 120);
        write_image(&source.join("c.gif"), 128, 128, 240);
        fs::write(source.join("d.txt"), b"This is not an image").unwrap();

        source
    }

    fn picker_for(temp_dir: &TempDir, source: &Path) -> WallpaperPicker {
        let mut config = PickerConfig::new(source, temp_dir.path().join("cache"));
        config.watch = false;
        WallpaperPicker::new(config).unwrap()
    }

    /// Runs UI tasks until `done` holds or the timeout expires.
    fn pump_until(picker: &mut WallpaperPicker, mut done: impl FnMut(&WallpaperPicker) -> bool) -> bool {
        let deadline = Instant::now() + TIMEOUT;
        while Instant::now() < deadline {
            picker.run_pending();
            if done(picker) {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }

    fn loaded_picker(temp_dir: &TempDir, source: &Path) -> WallpaperPicker {
        let mut picker = picker_for(temp_dir, source);
        picker.start();
        picker.wait_for_initial_load().unwrap();
        let expected = picker.known_files().len();
        assert!(pump_until(&mut picker, |p| p.pending_len() == 0 && p.presenter().len() == expected));
        picker
    }

    #[test]
    fn test_end_to_end_load_filter_and_activate() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);

        let mut picker = loaded_picker(&temp_dir, &source);

        assert_eq!(picker.known_files(), ["a.png", "b.jpg", "c.gif"]);
        assert_eq!(picker.presenter().displayed(), ["a.png", "b.jpg", "c.gif"]);
        assert_eq!(picker.presenter().cursor(), None);
        for name in ["a.png", "b.jpg", "c.gif"] {
            assert!(picker.cache().contains(name), "missing cache entry for {}", name);
        }
        assert_eq!(fs::read_dir(picker.cache().dir()).unwrap().count(), 3);

        picker.set_query("b");
        assert_eq!(picker.presenter().displayed(), ["b.jpg"]);
        assert_eq!(picker.presenter().cursor(), Some(0));

        picker.handle_key(Key::Right, false, 1);
        assert_eq!(picker.presenter().cursor(), Some(0));

        let outcome = picker.handle_key(Key::Enter, false, 1);
        let expected = Activation::new(source.join("b.jpg"), Scheme::TonalSpot);
        assert_eq!(outcome.effects, vec![Effect::Activate(expected.clone())]);
        assert_eq!(expected.scheme.id(), "scheme-tonal-spot");
    }

    #[test]
    fn test_thumbnails_are_square_and_bounded() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);

        let picker = loaded_picker(&temp_dir, &source);

        for name in picker.known_files() {
            let record = picker.presenter().record(name).unwrap();
            assert_eq!(record.image.width(), record.image.height());
            assert!(record.image.width() <= 96);
        }
    }

    #[test]
    fn test_delete_while_filtered_empties_grid() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        let mut picker = loaded_picker(&temp_dir, &source);
        let cache_path = picker.cache().path_for("b.jpg");

        picker.set_query("b");
        fs::remove_file(source.join("b.jpg")).unwrap();
        picker.handle_fs_change(FsChange::new(ChangeKind::Deleted, "b.jpg"));

        assert!(picker.presenter().displayed().is_empty());
        assert_eq!(picker.presenter().cursor(), None);
        assert!(!picker.known_files().contains(&"b.jpg".to_owned()));
        assert!(!picker.presenter().contains("b.jpg"));
        assert!(!cache_path.exists());

        picker.set_query("");
        assert_eq!(picker.presenter().displayed(), ["a.png", "c.gif"]);
    }

    #[test]
    fn test_delete_of_unknown_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        let mut picker = loaded_picker(&temp_dir, &source);

        picker.handle_fs_change(FsChange::new(ChangeKind::Deleted, "d.txt"));
        assert_eq!(picker.presenter().displayed().len(), 3);
    }

    #[test]
    fn test_created_file_is_processed_and_shown() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        let mut picker = loaded_picker(&temp_dir, &source);

        write_image(&source.join("aa.bmp"), 200, 100, 50);
        picker.handle_fs_change(FsChange::new(ChangeKind::Created, "aa.bmp"));
        assert_eq!(picker.known_files(), ["a.png", "aa.bmp", "b.jpg", "c.gif"]);

        assert!(pump_until(&mut picker, |p| p.presenter().contains("aa.bmp")));
        assert_eq!(picker.presenter().displayed(), ["a.png", "aa.bmp", "b.jpg", "c.gif"]);

        fs::write(source.join("notes.txt"), b"hello").unwrap();
        picker.handle_fs_change(FsChange::new(ChangeKind::Created, "notes.txt"));
        assert_eq!(picker.known_files().len(), 4);
    }

    #[test]
    fn test_changed_file_regenerates_thumbnail() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        let mut picker = loaded_picker(&temp_dir, &source);
        let before = picker.presenter().revision("c.gif").unwrap();
        let old_bytes = fs::read(picker.cache().path_for("c.gif")).unwrap();

        write_image(&source.join("c.gif"), 48, 64, 30);
        picker.handle_fs_change(FsChange::new(ChangeKind::Changed, "c.gif"));

        assert!(pump_until(&mut picker, |p| p.presenter().revision("c.gif").unwrap_or(0) > before));
        assert_eq!(picker.presenter().len(), 3);

        let record = picker.presenter().record("c.gif").unwrap();
        assert_eq!((record.image.width(), record.image.height()), (48, 48));
        assert_ne!(fs::read(picker.cache().path_for("c.gif")).unwrap(), old_bytes);
    }

    #[test]
    fn test_created_over_known_file_regenerates_thumbnail() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        let mut picker = loaded_picker(&temp_dir, &source);
        let before = picker.presenter().revision("c.gif").unwrap();
        let old_bytes = fs::read(picker.cache().path_for("c.gif")).unwrap();

        // Replace the file the way editors do: write elsewhere, rename over it.
        let staging = temp_dir.path().join("staging.gif");
        write_image(&staging, 40, 70, 90);
        fs::rename(&staging, source.join("c.gif")).unwrap();
        picker.handle_fs_change(FsChange::new(ChangeKind::Created, "c.gif"));

        assert!(pump_until(&mut picker, |p| p.presenter().revision("c.gif").unwrap_or(0) > before));
        assert_eq!(picker.known_files().iter().filter(|n| *n == "c.gif").count(), 1);
        assert_eq!(picker.presenter().len(), 3);

        let record = picker.presenter().record("c.gif").unwrap();
        assert_eq!((record.image.width(), record.image.height()), (40, 40));
        assert_ne!(fs::read(picker.cache().path_for("c.gif")).unwrap(), old_bytes);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_includes_symlinked_wallpapers() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("walls");
        let store = temp_dir.path().join("store");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&store).unwrap();
        write_image(&source.join("a.png"), 32, 32, 10);
        write_image(&store.join("real.png"), 50, 30, 20);
        std::os::unix::fs::symlink(store.join("real.png"), source.join("linked.png")).unwrap();
        std::os::unix::fs::symlink(store.join("gone.png"), source.join("dangling.png")).unwrap();

        let files = scan_directory(&source).unwrap();
        assert_eq!(files, vec!["a.png".to_owned(), "linked.png".to_owned()]);

        let mut picker = picker_for(&temp_dir, &source);
        picker.start();
        assert!(pump_until(&mut picker, |p| p.presenter().contains("linked.png")));
        let record = picker.presenter().record("linked.png").unwrap();
        assert_eq!((record.image.width(), record.image.height()), (30, 30));
    }

    #[test]
    fn test_change_of_unknown_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        let mut picker = loaded_picker(&temp_dir, &source);

        picker.handle_fs_change(FsChange::new(ChangeKind::Changed, "zz.png"));
        thread::sleep(Duration::from_millis(100));
        picker.run_pending();

        assert!(!picker.known_files().contains(&"zz.png".to_owned()));
        assert_eq!(picker.presenter().len(), 3);
    }

    #[test]
    fn test_undecodable_image_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        fs::write(source.join("broken.png"), [0x89, 0x50, 0x4E, 0x47]).unwrap();

        let mut picker = picker_for(&temp_dir, &source);
        picker.start();
        let summary = picker.wait_for_initial_load().unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.generated, 3);

        assert!(pump_until(&mut picker, |p| p.pending_len() == 0 && p.presenter().len() == 3));
        assert!(!picker.presenter().contains("broken.png"));
        assert!(picker.known_files().contains(&"broken.png".to_owned()));
    }

    #[test]
    fn test_stale_cache_entry_is_skipped_on_publish() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        let mut picker = picker_for(&temp_dir, &source);

        // A cache entry that is not a decodable PNG is reused as-is but dropped when published.
        picker.cache().store("a.png", b"garbage").unwrap();
        picker.start();
        let summary = picker.wait_for_initial_load().unwrap();
        assert_eq!(summary.cached, 1);

        assert!(pump_until(&mut picker, |p| p.pending_len() == 0 && p.presenter().len() == 2));
        assert!(!picker.presenter().contains("a.png"));
    }

    #[test]
    fn test_publishing_happens_in_bounded_batches() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("walls");
        fs::create_dir_all(&source).unwrap();
        for i in 0..25 {
            write_image(&source.join(format!("wall{:02}.png", i)), 32, 32, i as u8);
        }

        let mut picker = picker_for(&temp_dir, &source);
        picker.start();
        assert_eq!(picker.wait_for_initial_load().unwrap().generated, 25);
        assert_eq!(picker.pending_len(), 25);

        assert_eq!(picker.run_pending(), 1);
        assert_eq!(picker.presenter().len(), 10);
        assert_eq!(picker.run_pending(), 1);
        assert_eq!(picker.presenter().len(), 20);
        assert_eq!(picker.run_pending(), 1);
        assert_eq!(picker.presenter().len(), 25);
        assert_eq!(picker.pending_len(), 0);
        assert_eq!(picker.run_pending(), 0);
    }

    #[test]
    fn test_pregenerate_reports_cache_hits() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        let picker = picker_for(&temp_dir, &source);

        let first = picker.pregenerate();
        assert_eq!((first.generated, first.cached, first.failed), (3, 0, 0));

        let second = picker.pregenerate();
        assert_eq!((second.generated, second.cached, second.failed), (0, 3, 0));
        assert_eq!(second.total(), 3);
    }

    #[test]
    fn test_missing_source_directory_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut picker = picker_for(&temp_dir, &temp_dir.path().join("does-not-exist"));

        assert!(picker.known_files().is_empty());
        picker.start();
        let summary = picker.wait_for_initial_load().unwrap();
        assert_eq!(summary.total(), 0);
        picker.run_pending();
        assert!(picker.presenter().is_empty());
    }

    #[test]
    #[serial]
    fn test_directory_watcher_picks_up_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_wallpaper_dir(&temp_dir);
        let staging = temp_dir.path().join("staging");
        fs::create_dir_all(&staging).unwrap();

        let mut config = PickerConfig::new(&source, temp_dir.path().join("cache"));
        config.watch = true;
        let mut picker = WallpaperPicker::new(config).unwrap();
        picker.start();
        assert!(picker.is_watching());
        picker.wait_for_initial_load().unwrap();
        assert!(pump_until(&mut picker, |p| p.presenter().len() == 3));

        write_image(&staging.join("new.png"), 100, 100, 77);
        fs::rename(staging.join("new.png"), source.join("new.png")).unwrap();
        assert!(pump_until(&mut picker, |p| p.presenter().contains("new.png")));

        fs::remove_file(source.join("new.png")).unwrap();
        assert!(pump_until(&mut picker, |p| !p.presenter().contains("new.png")));
        assert!(!picker.known_files().contains(&"new.png".to_owned()));
    }
}
