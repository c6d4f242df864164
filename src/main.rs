use clap::Parser;
use wallpaper_picker::{validate_command, Args, PickerApp, WallpaperPicker};

const DEFAULT_WINDOW_WIDTH: f32 = 800.0;
const DEFAULT_WINDOW_HEIGHT: f32 = 600.0;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    validate_command(&args.command)?;
    let config = args.picker_config();

    if args.pregenerate {
        let picker = WallpaperPicker::new(config)?;
        let total = picker.known_files().len();
        println!("Generating thumbnails for {} images...", total);

        let summary = picker.pregenerate();
        println!(
            "Thumbnail generation complete: {} cached, {} generated, {} failed ({:.1}s)",
            summary.cached,
            summary.generated,
            summary.failed,
            summary.elapsed.as_secs_f64()
        );
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT])
            .with_title("Wallpapers"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Wallpaper Picker",
        options,
        Box::new(move |cc: &eframe::CreationContext<'_>| -> Result<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>> {
            let ctx = cc.egui_ctx.clone();
            let mut picker = WallpaperPicker::with_waker(config, move || ctx.request_repaint())?;
            picker.start();
            Ok(Box::new(PickerApp::new(picker)) as Box<dyn eframe::App>)
        }),
    );

    match result {
        Ok(_) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Failed to run application: {:?}", e)),
    }
}
