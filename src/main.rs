use anyhow::{anyhow, Result};
use eframe::egui;
use lecture_show::gui::OverlayApp;
use lecture_show::logging;
use lecture_show::settings::{resolve_settings_path, LogSettings, SettingsStore};

fn main() -> Result<()> {
    let settings_path = resolve_settings_path()?;
    let log_settings = LogSettings::from_store(&SettingsStore::load_or_default(&settings_path));
    logging::init(log_settings.debug, log_settings.file);
    tracing::info!(settings = %settings_path.display(), "starting LectureShow");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("LectureShow")
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_visible(false),
        ..Default::default()
    };

    eframe::run_native(
        "LectureShow",
        native_options,
        Box::new(move |cc| Box::new(OverlayApp::new(cc, settings_path))),
    )
    .map_err(|err| anyhow!("run overlay window: {err}"))
}
