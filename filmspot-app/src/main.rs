use anyhow::Context;
use filmspot::{runtime::TokioSpawner, AppConfig, FilmSpotApp};

/// Desktop scouting map
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let spawner = TokioSpawner::shared();
    log::info!(
        "starting at {} (search {})",
        config.map.initial_center,
        if config.places.api_key.is_some() { "enabled" } else { "disabled" }
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Film Here"),
        ..Default::default()
    };

    eframe::run_native(
        "filmspot",
        options,
        Box::new(move |cc| Box::new(FilmSpotApp::new(config, spawner, Some(cc.egui_ctx.clone())))),
    )
    .map_err(|err| anyhow::anyhow!("eframe exited with an error: {}", err))?;

    Ok(())
}
