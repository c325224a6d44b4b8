use log::warn;

use crate::app_context::AppContext;
use crate::settings::Settings;

mod aggregator;
mod app_context;
mod consts;
mod osc_server;
mod pipeline;
mod sample;
mod session;
mod settings;
mod speed_filter;
mod speedometer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::load_or_default() {
        Ok(settings) => settings,
        Err(error) => {
            warn!("Falling back to default settings: {}", error);
            Settings::default()
        }
    };

    let window_size = [280.0, 200.0];
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(window_size)
            .with_min_inner_size(window_size),
        ..Default::default()
    };

    let context = AppContext::new(settings)?;

    eframe::run_native(
        "Speedometer",
        options,
        Box::new(|_ctx| {
            Ok(Box::new(context))
        })
    ).map_err(|e| anyhow::anyhow!("{:?}", e))?;

    Ok(())
}
