use std::time::Duration;

use eframe::Frame;
use egui::{CentralPanel, Context, RichText, TopBottomPanel};
use log::warn;
use tokio::sync::watch;

use crate::consts::SPEED_UNIT;
use crate::settings::Settings;
use crate::speedometer::Speedometer;

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct AppContext {
    sampling: bool,
    settings: Settings,
    speedometer: Speedometer,
    speed: watch::Receiver<f64>,
}

impl AppContext {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let mut speedometer = Speedometer::from_settings(&settings)?;
        if settings.start_sampling {
            speedometer.resume();
        }
        let speed = speedometer.speed();

        Ok(Self {
            sampling: settings.start_sampling,
            settings,
            speedometer,
            speed,
        })
    }

    /// Sampling runs only while enabled and the window is visible.
    fn sync_sampling(&mut self, minimized: bool) {
        let should_sample = self.sampling && !minimized;
        if should_sample == self.speedometer.is_sampling() {
            return;
        }

        if should_sample {
            self.speedometer.resume();
        } else {
            self.speedometer.pause();
        }
    }

    fn remember_sampling(&mut self) {
        self.settings.start_sampling = self.sampling;
        if let Err(error) = self.settings.save() {
            warn!("Could not save settings: {}", error);
        }
    }
}

impl eframe::App for AppContext {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        let minimized = ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        self.sync_sampling(minimized);

        // Draw top bar
        TopBottomPanel::top("title_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Speedometer");
                ui.add_space(10.0);
                ui.label("Sampling:");
                if ui.checkbox(&mut self.sampling, "").changed() {
                    self.remember_sampling();
                }
            });
        });

        TopBottomPanel::bottom("source_bar").show(ctx, |ui| {
            ui.weak(source_label(self.speedometer.source_port(), &self.settings.osc_address));
        });

        // Draw speed
        let speed = *self.speed.borrow();
        CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new(format_speed(speed)).size(38.0).strong());
            });
        });

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}

pub fn format_speed(speed: f64) -> String {
    format!("{:.2} {}", speed, SPEED_UNIT)
}

fn source_label(port: Option<u16>, address: &str) -> String {
    match port {
        Some(port) => format!("OSC :{}  {}", port, address),
        None => "No sensor source".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_uses_two_decimals_and_unit() {
        assert_eq!(format_speed(0.0), "0.00 km/h");
        assert_eq!(format_speed(0.683168), "0.68 km/h");
        assert_eq!(format_speed(12.5), "12.50 km/h");
    }

    #[test]
    fn source_label_shows_bound_port() {
        assert_eq!(source_label(Some(9000), "*accelerometer*"), "OSC :9000  *accelerometer*");
        assert_eq!(source_label(None, "*"), "No sensor source");
    }

    #[tokio::test(start_paused = true)]
    async fn minimizing_pauses_sampling() {
        let settings = Settings { osc_port: 0, start_sampling: false, ..Default::default() };
        let mut context = AppContext::new(settings).unwrap();
        assert!(!context.speedometer.is_sampling());

        context.sampling = true;
        context.sync_sampling(false);
        assert!(context.speedometer.is_sampling());

        context.sync_sampling(true);
        assert!(!context.speedometer.is_sampling());

        context.sync_sampling(false);
        assert!(context.speedometer.is_sampling());

        context.sampling = false;
        context.sync_sampling(false);
        assert!(!context.speedometer.is_sampling());
    }
}
