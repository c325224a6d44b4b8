use std::path::{Path, PathBuf};
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    CALIBRATION_OFFSET, MEASUREMENT_NOISE, MOTION_THRESHOLD, MPS_TO_KMH, OSC_ACCELEROMETER_PATTERN, OSC_PORT,
    PROCESS_NOISE, TICK_PERIOD_MS,
};
use crate::sample::SampleGate;
use crate::speed_filter::SpeedFilter;

lazy_static! {
    static ref SETTINGS_PATH: PathBuf = {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_default()
            .join("settings.json")
    };
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("measurement_noise must be positive and finite, got {0}")]
    MeasurementNoise(f64),
    #[error("process_noise must be non-negative and finite, got {0}")]
    ProcessNoise(f64),
    #[error("threshold must be non-negative and finite, got {0}")]
    Threshold(f64),
    #[error("tick_period_ms must be greater than zero")]
    TickPeriod,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub osc_port: u16,
    pub osc_address: String,
    pub tick_period_ms: u64,
    pub threshold: f64,
    pub conversion_factor: f64,
    pub calibration_offset: f64,
    pub process_noise: f64,
    pub measurement_noise: f64,
    pub start_sampling: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            osc_port: OSC_PORT,
            osc_address: OSC_ACCELEROMETER_PATTERN.into(),
            tick_period_ms: TICK_PERIOD_MS,
            threshold: MOTION_THRESHOLD,
            conversion_factor: MPS_TO_KMH,
            calibration_offset: CALIBRATION_OFFSET,
            process_noise: PROCESS_NOISE,
            measurement_noise: MEASUREMENT_NOISE,
            start_sampling: true,
        }
    }
}

impl Settings {
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&SETTINGS_PATH)
    }

    pub fn load_or_default() -> anyhow::Result<Self> {
        Self::load_from(&SETTINGS_PATH)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let settings = serde_json::to_string_pretty(&self)?;
        std::fs::write(path, settings)?;
        Ok(())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let settings = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&settings)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.measurement_noise.is_finite() && self.measurement_noise > 0.0) {
            return Err(SettingsError::MeasurementNoise(self.measurement_noise));
        }
        if !(self.process_noise.is_finite() && self.process_noise >= 0.0) {
            return Err(SettingsError::ProcessNoise(self.process_noise));
        }
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(SettingsError::Threshold(self.threshold));
        }
        if self.tick_period_ms == 0 {
            return Err(SettingsError::TickPeriod);
        }
        Ok(())
    }

    pub fn gate(&self) -> SampleGate {
        SampleGate::new(self.threshold, self.conversion_factor, self.calibration_offset)
    }

    pub fn filter(&self) -> SpeedFilter {
        SpeedFilter::new(self.process_noise, self.measurement_noise)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}
