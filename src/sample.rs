use crate::consts::{CALIBRATION_OFFSET, MOTION_THRESHOLD, MPS_TO_KMH};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RawSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// What a raw sample contributes to the buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contribution {
    /// Calibrated measurement, still to be fed through the estimator.
    Measurement(f64),
    /// Below the motion threshold, recorded as zero without touching the estimator.
    Still,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGate {
    threshold: f64,
    conversion_factor: f64,
    calibration_offset: f64,
}

impl Default for SampleGate {
    fn default() -> Self {
        Self::new(MOTION_THRESHOLD, MPS_TO_KMH, CALIBRATION_OFFSET)
    }
}

impl SampleGate {
    pub fn new(threshold: f64, conversion_factor: f64, calibration_offset: f64) -> Self {
        Self {
            threshold,
            conversion_factor,
            calibration_offset,
        }
    }

    pub fn classify(&self, sample: &RawSample) -> Contribution {
        let magnitude = sample.magnitude();

        // Strict comparison, a magnitude sitting on the threshold counts as still
        if magnitude > self.threshold {
            Contribution::Measurement(magnitude * self.conversion_factor - self.calibration_offset)
        } else {
            Contribution::Still
        }
    }
}
