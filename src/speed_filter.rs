use crate::consts::{INITIAL_ERROR_COVARIANCE, INITIAL_ESTIMATE, MEASUREMENT_NOISE, PROCESS_NOISE};

/// Running estimate and its uncertainty. Owned by whoever drives the filter and
/// handed to [`SpeedFilter::update`] by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub estimate: f64,
    pub error_covariance: f64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            estimate: INITIAL_ESTIMATE,
            error_covariance: INITIAL_ERROR_COVARIANCE,
        }
    }
}

/// Single-variable Kalman filter. Only holds the tuning constants, the state
/// lives in [`FilterState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedFilter {
    process_noise: f64,
    measurement_noise: f64,
}

impl Default for SpeedFilter {
    fn default() -> Self {
        Self::new(PROCESS_NOISE, MEASUREMENT_NOISE)
    }
}

impl SpeedFilter {
    /// `measurement_noise` must be positive, otherwise the gain is undefined
    /// for a collapsed covariance. Settings validation enforces this.
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            process_noise,
            measurement_noise,
        }
    }

    /// Gain the next [`update`](Self::update) will apply to `state`.
    pub fn gain(&self, state: FilterState) -> f64 {
        let predicted = state.error_covariance + self.process_noise;
        predicted / (predicted + self.measurement_noise)
    }

    pub fn update(&self, state: FilterState, measurement: f64) -> (FilterState, f64) {
        // Predict
        let gain = self.gain(state);
        let error_covariance = state.error_covariance + self.process_noise;

        // Correct
        let estimate = state.estimate + gain * (measurement - state.estimate);
        let error_covariance = error_covariance * (1.0 - gain);

        (FilterState { estimate, error_covariance }, estimate)
    }
}
