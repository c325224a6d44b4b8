// Gate and calibration
pub const MOTION_THRESHOLD: f64 = 0.5;
pub const MPS_TO_KMH: f64 = 3.6;
pub const CALIBRATION_OFFSET: f64 = 35.31;

// Estimator tuning
pub const PROCESS_NOISE: f64 = 0.00001;
pub const MEASUREMENT_NOISE: f64 = 0.01;
pub const INITIAL_ESTIMATE: f64 = 0.0;
pub const INITIAL_ERROR_COVARIANCE: f64 = 1.0;

pub const TICK_PERIOD_MS: u64 = 500;

// Sensor streaming apps usually publish on /accelerometer or /<device>/accelerometer
pub const OSC_PORT: u16 = 9000;
pub const OSC_ACCELEROMETER_PATTERN: &str = "*accelerometer*";

pub const SPEED_UNIT: &str = "km/h";
