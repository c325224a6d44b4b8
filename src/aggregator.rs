/// Collects per-sample values between ticks and reduces them on flush.
#[derive(Debug, Default)]
pub struct SpeedAggregator {
    buffer: Vec<f64>,
}

impl SpeedAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.buffer.push(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Absolute mean of everything buffered since the last flush, or `None`
    /// when nothing arrived. The buffer is always empty afterwards.
    pub fn flush(&mut self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }

        // Filtered values can be negative after the calibration offset
        let mean = self.buffer.iter().sum::<f64>() / self.buffer.len() as f64;
        self.buffer.clear();
        Some(mean.abs())
    }
}
