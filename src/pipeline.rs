use log::debug;

use crate::aggregator::SpeedAggregator;
use crate::sample::{Contribution, RawSample, SampleGate};
use crate::speed_filter::{FilterState, SpeedFilter};

/// Synchronous core: gate, estimator and aggregator wired together.
///
/// Hosts drive it with [`on_raw_sample`](Self::on_raw_sample) and
/// [`on_tick`](Self::on_tick) and must serialize those calls.
#[derive(Debug, Default)]
pub struct SpeedPipeline {
    gate: SampleGate,
    filter: SpeedFilter,
    state: FilterState,
    aggregator: SpeedAggregator,
    published: f64,
    session: u64,
}

impl SpeedPipeline {
    pub fn new(gate: SampleGate, filter: SpeedFilter) -> Self {
        Self {
            gate,
            filter,
            state: FilterState::default(),
            aggregator: SpeedAggregator::new(),
            published: 0.0,
            session: 0,
        }
    }

    pub fn on_raw_sample(&mut self, sample: RawSample) {
        let value = match self.gate.classify(&sample) {
            Contribution::Measurement(adjusted) => {
                let (state, estimate) = self.filter.update(self.state, adjusted);
                self.state = state;
                estimate
            }
            Contribution::Still => 0.0,
        };

        self.aggregator.push(value);
    }

    /// Publishes the buffered average. Returns the new value, or `None` when
    /// nothing arrived since the previous tick and the published value stays put.
    pub fn on_tick(&mut self) -> Option<f64> {
        let speed = self.aggregator.flush()?;
        debug!("Published speed {:.4}", speed);
        self.published = speed;
        Some(speed)
    }

    /// Opens a new session and returns its id. Drops samples left over from
    /// the previous one, estimator state and the published value carry over.
    pub fn begin_session(&mut self) -> u64 {
        self.session += 1;
        self.aggregator.clear();
        self.session
    }

    /// Closes `session` if it is still the current one. Workers holding an
    /// older id must stop feeding the pipeline.
    pub fn end_session(&mut self, session: u64) {
        if self.session == session {
            self.session += 1;
        }
    }

    pub fn is_current(&self, session: u64) -> bool {
        self.session == session
    }

    pub fn published(&self) -> f64 {
        self.published
    }
}

#[cfg(test)]
impl SpeedPipeline {
    pub fn filter_state(&self) -> FilterState {
        self.state
    }

    pub fn buffered(&self) -> usize {
        self.aggregator.len()
    }
}
