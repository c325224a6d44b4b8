use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::pipeline::SpeedPipeline;
use crate::sample::RawSample;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Sample(RawSample),
    Tick,
}

/// Inbound handle for the sensor and timer collaborators. Sending into a
/// torn-down session is a silent no-op.
#[derive(Debug, Clone)]
pub struct SampleSink {
    event_tx: UnboundedSender<SessionEvent>,
}

impl SampleSink {
    pub fn on_raw_sample(&self, x: f64, y: f64, z: f64) {
        _ = self.event_tx.send(SessionEvent::Sample(RawSample::new(x, y, z)));
    }

    pub fn on_tick(&self) {
        _ = self.event_tx.send(SessionEvent::Tick);
    }

    pub fn is_closed(&self) -> bool {
        self.event_tx.is_closed()
    }
}

/// One sampling run: a worker consuming events in order and a ticker feeding
/// it. Both end together.
pub struct SamplingSession {
    id: u64,
    pipeline: Arc<Mutex<SpeedPipeline>>,
    sink: SampleSink,
    worker: JoinHandle<()>,
    ticker: JoinHandle<()>,
    stopped: bool,
}

impl SamplingSession {
    pub fn start(
        pipeline: Arc<Mutex<SpeedPipeline>>,
        published: Arc<watch::Sender<f64>>,
        tick_period: Duration,
    ) -> Self {
        let id = pipeline.lock().unwrap_or_else(PoisonError::into_inner).begin_session();

        let (event_tx, event_rx) = unbounded_channel::<SessionEvent>();
        let sink = SampleSink { event_tx };

        let worker_pipeline = pipeline.clone();
        let worker = tokio::spawn(async move {
            Self::worker_task(id, event_rx, worker_pipeline, published).await;
        });

        let ticker_sink = sink.clone();
        let ticker = tokio::spawn(async move {
            Self::ticker_task(ticker_sink, tick_period).await;
        });

        info!("Sampling session {} started, tick every {:?}", id, tick_period);

        Self {
            id,
            pipeline,
            sink,
            worker,
            ticker,
            stopped: false,
        }
    }

    pub fn sink(&self) -> SampleSink {
        self.sink.clone()
    }

    /// Cancels the worker and the ticker. Safe to call more than once.
    ///
    /// Abort only lands at the worker's next yield, so the session is also
    /// closed on the pipeline. Once this returns no event of this session
    /// reaches the pipeline.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        self.pipeline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .end_session(self.id);
        self.ticker.abort();
        self.worker.abort();

        info!("Sampling session {} stopped", self.id);
    }

    async fn worker_task(
        id: u64,
        mut event_rx: UnboundedReceiver<SessionEvent>,
        pipeline: Arc<Mutex<SpeedPipeline>>,
        published: Arc<watch::Sender<f64>>,
    ) {
        while let Some(event) = event_rx.recv().await {
            let mut pipeline = pipeline.lock().unwrap_or_else(PoisonError::into_inner);
            if !pipeline.is_current(id) {
                break;
            }
            match event {
                SessionEvent::Sample(sample) => pipeline.on_raw_sample(sample),
                SessionEvent::Tick => {
                    if let Some(speed) = pipeline.on_tick() {
                        published.send_replace(speed);
                    }
                }
            }
        }

        debug!("Session {} worker finished", id);
    }

    async fn ticker_task(sink: SampleSink, period: Duration) {
        // First tick one full period after start
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if sink.is_closed() {
                break;
            }
            sink.on_tick();
        }
    }
}

#[cfg(test)]
impl SamplingSession {
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }
}

impl Drop for SamplingSession {
    fn drop(&mut self) {
        self.stop();
    }
}
