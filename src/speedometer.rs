use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::osc_server::OscAccelerometer;
use crate::pipeline::SpeedPipeline;
use crate::session::{SampleSink, SamplingSession};
use crate::settings::Settings;

/// Owns everything that outlives a single sampling session: the pipeline with
/// its estimator state and the published speed.
pub struct Speedometer {
    pipeline: Arc<Mutex<SpeedPipeline>>,
    published: Arc<watch::Sender<f64>>,
    tick_period: Duration,
    source: Option<OscAccelerometer>,
    session: Option<SamplingSession>,
}

impl Speedometer {
    pub fn new(pipeline: SpeedPipeline, tick_period: Duration) -> Self {
        let (published, _) = watch::channel(pipeline.published());
        Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
            published: Arc::new(published),
            tick_period,
            source: None,
            session: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let pipeline = SpeedPipeline::new(settings.gate(), settings.filter());
        let source = OscAccelerometer::bind(settings.osc_port, &settings.osc_address)?;
        Ok(Self::new(pipeline, settings.tick_period()).with_source(source))
    }

    /// Sensor subscribed on every resume and unsubscribed on pause.
    pub fn with_source(mut self, source: OscAccelerometer) -> Self {
        self.source = Some(source);
        self
    }

    pub fn speed(&self) -> watch::Receiver<f64> {
        self.published.subscribe()
    }

    pub fn source_port(&self) -> Option<u16> {
        self.source.as_ref().map(OscAccelerometer::port)
    }

    pub fn is_sampling(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a fresh session with an empty buffer. Returns the existing sink
    /// when already sampling.
    pub fn resume(&mut self) -> SampleSink {
        if let Some(session) = &self.session {
            return session.sink();
        }

        let session = SamplingSession::start(self.pipeline.clone(), self.published.clone(), self.tick_period);
        if let Some(source) = &self.source {
            source.subscribe(session.sink());
        }

        let sink = session.sink();
        self.session = Some(session);
        sink
    }

    pub fn pause(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(source) = &self.source {
                source.unsubscribe();
            }
            session.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn speedometer() -> Speedometer {
        Speedometer::new(SpeedPipeline::default(), Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_keep_continuity() {
        let mut speedometer = speedometer();
        let speed = speedometer.speed();
        assert_eq!(*speed.borrow(), 0.0);

        let sink = speedometer.resume();
        sink.on_raw_sample(10.0, 0.0, 0.0);
        sleep(Duration::from_millis(550)).await;
        let first = *speed.borrow();
        assert!((first - 0.68317).abs() < 1e-4);

        sink.on_raw_sample(0.1, 0.0, 0.0);
        speedometer.pause();
        assert!(!speedometer.is_sampling());
        sleep(Duration::from_millis(1000)).await;
        assert_eq!(*speed.borrow(), first);
        let state = speedometer.pipeline.lock().unwrap().filter_state();

        let sink = speedometer.resume();
        assert_eq!(speedometer.pipeline.lock().unwrap().buffered(), 0);
        assert_eq!(speedometer.pipeline.lock().unwrap().filter_state(), state);

        sink.on_raw_sample(10.0, 0.0, 0.0);
        sleep(Duration::from_millis(550)).await;
        let second = *speed.borrow();
        assert!(second > first);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_resume_and_pause_are_noops() {
        let mut speedometer = speedometer();
        speedometer.pause();

        let first = speedometer.resume();
        let second = speedometer.resume();
        first.on_raw_sample(0.1, 0.0, 0.0);
        second.on_raw_sample(0.1, 0.0, 0.0);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(speedometer.pipeline.lock().unwrap().buffered(), 2);

        speedometer.pause();
        speedometer.pause();
        sleep(Duration::from_millis(10)).await;
        assert!(first.is_closed());
        first.on_tick();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sensor_survives_pause_and_resume() {
        let source = OscAccelerometer::bind(0, "/accelerometer").unwrap();
        let port = source.port();
        let mut speedometer = speedometer().with_source(source);
        assert_eq!(speedometer.source_port(), Some(port));

        let packet = rosc::encoder::encode(&rosc::OscPacket::Message(rosc::OscMessage {
            addr: "/accelerometer".into(),
            args: vec![rosc::OscType::Float(0.1), rosc::OscType::Float(0.0), rosc::OscType::Float(0.0)],
        }))
        .unwrap();
        let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();

        for round in 0..50 {
            speedometer.resume();
            client.send_to(&packet, ("127.0.0.1", port)).await.unwrap();

            let mut delivered = false;
            for _ in 0..100 {
                sleep(Duration::from_millis(5)).await;
                if speedometer.pipeline.lock().unwrap().buffered() > 0 {
                    delivered = true;
                    break;
                }
            }
            assert!(delivered, "no sensor input after resume in round {}", round);

            speedometer.pause();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn resume_starts_clean_after_busy_pause() {
        let mut speedometer = speedometer();
        let sink = speedometer.resume();
        for _ in 0..200_000 {
            sink.on_raw_sample(0.1, 0.0, 0.0);
        }

        speedometer.pause();
        speedometer.resume();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(speedometer.pipeline.lock().unwrap().buffered(), 0);
    }
}
