use log::{debug, error, info};
use rosc::{OscMessage, OscPacket, OscType};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use wildmatch::WildMatch;

use crate::sample::RawSample;
use crate::session::SampleSink;

/// Accelerometer readings streamed over OSC by a phone sensor app.
///
/// The socket is bound once and outlives sampling sessions. Readings go to
/// whichever sink is currently subscribed and are dropped while none is.
pub struct OscAccelerometer {
    port: u16,
    sink_tx: watch::Sender<Option<SampleSink>>,
    listener: JoinHandle<()>,
}

impl OscAccelerometer {
    pub fn bind(port: u16, pattern: &str) -> anyhow::Result<Self> {
        let socket = std::net::UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(socket)?;
        let port = socket.local_addr()?.port();
        info!("Listening for accelerometer OSC messages on port {}", port);

        let (sink_tx, sink_rx) = watch::channel::<Option<SampleSink>>(None);
        let pattern = WildMatch::new(pattern);
        let listener = tokio::spawn(async move {
            if let Err(error) = Self::osc_task(socket, sink_rx, pattern).await {
                error!("OSC listener on port {} failed: {}", port, error);
            }
        });

        Ok(Self {
            port,
            sink_tx,
            listener,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn subscribe(&self, sink: SampleSink) {
        self.sink_tx.send_replace(Some(sink));
    }

    pub fn unsubscribe(&self) {
        self.sink_tx.send_replace(None);
    }

    async fn osc_task(
        socket: UdpSocket,
        sink_rx: watch::Receiver<Option<SampleSink>>,
        pattern: WildMatch,
    ) -> anyhow::Result<()> {
        let mut buffer = [0; rosc::decoder::MTU];
        loop {
            let (length, _) = socket.recv_from(&mut buffer).await?;
            let packet = match rosc::decoder::decode_udp(&buffer[..length]) {
                Ok((_, packet)) => packet,
                Err(error) => {
                    debug!("Dropping malformed OSC packet: {:?}", error);
                    continue;
                }
            };

            let sink = sink_rx.borrow().clone();
            let Some(sink) = sink else {
                continue;
            };
            for sample in collect_samples(packet, &pattern) {
                sink.on_raw_sample(sample.x, sample.y, sample.z);
            }
        }
    }
}

impl Drop for OscAccelerometer {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn collect_samples(packet: OscPacket, pattern: &WildMatch) -> Vec<RawSample> {
    match packet {
        OscPacket::Message(OscMessage { addr, args }) => {
            if !pattern.matches(&addr) {
                return Vec::new();
            }
            parse_accelerometer(&args).into_iter().collect()
        }
        OscPacket::Bundle(bundle) => bundle
            .content
            .into_iter()
            .flat_map(|packet| collect_samples(packet, pattern))
            .collect(),
    }
}

/// First three numeric arguments as x, y, z.
pub fn parse_accelerometer(args: &[OscType]) -> Option<RawSample> {
    let mut axes = args.iter().filter_map(|arg| match arg {
        OscType::Float(val) => Some(*val as f64),
        OscType::Double(val) => Some(*val),
        OscType::Int(val) => Some(*val as f64),
        _ => None,
    });

    Some(RawSample::new(axes.next()?, axes.next()?, axes.next()?))
}
