use super::LandmarkSource;
use crate::error::HandTypeError;
use crate::types::{now_ms, HandLandmarks, Landmark, LandmarkFrame};
use async_trait::async_trait;
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonPoint {
    Xyz([f32; 3]),
    Xy([f32; 2]),
    Object {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    },
}

impl JsonPoint {
    fn to_landmark(&self) -> Option<Landmark> {
        match *self {
            JsonPoint::Xyz([x, y, z]) => landmark(x, y, z),
            JsonPoint::Xy([x, y]) => landmark(x, y, 0.0),
            JsonPoint::Object { x, y, z } => landmark(x, y, z),
        }
    }
}

/// Non-finite coordinates are malformed; x/y are clamped onto the frame.
fn landmark(x: f32, y: f32, z: f32) -> Option<Landmark> {
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return None;
    }
    Some(Landmark::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0), z))
}

#[derive(Debug, Deserialize)]
struct JsonLandmarkMsg {
    #[serde(default)]
    landmarks: Option<Vec<JsonPoint>>,
    #[serde(default)]
    timestamp: Option<u64>,
}

pub fn udp_landmark_addr_from_env() -> Option<SocketAddr> {
    let raw = std::env::var("HANDTYPE_UDP_ADDR").ok()?;
    raw.parse::<SocketAddr>().ok()
}

/// Parse one datagram. `None` means malformed; a frame with `hand: None`
/// means the tracker saw no hand.
pub fn parse_landmark_message(msg: &str) -> Option<LandmarkFrame> {
    let msg = msg.trim();
    if msg.is_empty() {
        return None;
    }

    // JSON: {"landmarks":[[x,y,z], ...], "timestamp":123}
    if msg.starts_with('{') {
        let j = serde_json::from_str::<JsonLandmarkMsg>(msg).ok()?;
        let timestamp = j.timestamp.unwrap_or_else(now_ms);
        let hand = match j.landmarks {
            None => None,
            Some(points) if points.is_empty() => None,
            Some(points) => {
                let points = points
                    .iter()
                    .map(JsonPoint::to_landmark)
                    .collect::<Option<Vec<Landmark>>>()?;
                Some(HandLandmarks::from_slice(&points)?)
            }
        };
        return Some(LandmarkFrame { hand, timestamp });
    }

    if msg.eq_ignore_ascii_case("none") {
        return Some(LandmarkFrame::empty());
    }

    // Compact: x,y,z;x,y,z;... (z optional)
    let mut points = Vec::with_capacity(crate::types::LANDMARK_COUNT);
    for tok in msg.split(';') {
        let mut coords = tok.split(',').map(|v| v.trim().parse::<f32>());
        let x = coords.next()?.ok()?;
        let y = coords.next()?.ok()?;
        let z = match coords.next() {
            Some(v) => v.ok()?,
            None => 0.0,
        };
        points.push(landmark(x, y, z)?);
    }
    let hand = HandLandmarks::from_slice(&points)?;
    Some(LandmarkFrame::with_hand(hand))
}

/// Landmarks pushed by an external tracker over UDP, one frame per datagram.
///
/// When the session falls behind, new frames are dropped rather than queued.
pub struct UdpLandmarkSource {
    addr: SocketAddr,
    task: Option<JoinHandle<()>>,
}

impl UdpLandmarkSource {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, task: None }
    }
}

#[async_trait]
impl LandmarkSource for UdpLandmarkSource {
    async fn start(&mut self, frames: mpsc::Sender<LandmarkFrame>) -> Result<(), HandTypeError> {
        let sock = UdpSocket::bind(self.addr)
            .await
            .map_err(|e| HandTypeError::DeviceUnavailable(format!("bind {}: {e}", self.addr)))?;
        log::info!("UDP landmark listener bound on {}", self.addr);

        self.task = Some(tokio::spawn(async move {
            let mut buf = [0u8; 8192];
            loop {
                let (len, _src) = match sock.recv_from(&mut buf).await {
                    Ok(v) => v,
                    Err(e) => {
                        log::warn!("UDP landmark recv error: {e}");
                        continue;
                    }
                };

                let text = std::str::from_utf8(&buf[..len]).ok();
                let Some(frame) = text.and_then(parse_landmark_message) else {
                    log::debug!("Dropping malformed landmark datagram ({len} bytes)");
                    continue;
                };

                match frames.try_send(frame) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => log::trace!("Frame queue full, dropping frame"),
                    Err(TrySendError::Closed(_)) => return,
                }
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            log::info!("UDP landmark listener stopped");
        }
    }
}
