//! Vision pathway - landmark sources
//!
//! A [`LandmarkSource`] pushes one [`LandmarkFrame`] per camera frame into a
//! bounded queue owned by the session. Frames are consumed strictly in order
//! by a single consumer.

use crate::error::HandTypeError;
use crate::layout::QwertyGeometry;
use crate::types::{HandLandmarks, LandmarkFrame, ScreenSize};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod synthetic;
mod udp_landmarks;

pub use udp_landmarks::{parse_landmark_message, udp_landmark_addr_from_env, UdpLandmarkSource};

#[async_trait]
pub trait LandmarkSource: Send {
    /// Begin producing frames. Failing here means the device is unusable for
    /// the whole session.
    async fn start(&mut self, frames: mpsc::Sender<LandmarkFrame>) -> Result<(), HandTypeError>;

    async fn stop(&mut self);
}

/// Replays a fixed sequence of frames at a fixed interval.
///
/// Every frame is delivered; the replay waits for queue space instead of
/// dropping. Without `repeat` the queue is closed once the script ends.
pub struct ScriptedSource {
    frames: Vec<Option<HandLandmarks>>,
    interval: Duration,
    repeat: bool,
    task: Option<JoinHandle<()>>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Option<HandLandmarks>>, interval: Duration) -> Self {
        Self { frames, interval, repeat: false, task: None }
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[async_trait]
impl LandmarkSource for ScriptedSource {
    async fn start(&mut self, frames: mpsc::Sender<LandmarkFrame>) -> Result<(), HandTypeError> {
        if self.task.is_some() {
            return Err(HandTypeError::DeviceUnavailable("source already started".to_string()));
        }
        let script = std::mem::take(&mut self.frames);
        let interval = self.interval;
        let repeat = self.repeat;
        log::info!("Replaying {} scripted frames (repeat: {})", script.len(), repeat);

        self.task = Some(tokio::spawn(async move {
            loop {
                for hand in &script {
                    let frame = match hand {
                        Some(h) => LandmarkFrame::with_hand(h.clone()),
                        None => LandmarkFrame::empty(),
                    };
                    if frames.send(frame).await.is_err() {
                        return;
                    }
                    if !interval.is_zero() {
                        tokio::time::sleep(interval).await;
                    }
                }
                if !repeat || script.is_empty() {
                    return;
                }
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Synthetic hand that types a phrase on the default keyboard, then asks for
/// an ai-fix. Used when no tracker is configured.
pub struct SimulatedHandSource {
    inner: ScriptedSource,
}

// Frames per phase of one simulated keystroke
const GLIDE_FRAMES: usize = 12;
const SETTLE_FRAMES: usize = 12;
const PINCH_FRAMES: usize = 5;
const RELEASE_FRAMES: usize = 4;
const LOST_FRAMES: usize = 20;

impl SimulatedHandSource {
    pub fn new(phrase: &str, screen: ScreenSize, interval: Duration) -> Self {
        log::warn!("No hand tracker configured, using simulated hand");
        let script = type_script(phrase, screen);
        Self { inner: ScriptedSource::new(script, interval).repeating() }
    }
}

#[async_trait]
impl LandmarkSource for SimulatedHandSource {
    async fn start(&mut self, frames: mpsc::Sender<LandmarkFrame>) -> Result<(), HandTypeError> {
        self.inner.start(frames).await
    }

    async fn stop(&mut self) {
        self.inner.stop().await
    }
}

/// Key ids to press for `phrase` on the default keyboard
pub fn phrase_keys(phrase: &str) -> Vec<String> {
    phrase
        .chars()
        .filter_map(|c| match c {
            ' ' => Some("space".to_string()),
            '\n' => Some("enter".to_string()),
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase().to_string()),
            _ => None,
        })
        .collect()
}

/// Frame script that presses each key in turn with an open-hand glide and a
/// pinch, followed by a short stretch with no hand in view.
pub fn key_press_script(keys: &[String], screen: ScreenSize) -> Vec<Option<HandLandmarks>> {
    let rects = QwertyGeometry::default().layout(screen);
    let mut script = Vec::new();
    let mut at = (0.5_f32, 0.5_f32);

    for key in keys {
        let Some(rect) = rects.iter().find(|r| &r.key_id == key) else {
            log::debug!("Simulated hand skipping unknown key '{key}'");
            continue;
        };
        // Camera space is mirrored relative to the screen.
        let target = (
            1.0 - (rect.left + rect.width / 2.0) / screen.width,
            (rect.top + rect.height / 2.0) / screen.height,
        );

        for i in 1..=GLIDE_FRAMES {
            let t = i as f32 / GLIDE_FRAMES as f32;
            let x = at.0 + (target.0 - at.0) * t;
            let y = at.1 + (target.1 - at.1) * t;
            script.push(Some(synthetic::open_hand(x, y)));
        }
        script.extend((0..SETTLE_FRAMES).map(|_| Some(synthetic::open_hand(target.0, target.1))));
        script.extend((0..PINCH_FRAMES).map(|_| Some(synthetic::pinch(target.0, target.1))));
        script.extend((0..RELEASE_FRAMES).map(|_| Some(synthetic::open_hand(target.0, target.1))));
        at = target;
    }

    script.extend((0..LOST_FRAMES).map(|_| None));
    script
}

fn type_script(phrase: &str, screen: ScreenSize) -> Vec<Option<HandLandmarks>> {
    let mut keys = phrase_keys(phrase);
    keys.push("ai-fix".to_string());
    keys.push("clear".to_string());
    key_press_script(&keys, screen)
}
