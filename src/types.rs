//! Core data types for the HandType pipeline

use serde::{Deserialize, Serialize};

/// Number of landmarks reported for one tracked hand
pub const LANDMARK_COUNT: usize = 21;

/// A normalized hand landmark from the tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// X coordinate in camera space (normalized 0.0-1.0)
    pub x: f32,
    /// Y coordinate in camera space (normalized 0.0-1.0, grows downward)
    pub y: f32,
    /// Depth relative to the wrist (unused by the pipeline)
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// The 21 ordered landmarks of a single hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    /// Build from a slice, rejecting anything that is not exactly 21 points.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }
}

/// One frame delivered by a landmark source
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    /// The first tracked hand, or `None` when nothing was detected
    pub hand: Option<HandLandmarks>,
    /// Timestamp in milliseconds
    pub timestamp: u64,
}

impl LandmarkFrame {
    pub fn with_hand(hand: HandLandmarks) -> Self {
        Self { hand: Some(hand), timestamp: now_ms() }
    }

    pub fn empty() -> Self {
        Self { hand: None, timestamp: now_ms() }
    }
}

/// A point in screen pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Screen dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSize {
    pub width: f32,
    pub height: f32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self { width: 1280.0, height: 720.0 }
    }
}

/// Pointer intent derived from one hand pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureMode {
    /// Open hand, cursor follows the index tip
    Move,
    /// Pinch or two-finger pose
    Click,
    /// Anything else, including no hand
    Idle,
}

/// Which of the four long fingers are extended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerFlags {
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerFlags {
    pub fn count(&self) -> usize {
        [self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|&&f| f)
            .count()
    }
}

/// Per-frame output of the gesture classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSignal {
    pub mode: GestureMode,
    pub clicking: bool,
    /// Mirrored index-tip position in screen pixels
    pub raw_cursor: Option<Point2D>,
    pub fingers: FingerFlags,
    /// Thumb-tip to index-tip distance (normalized units)
    pub pinch_distance: Option<f32>,
}

impl GestureSignal {
    /// Signal for a frame without landmarks.
    pub fn idle() -> Self {
        Self {
            mode: GestureMode::Idle,
            clicking: false,
            raw_cursor: None,
            fingers: FingerFlags::default(),
            pinch_distance: None,
        }
    }
}

/// Screen-space bounds of one rendered key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRect {
    pub key_id: String,
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl KeyRect {
    pub fn new(key_id: impl Into<String>, top: f32, left: f32, width: f32, height: f32) -> Self {
        Self { key_id: key_id.into(), top, left, width, height }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Closed-interval containment: points on the edge are inside.
    pub fn contains(&self, p: Point2D) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }
}

/// Discrete event derived from the `clicking` signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    /// Rising edge over a hovered key
    Press { key_id: String },
    /// Falling edge, carrying the key that was active (if any)
    Release { key_id: Option<String> },
}

/// Lifecycle of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Starting,
    Running,
    /// Terminal: the landmark source could not be started
    Error(String),
    Stopped,
}

/// Everything the UI needs to render one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub text: String,
    pub cursor: Option<Point2D>,
    pub mode: GestureMode,
    pub hovered_key: Option<String>,
    pub active_key: Option<String>,
    pub status: SessionStatus,
    /// An ai-fix request is in flight
    pub fixing: bool,
    /// An autocomplete request is in flight
    pub completing: bool,
}

pub(crate) fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
