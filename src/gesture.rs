//! Gesture classification
//!
//! Turns one hand's landmarks into a frame-local [`GestureSignal`]. There is
//! no hysteresis: a pose sitting right on a threshold may flip between modes
//! from frame to frame.

use crate::error::HandTypeError;
use crate::types::{
    FingerFlags, GestureMode, GestureSignal, HandLandmarks, Landmark, Point2D, ScreenSize,
};
use serde::{Deserialize, Serialize};

// MediaPipe hand landmark indices used by the classifier
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// Tunable classifier thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureParams {
    /// Thumb-index distance below which the hand counts as pinching
    pub pinch_threshold: f32,
    /// How far above its PIP joint a fingertip must be to count as extended
    pub extension_threshold: f32,
}

impl GestureParams {
    /// `pinch_threshold` must be positive and both thresholds finite.
    pub fn validate(&self) -> Result<(), HandTypeError> {
        if !self.pinch_threshold.is_finite() || self.pinch_threshold <= 0.0 {
            return Err(HandTypeError::InvalidConfig(format!(
                "pinch_threshold must be positive, got {}",
                self.pinch_threshold
            )));
        }
        if !self.extension_threshold.is_finite() {
            return Err(HandTypeError::InvalidConfig(
                "extension_threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GestureParams {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.04,
            extension_threshold: 0.0,
        }
    }
}

/// Classify a single frame.
///
/// `None` yields [`GestureSignal::idle`]. Mode priority is MOVE (open hand, no
/// pinch), then CLICK (pinch or two-finger), then IDLE.
pub fn classify(
    hand: Option<&HandLandmarks>,
    params: &GestureParams,
    screen: ScreenSize,
) -> GestureSignal {
    let Some(hand) = hand else {
        return GestureSignal::idle();
    };

    let bias = params.extension_threshold;
    let fingers = FingerFlags {
        index: is_extended(hand, INDEX_TIP, INDEX_PIP, bias),
        middle: is_extended(hand, MIDDLE_TIP, MIDDLE_PIP, bias),
        ring: is_extended(hand, RING_TIP, RING_PIP, bias),
        pinky: is_extended(hand, PINKY_TIP, PINKY_PIP, bias),
    };

    let index_tip = hand.point(INDEX_TIP);
    let pinch_distance = distance(index_tip, hand.point(THUMB_TIP));
    let is_pinch = pinch_distance < params.pinch_threshold;
    let is_two_finger = fingers.index && fingers.middle && !fingers.ring && !fingers.pinky;
    let is_open_hand = fingers.count() >= 3;

    let mode = if is_open_hand && !is_pinch {
        GestureMode::Move
    } else if is_pinch || is_two_finger {
        GestureMode::Click
    } else {
        GestureMode::Idle
    };

    GestureSignal {
        mode,
        clicking: mode == GestureMode::Click,
        raw_cursor: Some(mirror_to_screen(index_tip, screen)),
        fingers,
        pinch_distance: Some(pinch_distance),
    }
}

fn is_extended(hand: &HandLandmarks, tip: usize, pip: usize, bias: f32) -> bool {
    hand.point(tip).y < hand.point(pip).y - bias
}

/// Planar distance; depth is too noisy to be useful for pinch detection.
fn distance(a: Landmark, b: Landmark) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// The video feed is shown mirrored, so x is flipped.
fn mirror_to_screen(p: Landmark, screen: ScreenSize) -> Point2D {
    Point2D::new((1.0 - p.x) * screen.width, p.y * screen.height)
}
