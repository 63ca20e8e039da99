//! Synthetic hand poses
//!
//! Builds plausible 21-point hands with the index fingertip at a given
//! normalized camera position. Used by the simulated source, tests and benches.

use crate::gesture::{
    INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP,
    THUMB_TIP, WRIST,
};
use crate::types::{HandLandmarks, Landmark, LANDMARK_COUNT};

// Finger column offsets from the index finger (camera x)
const MIDDLE_DX: f32 = -0.03;
const RING_DX: f32 = -0.06;
const PINKY_DX: f32 = -0.09;
// Tip-to-PIP vertical span of a straight finger
const FINGER_SPAN: f32 = 0.06;
// Where a curled fingertip sits relative to its PIP
const CURL_DROP: f32 = 0.03;

#[derive(Clone, Copy)]
struct Pose {
    index: bool,
    middle: bool,
    ring: bool,
    pinky: bool,
    pinch: bool,
}

/// All four fingers extended, thumb held away.
pub fn open_hand(x: f32, y: f32) -> HandLandmarks {
    build(x, y, Pose { index: true, middle: true, ring: true, pinky: true, pinch: false })
}

/// Thumb tip on the index tip, other fingers still extended.
pub fn pinch(x: f32, y: f32) -> HandLandmarks {
    build(x, y, Pose { index: true, middle: true, ring: true, pinky: true, pinch: true })
}

/// Index and middle extended, ring and pinky curled.
pub fn two_finger(x: f32, y: f32) -> HandLandmarks {
    build(x, y, Pose { index: true, middle: true, ring: false, pinky: false, pinch: false })
}

/// Every finger curled.
pub fn fist(x: f32, y: f32) -> HandLandmarks {
    build(x, y, Pose { index: false, middle: false, ring: false, pinky: false, pinch: false })
}

fn build(x: f32, y: f32, pose: Pose) -> HandLandmarks {
    // The index tip is the anchor; the knuckle line sits a finger span below it.
    let pip_y = y + FINGER_SPAN;
    let mut points = [Landmark::new(x, pip_y, 0.0); LANDMARK_COUNT];

    points[WRIST] = Landmark::new(x - 0.04, pip_y + 0.15, 0.0);

    let mut finger = |tip: usize, pip: usize, dx: f32, extended: bool| {
        points[pip] = Landmark::new(x + dx, pip_y, 0.0);
        let tip_y = if extended { pip_y - FINGER_SPAN } else { pip_y + CURL_DROP };
        points[tip] = Landmark::new(x + dx, tip_y, 0.0);
        // Joints between PIP and tip follow the tip.
        for j in pip + 1..tip {
            points[j] = Landmark::new(x + dx, (pip_y + tip_y) / 2.0, 0.0);
        }
    };
    finger(INDEX_TIP, INDEX_PIP, 0.0, pose.index);
    finger(MIDDLE_TIP, MIDDLE_PIP, MIDDLE_DX, pose.middle);
    finger(RING_TIP, RING_PIP, RING_DX, pose.ring);
    finger(PINKY_TIP, PINKY_PIP, PINKY_DX, pose.pinky);

    points[THUMB_TIP] = if pose.pinch {
        let index_tip = points[INDEX_TIP];
        Landmark::new(index_tip.x + 0.005, index_tip.y + 0.005, 0.0)
    } else {
        Landmark::new(x + 0.12, pip_y + 0.04, 0.0)
    };

    HandLandmarks { points }
}
