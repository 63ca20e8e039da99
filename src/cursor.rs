//! Cursor smoothing
//!
//! Exponential smoothing of the raw index-tip position. The accumulator only
//! moves in MOVE mode, so the cursor parks in place for the length of a click
//! gesture.

use crate::types::{GestureMode, Point2D};

/// Default smoothing factor
pub const DEFAULT_SMOOTHING: f32 = 0.4;

pub struct CursorFilter {
    smoothing: f32,
    accumulator: Option<Point2D>,
}

impl CursorFilter {
    /// `smoothing` is clamped into (0, 1]; larger is snappier.
    pub fn new(smoothing: f32) -> Self {
        Self {
            smoothing: clamp_smoothing(smoothing),
            accumulator: None,
        }
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = clamp_smoothing(smoothing);
    }

    /// Feed one frame. Returns the accumulator after the update.
    pub fn update(&mut self, mode: GestureMode, raw: Option<Point2D>) -> Option<Point2D> {
        if mode != GestureMode::Move {
            return self.accumulator;
        }
        let Some(raw) = raw.filter(|p| p.x.is_finite() && p.y.is_finite()) else {
            return self.accumulator;
        };

        let next = match self.accumulator {
            None => raw,
            Some(acc) => Point2D::new(
                acc.x + (raw.x - acc.x) * self.smoothing,
                acc.y + (raw.y - acc.y) * self.smoothing,
            ),
        };
        self.accumulator = Some(next);
        Some(next)
    }

    pub fn position(&self) -> Option<Point2D> {
        self.accumulator
    }

    /// Forget the accumulator; the next MOVE frame snaps to its raw position.
    pub fn reset(&mut self) {
        self.accumulator = None;
    }

    #[cfg(test)]
    fn with_position(smoothing: f32, position: Point2D) -> Self {
        Self { smoothing: clamp_smoothing(smoothing), accumulator: Some(position) }
    }
}

impl Default for CursorFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

fn clamp_smoothing(smoothing: f32) -> f32 {
    if smoothing.is_finite() {
        smoothing.clamp(f32::EPSILON, 1.0)
    } else {
        DEFAULT_SMOOTHING
    }
}
