//! Click edge detection
//!
//! Turns the per-frame `clicking` flag into press/release events. A held pinch
//! presses once: nothing fires again until the flag has dropped back to false.

use crate::types::KeyEvent;

#[derive(Debug, Default)]
pub struct ClickEdgeDetector {
    was_clicking: bool,
    active_key: Option<String>,
}

impl ClickEdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample the flag for one frame.
    ///
    /// The rising edge presses the hovered key, if there is one. A rising edge
    /// with nothing hovered still enters the active state, so the run cannot
    /// press later when the cursor drifts onto a key.
    pub fn update(&mut self, clicking: bool, hovered: Option<&str>) -> Option<KeyEvent> {
        match (self.was_clicking, clicking) {
            (false, true) => {
                self.was_clicking = true;
                let key_id = hovered?.to_string();
                self.active_key = Some(key_id.clone());
                Some(KeyEvent::Press { key_id })
            }
            (true, false) => {
                self.was_clicking = false;
                Some(KeyEvent::Release { key_id: self.active_key.take() })
            }
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.was_clicking
    }

    /// Key currently shown as pressed
    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    pub fn reset(&mut self) {
        self.was_clicking = false;
        self.active_key = None;
    }
}
