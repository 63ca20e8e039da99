//! Key actions and the text buffer
//!
//! The dispatcher is the single owner of the typed text. AI actions do not
//! block: they hand back a [`TextRequest`] for the session to run, and the
//! result comes back later as a [`TextUpdate`].

use serde::{Deserialize, Serialize};

/// What a key id does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Char(char),
    Backspace,
    Space,
    Enter,
    Clear,
    /// Recognized but currently does nothing
    Shift,
    AiFix,
    AiComplete,
    Unknown,
}

impl KeyAction {
    pub fn from_key_id(key_id: &str) -> Self {
        let lower = key_id.to_lowercase();
        match lower.as_str() {
            "backspace" => return Self::Backspace,
            "space" | " " => return Self::Space,
            "enter" => return Self::Enter,
            "clear" => return Self::Clear,
            "shift" => return Self::Shift,
            "ai-fix" => return Self::AiFix,
            "ai-complete" => return Self::AiComplete,
            _ => {}
        }

        let mut chars = lower.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Self::Char(c),
            _ => Self::Unknown,
        }
    }
}

/// Which text service a request goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextRequestKind {
    Correct,
    Complete,
}

/// Work for the text service, produced by an AI key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    pub kind: TextRequestKind,
    pub text: String,
}

/// Result of a text request, posted back to the buffer owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextUpdate {
    Corrected { original: String, corrected: String },
    Completed { continuation: String },
}

/// The typed text
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    pub fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn replace(&mut self, text: String) {
        self.text = text;
    }
}

#[derive(Debug, Default)]
pub struct ActionDispatcher {
    buffer: TextBuffer,
    fix_in_flight: bool,
    complete_in_flight: bool,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn in_flight(&self, kind: TextRequestKind) -> bool {
        match kind {
            TextRequestKind::Correct => self.fix_in_flight,
            TextRequestKind::Complete => self.complete_in_flight,
        }
    }

    /// Apply a pressed key. Returns a request when an AI key needs the text
    /// service.
    pub fn press(&mut self, key_id: &str) -> Option<TextRequest> {
        let action = KeyAction::from_key_id(key_id);
        log::debug!("Key '{}' -> {:?}", key_id, action);
        self.apply_action(action)
    }

    pub fn apply_action(&mut self, action: KeyAction) -> Option<TextRequest> {
        match action {
            KeyAction::Char(c) => self.buffer.push(c),
            KeyAction::Backspace => self.buffer.backspace(),
            KeyAction::Space => self.buffer.push(' '),
            KeyAction::Enter => self.buffer.push('\n'),
            KeyAction::Clear => self.buffer.clear(),
            KeyAction::Shift | KeyAction::Unknown => {}
            KeyAction::AiFix => return self.begin(TextRequestKind::Correct),
            KeyAction::AiComplete => return self.begin(TextRequestKind::Complete),
        }
        None
    }

    /// Start a text request unless the buffer is empty or one of the same
    /// kind is already pending.
    pub fn begin(&mut self, kind: TextRequestKind) -> Option<TextRequest> {
        if self.buffer.is_empty() {
            log::debug!("{:?} skipped: buffer is empty", kind);
            return None;
        }
        let flag = match kind {
            TextRequestKind::Correct => &mut self.fix_in_flight,
            TextRequestKind::Complete => &mut self.complete_in_flight,
        };
        if *flag {
            log::debug!("{:?} already in flight", kind);
            return None;
        }
        *flag = true;
        Some(TextRequest { kind, text: self.buffer.as_str().to_string() })
    }

    /// Apply a finished request and clear its in-flight flag.
    pub fn finish(&mut self, update: TextUpdate) {
        match update {
            TextUpdate::Corrected { original, corrected } => {
                self.fix_in_flight = false;
                // The service hands back the original text when it fails.
                if corrected != original {
                    self.buffer.replace(corrected);
                }
            }
            TextUpdate::Completed { continuation } => {
                self.complete_in_flight = false;
                self.buffer.push_str(&continuation);
            }
        }
    }

    /// Start again with an empty buffer.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
