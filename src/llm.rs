//! Text service connector
//!
//! Correction and completion are delegated to a [`TextService`]. The
//! [`TextConnector`] wraps one with a timeout and collapses every failure to a
//! neutral value, so callers never see an error: correction falls back to the
//! original text and completion to an empty string.
//!
//! [`HeuristicTextService`] is the built-in local service used when no model
//! is wired in.

use crate::error::HandTypeError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait TextService: Send + Sync {
    /// Grammar and spelling corrected replacement for `text`
    async fn correct(&self, text: &str) -> Result<String, HandTypeError>;

    /// Short continuation of `text`, to be appended
    async fn complete(&self, text: &str) -> Result<String, HandTypeError>;
}

#[derive(Clone)]
pub struct TextConnector {
    service: Arc<dyn TextService>,
    timeout: Duration,
}

impl TextConnector {
    pub fn new(service: Arc<dyn TextService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub fn heuristic(timeout: Duration) -> Self {
        Self::new(Arc::new(HeuristicTextService::new()), timeout)
    }

    pub async fn correct(&self, text: &str) -> String {
        let result = tokio::time::timeout(self.timeout, self.service.correct(text)).await;
        match flatten(result, self.timeout) {
            Ok(corrected) => corrected,
            Err(e) => {
                log::warn!("Correction failed, keeping original text: {e}");
                text.to_string()
            }
        }
    }

    pub async fn complete(&self, text: &str) -> String {
        let result = tokio::time::timeout(self.timeout, self.service.complete(text)).await;
        match flatten(result, self.timeout) {
            Ok(continuation) => continuation,
            Err(e) => {
                log::warn!("Completion failed: {e}");
                String::new()
            }
        }
    }
}

fn flatten(
    result: Result<Result<String, HandTypeError>, tokio::time::error::Elapsed>,
    timeout: Duration,
) -> Result<String, HandTypeError> {
    result.map_err(|_| HandTypeError::Timeout(timeout.as_millis() as u64))?
}

/// Rule-based local text service.
pub struct HeuristicTextService {
    misspellings: &'static [(&'static str, &'static str)],
    next_words: &'static [(&'static str, &'static str)],
}

const MISSPELLINGS: &[(&str, &str)] = &[
    ("teh", "the"),
    ("adn", "and"),
    ("recieve", "receive"),
    ("thier", "their"),
    ("wich", "which"),
    ("becuase", "because"),
    ("definately", "definitely"),
    ("seperate", "separate"),
    ("occured", "occurred"),
    ("untill", "until"),
    ("dont", "don't"),
    ("cant", "can't"),
    ("wont", "won't"),
    ("im", "I'm"),
    ("ive", "I've"),
];

const NEXT_WORDS: &[(&str, &str)] = &[
    ("hello", "world"),
    ("thank", "you"),
    ("how", "are you"),
    ("good", "morning"),
    ("see", "you soon"),
    ("i", "am"),
    ("nice", "to meet you"),
    ("what", "is"),
    ("have", "a nice day"),
    ("let", "me know"),
];

impl HeuristicTextService {
    pub fn new() -> Self {
        Self { misspellings: MISSPELLINGS, next_words: NEXT_WORDS }
    }

    fn fix(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 1);
        let mut sentence_start = true;

        for line in text.split('\n') {
            if !out.is_empty() {
                out.push('\n');
            }
            let mut first_in_line = true;
            for word in line.split_whitespace() {
                if !first_in_line {
                    out.push(' ');
                }
                first_in_line = false;

                let fixed = self.fix_word(word);
                if sentence_start {
                    out.push_str(&capitalize(&fixed));
                } else {
                    out.push_str(&fixed);
                }
                sentence_start = fixed.ends_with(['.', '!', '?']);
            }
        }

        if let Some(last) = out.trim_end().chars().last() {
            if !matches!(last, '.' | '!' | '?') {
                let trimmed = out.trim_end().len();
                out.insert(trimmed, '.');
            }
        }
        out
    }

    fn fix_word(&self, word: &str) -> String {
        let (core, trailing) = split_trailing_punct(word);
        let lower = core.to_lowercase();
        let replaced = if lower == "i" {
            "I".to_string()
        } else if let Some((_, good)) = self.misspellings.iter().find(|(bad, _)| *bad == lower) {
            good.to_string()
        } else {
            core.to_string()
        };
        format!("{replaced}{trailing}")
    }

    fn suggest(&self, text: &str) -> String {
        let Some(last) = text.split_whitespace().last() else {
            return String::new();
        };
        let (core, _) = split_trailing_punct(last);
        let lower = core.to_lowercase();
        let Some((_, next)) = self.next_words.iter().find(|(w, _)| *w == lower) else {
            return String::new();
        };
        if text.ends_with(char::is_whitespace) {
            next.to_string()
        } else {
            format!(" {next}")
        }
    }
}

impl Default for HeuristicTextService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextService for HeuristicTextService {
    async fn correct(&self, text: &str) -> Result<String, HandTypeError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        Ok(self.fix(text))
    }

    async fn complete(&self, text: &str) -> Result<String, HandTypeError> {
        Ok(self.suggest(text))
    }
}

fn split_trailing_punct(word: &str) -> (&str, &str) {
    let end = word.trim_end_matches(|c: char| c.is_ascii_punctuation() && c != '\'').len();
    word.split_at(end)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
