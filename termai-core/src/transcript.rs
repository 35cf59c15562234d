//! # Transcript
//!
//! Append-only log of the conversation. The whole history stays in memory
//! for the life of the process; only the most recent entries are rendered
//! into model requests.

use std::time::SystemTime;

/// Number of entries rendered into the context of each request
pub const DEFAULT_CONTEXT_WINDOW: usize = 4;

/// Who produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Label used when rendering the context window
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "AI",
        }
    }
}

/// A single recorded turn fragment. Fields are private so an entry cannot
/// change after it has been appended.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    speaker: Speaker,
    text: String,
    timestamp: SystemTime,
    error: bool,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text, false)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text, false)
    }

    /// Assistant entry standing in for a reply that failed
    pub fn assistant_error(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text, true)
    }

    fn new(speaker: Speaker, text: impl Into<String>, error: bool) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: SystemTime::now(),
            error,
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    /// `"User: ..."` / `"AI: ..."`
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker.label(), self.text)
    }
}

/// Ordered conversation history
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// The last `n` entries (fewer if the transcript is shorter), oldest first
    pub fn window(&self, n: usize) -> &[TranscriptEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// The last `n` entries rendered one per line with their speaker label.
    /// Empty string when there is nothing to show.
    pub fn windowed(&self, n: usize) -> String {
        self.window(n)
            .iter()
            .map(TranscriptEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
