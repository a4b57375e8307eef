use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::error::HighlightError;

/// Longest selection the synthesis backend accepts, in characters.
pub const MAX_REQUEST_CHARS: usize = 5000;

/// Exclusive handle to a word wrapper in the document.
///
/// Neither `Clone` nor `Copy`: the tokenization pass owns it and
/// only the restorer consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct WordHandle(NodeId);

impl WordHandle {
    pub(crate) fn new(node: NodeId) -> Self {
        Self(node)
    }

    pub fn node(&self) -> NodeId {
        self.0
    }
}

/// One whitespace-delimited word of the selection, wrapped in the document.
#[derive(Debug)]
pub struct WordUnit {
    /// Surface text, punctuation included.
    pub text: String,
    /// Position among all units of the selection, in document order.
    pub ordinal: usize,
    pub handle: WordHandle,
}

/// Upstream estimate of when a word is spoken. Interval is `[start, end)` in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingHint {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl TimingHint {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }

    /// `end <= start` (or NaN bounds): treated as zero-duration.
    pub fn is_degenerate(&self) -> bool {
        !(self.end > self.start)
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// Best-effort correspondence from unit ordinal to timing hint index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentMap {
    entries: Vec<Option<usize>>,
}

impl AlignmentMap {
    pub(crate) fn from_entries(entries: Vec<Option<usize>>) -> Self {
        Self { entries }
    }

    pub fn get(&self, ordinal: usize) -> Option<usize> {
        self.entries.get(ordinal).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Option<usize>] {
        &self.entries
    }

    /// `(ordinal, hint_index)` for every mapped unit, in ordinal order.
    pub fn mapped(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(ordinal, hint)| hint.map(|h| (ordinal, h)))
    }

    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Share of units with a hint, in `[0, 1]`. An empty map has full coverage.
    pub fn coverage(&self) -> f32 {
        if self.entries.is_empty() {
            return 1.0;
        }
        self.mapped_count() as f32 / self.entries.len() as f32
    }

    pub fn is_monotonic(&self) -> bool {
        let mut last: Option<usize> = None;
        for (_, hint) in self.mapped() {
            if last.is_some_and(|prev| hint <= prev) {
                return false;
            }
            last = Some(hint);
        }
        true
    }

    /// Flat form with `-1` marking unmapped units.
    pub fn to_sentinel_vec(&self) -> Vec<i64> {
        self.entries
            .iter()
            .map(|e| e.map(|h| h as i64).unwrap_or(-1))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakRequest {
    pub text: String,
    pub character: String,
    pub speed: f32,
}

impl SpeakRequest {
    pub fn new(
        text: impl Into<String>,
        character: impl Into<String>,
        speed: f32,
    ) -> Result<Self, HighlightError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(HighlightError::selection("Select some text first"));
        }
        if text.chars().count() > MAX_REQUEST_CHARS {
            return Err(HighlightError::selection(format!(
                "Text too long (max {MAX_REQUEST_CHARS} characters)"
            )));
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(HighlightError::invalid_input(format!(
                "speed must be a positive number, got {speed}"
            )));
        }
        Ok(Self {
            text,
            character: character.into(),
            speed,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakResponse {
    /// Encoded audio, decodable by the host's audio element.
    pub audio: Vec<u8>,
    /// May be empty; playback then runs without highlighting.
    #[serde(default)]
    pub timings: Vec<TimingHint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    #[serde(default)]
    pub has_index: bool,
}
