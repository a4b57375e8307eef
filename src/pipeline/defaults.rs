use crate::alignment::fuzzy_match::align_units;
use crate::alignment::tokenization::{tokenize_range, TokenizedSelection};
use crate::config::ReaderConfig;
use crate::dom::{Document, DomRange};
use crate::pipeline::traits::{SequenceAligner, Status, StatusSink, WordTokenizer};
use crate::types::{AlignmentMap, TimingHint, WordUnit};

pub struct WhitespaceTokenizer;

impl WordTokenizer for WhitespaceTokenizer {
    fn tokenize(&self, doc: &mut Document, range: &DomRange, word_class: &str) -> TokenizedSelection {
        tokenize_range(doc, range, word_class)
    }
}

pub struct FuzzyWindowAligner {
    window: usize,
}

impl FuzzyWindowAligner {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }
}

impl Default for FuzzyWindowAligner {
    fn default() -> Self {
        Self::new(ReaderConfig::DEFAULT_MATCH_WINDOW)
    }
}

impl SequenceAligner for FuzzyWindowAligner {
    fn align(&self, units: &[WordUnit], hints: &[TimingHint]) -> AlignmentMap {
        align_units(units, hints, self.window)
    }
}

/// Sink used when the host does not register one: status lines go to the log.
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn report(&mut self, status: &Status) {
        match status {
            Status::Error(_) => tracing::warn!(status = %status, "status"),
            _ => tracing::info!(status = %status, "status"),
        }
    }
}
