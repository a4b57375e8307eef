use serde::Serialize;

use crate::types::{AlignmentMap, TimingHint};

pub const REPORT_SCHEMA_VERSION: u32 = 1;
const EPS_DURATION_SEC: f64 = 0.001;

#[derive(Debug, Clone, Serialize)]
pub struct AlignmentReport {
    pub schema_version: u32,
    pub unit_count: usize,
    pub hint_count: usize,
    pub mapped_count: usize,
    pub coverage: f32,
    /// Hints no unit was matched to.
    pub unused_hint_count: usize,
    pub unmapped_words: Vec<UnmappedWord>,
    pub structure: HintStructure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmappedWord {
    pub ordinal: usize,
    pub text: String,
}

/// Shape of the timing sequence itself, independent of the units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintStructure {
    pub degenerate_interval_count: u32,
    pub overlap_count: u32,
    pub non_monotonic_count: u32,
    /// Silence between consecutive hints over the total spoken span.
    pub gap_ratio: f32,
    pub total_span_sec: f64,
}

pub fn compute_report<S: AsRef<str>>(
    words: &[S],
    hints: &[TimingHint],
    map: &AlignmentMap,
) -> AlignmentReport {
    let unmapped_words = words
        .iter()
        .enumerate()
        .filter(|(ordinal, _)| map.get(*ordinal).is_none())
        .map(|(ordinal, word)| UnmappedWord {
            ordinal,
            text: word.as_ref().to_string(),
        })
        .collect::<Vec<_>>();

    let mapped_count = map.mapped_count();
    AlignmentReport {
        schema_version: REPORT_SCHEMA_VERSION,
        unit_count: words.len(),
        hint_count: hints.len(),
        mapped_count,
        coverage: map.coverage(),
        unused_hint_count: hints.len().saturating_sub(mapped_count),
        unmapped_words,
        structure: hint_structure(hints),
    }
}

pub fn hint_structure(hints: &[TimingHint]) -> HintStructure {
    let mut degenerate_interval_count = 0u32;
    let mut overlap_count = 0u32;
    let mut non_monotonic_count = 0u32;
    let mut gap_sec = 0.0f64;

    for (idx, hint) in hints.iter().enumerate() {
        if hint.end - hint.start < EPS_DURATION_SEC || hint.is_degenerate() {
            degenerate_interval_count += 1;
        }
        let Some(prev) = idx.checked_sub(1).map(|p| &hints[p]) else {
            continue;
        };
        if hint.start < prev.start {
            non_monotonic_count += 1;
        }
        if hint.start < prev.end {
            overlap_count += 1;
        } else {
            gap_sec += hint.start - prev.end;
        }
    }

    let total_span_sec = match (hints.first(), hints.last()) {
        (Some(first), Some(last)) => (last.end - first.start).max(0.0),
        _ => 0.0,
    };
    let gap_ratio = if total_span_sec > EPS_DURATION_SEC {
        (gap_sec / total_span_sec) as f32
    } else {
        0.0
    };

    HintStructure {
        degenerate_interval_count,
        overlap_count,
        non_monotonic_count,
        gap_ratio,
        total_span_sec,
    }
}
