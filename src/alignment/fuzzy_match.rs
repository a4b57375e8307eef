use crate::types::{AlignmentMap, TimingHint, WordUnit};

/// Case-folds and keeps only alphanumeric characters.
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Fuzzy equality on normalized words: equal, or one contains the other.
/// An empty side only matches another empty side; containment would accept
/// anything.
pub fn words_match(unit: &str, hint: &str) -> bool {
    if unit.is_empty() || hint.is_empty() {
        return unit == hint;
    }
    unit == hint || unit.contains(hint) || hint.contains(unit)
}

/// Sequential two-pointer match of `words` against `hints`.
///
/// For each word, only the next `window` unconsumed hints are searched. A
/// match consumes every hint up to and including the matched one; a miss
/// leaves the cursor where it was so the following words can still use those
/// hints. The cursor never moves backwards, which keeps mapped indices
/// strictly increasing and the cost at O(words * window).
pub fn align_words<S: AsRef<str>>(words: &[S], hints: &[TimingHint], window: usize) -> AlignmentMap {
    let window = window.max(1);
    let normalized_hints: Vec<String> = hints.iter().map(|h| normalize_word(&h.word)).collect();

    let mut entries = Vec::with_capacity(words.len());
    let mut cursor = 0usize;
    for word in words {
        let normalized = normalize_word(word.as_ref());
        let window_end = (cursor + window).min(normalized_hints.len());
        let matched = (cursor..window_end).find(|&idx| words_match(&normalized, &normalized_hints[idx]));
        if let Some(idx) = matched {
            cursor = idx + 1;
        }
        entries.push(matched);
    }

    let map = AlignmentMap::from_entries(entries);
    debug_assert!(map.is_monotonic(), "alignment cursor moved backwards");
    map
}

pub fn align_units(units: &[WordUnit], hints: &[TimingHint], window: usize) -> AlignmentMap {
    let words: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
    let map = align_words(&words, hints, window);

    let degenerate = hints.iter().filter(|h| h.is_degenerate()).count();
    if degenerate > 0 {
        tracing::warn!(
            degenerate_hint_count = degenerate,
            "alignment: hints with end <= start are treated as zero-duration"
        );
    }
    tracing::debug!(
        unit_count = units.len(),
        hint_count = hints.len(),
        mapped_count = map.mapped_count(),
        coverage = format!("{:.3}", map.coverage()),
        "alignment: matched units to timing hints"
    );
    map
}
