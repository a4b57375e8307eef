use crate::dom::{char_slice, Document, DomRange, NodeId, TextSegment};
use crate::error::HighlightError;
use crate::types::{WordHandle, WordUnit};

/// Attribute carrying a wrapper's ordinal.
pub const WORD_INDEX_ATTRIBUTE: &str = "data-word-index";
const WRAPPER_TAG: &str = "span";

/// Word units created by one tokenization pass, plus the parents whose text
/// children were split. Hand it back to the restorer to undo the pass.
#[must_use = "a tokenized selection must be restored"]
#[derive(Debug, Default)]
pub struct TokenizedSelection {
    pub(crate) units: Vec<WordUnit>,
    pub(crate) parents: Vec<NodeId>,
}

impl TokenizedSelection {
    pub fn units(&self) -> &[WordUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Splits `text` into alternating whitespace and non-whitespace runs.
/// The boolean marks word runs. Concatenating the pieces yields `text`.
pub fn split_word_runs(text: &str) -> Vec<(bool, &str)> {
    let mut pieces = Vec::new();
    let mut run_start = 0usize;
    let mut run_is_word: Option<bool> = None;
    for (idx, c) in text.char_indices() {
        let is_word = !c.is_whitespace();
        match run_is_word {
            Some(current) if current == is_word => {}
            Some(current) => {
                pieces.push((current, &text[run_start..idx]));
                run_start = idx;
                run_is_word = Some(is_word);
            }
            None => run_is_word = Some(is_word),
        }
    }
    if let Some(current) = run_is_word {
        pieces.push((current, &text[run_start..]));
    }
    pieces
}

/// Wraps every whitespace-delimited word inside `range` in its own wrapper
/// element carrying `word_class`.
///
/// Ranges touching editable content are refused and produce an empty
/// selection. A text node that cannot be replaced (the page changed under us)
/// is skipped; ordinals stay dense over the nodes that succeeded.
pub fn tokenize_range(doc: &mut Document, range: &DomRange, word_class: &str) -> TokenizedSelection {
    let mut selection = TokenizedSelection::default();
    if range.intersects_editable(doc) {
        tracing::debug!("tokenization: range intersects editable content; refusing");
        return selection;
    }

    let segments = range.text_segments(doc);
    for segment in segments {
        let next_ordinal = selection.units.len();
        match wrap_segment(doc, segment, word_class, next_ordinal) {
            Ok(Some((parent, units))) => {
                if !selection.parents.contains(&parent) {
                    selection.parents.push(parent);
                }
                selection.units.extend(units);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    node = ?segment.node,
                    error = %err,
                    "tokenization: skipping text node"
                );
            }
        }
    }

    tracing::debug!(
        unit_count = selection.units.len(),
        parent_count = selection.parents.len(),
        "tokenization: wrapped selection"
    );
    selection
}

fn wrap_segment(
    doc: &mut Document,
    segment: TextSegment,
    word_class: &str,
    first_ordinal: usize,
) -> Result<Option<(NodeId, Vec<WordUnit>)>, HighlightError> {
    let text = doc
        .text(segment.node)
        .ok_or(HighlightError::stale(segment.node, "text node vanished"))?
        .to_string();
    let parent = doc
        .parent(segment.node)
        .ok_or(HighlightError::stale(segment.node, "node is detached"))?;

    let char_len = text.chars().count();
    let prefix = char_slice(&text, 0, segment.start);
    let middle = char_slice(&text, segment.start, segment.end);
    let suffix = char_slice(&text, segment.end, char_len);

    let pieces = split_word_runs(middle);
    if !pieces.iter().any(|(is_word, _)| *is_word) {
        return Ok(None);
    }

    let mut replacements = Vec::with_capacity(pieces.len() + 2);
    let mut units = Vec::new();
    if !prefix.is_empty() {
        replacements.push(doc.create_text(prefix));
    }
    for (is_word, piece) in pieces {
        if !is_word {
            replacements.push(doc.create_text(piece));
            continue;
        }
        let ordinal = first_ordinal + units.len();
        let wrapper = doc.create_element(WRAPPER_TAG);
        doc.set_attribute(wrapper, "class", word_class)?;
        doc.set_attribute(wrapper, WORD_INDEX_ATTRIBUTE, &ordinal.to_string())?;
        doc.append_text(wrapper, piece)?;
        replacements.push(wrapper);
        units.push(WordUnit {
            text: piece.to_string(),
            ordinal,
            handle: WordHandle::new(wrapper),
        });
    }
    if !suffix.is_empty() {
        replacements.push(doc.create_text(suffix));
    }

    doc.replace_with(segment.node, &replacements)?;
    Ok(Some((parent, units)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::BoundaryPoint;

    const CLASS: &str = "w";

    fn texts(selection: &TokenizedSelection) -> Vec<&str> {
        selection.units().iter().map(|u| u.text.as_str()).collect()
    }

    #[test]
    fn split_word_runs_preserves_text() {
        let pieces = split_word_runs("  Hello,\u{a0} world ");
        assert_eq!(
            pieces,
            vec![
                (false, "  "),
                (true, "Hello,"),
                (false, "\u{a0} "),
                (true, "world"),
                (false, " "),
            ]
        );
        assert!(split_word_runs("").is_empty());
        assert_eq!(split_word_runs("one"), vec![(true, "one")]);
    }

    #[test]
    fn tokenizes_single_text_node() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        doc.append_text(p, "Hello, how are you?").unwrap();
        let range = DomRange::select_contents(&doc, p);

        let selection = tokenize_range(&mut doc, &range, CLASS);
        assert_eq!(texts(&selection), ["Hello,", "how", "are", "you?"]);
        for (idx, unit) in selection.units().iter().enumerate() {
            assert_eq!(unit.ordinal, idx);
            assert!(doc.has_class(unit.handle.node(), CLASS));
            assert_eq!(
                doc.attribute(unit.handle.node(), WORD_INDEX_ATTRIBUTE),
                Some(idx.to_string().as_str())
            );
        }
        assert_eq!(doc.text_content(p), "Hello, how are you?");
        assert_eq!(
            doc.to_markup(p),
            "<p><span class=\"w\" data-word-index=\"0\">Hello,</span> \
<span class=\"w\" data-word-index=\"1\">how</span> \
<span class=\"w\" data-word-index=\"2\">are</span> \
<span class=\"w\" data-word-index=\"3\">you?</span></p>"
        );
    }

    #[test]
    fn partial_selection_keeps_outside_text() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let t = doc.append_text(p, "skip this keep that").unwrap();
        let range = DomRange::new(BoundaryPoint::new(t, 5), BoundaryPoint::new(t, 14));

        let selection = tokenize_range(&mut doc, &range, CLASS);
        assert_eq!(texts(&selection), ["this", "keep"]);
        assert_eq!(doc.text(doc.children(p)[0]), Some("skip "));
        assert_eq!(doc.text(*doc.children(p).last().unwrap()), Some(" that"));
        assert_eq!(doc.text_content(p), "skip this keep that");
    }

    #[test]
    fn split_word_at_boundary_is_partial_literal() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let t = doc.append_text(p, "wonderful day").unwrap();
        let range = DomRange::new(BoundaryPoint::new(t, 3), BoundaryPoint::new(t, 13));

        let selection = tokenize_range(&mut doc, &range, CLASS);
        assert_eq!(texts(&selection), ["derful", "day"]);
        assert_eq!(doc.text_content(p), "wonderful day");
    }

    #[test]
    fn spans_inline_elements_and_leaves_structure() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        doc.append_text(p, "A ").unwrap();
        let b = doc.append_element(p, "b").unwrap();
        doc.append_text(b, "bold move").unwrap();
        let img = doc.append_element(p, "img").unwrap();
        doc.append_text(p, "done.").unwrap();
        let range = DomRange::select_contents(&doc, p);

        let selection = tokenize_range(&mut doc, &range, CLASS);
        assert_eq!(texts(&selection), ["A", "bold", "move", "done."]);
        assert_eq!(doc.parent(img), Some(p));
        assert_eq!(doc.parent(selection.units()[1].handle.node()), Some(b));
        assert_eq!(selection.parents, vec![p, b]);
        assert_eq!(doc.text_content(p), "A bold movedone.");
    }

    #[test]
    fn whitespace_only_range_produces_nothing() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        doc.append_text(p, "   \n\t ").unwrap();
        let before = doc.to_markup(p);
        let range = DomRange::select_contents(&doc, p);

        let selection = tokenize_range(&mut doc, &range, CLASS);
        assert!(selection.is_empty());
        assert_eq!(doc.to_markup(p), before);
    }

    #[test]
    fn editable_range_is_refused() {
        let mut doc = Document::new();
        let div = doc.append_element(doc.root(), "div").unwrap();
        doc.set_attribute(div, "contenteditable", "").unwrap();
        doc.append_text(div, "user typed this").unwrap();
        let before = doc.to_markup(div);
        let range = DomRange::select_contents(&doc, div);

        let selection = tokenize_range(&mut doc, &range, CLASS);
        assert!(selection.is_empty());
        assert_eq!(doc.to_markup(div), before);
    }
}
