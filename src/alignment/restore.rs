use crate::alignment::tokenization::TokenizedSelection;
use crate::dom::Document;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub restored: usize,
    pub skipped: usize,
}

/// Collapses every wrapper of `selection` back into plain text and merges the
/// split text nodes of the touched parents.
///
/// Consumes the selection's units, so a second call is a no-op. Wrappers the
/// page already removed are skipped.
pub fn restore_selection(doc: &mut Document, selection: &mut TokenizedSelection) -> RestoreSummary {
    let mut summary = RestoreSummary::default();
    if selection.units.is_empty() && selection.parents.is_empty() {
        return summary;
    }

    for unit in selection.units.drain(..) {
        let wrapper = unit.handle.node();
        if doc.parent(wrapper).is_none() {
            summary.skipped += 1;
            continue;
        }
        let text = doc.create_text(&unit.text);
        match doc.replace_with(wrapper, &[text]) {
            Ok(()) => summary.restored += 1,
            Err(err) => {
                tracing::warn!(
                    ordinal = unit.ordinal,
                    error = %err,
                    "restore: could not unwrap word"
                );
                summary.skipped += 1;
            }
        }
    }

    for parent in selection.parents.drain(..) {
        doc.normalize(parent);
    }

    if summary.skipped > 0 {
        tracing::warn!(
            restored = summary.restored,
            skipped = summary.skipped,
            "restore: some wrappers were already gone"
        );
    } else {
        tracing::debug!(restored = summary.restored, "restore: selection unwrapped");
    }
    summary
}
