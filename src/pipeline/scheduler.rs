use crate::config::ReaderConfig;
use crate::dom::{Document, NodeId};
use crate::pipeline::traits::{FrameHandle, FrameSource, Viewport};
use crate::types::{AlignmentMap, TimingHint, WordUnit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub active: Option<usize>,
    /// Position within the active word's interval, in `[0, 1]`. Drives
    /// cosmetic mouth animation; zero-duration words report `1.0`.
    pub progress: Option<f64>,
    pub changed: bool,
}

/// Which unit should be highlighted at time `t`.
///
/// 1. The first mapped unit, in ordinal order, whose hint contains `t`.
/// 2. Otherwise the last mapped unit that has started while the next mapped
///    unit has not, so a word stays lit through the pause after it.
/// 3. Otherwise nothing (before the first word, after the last one).
pub fn resolve_active(t: f64, map: &AlignmentMap, hints: &[TimingHint]) -> Option<usize> {
    if !t.is_finite() {
        return None;
    }
    let mapped: Vec<(usize, &TimingHint)> = map
        .mapped()
        .filter_map(|(ordinal, idx)| hints.get(idx).map(|hint| (ordinal, hint)))
        .collect();

    if let Some(&(ordinal, _)) = mapped.iter().find(|(_, hint)| hint.contains(t)) {
        return Some(ordinal);
    }

    mapped
        .windows(2)
        .rev()
        .find(|pair| pair[0].1.start <= t && pair[1].1.start > t)
        .map(|pair| pair[0].0)
}

pub fn word_progress(t: f64, hint: &TimingHint) -> f64 {
    if hint.is_degenerate() {
        return 1.0;
    }
    ((t - hint.start) / (hint.end - hint.start)).clamp(0.0, 1.0)
}

/// Per-frame highlight loop. Moves the highlight class, never the structure.
#[derive(Debug)]
pub struct SyncScheduler {
    active_class: String,
    auto_scroll: bool,
    scroll_margin_px: f64,
    pending: Option<FrameHandle>,
    active: Option<usize>,
}

impl SyncScheduler {
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            active_class: config.active_class.clone(),
            auto_scroll: config.auto_scroll,
            scroll_margin_px: config.scroll_margin_px,
            pending: None,
            active: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn start(&mut self, frames: &mut dyn FrameSource) {
        if self.pending.is_none() {
            self.pending = Some(frames.request_frame());
        }
    }

    pub fn stop(&mut self, frames: &mut dyn FrameSource) {
        if let Some(handle) = self.pending.take() {
            frames.cancel_frame(handle);
        }
    }

    /// Like `stop`, but also clears the highlight.
    pub fn cancel(&mut self, frames: &mut dyn FrameSource, doc: &mut Document, units: &[WordUnit]) {
        self.stop(frames);
        self.set_active(doc, units, None);
    }

    pub fn accepts(&self, handle: FrameHandle) -> bool {
        self.pending == Some(handle)
    }

    pub fn tick(
        &mut self,
        t: f64,
        doc: &mut Document,
        units: &[WordUnit],
        map: &AlignmentMap,
        hints: &[TimingHint],
        frames: &mut dyn FrameSource,
    ) -> FrameOutcome {
        let outcome = self.evaluate(t, doc, units, map, hints);
        self.pending = Some(frames.request_frame());
        outcome
    }

    pub fn evaluate(
        &mut self,
        t: f64,
        doc: &mut Document,
        units: &[WordUnit],
        map: &AlignmentMap,
        hints: &[TimingHint],
    ) -> FrameOutcome {
        let active = resolve_active(t, map, hints);
        let progress = active
            .and_then(|ordinal| map.get(ordinal))
            .and_then(|idx| hints.get(idx))
            .map(|hint| word_progress(t, hint));
        let changed = active != self.active;
        if changed {
            self.set_active(doc, units, active);
        }
        FrameOutcome {
            active,
            progress,
            changed,
        }
    }

    fn set_active(&mut self, doc: &mut Document, units: &[WordUnit], next: Option<usize>) {
        if let Some(unit) = self.active.and_then(|ordinal| units.get(ordinal)) {
            if let Err(err) = doc.remove_class(unit.handle.node(), &self.active_class) {
                tracing::debug!(ordinal = unit.ordinal, error = %err, "scheduler: could not clear highlight");
            }
        }
        if let Some(unit) = next.and_then(|ordinal| units.get(ordinal)) {
            if let Err(err) = doc.add_class(unit.handle.node(), &self.active_class) {
                tracing::debug!(ordinal = unit.ordinal, error = %err, "scheduler: could not apply highlight");
            }
        }
        self.active = next;
    }

    pub fn scroll_if_near_edge(&self, node: NodeId, viewport: &mut dyn Viewport) -> bool {
        if !self.auto_scroll {
            return false;
        }
        let Some(rect) = viewport.node_rect(node) else {
            return false;
        };
        let height = viewport.height();
        if rect.top < self.scroll_margin_px || rect.bottom > height - self.scroll_margin_px {
            viewport.scroll_into_view(node);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::fuzzy_match::align_words;
    use crate::alignment::tokenization::tokenize_range;
    use crate::dom::DomRange;
    use crate::pipeline::traits::NodeRect;

    fn scenario_hints() -> Vec<TimingHint> {
        vec![
            TimingHint::new("hello", 0.0, 0.4),
            TimingHint::new("how", 0.4, 0.6),
            TimingHint::new("are", 0.6, 0.8),
            TimingHint::new("you", 0.8, 1.2),
        ]
    }

    fn scenario_map() -> AlignmentMap {
        align_words(&["Hello,", "how", "are", "you?"], &scenario_hints(), 3)
    }

    #[derive(Default)]
    struct CountingFrames {
        next: u64,
        cancelled: Vec<FrameHandle>,
    }

    impl FrameSource for CountingFrames {
        fn request_frame(&mut self) -> FrameHandle {
            self.next += 1;
            FrameHandle(self.next)
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.cancelled.push(handle);
        }
    }

    struct FixedViewport {
        rect: NodeRect,
        scrolled: Vec<NodeId>,
    }

    impl Viewport for FixedViewport {
        fn height(&self) -> f64 {
            800.0
        }

        fn node_rect(&self, _node: NodeId) -> Option<NodeRect> {
            Some(self.rect)
        }

        fn scroll_into_view(&mut self, node: NodeId) {
            self.scrolled.push(node);
        }
    }

    #[test]
    fn resolve_inside_intervals() {
        let map = scenario_map();
        let hints = scenario_hints();
        assert_eq!(resolve_active(0.0, &map, &hints), Some(0));
        assert_eq!(resolve_active(0.5, &map, &hints), Some(1));
        assert_eq!(resolve_active(0.6, &map, &hints), Some(2));
        assert_eq!(resolve_active(1.19, &map, &hints), Some(3));
    }

    #[test]
    fn resolve_outside_all_intervals() {
        let map = scenario_map();
        let hints = scenario_hints();
        assert_eq!(resolve_active(1.3, &map, &hints), None);
        assert_eq!(resolve_active(-0.1, &map, &hints), None);
        assert_eq!(resolve_active(f64::NAN, &map, &hints), None);
    }

    #[test]
    fn gap_keeps_previous_word() {
        let hints = vec![TimingHint::new("a", 0.0, 0.3), TimingHint::new("b", 0.8, 1.0)];
        let map = align_words(&["a", "b"], &hints, 3);
        assert_eq!(resolve_active(0.5, &map, &hints), Some(0));
        assert_eq!(resolve_active(0.8, &map, &hints), Some(1));
    }

    #[test]
    fn unmapped_units_are_skipped() {
        let hints = vec![
            TimingHint::new("hello", 0.0, 0.4),
            TimingHint::new("howare", 0.4, 0.8),
            TimingHint::new("you", 0.8, 1.2),
        ];
        let map = align_words(&["Hello,", "how", "are", "you?"], &hints, 3);
        assert_eq!(resolve_active(0.7, &map, &hints), Some(1));
        assert_eq!(resolve_active(0.9, &map, &hints), Some(3));
    }

    #[test]
    fn overlapping_hints_prefer_first_ordinal() {
        let hints = vec![TimingHint::new("a", 0.0, 1.0), TimingHint::new("b", 0.5, 1.5)];
        let map = align_words(&["a", "b"], &hints, 3);
        assert_eq!(resolve_active(0.7, &map, &hints), Some(0));
        assert_eq!(resolve_active(1.2, &map, &hints), Some(1));
    }

    #[test]
    fn degenerate_hint_is_passed_over() {
        let hints = vec![
            TimingHint::new("a", 0.0, 0.3),
            TimingHint::new("b", 0.3, 0.3),
            TimingHint::new("c", 0.3, 0.6),
        ];
        let map = align_words(&["a", "b", "c"], &hints, 3);
        assert_eq!(resolve_active(0.3, &map, &hints), Some(2));
    }

    #[test]
    fn progress_within_word() {
        let hint = TimingHint::new("a", 1.0, 2.0);
        assert!((word_progress(1.25, &hint) - 0.25).abs() < 1e-9);
        assert_eq!(word_progress(3.0, &hint), 1.0);
        assert_eq!(word_progress(1.0, &TimingHint::new("z", 1.0, 1.0)), 1.0);
    }

    #[test]
    fn evaluate_moves_highlight() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        doc.append_text(p, "Hello, how are you?").unwrap();
        let range = DomRange::select_contents(&doc, p);
        let selection = tokenize_range(&mut doc, &range, "w");
        let units = selection.units();
        let map = scenario_map();
        let hints = scenario_hints();
        let mut scheduler = SyncScheduler::new(&ReaderConfig {
            active_class: "on".to_string(),
            ..ReaderConfig::default()
        });

        let first = scheduler.evaluate(0.5, &mut doc, units, &map, &hints);
        assert_eq!(first.active, Some(1));
        assert!(first.changed);
        assert!(doc.has_class(units[1].handle.node(), "on"));

        let same = scheduler.evaluate(0.55, &mut doc, units, &map, &hints);
        assert!(!same.changed);

        let next = scheduler.evaluate(0.9, &mut doc, units, &map, &hints);
        assert_eq!(next.active, Some(3));
        assert!(!doc.has_class(units[1].handle.node(), "on"));
        assert!(doc.has_class(units[3].handle.node(), "on"));

        let done = scheduler.evaluate(1.3, &mut doc, units, &map, &hints);
        assert_eq!(done.active, None);
        assert!(units.iter().all(|u| !doc.has_class(u.handle.node(), "on")));
    }

    #[test]
    fn loop_handles_and_stop() {
        let mut frames = CountingFrames::default();
        let mut scheduler = SyncScheduler::new(&ReaderConfig::default());
        scheduler.start(&mut frames);
        scheduler.start(&mut frames);
        assert!(scheduler.accepts(FrameHandle(1)));
        assert!(!scheduler.accepts(FrameHandle(2)));

        let mut doc = Document::new();
        let outcome = scheduler.tick(0.0, &mut doc, &[], &AlignmentMap::default(), &[], &mut frames);
        assert_eq!(outcome.active, None);
        assert!(scheduler.accepts(FrameHandle(2)));

        scheduler.stop(&mut frames);
        assert!(!scheduler.is_running());
        assert_eq!(frames.cancelled, vec![FrameHandle(2)]);
        assert!(!scheduler.accepts(FrameHandle(2)));
    }

    #[test]
    fn scroll_only_near_edges() {
        let scheduler = SyncScheduler::new(&ReaderConfig::default());
        let node = Document::new().root();
        let mut centered = FixedViewport {
            rect: NodeRect { top: 400.0, bottom: 420.0 },
            scrolled: Vec::new(),
        };
        assert!(!scheduler.scroll_if_near_edge(node, &mut centered));

        let mut bottom = FixedViewport {
            rect: NodeRect { top: 760.0, bottom: 780.0 },
            scrolled: Vec::new(),
        };
        assert!(scheduler.scroll_if_near_edge(node, &mut bottom));
        assert_eq!(bottom.scrolled, vec![node]);

        let disabled = SyncScheduler::new(&ReaderConfig {
            auto_scroll: false,
            ..ReaderConfig::default()
        });
        assert!(!disabled.scroll_if_near_edge(node, &mut bottom));
    }
}
