use crate::alignment::restore::{restore_selection, RestoreSummary};
use crate::alignment::tokenization::TokenizedSelection;
use crate::dom::Document;
use crate::pipeline::scheduler::{FrameOutcome, SyncScheduler};
use crate::pipeline::traits::{FrameHandle, FrameSource};
use crate::types::{AlignmentMap, TimingHint, WordUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Tokenized,
    Aligned,
    Playing,
    Paused,
    Ended,
    Canceled,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Tokenized => "tokenized",
            SessionState::Aligned => "aligned",
            SessionState::Playing => "playing",
            SessionState::Paused => "paused",
            SessionState::Ended => "ended",
            SessionState::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Ended | SessionState::Canceled)
    }
}

/// Host audio element events.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Playing,
    Paused,
    Seeked,
    Ended,
    Error(String),
}

/// One speak request from tokenization to restoration.
///
/// The session owns the tokenized selection (and with it every wrapper
/// handle); `finish` is the only way out and always restores the document.
#[derive(Debug)]
pub struct PlaybackSession {
    id: u64,
    state: SessionState,
    selection: TokenizedSelection,
    hints: Vec<TimingHint>,
    map: AlignmentMap,
    scheduler: SyncScheduler,
}

impl PlaybackSession {
    pub fn new(id: u64, selection: TokenizedSelection, scheduler: SyncScheduler) -> Self {
        Self {
            id,
            state: SessionState::Tokenized,
            selection,
            hints: Vec::new(),
            map: AlignmentMap::default(),
            scheduler,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn units(&self) -> &[WordUnit] {
        self.selection.units()
    }

    pub fn alignment(&self) -> &AlignmentMap {
        &self.map
    }

    pub fn hints(&self) -> &[TimingHint] {
        &self.hints
    }

    pub fn active(&self) -> Option<usize> {
        self.scheduler.active()
    }

    pub fn is_looping(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    pub fn attach_alignment(&mut self, hints: Vec<TimingHint>, map: AlignmentMap) {
        debug_assert_eq!(map.len(), self.selection.len());
        self.hints = hints;
        self.map = map;
        self.transition(SessionState::Aligned);
    }

    /// Enters `Playing`; the frame loop only runs when some unit has timing.
    pub fn play(&mut self, frames: &mut dyn FrameSource) {
        if self.state.is_terminal() {
            return;
        }
        if self.map.mapped_count() > 0 {
            self.scheduler.start(frames);
        }
        self.transition(SessionState::Playing);
    }

    /// Halts the loop; the highlight stays where it is.
    pub fn pause(&mut self, frames: &mut dyn FrameSource) {
        if self.state != SessionState::Playing {
            return;
        }
        self.scheduler.stop(frames);
        self.transition(SessionState::Paused);
    }

    /// Handles a delivered frame. Returns `None` for stale handles.
    pub fn frame(
        &mut self,
        handle: FrameHandle,
        t: f64,
        doc: &mut Document,
        frames: &mut dyn FrameSource,
    ) -> Option<FrameOutcome> {
        if self.state != SessionState::Playing || !self.scheduler.accepts(handle) {
            return None;
        }
        Some(
            self.scheduler
                .tick(t, doc, self.selection.units(), &self.map, &self.hints, frames),
        )
    }

    /// Re-evaluates once without scheduling, e.g. after a seek while paused.
    pub fn refresh(&mut self, t: f64, doc: &mut Document) -> Option<FrameOutcome> {
        if !matches!(self.state, SessionState::Playing | SessionState::Paused) {
            return None;
        }
        Some(
            self.scheduler
                .evaluate(t, doc, self.selection.units(), &self.map, &self.hints),
        )
    }

    /// Stops the loop, clears the highlight and restores the document. Safe
    /// from any state and idempotent.
    pub fn finish(
        &mut self,
        doc: &mut Document,
        frames: &mut dyn FrameSource,
        terminal: SessionState,
    ) -> RestoreSummary {
        debug_assert!(terminal.is_terminal());
        self.scheduler.cancel(frames, doc, self.selection.units());
        let summary = restore_selection(doc, &mut self.selection);
        self.hints.clear();
        self.map = AlignmentMap::default();
        if !self.state.is_terminal() {
            self.transition(terminal);
        }
        summary
    }

    fn transition(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        tracing::debug!(
            session_id = self.id,
            from = self.state.as_str(),
            to = next.as_str(),
            "session: state transition"
        );
        self.state = next;
    }
}
