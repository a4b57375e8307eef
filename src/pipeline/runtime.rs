use crate::alignment::report::compute_report;
use crate::config::ReaderConfig;
use crate::dom::{Document, DomRange, NodeId};
use crate::error::HighlightError;
use crate::pipeline::scheduler::{FrameOutcome, SyncScheduler};
use crate::pipeline::session::{PlaybackEvent, PlaybackSession, SessionState};
use crate::pipeline::traits::{
    AudioOutput, FrameHandle, FrameSource, SequenceAligner, Status, StatusSink, SynthesisBackend,
    Viewport, WordTokenizer,
};
use crate::types::{AlignmentMap, SpeakRequest, SpeakResponse};

pub const CANCEL_KEY: &str = "Escape";

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSpeak {
    pub request_id: u64,
    pub request: SpeakRequest,
}

/// Owns the single playback session. Failures surface as a [`Status`].
pub struct ReadAlong {
    config: ReaderConfig,
    tokenizer: Box<dyn WordTokenizer>,
    aligner: Box<dyn SequenceAligner>,
    audio: Box<dyn AudioOutput>,
    frames: Box<dyn FrameSource>,
    viewport: Option<Box<dyn Viewport>>,
    status: Box<dyn StatusSink>,
    session: Option<PlaybackSession>,
    next_request_id: u64,
}

pub(crate) struct ReadAlongParts {
    pub config: ReaderConfig,
    pub tokenizer: Box<dyn WordTokenizer>,
    pub aligner: Box<dyn SequenceAligner>,
    pub audio: Box<dyn AudioOutput>,
    pub frames: Box<dyn FrameSource>,
    pub viewport: Option<Box<dyn Viewport>>,
    pub status: Box<dyn StatusSink>,
}

impl ReadAlong {
    pub(crate) fn from_parts(parts: ReadAlongParts) -> Self {
        Self {
            config: parts.config,
            tokenizer: parts.tokenizer,
            aligner: parts.aligner,
            audio: parts.audio,
            frames: parts.frames,
            viewport: parts.viewport,
            status: parts.status,
            session: None,
            next_request_id: 1,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(SessionState::Idle)
    }

    pub fn active_word(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.active())
    }

    pub fn word_count(&self) -> usize {
        self.session.as_ref().map(|s| s.units().len()).unwrap_or(0)
    }

    pub fn alignment(&self) -> Option<&AlignmentMap> {
        self.session.as_ref().map(|s| s.alignment())
    }

    pub fn speak(&mut self, doc: &mut Document, range: &DomRange, backend: &dyn SynthesisBackend) {
        let Some(pending) = self.begin_speak(doc, range) else {
            return;
        };
        let result = backend.synthesize(&pending.request);
        self.complete_speak(doc, pending.request_id, result);
    }

    /// Validates the selection, supersedes any running session, then
    /// tokenizes. `None` means a status was reported instead.
    pub fn begin_speak(&mut self, doc: &mut Document, range: &DomRange) -> Option<PendingSpeak> {
        let text = range.text(doc);
        if range.is_collapsed() || text.trim().is_empty() {
            self.report(Status::Selection("Select some text first".to_string()));
            return None;
        }
        if range.intersects_editable(doc) {
            self.report(Status::Selection(
                "Cannot read text inside editable fields".to_string(),
            ));
            return None;
        }
        let request = match SpeakRequest::new(text, &self.config.character, self.config.speed) {
            Ok(request) => request,
            Err(err @ HighlightError::Selection { .. }) => {
                self.report(Status::Selection(err.to_string()));
                return None;
            }
            Err(err) => {
                self.report(Status::Error(err.to_string()));
                return None;
            }
        };

        let range = self.supersede(doc, range);
        let mut selection = self.tokenizer.tokenize(doc, &range, &self.config.word_class);
        if selection.is_empty() {
            crate::alignment::restore::restore_selection(doc, &mut selection);
            self.report(Status::Selection("No words found in selection".to_string()));
            return None;
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        tracing::info!(
            session_id = request_id,
            word_count = selection.len(),
            text_chars = request.text.chars().count(),
            "speak: selection tokenized"
        );
        self.session = Some(PlaybackSession::new(
            request_id,
            selection,
            SyncScheduler::new(&self.config),
        ));
        self.report(Status::Generating {
            character: request.character.clone(),
        });
        Some(PendingSpeak {
            request_id,
            request,
        })
    }

    pub fn complete_speak(
        &mut self,
        doc: &mut Document,
        request_id: u64,
        result: Result<SpeakResponse, HighlightError>,
    ) {
        let current = self
            .session
            .as_ref()
            .filter(|s| s.state() == SessionState::Tokenized)
            .map(|s| s.id());
        if current != Some(request_id) {
            tracing::debug!(request_id, "speak: ignoring response for superseded request");
            return;
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(request_id, error = %err, "speak: synthesis failed");
                self.end_session(doc, SessionState::Canceled);
                self.report(Status::Error(err.to_string()));
                return;
            }
        };

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let map = self.aligner.align(session.units(), &response.timings);
        if tracing::enabled!(tracing::Level::DEBUG) {
            let words: Vec<&str> = session.units().iter().map(|u| u.text.as_str()).collect();
            let report = compute_report(&words, &response.timings, &map);
            tracing::debug!(
                request_id,
                mapped_count = report.mapped_count,
                unmapped_count = report.unmapped_words.len(),
                overlap_count = report.structure.overlap_count,
                non_monotonic_count = report.structure.non_monotonic_count,
                "speak: alignment report"
            );
        }
        let highlighting = map.mapped_count() > 0;
        session.attach_alignment(response.timings, map);

        let started = match self.audio.load(&response.audio) {
            Ok(()) => self.audio.play(),
            Err(err) => Err(err),
        };
        if let Err(err) = started {
            tracing::warn!(request_id, error = %err, "speak: audio could not start");
            self.end_session(doc, SessionState::Canceled);
            self.report(Status::Error(err.to_string()));
            return;
        }

        if let Some(session) = self.session.as_mut() {
            session.play(self.frames.as_mut());
        }
        self.report(Status::Playing { highlighting });
    }

    pub fn cancel(&mut self, doc: &mut Document) {
        if self.session.is_none() {
            return;
        }
        self.end_session(doc, SessionState::Canceled);
        self.report(Status::Stopped);
    }

    /// Returns whether the key was consumed.
    pub fn handle_key(&mut self, doc: &mut Document, key: &str) -> bool {
        if key != CANCEL_KEY || self.session.is_none() {
            return false;
        }
        self.cancel(doc);
        true
    }

    /// Cleans up without reporting.
    pub fn on_navigation(&mut self, doc: &mut Document) {
        self.end_session(doc, SessionState::Canceled);
    }

    pub fn on_frame(&mut self, doc: &mut Document, handle: FrameHandle) -> Option<FrameOutcome> {
        let t = self.audio.current_time();
        let session = self.session.as_mut()?;
        let outcome = session.frame(handle, t, doc, self.frames.as_mut())?;
        self.follow_active(&outcome);
        Some(outcome)
    }

    /// Returns whether `config.character` is usable with `backend`. A backend
    /// that lists no voices accepts any name.
    pub fn check_voice(&mut self, backend: &dyn SynthesisBackend) -> bool {
        let character = self.config.character.trim().to_string();
        if character.is_empty() {
            return true;
        }
        match backend.voices() {
            Ok(voices) if voices.is_empty() || voices.iter().any(|v| v.name == character) => true,
            Ok(voices) => {
                tracing::warn!(
                    character = %character,
                    voice_count = voices.len(),
                    "speak: configured voice not offered by backend"
                );
                self.report(Status::Error(format!("unknown voice '{character}'")));
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "speak: could not list voices");
                self.report(Status::Error(err.to_string()));
                false
            }
        }
    }

    pub fn on_playback_event(&mut self, doc: &mut Document, event: PlaybackEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event {
            PlaybackEvent::Playing => {
                if matches!(session.state(), SessionState::Aligned | SessionState::Paused) {
                    let highlighting = session.alignment().mapped_count() > 0;
                    session.play(self.frames.as_mut());
                    self.report(Status::Playing { highlighting });
                }
            }
            PlaybackEvent::Paused => {
                if session.state() == SessionState::Playing {
                    session.pause(self.frames.as_mut());
                    self.report(Status::Paused);
                }
            }
            PlaybackEvent::Seeked => {
                // a running loop picks the new position up on its next frame
                if session.state() == SessionState::Paused {
                    let t = self.audio.current_time();
                    if let Some(outcome) = session.refresh(t, doc) {
                        self.follow_active(&outcome);
                    }
                }
            }
            PlaybackEvent::Ended => {
                self.end_session(doc, SessionState::Ended);
                self.report(Status::Finished);
            }
            PlaybackEvent::Error(message) => {
                tracing::warn!(error = %message, "playback: audio error");
                self.end_session(doc, SessionState::Canceled);
                self.report(Status::Error(message));
            }
        }
    }

    fn follow_active(&mut self, outcome: &FrameOutcome) {
        if !outcome.changed {
            return;
        }
        let (Some(session), Some(viewport)) = (self.session.as_ref(), self.viewport.as_mut()) else {
            return;
        };
        let Some(unit) = outcome.active.and_then(|ordinal| session.units().get(ordinal)) else {
            return;
        };
        session
            .scheduler()
            .scroll_if_near_edge(unit.handle.node(), viewport.as_mut());
    }

    /// Cancels the running session. `range` may point into its wrappers, so it
    /// is carried over onto the restored text.
    fn supersede(&mut self, doc: &mut Document, range: &DomRange) -> DomRange {
        let Some(session) = self.session.as_ref() else {
            return *range;
        };
        let wrappers: Vec<NodeId> = session.units().iter().map(|u| u.handle.node()).collect();
        let anchored = range.anchor(doc, |node| wrappers.contains(&node));
        self.end_session(doc, SessionState::Canceled);
        match anchored {
            Some(anchored) => anchored.resolve(doc),
            None => *range,
        }
    }

    fn end_session(&mut self, doc: &mut Document, terminal: SessionState) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        self.audio.stop();
        let summary = session.finish(doc, self.frames.as_mut(), terminal);
        tracing::info!(
            session_id = session.id(),
            state = session.state().as_str(),
            restored = summary.restored,
            skipped = summary.skipped,
            "speak: session closed"
        );
    }

    fn report(&mut self, status: Status) {
        self.status.report(&status);
    }
}
