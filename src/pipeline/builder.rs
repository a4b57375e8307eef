use crate::config::ReaderConfig;
use crate::error::HighlightError;
use crate::pipeline::defaults::{FuzzyWindowAligner, LogStatusSink, WhitespaceTokenizer};
use crate::pipeline::runtime::{ReadAlong, ReadAlongParts};
use crate::pipeline::traits::{
    AudioOutput, FrameSource, SequenceAligner, StatusSink, Viewport, WordTokenizer,
};

pub struct ReadAlongBuilder {
    config: ReaderConfig,
    audio: Box<dyn AudioOutput>,
    frames: Box<dyn FrameSource>,
    viewport: Option<Box<dyn Viewport>>,
    status: Option<Box<dyn StatusSink>>,
    tokenizer: Option<Box<dyn WordTokenizer>>,
    sequence_aligner: Option<Box<dyn SequenceAligner>>,
}

impl ReadAlongBuilder {
    /// Audio and frame delivery are host capabilities with no sensible default.
    pub fn new(
        config: ReaderConfig,
        audio: Box<dyn AudioOutput>,
        frames: Box<dyn FrameSource>,
    ) -> Self {
        Self {
            config,
            audio,
            frames,
            viewport: None,
            status: None,
            tokenizer: None,
            sequence_aligner: None,
        }
    }

    /// Without a viewport, auto-scroll is skipped.
    pub fn with_viewport(mut self, viewport: Box<dyn Viewport>) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn with_status_sink(mut self, status: Box<dyn StatusSink>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn WordTokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_sequence_aligner(mut self, sequence_aligner: Box<dyn SequenceAligner>) -> Self {
        self.sequence_aligner = Some(sequence_aligner);
        self
    }

    pub fn build(self) -> Result<ReadAlong, HighlightError> {
        self.config.validate()?;
        let window = self.config.effective_match_window();
        tracing::debug!(
            character = %self.config.character,
            speed = self.config.speed,
            match_window = window,
            auto_scroll = self.config.auto_scroll,
            "read-along: building controller"
        );

        Ok(ReadAlong::from_parts(ReadAlongParts {
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(WhitespaceTokenizer)),
            aligner: self
                .sequence_aligner
                .unwrap_or_else(|| Box::new(FuzzyWindowAligner::new(window))),
            status: self.status.unwrap_or_else(|| Box::new(LogStatusSink)),
            audio: self.audio,
            frames: self.frames,
            viewport: self.viewport,
            config: self.config,
        }))
    }
}
