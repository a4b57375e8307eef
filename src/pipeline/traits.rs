use crate::alignment::tokenization::TokenizedSelection;
use crate::dom::{Document, DomRange, NodeId};
use crate::error::HighlightError;
use crate::types::{AlignmentMap, SpeakRequest, SpeakResponse, TimingHint, VoiceInfo, WordUnit};

pub trait WordTokenizer: Send + Sync {
    fn tokenize(&self, doc: &mut Document, range: &DomRange, word_class: &str) -> TokenizedSelection;
}

pub trait SequenceAligner: Send + Sync {
    fn align(&self, units: &[WordUnit], hints: &[TimingHint]) -> AlignmentMap;
}

/// Text-to-speech plus voice conversion service. Opaque to the core.
pub trait SynthesisBackend {
    fn synthesize(&self, request: &SpeakRequest) -> Result<SpeakResponse, HighlightError>;

    fn voices(&self) -> Result<Vec<VoiceInfo>, HighlightError> {
        Ok(Vec::new())
    }
}

/// Seekable media element playing the synthesized audio; also the clock the
/// highlight loop reads.
pub trait AudioOutput {
    fn load(&mut self, audio: &[u8]) -> Result<(), HighlightError>;
    fn play(&mut self) -> Result<(), HighlightError>;
    /// Stops playback and releases the loaded audio.
    fn stop(&mut self);
    /// Playback position in seconds.
    fn current_time(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Display refresh signal. A requested frame is delivered back to
/// `ReadAlong::on_frame` with the handle returned here.
pub trait FrameSource {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Vertical extent of a node, relative to the top of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRect {
    pub top: f64,
    pub bottom: f64,
}

pub trait Viewport {
    fn height(&self) -> f64;
    fn node_rect(&self, node: NodeId) -> Option<NodeRect>;
    fn scroll_into_view(&mut self, node: NodeId);
}

/// User-visible progress and failure messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Generating { character: String },
    Playing { highlighting: bool },
    Paused,
    Finished,
    Stopped,
    Selection(String),
    Error(String),
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Generating { character } if character.is_empty() => {
                write!(f, "Generating voice...")
            }
            Status::Generating { character } => write!(f, "Generating {character} voice..."),
            Status::Playing { highlighting: true } => write!(f, "Playing"),
            Status::Playing { highlighting: false } => write!(f, "Playing (no word timings)"),
            Status::Paused => write!(f, "Paused"),
            Status::Finished => write!(f, "Done"),
            Status::Stopped => write!(f, "Stopped"),
            Status::Selection(message) => write!(f, "{message}"),
            Status::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

pub trait StatusSink {
    fn report(&mut self, status: &Status);
}

impl<F> StatusSink for F
where
    F: FnMut(&Status),
{
    fn report(&mut self, status: &Status) {
        self(status)
    }
}
