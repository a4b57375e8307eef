pub mod alignment;
pub mod config;
pub mod dom;
pub mod error;
pub mod pipeline;
pub mod types;

pub use config::{HighlightStyle, ReaderConfig};
pub use error::HighlightError;
pub use pipeline::builder::ReadAlongBuilder;
pub use pipeline::runtime::{PendingSpeak, ReadAlong};
pub use pipeline::session::{PlaybackEvent, SessionState};
pub use pipeline::traits::{
    AudioOutput, FrameHandle, FrameSource, NodeRect, SequenceAligner, Status, StatusSink,
    SynthesisBackend, Viewport, WordTokenizer,
};
pub use types::{AlignmentMap, SpeakRequest, SpeakResponse, TimingHint, VoiceInfo, WordUnit};
