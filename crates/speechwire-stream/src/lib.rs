pub mod batch;
pub mod checker;
pub mod host;
pub mod null_recognizer;
pub mod recognizer;
pub mod registry;
pub mod sequencer;
#[cfg(test)]
mod testing;
pub mod transcript;

pub use batch::recognize;
pub use checker::ResponseChecker;
pub use host::SessionHost;
pub use null_recognizer::NullRecognizer;
pub use recognizer::StreamingRecognizer;
pub use registry::RecognizerRegistry;
pub use sequencer::{chunk_requests, RequestSequencer, SequenceState};
pub use transcript::TranscriptAssembler;
