use speechwire_core::{
    StreamError, StreamingRecognitionConfig, StreamingRecognizeRequest, StreamingRecognizeResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    AwaitingConfig,
    Streaming,
    UtteranceEnded,
    Closed,
}

/// Enforces the request ordering of a streaming conversation: one config
/// message first, audio-only afterwards, and no audio once the server has
/// ended a single utterance.
#[derive(Debug)]
pub struct RequestSequencer {
    state: SequenceState,
    config: Option<StreamingRecognitionConfig>,
    chunks: usize,
    bytes: usize,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self {
            state: SequenceState::AwaitingConfig,
            config: None,
            chunks: 0,
            bytes: 0,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn config(&self) -> Option<&StreamingRecognitionConfig> {
        self.config.as_ref()
    }

    pub fn accepts_audio(&self) -> bool {
        self.state == SequenceState::Streaming
    }

    pub fn audio_sent(&self) -> (usize, usize) {
        (self.chunks, self.bytes)
    }

    pub fn push(&mut self, request: &StreamingRecognizeRequest) -> Result<(), StreamError> {
        match (self.state, request) {
            (SequenceState::Closed, _) => Err(StreamError::Closed),
            (SequenceState::AwaitingConfig, StreamingRecognizeRequest::StreamingConfig(config)) => {
                config.validate()?;
                self.config = Some(config.clone());
                self.state = SequenceState::Streaming;
                Ok(())
            }
            (SequenceState::AwaitingConfig, StreamingRecognizeRequest::AudioContent(_)) => {
                Err(StreamError::ConfigNotFirst)
            }
            (_, StreamingRecognizeRequest::StreamingConfig(_)) => Err(StreamError::DuplicateConfig),
            (SequenceState::UtteranceEnded, StreamingRecognizeRequest::AudioContent(_)) => {
                Err(StreamError::AudioAfterEndOfUtterance)
            }
            (SequenceState::Streaming, StreamingRecognizeRequest::AudioContent(audio)) => {
                if audio.is_empty() {
                    return Err(StreamError::EmptyAudioChunk);
                }
                self.chunks += 1;
                self.bytes += audio.len();
                Ok(())
            }
        }
    }

    /// Observes a server response; END_OF_SINGLE_UTTERANCE stops audio.
    pub fn on_response(&mut self, response: &StreamingRecognizeResponse) {
        if response.is_end_of_single_utterance() && self.state == SequenceState::Streaming {
            tracing::debug!("end of single utterance, no further audio accepted");
            self.state = SequenceState::UtteranceEnded;
        }
    }

    /// The client half-closed its side of the stream.
    pub fn close(&mut self) {
        self.state = SequenceState::Closed;
    }
}

impl Default for RequestSequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// The full request sequence for a buffer of audio: the config message,
/// then the audio in chunks of at most `chunk_size` bytes.
pub fn chunk_requests(
    config: StreamingRecognitionConfig,
    audio: &[u8],
    chunk_size: usize,
) -> Vec<StreamingRecognizeRequest> {
    let mut requests = vec![StreamingRecognizeRequest::StreamingConfig(config)];
    requests.extend(
        audio
            .chunks(chunk_size.max(1))
            .map(|c| StreamingRecognizeRequest::AudioContent(c.to_vec())),
    );
    requests
}
