use crate::recognizer::StreamingRecognizer;
use async_trait::async_trait;
use speechwire_core::{
    AudioEncoding, RecognizerError, SpeechRecognitionAlternative, StreamingRecognitionConfig,
    StreamingRecognitionResult, StreamingRecognizeResponse, WordInfo,
};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

const INTERIM_STABILITY: f32 = 0.5;

#[derive(Default)]
struct NullState {
    config: Option<StreamingRecognitionConfig>,
    chunks: usize,
    bytes: usize,
    utterance_ended: bool,
}

/// Deterministic stand-in recognizer. Transcripts only describe how much
/// audio arrived.
///
/// Emits one interim result per chunk when interim results are enabled and a
/// single final result on `finish`. With `single_utterance`, the utterance
/// ends after `utterance_chunks` chunks (0 keeps listening until the client
/// half-closes).
pub struct NullRecognizer {
    utterance_chunks: usize,
    state: Mutex<NullState>,
    response_sender: Option<mpsc::UnboundedSender<StreamingRecognizeResponse>>,
}

impl NullRecognizer {
    pub fn new() -> Self {
        Self {
            utterance_chunks: 0,
            state: Mutex::new(NullState::default()),
            response_sender: None,
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.state.lock().map(|s| s.chunks).unwrap_or(0)
    }

    fn send(&self, response: StreamingRecognizeResponse) {
        if let Some(tx) = self.response_sender.as_ref() {
            let _ = tx.send(response);
        }
    }
}

impl Default for NullRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

fn audio_duration(config: &StreamingRecognitionConfig, bytes: usize) -> Option<Duration> {
    let rate = u64::from(config.config.sample_rate_hertz);
    let bytes_per_sample = match config.config.encoding {
        AudioEncoding::Linear16 => 2,
        AudioEncoding::Mulaw => 1,
        _ => return None,
    };
    if rate == 0 {
        return None;
    }
    let samples = bytes as u64 / bytes_per_sample;
    Some(Duration::from_nanos(samples * 1_000_000_000 / rate))
}

fn final_result(config: &StreamingRecognitionConfig, bytes: usize) -> StreamingRecognitionResult {
    let mut alternative =
        SpeechRecognitionAlternative::new(format!("[null] {bytes} bytes")).with_confidence(1.0);
    if config.config.enable_word_time_offsets {
        if let Some(end) = audio_duration(config, bytes) {
            alternative.words.push(WordInfo {
                start_time: Some(Duration::ZERO),
                end_time: Some(end),
                word: "[null]".to_string(),
            });
        }
    }
    StreamingRecognitionResult::final_result(vec![alternative])
}

#[async_trait]
impl StreamingRecognizer for NullRecognizer {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), RecognizerError> {
        if let Some(v) = config.get("utterance_chunks") {
            let n = v
                .as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    RecognizerError::InitializationFailed(
                        "'utterance_chunks' must be a non-negative integer".to_string(),
                    )
                })?;
            self.utterance_chunks = n;
        }
        Ok(())
    }

    async fn start(&self, config: &StreamingRecognitionConfig) -> Result<(), RecognizerError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RecognizerError::ProcessingFailed("state lock poisoned".to_string()))?;
        *state = NullState {
            config: Some(config.clone()),
            ..Default::default()
        };
        tracing::debug!(
            encoding = %config.config.encoding,
            sample_rate = config.config.sample_rate_hertz,
            single_utterance = config.single_utterance,
            interim_results = config.interim_results,
            "NullRecognizer started"
        );
        Ok(())
    }

    async fn feed_audio(&self, chunk: Vec<u8>) -> Result<(), RecognizerError> {
        let mut responses = Vec::new();
        {
            let mut state = self.state.lock().map_err(|_| {
                RecognizerError::ProcessingFailed("state lock poisoned".to_string())
            })?;
            let config = state.config.clone().ok_or_else(|| {
                RecognizerError::ProcessingFailed("audio fed before start".to_string())
            })?;
            if state.utterance_ended {
                return Ok(());
            }
            state.chunks += 1;
            state.bytes += chunk.len();

            if config.interim_results {
                responses.push(StreamingRecognizeResponse::Results(vec![
                    StreamingRecognitionResult::interim(
                        format!("[null] {} bytes", state.bytes),
                        INTERIM_STABILITY,
                    ),
                ]));
            }
            if config.single_utterance
                && self.utterance_chunks > 0
                && state.chunks == self.utterance_chunks
            {
                state.utterance_ended = true;
                responses.push(StreamingRecognizeResponse::end_of_single_utterance());
            }
            tracing::trace!("NullRecognizer fed chunk #{}, {} bytes", state.chunks, chunk.len());
        }
        for response in responses {
            self.send(response);
        }
        Ok(())
    }

    fn set_response_sender(&mut self, sender: mpsc::UnboundedSender<StreamingRecognizeResponse>) {
        self.response_sender = Some(sender);
    }

    async fn finish(&self) -> Result<(), RecognizerError> {
        let response = {
            let state = self.state.lock().map_err(|_| {
                RecognizerError::ProcessingFailed("state lock poisoned".to_string())
            })?;
            match &state.config {
                Some(config) if state.bytes > 0 => Some(StreamingRecognizeResponse::Results(vec![
                    final_result(config, state.bytes),
                ])),
                _ => None,
            }
        };
        if let Some(response) = response {
            self.send(response);
        }
        Ok(())
    }
}
