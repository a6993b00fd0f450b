//! Recognizers with scripted misbehaviour, shared by the host and batch tests.

use crate::recognizer::StreamingRecognizer;
use crate::registry::RecognizerRegistry;
use async_trait::async_trait;
use speechwire_core::{
    RecognizerError, SpeechRecognitionAlternative, StreamingRecognitionConfig,
    StreamingRecognitionResult, StreamingRecognizeResponse,
};
use std::sync::Mutex;
use tokio::sync::mpsc;

pub(crate) fn registry() -> RecognizerRegistry {
    let mut registry = RecognizerRegistry::new();
    registry.register("eager", || Box::new(EagerUtteranceRecognizer::default()));
    registry.register("faulty", || Box::new(FaultyRecognizer::default()));
    registry
}

pub(crate) fn table(entries: &[(&str, toml::Value)]) -> toml::Value {
    let mut table = toml::map::Map::new();
    for (key, value) in entries {
        table.insert(key.to_string(), value.clone());
    }
    toml::Value::Table(table)
}

fn final_response(text: String) -> StreamingRecognizeResponse {
    StreamingRecognizeResponse::Results(vec![StreamingRecognitionResult::final_result(vec![
        SpeechRecognitionAlternative::new(text),
    ])])
}

/// Ends the utterance on its first chunk but does not stop counting audio,
/// so the final transcript `"fed N"` shows how many chunks reached it.
#[derive(Default)]
pub(crate) struct EagerUtteranceRecognizer {
    fed: Mutex<usize>,
    tx: Option<mpsc::UnboundedSender<StreamingRecognizeResponse>>,
}

impl EagerUtteranceRecognizer {
    fn send(&self, response: StreamingRecognizeResponse) {
        if let Some(tx) = self.tx.as_ref() {
            let _ = tx.send(response);
        }
    }
}

#[async_trait]
impl StreamingRecognizer for EagerUtteranceRecognizer {
    fn name(&self) -> &str {
        "eager"
    }

    async fn initialize(&mut self, _config: toml::Value) -> Result<(), RecognizerError> {
        Ok(())
    }

    async fn start(&self, _config: &StreamingRecognitionConfig) -> Result<(), RecognizerError> {
        Ok(())
    }

    async fn feed_audio(&self, _chunk: Vec<u8>) -> Result<(), RecognizerError> {
        let fed = {
            let mut fed = self.fed.lock().unwrap();
            *fed += 1;
            *fed
        };
        if fed == 1 {
            self.send(StreamingRecognizeResponse::end_of_single_utterance());
        }
        Ok(())
    }

    fn set_response_sender(&mut self, sender: mpsc::UnboundedSender<StreamingRecognizeResponse>) {
        self.tx = Some(sender);
    }

    async fn finish(&self) -> Result<(), RecognizerError> {
        let fed = *self.fed.lock().unwrap();
        self.send(final_response(format!("fed {fed}")));
        Ok(())
    }
}

/// Fails at the step named by `fail_at` (`start`, `audio` or `finish`), and
/// drops its response sender when `drop_sender = true`.
#[derive(Default)]
pub(crate) struct FaultyRecognizer {
    fail_at: String,
    tx: Option<mpsc::UnboundedSender<StreamingRecognizeResponse>>,
}

#[async_trait]
impl StreamingRecognizer for FaultyRecognizer {
    fn name(&self) -> &str {
        "faulty"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), RecognizerError> {
        self.fail_at = config
            .get("fail_at")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if config
            .get("drop_sender")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            self.tx = None;
        }
        Ok(())
    }

    async fn start(&self, _config: &StreamingRecognitionConfig) -> Result<(), RecognizerError> {
        if self.fail_at == "start" {
            return Err(RecognizerError::Unsupported("encoding".to_string()));
        }
        Ok(())
    }

    async fn feed_audio(&self, _chunk: Vec<u8>) -> Result<(), RecognizerError> {
        if self.fail_at == "audio" {
            return Err(RecognizerError::ProcessingFailed("decoder crashed".to_string()));
        }
        Ok(())
    }

    fn set_response_sender(&mut self, sender: mpsc::UnboundedSender<StreamingRecognizeResponse>) {
        self.tx = Some(sender);
    }

    async fn finish(&self) -> Result<(), RecognizerError> {
        if self.fail_at == "finish" {
            return Err(RecognizerError::ProcessingFailed("flush failed".to_string()));
        }
        if let Some(tx) = self.tx.as_ref() {
            let _ = tx.send(final_response("ok".to_string()));
        }
        Ok(())
    }
}
