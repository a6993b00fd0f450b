use async_trait::async_trait;
use speechwire_core::{RecognizerError, StreamingRecognitionConfig, StreamingRecognizeResponse};
use tokio::sync::mpsc;

/// Server side of one `StreamingRecognize` conversation. Implementations
/// push responses into the sender given to `set_response_sender`, and must
/// have pushed everything they owe the client by the time `finish` returns.
#[async_trait]
pub trait StreamingRecognizer: Send + Sync {
    fn name(&self) -> &str;
    async fn initialize(&mut self, config: toml::Value) -> Result<(), RecognizerError>;
    async fn start(&self, config: &StreamingRecognitionConfig) -> Result<(), RecognizerError>;
    async fn feed_audio(&self, chunk: Vec<u8>) -> Result<(), RecognizerError>;
    fn set_response_sender(&mut self, sender: mpsc::UnboundedSender<StreamingRecognizeResponse>);
    async fn finish(&self) -> Result<(), RecognizerError>;
}
