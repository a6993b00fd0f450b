use crate::host::SessionHost;
use crate::registry::RecognizerRegistry;
use crate::sequencer::chunk_requests;
use speechwire_core::{
    RecognitionAudio, RecognizeRequest, RecognizeResponse, RecognizerError,
    StreamingRecognitionConfig, StreamingRecognizeResponse,
};

/// Answers a `Recognize` request by running it through a streaming session
/// and keeping only the final results. Storage URIs are not fetched.
pub async fn recognize(
    request: RecognizeRequest,
    recognizer_name: &str,
    recognizer_config: toml::Value,
    registry: &RecognizerRegistry,
    chunk_size: usize,
) -> Result<RecognizeResponse, RecognizerError> {
    request.validate()?;
    let content = match request.audio {
        RecognitionAudio::Content(content) => content,
        RecognitionAudio::Uri(uri) => {
            return Err(RecognizerError::Unsupported(format!(
                "fetching audio from {uri}"
            )))
        }
    };

    let mut host = SessionHost::new();
    let mut rx = host
        .take_response_receiver()
        .ok_or_else(|| RecognizerError::ProcessingFailed("no response receiver".to_string()))?;
    let tx = host.open(recognizer_name, recognizer_config, registry).await?;
    host.start();

    let config = StreamingRecognitionConfig::new(request.config);
    for req in chunk_requests(config, &content, chunk_size) {
        // A closed session has already queued its error response.
        if tx.send(req).is_err() {
            tracing::debug!("session ended before all audio was sent");
            break;
        }
    }
    drop(tx);

    let mut results = Vec::new();
    let mut failure = None;
    while let Some(response) = rx.recv().await {
        match response {
            StreamingRecognizeResponse::Error(status) => {
                failure = Some(status);
            }
            StreamingRecognizeResponse::Results(list) => {
                results.extend(list.into_iter().filter(|r| r.is_final).map(Into::into));
            }
            StreamingRecognizeResponse::SpeechEvent(_) => {}
        }
    }
    host.shutdown().await;

    if let Some(status) = failure {
        return Err(RecognizerError::Status(status));
    }
    tracing::debug!(results = results.len(), "recognize finished");
    Ok(RecognizeResponse { results })
}
