use crate::checker::ResponseChecker;
use crate::recognizer::StreamingRecognizer;
use crate::registry::RecognizerRegistry;
use crate::sequencer::RequestSequencer;
use speechwire_core::{
    Code, RecognizerError, Status, StreamingRecognizeRequest, StreamingRecognizeResponse,
};
use tokio::sync::mpsc;

struct PendingSession {
    recognizer: Box<dyn StreamingRecognizer>,
    request_rx: mpsc::UnboundedReceiver<StreamingRecognizeRequest>,
    recognizer_rx: mpsc::UnboundedReceiver<StreamingRecognizeResponse>,
}

/// Runs one `StreamingRecognize` conversation on a tokio task. Requests go
/// in through the sender returned by `open`, responses come out of the
/// receiver from `take_response_receiver`. The response channel closes when
/// the conversation is over.
pub struct SessionHost {
    pending: Option<PendingSession>,
    response_tx: Option<mpsc::UnboundedSender<StreamingRecognizeResponse>>,
    response_rx: Option<mpsc::UnboundedReceiver<StreamingRecognizeResponse>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl SessionHost {
    pub fn new() -> Self {
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        Self {
            pending: None,
            response_tx: Some(response_tx),
            response_rx: Some(response_rx),
            task_handle: None,
        }
    }

    pub fn take_response_receiver(
        &mut self,
    ) -> Option<mpsc::UnboundedReceiver<StreamingRecognizeResponse>> {
        self.response_rx.take()
    }

    pub async fn open(
        &mut self,
        recognizer_name: &str,
        config: toml::Value,
        registry: &RecognizerRegistry,
    ) -> Result<mpsc::UnboundedSender<StreamingRecognizeRequest>, RecognizerError> {
        if self.pending.is_some() || self.response_tx.is_none() {
            return Err(RecognizerError::InitializationFailed(
                "session already opened".to_string(),
            ));
        }
        let mut recognizer = registry.create(recognizer_name)?;

        let (recognizer_tx, recognizer_rx) = mpsc::unbounded_channel();
        recognizer.set_response_sender(recognizer_tx);
        recognizer.initialize(config).await?;

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        self.pending = Some(PendingSession {
            recognizer,
            request_rx,
            recognizer_rx,
        });
        Ok(request_tx)
    }

    pub fn start(&mut self) {
        let (Some(session), Some(response_tx)) = (self.pending.take(), self.response_tx.take())
        else {
            tracing::warn!("start called without an opened session");
            return;
        };
        let handle = tokio::spawn(run_session(session, response_tx));
        self.task_handle = Some(handle);
    }

    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
    }
}

impl Default for SessionHost {
    fn default() -> Self {
        Self::new()
    }
}

struct Outbound {
    tx: mpsc::UnboundedSender<StreamingRecognizeResponse>,
    checker: Option<ResponseChecker>,
}

impl Outbound {
    /// Forwards a recognizer response. Returns false once the stream must end.
    fn forward(
        &mut self,
        sequencer: &mut RequestSequencer,
        response: StreamingRecognizeResponse,
    ) -> bool {
        if let Some(checker) = self.checker.as_mut() {
            if let Err(e) = checker.check(&response) {
                tracing::error!("recognizer broke the response protocol: {e}");
                let _ = self.tx.send(StreamingRecognizeResponse::Error(e.to_status()));
                return false;
            }
        }
        sequencer.on_response(&response);
        let is_error = response.error().is_some();
        if self.tx.send(response).is_err() {
            tracing::debug!("response receiver dropped");
            return false;
        }
        !is_error
    }

    fn fail(&self, status: Status) {
        tracing::warn!(code = %status.code, "ending stream: {}", status.message);
        let _ = self.tx.send(StreamingRecognizeResponse::Error(status));
    }
}

fn recognizer_gone_status(name: &str) -> Status {
    Status::new(
        Code::Internal,
        format!("recognizer '{name}' stopped producing responses"),
    )
}

async fn run_session(
    session: PendingSession,
    response_tx: mpsc::UnboundedSender<StreamingRecognizeResponse>,
) {
    let PendingSession {
        recognizer,
        mut request_rx,
        mut recognizer_rx,
    } = session;
    let mut sequencer = RequestSequencer::new();
    let mut out = Outbound {
        tx: response_tx,
        checker: None,
    };
    let name = recognizer.name().to_string();
    let mut recognizer_gone = false;

    loop {
        tokio::select! {
            // Recognizer output first, so an END_OF_SINGLE_UTTERANCE emitted
            // while handling one chunk is seen before the next chunk is fed.
            biased;

            response = recognizer_rx.recv(), if !recognizer_gone => {
                match response {
                    Some(response) => {
                        if !out.forward(&mut sequencer, response) {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!(recognizer = %name, "recognizer dropped its response sender");
                        recognizer_gone = true;
                    }
                }
            }
            request = request_rx.recv() => {
                match request {
                    Some(request) => {
                        if request.audio().is_some()
                            && sequencer.config().is_some()
                            && !sequencer.accepts_audio()
                        {
                            tracing::debug!(recognizer = %name, "ignoring audio after end of utterance");
                            continue;
                        }
                        if let Err(e) = sequencer.push(&request) {
                            out.fail(e.to_status());
                            break;
                        }
                        if recognizer_gone {
                            out.fail(recognizer_gone_status(&name));
                            break;
                        }
                        let result = match request {
                            StreamingRecognizeRequest::StreamingConfig(config) => {
                                out.checker = Some(ResponseChecker::new(config.clone()));
                                recognizer.start(&config).await
                            }
                            StreamingRecognizeRequest::AudioContent(audio) => {
                                recognizer.feed_audio(audio).await
                            }
                        };
                        if let Err(e) = result {
                            out.fail(e.to_status());
                            break;
                        }
                    }
                    None => {
                        // Client half-closed: flush the recognizer and drain.
                        let started = sequencer.config().is_some();
                        sequencer.close();
                        if started {
                            if recognizer_gone {
                                out.fail(recognizer_gone_status(&name));
                                break;
                            }
                            if let Err(e) = recognizer.finish().await {
                                out.fail(e.to_status());
                                break;
                            }
                            while let Ok(response) = recognizer_rx.try_recv() {
                                if !out.forward(&mut sequencer, response) {
                                    break;
                                }
                            }
                        }
                        tracing::debug!(recognizer = %name, "client closed stream");
                        break;
                    }
                }
            }
        }
    }

    let (chunks, bytes) = sequencer.audio_sent();
    tracing::info!(recognizer = %name, chunks, bytes, "streaming session finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::chunk_requests;
    use crate::testing;
    use speechwire_core::{AudioEncoding, RecognitionConfig, StreamingRecognitionConfig};
    use std::time::Duration;

    fn streaming(single_utterance: bool, interim_results: bool) -> StreamingRecognitionConfig {
        StreamingRecognitionConfig {
            config: RecognitionConfig::new(AudioEncoding::Linear16, 16000, "en-US"),
            single_utterance,
            interim_results,
        }
    }

    async fn collect(
        mut rx: mpsc::UnboundedReceiver<StreamingRecognizeResponse>,
    ) -> Vec<StreamingRecognizeResponse> {
        let mut out = Vec::new();
        loop {
            let next = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("timed out");
            match next {
                Some(r) => out.push(r),
                None => return out,
            }
        }
    }

    async fn opened(
        table: toml::Value,
    ) -> (
        SessionHost,
        mpsc::UnboundedSender<StreamingRecognizeRequest>,
        mpsc::UnboundedReceiver<StreamingRecognizeResponse>,
    ) {
        opened_with("null", table).await
    }

    async fn opened_with(
        name: &str,
        table: toml::Value,
    ) -> (
        SessionHost,
        mpsc::UnboundedSender<StreamingRecognizeRequest>,
        mpsc::UnboundedReceiver<StreamingRecognizeResponse>,
    ) {
        let registry = testing::registry();
        let mut host = SessionHost::new();
        let rx = host.take_response_receiver().unwrap();
        let tx = host.open(name, table, &registry).await.unwrap();
        host.start();
        (host, tx, rx)
    }

    /// Sends a config and `chunks` audio requests, then half-closes.
    fn send_all(
        tx: mpsc::UnboundedSender<StreamingRecognizeRequest>,
        config: StreamingRecognitionConfig,
        chunks: usize,
    ) {
        tx.send(StreamingRecognizeRequest::StreamingConfig(config))
            .unwrap();
        for _ in 0..chunks {
            tx.send(StreamingRecognizeRequest::AudioContent(vec![0; 10]))
                .unwrap();
        }
    }

    async fn single_error(rx: mpsc::UnboundedReceiver<StreamingRecognizeResponse>) -> Status {
        let responses = collect(rx).await;
        assert_eq!(responses.len(), 1, "{responses:?}");
        responses[0].error().cloned().expect("error response")
    }

    fn empty_table() -> toml::Value {
        toml::Value::Table(Default::default())
    }

    #[tokio::test]
    async fn test_host_new_has_response_receiver() {
        let mut host = SessionHost::new();
        assert!(host.take_response_receiver().is_some());
        assert!(host.take_response_receiver().is_none());
    }

    #[tokio::test]
    async fn test_host_open_unknown_recognizer_fails() {
        let mut host = SessionHost::new();
        let registry = RecognizerRegistry::new();
        match host.open("nonexistent", empty_table(), &registry).await {
            Err(RecognizerError::NotFound(_)) => {}
            _ => panic!("expected NotFound"),
        }
    }

    #[tokio::test]
    async fn test_host_open_twice_fails() {
        let mut host = SessionHost::new();
        let registry = RecognizerRegistry::new();
        let _tx = host.open("null", empty_table(), &registry).await.unwrap();
        assert!(host.open("null", empty_table(), &registry).await.is_err());
    }

    #[tokio::test]
    async fn test_host_streams_interim_then_final() {
        let (mut host, tx, rx) = opened(empty_table()).await;
        for req in chunk_requests(streaming(false, true), &[0u8; 300], 100) {
            tx.send(req).unwrap();
        }
        drop(tx);

        let responses = collect(rx).await;
        assert_eq!(responses.len(), 4);
        assert!(responses[..3].iter().all(|r| r.final_result().is_none()));
        assert_eq!(
            responses[3].final_result().unwrap().top_transcript(),
            "[null] 300 bytes"
        );
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_host_audio_first_yields_invalid_argument() {
        let (mut host, tx, rx) = opened(empty_table()).await;
        tx.send(StreamingRecognizeRequest::AudioContent(vec![1, 2, 3]))
            .unwrap();

        let responses = collect(rx).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].error().unwrap().code, Code::InvalidArgument);
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_host_second_config_yields_invalid_argument() {
        let (mut host, tx, rx) = opened(empty_table()).await;
        tx.send(StreamingRecognizeRequest::StreamingConfig(streaming(false, false)))
            .unwrap();
        tx.send(StreamingRecognizeRequest::StreamingConfig(streaming(false, false)))
            .unwrap();

        let responses = collect(rx).await;
        assert_eq!(responses.len(), 1);
        let status = responses[0].error().unwrap();
        assert_eq!(status.code, Code::InvalidArgument);
        assert!(status.message.contains("first request"));
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_host_single_utterance_stops_processing_audio() {
        let mut table = toml::map::Map::new();
        table.insert("utterance_chunks".to_string(), toml::Value::Integer(2));
        let (mut host, tx, rx) = opened(toml::Value::Table(table)).await;

        tx.send(StreamingRecognizeRequest::StreamingConfig(streaming(true, false)))
            .unwrap();
        tx.send(StreamingRecognizeRequest::AudioContent(vec![0; 10]))
            .unwrap();
        tx.send(StreamingRecognizeRequest::AudioContent(vec![0; 10]))
            .unwrap();

        // Wait for the event before sending more, as a client would.
        let mut rx = rx;
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out")
            .expect("closed");
        assert!(event.is_end_of_single_utterance());

        tx.send(StreamingRecognizeRequest::AudioContent(vec![0; 10]))
            .unwrap();
        drop(tx);

        let rest = collect(rx).await;
        assert_eq!(rest.len(), 1);
        assert_eq!(
            rest[0].final_result().unwrap().top_transcript(),
            "[null] 20 bytes"
        );
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_host_close_without_requests_ends_stream() {
        let (mut host, tx, rx) = opened(empty_table()).await;
        drop(tx);
        assert!(collect(rx).await.is_empty());
        tokio::time::timeout(Duration::from_secs(2), host.shutdown())
            .await
            .expect("shutdown timed out");
    }

    #[tokio::test]
    async fn test_host_queued_audio_not_fed_after_end_of_utterance() {
        for _ in 0..20 {
            let (mut host, tx, rx) = opened_with("eager", empty_table()).await;
            send_all(tx, streaming(true, false), 5);

            let responses = collect(rx).await;
            assert_eq!(responses.len(), 2, "{responses:?}");
            assert!(responses[0].is_end_of_single_utterance());
            assert_eq!(responses[1].final_result().unwrap().top_transcript(), "fed 1");
            host.shutdown().await;
        }
    }

    #[tokio::test]
    async fn test_host_start_failure_keeps_status_code() {
        let table = testing::table(&[("fail_at", toml::Value::from("start"))]);
        let (mut host, tx, rx) = opened_with("faulty", table).await;
        send_all(tx, streaming(false, false), 3);

        assert_eq!(single_error(rx).await.code, Code::Unimplemented);
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_host_audio_failure_ends_with_internal() {
        let table = testing::table(&[("fail_at", toml::Value::from("audio"))]);
        let (mut host, tx, rx) = opened_with("faulty", table).await;
        send_all(tx, streaming(false, false), 3);

        let status = single_error(rx).await;
        assert_eq!(status.code, Code::Internal);
        assert!(status.message.contains("decoder crashed"));
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_host_finish_failure_ends_with_internal() {
        let table = testing::table(&[("fail_at", toml::Value::from("finish"))]);
        let (mut host, tx, rx) = opened_with("faulty", table).await;
        send_all(tx, streaming(false, false), 2);

        let status = single_error(rx).await;
        assert_eq!(status.code, Code::Internal);
        assert!(status.message.contains("flush failed"));
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_host_recognizer_without_sender_reports_internal() {
        let table = testing::table(&[("drop_sender", toml::Value::from(true))]);
        let (mut host, tx, rx) = opened_with("faulty", table).await;
        send_all(tx, streaming(false, false), 2);

        let status = single_error(rx).await;
        assert_eq!(status.code, Code::Internal);
        assert!(status.message.contains("stopped producing responses"));
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_host_recognizer_without_sender_still_checks_requests() {
        let table = testing::table(&[("drop_sender", toml::Value::from(true))]);
        let (mut host, tx, rx) = opened_with("faulty", table).await;
        tx.send(StreamingRecognizeRequest::AudioContent(vec![1, 2, 3]))
            .unwrap();

        assert_eq!(single_error(rx).await.code, Code::InvalidArgument);
        host.shutdown().await;
    }
}
