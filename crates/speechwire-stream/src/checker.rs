use speechwire_core::{
    SpeechEventType, StreamError, StreamingRecognitionConfig, StreamingRecognizeResponse,
};

/// Checks each response of a conversation against the config the client
/// opened it with.
#[derive(Debug)]
pub struct ResponseChecker {
    config: StreamingRecognitionConfig,
    final_results: usize,
    utterance_ended: bool,
    errored: bool,
}

impl ResponseChecker {
    pub fn new(config: StreamingRecognitionConfig) -> Self {
        Self {
            config,
            final_results: 0,
            utterance_ended: false,
            errored: false,
        }
    }

    pub fn final_results(&self) -> usize {
        self.final_results
    }

    pub fn check(&mut self, response: &StreamingRecognizeResponse) -> Result<(), StreamError> {
        if self.errored {
            return Err(StreamError::ResponseAfterError);
        }
        response.validate()?;

        match response {
            StreamingRecognizeResponse::Error(_) => {
                self.errored = true;
            }
            StreamingRecognizeResponse::SpeechEvent(SpeechEventType::EndOfSingleUtterance) => {
                if !self.config.single_utterance || self.utterance_ended {
                    return Err(StreamError::UnexpectedSpeechEvent);
                }
                self.utterance_ended = true;
            }
            StreamingRecognizeResponse::SpeechEvent(SpeechEventType::SpeechEventUnspecified) => {}
            StreamingRecognizeResponse::Results(results) => {
                let max = self.config.config.effective_max_alternatives();
                for result in results {
                    if result.alternatives.len() > max as usize {
                        return Err(StreamError::TooManyAlternatives {
                            got: result.alternatives.len(),
                            max,
                        });
                    }
                    if !result.is_final {
                        if !self.config.interim_results {
                            return Err(StreamError::UnexpectedInterim);
                        }
                        continue;
                    }
                    if result.stability().is_some() {
                        return Err(StreamError::StabilityOnFinal);
                    }
                    if self.config.single_utterance && self.final_results > 0 {
                        return Err(StreamError::MultipleFinalResults);
                    }
                    self.final_results += 1;
                }
            }
        }
        Ok(())
    }
}
