use crate::encoding::AudioEncoding;
use crate::status::{Code, Status};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid recognition defaults: {0}")]
    InvalidRecognition(#[from] RequestError),
}

/// Rejections of a request message. All of them surface as INVALID_ARGUMENT.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("audio must supply exactly one of content or uri, got both")]
    AudioSourceConflict,

    #[error("audio must supply exactly one of content or uri, got neither")]
    AudioSourceMissing,

    #[error("audio content is empty")]
    EmptyAudioContent,

    #[error("invalid storage uri '{0}', expected gs://bucket_name/object_name")]
    InvalidUri(String),

    #[error("audio encoding is unspecified")]
    UnspecifiedEncoding,

    #[error("unknown audio encoding: {0}")]
    UnknownEncoding(String),

    #[error("sample rate {0} Hz is outside 8000-48000")]
    SampleRateOutOfRange(u32),

    #[error("{encoding} requires a sample rate of {required} Hz, got {actual}")]
    SampleRateMismatch {
        encoding: AudioEncoding,
        required: u32,
        actual: u32,
    },

    #[error("invalid language code: '{0}'")]
    InvalidLanguageCode(String),

    #[error("max_alternatives {0} is outside 0-30")]
    MaxAlternativesOutOfRange(u32),

    #[error("speech context contains a blank phrase")]
    BlankPhrase,

    #[error("streaming request must set exactly one of streaming_config or audio_content, got both")]
    StreamingRequestConflict,

    #[error("streaming request must set exactly one of streaming_config or audio_content, got neither")]
    StreamingRequestEmpty,
}

impl RequestError {
    pub fn code(&self) -> Code {
        Code::InvalidArgument
    }

    pub fn to_status(&self) -> Status {
        Status::new(self.code(), self.to_string())
    }
}

/// Rejections of a server-side message shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseError {
    #[error("streaming response sets more than one of error, speech_event_type, results")]
    MultipleFieldsSet,

    #[error("final result at position {position} is followed by another result")]
    FinalNotLast { position: usize },

    #[error("{field} {value} is outside 0.0-1.0")]
    ScoreOutOfRange { field: &'static str, value: f32 },

    #[error("progress_percent {0} is outside 0..=100")]
    ProgressOutOfRange(i32),

    #[error("operation is done but carries no result")]
    DoneWithoutResult,

    #[error("operation is pending but already carries a result")]
    PendingWithResult,

    #[error("operation result sets both error and response")]
    OperationResultConflict,
}

impl ResponseError {
    pub fn code(&self) -> Code {
        Code::Internal
    }

    pub fn to_status(&self) -> Status {
        Status::new(self.code(), self.to_string())
    }
}

/// Violations of the `StreamingRecognize` conversation rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    #[error("first streaming request must carry streaming_config")]
    ConfigNotFirst,

    #[error("streaming_config may only be sent in the first request")]
    DuplicateConfig,

    #[error("audio_content chunk is empty")]
    EmptyAudioChunk,

    #[error("audio sent after END_OF_SINGLE_UTTERANCE")]
    AudioAfterEndOfUtterance,

    #[error("invalid streaming_config: {0}")]
    InvalidConfig(#[from] RequestError),

    #[error("response received after the stream reported an error")]
    ResponseAfterError,

    #[error("speech event received without single_utterance")]
    UnexpectedSpeechEvent,

    #[error("interim result received without interim_results")]
    UnexpectedInterim,

    #[error("more than one final result in single-utterance mode")]
    MultipleFinalResults,

    #[error("stability set on a final result")]
    StabilityOnFinal,

    #[error("result carries {got} alternatives, at most {max} allowed")]
    TooManyAlternatives { got: usize, max: u32 },

    #[error("malformed response: {0}")]
    Malformed(#[from] ResponseError),

    #[error("stream is closed")]
    Closed,
}

impl StreamError {
    pub fn code(&self) -> Code {
        match self {
            StreamError::ConfigNotFirst
            | StreamError::DuplicateConfig
            | StreamError::EmptyAudioChunk
            | StreamError::AudioAfterEndOfUtterance
            | StreamError::InvalidConfig(_) => Code::InvalidArgument,
            StreamError::Closed => Code::FailedPrecondition,
            _ => Code::Internal,
        }
    }

    pub fn to_status(&self) -> Status {
        Status::new(self.code(), self.to_string())
    }
}

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("recognizer initialization failed: {0}")]
    InitializationFailed(String),

    #[error("recognition failed: {0}")]
    ProcessingFailed(String),

    #[error("recognizer not found: {0}")]
    NotFound(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    /// A session ended with this status on the wire.
    #[error("{0}")]
    Status(Status),
}

impl RecognizerError {
    pub fn code(&self) -> Code {
        match self {
            RecognizerError::InitializationFailed(_) => Code::FailedPrecondition,
            RecognizerError::ProcessingFailed(_) => Code::Internal,
            RecognizerError::NotFound(_) => Code::NotFound,
            RecognizerError::Unsupported(_) => Code::Unimplemented,
            RecognizerError::Request(e) => e.code(),
            RecognizerError::Stream(e) => e.code(),
            RecognizerError::Status(status) => status.code,
        }
    }

    pub fn to_status(&self) -> Status {
        match self {
            RecognizerError::Status(status) => status.clone(),
            _ => Status::new(self.code(), self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_map_to_invalid_argument() {
        let errors = [
            RequestError::AudioSourceConflict,
            RequestError::AudioSourceMissing,
            RequestError::UnspecifiedEncoding,
            RequestError::InvalidUri("http://x".to_string()),
        ];
        for err in errors {
            let status = err.to_status();
            assert_eq!(status.code, Code::InvalidArgument);
            assert_eq!(status.message, err.to_string());
        }
    }

    #[test]
    fn test_sample_rate_mismatch_message() {
        let err = RequestError::SampleRateMismatch {
            encoding: AudioEncoding::Amr,
            required: 8000,
            actual: 16000,
        };
        assert_eq!(
            err.to_string(),
            "AMR requires a sample rate of 8000 Hz, got 16000"
        );
    }

    #[test]
    fn test_stream_error_codes() {
        assert_eq!(StreamError::ConfigNotFirst.code(), Code::InvalidArgument);
        assert_eq!(
            StreamError::from(RequestError::UnspecifiedEncoding).code(),
            Code::InvalidArgument
        );
        assert_eq!(StreamError::MultipleFinalResults.code(), Code::Internal);
        assert_eq!(StreamError::Closed.code(), Code::FailedPrecondition);
    }

    #[test]
    fn test_recognizer_error_codes() {
        assert_eq!(
            RecognizerError::Unsupported("uri audio".to_string()).code(),
            Code::Unimplemented
        );
        let err = RecognizerError::from(RequestError::AudioSourceMissing);
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.to_string(), RequestError::AudioSourceMissing.to_string());
    }

    #[test]
    fn test_session_status_passes_through() {
        let status = Status::new(Code::Unimplemented, "unsupported: encoding");
        let err = RecognizerError::Status(status.clone());
        assert_eq!(err.code(), Code::Unimplemented);
        assert_eq!(err.to_status(), status);
        assert_eq!(err.to_string(), "UNIMPLEMENTED: unsupported: encoding");
    }
}
