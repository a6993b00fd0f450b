use crate::audio::RecognitionAudio;
use crate::error::RequestError;
use crate::recognition::{RecognitionConfig, StreamingRecognitionConfig};
use crate::wire;
use serde::{Deserialize, Serialize};

/// Body of the `Recognize` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizeRequest {
    pub config: RecognitionConfig,
    pub audio: RecognitionAudio,
}

/// Body of the `LongRunningRecognize` call. Same shape as `RecognizeRequest`,
/// results arrive through an `Operation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRunningRecognizeRequest {
    pub config: RecognitionConfig,
    pub audio: RecognitionAudio,
}

impl RecognizeRequest {
    pub fn new(config: RecognitionConfig, audio: RecognitionAudio) -> Self {
        Self { config, audio }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        self.config.validate()?;
        self.audio.validate()
    }
}

impl LongRunningRecognizeRequest {
    pub fn new(config: RecognitionConfig, audio: RecognitionAudio) -> Self {
        Self { config, audio }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        self.config.validate()?;
        self.audio.validate()
    }
}

impl From<RecognizeRequest> for LongRunningRecognizeRequest {
    fn from(req: RecognizeRequest) -> Self {
        Self::new(req.config, req.audio)
    }
}

/// One message of the `StreamingRecognize` client stream. The first message
/// of a stream is `StreamingConfig`, every later one is `AudioContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawStreamingRecognizeRequest",
    into = "RawStreamingRecognizeRequest"
)]
pub enum StreamingRecognizeRequest {
    StreamingConfig(StreamingRecognitionConfig),
    AudioContent(Vec<u8>),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStreamingRecognizeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    streaming_config: Option<StreamingRecognitionConfig>,

    #[serde(
        default,
        with = "wire::opt_base64_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    audio_content: Option<Vec<u8>>,
}

impl TryFrom<RawStreamingRecognizeRequest> for StreamingRecognizeRequest {
    type Error = RequestError;

    fn try_from(raw: RawStreamingRecognizeRequest) -> Result<Self, Self::Error> {
        match (raw.streaming_config, raw.audio_content) {
            (Some(_), Some(_)) => Err(RequestError::StreamingRequestConflict),
            (Some(config), None) => Ok(Self::StreamingConfig(config)),
            (None, Some(audio)) => Ok(Self::AudioContent(audio)),
            (None, None) => Err(RequestError::StreamingRequestEmpty),
        }
    }
}

impl From<StreamingRecognizeRequest> for RawStreamingRecognizeRequest {
    fn from(req: StreamingRecognizeRequest) -> Self {
        match req {
            StreamingRecognizeRequest::StreamingConfig(config) => Self {
                streaming_config: Some(config),
                audio_content: None,
            },
            StreamingRecognizeRequest::AudioContent(audio) => Self {
                streaming_config: None,
                audio_content: Some(audio),
            },
        }
    }
}

impl StreamingRecognizeRequest {
    pub fn is_config(&self) -> bool {
        matches!(self, Self::StreamingConfig(_))
    }

    pub fn audio(&self) -> Option<&[u8]> {
        match self {
            Self::AudioContent(bytes) => Some(bytes),
            Self::StreamingConfig(_) => None,
        }
    }
}
