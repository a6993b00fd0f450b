use crate::error::ResponseError;
use crate::result::StreamingRecognitionResult;
use crate::status::Status;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpeechEventType {
    #[default]
    SpeechEventUnspecified,
    /// The server heard the end of the utterance and will process no more
    /// audio. The client should stop sending, half-close, and keep reading
    /// until the server closes. Only sent when `single_utterance` is set.
    EndOfSingleUtterance,
}

impl SpeechEventType {
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(SpeechEventType::SpeechEventUnspecified),
            1 => Some(SpeechEventType::EndOfSingleUtterance),
            _ => None,
        }
    }

    pub fn wire_value(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpeechEventType::SpeechEventUnspecified => "SPEECH_EVENT_UNSPECIFIED",
            SpeechEventType::EndOfSingleUtterance => "END_OF_SINGLE_UTTERANCE",
        }
    }
}

impl<'de> Deserialize<'de> for SpeechEventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EventVisitor;

        impl<'de> Visitor<'de> for EventVisitor {
            type Value = SpeechEventType;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a speech event type name or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                [
                    SpeechEventType::SpeechEventUnspecified,
                    SpeechEventType::EndOfSingleUtterance,
                ]
                .into_iter()
                .find(|e| e.as_str() == v)
                .ok_or_else(|| E::custom(format!("unknown speech event type: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                i32::try_from(v)
                    .ok()
                    .and_then(SpeechEventType::from_wire)
                    .ok_or_else(|| E::custom(format!("unknown speech event type: {v}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map_err(|_| E::custom(format!("unknown speech event type: {v}")))
                    .and_then(|v| self.visit_i64(v))
            }
        }

        deserializer.deserialize_any(EventVisitor)
    }
}

/// The only message streamed back by `StreamingRecognize`. Exactly one of
/// the three payloads is present. `Results` holds zero or more interim
/// results followed by at most one final result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawStreamingRecognizeResponse",
    into = "RawStreamingRecognizeResponse"
)]
pub enum StreamingRecognizeResponse {
    Error(Status),
    SpeechEvent(SpeechEventType),
    Results(Vec<StreamingRecognitionResult>),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStreamingRecognizeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<Status>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    results: Vec<StreamingRecognitionResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    speech_event_type: Option<SpeechEventType>,
}

impl TryFrom<RawStreamingRecognizeResponse> for StreamingRecognizeResponse {
    type Error = ResponseError;

    fn try_from(raw: RawStreamingRecognizeResponse) -> Result<Self, ResponseError> {
        // An explicit SPEECH_EVENT_UNSPECIFIED is the proto default, i.e. unset.
        let event = raw
            .speech_event_type
            .filter(|e| *e != SpeechEventType::SpeechEventUnspecified);
        let set = usize::from(raw.error.is_some())
            + usize::from(event.is_some())
            + usize::from(!raw.results.is_empty());
        if set > 1 {
            return Err(ResponseError::MultipleFieldsSet);
        }
        if let Some(status) = raw.error {
            return Ok(StreamingRecognizeResponse::Error(status));
        }
        if let Some(event) = event {
            return Ok(StreamingRecognizeResponse::SpeechEvent(event));
        }
        StreamingRecognizeResponse::results(raw.results)
    }
}

impl From<StreamingRecognizeResponse> for RawStreamingRecognizeResponse {
    fn from(resp: StreamingRecognizeResponse) -> Self {
        let mut raw = Self {
            error: None,
            results: Vec::new(),
            speech_event_type: None,
        };
        match resp {
            StreamingRecognizeResponse::Error(status) => raw.error = Some(status),
            StreamingRecognizeResponse::SpeechEvent(event) => raw.speech_event_type = Some(event),
            StreamingRecognizeResponse::Results(results) => raw.results = results,
        }
        raw
    }
}

pub(crate) fn check_result_order(results: &[StreamingRecognitionResult]) -> Result<(), ResponseError> {
    match results.iter().position(|r| r.is_final) {
        Some(position) if position + 1 != results.len() => {
            Err(ResponseError::FinalNotLast { position })
        }
        _ => Ok(()),
    }
}

impl StreamingRecognizeResponse {
    /// Builds a results response, rejecting any final result that is not last.
    pub fn results(results: Vec<StreamingRecognitionResult>) -> Result<Self, ResponseError> {
        check_result_order(&results)?;
        Ok(Self::Results(results))
    }

    pub fn end_of_single_utterance() -> Self {
        Self::SpeechEvent(SpeechEventType::EndOfSingleUtterance)
    }

    pub fn is_end_of_single_utterance(&self) -> bool {
        matches!(
            self,
            Self::SpeechEvent(SpeechEventType::EndOfSingleUtterance)
        )
    }

    pub fn error(&self) -> Option<&Status> {
        match self {
            Self::Error(status) => Some(status),
            _ => None,
        }
    }

    pub fn result_list(&self) -> &[StreamingRecognitionResult] {
        match self {
            Self::Results(results) => results,
            _ => &[],
        }
    }

    pub fn final_result(&self) -> Option<&StreamingRecognitionResult> {
        self.result_list().last().filter(|r| r.is_final)
    }

    pub fn interim_results(&self) -> impl Iterator<Item = &StreamingRecognitionResult> {
        self.result_list().iter().filter(|r| !r.is_final)
    }

    /// Re-checks the ordering rule and score ranges. Needed when `Results`
    /// was built directly instead of through `results()`.
    pub fn validate(&self) -> Result<(), ResponseError> {
        let results = self.result_list();
        check_result_order(results)?;
        results.iter().try_for_each(|r| r.validate())
    }
}
