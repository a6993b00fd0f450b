use crate::error::ResponseError;
use crate::wire;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn is_unset(v: &f32) -> bool {
    *v == 0.0
}

fn is_false(v: &bool) -> bool {
    !*v
}

pub(crate) fn check_score(field: &'static str, value: f32) -> Result<(), ResponseError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ResponseError::ScoreOutOfRange { field, value })
    }
}

/// Timing of one recognized word, relative to the start of the audio. Only
/// present in the top hypothesis and only when word time offsets were
/// requested.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInfo {
    #[serde(default, with = "wire::opt_duration", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Duration>,

    #[serde(default, with = "wire::opt_duration", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Duration>,

    #[serde(default)]
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeechRecognitionAlternative {
    #[serde(default)]
    pub transcript: String,

    /// 0.0 means "not set". Usually only present on the top hypothesis of a
    /// final result.
    #[serde(default, skip_serializing_if = "is_unset")]
    pub confidence: f32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<WordInfo>,
}

impl SpeechRecognitionAlternative {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            ..Default::default()
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn confidence(&self) -> Option<f32> {
        (!is_unset(&self.confidence)).then_some(self.confidence)
    }

    pub fn validate(&self) -> Result<(), ResponseError> {
        check_score("confidence", self.confidence)
    }
}

/// Result for one portion of the audio. Alternatives are ordered best first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeechRecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,
}

impl SpeechRecognitionResult {
    pub fn top(&self) -> Option<&SpeechRecognitionAlternative> {
        self.alternatives.first()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingRecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,

    /// Once true the recognizer will not revise this portion again.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_final: bool,

    /// Likelihood that an interim guess will not change. 0.0 means "not set".
    #[serde(default, skip_serializing_if = "is_unset")]
    pub stability: f32,
}

impl StreamingRecognitionResult {
    pub fn interim(transcript: impl Into<String>, stability: f32) -> Self {
        Self {
            alternatives: vec![SpeechRecognitionAlternative::new(transcript)],
            is_final: false,
            stability,
        }
    }

    pub fn final_result(alternatives: Vec<SpeechRecognitionAlternative>) -> Self {
        Self {
            alternatives,
            is_final: true,
            stability: 0.0,
        }
    }

    pub fn top(&self) -> Option<&SpeechRecognitionAlternative> {
        self.alternatives.first()
    }

    pub fn top_transcript(&self) -> &str {
        self.top().map(|a| a.transcript.as_str()).unwrap_or("")
    }

    pub fn stability(&self) -> Option<f32> {
        (!is_unset(&self.stability)).then_some(self.stability)
    }

    pub fn validate(&self) -> Result<(), ResponseError> {
        check_score("stability", self.stability)?;
        self.alternatives.iter().try_for_each(|a| a.validate())
    }
}

impl From<StreamingRecognitionResult> for SpeechRecognitionResult {
    fn from(result: StreamingRecognitionResult) -> Self {
        Self {
            alternatives: result.alternatives,
        }
    }
}

fn join_top_transcripts(results: &[SpeechRecognitionResult]) -> String {
    results
        .iter()
        .filter_map(|r| r.top())
        .map(|a| a.transcript.as_str())
        .collect()
}

/// Only message returned by `Recognize`: results for sequential portions of
/// the audio.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecognizeResponse {
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,
}

impl RecognizeResponse {
    pub fn transcript(&self) -> String {
        join_top_transcripts(&self.results)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LongRunningRecognizeResponse {
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,
}

impl LongRunningRecognizeResponse {
    pub fn transcript(&self) -> String {
        join_top_transcripts(&self.results)
    }
}

impl From<RecognizeResponse> for LongRunningRecognizeResponse {
    fn from(resp: RecognizeResponse) -> Self {
        Self {
            results: resp.results,
        }
    }
}
