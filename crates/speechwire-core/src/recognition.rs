use crate::encoding::AudioEncoding;
use crate::error::RequestError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const MIN_SAMPLE_RATE_HERTZ: u32 = 8000;
pub const MAX_SAMPLE_RATE_HERTZ: u32 = 48000;
pub const MAX_ALTERNATIVES_LIMIT: u32 = 30;

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

fn language_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{1,8})*$").unwrap())
}

/// Tells the recognizer how to process the audio of a request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    #[serde(default)]
    pub encoding: AudioEncoding,

    /// 8000-48000, 16000 is optimal. Prefer the native rate of the source over
    /// re-sampling.
    #[serde(default)]
    pub sample_rate_hertz: u32,

    /// BCP-47 tag such as "en-US".
    #[serde(default)]
    pub language_code: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_alternatives: u32,

    #[serde(default, skip_serializing_if = "is_false")]
    pub profanity_filter: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speech_contexts: Vec<SpeechContext>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub enable_word_time_offsets: bool,
}

/// Phrase hints that bias recognition towards specific words.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeechContext {
    #[serde(default)]
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingRecognitionConfig {
    pub config: RecognitionConfig,

    /// Stop after one utterance and emit END_OF_SINGLE_UTTERANCE. At most one
    /// final result is returned.
    #[serde(default, skip_serializing_if = "is_false")]
    pub single_utterance: bool,

    /// Emit tentative `is_final=false` hypotheses as they become available.
    #[serde(default, skip_serializing_if = "is_false")]
    pub interim_results: bool,
}

impl RecognitionConfig {
    pub fn new(encoding: AudioEncoding, sample_rate_hertz: u32, language_code: &str) -> Self {
        Self {
            encoding,
            sample_rate_hertz,
            language_code: language_code.to_string(),
            ..Default::default()
        }
    }

    pub fn with_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.speech_contexts.push(SpeechContext {
            phrases: phrases.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// 0 and 1 both mean a single hypothesis.
    pub fn effective_max_alternatives(&self) -> u32 {
        self.max_alternatives.max(1)
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if !self.encoding.is_specified() {
            return Err(RequestError::UnspecifiedEncoding);
        }
        if !(MIN_SAMPLE_RATE_HERTZ..=MAX_SAMPLE_RATE_HERTZ).contains(&self.sample_rate_hertz) {
            return Err(RequestError::SampleRateOutOfRange(self.sample_rate_hertz));
        }
        if let Some(required) = self.encoding.required_sample_rate() {
            if self.sample_rate_hertz != required {
                return Err(RequestError::SampleRateMismatch {
                    encoding: self.encoding,
                    required,
                    actual: self.sample_rate_hertz,
                });
            }
        }
        if !language_tag_re().is_match(&self.language_code) {
            return Err(RequestError::InvalidLanguageCode(self.language_code.clone()));
        }
        if self.max_alternatives > MAX_ALTERNATIVES_LIMIT {
            return Err(RequestError::MaxAlternativesOutOfRange(self.max_alternatives));
        }
        let blank = self
            .speech_contexts
            .iter()
            .flat_map(|c| c.phrases.iter())
            .any(|p| p.trim().is_empty());
        if blank {
            return Err(RequestError::BlankPhrase);
        }
        Ok(())
    }
}

impl StreamingRecognitionConfig {
    pub fn new(config: RecognitionConfig) -> Self {
        Self {
            config,
            single_utterance: false,
            interim_results: false,
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        self.config.validate()
    }
}
