use crate::encoding::AudioEncoding;
use crate::error::ConfigError;
use crate::recognition::{RecognitionConfig, SpeechContext, StreamingRecognitionConfig};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub recognition: RecognitionSettings,

    #[serde(default)]
    pub streaming: StreamingSettings,

    #[serde(default)]
    pub recognizer: RecognizerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Bytes of audio per streaming request.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecognitionSettings {
    #[serde(default = "default_encoding")]
    pub encoding: AudioEncoding,

    #[serde(default = "default_sample_rate")]
    pub sample_rate_hertz: u32,

    #[serde(default = "default_language")]
    pub language_code: String,

    #[serde(default)]
    pub max_alternatives: u32,

    #[serde(default)]
    pub profanity_filter: bool,

    #[serde(default)]
    pub phrases: Vec<String>,

    #[serde(default)]
    pub enable_word_time_offsets: bool,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
            sample_rate_hertz: default_sample_rate(),
            language_code: default_language(),
            max_alternatives: 0,
            profanity_filter: false,
            phrases: Vec::new(),
            enable_word_time_offsets: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StreamingSettings {
    #[serde(default)]
    pub single_utterance: bool,

    #[serde(default)]
    pub interim_results: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecognizerSettings {
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Engine-specific table handed to the recognizer's `initialize`.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            extra: toml::Table::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_chunk_size() -> usize {
    // 100ms of 16 kHz LINEAR16
    3200
}

fn default_encoding() -> AudioEncoding {
    AudioEncoding::Linear16
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_engine() -> String {
    "null".to_string()
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = input.to_string();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let val = std::env::var(var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
        result = result.replace(&cap[0], &val);
    }

    Ok(result)
}

impl Settings {
    /// Load settings from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let settings: Settings = toml::from_str(&interpolated)?;
        Ok(settings)
    }

    /// The validated `RecognitionConfig` described by `[recognition]`.
    pub fn recognition_config(&self) -> Result<RecognitionConfig, ConfigError> {
        let r = &self.recognition;
        let speech_contexts = if r.phrases.is_empty() {
            Vec::new()
        } else {
            vec![SpeechContext {
                phrases: r.phrases.clone(),
            }]
        };
        let config = RecognitionConfig {
            encoding: r.encoding,
            sample_rate_hertz: r.sample_rate_hertz,
            language_code: r.language_code.clone(),
            max_alternatives: r.max_alternatives,
            profanity_filter: r.profanity_filter,
            speech_contexts,
            enable_word_time_offsets: r.enable_word_time_offsets,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn streaming_config(&self) -> Result<StreamingRecognitionConfig, ConfigError> {
        Ok(StreamingRecognitionConfig {
            config: self.recognition_config()?,
            single_utterance: self.streaming.single_utterance,
            interim_results: self.streaming.interim_results,
        })
    }

    pub fn recognizer_table(&self) -> toml::Value {
        toml::Value::Table(self.recognizer.extra.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;

    #[test]
    fn test_settings_parse_full_toml() {
        let toml_str = r#"
[general]
log_level = "debug"
chunk_size = 1024

[recognition]
encoding = "FLAC"
sample_rate_hertz = 44100
language_code = "de-DE"
max_alternatives = 3
profanity_filter = true
phrases = ["Brandenburger Tor"]
enable_word_time_offsets = true

[streaming]
single_utterance = true
interim_results = true

[recognizer]
engine = "null"
utterance_chunks = 4
"#;
        let settings = Settings::from_toml_str(toml_str).unwrap();
        assert_eq!(settings.general.log_level, "debug");
        assert_eq!(settings.general.chunk_size, 1024);
        let config = settings.recognition_config().unwrap();
        assert_eq!(config.encoding, AudioEncoding::Flac);
        assert_eq!(config.sample_rate_hertz, 44100);
        assert_eq!(config.max_alternatives, 3);
        assert!(config.profanity_filter);
        assert_eq!(config.speech_contexts[0].phrases, vec!["Brandenburger Tor"]);
        let streaming = settings.streaming_config().unwrap();
        assert!(streaming.single_utterance);
        assert!(streaming.interim_results);
        assert_eq!(settings.recognizer.engine, "null");
        assert_eq!(
            settings.recognizer_table().get("utterance_chunks").unwrap().as_integer(),
            Some(4)
        );
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.general.log_level, "info");
        assert_eq!(settings.general.chunk_size, 3200);
        assert_eq!(settings.recognizer.engine, "null");
        assert!(!settings.streaming.single_utterance);
        let config = settings.recognition_config().unwrap();
        assert_eq!(config.encoding, AudioEncoding::Linear16);
        assert_eq!(config.sample_rate_hertz, 16000);
        assert_eq!(config.language_code, "en-US");
        assert!(config.speech_contexts.is_empty());
    }

    #[test]
    fn test_settings_encoding_by_number() {
        let settings = Settings::from_toml_str("[recognition]\nencoding = 3\nsample_rate_hertz = 8000").unwrap();
        assert_eq!(settings.recognition.encoding, AudioEncoding::Mulaw);
    }

    #[test]
    fn test_settings_invalid_recognition_reported() {
        let settings = Settings::from_toml_str(
            "[recognition]\nencoding = \"AMR\"\nsample_rate_hertz = 16000",
        )
        .unwrap();
        match settings.recognition_config() {
            Err(ConfigError::InvalidRecognition(RequestError::SampleRateMismatch { required, .. })) => {
                assert_eq!(required, 8000);
            }
            other => panic!("expected SampleRateMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_settings_env_var_interpolation() {
        std::env::set_var("SPEECHWIRE_TEST_LANG", "fr-FR");
        let toml_str = r#"
[recognition]
language_code = "${SPEECHWIRE_TEST_LANG}"
"#;
        let settings = Settings::from_toml_str(toml_str).unwrap();
        assert_eq!(settings.recognition.language_code, "fr-FR");
        std::env::remove_var("SPEECHWIRE_TEST_LANG");
    }

    #[test]
    fn test_settings_missing_env_var_error() {
        let toml_str = r#"
[general]
log_level = "${DEFINITELY_DOES_NOT_EXIST_12345}"
"#;
        let err = Settings::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("DEFINITELY_DOES_NOT_EXIST_12345"));
    }

    #[test]
    fn test_settings_invalid_toml_error() {
        assert!(Settings::from_toml_str("this is not valid toml [[[").is_err());
    }

    #[test]
    fn test_settings_unknown_encoding_error() {
        assert!(Settings::from_toml_str("[recognition]\nencoding = \"MP3\"").is_err());
    }

    #[test]
    fn test_settings_load_from_file() {
        let dir = std::env::temp_dir().join("speechwire_test_settings");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
[general]
log_level = "warn"

[streaming]
interim_results = true
"#,
        )
        .unwrap();

        let settings = Settings::load_from_file(&path).unwrap();
        assert_eq!(settings.general.log_level, "warn");
        assert!(settings.streaming.interim_results);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_settings_load_from_file_not_found() {
        let err = Settings::load_from_file(Path::new("/nonexistent/path.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
