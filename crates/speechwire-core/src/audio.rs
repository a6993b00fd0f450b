use crate::error::RequestError;
use crate::wire;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Audio to recognize, encoded as the accompanying `RecognitionConfig` says.
/// Exactly one source is present; JSON carrying both or neither fails to
/// decode with the matching INVALID_ARGUMENT error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecognitionAudio", into = "RawRecognitionAudio")]
pub enum RecognitionAudio {
    Content(Vec<u8>),
    Uri(String),
}

#[derive(Serialize, Deserialize)]
struct RawRecognitionAudio {
    #[serde(
        default,
        with = "wire::opt_base64_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    content: Option<Vec<u8>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
}

impl TryFrom<RawRecognitionAudio> for RecognitionAudio {
    type Error = RequestError;

    fn try_from(raw: RawRecognitionAudio) -> Result<Self, Self::Error> {
        match (raw.content, raw.uri) {
            (Some(_), Some(_)) => Err(RequestError::AudioSourceConflict),
            (Some(content), None) => Ok(RecognitionAudio::Content(content)),
            (None, Some(uri)) => Ok(RecognitionAudio::Uri(uri)),
            (None, None) => Err(RequestError::AudioSourceMissing),
        }
    }
}

impl From<RecognitionAudio> for RawRecognitionAudio {
    fn from(audio: RecognitionAudio) -> Self {
        match audio {
            RecognitionAudio::Content(content) => Self {
                content: Some(content),
                uri: None,
            },
            RecognitionAudio::Uri(uri) => Self {
                content: None,
                uri: Some(uri),
            },
        }
    }
}

impl RecognitionAudio {
    pub fn content(bytes: impl Into<Vec<u8>>) -> Self {
        RecognitionAudio::Content(bytes.into())
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        RecognitionAudio::Uri(uri.into())
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        match self {
            RecognitionAudio::Content(bytes) if bytes.is_empty() => {
                Err(RequestError::EmptyAudioContent)
            }
            RecognitionAudio::Content(_) => Ok(()),
            RecognitionAudio::Uri(uri) => uri.parse::<StorageUri>().map(|_| ()),
        }
    }
}

/// A `gs://bucket_name/object_name` reference. No other scheme is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUri {
    pub bucket: String,
    pub object: String,
}

impl FromStr for StorageUri {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RequestError::InvalidUri(s.to_string());
        let rest = s.strip_prefix("gs://").ok_or_else(invalid)?;
        let (bucket, object) = rest.split_once('/').ok_or_else(invalid)?;
        if bucket.is_empty() || object.is_empty() || bucket.contains(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(StorageUri {
            bucket: bucket.to_string(),
            object: object.to_string(),
        })
    }
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_base64_on_the_wire() {
        let audio = RecognitionAudio::content(vec![0u8, 1, 2, 255]);
        let json = serde_json::to_value(&audio).unwrap();
        assert_eq!(json["content"], "AAEC/w==");
        assert!(json.get("uri").is_none());

        let back: RecognitionAudio = serde_json::from_value(json).unwrap();
        assert_eq!(back, audio);
    }

    #[test]
    fn test_both_sources_rejected() {
        let json = r#"{"content": "AAEC", "uri": "gs://b/o"}"#;
        let err = serde_json::from_str::<RecognitionAudio>(json).unwrap_err();
        assert!(err.to_string().contains("got both"));
    }

    #[test]
    fn test_neither_source_rejected() {
        let err = serde_json::from_str::<RecognitionAudio>("{}").unwrap_err();
        assert!(err.to_string().contains("got neither"));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(serde_json::from_str::<RecognitionAudio>(r#"{"content": "@@@"}"#).is_err());
    }

    #[test]
    fn test_storage_uri_parse() {
        let uri: StorageUri = "gs://my-bucket/path/to/audio.flac".parse().unwrap();
        assert_eq!(uri.bucket, "my-bucket");
        assert_eq!(uri.object, "path/to/audio.flac");
        assert_eq!(uri.to_string(), "gs://my-bucket/path/to/audio.flac");
    }

    #[test]
    fn test_storage_uri_rejects_other_forms() {
        for bad in [
            "https://storage.googleapis.com/b/o",
            "gs://bucket",
            "gs://bucket/",
            "gs:///object",
            "bucket/object",
        ] {
            assert_eq!(
                bad.parse::<StorageUri>(),
                Err(RequestError::InvalidUri(bad.to_string())),
            );
        }
    }

    #[test]
    fn test_validate() {
        assert!(RecognitionAudio::content(vec![1u8]).validate().is_ok());
        assert_eq!(
            RecognitionAudio::content(Vec::new()).validate(),
            Err(RequestError::EmptyAudioContent)
        );
        assert!(RecognitionAudio::uri("gs://b/o.wav").validate().is_ok());
        assert!(RecognitionAudio::uri("file:///tmp/o.wav").validate().is_err());
    }
}
