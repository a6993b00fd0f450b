use crate::error::RequestError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Encoding of the audio bytes sent in `RecognitionAudio` and streaming audio
/// chunks. Every encoding is mono.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioEncoding {
    /// Rejected with INVALID_ARGUMENT.
    #[default]
    EncodingUnspecified,
    /// Uncompressed 16-bit signed little-endian PCM.
    Linear16,
    Flac,
    /// 8-bit G.711 PCMU/mu-law.
    Mulaw,
    /// AMR narrowband, 8000 Hz only.
    Amr,
    /// AMR wideband, 16000 Hz only.
    AmrWb,
    /// Opus frames in an Ogg container, 16000 Hz only.
    OggOpus,
    /// RTP Speex wideband with each RTP header replaced by a one-byte block
    /// length, 16000 Hz only.
    SpeexWithHeaderByte,
}

const ALL_ENCODINGS: [AudioEncoding; 8] = [
    AudioEncoding::EncodingUnspecified,
    AudioEncoding::Linear16,
    AudioEncoding::Flac,
    AudioEncoding::Mulaw,
    AudioEncoding::Amr,
    AudioEncoding::AmrWb,
    AudioEncoding::OggOpus,
    AudioEncoding::SpeexWithHeaderByte,
];

impl AudioEncoding {
    pub fn from_wire(value: i32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|i| ALL_ENCODINGS.get(i).copied())
    }

    pub fn wire_value(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioEncoding::EncodingUnspecified => "ENCODING_UNSPECIFIED",
            AudioEncoding::Linear16 => "LINEAR16",
            AudioEncoding::Flac => "FLAC",
            AudioEncoding::Mulaw => "MULAW",
            AudioEncoding::Amr => "AMR",
            AudioEncoding::AmrWb => "AMR_WB",
            AudioEncoding::OggOpus => "OGG_OPUS",
            AudioEncoding::SpeexWithHeaderByte => "SPEEX_WITH_HEADER_BYTE",
        }
    }

    pub fn required_sample_rate(self) -> Option<u32> {
        match self {
            AudioEncoding::Amr => Some(8000),
            AudioEncoding::AmrWb | AudioEncoding::OggOpus | AudioEncoding::SpeexWithHeaderByte => {
                Some(16000)
            }
            _ => None,
        }
    }

    /// Only FLAC carries a header describing the samples that follow.
    pub fn has_header(self) -> bool {
        matches!(self, AudioEncoding::Flac)
    }

    pub fn is_lossless(self) -> bool {
        matches!(self, AudioEncoding::Linear16 | AudioEncoding::Flac)
    }

    pub fn is_specified(self) -> bool {
        self != AudioEncoding::EncodingUnspecified
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioEncoding {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ENCODINGS
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| RequestError::UnknownEncoding(s.to_string()))
    }
}

impl Serialize for AudioEncoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AudioEncoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EncodingVisitor;

        impl<'de> Visitor<'de> for EncodingVisitor {
            type Value = AudioEncoding;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an audio encoding name or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                i32::try_from(v)
                    .ok()
                    .and_then(AudioEncoding::from_wire)
                    .ok_or_else(|| E::custom(format!("unknown audio encoding: {v}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map_err(|_| E::custom(format!("unknown audio encoding: {v}")))
                    .and_then(|v| self.visit_i64(v))
            }
        }

        deserializer.deserialize_any(EncodingVisitor)
    }
}
