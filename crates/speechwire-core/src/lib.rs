pub mod audio;
pub mod encoding;
pub mod error;
pub mod operation;
pub mod recognition;
pub mod request;
pub mod response;
pub mod result;
pub mod settings;
pub mod status;
pub mod wire;

pub use audio::{RecognitionAudio, StorageUri};
pub use encoding::AudioEncoding;
pub use error::{ConfigError, RecognizerError, RequestError, ResponseError, StreamError};
pub use operation::{LongRunningRecognizeMetadata, Operation, OperationResult};
pub use recognition::{RecognitionConfig, SpeechContext, StreamingRecognitionConfig};
pub use request::{LongRunningRecognizeRequest, RecognizeRequest, StreamingRecognizeRequest};
pub use response::{SpeechEventType, StreamingRecognizeResponse};
pub use result::{
    LongRunningRecognizeResponse, RecognizeResponse, SpeechRecognitionAlternative,
    SpeechRecognitionResult, StreamingRecognitionResult, WordInfo,
};
pub use settings::Settings;
pub use status::{Code, Status};
