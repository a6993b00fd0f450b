use crate::error::ResponseError;
use crate::result::LongRunningRecognizeResponse;
use crate::status::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress of a `LongRunningRecognize` call, carried in `Operation.metadata`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunningRecognizeMetadata {
    /// 100 once all audio is processed and results are available.
    #[serde(default)]
    pub progress_percent: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
}

impl LongRunningRecognizeMetadata {
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            progress_percent: 0,
            start_time: Some(at),
            last_update_time: Some(at),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress_percent == 100
    }

    pub fn validate(&self) -> Result<(), ResponseError> {
        if !(0..=100).contains(&self.progress_percent) {
            return Err(ResponseError::ProgressOutOfRange(self.progress_percent));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    Error(Status),
    Response(LongRunningRecognizeResponse),
}

/// A long-running recognition handle as returned by `GetOperation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOperation", into = "RawOperation")]
pub struct Operation {
    pub name: String,
    pub metadata: Option<LongRunningRecognizeMetadata>,
    pub done: bool,
    pub result: Option<OperationResult>,
}

#[derive(Serialize, Deserialize)]
struct RawOperation {
    #[serde(default)]
    name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<LongRunningRecognizeMetadata>,

    #[serde(default)]
    done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<Status>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    response: Option<LongRunningRecognizeResponse>,
}

impl TryFrom<RawOperation> for Operation {
    type Error = ResponseError;

    fn try_from(raw: RawOperation) -> Result<Self, ResponseError> {
        let result = match (raw.error, raw.response) {
            (Some(_), Some(_)) => return Err(ResponseError::OperationResultConflict),
            (Some(status), None) => Some(OperationResult::Error(status)),
            (None, Some(resp)) => Some(OperationResult::Response(resp)),
            (None, None) => None,
        };
        let op = Operation {
            name: raw.name,
            metadata: raw.metadata,
            done: raw.done,
            result,
        };
        op.validate()?;
        Ok(op)
    }
}

impl From<Operation> for RawOperation {
    fn from(op: Operation) -> Self {
        let (error, response) = match op.result {
            Some(OperationResult::Error(status)) => (Some(status), None),
            Some(OperationResult::Response(resp)) => (None, Some(resp)),
            None => (None, None),
        };
        Self {
            name: op.name,
            metadata: op.metadata,
            done: op.done,
            error,
            response,
        }
    }
}

impl Operation {
    pub fn pending(name: impl Into<String>, metadata: LongRunningRecognizeMetadata) -> Self {
        Self {
            name: name.into(),
            metadata: Some(metadata),
            done: false,
            result: None,
        }
    }

    pub fn finish(&mut self, result: OperationResult, at: DateTime<Utc>) {
        let metadata = self.metadata.get_or_insert_with(Default::default);
        if matches!(result, OperationResult::Response(_)) {
            metadata.progress_percent = 100;
        }
        metadata.last_update_time = Some(at);
        self.done = true;
        self.result = Some(result);
    }

    pub fn response(&self) -> Option<&LongRunningRecognizeResponse> {
        match &self.result {
            Some(OperationResult::Response(resp)) => Some(resp),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Status> {
        match &self.result {
            Some(OperationResult::Error(status)) => Some(status),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ResponseError> {
        if let Some(metadata) = &self.metadata {
            metadata.validate()?;
        }
        match (self.done, &self.result) {
            (true, None) => Err(ResponseError::DoneWithoutResult),
            (false, Some(_)) => Err(ResponseError::PendingWithResult),
            _ => Ok(()),
        }
    }
}
