use serde::Deserialize;

use crate::modules::error::SubmissionError;

// Reply body of the attendance endpoint. Extra fields are ignored
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerReply {
    pub status: String,
    pub message: String,
}

// The three ways a completed exchange can be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success(String),
    Warning(String),
    Error(String),
}

impl SubmissionOutcome {
    // Anything other than "success" or "warning" counts as an error
    pub fn classify(reply: ServerReply) -> Self {
        match reply.status.as_str() {
            "success" => SubmissionOutcome::Success(reply.message),
            "warning" => SubmissionOutcome::Warning(reply.message),
            _ => SubmissionOutcome::Error(reply.message),
        }
    }

    // Success is the only outcome that is not an error of the attempt
    pub fn into_result(self) -> Result<String, SubmissionError> {
        match self {
            SubmissionOutcome::Success(msg) => Ok(msg),
            SubmissionOutcome::Warning(msg) => Err(SubmissionError::ServerWarning(msg)),
            SubmissionOutcome::Error(msg) => Err(SubmissionError::ServerRejected(msg)),
        }
    }
}
