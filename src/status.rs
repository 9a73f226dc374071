//! `{code, message, data}` status reports.
//!
//! Codes are strings: "200" for a decoded symbol, "404" when nothing was
//! found, "400" for malformed symbols and bad input, "500" for internal
//! failures.

use serde::Serialize;

use crate::error::DecodeError;
use crate::pipeline::DecodeOutcome;

/// Message attached to a successful decode
pub const SUCCESS_MESSAGE: &str = "QR code decoded successfully";
/// Message attached when no symbol was found
pub const NOT_FOUND_MESSAGE: &str = "no QR detected; check the image sharpness";

/// Status category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// A symbol decoded
    Success,
    /// Bad input or an unrecoverable symbol
    BadRequest,
    /// No symbol in the image
    NotFound,
    /// Failure unrelated to the input
    Internal,
}

impl StatusCode {
    /// Wire form of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Success => "200",
            StatusCode::BadRequest => "400",
            StatusCode::NotFound => "404",
            StatusCode::Internal => "500",
        }
    }
}

/// Serializable status of one decode request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// "200", "400", "404" or "500"
    pub code: &'static str,
    /// Human-readable summary
    pub message: String,
    /// Decoded text, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl StatusReport {
    fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str(),
            message: message.into(),
            data: None,
        }
    }

    /// Report for decoded text
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            data: Some(text.into()),
            ..Self::new(StatusCode::Success, SUCCESS_MESSAGE)
        }
    }

    /// Report for an image without a symbol
    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound, NOT_FOUND_MESSAGE)
    }

    /// True for "200"
    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success.as_str()
    }

    /// Compact JSON rendering
    pub fn to_json(&self) -> String {
        // A struct of strings always serializes; the fallback is unreachable
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"{}","message":"unserializable report"}}"#, self.code)
        })
    }
}

impl From<&DecodeOutcome> for StatusReport {
    fn from(outcome: &DecodeOutcome) -> Self {
        match outcome {
            DecodeOutcome::Success(code) => Self::success(code.content.clone()),
            DecodeOutcome::NotFound => Self::not_found(),
            DecodeOutcome::Malformed(reason) => {
                Self::new(StatusCode::BadRequest, format!("QR code could not be read: {reason}"))
            }
        }
    }
}

impl From<DecodeOutcome> for StatusReport {
    fn from(outcome: DecodeOutcome) -> Self {
        Self::from(&outcome)
    }
}

impl From<&DecodeError> for StatusReport {
    fn from(err: &DecodeError) -> Self {
        let code = match err {
            DecodeError::MissingInput
            | DecodeError::EmptyImage
            | DecodeError::InvalidBase64(_)
            | DecodeError::ImageDecode(_) => StatusCode::BadRequest,
            DecodeError::DimensionMismatch { .. }
            | DecodeError::ImageTooLarge { .. }
            | DecodeError::Io(_) => StatusCode::Internal,
        };
        let message = match code {
            StatusCode::Internal => format!("internal error: {err}"),
            _ => err.to_string(),
        };
        Self::new(code, message)
    }
}

impl From<DecodeError> for StatusReport {
    fn from(err: DecodeError) -> Self {
        Self::from(&err)
    }
}

impl<E> From<Result<DecodeOutcome, E>> for StatusReport
where
    E: Into<StatusReport>,
{
    fn from(result: Result<DecodeOutcome, E>) -> Self {
        match result {
            Ok(outcome) => outcome.into(),
            Err(err) => err.into(),
        }
    }
}
