//! Structured errors returned by the YouTube Data API.

use http::StatusCode;
use serde::Deserialize;
use std::fmt;

/// Reason YouTube reports when a video's owner has turned comments off.
pub const COMMENTS_DISABLED_REASON: &str = "commentsDisabled";

/// Error envelope returned by Google APIs on non-2xx responses.
///
/// See: <https://developers.google.com/youtube/v3/docs/errors>
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// A failed YouTube API call.
///
/// Carries the HTTP status, the machine-readable reasons from the error envelope (if the body
/// had one), and the raw payload so callers can inspect anything we don't parse. API calls
/// return these wrapped in an [`eyre::Report`]; use `report.downcast_ref::<ApiError>()` to get
/// at them.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub reasons: Vec<String>,
    pub message: Option<String>,
    pub payload: String,
}

impl ApiError {
    /// Builds an error from a non-success response's status and body.
    pub fn from_response(status: StatusCode, payload: String) -> Self {
        let (reasons, message) = match serde_json::from_str::<ErrorEnvelope>(&payload) {
            Ok(envelope) => (
                envelope
                    .error
                    .errors
                    .into_iter()
                    .filter_map(|detail| detail.reason)
                    .collect(),
                envelope.error.message,
            ),
            Err(_) => (Vec::new(), None),
        };
        Self {
            status,
            reasons,
            message,
            payload,
        }
    }

    /// The first reported reason, or the status' canonical reason phrase.
    pub fn reason(&self) -> &str {
        self.reasons
            .first()
            .map(String::as_str)
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("unknown")
    }

    /// Whether this error means the video has comments turned off.
    pub fn is_comments_disabled(&self) -> bool {
        self.reasons.iter().any(|r| r == COMMENTS_DISABLED_REASON)
            || self.payload.contains(COMMENTS_DISABLED_REASON)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "YouTube API request failed with status {}", self.status)?;
        write!(f, " ({})", self.reason())?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}
