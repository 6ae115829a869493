//! The uniform response record.
//!
//! Every dispatch ends in an [`Envelope`], whatever happened: a handler result, a redirect, an
//! unknown path, a wrong method or a failing handler. The envelope is independent of the transport,
//! [`crate::App::handle`] turns it into an HTTP response.

use chrono::{DateTime, Utc};
use http::StatusCode;
use light_router::{AllowedMethods, HttpError, Redirect};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::error::Error;

pub const NOT_FOUND_MESSAGE: &str = "Not found.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed.";
pub const UNHANDLED_MESSAGE: &str = "Unhandled response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(serialize_with = "serialize_status_code")]
    code: StatusCode,
    status: EnvelopeStatus,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_methods: Option<AllowedMethods>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

fn serialize_status_code<S: Serializer>(code: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(code.as_u16())
}

impl Envelope {
    fn new(code: StatusCode, status: EnvelopeStatus) -> Self {
        Self {
            code,
            status,
            timestamp: Utc::now(),
            data: None,
            message: None,
            allowed_methods: None,
            location: None,
        }
    }

    fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), ..Self::new(code, EnvelopeStatus::Error) }
    }

    /// `200`, with the handler's data.
    pub fn success(data: Value) -> Self {
        Self { data: Some(data), ..Self::new(StatusCode::OK, EnvelopeStatus::Success) }
    }

    /// A successful redirect, carrying the redirect's own 3xx code and its target.
    pub fn redirect(redirect: &Redirect) -> Self {
        Self { location: Some(redirect.location().to_string()), ..Self::new(redirect.status(), EnvelopeStatus::Success) }
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }

    pub fn method_not_allowed(allowed: AllowedMethods) -> Self {
        Self {
            allowed_methods: Some(allowed),
            ..Self::error(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
        }
    }

    /// The handler failed. An [`HttpError`] keeps its message, and its status when that is a 4xx or
    /// 5xx code. Any other error is a `500` with the error's message.
    pub fn handler_error(error: &(dyn Error + Send + Sync + 'static)) -> Self {
        match error.downcast_ref::<HttpError>() {
            Some(http_error) => {
                let status = http_error.status();
                let status = if status.is_client_error() || status.is_server_error() {
                    status
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                Self::error(status, http_error.message())
            }
            None => Self::error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
        }
    }

    /// Anything that could not be turned into a regular envelope.
    pub fn unhandled() -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, UNHANDLED_MESSAGE)
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn status(&self) -> EnvelopeStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn allowed_methods(&self) -> Option<&AllowedMethods> {
        self.allowed_methods.as_ref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Pretty printed JSON, the body format sent to clients.
    ///
    /// # Errors
    /// Returns an error if the handler data cannot be serialized.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
