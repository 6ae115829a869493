//! Converts handler return values into an [`Outcome`].
//!
//! The [`Responder`] trait lets handlers return plain values (`String`, `serde_json::Value`, `()`,
//! a [`Redirect`], a `Result`, ...) which are turned into the data carried by the response envelope.

use crate::error::{BoxError, RouteError};
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// The successful result of invoking a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Data placed in the envelope's `data` field.
    Data(Value),
    /// A terminal redirect, no data is sent.
    Redirect(Redirect),
}

/// Instructs the transport to redirect the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    location: String,
    status: StatusCode,
}

impl Redirect {
    /// A `302 Found` redirect.
    pub fn to<S: Into<String>>(location: S) -> Self {
        Self { location: location.into(), status: StatusCode::FOUND }
    }

    /// # Errors
    /// Returns [`RouteError::InvalidRedirectStatus`] if `status` is not a 3xx code.
    pub fn with_status<S: Into<String>>(location: S, status: u16) -> Result<Self, RouteError> {
        match StatusCode::from_u16(status) {
            Ok(status) if status.is_redirection() => Ok(Self { location: location.into(), status }),
            _ => Err(RouteError::InvalidRedirectStatus(status)),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Wraps any serializable value as the envelope data.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

/// A trait for types that can be returned from request handlers.
pub trait Responder {
    /// # Errors
    /// Returns the error the handler produced, or a serialization error.
    fn into_outcome(self) -> Result<Outcome, BoxError>;
}

impl Responder for Outcome {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(self)
    }
}

impl Responder for Redirect {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Redirect(self))
    }
}

impl Responder for Value {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Data(self))
    }
}

impl<T: Serialize> Responder for Json<T> {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Data(serde_json::to_value(self.0)?))
    }
}

/// Ok and Err are converted separately, errors are reported by the dispatcher.
impl<T: Responder, E: Into<BoxError>> Responder for Result<T, E> {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Err(e.into()),
        }
    }
}

/// None becomes `null` data.
impl<T: Responder> Responder for Option<T> {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        match self {
            Some(t) => t.into_outcome(),
            None => Ok(Outcome::Data(Value::Null)),
        }
    }
}

impl Responder for () {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Data(Value::Null))
    }
}

impl Responder for &'static str {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Data(Value::from(self)))
    }
}

impl Responder for String {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Data(Value::String(self)))
    }
}

impl<T: Serialize> Responder for Vec<T> {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Json(self).into_outcome()
    }
}
