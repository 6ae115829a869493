use http::StatusCode;
use std::error::Error;
use thiserror::Error;

/// The error type returned by request handlers.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A route pattern could not be compiled.
///
/// Raised at registration time only. A table that failed to register a route is not safe to serve,
/// so callers are expected to abort startup on this error.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern '{pattern}' must start with '/'")]
    MissingLeadingSlash { pattern: String },

    #[error("unbalanced '{{' or '}}' in pattern '{pattern}'")]
    UnbalancedBrace { pattern: String },

    #[error("unbalanced '[' or ']' in pattern '{pattern}'")]
    UnbalancedBracket { pattern: String },

    #[error("optional group in pattern '{pattern}' must be the last part of the pattern")]
    OptionalNotTrailing { pattern: String },

    #[error("optional group in pattern '{pattern}' must start with '/'")]
    OptionalWithoutSlash { pattern: String },

    #[error("parameter must span the whole segment, found '{segment}' in pattern '{pattern}'")]
    MixedSegment { pattern: String, segment: String },

    #[error("invalid parameter name '{name}' in pattern '{pattern}'")]
    InvalidParameterName { pattern: String, name: String },

    #[error("parameter '{name}' appears more than once in pattern '{pattern}'")]
    DuplicateParameter { pattern: String, name: String },

    #[error("invalid constraint '{constraint}' for parameter '{name}': {source}")]
    InvalidConstraint {
        name: String,
        constraint: String,
        #[source]
        source: regex::Error,
    },
}

impl PatternError {
    pub fn missing_leading_slash<S: ToString>(pattern: S) -> Self {
        Self::MissingLeadingSlash { pattern: pattern.to_string() }
    }

    pub fn unbalanced_brace<S: ToString>(pattern: S) -> Self {
        Self::UnbalancedBrace { pattern: pattern.to_string() }
    }

    pub fn unbalanced_bracket<S: ToString>(pattern: S) -> Self {
        Self::UnbalancedBracket { pattern: pattern.to_string() }
    }

    pub fn optional_not_trailing<S: ToString>(pattern: S) -> Self {
        Self::OptionalNotTrailing { pattern: pattern.to_string() }
    }

    pub fn optional_without_slash<S: ToString>(pattern: S) -> Self {
        Self::OptionalWithoutSlash { pattern: pattern.to_string() }
    }

    pub fn mixed_segment<S: ToString, T: ToString>(pattern: S, segment: T) -> Self {
        Self::MixedSegment { pattern: pattern.to_string(), segment: segment.to_string() }
    }

    pub fn invalid_parameter_name<S: ToString, T: ToString>(pattern: S, name: T) -> Self {
        Self::InvalidParameterName { pattern: pattern.to_string(), name: name.to_string() }
    }

    pub fn duplicate_parameter<S: ToString, T: ToString>(pattern: S, name: T) -> Self {
        Self::DuplicateParameter { pattern: pattern.to_string(), name: name.to_string() }
    }
}

/// Errors raised while registering routes.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("failed to register {method} '{path}': {source}")]
    Pattern {
        method: http::Method,
        path: String,
        #[source]
        source: PatternError,
    },

    #[error("no http method given for '{0}'")]
    NoMethods(String),

    #[error("invalid http method '{0}'")]
    InvalidMethod(String),

    #[error("invalid redirect status {0}, expected 3xx")]
    InvalidRedirectStatus(u16),

    #[error("invalid controller handler '{0}', expected 'Controller@action'")]
    InvalidControllerHandler(String),
}

/// A handler error that carries its own HTTP status code.
///
/// Any other error returned from a handler is reported as `500 Internal Server Error`; returning this
/// type lets a handler choose the final status code instead.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self { status, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while invoking a controller action.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("controller '{0}' is not registered")]
    UnknownController(String),

    #[error("controller '{controller}' has no action '{action}'")]
    UnknownAction { controller: String, action: String },
}
