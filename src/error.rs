//! Unified error type.

use std::fmt;

use http::StatusCode;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error a handler or middleware returns when it cannot produce a
/// response itself.
///
/// Every `Error` carries the HTTP status the chain's
/// [`ErrorHandler`](crate::ErrorHandler) should answer with. Infrastructure
/// failures (`std::io::Error`, `http::Error`) convert into
/// `500 Internal Server Error` and keep the original error as their source.
#[derive(Debug)]
pub struct Error {
    status: StatusCode,
    message: String,
    source: Option<Source>,
}

impl Error {
    /// An error answered with `status` and `message`.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), source: None }
    }

    /// `500 Internal Server Error` wrapping `err`.
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn message(&self) -> &str { &self.message }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::internal(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Self::internal(e)
    }
}
