use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::controller::Ack;

/// Request-level failures surfaced to callers. None of these affect the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing or mismatched `x-button-secret` header.
    Unauthorized,
    /// The declared `Origin` is not permitted by the origin policy.
    OriginRejected(String),
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        match self {
            Error::Unauthorized => write!(fmt, "Unauthorized"),
            Error::OriginRejected(origin) => write!(fmt, "CORS blocked for origin: {origin}"),
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::OriginRejected(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), Json(Ack::error(self.to_string()))).into_response()
    }
}
